use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use tracing::info;

use coordinator_service::http_dispatch::HttpDispatcher;
use coordinator_service::routes;
use fedcoord_core::{load_config, RetryConfig, RoundCoordinator};

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_target(true)
        .init();

    let cfg = load_config()?;
    info!(?cfg, "starting federated learning coordinator");

    let retry = RetryConfig {
        max_retries: cfg.dispatch_retries,
        base_delay: Duration::from_millis(cfg.dispatch_base_delay_ms),
        ..RetryConfig::default()
    };
    let dispatcher = Arc::new(HttpDispatcher::new(retry));
    let coordinator = RoundCoordinator::new(dispatcher, &cfg);

    let app = routes::router(coordinator);
    let listener = tokio::net::TcpListener::bind(&cfg.bind_addr).await?;
    info!(addr = %cfg.bind_addr, "coordinator listening");
    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
            info!("shutdown_signal_received");
        })
        .await?;
    Ok(())
}
