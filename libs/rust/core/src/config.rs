//! Service configuration: defaults overridable through `FEDCOORD__*`
//! environment variables (e.g. `FEDCOORD__BIND_ADDR=0.0.0.0:9001`).

use anyhow::Result;
use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
pub struct CoordinatorConfig {
    /// Address the HTTP surface binds to.
    pub bind_addr: String,
    /// Seconds before a dispatched round is force-closed, treating clients
    /// that never called back as errored. 0 disables the deadline.
    pub round_deadline_secs: u64,
    /// Retries for transient transport failures on outbound dispatch.
    pub dispatch_retries: usize,
    /// Base backoff delay between dispatch retries, in milliseconds.
    pub dispatch_base_delay_ms: u64,
}

impl Default for CoordinatorConfig {
    fn default() -> Self {
        Self {
            bind_addr: "0.0.0.0:8001".into(),
            round_deadline_secs: 300,
            dispatch_retries: 2,
            dispatch_base_delay_ms: 200,
        }
    }
}

pub fn load_config() -> Result<CoordinatorConfig> {
    let cfg = config::Config::builder()
        .set_default("bind_addr", "0.0.0.0:8001")?
        .set_default("round_deadline_secs", 300i64)?
        .set_default("dispatch_retries", 2i64)?
        .set_default("dispatch_base_delay_ms", 200i64)?
        .add_source(config::Environment::with_prefix("FEDCOORD").separator("__"))
        .build()?;
    Ok(cfg.try_deserialize()?)
}
