//! HTTP implementation of the dispatch seam: one `POST
//! <client_url>/training` per participant, with retry on transient
//! transport failures. A non-success acknowledgement is a dispatch
//! failure and is not retried, the client already answered.

use async_trait::async_trait;
use fedcoord_core::{retry_async, DispatchError, Dispatcher, RetryConfig, TrainingRequest};

pub struct HttpDispatcher {
    client: reqwest::Client,
    retry: RetryConfig,
}

impl HttpDispatcher {
    pub fn new(retry: RetryConfig) -> Self {
        Self { client: reqwest::Client::new(), retry }
    }
}

#[async_trait]
impl Dispatcher for HttpDispatcher {
    async fn send_training_request(
        &self,
        url: &str,
        request: &TrainingRequest,
    ) -> Result<(), DispatchError> {
        let target = format!("{}/training", url.trim_end_matches('/'));
        let status = retry_async(&self.retry, |_attempt| {
            let client = self.client.clone();
            let target = target.clone();
            let body = request.clone();
            async move { client.post(&target).json(&body).send().await.map(|r| r.status()) }
        })
        .await
        .map_err(|e| DispatchError { url: url.to_string(), reason: e.to_string() })?;

        if !status.is_success() {
            return Err(DispatchError {
                url: url.to_string(),
                reason: format!("client answered {status}"),
            });
        }
        Ok(())
    }
}
