//! Outbound training dispatch: the wire payload and the transport seam.
//!
//! The coordinator fans out one `TrainingRequest` per registered client.
//! The actual delivery (HTTP in production, mocks in tests) sits behind
//! the [`Dispatcher`] trait so the round state machine stays
//! transport-agnostic.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::variant::{ModelParams, TrainingType};

/// Peer entry sent to decentralized clients so they can address each other
/// directly; the coordinator does not mediate the exchange after dispatch.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PeerInfo {
    pub client_id: u64,
    pub client_url: String,
}

/// Body of the outbound `POST <client_url>/training` call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrainingRequest {
    pub training_type: TrainingType,
    pub round: u64,
    pub client_id: u64,
    pub learning_rate: f64,
    pub epochs: u32,
    pub batch_size: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub model_params: Option<ModelParams>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub clients: Option<Vec<PeerInfo>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub round_size: Option<usize>,
}

/// A training request that was not accepted: transport failure or a
/// non-success acknowledgement. Marks the client errored for the round,
/// never aborts sibling dispatches.
#[derive(Debug, Error)]
#[error("dispatch to [{url}] failed: {reason}")]
pub struct DispatchError {
    pub url: String,
    pub reason: String,
}

/// Transport seam between the round coordinator and its clients.
#[async_trait]
pub trait Dispatcher: Send + Sync + 'static {
    /// Delivers one training request; resolves once the client has
    /// accepted (or refused) the request, not when training finishes.
    async fn send_training_request(
        &self,
        url: &str,
        request: &TrainingRequest,
    ) -> Result<(), DispatchError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn optional_fields_stay_off_the_wire() {
        let req = TrainingRequest {
            training_type: TrainingType::Mnist,
            round: 1,
            client_id: 2,
            learning_rate: 1.0,
            epochs: 20,
            batch_size: 256,
            model_params: None,
            clients: None,
            round_size: None,
        };
        let json = serde_json::to_value(&req).unwrap();
        assert!(json.get("model_params").is_none());
        assert!(json.get("clients").is_none());
        assert!(json.get("round_size").is_none());
        assert_eq!(json["training_type"], "mnist");
    }

    #[test]
    fn gossip_payload_carries_peer_list() {
        let req = TrainingRequest {
            training_type: TrainingType::GossipMnist,
            round: 3,
            client_id: 1,
            learning_rate: 1.0,
            epochs: 20,
            batch_size: 256,
            model_params: None,
            clients: Some(vec![PeerInfo { client_id: 1, client_url: "http://a".into() }]),
            round_size: Some(1),
        };
        let json = serde_json::to_value(&req).unwrap();
        assert_eq!(json["clients"][0]["client_url"], "http://a");
        assert_eq!(json["round_size"], 1);
    }
}
