//! Training variants and their per-round configuration.
//!
//! The supported variants form a closed set; each one knows its payload
//! shape (central parameters vs. peer list) and its fixed training
//! configuration, so callers select a variant once per round instead of
//! re-branching on type strings.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TrainingType {
    Mnist,
    DeterministicMnist,
    GossipMnist,
    ChestXRayPneumonia,
}

impl TrainingType {
    /// Decentralized variants exchange parameters peer-to-peer; the
    /// coordinator only tracks completion and never aggregates.
    pub fn is_decentralized(self) -> bool {
        matches!(self, TrainingType::GossipMnist)
    }

    /// Variants whose outbound payload must carry the round size.
    pub fn needs_round_size(self) -> bool {
        matches!(self, TrainingType::DeterministicMnist | TrainingType::GossipMnist)
    }

    /// Fixed training configuration per variant, not client-supplied.
    pub fn learning_config(self) -> FederatedLearningConfig {
        match self {
            TrainingType::Mnist | TrainingType::DeterministicMnist | TrainingType::GossipMnist => {
                FederatedLearningConfig { learning_rate: 1.0, epochs: 20, batch_size: 256 }
            }
            TrainingType::ChestXRayPneumonia => {
                FederatedLearningConfig { learning_rate: 0.0001, epochs: 1, batch_size: 2 }
            }
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FederatedLearningConfig {
    pub learning_rate: f64,
    pub epochs: u32,
    pub batch_size: u32,
}

/// One variant's parameter set. The MNIST family trains a dense layer
/// (weight/bias pair); the chest-x-ray model reports a single flattened
/// weight array.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ModelParams {
    Dense { weights: Vec<f32>, bias: Vec<f32> },
    Flat { weights: Vec<f32> },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn training_type_uses_wire_names() {
        let json = serde_json::to_string(&TrainingType::GossipMnist).unwrap();
        assert_eq!(json, "\"gossip_mnist\"");
        let back: TrainingType = serde_json::from_str("\"chest_x_ray_pneumonia\"").unwrap();
        assert_eq!(back, TrainingType::ChestXRayPneumonia);
    }

    #[test]
    fn config_table_is_fixed_per_variant() {
        let mnist = TrainingType::Mnist.learning_config();
        assert_eq!(mnist.epochs, 20);
        assert_eq!(mnist.batch_size, 256);
        let xray = TrainingType::ChestXRayPneumonia.learning_config();
        assert!((xray.learning_rate - 0.0001).abs() < f64::EPSILON);
        assert_eq!(xray.epochs, 1);
    }

    #[test]
    fn only_gossip_is_decentralized() {
        assert!(TrainingType::GossipMnist.is_decentralized());
        assert!(!TrainingType::Mnist.is_decentralized());
        assert!(!TrainingType::DeterministicMnist.is_decentralized());
        assert!(TrainingType::DeterministicMnist.needs_round_size());
    }
}
