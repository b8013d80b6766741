//! Core round-coordination logic for the federated learning coordinator.
//!
//! Everything here is transport-agnostic: the registry, the round state
//! machine, the aggregation engine and the dispatch payloads. The HTTP
//! surface and the reqwest-based dispatcher live in `coordinator-service`.

pub mod aggregate;
pub mod config;
pub mod coordinator;
pub mod dispatch;
pub mod error;
pub mod registry;
mod resilience; // retry w/ backoff for outbound dispatch
pub mod variant;

pub use config::{load_config, CoordinatorConfig};
pub use coordinator::{ClientSnapshot, CoordinatorSnapshot, RoundCoordinator, ServerStatus};
pub use dispatch::{DispatchError, Dispatcher, PeerInfo, TrainingRequest};
pub use error::CoordinatorError;
pub use registry::{ClientRegistry, ClientStatus, TrainingClient};
pub use resilience::{retry_async, RetryConfig};
pub use variant::{FederatedLearningConfig, ModelParams, TrainingType};
