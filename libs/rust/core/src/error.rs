//! Error taxonomy for round coordination.
//!
//! Nothing here is fatal to the process: precondition violations are
//! recoverable by retrying later, callback errors are client errors, and
//! dispatch failures are recorded per participant.

use thiserror::Error;

use crate::coordinator::ServerStatus;
use crate::variant::TrainingType;

#[derive(Debug, Error)]
pub enum CoordinatorError {
    /// A round was requested while a previous round is still in flight.
    #[error("server is not ready for training (status: {status:?})")]
    ServerBusy { status: ServerStatus },

    /// A round was requested with no registered clients.
    #[error("no clients registered in the system, nothing to do")]
    EmptyRegistry,

    /// A callback referenced a url the registry does not know.
    #[error("client [{url}] is not registered in the system")]
    NotRegistered { url: String },

    /// A result or finish callback arrived while no round was active.
    #[error("no training round is active")]
    NoActiveRound,

    /// A callback carried a training type other than the active round's.
    #[error("training type {got:?} does not match the active round ({active:?})")]
    TrainingTypeMismatch { got: TrainingType, active: TrainingType },

    /// A finish-round callback was sent for a centralized variant.
    #[error("finish_round is only valid for decentralized training, got {0:?}")]
    NotDecentralized(TrainingType),
}
