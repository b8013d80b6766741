//! Round coordinator: owns the client registry, the central model
//! parameters and the round state machine.
//!
//! All mutable state sits behind a single mutex. Every status transition
//! and the quorum check run inside one critical section, so concurrent
//! callbacks can never both observe quorum and aggregate twice. The lock
//! is never held across an await point; dispatch fan-out runs as
//! independent tasks that re-enter the lock only to record their outcome.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use parking_lot::Mutex;
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::aggregate;
use crate::config::CoordinatorConfig;
use crate::dispatch::{Dispatcher, PeerInfo, TrainingRequest};
use crate::error::CoordinatorError;
use crate::registry::{ClientRegistry, ClientStatus};
use crate::variant::{ModelParams, TrainingType};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ServerStatus {
    Idle,
    ClientsTraining,
    UpdatingModelParams,
}

struct CoordinatorState {
    registry: ClientRegistry,
    status: ServerStatus,
    round: u64,
    /// Variant of the round currently in flight, fixed at dispatch time.
    active: Option<TrainingType>,
    models: HashMap<TrainingType, ModelParams>,
    last_aggregated_at: Option<i64>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ClientSnapshot {
    pub client_id: u64,
    pub client_url: String,
    pub status: ClientStatus,
}

#[derive(Debug, Clone, Serialize)]
pub struct CoordinatorSnapshot {
    pub status: ServerStatus,
    pub round: u64,
    pub active_training_type: Option<TrainingType>,
    pub last_aggregated_at: Option<i64>,
    pub clients: Vec<ClientSnapshot>,
}

pub struct RoundCoordinator {
    state: Mutex<CoordinatorState>,
    dispatcher: Arc<dyn Dispatcher>,
    round_deadline: Option<Duration>,
}

impl RoundCoordinator {
    pub fn new(dispatcher: Arc<dyn Dispatcher>, cfg: &CoordinatorConfig) -> Arc<Self> {
        let deadline = match cfg.round_deadline_secs {
            0 => None,
            secs => Some(Duration::from_secs(secs)),
        };
        Self::with_deadline(dispatcher, deadline)
    }

    pub fn with_deadline(
        dispatcher: Arc<dyn Dispatcher>,
        round_deadline: Option<Duration>,
    ) -> Arc<Self> {
        Arc::new(Self {
            state: Mutex::new(CoordinatorState {
                registry: ClientRegistry::new(),
                status: ServerStatus::Idle,
                round: 0,
                active: None,
                models: HashMap::new(),
                last_aggregated_at: None,
            }),
            dispatcher,
            round_deadline,
        })
    }

    /// Installs the initial parameter set for a variant. Parameter
    /// initialization itself happens outside the coordinator.
    pub fn seed_model(&self, training_type: TrainingType, params: ModelParams) {
        self.state.lock().models.insert(training_type, params);
    }

    pub fn model_params(&self, training_type: TrainingType) -> Option<ModelParams> {
        self.state.lock().models.get(&training_type).cloned()
    }

    /// Registers a client. Re-registering a still-pending client mid-round
    /// resets it to idle, which may leave nobody mid-flight, so the quorum
    /// check re-runs here just like on eviction.
    pub fn register_client(&self, url: &str) -> u64 {
        let mut guard = self.state.lock();
        let st = &mut *guard;
        let id = st.registry.register(url);
        Self::try_close_round(st);
        id
    }

    /// Unregisters a client. Evicting a still-pending client mid-round may
    /// remove the last quorum blocker, so the quorum check re-runs here.
    pub fn unregister_client(&self, url: &str) {
        let mut guard = self.state.lock();
        let st = &mut *guard;
        if st.registry.remove(url) {
            Self::try_close_round(st);
        }
    }

    pub fn snapshot(&self) -> CoordinatorSnapshot {
        let st = self.state.lock();
        let mut clients: Vec<ClientSnapshot> = st
            .registry
            .clients()
            .map(|c| ClientSnapshot {
                client_id: c.id,
                client_url: c.url.clone(),
                status: c.status,
            })
            .collect();
        clients.sort_by_key(|c| c.client_id);
        CoordinatorSnapshot {
            status: st.status,
            round: st.round,
            active_training_type: st.active,
            last_aggregated_at: st.last_aggregated_at,
            clients,
        }
    }

    /// Starts a training round: validates preconditions, advances the round
    /// counter, marks every registered client requested and fans out one
    /// independent dispatch call per client. Returns once every call has
    /// been attempted; training results arrive later through
    /// [`report_result`](Self::report_result) and
    /// [`force_finish`](Self::force_finish).
    pub async fn start_round(
        self: &Arc<Self>,
        training_type: TrainingType,
    ) -> Result<u64, CoordinatorError> {
        let (round, requests) = {
            let mut guard = self.state.lock();
            let st = &mut *guard;
            if st.status != ServerStatus::Idle {
                warn!(status = ?st.status, "server is not ready for training yet");
                return Err(CoordinatorError::ServerBusy { status: st.status });
            }
            if st.registry.is_empty() {
                warn!("there aren't any clients registered, nothing to do yet");
                return Err(CoordinatorError::EmptyRegistry);
            }
            st.round += 1;
            let round = st.round;
            let cfg = training_type.learning_config();
            let model_params = if training_type.is_decentralized() {
                None
            } else {
                st.models.get(&training_type).cloned()
            };
            let clients = training_type.is_decentralized().then(|| {
                st.registry
                    .clients()
                    .map(|c| PeerInfo { client_id: c.id, client_url: c.url.clone() })
                    .collect::<Vec<_>>()
            });
            let round_size = training_type.needs_round_size().then(|| st.registry.len());
            let mut requests = Vec::with_capacity(st.registry.len());
            for client in st.registry.clients_mut() {
                client.status = ClientStatus::Requested;
                requests.push((
                    client.url.clone(),
                    TrainingRequest {
                        training_type,
                        round,
                        client_id: client.id,
                        learning_rate: cfg.learning_rate,
                        epochs: cfg.epochs,
                        batch_size: cfg.batch_size,
                        model_params: model_params.clone(),
                        clients: clients.clone(),
                        round_size,
                    },
                ));
            }
            st.status = ServerStatus::ClientsTraining;
            st.active = Some(training_type);
            (round, requests)
        };

        info!(round, ?training_type, clients = requests.len(), "requesting training to clients");
        let tasks: Vec<_> = requests
            .into_iter()
            .map(|(url, request)| {
                let coord = Arc::clone(self);
                tokio::spawn(async move {
                    match coord.dispatcher.send_training_request(&url, &request).await {
                        Ok(()) => debug!(url = %url, round = request.round, "client started training"),
                        Err(e) => {
                            warn!(url = %url, error = %e, "error requesting training to client");
                            coord.record_dispatch_failure(&url, request.round);
                        }
                    }
                })
            })
            .collect();
        futures::future::join_all(tasks).await;

        if let Some(deadline) = self.round_deadline {
            self.arm_round_deadline(round, deadline);
        }
        Ok(round)
    }

    /// Inbound result callback for centralized variants: stores the
    /// reported parameters, marks the client finished and attempts
    /// aggregation.
    pub fn report_result(
        &self,
        url: &str,
        training_type: TrainingType,
        params: ModelParams,
    ) -> Result<(), CoordinatorError> {
        let mut guard = self.state.lock();
        let st = &mut *guard;
        if !st.registry.contains(url) {
            return Err(CoordinatorError::NotRegistered { url: url.to_string() });
        }
        let active = st.active.ok_or(CoordinatorError::NoActiveRound)?;
        if active != training_type {
            return Err(CoordinatorError::TrainingTypeMismatch { got: training_type, active });
        }
        let round = st.round;
        if let Some(client) = st.registry.get_mut(url) {
            info!(url, round, "new model params received from client");
            client.model_params = Some(params);
            client.status = ClientStatus::Finished;
        }
        Self::try_close_round(st);
        Ok(())
    }

    /// Inbound finish callback for the decentralized variant. Marks the
    /// client finished with no parameters attached; once quorum holds the
    /// round closes with the central model untouched, since training
    /// happened peer-to-peer.
    pub fn force_finish(
        &self,
        url: &str,
        training_type: TrainingType,
    ) -> Result<(), CoordinatorError> {
        if !training_type.is_decentralized() {
            return Err(CoordinatorError::NotDecentralized(training_type));
        }
        let mut guard = self.state.lock();
        let st = &mut *guard;
        if !st.registry.contains(url) {
            return Err(CoordinatorError::NotRegistered { url: url.to_string() });
        }
        let active = st.active.ok_or(CoordinatorError::NoActiveRound)?;
        if active != training_type {
            return Err(CoordinatorError::TrainingTypeMismatch { got: training_type, active });
        }
        let round = st.round;
        if let Some(client) = st.registry.get_mut(url) {
            info!(url, round, "client finished decentralized training");
            client.status = ClientStatus::Finished;
        }
        Self::try_close_round(st);
        Ok(())
    }

    /// Records a failed dispatch. The failure counts toward quorum like a
    /// reported result but contributes no parameters.
    fn record_dispatch_failure(&self, url: &str, round: u64) {
        let mut guard = self.state.lock();
        let st = &mut *guard;
        if st.round != round {
            return; // stale task from an already-closed round
        }
        if let Some(client) = st.registry.get_mut(url) {
            if client.status == ClientStatus::Requested {
                client.status = ClientStatus::RequestError;
            }
        }
        Self::try_close_round(st);
    }

    /// Arms a deadline for the given round. Clients that never call back
    /// are escalated to request-error so the round cannot stall forever.
    fn arm_round_deadline(self: &Arc<Self>, round: u64, deadline: Duration) {
        let coord = Arc::clone(self);
        tokio::spawn(async move {
            tokio::time::sleep(deadline).await;
            let mut guard = coord.state.lock();
            let st = &mut *guard;
            if st.round != round || st.status != ServerStatus::ClientsTraining {
                return;
            }
            let mut expired = 0usize;
            for client in st.registry.clients_mut() {
                if client.status == ClientStatus::Requested {
                    client.status = ClientStatus::RequestError;
                    expired += 1;
                }
            }
            if expired > 0 {
                warn!(round, expired, "round deadline reached, unresponsive clients marked errored");
            }
            // close unconditionally: the round may already hold quorum even
            // with nothing left to expire
            Self::try_close_round(st);
        });
    }

    /// Quorum check and round close, always under the state lock. Only a
    /// server in clients-training may enter the updating transition, which
    /// makes aggregation single-flight per round.
    fn try_close_round(st: &mut CoordinatorState) {
        if st.status != ServerStatus::ClientsTraining {
            return;
        }
        let Some(training_type) = st.active else {
            return;
        };
        if !st.registry.quorum_reached() {
            return;
        }

        if training_type.is_decentralized() {
            info!(round = st.round, "decentralized round finished, central model untouched");
            st.registry.reset_all_idle();
            st.active = None;
            st.status = ServerStatus::Idle;
            return;
        }

        st.status = ServerStatus::UpdatingModelParams;
        let aggregated = {
            let contributions: Vec<&ModelParams> = st
                .registry
                .clients()
                .filter(|c| c.status == ClientStatus::Finished)
                .filter_map(|c| c.model_params.as_ref())
                .collect();
            aggregate::average(&contributions)
        };
        match aggregated {
            Some(params) => {
                st.models.insert(training_type, params);
                st.last_aggregated_at = Some(Utc::now().timestamp());
                info!(round = st.round, ?training_type, "model params updated in central model");
            }
            None => {
                warn!(round = st.round, ?training_type, "no eligible contributions, central model left unchanged");
            }
        }
        st.registry.reset_all_idle();
        st.active = None;
        st.status = ServerStatus::Idle;
    }
}
