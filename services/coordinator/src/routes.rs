//! HTTP surface of the coordinator.
//!
//! Routes mirror the client-facing contract: registration, round trigger,
//! result reporting and the decentralized finish callback. Handlers only
//! translate between wire shapes and coordinator calls; all round logic
//! stays in `fedcoord-core`.

use std::sync::Arc;

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post, put};
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use tracing::info;

use fedcoord_core::{CoordinatorError, ModelParams, RoundCoordinator, TrainingType};

pub fn router(coordinator: Arc<RoundCoordinator>) -> Router {
    Router::new()
        .route("/status", get(status))
        .route("/client", post(register_client).delete(unregister_client))
        .route("/training", post(start_training))
        .route("/model_params", put(update_model_params))
        .route("/finish_round", post(finish_round))
        .with_state(coordinator)
}

/// Maps the coordinator error taxonomy onto HTTP statuses: unknown
/// clients are authorization failures, unsupported type/callback
/// combinations are client errors, busy/no-round preconditions are
/// retryable conflicts.
struct ApiError(CoordinatorError);

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match &self.0 {
            CoordinatorError::NotRegistered { .. } => StatusCode::UNAUTHORIZED,
            CoordinatorError::NotDecentralized(_)
            | CoordinatorError::TrainingTypeMismatch { .. } => StatusCode::BAD_REQUEST,
            CoordinatorError::ServerBusy { .. }
            | CoordinatorError::EmptyRegistry
            | CoordinatorError::NoActiveRound => StatusCode::CONFLICT,
        };
        (status, Json(ErrorBody { error: self.0.to_string() })).into_response()
    }
}

impl From<CoordinatorError> for ApiError {
    fn from(e: CoordinatorError) -> Self {
        Self(e)
    }
}

#[derive(Serialize)]
struct ErrorBody {
    error: String,
}

#[derive(Debug, Deserialize)]
struct ClientRef {
    client_url: String,
}

#[derive(Debug, Deserialize)]
struct TrainingTrigger {
    training_type: TrainingType,
}

#[derive(Debug, Deserialize)]
struct ResultReport {
    client_url: String,
    training_type: TrainingType,
    model_params: ModelParams,
}

#[derive(Debug, Deserialize)]
struct FinishReport {
    client_url: String,
    training_type: TrainingType,
}

#[derive(Serialize)]
struct RegisteredBody {
    client_id: u64,
}

async fn status(State(coordinator): State<Arc<RoundCoordinator>>) -> impl IntoResponse {
    Json(coordinator.snapshot())
}

async fn register_client(
    State(coordinator): State<Arc<RoundCoordinator>>,
    Json(body): Json<ClientRef>,
) -> impl IntoResponse {
    info!(client_url = %body.client_url, "POST /client");
    let client_id = coordinator.register_client(&body.client_url);
    (StatusCode::CREATED, Json(RegisteredBody { client_id }))
}

async fn unregister_client(
    State(coordinator): State<Arc<RoundCoordinator>>,
    Json(body): Json<ClientRef>,
) -> StatusCode {
    info!(client_url = %body.client_url, "DELETE /client");
    coordinator.unregister_client(&body.client_url);
    StatusCode::OK
}

async fn start_training(
    State(coordinator): State<Arc<RoundCoordinator>>,
    Json(body): Json<TrainingTrigger>,
) -> Result<StatusCode, ApiError> {
    info!(training_type = ?body.training_type, "POST /training");
    coordinator.start_round(body.training_type).await?;
    Ok(StatusCode::OK)
}

async fn update_model_params(
    State(coordinator): State<Arc<RoundCoordinator>>,
    Json(body): Json<ResultReport>,
) -> Result<StatusCode, ApiError> {
    info!(client_url = %body.client_url, training_type = ?body.training_type, "PUT /model_params");
    coordinator.report_result(&body.client_url, body.training_type, body.model_params)?;
    Ok(StatusCode::OK)
}

async fn finish_round(
    State(coordinator): State<Arc<RoundCoordinator>>,
    Json(body): Json<FinishReport>,
) -> Result<StatusCode, ApiError> {
    info!(client_url = %body.client_url, training_type = ?body.training_type, "POST /finish_round");
    coordinator.force_finish(&body.client_url, body.training_type)?;
    Ok(StatusCode::OK)
}
