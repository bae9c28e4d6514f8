//! HTTP request handlers for the gateway.

use std::sync::Arc;

use axum::{
    extract::{rejection::JsonRejection, State},
    http::StatusCode,
    response::{IntoResponse, Json, Response},
    routing::{get, post},
    Router,
};
use serde::{Deserialize, Serialize};
use tower_http::cors::CorsLayer;
use tracing::{info, info_span, warn, Instrument};
use uuid::Uuid;

use verity_core::VerdictBundle;
use verity_runtime::{AggregateError, ClaimEvaluator};

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub evaluator: Arc<dyn ClaimEvaluator>,
}

impl AppState {
    pub fn new(evaluator: Arc<dyn ClaimEvaluator>) -> Self {
        Self { evaluator }
    }
}

/// Body of `POST /fact-check`
#[derive(Debug, Serialize, Deserialize)]
pub struct FactCheckRequest {
    pub text: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct MessageResponse {
    pub message: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub classifier: String,
}

/// Error body
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
}

/// Application error type
#[derive(Debug)]
pub enum AppError {
    /// Malformed body or empty claim
    BadRequest(String),
    /// Aggregation failed after the claim was accepted
    Processing(String),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            AppError::Processing(msg) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                format!("Error processing request: {}", msg),
            ),
        };

        (status, Json(ErrorResponse { error: message })).into_response()
    }
}

impl From<AggregateError> for AppError {
    fn from(e: AggregateError) -> Self {
        match e {
            AggregateError::InvalidInput(e) => AppError::BadRequest(e.to_string()),
            other => AppError::Processing(other.to_string()),
        }
    }
}

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        AppError::BadRequest(rejection.body_text())
    }
}

/// GET / - Liveness banner
async fn root() -> Json<MessageResponse> {
    Json(MessageResponse {
        message: "Verity fact-check backend running".to_string(),
    })
}

/// GET /health
async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        classifier: state.evaluator.classifier_name().to_string(),
    })
}

/// POST /fact-check - Evaluate one claim
async fn fact_check(
    State(state): State<AppState>,
    payload: Result<Json<FactCheckRequest>, JsonRejection>,
) -> Result<Json<VerdictBundle>, AppError> {
    let request_id = Uuid::new_v4();
    let span = info_span!("fact_check", %request_id);

    async move {
        let Json(request) = payload.map_err(|rejection| {
            warn!("Rejected request body: {}", rejection.body_text());
            AppError::from(rejection)
        })?;

        let bundle = state.evaluator.evaluate(&request.text).await.map_err(|e| {
            warn!("Request failed: {}", e);
            AppError::from(e)
        })?;

        info!("Responded with verdict {}", bundle.final_verdict);
        Ok(Json(bundle))
    }
    .instrument(span)
    .await
}

/// Create the axum router with all routes
pub fn create_router(state: AppState, cors: CorsLayer) -> Router {
    Router::new()
        .route("/", get(root))
        .route("/health", get(health))
        .route("/fact-check", post(fact_check))
        .layer(cors)
        .with_state(state)
}
