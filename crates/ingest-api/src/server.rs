//! Axum server and routes.

use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use ingest_service::IngestionService;
use ingest_types::{ErrorResponse, IngestError, IngestRequest, IngestResponse, StatusResponse};
use std::sync::Arc;
use tower_http::cors::CorsLayer;

pub struct AppState {
    pub service: Arc<IngestionService>,
}

pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/ingest", post(handle_ingest))
        .route("/status/:ingestion_id", get(handle_status))
        .route("/health", get(handle_health))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// Maps service errors onto status codes with an `{ "error": .. }` body.
pub struct ApiError(IngestError);

impl From<IngestError> for ApiError {
    fn from(e: IngestError) -> Self {
        Self(e)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (code, message) = match &self.0 {
            IngestError::InvalidInput(msg) => (StatusCode::BAD_REQUEST, msg.clone()),
            IngestError::NotFound(msg) => (StatusCode::NOT_FOUND, msg.clone()),
            other => {
                tracing::error!(error = %other, "request failed");
                (StatusCode::INTERNAL_SERVER_ERROR, "Server error".to_string())
            }
        };
        (code, Json(ErrorResponse { error: message })).into_response()
    }
}

async fn handle_ingest(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<IngestRequest>, JsonRejection>,
) -> Result<Json<IngestResponse>, ApiError> {
    let Json(req) = payload.map_err(|e| IngestError::InvalidInput(e.body_text()))?;
    let ingestion_id = state.service.submit_request(&req).await?;
    Ok(Json(IngestResponse { ingestion_id }))
}

async fn handle_status(
    State(state): State<Arc<AppState>>,
    Path(ingestion_id): Path<String>,
) -> Result<Json<StatusResponse>, ApiError> {
    Ok(Json(state.service.get_status(&ingestion_id).await?))
}

async fn handle_health() -> &'static str {
    "ok"
}
