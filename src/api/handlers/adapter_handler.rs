use axum::{Json, extract::State, response::IntoResponse};
use tracing::debug;

use crate::{
    api::{app_state::AppState, dto::adapter_dto::PreloadRequest},
    error::AppError,
};

pub async fn adapter_status(State(state): State<AppState>) -> impl IntoResponse {
    Json(state.orchestrator.cache_status())
}

/// Best-effort preload; failures are reported per adapter, never as an error status
pub async fn preload_adapters(
    State(state): State<AppState>,
    Json(request): Json<PreloadRequest>,
) -> Result<impl IntoResponse, AppError> {
    debug!("Preloading {} adapters", request.adapters.len());

    if request.adapters.is_empty() {
        return Err(AppError::Validation("adapters must not be empty".into()));
    }

    let report = state.orchestrator.preload_adapters(&request.adapters).await;
    Ok(Json(report))
}
