use axum::{Json, extract::State, response::IntoResponse};
use tracing::debug;

use crate::{api::app_state::AppState, error::AppError, models::event::GameEvent};

/// Dispatch a world event and return every woken agent's reaction
pub async fn process_event(
    State(state): State<AppState>,
    Json(event): Json<GameEvent>,
) -> Result<impl IntoResponse, AppError> {
    debug!(
        "Processing event: {} at {}",
        event.event_type, event.location
    );

    if event.event_type.trim().is_empty() {
        return Err(AppError::Validation("event_type must not be empty".into()));
    }

    let response = state.orchestrator.handle_event(event).await?;
    Ok(Json(response))
}
