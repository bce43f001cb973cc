use axum::{Json, extract::State, response::IntoResponse};
use tracing::debug;

use crate::{
    api::{app_state::AppState, dto::dialogue_dto::DialogueResponse},
    error::AppError,
    models::reaction::DialogueRequest,
};

pub async fn npc_dialogue(
    State(state): State<AppState>,
    Json(request): Json<DialogueRequest>,
) -> Result<impl IntoResponse, AppError> {
    debug!("Dialogue with {}", request.npc_id);

    let reply = state.orchestrator.handle_dialogue(request).await?;
    Ok(Json(DialogueResponse::from(reply)))
}
