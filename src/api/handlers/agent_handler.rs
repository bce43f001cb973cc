use axum::{
    Json,
    extract::{Path, State},
    response::IntoResponse,
};
use tracing::debug;

use crate::{
    api::{
        app_state::AppState,
        dto::agent_dto::{AgentListResponse, ServiceBanner},
    },
    error::AppError,
    models::agent::AgentStateUpdate,
};

pub async fn root(State(state): State<AppState>) -> impl IntoResponse {
    Json(ServiceBanner {
        service: "Spector NPC Reaction Service".to_string(),
        status: "online".to_string(),
        version: state.version.clone(),
    })
}

pub async fn list_agents(State(state): State<AppState>) -> impl IntoResponse {
    Json(AgentListResponse {
        agents: state.orchestrator.list_agents(),
    })
}

/// Stored profile, recent memories and relationships of one agent
pub async fn get_agent(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    debug!("Getting agent context: {}", id);

    let context = state.orchestrator.agent_context(&id).await;
    Ok(Json(context))
}

pub async fn update_agent_state(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(update): Json<AgentStateUpdate>,
) -> Result<impl IntoResponse, AppError> {
    debug!("Updating agent state: {}", id);

    let agent = state.orchestrator.update_agent_state(&id, &update).await?;
    Ok(Json(agent))
}
