//! Agent Routes

use crate::api::handlers::agent_handler::*;
use axum::{
    Router,
    routing::{get, put},
};

use crate::api::app_state::AppState;

pub fn create_agent_router() -> Router<AppState> {
    Router::new()
        .route("/", get(root))
        .route("/agents", get(list_agents))
        .route("/agent/:id", get(get_agent))
        .route("/agent/:id/state", put(update_agent_state))
}
