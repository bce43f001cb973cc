//! Event Routes
//!
//! 世界事件与玩家对话。

use crate::api::handlers::{dialogue_handler::npc_dialogue, event_handler::process_event};
use axum::{Router, routing::post};

use crate::api::app_state::AppState;

pub fn create_event_router() -> Router<AppState> {
    Router::new()
        .route("/event", post(process_event))
        .route("/dialogue", post(npc_dialogue))
}
