//! Adapter Routes

use crate::api::handlers::adapter_handler::*;
use axum::{
    Router,
    routing::{get, post},
};

use crate::api::app_state::AppState;

pub fn create_adapter_router() -> Router<AppState> {
    Router::new()
        .route("/adapters/status", get(adapter_status))
        .route("/adapters/preload", post(preload_adapters))
}
