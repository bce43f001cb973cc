//! API 模块
//!
//! 提供 REST API 支持。

#[cfg(test)]
mod api_tests;
pub mod app_state;
pub mod dto;
pub mod handlers;
pub mod routes;

use crate::api::app_state::AppState;
use crate::observability::{create_observability_router, metrics_middleware};
use axum::Router;
use axum::http::HeaderValue;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tower_http::trace::TraceLayer;

/// 允许的跨域来源，空列表或 `*` 表示任意来源
fn cors_layer(origins: &[String]) -> CorsLayer {
    let layer = CorsLayer::new().allow_methods(Any).allow_headers(Any);
    if origins.is_empty() || origins.iter().any(|o| o == "*") {
        return layer.allow_origin(Any);
    }

    let origins: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|o| match o.parse::<HeaderValue>() {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!(origin = %o, "Ignoring invalid CORS origin");
                None
            }
        })
        .collect();
    layer.allow_origin(AllowOrigin::list(origins))
}

pub fn create_router(app_state: AppState, cors_origins: &[String]) -> Router {
    Router::new()
        .merge(routes::agent_routes::create_agent_router())
        .merge(routes::event_routes::create_event_router())
        .merge(routes::adapter_routes::create_adapter_router())
        .merge(create_observability_router())
        .layer(axum::middleware::from_fn_with_state(
            app_state.clone(),
            metrics_middleware,
        ))
        .layer(TraceLayer::new_for_http())
        .layer(cors_layer(cors_origins))
        .with_state(app_state)
}
