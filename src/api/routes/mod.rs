//! Routes 模块
//!
//! 定义 API 路由。

pub mod adapter_routes;
pub mod agent_routes;
pub mod event_routes;
