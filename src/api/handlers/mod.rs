//! Handlers 模块
//!
//! HTTP 请求处理程序。

pub mod adapter_handler;
pub mod agent_handler;
pub mod dialogue_handler;
pub mod event_handler;

pub use adapter_handler::*;
pub use agent_handler::*;
pub use dialogue_handler::*;
pub use event_handler::*;
