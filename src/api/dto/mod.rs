//! DTO 模块
//!
//! 数据传输对象，用于 API 请求和响应的序列化。

pub mod adapter_dto;
pub mod agent_dto;
pub mod dialogue_dto;

pub use adapter_dto::*;
pub use agent_dto::*;
pub use dialogue_dto::*;
