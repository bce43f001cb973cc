//! 存储层模块
//!
//! 基于 SurrealDB 的持久化服务：NPC 档案、情景记忆、关系和世界物体。

pub mod repository;
pub mod surrealdb;
