//! Spector - NPC 反应编排服务
//!
//! 接收游戏客户端的世界事件，判断哪些 NPC 受到影响，结合记忆和人格适配器
//! 为每个 NPC 生成台词，并支持玩家与 NPC 的对话。

pub mod api;
pub mod config;
pub mod error;
pub mod models;
pub mod observability;
pub mod services;
pub mod storage;
