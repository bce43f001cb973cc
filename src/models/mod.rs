//! 核心数据模型模块
//!
//! 定义 Spector 的核心数据结构：Agent, GameEvent, Memory, Relationship,
//! WorldObject, AdapterHandle, 组装后的 AgentContext 以及反应结果。

pub mod adapter;
pub mod agent;
pub mod context;
pub mod event;
pub mod memory;
pub mod reaction;
pub mod relationship;
pub mod world_object;

pub use adapter::*;
pub use agent::*;
pub use context::*;
pub use event::*;
pub use memory::*;
pub use reaction::*;
pub use relationship::*;
pub use world_object::*;
