//! NPC 上下文
//!
//! 生成反应前为 NPC 组装的档案、相关记忆和关系。任何部分都可能为空。

use serde::{Deserialize, Serialize};

use crate::models::agent::{Agent, NEUTRAL_EMOTION};
use crate::models::memory::Memory;
use crate::models::relationship::RelationshipView;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AgentContext {
    /// NPC 档案，未知 NPC 时为空
    pub agent: Option<Agent>,
    /// 与当前事件相关的记忆（新到旧）
    pub relevant_memories: Vec<Memory>,
    /// 最近互动过的关系
    pub relationships: Vec<RelationshipView>,
    /// 情绪状态
    pub emotional_state: String,
}

impl Default for AgentContext {
    fn default() -> Self {
        Self {
            agent: None,
            relevant_memories: Vec::new(),
            relationships: Vec::new(),
            emotional_state: NEUTRAL_EMOTION.to_string(),
        }
    }
}

impl AgentContext {
    /// 渲染为提示词片段，无记忆时返回空串
    pub fn memories_prompt(&self) -> String {
        if self.relevant_memories.is_empty() {
            return String::new();
        }
        let lines: Vec<String> = self
            .relevant_memories
            .iter()
            .map(|m| format!("- {}", m.description))
            .collect();
        format!("Relevant memories:\n{}\n", lines.join("\n"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::memory::NewMemory;

    #[test]
    fn test_default_is_neutral_and_empty() {
        let ctx = AgentContext::default();
        assert!(ctx.agent.is_none());
        assert!(ctx.relevant_memories.is_empty());
        assert!(ctx.relationships.is_empty());
        assert_eq!(ctx.emotional_state, "neutral");
        assert_eq!(ctx.memories_prompt(), "");
    }

    #[test]
    fn test_memories_prompt() {
        let ctx = AgentContext {
            relevant_memories: vec![
                NewMemory::observation("a", "Heard a crash").into_memory(),
                NewMemory::observation("a", "Saw a stranger").into_memory(),
            ],
            ..AgentContext::default()
        };
        assert_eq!(
            ctx.memories_prompt(),
            "Relevant memories:\n- Heard a crash\n- Saw a stranger\n"
        );
    }
}
