//! NPC 之间的关系
//!
//! 关系是无向边，两端 ID 按字典序存储，保证同一对 NPC 只有一条边。

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// 首次互动时的默认关系类型
pub const ACQUAINTANCE: &str = "acquaintance";

/// 首次互动时的默认信任度
pub const DEFAULT_TRUST: f64 = 0.5;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Relationship {
    pub agent_a: String,
    pub agent_b: String,
    pub relationship_type: String,
    pub trust: f64,
    pub last_interaction: DateTime<Utc>,
}

impl Relationship {
    pub fn new(first: &str, second: &str, relationship_type: &str, trust: f64) -> Self {
        let (agent_a, agent_b) = ordered_pair(first, second);
        Self {
            agent_a,
            agent_b,
            relationship_type: relationship_type.to_string(),
            trust,
            last_interaction: Utc::now(),
        }
    }

    /// 存储键
    pub fn key(&self) -> String {
        pair_key(&self.agent_a, &self.agent_b)
    }

    /// 另一端的 NPC
    pub fn other(&self, agent_id: &str) -> &str {
        if self.agent_a == agent_id {
            &self.agent_b
        } else {
            &self.agent_a
        }
    }

    /// 从某个 NPC 的视角展示
    pub fn view_from(&self, agent_id: &str) -> RelationshipView {
        RelationshipView {
            other_agent: self.other(agent_id).to_string(),
            relationship_type: self.relationship_type.clone(),
            trust: self.trust,
            last_interaction: self.last_interaction,
        }
    }
}

/// 上下文中展示的关系
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RelationshipView {
    pub other_agent: String,
    pub relationship_type: String,
    pub trust: f64,
    pub last_interaction: DateTime<Utc>,
}

pub fn ordered_pair(first: &str, second: &str) -> (String, String) {
    if first <= second {
        (first.to_string(), second.to_string())
    } else {
        (second.to_string(), first.to_string())
    }
}

pub fn pair_key(first: &str, second: &str) -> String {
    let (a, b) = ordered_pair(first, second);
    format!("{}::{}", a, b)
}
