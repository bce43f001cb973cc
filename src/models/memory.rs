//! 情景记忆数据模型
//!
//! 记忆创建后不可修改，"更新"以新增记忆的方式表达。

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// 默认事件类型
pub const OBSERVATION: &str = "observation";

/// 情景记忆
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Memory {
    /// 记忆唯一标识
    pub id: String,
    /// 所属 NPC
    pub agent_id: String,
    /// 事件类型
    pub event_type: String,
    /// 描述
    pub description: String,
    /// 地点
    pub location: Option<String>,
    /// 重要性 (0.0-1.0)
    pub importance: f64,
    /// 创建时间
    pub created_at: DateTime<Utc>,
}

/// 待写入的记忆
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewMemory {
    pub agent_id: String,
    pub event_type: String,
    pub description: String,
    pub location: Option<String>,
    pub importance: f64,
}

impl NewMemory {
    /// 创建一条观察类记忆，重要性 0.5
    pub fn observation(agent_id: &str, description: &str) -> Self {
        Self {
            agent_id: agent_id.to_string(),
            event_type: OBSERVATION.to_string(),
            description: description.to_string(),
            location: None,
            importance: 0.5,
        }
    }

    pub fn with_event_type(mut self, event_type: &str) -> Self {
        self.event_type = event_type.to_string();
        self
    }

    pub fn with_location(mut self, location: &str) -> Self {
        self.location = Some(location.to_string());
        self
    }

    pub fn with_importance(mut self, importance: f64) -> Self {
        self.importance = importance;
        self
    }

    /// 分配 ID 和时间戳
    pub fn into_memory(self) -> Memory {
        Memory {
            id: uuid::Uuid::new_v4().to_string(),
            agent_id: self.agent_id,
            event_type: self.event_type,
            description: self.description,
            location: self.location,
            importance: self.importance,
            created_at: Utc::now(),
        }
    }
}

/// 记忆检索条件
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MemoryQuery {
    /// 关键词（大小写不敏感的子串匹配）
    pub query: String,
    /// 限定 NPC
    pub agent_id: Option<String>,
    /// 返回数量上限
    pub top_k: usize,
    /// 最低重要性
    pub importance_threshold: f64,
}

impl Default for MemoryQuery {
    fn default() -> Self {
        Self {
            query: String::new(),
            agent_id: None,
            top_k: 5,
            importance_threshold: 0.0,
        }
    }
}

impl MemoryQuery {
    pub fn new(query: &str) -> Self {
        Self {
            query: query.to_string(),
            ..Self::default()
        }
    }

    pub fn for_agent(mut self, agent_id: &str) -> Self {
        self.agent_id = Some(agent_id.to_string());
        self
    }

    pub fn with_top_k(mut self, top_k: usize) -> Self {
        self.top_k = top_k;
        self
    }

    pub fn with_importance_threshold(mut self, threshold: f64) -> Self {
        self.importance_threshold = threshold;
        self
    }
}
