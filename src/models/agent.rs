//! NPC 数据模型
//!
//! NPC 的静态档案来自名册，位置与情绪状态由事件分发器在运行时修改。

use serde::{Deserialize, Serialize};

/// 默认情绪状态
pub const NEUTRAL_EMOTION: &str = "neutral";

fn default_emotional_state() -> String {
    NEUTRAL_EMOTION.to_string()
}

fn default_voice_id() -> String {
    "default".to_string()
}

/// 日程表条目
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScheduleEntry {
    /// 时间（如 "08:00"）
    pub time: String,
    /// 所在地点
    pub location: String,
    /// 正在进行的活动
    pub activity: String,
}

/// NPC
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Agent {
    /// 唯一标识
    pub id: String,

    /// 显示名称
    pub name: String,

    /// 原型，决定默认适配器
    pub archetype: String,

    /// 有序的人格特质标签
    #[serde(default)]
    pub personality_traits: Vec<String>,

    /// 背景故事
    #[serde(default)]
    pub backstory: String,

    /// 当前位置
    #[serde(default)]
    pub current_location: String,

    /// 当前情绪状态
    #[serde(default = "default_emotional_state")]
    pub emotional_state: String,

    /// 人格适配器名称，缺省为 `{archetype}.lora`
    #[serde(default, alias = "lora_adapter")]
    pub adapter: Option<String>,

    /// 语音标识
    #[serde(default = "default_voice_id")]
    pub voice_id: String,

    /// 日程表
    #[serde(default)]
    pub schedule: Vec<ScheduleEntry>,
}

impl Agent {
    /// 创建新 NPC
    pub fn new(id: &str, name: &str, archetype: &str) -> Self {
        Self {
            id: id.to_string(),
            name: name.to_string(),
            archetype: archetype.to_string(),
            personality_traits: Vec::new(),
            backstory: String::new(),
            current_location: "unknown".to_string(),
            emotional_state: default_emotional_state(),
            adapter: None,
            voice_id: default_voice_id(),
            schedule: Vec::new(),
        }
    }

    /// 设置位置
    pub fn at(mut self, location: &str) -> Self {
        self.current_location = location.to_string();
        self
    }

    /// 设置人格特质
    pub fn with_traits(mut self, traits: &[&str]) -> Self {
        self.personality_traits = traits.iter().map(|t| t.to_string()).collect();
        self
    }

    /// 设置背景故事
    pub fn with_backstory(mut self, backstory: &str) -> Self {
        self.backstory = backstory.to_string();
        self
    }

    /// 设置适配器
    pub fn with_adapter(mut self, adapter: &str) -> Self {
        self.adapter = Some(adapter.to_string());
        self
    }

    /// 实际使用的适配器名称
    pub fn adapter_name(&self) -> String {
        self.adapter
            .clone()
            .unwrap_or_else(|| format!("{}.lora", self.archetype))
    }

    /// 逗号连接的人格特质
    pub fn traits_joined(&self) -> String {
        self.personality_traits.join(", ")
    }
}

/// NPC 状态更新
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AgentStateUpdate {
    pub location: Option<String>,
    pub emotional_state: Option<String>,
}

impl AgentStateUpdate {
    pub fn is_empty(&self) -> bool {
        self.location.is_none() && self.emotional_state.is_none()
    }
}
