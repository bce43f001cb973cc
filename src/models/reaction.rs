//! NPC 反应与对话结果

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::models::context::AgentContext;

/// 单个 NPC 对事件的反应
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AgentReaction {
    pub agent_id: String,
    pub agent_name: String,
    pub adapter_name: String,
    /// 分发器构造的提示词
    pub prompt: String,
    pub context: AgentContext,
    pub generated_response: String,
    /// 使用兜底台词的原因
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fallback_reason: Option<String>,
}

/// 事件处理结果
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EventResponse {
    pub event_id: u64,
    pub timestamp: DateTime<Utc>,
    pub affected_agents: Vec<String>,
    pub agent_reactions: Vec<AgentReaction>,
}

/// 玩家对话请求
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DialogueRequest {
    pub npc_id: String,
    pub player_message: String,
    /// 调用方附加的场景信息（如 time_of_day）
    #[serde(default)]
    pub context: Option<BTreeMap<String, String>>,
}

/// 对话结果
#[derive(Debug, Clone, PartialEq)]
pub struct DialogueReply {
    pub npc_id: String,
    pub text_response: String,
    /// WAV 音频，合成失败时为空
    pub audio: Vec<u8>,
    pub emotional_state: String,
    pub fallback_reason: Option<String>,
}
