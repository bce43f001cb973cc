//! 对话 DTO

use serde::{Deserialize, Serialize};
use std::fmt::Write as _;

use crate::models::reaction::DialogueReply;

/// 对话响应
#[derive(Debug, Serialize, Deserialize)]
pub struct DialogueResponse {
    pub npc_id: String,
    pub text_response: String,
    /// 十六进制编码的 WAV 音频，合成失败时为空串
    pub audio_bytes: String,
    pub emotional_state: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fallback_reason: Option<String>,
}

fn to_hex(bytes: &[u8]) -> String {
    let mut out = String::with_capacity(bytes.len() * 2);
    for b in bytes {
        let _ = write!(out, "{:02x}", b);
    }
    out
}

impl From<DialogueReply> for DialogueResponse {
    fn from(reply: DialogueReply) -> Self {
        Self {
            npc_id: reply.npc_id,
            text_response: reply.text_response,
            audio_bytes: to_hex(&reply.audio),
            emotional_state: reply.emotional_state,
            fallback_reason: reply.fallback_reason,
        }
    }
}
