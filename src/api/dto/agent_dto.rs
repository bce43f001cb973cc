//! NPC DTO

use serde::{Deserialize, Serialize};

use crate::models::agent::Agent;

/// NPC 列表响应
#[derive(Debug, Serialize, Deserialize)]
pub struct AgentListResponse {
    pub agents: Vec<Agent>,
}

/// 服务信息
#[derive(Debug, Serialize, Deserialize)]
pub struct ServiceBanner {
    pub service: String,
    pub status: String,
    pub version: String,
}
