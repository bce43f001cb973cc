//! NPC 名册配置
//!
//! 名册文件描述全部 NPC 以及 Game Master 的唤醒条件，启动时加载一次。

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::models::agent::Agent;

/// 单个事件类型的唤醒条件
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WakeCondition {
    /// 影响半径
    pub radius: f64,
    /// 唤醒概率（阈值判断，不做随机采样）
    pub wake_probability: f64,
}

/// 两个地点之间的显式距离
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LocationDistance {
    pub from: String,
    pub to: String,
    pub distance: f64,
}

/// Game Master 配置
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GameMasterConfig {
    /// 按事件类型索引的唤醒条件
    pub wake_conditions: HashMap<String, WakeCondition>,
    /// 未配置事件类型使用的唤醒概率
    pub default_wake_probability: f64,
    /// 不同地点之间的默认距离
    pub non_colocated_distance: f64,
    /// 显式地点距离表，为空时使用固定距离模型
    pub location_distances: Vec<LocationDistance>,
}

impl Default for GameMasterConfig {
    fn default() -> Self {
        Self {
            wake_conditions: HashMap::new(),
            default_wake_probability: 0.0,
            non_colocated_distance: 10.0,
            location_distances: Vec::new(),
        }
    }
}

/// NPC 名册
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Roster {
    pub game_master: GameMasterConfig,
    pub agents: Vec<Agent>,
}

impl Roster {
    /// 补全名册中缺省的运行时字段
    ///
    /// 未声明当前位置的 NPC 使用日程表第一项的位置。
    pub fn normalize(mut self) -> Self {
        for agent in &mut self.agents {
            if agent.current_location.is_empty() {
                agent.current_location = agent
                    .schedule
                    .first()
                    .map(|entry| entry.location.clone())
                    .unwrap_or_else(|| "unknown".to_string());
            }
        }
        self
    }

    /// 检查名册内的 ID 是否唯一
    pub fn duplicate_ids(&self) -> Vec<String> {
        let mut seen = std::collections::HashSet::new();
        self.agents
            .iter()
            .filter(|a| !seen.insert(a.id.as_str()))
            .map(|a| a.id.clone())
            .collect()
    }
}
