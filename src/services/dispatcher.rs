//! 事件分发器
//!
//! 根据唤醒条件判断哪些 NPC 受世界事件影响，并为每个 NPC 构造反应提示词。
//! 同时持有只追加的事件日志和运行时的 NPC 名册。

use chrono::{DateTime, Utc};
use parking_lot::{Mutex, RwLock};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, info};

use crate::config::roster::{GameMasterConfig, Roster};
use crate::error::{AppError, Result};
use crate::models::agent::{Agent, AgentStateUpdate, ScheduleEntry};
use crate::models::event::{EventRecord, GameEvent};

/// 未配置事件类型的最小影响半径
pub const MIN_FALLBACK_RADIUS: f64 = 5.0;

/// 唤醒概率阈值，严格大于才唤醒
pub const WAKE_THRESHOLD: f64 = 0.5;

/// 地点距离模型
pub trait DistanceModel: Send + Sync {
    fn distance(&self, from: &str, to: &str) -> f64;
}

/// 固定距离：同一地点为 0，其余为常数
#[derive(Debug, Clone)]
pub struct FixedDistance {
    non_colocated: f64,
}

impl FixedDistance {
    pub fn new(non_colocated: f64) -> Self {
        Self { non_colocated }
    }
}

impl DistanceModel for FixedDistance {
    fn distance(&self, from: &str, to: &str) -> f64 {
        if from == to { 0.0 } else { self.non_colocated }
    }
}

/// 显式距离表，未列出的地点对退回固定距离
#[derive(Debug, Clone)]
pub struct DistanceTable {
    table: HashMap<(String, String), f64>,
    fallback: FixedDistance,
}

impl DistanceTable {
    pub fn new(fallback: FixedDistance) -> Self {
        Self {
            table: HashMap::new(),
            fallback,
        }
    }

    /// 添加对称距离
    pub fn insert(&mut self, a: &str, b: &str, distance: f64) {
        self.table.insert((a.to_string(), b.to_string()), distance);
        self.table.insert((b.to_string(), a.to_string()), distance);
    }
}

impl DistanceModel for DistanceTable {
    fn distance(&self, from: &str, to: &str) -> f64 {
        if from == to {
            return 0.0;
        }
        self.table
            .get(&(from.to_string(), to.to_string()))
            .copied()
            .unwrap_or_else(|| self.fallback.distance(from, to))
    }
}

/// 根据 Game Master 配置选择距离模型
pub fn distance_model_from(config: &GameMasterConfig) -> Arc<dyn DistanceModel> {
    let fixed = FixedDistance::new(config.non_colocated_distance);
    if config.location_distances.is_empty() {
        return Arc::new(fixed);
    }
    let mut table = DistanceTable::new(fixed);
    for entry in &config.location_distances {
        table.insert(&entry.from, &entry.to, entry.distance);
    }
    Arc::new(table)
}

/// 待生成的反应
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlannedReaction {
    pub agent: Agent,
    pub prompt: String,
}

/// 一次分发的结果
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Dispatch {
    pub event_id: u64,
    pub timestamp: DateTime<Utc>,
    pub affected_agents: Vec<String>,
    pub reactions: Vec<PlannedReaction>,
}

/// 事件分发器
pub struct EventDispatcher {
    game_master: GameMasterConfig,
    distance: Arc<dyn DistanceModel>,
    agents: RwLock<Vec<Agent>>,
    event_log: Mutex<Vec<EventRecord>>,
}

impl EventDispatcher {
    pub fn new(roster: Roster) -> Self {
        let distance = distance_model_from(&roster.game_master);
        Self {
            game_master: roster.game_master,
            distance,
            agents: RwLock::new(roster.agents),
            event_log: Mutex::new(Vec::new()),
        }
    }

    /// 替换距离模型
    pub fn with_distance_model(mut self, distance: Arc<dyn DistanceModel>) -> Self {
        self.distance = distance;
        self
    }

    /// 事件的影响半径
    pub fn semantic_radius(&self, event: &GameEvent) -> f64 {
        match self.game_master.wake_conditions.get(&event.event_type) {
            Some(condition) => condition.radius,
            None => MIN_FALLBACK_RADIUS.max(event.noise_level / 10.0),
        }
    }

    /// 事件类型的唤醒概率
    pub fn wake_probability(&self, event_type: &str) -> f64 {
        self.game_master
            .wake_conditions
            .get(event_type)
            .map(|c| c.wake_probability)
            .unwrap_or(self.game_master.default_wake_probability)
    }

    /// 受事件影响的 NPC（名册顺序）
    pub fn affected_agents(&self, event: &GameEvent) -> Vec<Agent> {
        let radius = self.semantic_radius(event);
        if self.wake_probability(&event.event_type) <= WAKE_THRESHOLD {
            return Vec::new();
        }

        self.agents
            .read()
            .iter()
            .filter(|agent| {
                self.distance.distance(&event.location, &agent.current_location) <= radius
            })
            .cloned()
            .collect()
    }

    /// 构造反应提示词
    pub fn build_prompt(agent: &Agent, event: &GameEvent) -> String {
        let situation = if event.event_description.trim().is_empty() {
            "An event has occurred nearby."
        } else {
            event.event_description.as_str()
        };
        let location = if event.location.is_empty() {
            "Unknown"
        } else {
            event.location.as_str()
        };

        format!(
            "You are {name}, a {archetype}.\n\
             Personality: {traits}\n\
             Backstory: {backstory}\n\
             \n\
             Current situation: {situation}\n\
             Location: {location}\n\
             \n\
             How do you react? Consider your personality and current emotional state.\n\
             Respond with your immediate thought/action (1-2 sentences).\n",
            name = agent.name,
            archetype = agent.archetype,
            traits = agent.traits_joined(),
            backstory = agent.backstory,
        )
    }

    /// 分发事件：写入事件日志并计算受影响的 NPC
    pub fn dispatch(&self, event: &GameEvent) -> Dispatch {
        let (event_id, timestamp) = {
            let mut log = self.event_log.lock();
            let event_id = log.len() as u64 + 1;
            let timestamp = Utc::now();
            log.push(EventRecord {
                event_id,
                timestamp,
                event: event.clone(),
            });
            (event_id, timestamp)
        };

        let affected = self.affected_agents(event);
        info!(
            event_id,
            event_type = %event.event_type,
            location = %event.location,
            affected = affected.len(),
            "Dispatched event"
        );

        let affected_agents = affected.iter().map(|a| a.id.clone()).collect();
        let reactions = affected
            .into_iter()
            .map(|agent| {
                let prompt = Self::build_prompt(&agent, event);
                PlannedReaction { agent, prompt }
            })
            .collect();

        Dispatch {
            event_id,
            timestamp,
            affected_agents,
            reactions,
        }
    }

    /// 当前名册快照
    pub fn agents(&self) -> Vec<Agent> {
        self.agents.read().clone()
    }

    pub fn agent(&self, id: &str) -> Option<Agent> {
        self.agents.read().iter().find(|a| a.id == id).cloned()
    }

    /// 更新 NPC 的位置和情绪状态
    pub fn update_agent_state(&self, id: &str, update: &AgentStateUpdate) -> Result<Agent> {
        let mut agents = self.agents.write();
        let agent = agents
            .iter_mut()
            .find(|a| a.id == id)
            .ok_or_else(|| AppError::NotFound(format!("Agent not found: {}", id)))?;

        if let Some(location) = &update.location {
            agent.current_location = location.clone();
        }
        if let Some(emotional_state) = &update.emotional_state {
            agent.emotional_state = emotional_state.clone();
        }
        debug!(agent = id, location = %agent.current_location, emotion = %agent.emotional_state, "Agent state updated");
        Ok(agent.clone())
    }

    /// NPC 日程表的第一项
    pub fn agent_schedule(&self, id: &str) -> Option<ScheduleEntry> {
        self.agents
            .read()
            .iter()
            .find(|a| a.id == id)
            .and_then(|a| a.schedule.first().cloned())
    }

    /// 事件日志快照
    pub fn event_log(&self) -> Vec<EventRecord> {
        self.event_log.lock().clone()
    }

    pub fn event_count(&self) -> usize {
        self.event_log.lock().len()
    }
}
