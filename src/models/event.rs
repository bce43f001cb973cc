//! 世界事件数据模型

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};

fn default_instigator() -> String {
    "player".to_string()
}

/// 显式 null 与缺省字段同样取默认值
fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de> + Default,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

fn null_as_player<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<String>::deserialize(deserializer)?.unwrap_or_else(default_instigator))
}

/// 来自游戏客户端的世界事件
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GameEvent {
    /// 事件类型（如 property_damage）
    pub event_type: String,

    /// 具体动作（如 break_glass）
    #[serde(default, deserialize_with = "null_as_default")]
    pub action: String,

    /// 发生地点
    pub location: String,

    /// 噪声/强度
    #[serde(default, deserialize_with = "null_as_default")]
    pub noise_level: f64,

    /// 事件描述
    #[serde(default, deserialize_with = "null_as_default")]
    pub event_description: String,

    /// 发起者
    #[serde(default = "default_instigator", deserialize_with = "null_as_player")]
    pub instigator_id: String,
}

impl GameEvent {
    /// 创建新事件
    pub fn new(event_type: &str, location: &str, description: &str) -> Self {
        Self {
            event_type: event_type.to_string(),
            action: String::new(),
            location: location.to_string(),
            noise_level: 0.0,
            event_description: description.to_string(),
            instigator_id: default_instigator(),
        }
    }

    pub fn with_noise(mut self, noise_level: f64) -> Self {
        self.noise_level = noise_level;
        self
    }

    pub fn with_action(mut self, action: &str) -> Self {
        self.action = action.to_string();
        self
    }

    pub fn with_instigator(mut self, instigator_id: &str) -> Self {
        self.instigator_id = instigator_id.to_string();
        self
    }

    /// 事件写入记忆时的重要性
    ///
    /// 噪声按 0-100 映射到 [0, 1]，无噪声时取 0.5。
    pub fn memory_importance(&self) -> f64 {
        if self.noise_level > 0.0 {
            (self.noise_level / 100.0).clamp(0.0, 1.0)
        } else {
            0.5
        }
    }
}

/// 事件日志条目
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EventRecord {
    /// 日志序号（从 1 开始）
    pub event_id: u64,
    /// 记录时间
    pub timestamp: DateTime<Utc>,
    /// 原始事件
    pub event: GameEvent,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_from_json() {
        let event: GameEvent = serde_json::from_value(serde_json::json!({
            "event_type": "property_damage",
            "action": "break_glass",
            "location": "apartment_1a",
            "event_description": "A window has been shattered."
        }))
        .unwrap();

        assert_eq!(event.noise_level, 0.0);
        assert_eq!(event.instigator_id, "player");

        let event: GameEvent = serde_json::from_value(serde_json::json!({
            "event_type": "property_damage",
            "action": null,
            "location": "apartment_1a",
            "noise_level": null,
            "event_description": null,
            "instigator_id": null
        }))
        .unwrap();

        assert_eq!(event.noise_level, 0.0);
        assert_eq!(event.instigator_id, "player");
        assert!(event.action.is_empty());
        assert!(event.event_description.is_empty());

        let event: GameEvent = serde_json::from_value(serde_json::json!({
            "event_type": "gunshot",
            "location": "alley",
            "noise_level": 95.0,
            "instigator_id": "landlord_01"
        }))
        .unwrap();
        assert_eq!(event.noise_level, 95.0);
        assert_eq!(event.instigator_id, "landlord_01");
    }

    #[test]
    fn test_memory_importance() {
        let event = GameEvent::new("gunshot", "alley", "Bang");
        assert_eq!(event.memory_importance(), 0.5);
        assert_eq!(event.clone().with_noise(90.0).memory_importance(), 0.9);
        assert_eq!(event.with_noise(250.0).memory_importance(), 1.0);
    }
}
