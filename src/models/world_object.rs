//! 世界物体

use serde::{Deserialize, Serialize};

/// 可被检索的世界物体，按 ID 插入或替换
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorldObject {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub location: String,
    #[serde(default)]
    pub significance: f64,
}

impl WorldObject {
    pub fn new(id: &str, name: &str, description: &str, location: &str) -> Self {
        Self {
            id: id.to_string(),
            name: name.to_string(),
            description: description.to_string(),
            location: location.to_string(),
            significance: 0.0,
        }
    }

    pub fn with_significance(mut self, significance: f64) -> Self {
        self.significance = significance;
        self
    }
}
