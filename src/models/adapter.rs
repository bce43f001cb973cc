//! 人格适配器句柄与缓存状态

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// 适配器旁路元数据文件内容
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AdapterMetadata {
    pub character_type: Option<String>,
    pub traits: Vec<String>,
}

impl AdapterMetadata {
    /// 拼接到生成提示词前的角色描述
    pub fn prompt_prefix(&self) -> String {
        if self.traits.is_empty() {
            String::new()
        } else {
            format!("Character traits: {}. ", self.traits.join(", "))
        }
    }
}

/// 已加载的人格适配器
///
/// 由适配器缓存独占，调用方拿到的是克隆。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AdapterHandle {
    /// 适配器名称
    pub name: String,
    /// 文件路径
    pub path: PathBuf,
    /// 加载时间
    pub loaded_at: DateTime<Utc>,
    /// 元数据
    pub metadata: Option<AdapterMetadata>,
}

impl AdapterHandle {
    pub fn prompt_prefix(&self) -> String {
        self.metadata
            .as_ref()
            .map(AdapterMetadata::prompt_prefix)
            .unwrap_or_default()
    }
}

/// 缓存状态
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CacheStatus {
    /// 驻留的适配器，最近使用的在前
    pub loaded_adapters: Vec<String>,
    pub cache_size: usize,
    pub max_cache_size: usize,
    pub utilization: f64,
    pub hits: u64,
    pub misses: u64,
    pub evictions: u64,
}

/// 预加载失败项
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PreloadFailure {
    pub name: String,
    pub error: String,
}

/// 预加载结果
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PreloadReport {
    pub loaded: Vec<String>,
    pub failed: Vec<PreloadFailure>,
}
