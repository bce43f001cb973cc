//! 适配器 DTO

use serde::Deserialize;

/// 预加载请求
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct PreloadRequest {
    /// 适配器名称，如 `baker.lora`
    pub adapters: Vec<String>,
}
