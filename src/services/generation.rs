//! 文本生成后端
//!
//! `mock` 后端按关键词返回固定台词，`ollama` 后端调用本地 Ollama 服务。

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

use crate::config::config::GenerationConfig;
use crate::error::{AppError, Result};
use crate::models::adapter::AdapterHandle;

/// 生成请求
#[derive(Debug, Clone, PartialEq)]
pub struct GenerationRequest {
    pub prompt: String,
    /// 为空时使用基础模型
    pub adapter: Option<AdapterHandle>,
    pub max_tokens: u32,
    pub temperature: f32,
}

impl GenerationRequest {
    pub fn new(prompt: String, config: &GenerationConfig) -> Self {
        Self {
            prompt,
            adapter: None,
            max_tokens: config.max_tokens,
            temperature: config.temperature,
        }
    }

    pub fn with_adapter(mut self, adapter: Option<AdapterHandle>) -> Self {
        self.adapter = adapter;
        self
    }
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait TextGenerator: Send + Sync {
    async fn generate(&self, request: &GenerationRequest) -> Result<String>;

    /// 后端名称
    fn backend(&self) -> &'static str;
}

/// 离线生成器，按提示词中的关键词返回固定台词
pub struct MockGenerator {
    default_reply: String,
}

const CANNED_REPLIES: &[(&[&str], &str)] = &[
    (&["grumpy", "baker"], "I don't have time for this nonsense!"),
    (
        &["cop", "opportunistic"],
        "Looks like we've got a situation here. What's it worth to you?",
    ),
    (
        &["anxious", "student"],
        "Oh no, I really can't deal with this right now!",
    ),
    (
        &["landlord", "vigilante"],
        "Someone's going to pay for this damage to my property.",
    ),
];

impl MockGenerator {
    pub fn new(default_reply: &str) -> Self {
        Self {
            default_reply: default_reply.to_string(),
        }
    }
}

#[async_trait]
impl TextGenerator for MockGenerator {
    async fn generate(&self, request: &GenerationRequest) -> Result<String> {
        let prompt = request.prompt.to_lowercase();
        let reply = CANNED_REPLIES
            .iter()
            .find(|(keywords, _)| keywords.iter().any(|k| prompt.contains(k)))
            .map(|(_, reply)| *reply)
            .unwrap_or(self.default_reply.as_str());
        Ok(reply.to_string())
    }

    fn backend(&self) -> &'static str {
        "mock"
    }
}

/// Ollama 文本生成客户端
pub struct OllamaGenerator {
    client: reqwest::Client,
    base_url: String,
    model: String,
}

#[derive(Serialize)]
struct OllamaOptions {
    num_predict: u32,
    temperature: f32,
}

#[derive(Serialize)]
struct OllamaGenerateRequest<'a> {
    model: &'a str,
    prompt: &'a str,
    stream: bool,
    options: OllamaOptions,
}

#[derive(Deserialize)]
struct OllamaGenerateResponse {
    response: String,
}

impl OllamaGenerator {
    pub fn new(base_url: &str, model: &str, timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            model: model.to_string(),
        })
    }
}

#[async_trait]
impl TextGenerator for OllamaGenerator {
    async fn generate(&self, request: &GenerationRequest) -> Result<String> {
        if let Some(adapter) = &request.adapter {
            debug!(adapter = %adapter.name, model = %self.model, "Generating with adapter");
        }

        let response = self
            .client
            .post(format!("{}/api/generate", self.base_url))
            .json(&OllamaGenerateRequest {
                model: &self.model,
                prompt: &request.prompt,
                stream: false,
                options: OllamaOptions {
                    num_predict: request.max_tokens,
                    temperature: request.temperature,
                },
            })
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await.unwrap_or_default();
            return Err(AppError::Generation(format!(
                "Ollama generate failed ({}): {}",
                status, error_text
            )));
        }

        let body: OllamaGenerateResponse = response.json().await?;
        Ok(body.response.trim().to_string())
    }

    fn backend(&self) -> &'static str {
        "ollama"
    }
}

pub fn create_text_generator(config: &GenerationConfig) -> Result<Arc<dyn TextGenerator>> {
    match config.backend.as_str() {
        "ollama" => {
            let generator = OllamaGenerator::new(
                &config.ollama_url,
                &config.model,
                Duration::from_secs(config.timeout_secs),
            )?;
            Ok(Arc::new(generator))
        }
        "mock" => Ok(Arc::new(MockGenerator::new(&config.fallback_phrase))),
        other => Err(AppError::Config(format!(
            "Unknown generation backend: {}",
            other
        ))),
    }
}
