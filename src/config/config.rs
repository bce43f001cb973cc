use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// 数据库配置
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct DatabaseConfig {
    /// SurrealDB 连接地址（`mem://`、`rocksdb://path`、`ws://host:port`）
    pub url: String,
    /// 命名空间
    pub namespace: String,
    /// 数据库名称
    pub database: String,
    /// 用户名，为空时跳过认证（嵌入式引擎）
    pub username: String,
    /// 密码
    pub password: String,
}

/// 服务器配置
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct ServerConfig {
    /// 服务地址
    pub host: String,
    /// 服务端口
    pub port: u16,
    /// 允许跨域的来源，空列表表示允许任意来源
    pub cors_origins: Vec<String>,
}

/// 人格适配器配置
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct AdapterConfig {
    /// 适配器文件目录
    pub directory: PathBuf,
    /// 同时驻留的最大适配器数量
    pub max_cache_size: usize,
    /// 启动时预加载的适配器
    pub preload: Vec<String>,
}

/// 文本生成后端配置
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct GenerationConfig {
    /// 后端类型: "mock" 或 "ollama"
    pub backend: String,
    /// Ollama 服务器地址
    pub ollama_url: String,
    /// 基础模型名称
    pub model: String,
    /// 最大生成 token 数
    pub max_tokens: u32,
    /// 采样温度
    pub temperature: f32,
    /// 单次生成超时（秒）
    pub timeout_secs: u64,
    /// 生成失败时使用的固定台词
    pub fallback_phrase: String,
}

/// 语音合成配置
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct VoiceConfig {
    /// 采样率
    pub sample_rate: u32,
}

/// 记忆检索配置
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct MemoryConfig {
    /// 上下文中携带的相关记忆数量
    pub context_memories: usize,
    /// 上下文中携带的关系数量
    pub context_relationships: usize,
}

/// 日志配置
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct LoggingConfig {
    /// 日志级别
    pub level: String,
    /// 结构化日志格式
    pub structured: bool,
    /// 日志文件目录
    pub log_dir: Option<PathBuf>,
}

/// 应用配置
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct AppConfig {
    /// 服务器配置
    pub server: ServerConfig,
    /// 数据库配置
    pub database: DatabaseConfig,
    /// 适配器配置
    pub adapters: AdapterConfig,
    /// 文本生成配置
    pub generation: GenerationConfig,
    /// 语音合成配置
    pub voice: VoiceConfig,
    /// 记忆检索配置
    pub memory: MemoryConfig,
    /// 日志配置
    pub logging: LoggingConfig,
    /// NPC 名册文件（YAML）
    pub roster_path: PathBuf,
    /// 应用名称
    pub app_name: String,
    /// 环境
    pub environment: String,
}

impl AppConfig {
    /// 创建开发环境配置
    pub fn development() -> Self {
        Self {
            server: ServerConfig {
                host: "0.0.0.0".into(),
                port: 8000,
                cors_origins: Vec::new(),
            },
            database: DatabaseConfig {
                url: "mem://".into(),
                namespace: "spector".into(),
                database: "world".into(),
                username: String::new(),
                password: String::new(),
            },
            adapters: AdapterConfig {
                directory: PathBuf::from("models/loras"),
                max_cache_size: 3,
                preload: Vec::new(),
            },
            generation: GenerationConfig {
                backend: "mock".into(),
                ollama_url: "http://localhost:11434".into(),
                model: "llama3:8b".into(),
                max_tokens: 100,
                temperature: 0.7,
                timeout_secs: 30,
                fallback_phrase: "I need to respond to this situation carefully.".into(),
            },
            voice: VoiceConfig { sample_rate: 22050 },
            memory: MemoryConfig {
                context_memories: 5,
                context_relationships: 5,
            },
            logging: LoggingConfig {
                level: "debug".into(),
                structured: false,
                log_dir: None,
            },
            roster_path: PathBuf::from("config/agents.yaml"),
            app_name: "spector".into(),
            environment: "development".into(),
        }
    }

    /// 创建生产环境配置
    pub fn production() -> Self {
        let mut config = Self::development();
        config.environment = "production".into();
        config.logging.level = "info".into();
        config.logging.structured = true;
        config.logging.log_dir = Some(PathBuf::from("./logs"));
        config.database.url = "rocksdb://data/spector.db".into();
        config
    }
}
