use crate::config::config::AppConfig;
use crate::config::roster::Roster;
use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml, Yaml},
};
use std::path::{Path, PathBuf};

/// 配置文件路径环境变量
pub const CONFIG_PATH_ENV: &str = "SPECTOR_CONFIG";

/// 环境变量前缀
const ENV_PREFIX: &str = "SPECTOR_";

/// 配置加载器
pub struct ConfigLoader;

impl ConfigLoader {
    /// 从默认路径加载配置
    ///
    /// 优先级（低到高）：
    /// 1. 开发环境默认值
    /// 2. `SPECTOR_CONFIG` 指向的文件，缺省为 ./spector.toml
    /// 3. `SPECTOR_` 前缀环境变量，层级以 `__` 分隔
    pub fn load() -> Result<AppConfig, figment::Error> {
        let path = std::env::var(CONFIG_PATH_ENV)
            .map(PathBuf::from)
            .unwrap_or_else(|_| default_config_path());
        Self::load_from(path)
    }

    /// 从指定路径加载配置
    pub fn load_from(path: impl AsRef<Path>) -> Result<AppConfig, figment::Error> {
        Self::figment(path.as_ref()).extract()
    }

    fn figment(path: &Path) -> Figment {
        Figment::from(Serialized::defaults(AppConfig::development()))
            .merge(Toml::file(path))
            .merge(Env::prefixed(ENV_PREFIX).split("__"))
    }

    /// 加载 NPC 名册
    pub fn load_roster(path: impl AsRef<Path>) -> Result<Roster, figment::Error> {
        let roster: Roster = Figment::new().merge(Yaml::file(path.as_ref())).extract()?;
        Ok(roster.normalize())
    }

    /// 验证配置
    pub fn validate(config: &AppConfig) -> Result<(), ConfigValidationError> {
        if config.server.port == 0 {
            return Err(ConfigValidationError::InvalidPort);
        }

        if config.database.url.is_empty() {
            return Err(ConfigValidationError::MissingDatabaseUrl);
        }

        if config.adapters.max_cache_size == 0 {
            return Err(ConfigValidationError::InvalidCacheSize);
        }

        if !matches!(config.generation.backend.as_str(), "mock" | "ollama") {
            return Err(ConfigValidationError::UnknownBackend(
                config.generation.backend.clone(),
            ));
        }

        if config.generation.timeout_secs == 0 {
            return Err(ConfigValidationError::InvalidGenerationTimeout);
        }

        if config.generation.fallback_phrase.trim().is_empty() {
            return Err(ConfigValidationError::EmptyFallbackPhrase);
        }

        Ok(())
    }
}

/// 配置验证错误
#[derive(thiserror::Error, Debug, PartialEq)]
pub enum ConfigValidationError {
    #[error("服务端口无效，必须大于 0")]
    InvalidPort,

    #[error("数据库连接 URL 未配置")]
    MissingDatabaseUrl,

    #[error("适配器缓存容量无效，必须大于 0")]
    InvalidCacheSize,

    #[error("未知的生成后端: {0}")]
    UnknownBackend(String),

    #[error("生成超时无效，必须大于 0 秒")]
    InvalidGenerationTimeout,

    #[error("兜底台词不能为空")]
    EmptyFallbackPhrase,
}

/// 获取默认配置文件路径
pub fn default_config_path() -> PathBuf {
    PathBuf::from("spector.toml")
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_load_from_missing_file_uses_defaults() {
        let config = ConfigLoader::load_from("/nonexistent/spector.toml").unwrap();
        assert_eq!(config.adapters.max_cache_size, 3);
        assert_eq!(config.generation.backend, "mock");
        assert!(ConfigLoader::validate(&config).is_ok());
    }

    #[test]
    fn test_toml_overrides_defaults() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            r#"
[server]
port = 9100

[adapters]
max_cache_size = 5
directory = "/srv/loras"
"#
        )
        .unwrap();

        let config = ConfigLoader::load_from(file.path()).unwrap();
        assert_eq!(config.server.port, 9100);
        assert_eq!(config.adapters.max_cache_size, 5);
        assert_eq!(config.adapters.directory, PathBuf::from("/srv/loras"));
        // untouched sections keep their defaults
        assert_eq!(config.memory.context_memories, 5);
    }

    #[test]
    fn test_validate_rejects_bad_values() {
        let mut config = AppConfig::development();
        config.adapters.max_cache_size = 0;
        assert_eq!(
            ConfigLoader::validate(&config),
            Err(ConfigValidationError::InvalidCacheSize)
        );

        let mut config = AppConfig::development();
        config.generation.backend = "gpt".into();
        assert_eq!(
            ConfigLoader::validate(&config),
            Err(ConfigValidationError::UnknownBackend("gpt".into()))
        );

        let mut config = AppConfig::development();
        config.generation.timeout_secs = 0;
        assert_eq!(
            ConfigLoader::validate(&config),
            Err(ConfigValidationError::InvalidGenerationTimeout)
        );

        let mut config = AppConfig::development();
        config.server.port = 0;
        assert_eq!(
            ConfigLoader::validate(&config),
            Err(ConfigValidationError::InvalidPort)
        );
    }

    #[test]
    fn test_load_roster_yaml() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            r#"
game_master:
  wake_conditions:
    property_damage:
      radius: 15
      wake_probability: 0.8
agents:
  - id: student_01
    name: Alex Chen
    archetype: student
    lora_adapter: student.lora
    personality_traits: [anxious, curious]
    backstory: Graduate student living alone.
    voice_id: en_US-amy
    schedule:
      - time: "08:00"
        location: apartment_1a
        activity: studying
"#
        )
        .unwrap();

        let roster = ConfigLoader::load_roster(file.path()).unwrap();
        let condition = &roster.game_master.wake_conditions["property_damage"];
        assert_eq!(condition.radius, 15.0);
        assert_eq!(condition.wake_probability, 0.8);

        let agent = &roster.agents[0];
        assert_eq!(agent.adapter.as_deref(), Some("student.lora"));
        assert_eq!(agent.personality_traits, vec!["anxious", "curious"]);
        assert_eq!(agent.current_location, "apartment_1a");
        assert_eq!(agent.emotional_state, "neutral");
    }
}
