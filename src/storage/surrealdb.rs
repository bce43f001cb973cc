use crate::config::config::DatabaseConfig;
use crate::error::{AppError, Result};
use std::sync::Arc;
use surrealdb::{
    Surreal,
    engine::any::{Any, connect},
    opt::auth::Root,
};
use tokio::sync::Mutex;

/// 表结构定义，启动时执行，可重复执行
const SCHEMA: &str = "
DEFINE TABLE IF NOT EXISTS agents SCHEMALESS;

DEFINE TABLE IF NOT EXISTS episodic_memory SCHEMALESS;
DEFINE FIELD IF NOT EXISTS agent_id ON TABLE episodic_memory TYPE string;
DEFINE FIELD IF NOT EXISTS description ON TABLE episodic_memory TYPE string;
DEFINE FIELD IF NOT EXISTS importance ON TABLE episodic_memory TYPE number
    ASSERT $value >= 0 AND $value <= 1;
DEFINE FIELD IF NOT EXISTS created_at ON TABLE episodic_memory TYPE int;
DEFINE INDEX IF NOT EXISTS episodic_memory_agent ON TABLE episodic_memory COLUMNS agent_id;

DEFINE TABLE IF NOT EXISTS relationships SCHEMALESS;
DEFINE INDEX IF NOT EXISTS relationships_a ON TABLE relationships COLUMNS agent_a;
DEFINE INDEX IF NOT EXISTS relationships_b ON TABLE relationships COLUMNS agent_b;

DEFINE TABLE IF NOT EXISTS world_objects SCHEMALESS;
";

/// SurrealDB 连接池
#[derive(Clone)]
pub struct SurrealPool {
    /// 数据库连接
    db: Arc<Mutex<Option<Surreal<Any>>>>,
    /// 连接配置
    config: DatabaseConfig,
}

impl SurrealPool {
    /// 创建新的连接池并初始化表结构
    pub async fn new(config: DatabaseConfig) -> std::result::Result<Self, surrealdb::Error> {
        let db: Surreal<Any> = connect(config.url.as_str()).await?;

        // 嵌入式引擎不需要认证
        if !config.username.is_empty() {
            db.signin(Root {
                username: &config.username,
                password: &config.password,
            })
            .await?;
        }

        // 选择命名空间和数据库
        db.use_ns(config.namespace.as_str())
            .use_db(config.database.as_str())
            .await?;

        db.query(SCHEMA).await?.check()?;

        tracing::debug!(url = %config.url, "SurrealDB schema ready");

        Ok(Self {
            db: Arc::new(Mutex::new(Some(db))),
            config,
        })
    }

    /// 创建独立的内存数据库，用于测试和临时运行
    pub async fn in_memory() -> std::result::Result<Self, surrealdb::Error> {
        Self::new(DatabaseConfig {
            url: "mem://".into(),
            namespace: "spector".into(),
            database: "world".into(),
            username: String::new(),
            password: String::new(),
        })
        .await
    }

    /// 获取内部数据库实例
    pub async fn inner(&self) -> Result<Surreal<Any>> {
        let guard = self.db.lock().await;
        guard
            .as_ref()
            .cloned()
            .ok_or_else(|| AppError::Storage("database connection closed".into()))
    }

    /// 连接配置
    pub fn config(&self) -> &DatabaseConfig {
        &self.config
    }

    /// 健康检查
    pub async fn ping(&self) -> Result<()> {
        self.inner().await?.health().await?;
        Ok(())
    }

    /// 关闭连接
    pub async fn close(&self) {
        let mut guard = self.db.lock().await;
        *guard = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_in_memory_pool_ping_and_close() {
        let pool = SurrealPool::in_memory().await.unwrap();
        assert!(pool.ping().await.is_ok());

        pool.close().await;
        assert!(matches!(pool.inner().await, Err(AppError::Storage(_))));
        assert!(pool.ping().await.is_err());
    }

    #[tokio::test]
    async fn test_schema_is_idempotent() {
        let pool = SurrealPool::in_memory().await.unwrap();
        let db = pool.inner().await.unwrap();
        assert!(db.query(SCHEMA).await.unwrap().check().is_ok());
    }
}
