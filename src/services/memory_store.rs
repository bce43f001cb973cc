//! 记忆存储服务
//!
//! 在 [`WorldRepository`] 之上提供记忆、关系和世界物体的读写。
//! 写操作返回存储错误，读操作在存储故障时降级为空结果并记录警告。

use chrono::Utc;
use std::sync::Arc;
use tracing::{debug, warn};

use crate::config::config::MemoryConfig;
use crate::error::{AppError, Result};
use crate::models::agent::{Agent, NEUTRAL_EMOTION};
use crate::models::context::AgentContext;
use crate::models::memory::{Memory, MemoryQuery, NewMemory};
use crate::models::relationship::{ACQUAINTANCE, DEFAULT_TRUST, Relationship, RelationshipView};
use crate::models::world_object::WorldObject;
use crate::storage::repository::WorldRepository;

/// 读失败时记录警告并返回默认值
fn degrade<T: Default>(operation: &str, result: Result<T>) -> T {
    match result {
        Ok(value) => value,
        Err(e) => {
            let degraded = AppError::StorageReadDegraded(format!("{}: {}", operation, e));
            warn!(operation, error = %degraded, "Storage read degraded to empty result");
            T::default()
        }
    }
}

/// 记忆存储
#[derive(Clone)]
pub struct MemoryStore {
    repo: Arc<dyn WorldRepository>,
    context_memories: usize,
    context_relationships: usize,
}

impl MemoryStore {
    pub fn new(repo: Arc<dyn WorldRepository>, config: &MemoryConfig) -> Self {
        Self {
            repo,
            context_memories: config.context_memories,
            context_relationships: config.context_relationships,
        }
    }

    /// 写入记忆，返回新记忆 ID
    pub async fn store(&self, memory: NewMemory) -> Result<String> {
        let memory = memory.into_memory();
        self.repo.insert_memory(&memory).await?;
        debug!(memory_id = %memory.id, agent_id = %memory.agent_id, "Stored memory");
        Ok(memory.id)
    }

    /// 检索记忆（新到旧）
    pub async fn retrieve(&self, query: &MemoryQuery) -> Vec<Memory> {
        degrade("retrieve_memories", self.repo.search_memories(query).await)
    }

    /// 组装 NPC 上下文，各部分独立降级
    pub async fn context(&self, agent_id: &str, current_event: &str) -> AgentContext {
        let query = MemoryQuery::new(current_event)
            .for_agent(agent_id)
            .with_top_k(self.context_memories);
        let relevant_memories = self.retrieve(&query).await;

        let relationships = self
            .relationships(agent_id, self.context_relationships)
            .await;

        let agent = degrade("get_agent", self.repo.get_agent(agent_id).await);
        let emotional_state = agent
            .as_ref()
            .map(|a| a.emotional_state.clone())
            .unwrap_or_else(|| NEUTRAL_EMOTION.to_string());

        AgentContext {
            agent,
            relevant_memories,
            relationships,
            emotional_state,
        }
    }

    /// 写入或替换世界物体
    pub async fn store_object(&self, object: &WorldObject) -> Result<()> {
        self.repo.upsert_object(object).await
    }

    /// 按名称或描述检索物体
    pub async fn find_objects(&self, query: &str, top_k: usize) -> Vec<WorldObject> {
        degrade("find_objects", self.repo.find_objects(query, top_k).await)
    }

    /// 同步 NPC 档案
    pub async fn sync_agent(&self, agent: &Agent) -> Result<()> {
        self.repo.upsert_agent(agent).await
    }

    pub async fn upsert_relationship(&self, relationship: &Relationship) -> Result<()> {
        self.repo.upsert_relationship(relationship).await
    }

    /// 记录一次互动：已有关系刷新时间，否则建立默认关系
    pub async fn record_interaction(&self, first: &str, second: &str) -> Result<Relationship> {
        let relationship = match self.repo.get_relationship(first, second).await? {
            Some(mut existing) => {
                existing.last_interaction = Utc::now();
                existing
            }
            None => Relationship::new(first, second, ACQUAINTANCE, DEFAULT_TRUST),
        };
        self.repo.upsert_relationship(&relationship).await?;
        Ok(relationship)
    }

    /// NPC 的关系（最近互动在前）
    pub async fn relationships(&self, agent_id: &str, limit: usize) -> Vec<RelationshipView> {
        degrade(
            "relationships_for",
            self.repo.relationships_for(agent_id, limit).await,
        )
        .iter()
        .map(|r| r.view_from(agent_id))
        .collect()
    }

    pub async fn ping(&self) -> Result<()> {
        self.repo.ping().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::repository::{MockWorldRepository, SurrealWorldRepository};
    use crate::storage::surrealdb::SurrealPool;

    fn config() -> MemoryConfig {
        MemoryConfig {
            context_memories: 5,
            context_relationships: 5,
        }
    }

    async fn surreal_store() -> MemoryStore {
        let pool = SurrealPool::in_memory().await.unwrap();
        MemoryStore::new(Arc::new(SurrealWorldRepository::new(pool)), &config())
    }

    fn failing_repo() -> MockWorldRepository {
        let mut repo = MockWorldRepository::new();
        repo.expect_search_memories()
            .returning(|_| Err(AppError::Storage("connection reset".into())));
        repo.expect_relationships_for()
            .returning(|_, _| Err(AppError::Storage("connection reset".into())));
        repo.expect_get_agent()
            .returning(|_| Err(AppError::Storage("connection reset".into())));
        repo.expect_find_objects()
            .returning(|_, _| Err(AppError::Storage("connection reset".into())));
        repo.expect_insert_memory()
            .returning(|_| Err(AppError::Storage("disk full".into())));
        repo
    }

    #[tokio::test]
    async fn test_store_and_retrieve_by_keyword() {
        let store = surreal_store().await;
        store
            .store(NewMemory::observation("student_01", "Heard a loud crash next door"))
            .await
            .unwrap();

        let hits = store
            .retrieve(&MemoryQuery::new("crash").for_agent("student_01"))
            .await;
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].description, "Heard a loud crash next door");

        let misses = store
            .retrieve(&MemoryQuery::new("singing").for_agent("student_01"))
            .await;
        assert!(misses.is_empty());
    }

    #[tokio::test]
    async fn test_importance_threshold_filters() {
        let store = surreal_store().await;
        store
            .store(NewMemory::observation("cop_01", "Routine patrol").with_importance(0.5))
            .await
            .unwrap();
        store
            .store(NewMemory::observation("cop_01", "Robbery at the bank").with_importance(0.95))
            .await
            .unwrap();

        let important = store
            .retrieve(&MemoryQuery::new("").with_importance_threshold(0.9))
            .await;
        assert_eq!(important.len(), 1);
        assert_eq!(important[0].description, "Robbery at the bank");
        assert_eq!(important[0].importance, 0.95);
    }

    #[tokio::test]
    async fn test_retrieve_newest_first_with_limit() {
        let store = surreal_store().await;
        for i in 0..4 {
            store
                .store(NewMemory::observation("baker_01", &format!("Baked bread batch {i}")))
                .await
                .unwrap();
            tokio::time::sleep(std::time::Duration::from_millis(2)).await;
        }

        let recent = store
            .retrieve(&MemoryQuery::new("bread").with_top_k(2))
            .await;
        let descriptions: Vec<&str> = recent.iter().map(|m| m.description.as_str()).collect();
        assert_eq!(descriptions, vec!["Baked bread batch 3", "Baked bread batch 2"]);
    }

    #[tokio::test]
    async fn test_out_of_range_importance_is_rejected() {
        let store = surreal_store().await;
        let result = store
            .store(NewMemory::observation("a", "Too important").with_importance(-0.1))
            .await;
        assert!(matches!(result, Err(AppError::Storage(_))));
    }

    #[tokio::test]
    async fn test_reads_degrade_when_storage_fails() {
        let store = MemoryStore::new(Arc::new(failing_repo()), &config());

        assert!(store.retrieve(&MemoryQuery::new("crash")).await.is_empty());
        assert!(store.find_objects("brick", 5).await.is_empty());

        let ctx = store.context("student_01", "crash").await;
        assert_eq!(ctx, AgentContext::default());
    }

    #[tokio::test]
    async fn test_writes_propagate_storage_errors() {
        let store = MemoryStore::new(Arc::new(failing_repo()), &config());
        let result = store.store(NewMemory::observation("a", "b")).await;
        assert_eq!(result, Err(AppError::Storage("disk full".into())));
    }

    #[tokio::test]
    async fn test_context_for_unknown_agent() {
        let store = surreal_store().await;
        let ctx = store.context("ghost", "anything").await;
        assert!(ctx.agent.is_none());
        assert!(ctx.relevant_memories.is_empty());
        assert!(ctx.relationships.is_empty());
        assert_eq!(ctx.emotional_state, "neutral");
    }

    #[tokio::test]
    async fn test_context_assembles_profile_memories_and_relationships() {
        let store = surreal_store().await;
        let mut agent = Agent::new("cop_01", "Officer Reyes", "cop").at("precinct");
        agent.emotional_state = "suspicious".into();
        store.sync_agent(&agent).await.unwrap();
        store
            .store(NewMemory::observation("cop_01", "Window smashed on Elm street"))
            .await
            .unwrap();
        store
            .store(NewMemory::observation("baker_01", "Window display rearranged"))
            .await
            .unwrap();
        store.record_interaction("student_01", "cop_01").await.unwrap();

        let ctx = store.context("cop_01", "window").await;
        assert_eq!(ctx.agent.as_ref().map(|a| a.id.as_str()), Some("cop_01"));
        assert_eq!(ctx.emotional_state, "suspicious");
        assert_eq!(ctx.relevant_memories.len(), 1);
        assert_eq!(ctx.relationships.len(), 1);
        assert_eq!(ctx.relationships[0].other_agent, "student_01");
        assert_eq!(ctx.relationships[0].relationship_type, ACQUAINTANCE);
    }

    #[tokio::test]
    async fn test_record_interaction_keeps_existing_relationship() {
        let store = surreal_store().await;
        let mut rival = Relationship::new("cop_01", "baker_01", "rival", 0.2);
        rival.last_interaction = chrono::DateTime::from_timestamp(1_000, 0).unwrap();
        store.upsert_relationship(&rival).await.unwrap();

        let touched = store.record_interaction("baker_01", "cop_01").await.unwrap();
        assert_eq!(touched.relationship_type, "rival");
        assert_eq!(touched.trust, 0.2);
        assert!(touched.last_interaction > rival.last_interaction);
    }

    #[tokio::test]
    async fn test_objects_round_trip() {
        let store = surreal_store().await;
        store
            .store_object(&WorldObject::new("window_1", "Window", "Shattered glass", "apartment_1a"))
            .await
            .unwrap();
        let found = store.find_objects("glass", 5).await;
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].id, "window_1");
    }
}
