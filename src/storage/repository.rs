use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{AppError, Result};
use crate::models::agent::{Agent, ScheduleEntry};
use crate::models::memory::{Memory, MemoryQuery};
use crate::models::relationship::{Relationship, pair_key};
use crate::models::world_object::WorldObject;
use crate::storage::surrealdb::SurrealPool;

const AGENTS: &str = "agents";
const EPISODIC_MEMORY: &str = "episodic_memory";
const RELATIONSHIPS: &str = "relationships";
const WORLD_OBJECTS: &str = "world_objects";

/// 世界状态仓储 trait
///
/// 对应 agents / episodic_memory / relationships / world_objects 四张表。
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait WorldRepository: Send + Sync {
    /// 写入一条记忆
    async fn insert_memory(&self, memory: &Memory) -> Result<()>;

    /// 关键词检索记忆（新到旧）
    async fn search_memories(&self, query: &MemoryQuery) -> Result<Vec<Memory>>;

    /// 插入或替换 NPC 档案
    async fn upsert_agent(&self, agent: &Agent) -> Result<()>;

    /// 根据 ID 获取 NPC 档案
    async fn get_agent(&self, id: &str) -> Result<Option<Agent>>;

    /// 插入或替换关系
    async fn upsert_relationship(&self, relationship: &Relationship) -> Result<()>;

    /// 获取两个 NPC 之间的关系
    async fn get_relationship(&self, first: &str, second: &str) -> Result<Option<Relationship>>;

    /// 列出某个 NPC 的关系（最近互动在前）
    async fn relationships_for(&self, agent_id: &str, limit: usize) -> Result<Vec<Relationship>>;

    /// 插入或替换世界物体
    async fn upsert_object(&self, object: &WorldObject) -> Result<()>;

    /// 按名称或描述检索物体（重要性高的在前）
    async fn find_objects(&self, query: &str, top_k: usize) -> Result<Vec<WorldObject>>;

    /// 健康检查
    async fn ping(&self) -> Result<()>;
}

// === 存储记录 ===
//
// SurrealDB 的 `id` 字段是记录 ID，领域 ID 单独存放并在查询时 OMIT id。
// 时间戳以微秒整数存储，保证排序正确。

fn from_micros(micros: i64) -> DateTime<Utc> {
    DateTime::from_timestamp_micros(micros).unwrap_or_default()
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct MemoryRecord {
    memory_id: String,
    agent_id: String,
    event_type: String,
    description: String,
    #[serde(default)]
    location: Option<String>,
    importance: f64,
    created_at: i64,
}

impl From<&Memory> for MemoryRecord {
    fn from(m: &Memory) -> Self {
        Self {
            memory_id: m.id.clone(),
            agent_id: m.agent_id.clone(),
            event_type: m.event_type.clone(),
            description: m.description.clone(),
            location: m.location.clone(),
            importance: m.importance,
            created_at: m.created_at.timestamp_micros(),
        }
    }
}

impl From<MemoryRecord> for Memory {
    fn from(r: MemoryRecord) -> Self {
        Self {
            id: r.memory_id,
            agent_id: r.agent_id,
            event_type: r.event_type,
            description: r.description,
            location: r.location,
            importance: r.importance,
            created_at: from_micros(r.created_at),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct AgentRecord {
    agent_id: String,
    name: String,
    archetype: String,
    #[serde(default)]
    personality_traits: Vec<String>,
    #[serde(default)]
    backstory: String,
    #[serde(default)]
    current_location: String,
    emotional_state: String,
    #[serde(default)]
    adapter: Option<String>,
    voice_id: String,
    #[serde(default)]
    schedule: Vec<ScheduleEntry>,
}

impl From<&Agent> for AgentRecord {
    fn from(a: &Agent) -> Self {
        Self {
            agent_id: a.id.clone(),
            name: a.name.clone(),
            archetype: a.archetype.clone(),
            personality_traits: a.personality_traits.clone(),
            backstory: a.backstory.clone(),
            current_location: a.current_location.clone(),
            emotional_state: a.emotional_state.clone(),
            adapter: a.adapter.clone(),
            voice_id: a.voice_id.clone(),
            schedule: a.schedule.clone(),
        }
    }
}

impl From<AgentRecord> for Agent {
    fn from(r: AgentRecord) -> Self {
        Self {
            id: r.agent_id,
            name: r.name,
            archetype: r.archetype,
            personality_traits: r.personality_traits,
            backstory: r.backstory,
            current_location: r.current_location,
            emotional_state: r.emotional_state,
            adapter: r.adapter,
            voice_id: r.voice_id,
            schedule: r.schedule,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct RelationshipRecord {
    agent_a: String,
    agent_b: String,
    relationship_type: String,
    trust: f64,
    last_interaction: i64,
}

impl From<&Relationship> for RelationshipRecord {
    fn from(r: &Relationship) -> Self {
        Self {
            agent_a: r.agent_a.clone(),
            agent_b: r.agent_b.clone(),
            relationship_type: r.relationship_type.clone(),
            trust: r.trust,
            last_interaction: r.last_interaction.timestamp_micros(),
        }
    }
}

impl From<RelationshipRecord> for Relationship {
    fn from(r: RelationshipRecord) -> Self {
        Self {
            agent_a: r.agent_a,
            agent_b: r.agent_b,
            relationship_type: r.relationship_type,
            trust: r.trust,
            last_interaction: from_micros(r.last_interaction),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct ObjectRecord {
    object_id: String,
    name: String,
    description: String,
    location: String,
    significance: f64,
}

impl From<&WorldObject> for ObjectRecord {
    fn from(o: &WorldObject) -> Self {
        Self {
            object_id: o.id.clone(),
            name: o.name.clone(),
            description: o.description.clone(),
            location: o.location.clone(),
            significance: o.significance,
        }
    }
}

impl From<ObjectRecord> for WorldObject {
    fn from(r: ObjectRecord) -> Self {
        Self {
            id: r.object_id,
            name: r.name,
            description: r.description,
            location: r.location,
            significance: r.significance,
        }
    }
}

/// SurrealDB 世界状态仓储
#[derive(Clone)]
pub struct SurrealWorldRepository {
    pool: SurrealPool,
}

impl SurrealWorldRepository {
    pub fn new(pool: SurrealPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl WorldRepository for SurrealWorldRepository {
    async fn insert_memory(&self, memory: &Memory) -> Result<()> {
        let db = self.pool.inner().await?;
        let created: Option<MemoryRecord> = db
            .create((EPISODIC_MEMORY, memory.id.clone()))
            .content(MemoryRecord::from(memory))
            .await?;

        created.map(|_| ()).ok_or_else(|| {
            AppError::Storage(format!("Failed to create memory: {}", memory.id))
        })
    }

    async fn search_memories(&self, query: &MemoryQuery) -> Result<Vec<Memory>> {
        let db = self.pool.inner().await?;

        let mut sql = String::from(
            "SELECT * OMIT id FROM episodic_memory \
             WHERE importance >= $threshold \
             AND string::contains(string::lowercase(description), $needle)",
        );
        if query.agent_id.is_some() {
            sql.push_str(" AND agent_id = $agent_id");
        }
        sql.push_str(" ORDER BY created_at DESC LIMIT $limit");

        let mut statement = db
            .query(sql)
            .bind(("threshold", query.importance_threshold))
            .bind(("needle", query.query.to_lowercase()))
            .bind(("limit", query.top_k));
        if let Some(agent_id) = &query.agent_id {
            statement = statement.bind(("agent_id", agent_id.clone()));
        }

        let rows: Vec<MemoryRecord> = statement.await?.take(0)?;
        Ok(rows.into_iter().map(Memory::from).collect())
    }

    async fn upsert_agent(&self, agent: &Agent) -> Result<()> {
        let db = self.pool.inner().await?;
        let _: Option<AgentRecord> = db
            .upsert((AGENTS, agent.id.clone()))
            .content(AgentRecord::from(agent))
            .await?;
        Ok(())
    }

    async fn get_agent(&self, id: &str) -> Result<Option<Agent>> {
        let db = self.pool.inner().await?;
        let record: Option<AgentRecord> = db.select((AGENTS, id.to_string())).await?;
        Ok(record.map(Agent::from))
    }

    async fn upsert_relationship(&self, relationship: &Relationship) -> Result<()> {
        let db = self.pool.inner().await?;
        let _: Option<RelationshipRecord> = db
            .upsert((RELATIONSHIPS, relationship.key()))
            .content(RelationshipRecord::from(relationship))
            .await?;
        Ok(())
    }

    async fn get_relationship(&self, first: &str, second: &str) -> Result<Option<Relationship>> {
        let db = self.pool.inner().await?;
        let record: Option<RelationshipRecord> =
            db.select((RELATIONSHIPS, pair_key(first, second))).await?;
        Ok(record.map(Relationship::from))
    }

    async fn relationships_for(&self, agent_id: &str, limit: usize) -> Result<Vec<Relationship>> {
        let db = self.pool.inner().await?;
        let rows: Vec<RelationshipRecord> = db
            .query(
                "SELECT * OMIT id FROM relationships \
                 WHERE agent_a = $agent OR agent_b = $agent \
                 ORDER BY last_interaction DESC LIMIT $limit",
            )
            .bind(("agent", agent_id.to_string()))
            .bind(("limit", limit))
            .await?
            .take(0)?;
        Ok(rows.into_iter().map(Relationship::from).collect())
    }

    async fn upsert_object(&self, object: &WorldObject) -> Result<()> {
        let db = self.pool.inner().await?;
        let _: Option<ObjectRecord> = db
            .upsert((WORLD_OBJECTS, object.id.clone()))
            .content(ObjectRecord::from(object))
            .await?;
        Ok(())
    }

    async fn find_objects(&self, query: &str, top_k: usize) -> Result<Vec<WorldObject>> {
        let db = self.pool.inner().await?;
        let rows: Vec<ObjectRecord> = db
            .query(
                "SELECT * OMIT id FROM world_objects \
                 WHERE string::contains(string::lowercase(name), $needle) \
                 OR string::contains(string::lowercase(description), $needle) \
                 ORDER BY significance DESC LIMIT $limit",
            )
            .bind(("needle", query.to_lowercase()))
            .bind(("limit", top_k))
            .await?
            .take(0)?;
        Ok(rows.into_iter().map(WorldObject::from).collect())
    }

    async fn ping(&self) -> Result<()> {
        self.pool.ping().await
    }
}
