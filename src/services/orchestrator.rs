//! 反应编排
//!
//! 串联事件分发器、记忆存储、适配器缓存和生成后端：
//! 事件进来，分发给受影响的 NPC，逐个组装上下文并生成反应，最后把事件写入记忆。
//! 生成失败不会中断流程，统一替换为兜底台词。

use std::fmt::Write as _;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, instrument, warn};

use crate::config::config::{AppConfig, GenerationConfig};
use crate::config::roster::Roster;
use crate::error::{AppError, Result};
use crate::models::adapter::{AdapterHandle, CacheStatus, PreloadReport};
use crate::models::agent::{Agent, AgentStateUpdate};
use crate::models::context::AgentContext;
use crate::models::event::GameEvent;
use crate::models::memory::NewMemory;
use crate::models::reaction::{AgentReaction, DialogueReply, DialogueRequest, EventResponse};
use crate::observability::AppMetrics;
use crate::services::adapter_cache::{AdapterCache, FsAdapterLoader};
use crate::services::dispatcher::{EventDispatcher, PlannedReaction};
use crate::services::generation::{GenerationRequest, TextGenerator, create_text_generator};
use crate::services::memory_store::MemoryStore;
use crate::services::voice::{SpeechSynthesizer, create_synthesizer};
use crate::storage::repository::WorldRepository;

/// 玩家对话写入记忆时的事件类型
pub const DIALOGUE_EVENT: &str = "dialogue";

/// 生成结果
#[derive(Debug, Clone, PartialEq)]
pub enum GenerationOutcome {
    Generated(String),
    Fallback { reason: String },
}

impl GenerationOutcome {
    /// 最终台词
    pub fn text(&self, fallback_phrase: &str) -> String {
        match self {
            GenerationOutcome::Generated(text) => text.clone(),
            GenerationOutcome::Fallback { .. } => fallback_phrase.to_string(),
        }
    }

    pub fn fallback_reason(&self) -> Option<String> {
        match self {
            GenerationOutcome::Generated(_) => None,
            GenerationOutcome::Fallback { reason } => Some(reason.clone()),
        }
    }
}

/// 在分发器提示词前拼接适配器特质和相关记忆
fn enrich_prompt(adapter: Option<&AdapterHandle>, context: &AgentContext, prompt: &str) -> String {
    let mut full = adapter.map(AdapterHandle::prompt_prefix).unwrap_or_default();
    let memories = context.memories_prompt();
    if !memories.is_empty() {
        full.push_str(&memories);
        full.push('\n');
    }
    full.push_str(prompt);
    full
}

fn dialogue_prompt(agent: &Agent, request: &DialogueRequest, context: &AgentContext) -> String {
    let mut prompt = format!(
        "You are {}.\nPlayer says: \"{}\"\n\n",
        agent.name, request.player_message
    );
    if let Some(scene) = request.context.as_ref().filter(|c| !c.is_empty()) {
        prompt.push_str("Context:\n");
        for (key, value) in scene {
            let _ = writeln!(prompt, "{}: {}", key, value);
        }
        prompt.push('\n');
    }
    let memories = context.memories_prompt();
    if !memories.is_empty() {
        prompt.push_str(&memories);
        prompt.push('\n');
    }
    prompt.push_str("Respond naturally in character (1-2 sentences).");
    prompt
}

/// 编排器
pub struct Orchestrator {
    dispatcher: EventDispatcher,
    cache: AdapterCache,
    memory: MemoryStore,
    generator: Arc<dyn TextGenerator>,
    synthesizer: Arc<dyn SpeechSynthesizer>,
    generation: GenerationConfig,
    metrics: Arc<AppMetrics>,
}

impl Orchestrator {
    pub fn new(
        dispatcher: EventDispatcher,
        cache: AdapterCache,
        memory: MemoryStore,
        generator: Arc<dyn TextGenerator>,
        synthesizer: Arc<dyn SpeechSynthesizer>,
        generation: GenerationConfig,
    ) -> Self {
        Self {
            dispatcher,
            cache,
            memory,
            generator,
            synthesizer,
            generation,
            metrics: Arc::new(AppMetrics::default()),
        }
    }

    /// 按配置组装全部组件
    pub fn from_config(
        config: &AppConfig,
        repo: Arc<dyn WorldRepository>,
        roster: Roster,
    ) -> Result<Self> {
        let loader = Arc::new(FsAdapterLoader::new(&config.adapters.directory));
        Ok(Self::new(
            EventDispatcher::new(roster),
            AdapterCache::new(loader, config.adapters.max_cache_size),
            MemoryStore::new(repo, &config.memory),
            create_text_generator(&config.generation)?,
            create_synthesizer(&config.voice),
            config.generation.clone(),
        ))
    }

    pub fn with_metrics(mut self, metrics: Arc<AppMetrics>) -> Self {
        self.metrics = metrics;
        self
    }

    pub fn metrics(&self) -> Arc<AppMetrics> {
        self.metrics.clone()
    }

    /// 把名册中的 NPC 同步到存储
    pub async fn sync_roster(&self) -> Result<usize> {
        let agents = self.dispatcher.agents();
        for agent in &agents {
            self.memory.sync_agent(agent).await?;
        }
        info!(count = agents.len(), "Agent roster synced to store");
        Ok(agents.len())
    }

    /// 处理世界事件
    #[instrument(skip(self, event), fields(event_type = %event.event_type, location = %event.location))]
    pub async fn handle_event(&self, event: GameEvent) -> Result<EventResponse> {
        let dispatch = self.dispatcher.dispatch(&event);

        let mut agent_reactions = Vec::with_capacity(dispatch.reactions.len());
        for planned in &dispatch.reactions {
            agent_reactions.push(self.react(planned, &event).await);
        }

        self.ingest_event(&event, &dispatch.affected_agents).await?;
        self.metrics.record_event(agent_reactions.len());

        Ok(EventResponse {
            event_id: dispatch.event_id,
            timestamp: dispatch.timestamp,
            affected_agents: dispatch.affected_agents,
            agent_reactions,
        })
    }

    async fn react(&self, planned: &PlannedReaction, event: &GameEvent) -> AgentReaction {
        let agent = &planned.agent;
        let adapter_name = agent.adapter_name();
        let context = self
            .memory
            .context(&agent.id, &event.event_description)
            .await;
        let adapter = self.adapter(&adapter_name).await;

        let prompt = enrich_prompt(adapter.as_ref(), &context, &planned.prompt);
        let request = GenerationRequest::new(prompt, &self.generation).with_adapter(adapter);
        let outcome = self.generate(&request).await;

        AgentReaction {
            agent_id: agent.id.clone(),
            agent_name: agent.name.clone(),
            adapter_name,
            prompt: planned.prompt.clone(),
            context,
            generated_response: outcome.text(&self.generation.fallback_phrase),
            fallback_reason: outcome.fallback_reason(),
        }
    }

    /// 适配器缺失时退回基础模型
    async fn adapter(&self, name: &str) -> Option<AdapterHandle> {
        match self.cache.get(name).await {
            Ok(handle) => Some(handle),
            Err(e) => {
                warn!(adapter = name, error = %e, "Adapter unavailable, using base model");
                None
            }
        }
    }

    async fn generate(&self, request: &GenerationRequest) -> GenerationOutcome {
        let timeout = Duration::from_secs(self.generation.timeout_secs);
        let outcome = match tokio::time::timeout(timeout, self.generator.generate(request)).await {
            Ok(Ok(text)) if !text.trim().is_empty() => {
                GenerationOutcome::Generated(text.trim().to_string())
            }
            Ok(Ok(_)) => GenerationOutcome::Fallback {
                reason: "empty response".to_string(),
            },
            Ok(Err(e)) => GenerationOutcome::Fallback {
                reason: e.to_string(),
            },
            Err(_) => GenerationOutcome::Fallback {
                reason: format!("timed out after {}s", self.generation.timeout_secs),
            },
        };

        if let GenerationOutcome::Fallback { reason } = &outcome {
            warn!(backend = self.generator.backend(), reason = %reason, "Generation fell back");
            self.metrics.record_fallback();
        }
        outcome
    }

    /// 每个受影响的 NPC 记一条记忆，发起者是已知 NPC 时刷新双方关系
    async fn ingest_event(&self, event: &GameEvent, affected: &[String]) -> Result<()> {
        let instigator_known = self.dispatcher.agent(&event.instigator_id).is_some();
        let description = if event.event_description.trim().is_empty() {
            format!("{} at {}", event.event_type, event.location)
        } else {
            event.event_description.clone()
        };

        for agent_id in affected {
            let mut memory = NewMemory::observation(agent_id, &description)
                .with_event_type(&event.event_type)
                .with_importance(event.memory_importance());
            if !event.location.is_empty() {
                memory = memory.with_location(&event.location);
            }
            self.memory.store(memory).await?;

            if instigator_known && event.instigator_id != *agent_id {
                self.memory
                    .record_interaction(&event.instigator_id, agent_id)
                    .await?;
            }
        }
        debug!(count = affected.len(), "Event ingested into memory");
        Ok(())
    }

    /// 处理玩家对话
    #[instrument(skip(self, request), fields(npc_id = %request.npc_id))]
    pub async fn handle_dialogue(&self, request: DialogueRequest) -> Result<DialogueReply> {
        if request.player_message.trim().is_empty() {
            return Err(AppError::Validation("player_message must not be empty".into()));
        }
        let agent = self
            .dispatcher
            .agent(&request.npc_id)
            .ok_or_else(|| AppError::NotFound(format!("Agent not found: {}", request.npc_id)))?;
        self.metrics.record_dialogue();

        let context = self
            .memory
            .context(&agent.id, &request.player_message)
            .await;
        let adapter = self.adapter(&agent.adapter_name()).await;
        let prefix = adapter
            .as_ref()
            .map(AdapterHandle::prompt_prefix)
            .unwrap_or_default();
        let prompt = format!("{}{}", prefix, dialogue_prompt(&agent, &request, &context));

        let outcome = self
            .generate(&GenerationRequest::new(prompt, &self.generation).with_adapter(adapter))
            .await;
        let text_response = outcome.text(&self.generation.fallback_phrase);

        let audio = match self
            .synthesizer
            .synthesize(&text_response, &agent.voice_id)
            .await
        {
            Ok(audio) => audio,
            Err(e) => {
                warn!(voice_id = %agent.voice_id, error = %e, "Speech synthesis failed, returning text only");
                Vec::new()
            }
        };

        self.memory
            .store(
                NewMemory::observation(
                    &agent.id,
                    &format!("Player said: \"{}\"", request.player_message),
                )
                .with_event_type(DIALOGUE_EVENT)
                .with_location(&agent.current_location),
            )
            .await?;

        Ok(DialogueReply {
            npc_id: agent.id,
            text_response,
            audio,
            emotional_state: agent.emotional_state,
            fallback_reason: outcome.fallback_reason(),
        })
    }

    pub fn list_agents(&self) -> Vec<Agent> {
        self.dispatcher.agents()
    }

    /// NPC 的上下文，包含最近的记忆
    pub async fn agent_context(&self, agent_id: &str) -> AgentContext {
        self.memory.context(agent_id, "").await
    }

    /// 更新 NPC 状态并同步到存储
    pub async fn update_agent_state(&self, id: &str, update: &AgentStateUpdate) -> Result<Agent> {
        if update.is_empty() {
            return Err(AppError::Validation(
                "at least one of location or emotional_state is required".into(),
            ));
        }
        let agent = self.dispatcher.update_agent_state(id, update)?;
        self.memory.sync_agent(&agent).await?;
        Ok(agent)
    }

    pub fn cache_status(&self) -> CacheStatus {
        self.cache.status()
    }

    pub async fn preload_adapters(&self, names: &[String]) -> PreloadReport {
        self.cache.preload(names).await
    }

    pub fn dispatcher(&self) -> &EventDispatcher {
        &self.dispatcher
    }

    pub fn memory(&self) -> &MemoryStore {
        &self.memory
    }

    pub async fn ping(&self) -> Result<()> {
        self.memory.ping().await
    }
}
