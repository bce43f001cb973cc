//! 人格适配器缓存
//!
//! 有界 LRU 缓存。记账（驻留集合、最近使用顺序、淘汰）由一把锁保护；
//! 磁盘加载在锁外进行，同名的并发未命中共享同一个加载令牌，只加载一次。

use async_trait::async_trait;
use chrono::Utc;
use parking_lot::Mutex;
use std::collections::{BTreeMap, HashMap};
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::OnceCell;
use tracing::{debug, info, warn};

use crate::error::{AppError, Result};
use crate::models::adapter::{
    AdapterHandle, AdapterMetadata, CacheStatus, PreloadFailure, PreloadReport,
};

/// 适配器加载器 trait
#[async_trait]
pub trait AdapterLoader: Send + Sync {
    /// 加载适配器，文件不存在时返回 `AppError::NotFound`
    async fn load(&self, name: &str) -> Result<AdapterHandle>;
}

/// 从目录加载适配器文件
///
/// `{directory}/{name}` 必须存在；同名 `.json` 旁路文件可选，内容为
/// `{character_type, traits[]}`。
pub struct FsAdapterLoader {
    directory: PathBuf,
}

impl FsAdapterLoader {
    pub fn new(directory: impl Into<PathBuf>) -> Self {
        Self {
            directory: directory.into(),
        }
    }

    fn adapter_path(&self, name: &str) -> PathBuf {
        self.directory.join(name)
    }

    async fn read_metadata(&self, path: &std::path::Path) -> Option<AdapterMetadata> {
        let metadata_path = path.with_extension("json");
        if metadata_path == path {
            return None;
        }
        let raw = tokio::fs::read_to_string(&metadata_path).await.ok()?;
        match serde_json::from_str::<AdapterMetadata>(&raw) {
            Ok(metadata) => Some(metadata),
            Err(e) => {
                warn!(path = %metadata_path.display(), error = %e, "Ignoring malformed adapter metadata");
                None
            }
        }
    }
}

#[async_trait]
impl AdapterLoader for FsAdapterLoader {
    async fn load(&self, name: &str) -> Result<AdapterHandle> {
        let path = self.adapter_path(name);
        // 名称只能是目录内的文件名
        let escapes = name.contains('/') || name.contains('\\') || name.contains("..");
        if name.is_empty() || escapes || !tokio::fs::try_exists(&path).await.unwrap_or(false) {
            return Err(AppError::NotFound(format!(
                "adapter not found: {}",
                path.display()
            )));
        }

        let started = std::time::Instant::now();
        let metadata = self.read_metadata(&path).await;
        info!(
            adapter = name,
            elapsed_ms = started.elapsed().as_millis() as u64,
            "Loaded adapter"
        );

        Ok(AdapterHandle {
            name: name.to_string(),
            path,
            loaded_at: Utc::now(),
            metadata,
        })
    }
}

type LoadToken = Arc<OnceCell<Result<AdapterHandle>>>;

#[derive(Debug)]
struct CacheEntry {
    handle: AdapterHandle,
    last_used: u64,
}

/// 锁内状态
#[derive(Default)]
struct CacheState {
    entries: HashMap<String, CacheEntry>,
    /// 最近使用时刻 -> 名称，最小的键即最久未使用
    recency: BTreeMap<u64, String>,
    tick: u64,
    in_flight: HashMap<String, LoadToken>,
    hits: u64,
    misses: u64,
    evictions: u64,
}

impl CacheState {
    fn next_tick(&mut self) -> u64 {
        self.tick += 1;
        self.tick
    }

    /// 命中时刷新最近使用时刻
    fn touch(&mut self, name: &str) -> Option<AdapterHandle> {
        let tick = self.next_tick();
        let entry = self.entries.get_mut(name)?;
        self.recency.remove(&entry.last_used);
        entry.last_used = tick;
        self.recency.insert(tick, name.to_string());
        Some(entry.handle.clone())
    }

    fn evict_lru(&mut self) -> Option<String> {
        let (_, name) = self.recency.pop_first()?;
        self.entries.remove(&name);
        self.evictions += 1;
        Some(name)
    }

    fn insert(&mut self, handle: AdapterHandle) {
        let tick = self.next_tick();
        self.recency.insert(tick, handle.name.clone());
        self.entries.insert(
            handle.name.clone(),
            CacheEntry {
                handle,
                last_used: tick,
            },
        );
    }

    fn release_token(&mut self, name: &str, token: &LoadToken) {
        if self
            .in_flight
            .get(name)
            .is_some_and(|current| Arc::ptr_eq(current, token))
        {
            self.in_flight.remove(name);
        }
    }
}

/// 有界 LRU 适配器缓存
pub struct AdapterCache {
    loader: Arc<dyn AdapterLoader>,
    max_size: usize,
    state: Mutex<CacheState>,
}

impl AdapterCache {
    /// 创建缓存，容量至少为 1
    pub fn new(loader: Arc<dyn AdapterLoader>, max_size: usize) -> Self {
        Self {
            loader,
            max_size: max_size.max(1),
            state: Mutex::new(CacheState::default()),
        }
    }

    /// 获取适配器，未命中时加载
    pub async fn get(&self, name: &str) -> Result<AdapterHandle> {
        let token = {
            let mut state = self.state.lock();
            if let Some(handle) = state.touch(name) {
                state.hits += 1;
                debug!(adapter = name, "Adapter cache hit");
                return Ok(handle);
            }
            state.misses += 1;
            state
                .in_flight
                .entry(name.to_string())
                .or_insert_with(|| Arc::new(OnceCell::new()))
                .clone()
        };

        debug!(adapter = name, "Adapter cache miss");
        let loaded = token
            .get_or_init(|| async { self.loader.load(name).await })
            .await
            .clone();

        let mut state = self.state.lock();
        state.release_token(name, &token);

        let handle = loaded?;
        // 共享同一令牌的调用方中，只有第一个到达的负责插入
        if let Some(existing) = state.touch(name) {
            return Ok(existing);
        }
        if state.entries.len() >= self.max_size {
            if let Some(evicted) = state.evict_lru() {
                info!(evicted = %evicted, adapter = name, "Adapter cache full, evicted least recently used");
            }
        }
        state.insert(handle.clone());
        Ok(handle)
    }

    /// 尽力预加载，单个失败不影响其余
    pub async fn preload(&self, names: &[String]) -> PreloadReport {
        info!(count = names.len(), "Pre-loading adapters");
        let mut report = PreloadReport::default();
        for name in names {
            match self.get(name).await {
                Ok(_) => report.loaded.push(name.clone()),
                Err(e) => {
                    warn!(adapter = %name, error = %e, "Adapter preload failed");
                    report.failed.push(PreloadFailure {
                        name: name.clone(),
                        error: e.to_string(),
                    });
                }
            }
        }
        report
    }

    /// 是否驻留（不刷新最近使用时刻）
    pub fn contains(&self, name: &str) -> bool {
        self.state.lock().entries.contains_key(name)
    }

    /// 缓存状态
    pub fn status(&self) -> CacheStatus {
        let state = self.state.lock();
        let loaded_adapters: Vec<String> = state.recency.values().rev().cloned().collect();
        let cache_size = state.entries.len();
        CacheStatus {
            loaded_adapters,
            cache_size,
            max_cache_size: self.max_size,
            utilization: cache_size as f64 / self.max_size as f64,
            hits: state.hits,
            misses: state.misses,
            evictions: state.evictions,
        }
    }

    /// 清空缓存
    pub fn clear(&self) {
        info!("Clearing adapter cache");
        let mut state = self.state.lock();
        state.entries.clear();
        state.recency.clear();
    }
}
