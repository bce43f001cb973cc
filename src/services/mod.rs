//! 业务服务层
//!
//! 事件分发、适配器缓存、记忆存储、生成后端与语音合成，由编排器组合。

pub mod adapter_cache;
pub mod dispatcher;
pub mod generation;
pub mod memory_store;
pub mod orchestrator;
pub mod voice;

pub use adapter_cache::{AdapterCache, AdapterLoader, FsAdapterLoader};
pub use dispatcher::{DistanceModel, EventDispatcher};
pub use generation::{TextGenerator, create_text_generator};
pub use memory_store::MemoryStore;
pub use orchestrator::{GenerationOutcome, Orchestrator};
pub use voice::SpeechSynthesizer;
