//! Durable learner memory: SQLite storage, summarization and the engine facade

mod engine;
mod fallback;
mod locks;
mod storage;
pub mod summarizer;

pub use engine::{MemoryEngine, ModuleStatus};
pub use fallback::fallback_summary;
pub use locks::LockTable;
pub use storage::{AppendOutcome, MemoryDb};
pub use summarizer::{AnthropicSummarizer, Summarizer, SummarizerError};
