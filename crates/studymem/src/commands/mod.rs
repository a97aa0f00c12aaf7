pub mod compress;
pub mod hints;
pub mod ingest;
pub mod init;
pub mod memory;
pub mod status;
pub mod version;

use std::path::PathBuf;
use std::sync::Arc;
use studymem_compress::{AnthropicSummarizer, MemoryDb, MemoryEngine};
use studymem_core::Config;
use studymem_sessions::{InMemorySessions, Paths, SessionRecord, SessionSource};

/// Resolved paths, config and credentials shared by every command
pub struct Context {
    pub paths: Paths,
    pub config: Config,
    pub api_key: Option<String>,
}

impl Context {
    pub fn new(data_dir: Option<PathBuf>, api_key: Option<String>) -> anyhow::Result<Self> {
        let paths = match data_dir {
            Some(dir) => Paths::with_data_dir(dir),
            None => Paths::new()?,
        };
        let config = Config::load_or_default(&paths.config_path());
        Ok(Self {
            paths,
            config,
            api_key: api_key.filter(|k| !k.trim().is_empty()),
        })
    }

    /// Every session ingested so far, used as extraction history
    pub fn archived_sessions(&self) -> anyhow::Result<InMemorySessions> {
        let sessions = InMemorySessions::new();
        let path = self.paths.sessions_path();
        if path.exists() {
            for record in studymem_sessions::read_jsonl::<SessionRecord>(&path)? {
                sessions.insert(record);
            }
        }
        Ok(sessions)
    }

    /// Engine over the on-disk database. The HTTP summarizer is attached
    /// only when `use_ai` is set and an API key is available.
    pub fn engine(
        &self,
        sessions: Arc<dyn SessionSource>,
        use_ai: bool,
    ) -> anyhow::Result<MemoryEngine> {
        let db = MemoryDb::open(&self.paths.db_path())?;
        let mut engine = MemoryEngine::new(db, sessions, self.config.clone());
        if let (true, Some(key)) = (use_ai, self.api_key.as_deref()) {
            engine = engine.with_summarizer(Arc::new(AnthropicSummarizer::from_config(
                key,
                &self.config,
            )));
        }
        Ok(engine)
    }

    /// Engine for read-only commands
    pub fn reader(&self) -> anyhow::Result<MemoryEngine> {
        self.engine(Arc::new(InMemorySessions::new()), false)
    }
}
