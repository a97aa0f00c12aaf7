//! Engine facade: extraction, compression trigger, compression and reads

use crate::locks::LockTable;
use crate::storage::MemoryDb;
use crate::summarizer::{summarize_with_fallback, Summarizer};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;
use studymem_core::{Config, Insight, Module, Result};
use studymem_extract::ExtractorRegistry;
use studymem_learn::{
    AdaptiveHintProvider, AdaptiveHints, CompressedPayload, FrequencyAggregator, MemoryBoard,
};
use studymem_sessions::SessionSource;
use tracing::{info, warn};

/// Compression state of one module, for status displays
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ModuleStatus {
    pub module: Module,
    pub sessions_since_compression: usize,
    pub sessions_needed: usize,
    pub last_compressed_at: Option<DateTime<Utc>>,
    pub total_sessions_analyzed: usize,
}

pub struct MemoryEngine {
    db: Mutex<MemoryDb>,
    sessions: Arc<dyn SessionSource>,
    extractors: ExtractorRegistry,
    summarizer: Option<Arc<dyn Summarizer>>,
    aggregator: FrequencyAggregator,
    config: Config,
    locks: LockTable,
}

impl MemoryEngine {
    pub fn new(db: MemoryDb, sessions: Arc<dyn SessionSource>, config: Config) -> Self {
        Self {
            db: Mutex::new(db),
            sessions,
            extractors: ExtractorRegistry::with_defaults(),
            summarizer: None,
            aggregator: FrequencyAggregator::from_config(&config),
            config,
            locks: LockTable::new(),
        }
    }

    pub fn with_summarizer(mut self, summarizer: Arc<dyn Summarizer>) -> Self {
        self.summarizer = Some(summarizer);
        self
    }

    pub fn with_extractors(mut self, extractors: ExtractorRegistry) -> Self {
        self.extractors = extractors;
        self
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    fn db(&self) -> MutexGuard<'_, MemoryDb> {
        match self.db.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }

    /// Extract and store the insight of a completed session. Re-extracting a
    /// session returns the stored insight without counting it again.
    pub fn extract_insights(
        &self,
        student_id: &str,
        module: Module,
        session_id: &str,
    ) -> Result<Insight> {
        if let Some(existing) = self.db().find_insight(student_id, module, session_id)? {
            return Ok(existing);
        }

        let insight = self.extractors.extract(
            self.sessions.as_ref(),
            module,
            student_id,
            session_id,
            Utc::now(),
        )?;
        let outcome = self.db().append_insight(&insight)?;
        if outcome.was_inserted() {
            info!(student_id, %module, session_id, "extracted insight");
        }
        Ok(outcome.into_insight())
    }

    /// Whether enough sessions have accumulated to compress a module
    pub fn should_compress(&self, student_id: &str, module: Module) -> Result<bool> {
        let count = self.db().sessions_since_compression(student_id, module)?;
        Ok(self.config.should_compress(count))
    }

    pub fn sessions_needed_until_compression(
        &self,
        student_id: &str,
        module: Module,
    ) -> Result<usize> {
        let count = self.db().sessions_since_compression(student_id, module)?;
        Ok(self.config.sessions_needed(count))
    }

    /// Per-module compression state; zeros for a student with no memory yet
    pub fn module_status(&self, student_id: &str) -> Result<Vec<ModuleStatus>> {
        let board = self.db().board(student_id)?;
        Ok(Module::ALL
            .iter()
            .map(|&module| {
                let (count, last, total) = board
                    .as_ref()
                    .map(|b| {
                        let slot = b.slot(module);
                        (
                            slot.sessions_since_compression,
                            slot.last_compressed_at,
                            slot.payload.total_sessions_analyzed,
                        )
                    })
                    .unwrap_or((0, None, 0));
                ModuleStatus {
                    module,
                    sessions_since_compression: count,
                    sessions_needed: self.config.sessions_needed(count),
                    last_compressed_at: last,
                    total_sessions_analyzed: total,
                }
            })
            .collect())
    }

    /// Compress every pending insight of a module into its memory slot,
    /// bypassing the threshold. Returns `None` when nothing was pending.
    ///
    /// The per-(student, module) lock is held for the whole run; the
    /// summarizer inside it is bounded by the configured timeout and
    /// attempts. The board write and insight flags commit together.
    pub async fn compress(
        &self,
        student_id: &str,
        module: Module,
        use_summarizer: bool,
    ) -> Result<Option<CompressedPayload>> {
        let _guard = self.locks.acquire(student_id, module).await;

        let pending = {
            let db = self.db();
            db.uncompressed_insights(student_id, module)?
        };
        if pending.is_empty() {
            info!(student_id, %module, "nothing to compress");
            return Ok(None);
        }

        let now = Utc::now();
        let mut payload = CompressedPayload::build(module, &pending, &self.aggregator, now);

        if use_summarizer {
            let summary = summarize_with_fallback(
                self.summarizer.as_deref(),
                &payload,
                Duration::from_secs(self.config.summarizer_timeout_secs),
                self.config.summarizer_max_attempts,
            )
            .await;
            payload.summary = Some(summary);
        }

        let ids: Vec<i64> = pending.iter().filter_map(Insight::id).collect();
        {
            let mut db = self.db();
            db.commit_compression(student_id, &payload, &ids, now)?;
        }

        info!(
            student_id,
            %module,
            sessions = payload.total_sessions_analyzed,
            chronic = payload.chronic_count(),
            "compressed memory"
        );
        Ok(Some(payload))
    }

    /// Compress only when the trigger policy says so
    pub async fn compress_if_due(
        &self,
        student_id: &str,
        module: Module,
        use_summarizer: bool,
    ) -> Result<Option<CompressedPayload>> {
        if !self.should_compress(student_id, module)? {
            return Ok(None);
        }
        self.compress(student_id, module, use_summarizer).await
    }

    /// Completion hook for session handlers: extract, then compress if due.
    /// Memory tracking is best-effort, so failures are logged and swallowed.
    pub async fn record_session(
        &self,
        student_id: &str,
        module: Module,
        session_id: &str,
    ) -> Option<CompressedPayload> {
        if let Err(e) = self.extract_insights(student_id, module, session_id) {
            warn!(student_id, %module, session_id, error = %e, "insight extraction failed");
            return None;
        }
        match self.compress_if_due(student_id, module, true).await {
            Ok(payload) => payload,
            Err(e) => {
                warn!(student_id, %module, error = %e, "memory compression failed");
                None
            }
        }
    }

    /// Compressed memory of a module; empty when never compressed
    pub fn get_memory(&self, student_id: &str, module: Module) -> Result<CompressedPayload> {
        Ok(self
            .db()
            .board(student_id)?
            .map(|b| b.payload(module).clone())
            .unwrap_or_else(|| CompressedPayload::empty(module)))
    }

    pub fn memory_board(&self, student_id: &str) -> Result<Option<MemoryBoard>> {
        Ok(self.db().board(student_id)?)
    }

    /// Reading-question hints for content generation
    pub fn get_adaptive_hints(&self, student_id: &str) -> Result<AdaptiveHints> {
        let board = self.memory_board(student_id)?;
        Ok(AdaptiveHintProvider::reading_hints(board.as_ref()))
    }

    pub fn get_module_hints(&self, student_id: &str, module: Module) -> Result<AdaptiveHints> {
        let board = self.memory_board(student_id)?;
        Ok(AdaptiveHintProvider::module_hints(board.as_ref(), module))
    }

    /// Personalised greeting, when anything is remembered
    pub fn welcome_message(&self, student_id: &str) -> Result<Option<String>> {
        let board = self.memory_board(student_id)?;
        Ok(AdaptiveHintProvider::welcome_message(board.as_ref()))
    }

    /// Full insight log of a module, oldest first
    pub fn insights(&self, student_id: &str, module: Module) -> Result<Vec<Insight>> {
        Ok(self.db().insights(student_id, module)?)
    }
}
