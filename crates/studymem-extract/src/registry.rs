//! Extractor registry: routes a session to its module's extractor

use crate::base::Extractor;
use crate::conversation::ConversationExtractor;
use crate::listening::ListeningExtractor;
use crate::reading::ReadingExtractor;
use crate::speaking::SpeakingExtractor;
use crate::writing::WritingExtractor;
use chrono::{DateTime, Utc};
use studymem_core::{Insight, MemoryError, Module, Result};
use studymem_sessions::SessionSource;
use tracing::debug;

/// Registry holding one extractor per module
pub struct ExtractorRegistry {
    extractors: Vec<Box<dyn Extractor>>,
}

impl ExtractorRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self {
            extractors: Vec::new(),
        }
    }

    /// Registry with the built-in extractor for every module
    pub fn with_defaults() -> Self {
        let mut registry = Self::new();
        registry.register(Box::new(ReadingExtractor::new()));
        registry.register(Box::new(ListeningExtractor::new()));
        registry.register(Box::new(SpeakingExtractor));
        registry.register(Box::new(WritingExtractor));
        registry.register(Box::new(ConversationExtractor));
        registry
    }

    /// Register an extractor, replacing any existing one for the same module
    pub fn register(&mut self, extractor: Box<dyn Extractor>) {
        self.extractors.retain(|e| e.module() != extractor.module());
        self.extractors.push(extractor);
    }

    pub fn get(&self, module: Module) -> Option<&dyn Extractor> {
        self.extractors
            .iter()
            .find(|e| e.module() == module)
            .map(|e| e.as_ref())
    }

    /// Build an insight for a completed session owned by `student_id`
    pub fn extract(
        &self,
        source: &dyn SessionSource,
        module: Module,
        student_id: &str,
        session_id: &str,
        created_at: DateTime<Utc>,
    ) -> Result<Insight> {
        let not_found = || MemoryError::SessionNotFound {
            module,
            session_id: session_id.to_string(),
        };

        let record = source
            .session(module, student_id, session_id)
            .filter(|r| r.student_id() == student_id && r.module() == module)
            .ok_or_else(not_found)?;

        if !record.is_complete() {
            return Err(MemoryError::SessionInProgress {
                module,
                session_id: session_id.to_string(),
            });
        }

        let extractor = self
            .get(module)
            .ok_or_else(|| MemoryError::Config(format!("no extractor registered for {}", module)))?;

        debug!(extractor = extractor.name(), student_id, session_id, "extracting");
        let observations = extractor.extract(&record, source);
        Ok(Insight::new(student_id, session_id, observations, created_at))
    }

    /// Get number of registered extractors
    pub fn len(&self) -> usize {
        self.extractors.len()
    }

    /// Check if registry is empty
    pub fn is_empty(&self) -> bool {
        self.extractors.is_empty()
    }
}

impl Default for ExtractorRegistry {
    fn default() -> Self {
        Self::with_defaults()
    }
}
