//! Session provider contract and an in-memory implementation

use crate::types::SessionRecord;
use std::collections::HashMap;
use std::sync::RwLock;
use studymem_core::Module;

/// Read-only access to module sessions
pub trait SessionSource: Send + Sync {
    /// Look up one session for a student
    fn session(&self, module: Module, student_id: &str, session_id: &str) -> Option<SessionRecord>;

    /// Every session the student has in a module, completed or not
    fn history(&self, module: Module, student_id: &str) -> Vec<SessionRecord>;
}

/// Sessions held in process memory, keyed by (student, module)
#[derive(Debug, Default)]
pub struct InMemorySessions {
    sessions: RwLock<HashMap<(String, Module), Vec<SessionRecord>>>,
}

impl InMemorySessions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace a session (matched by module + session id)
    pub fn insert(&self, record: SessionRecord) {
        let key = (record.student_id().to_string(), record.module());
        let mut sessions = match self.sessions.write() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        let entries = sessions.entry(key).or_default();
        if let Some(existing) = entries
            .iter_mut()
            .find(|r| r.session_id() == record.session_id())
        {
            *existing = record;
        } else {
            entries.push(record);
        }
    }

    pub fn len(&self) -> usize {
        self.sessions
            .read()
            .map(|s| s.values().map(Vec::len).sum())
            .unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl SessionSource for InMemorySessions {
    fn session(&self, module: Module, student_id: &str, session_id: &str) -> Option<SessionRecord> {
        let sessions = self.sessions.read().ok()?;
        sessions
            .get(&(student_id.to_string(), module))?
            .iter()
            .find(|r| r.session_id() == session_id)
            .cloned()
    }

    fn history(&self, module: Module, student_id: &str) -> Vec<SessionRecord> {
        self.sessions
            .read()
            .ok()
            .and_then(|s| s.get(&(student_id.to_string(), module)).cloned())
            .unwrap_or_default()
    }
}
