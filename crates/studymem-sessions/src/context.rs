//! Per-student conversation context with an explicit lifecycle.
//!
//! A context is created when a conversation starts, collects turns and
//! pronunciation assessments while it runs, and is destroyed either when the
//! conversation ends or when it has been idle longer than the store's TTL.

use crate::source::InMemorySessions;
use crate::types::{ChatMessage, ChatRole, ConversationSession, PronunciationData, SessionRecord};
use chrono::{DateTime, Duration, Utc};
use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};
use tracing::debug;

/// Idle time after which a context is evicted
pub const DEFAULT_CONTEXT_TTL_MINUTES: i64 = 60;

/// A running conversation for one student
#[derive(Debug, Clone, PartialEq)]
pub struct ConversationContext {
    pub student_id: String,
    pub session_id: String,
    pub topic: Option<String>,
    pub platform: Option<String>,
    pub messages: Vec<ChatMessage>,
    pub pronunciation: Option<PronunciationData>,
    pub started_at: DateTime<Utc>,
    pub last_activity: DateTime<Utc>,
}

impl ConversationContext {
    fn into_session(self, completed_at: DateTime<Utc>) -> ConversationSession {
        ConversationSession {
            session_id: self.session_id,
            student_id: self.student_id,
            completed_at: Some(completed_at),
            topic: self.topic,
            platform: self.platform,
            messages: self.messages,
            analysis: None,
            pronunciation: self.pronunciation,
        }
    }
}

/// Injected store of live conversation contexts keyed by student
#[derive(Debug)]
pub struct SessionContextStore {
    ttl: Duration,
    contexts: Mutex<HashMap<String, ConversationContext>>,
}

impl SessionContextStore {
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            contexts: Mutex::new(HashMap::new()),
        }
    }

    fn contexts(&self) -> MutexGuard<'_, HashMap<String, ConversationContext>> {
        match self.contexts.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }

    /// Start a conversation, replacing any context the student already had
    pub fn start(
        &self,
        student_id: &str,
        session_id: &str,
        topic: Option<String>,
        platform: Option<String>,
        now: DateTime<Utc>,
    ) {
        let context = ConversationContext {
            student_id: student_id.to_string(),
            session_id: session_id.to_string(),
            topic,
            platform,
            messages: Vec::new(),
            pronunciation: None,
            started_at: now,
            last_activity: now,
        };
        if self
            .contexts()
            .insert(student_id.to_string(), context)
            .is_some()
        {
            debug!(student_id, "replaced open conversation context");
        }
    }

    /// Record a turn. Returns false when the student has no open context.
    pub fn push_message(
        &self,
        student_id: &str,
        role: ChatRole,
        content: impl Into<String>,
        now: DateTime<Utc>,
    ) -> bool {
        let mut contexts = self.contexts();
        let Some(context) = contexts.get_mut(student_id) else {
            return false;
        };
        context.messages.push(ChatMessage {
            role,
            content: content.into(),
        });
        context.last_activity = now;
        true
    }

    /// Fold an audio assessment into the open context
    pub fn attach_pronunciation(
        &self,
        student_id: &str,
        assessment: PronunciationData,
        now: DateTime<Utc>,
    ) -> bool {
        let mut contexts = self.contexts();
        let Some(context) = contexts.get_mut(student_id) else {
            return false;
        };
        let merged = context.pronunciation.get_or_insert_with(PronunciationData::default);
        merged
            .mispronounced_words
            .extend(assessment.mispronounced_words);
        merged.phoneme_errors.extend(assessment.phoneme_errors);
        merged.scores.extend(assessment.scores);
        context.last_activity = now;
        true
    }

    /// Close the conversation and hand back the completed session view
    pub fn end(&self, student_id: &str, now: DateTime<Utc>) -> Option<ConversationSession> {
        let context = self.contexts().remove(student_id)?;
        Some(context.into_session(now))
    }

    /// End the conversation and publish it to `sessions` so it can be
    /// extracted. Returns the completed session id.
    pub fn finish(
        &self,
        student_id: &str,
        sessions: &InMemorySessions,
        now: DateTime<Utc>,
    ) -> Option<String> {
        let session = self.end(student_id, now)?;
        let session_id = session.session_id.clone();
        sessions.insert(SessionRecord::Conversation(session));
        debug!(student_id, session_id = %session_id, "conversation finished");
        Some(session_id)
    }

    /// Destroy contexts idle longer than the TTL. Returns evicted students.
    pub fn evict_expired(&self, now: DateTime<Utc>) -> Vec<String> {
        let mut contexts = self.contexts();
        let expired: Vec<String> = contexts
            .values()
            .filter(|c| now - c.last_activity > self.ttl)
            .map(|c| c.student_id.clone())
            .collect();
        for student_id in &expired {
            contexts.remove(student_id);
        }
        if !expired.is_empty() {
            debug!(count = expired.len(), "evicted idle conversation contexts");
        }
        expired
    }

    pub fn get(&self, student_id: &str) -> Option<ConversationContext> {
        self.contexts().get(student_id).cloned()
    }

    pub fn len(&self) -> usize {
        self.contexts().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for SessionContextStore {
    fn default() -> Self {
        Self::new(Duration::minutes(DEFAULT_CONTEXT_TTL_MINUTES))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use studymem_core::MispronouncedWord;

    fn at(minute: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 3, 1, 9, minute, 0).unwrap()
    }

    #[test]
    fn test_lifecycle_produces_completed_session() {
        let store = SessionContextStore::default();
        store.start("s1", "conv-1", Some("travel".to_string()), None, at(0));
        assert!(store.push_message("s1", ChatRole::Assistant, "Where did you go?", at(1)));
        assert!(store.push_message("s1", ChatRole::User, "I go to Lisbon", at(2)));

        let session = store.end("s1", at(3)).unwrap();
        assert_eq!(session.session_id, "conv-1");
        assert_eq!(session.completed_at, Some(at(3)));
        assert_eq!(session.student_word_count(), 4);
        assert!(store.is_empty());
        assert!(store.end("s1", at(4)).is_none());
    }

    #[test]
    fn test_finish_publishes_completed_session() {
        use crate::source::SessionSource;
        use studymem_core::Module;

        let store = SessionContextStore::default();
        let sessions = InMemorySessions::new();
        store.start("s1", "conv-9", None, None, at(0));
        store.push_message("s1", ChatRole::User, "Yesterday I go home", at(1));

        assert_eq!(store.finish("s1", &sessions, at(2)).as_deref(), Some("conv-9"));
        let record = sessions.session(Module::Conversation, "s1", "conv-9").unwrap();
        assert_eq!(record.completed_at(), Some(at(2)));
        assert!(store.is_empty());
        assert!(store.finish("s1", &sessions, at(3)).is_none());
        assert_eq!(sessions.len(), 1);
    }

    #[test]
    fn test_start_replaces_previous_context() {
        let store = SessionContextStore::default();
        store.start("s1", "old", None, None, at(0));
        store.push_message("s1", ChatRole::User, "hello", at(1));
        store.start("s1", "new", None, None, at(2));

        let context = store.get("s1").unwrap();
        assert_eq!(context.session_id, "new");
        assert!(context.messages.is_empty());
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_no_context_is_rejected() {
        let store = SessionContextStore::default();
        assert!(!store.push_message("ghost", ChatRole::User, "hi", at(0)));
        assert!(!store.attach_pronunciation("ghost", PronunciationData::default(), at(0)));
    }

    #[test]
    fn test_pronunciation_accumulates() {
        let store = SessionContextStore::default();
        store.start("s1", "c", None, None, at(0));
        for (word, accuracy) in [("three", 55.0), ("think", 62.0)] {
            store.attach_pronunciation(
                "s1",
                PronunciationData {
                    mispronounced_words: vec![MispronouncedWord {
                        word: word.to_string(),
                        accuracy,
                        error_type: None,
                    }],
                    ..Default::default()
                },
                at(1),
            );
        }
        let session = store.end("s1", at(2)).unwrap();
        assert_eq!(session.pronunciation.unwrap().mispronounced_words.len(), 2);
    }

    #[test]
    fn test_evict_expired_uses_last_activity() {
        let store = SessionContextStore::new(Duration::minutes(10));
        store.start("idle", "a", None, None, at(0));
        store.start("busy", "b", None, None, at(0));
        store.push_message("busy", ChatRole::User, "still here", at(8));

        let evicted = store.evict_expired(at(15));
        assert_eq!(evicted, vec!["idle".to_string()]);
        assert!(store.get("busy").is_some());
        assert!(store.get("idle").is_none());
    }
}
