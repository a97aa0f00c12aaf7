//! Core types for per-student learning memory

mod config;
mod error;
mod insight;
mod types;

pub use config::{
    Config, CHRONIC_MIN_FREQUENCY, COMPRESSION_THRESHOLD, HIGH_PRIORITY_FREQUENCY,
    MAX_CHRONIC_PATTERNS,
};
pub use error::{MemoryError, Result};
pub use insight::{
    ChatbotQuestion, ContentWeakness, ConversationObservations, GrammarIssue, Insight,
    ListeningObservations, MispronouncedWord, Observations, PhonemeError, QuestionOutcome,
    ReadingObservations, RepeatedLookup, RepeatedTopic, SentenceIssue, Severity,
    SpeakingObservations, SpeakingScores, StyleIssue, VocabularyGap, VocabularyIssue, WordLookup,
    WritingObservations,
};
pub use types::{DifficultyHint, Engagement, Module, Priority, SkillType};
