//! Completed-session views consumed by insight extraction

mod context;
mod io;
mod paths;
mod source;
mod types;

pub use context::{ConversationContext, SessionContextStore};
pub use io::{append_jsonl, atomic_write, read_jsonl};
pub use paths::Paths;
pub use source::{InMemorySessions, SessionSource};
pub use types::{
    ChatMessage, ChatRole, ChatbotTurn, ComprehensionResponse, ConversationAnalysis,
    ConversationSession, GrammarCorrection, GrammarObservation, ListeningSession,
    PhonemeAssessment, PronunciationData, ReadingSession, SentenceAnalysis, SessionRecord,
    SpeakingSession, StyleSuggestion, VocabularyAssessment, VocabularyLookup, WordAssessment,
    WritingAnalysis, WritingSession,
};
