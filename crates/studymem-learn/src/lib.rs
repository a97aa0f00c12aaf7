//! Aggregation of insights into chronic patterns, memory boards and hints

mod aggregator;
mod board;
mod hints;
mod payload;

pub use aggregator::{majority, round1, ChronicPattern, FrequencyAggregator, Observation};
pub use board::{MemoryBoard, ModuleSlot, OverallPatterns, SharedIssue};
pub use hints::{AdaptiveHintProvider, AdaptiveHints};
pub use payload::{
    CompressedPayload, ConversationPatterns, ListeningPatterns, ModulePatterns, ReadingPatterns,
    SpeakingPatterns, WritingPatterns,
};
