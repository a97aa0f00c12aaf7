//! Per-module insight extraction from completed sessions

mod base;
mod classifier;
mod conversation;
mod listening;
mod reading;
mod registry;
mod speaking;
mod writing;

pub use base::{truncate_chars, Extractor, MAX_SNIPPET_CHARS};
pub use classifier::{FixedClassifier, KeywordClassifier, SkillClassifier};
pub use conversation::ConversationExtractor;
pub use listening::ListeningExtractor;
pub use reading::ReadingExtractor;
pub use registry::ExtractorRegistry;
pub use speaking::SpeakingExtractor;
pub use writing::WritingExtractor;
