//! Read-only session views, one per learning module

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use studymem_core::{MispronouncedWord, Module, PhonemeError};

/// A session as exposed by its module's session provider
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "module", rename_all = "lowercase")]
pub enum SessionRecord {
    Reading(ReadingSession),
    Listening(ListeningSession),
    Speaking(SpeakingSession),
    Writing(WritingSession),
    Conversation(ConversationSession),
}

impl SessionRecord {
    pub fn module(&self) -> Module {
        match self {
            SessionRecord::Reading(_) => Module::Reading,
            SessionRecord::Listening(_) => Module::Listening,
            SessionRecord::Speaking(_) => Module::Speaking,
            SessionRecord::Writing(_) => Module::Writing,
            SessionRecord::Conversation(_) => Module::Conversation,
        }
    }

    pub fn session_id(&self) -> &str {
        match self {
            SessionRecord::Reading(s) => &s.session_id,
            SessionRecord::Listening(s) => &s.session_id,
            SessionRecord::Speaking(s) => &s.session_id,
            SessionRecord::Writing(s) => &s.session_id,
            SessionRecord::Conversation(s) => &s.session_id,
        }
    }

    pub fn student_id(&self) -> &str {
        match self {
            SessionRecord::Reading(s) => &s.student_id,
            SessionRecord::Listening(s) => &s.student_id,
            SessionRecord::Speaking(s) => &s.student_id,
            SessionRecord::Writing(s) => &s.student_id,
            SessionRecord::Conversation(s) => &s.student_id,
        }
    }

    pub fn completed_at(&self) -> Option<DateTime<Utc>> {
        match self {
            SessionRecord::Reading(s) => s.completed_at,
            SessionRecord::Listening(s) => s.completed_at,
            SessionRecord::Speaking(s) => s.completed_at,
            SessionRecord::Writing(s) => s.completed_at,
            SessionRecord::Conversation(s) => s.completed_at,
        }
    }

    pub fn is_complete(&self) -> bool {
        self.completed_at().is_some()
    }
}

// ---------------------------------------------------------------------------
// Reading
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VocabularyLookup {
    pub word: String,
    #[serde(default)]
    pub difficulty_level: Option<u8>,
    #[serde(default = "default_lookup_count")]
    pub looked_up_count: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComprehensionResponse {
    pub question_id: String,
    #[serde(default)]
    pub question_text: String,
    #[serde(default)]
    pub student_answer: Option<String>,
    #[serde(default)]
    pub correct_answer: Option<String>,
    pub is_correct: bool,
    #[serde(default)]
    pub time_spent_secs: Option<u32>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatbotTurn {
    pub user_message: String,
    #[serde(default)]
    pub message_type: Option<String>,
    #[serde(default)]
    pub topic_category: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReadingSession {
    pub session_id: String,
    pub student_id: String,
    #[serde(default)]
    pub completed_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub text_title: Option<String>,
    #[serde(default)]
    pub text_category: Option<String>,
    #[serde(default)]
    pub text_difficulty: Option<String>,
    #[serde(default)]
    pub words_per_minute: Option<f64>,
    #[serde(default)]
    pub completion_percentage: Option<f64>,
    #[serde(default)]
    pub vocabulary_clicks: u32,
    #[serde(default)]
    pub lookups: Vec<VocabularyLookup>,
    #[serde(default)]
    pub responses: Vec<ComprehensionResponse>,
    #[serde(default)]
    pub chatbot_turns: Vec<ChatbotTurn>,
}

// ---------------------------------------------------------------------------
// Listening
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ListeningSession {
    pub session_id: String,
    pub student_id: String,
    #[serde(default)]
    pub completed_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub audio_category: Option<String>,
    #[serde(default)]
    pub audio_difficulty: Option<String>,
    #[serde(default)]
    pub performance_score: Option<f64>,
    #[serde(default)]
    pub results: Vec<ComprehensionResponse>,
}

// ---------------------------------------------------------------------------
// Speaking
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PhonemeAssessment {
    pub phoneme: String,
    pub accuracy_score: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WordAssessment {
    pub word: String,
    pub accuracy_score: f64,
    #[serde(default)]
    pub error_type: Option<String>,
    #[serde(default)]
    pub phonemes: Vec<PhonemeAssessment>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpeakingSession {
    pub session_id: String,
    pub student_id: String,
    #[serde(default)]
    pub completed_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub practice_type: Option<String>,
    #[serde(default)]
    pub words: Vec<WordAssessment>,
    #[serde(default)]
    pub pronunciation_score: Option<f64>,
    #[serde(default)]
    pub accuracy_score: Option<f64>,
    #[serde(default)]
    pub fluency_score: Option<f64>,
    #[serde(default)]
    pub completeness_score: Option<f64>,
    #[serde(default)]
    pub pause_count: u32,
    #[serde(default)]
    pub filler_word_count: u32,
}

// ---------------------------------------------------------------------------
// Writing
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GrammarCorrection {
    #[serde(default, rename = "type")]
    pub error_type: Option<String>,
    #[serde(default)]
    pub original: Option<String>,
    #[serde(default)]
    pub correction: Option<String>,
    #[serde(default)]
    pub explanation: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StyleSuggestion {
    #[serde(default)]
    pub issue: String,
    #[serde(default)]
    pub example: Option<String>,
    #[serde(default)]
    pub improvement: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct VocabularyAssessment {
    #[serde(default)]
    pub complexity_level: Option<String>,
    #[serde(default)]
    pub suggestions: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SentenceAnalysis {
    #[serde(default)]
    pub original: String,
    #[serde(default)]
    pub clarity: Option<String>,
    #[serde(default)]
    pub effectiveness: Option<String>,
}

/// Structured feedback produced upstream for a finished essay
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WritingAnalysis {
    #[serde(default)]
    pub common_errors: Vec<String>,
    #[serde(default)]
    pub specific_corrections: Vec<GrammarCorrection>,
    #[serde(default)]
    pub style_suggestions: Vec<StyleSuggestion>,
    #[serde(default)]
    pub vocabulary: VocabularyAssessment,
    #[serde(default)]
    pub sentences: Vec<SentenceAnalysis>,
    /// Content area -> rating ("strong", "weak", "poor", ...)
    #[serde(default)]
    pub content_feedback: BTreeMap<String, String>,
    #[serde(default)]
    pub overall_score: Option<f64>,
    #[serde(default)]
    pub on_topic: Option<bool>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WritingSession {
    pub session_id: String,
    pub student_id: String,
    #[serde(default)]
    pub completed_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub writing_type: Option<String>,
    #[serde(default)]
    pub topic: Option<String>,
    #[serde(default)]
    pub analysis: Option<WritingAnalysis>,
}

// ---------------------------------------------------------------------------
// Conversation
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChatRole {
    User,
    Assistant,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: ChatRole,
    pub content: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GrammarObservation {
    #[serde(rename = "type")]
    pub error_type: String,
    #[serde(default)]
    pub example: Option<String>,
    #[serde(default)]
    pub correction: Option<String>,
}

/// Upstream analysis of the student's conversation turns
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ConversationAnalysis {
    #[serde(default)]
    pub grammar_errors: Vec<GrammarObservation>,
    #[serde(default)]
    pub vocabulary_gaps: Vec<studymem_core::VocabularyGap>,
    #[serde(default)]
    pub fluency_issues: Vec<String>,
    #[serde(default)]
    pub topic_struggles: Vec<String>,
}

/// Pronunciation assessment folded in from audio turns
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PronunciationData {
    #[serde(default)]
    pub mispronounced_words: Vec<MispronouncedWord>,
    #[serde(default)]
    pub phoneme_errors: Vec<PhonemeError>,
    #[serde(default)]
    pub scores: BTreeMap<String, f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConversationSession {
    pub session_id: String,
    pub student_id: String,
    #[serde(default)]
    pub completed_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub topic: Option<String>,
    #[serde(default)]
    pub platform: Option<String>,
    #[serde(default)]
    pub messages: Vec<ChatMessage>,
    #[serde(default)]
    pub analysis: Option<ConversationAnalysis>,
    #[serde(default)]
    pub pronunciation: Option<PronunciationData>,
}

impl ConversationSession {
    pub fn student_messages(&self) -> impl Iterator<Item = &ChatMessage> {
        self.messages.iter().filter(|m| m.role == ChatRole::User)
    }

    /// Words spoken by the student across the session
    pub fn student_word_count(&self) -> usize {
        self.student_messages()
            .map(|m| m.content.split_whitespace().count())
            .sum()
    }
}

fn default_lookup_count() -> u32 {
    1
}
