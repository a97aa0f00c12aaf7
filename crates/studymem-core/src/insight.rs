//! Insight: one module's normalized observations from one completed session

use crate::types::{Engagement, Module, SkillType};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Observations from a single completed session.
///
/// Immutable once created. The compressed flag is owned by storage, which
/// only ever moves it one way, `uncompressed -> compressed`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Insight {
    id: Option<i64>,
    student_id: String,
    session_id: String,
    observations: Observations,
    is_compressed: bool,
    compressed_at: Option<DateTime<Utc>>,
    created_at: DateTime<Utc>,
}

impl Insight {
    pub fn new(
        student_id: impl Into<String>,
        session_id: impl Into<String>,
        observations: Observations,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id: None,
            student_id: student_id.into(),
            session_id: session_id.into(),
            observations,
            is_compressed: false,
            compressed_at: None,
            created_at,
        }
    }

    /// Rebuild a stored insight
    pub fn restore(
        id: i64,
        student_id: String,
        session_id: String,
        observations: Observations,
        compressed_at: Option<DateTime<Utc>>,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id: Some(id),
            student_id,
            session_id,
            observations,
            is_compressed: compressed_at.is_some(),
            compressed_at,
            created_at,
        }
    }

    pub fn id(&self) -> Option<i64> {
        self.id
    }

    pub fn with_id(mut self, id: i64) -> Self {
        self.id = Some(id);
        self
    }

    pub fn student_id(&self) -> &str {
        &self.student_id
    }

    pub fn session_id(&self) -> &str {
        &self.session_id
    }

    pub fn module(&self) -> Module {
        self.observations.module()
    }

    pub fn observations(&self) -> &Observations {
        &self.observations
    }

    pub fn is_compressed(&self) -> bool {
        self.is_compressed
    }

    pub fn compressed_at(&self) -> Option<DateTime<Utc>> {
        self.compressed_at
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }
}

/// Module-specific observation payload
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "module", rename_all = "lowercase")]
pub enum Observations {
    Reading(ReadingObservations),
    Listening(ListeningObservations),
    Speaking(SpeakingObservations),
    Writing(WritingObservations),
    Conversation(ConversationObservations),
}

impl Observations {
    pub fn module(&self) -> Module {
        match self {
            Observations::Reading(_) => Module::Reading,
            Observations::Listening(_) => Module::Listening,
            Observations::Speaking(_) => Module::Speaking,
            Observations::Writing(_) => Module::Writing,
            Observations::Conversation(_) => Module::Conversation,
        }
    }
}

// ---------------------------------------------------------------------------
// Reading / listening
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WordLookup {
    pub word: String,
    #[serde(default)]
    pub difficulty: Option<u8>,
    pub lookup_count: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RepeatedLookup {
    pub word: String,
    #[serde(default)]
    pub difficulty: Option<u8>,
    pub lookup_count: u32,
    /// Lookups of the same word in the student's other sessions
    pub previous_lookups: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuestionOutcome {
    pub question_id: String,
    #[serde(default)]
    pub question: String,
    #[serde(default)]
    pub student_answer: Option<String>,
    #[serde(default)]
    pub correct_answer: Option<String>,
    #[serde(default)]
    pub time_spent_secs: Option<u32>,
    /// Classified skill, set for incorrect answers
    #[serde(default)]
    pub skill: Option<SkillType>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatbotQuestion {
    pub question: String,
    #[serde(default)]
    pub message_type: Option<String>,
    #[serde(default)]
    pub topic: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RepeatedTopic {
    pub topic: String,
    pub question: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ReadingObservations {
    #[serde(default)]
    pub vocabulary_mistakes: Vec<WordLookup>,
    #[serde(default)]
    pub difficult_words: Vec<WordLookup>,
    #[serde(default)]
    pub repeated_lookups: Vec<RepeatedLookup>,
    #[serde(default)]
    pub incorrect_questions: Vec<QuestionOutcome>,
    #[serde(default)]
    pub correct_questions: Vec<QuestionOutcome>,
    /// Unique skills the student missed questions on
    #[serde(default)]
    pub question_types_struggled: Vec<SkillType>,
    #[serde(default)]
    pub chatbot_questions: Vec<ChatbotQuestion>,
    #[serde(default)]
    pub chatbot_topics_confused: Vec<String>,
    #[serde(default)]
    pub chatbot_repeated_topics: Vec<RepeatedTopic>,
    #[serde(default)]
    pub reading_speed_issue: bool,
    #[serde(default)]
    pub completion_rate: f64,
    #[serde(default)]
    pub engagement: Engagement,
    #[serde(default)]
    pub text_category: Option<String>,
    #[serde(default)]
    pub text_difficulty: Option<String>,
    #[serde(default)]
    pub text_topic: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ListeningObservations {
    #[serde(default)]
    pub incorrect_questions: Vec<QuestionOutcome>,
    #[serde(default)]
    pub correct_questions: Vec<QuestionOutcome>,
    #[serde(default)]
    pub question_types_struggled: Vec<SkillType>,
    #[serde(default)]
    pub audio_category: Option<String>,
    #[serde(default)]
    pub audio_difficulty: Option<String>,
    #[serde(default)]
    pub audio_speed_issue: bool,
}

// ---------------------------------------------------------------------------
// Speaking
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MispronouncedWord {
    pub word: String,
    pub accuracy: f64,
    #[serde(default)]
    pub error_type: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PhonemeError {
    pub phoneme: String,
    pub accuracy: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SpeakingScores {
    pub pronunciation: f64,
    pub accuracy: f64,
    pub fluency: f64,
    pub completeness: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SpeakingObservations {
    #[serde(default)]
    pub mispronounced_words: Vec<MispronouncedWord>,
    #[serde(default)]
    pub phoneme_errors: Vec<PhonemeError>,
    #[serde(default)]
    pub fluency_problems: Vec<String>,
    #[serde(default)]
    pub scores: SpeakingScores,
    #[serde(default)]
    pub practice_level: Option<String>,
}

// ---------------------------------------------------------------------------
// Writing / conversation
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Medium,
    High,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GrammarIssue {
    pub error_type: String,
    #[serde(default)]
    pub original: Option<String>,
    #[serde(default)]
    pub correction: Option<String>,
    #[serde(default)]
    pub explanation: Option<String>,
    pub severity: Severity,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StyleIssue {
    pub issue: String,
    #[serde(default)]
    pub example: Option<String>,
    #[serde(default)]
    pub improvement: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VocabularyIssue {
    pub issue: String,
    #[serde(default)]
    pub suggestion: Option<String>,
    #[serde(default)]
    pub severity: Option<Severity>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SentenceIssue {
    pub issue: String,
    pub sentence: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContentWeakness {
    pub area: String,
    pub rating: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WritingObservations {
    #[serde(default)]
    pub writing_type: Option<String>,
    #[serde(default)]
    pub topic: Option<String>,
    #[serde(default)]
    pub grammar_errors: Vec<GrammarIssue>,
    #[serde(default)]
    pub style_issues: Vec<StyleIssue>,
    #[serde(default)]
    pub vocabulary_issues: Vec<VocabularyIssue>,
    #[serde(default)]
    pub sentence_issues: Vec<SentenceIssue>,
    #[serde(default)]
    pub content_weaknesses: Vec<ContentWeakness>,
    #[serde(default)]
    pub overall_score: Option<f64>,
    #[serde(default = "default_true")]
    pub on_topic: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VocabularyGap {
    pub word: String,
    #[serde(default)]
    pub context: Option<String>,
    #[serde(default)]
    pub issue: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ConversationObservations {
    #[serde(default)]
    pub topic: Option<String>,
    #[serde(default)]
    pub grammar_errors: Vec<GrammarIssue>,
    #[serde(default)]
    pub vocabulary_gaps: Vec<VocabularyGap>,
    #[serde(default)]
    pub fluency_issues: Vec<String>,
    #[serde(default)]
    pub topic_struggles: Vec<String>,
    #[serde(default)]
    pub mispronounced_words: Vec<MispronouncedWord>,
    #[serde(default)]
    pub phoneme_errors: Vec<PhonemeError>,
    #[serde(default)]
    pub pronunciation_scores: BTreeMap<String, f64>,
    #[serde(default)]
    pub total_messages: usize,
    #[serde(default)]
    pub total_words: usize,
    #[serde(default)]
    pub avg_words_per_message: f64,
}

impl Default for WritingObservations {
    fn default() -> Self {
        Self {
            writing_type: None,
            topic: None,
            grammar_errors: Vec::new(),
            style_issues: Vec::new(),
            vocabulary_issues: Vec::new(),
            sentence_issues: Vec::new(),
            content_weaknesses: Vec::new(),
            overall_score: None,
            on_topic: true,
        }
    }
}

impl Observations {
    /// Observations with nothing recorded, for a session without sub-records
    pub fn empty(module: Module) -> Self {
        match module {
            Module::Reading => Observations::Reading(ReadingObservations::default()),
            Module::Listening => Observations::Listening(ListeningObservations::default()),
            Module::Speaking => Observations::Speaking(SpeakingObservations::default()),
            Module::Writing => Observations::Writing(WritingObservations::default()),
            Module::Conversation => {
                Observations::Conversation(ConversationObservations::default())
            }
        }
    }
}

fn default_true() -> bool {
    true
}
