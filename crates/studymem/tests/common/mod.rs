use chrono::{DateTime, TimeZone, Utc};
use std::sync::Arc;
use studymem_compress::{MemoryDb, MemoryEngine};
use studymem_core::{Config, VocabularyGap};
use studymem_sessions::{
    ComprehensionResponse, ConversationAnalysis, ConversationSession, GrammarObservation,
    InMemorySessions, ReadingSession, SessionRecord, VocabularyLookup,
};

pub fn completed() -> Option<DateTime<Utc>> {
    Some(Utc.with_ymd_and_hms(2026, 6, 1, 17, 0, 0).unwrap())
}

/// Reading session with the given lookups and one wrong main-idea answer
pub fn reading(student: &str, session: &str, lookups: &[&str]) -> SessionRecord {
    SessionRecord::Reading(ReadingSession {
        session_id: session.to_string(),
        student_id: student.to_string(),
        completed_at: completed(),
        text_title: Some("The Great Barrier Reef".to_string()),
        text_category: Some("science".to_string()),
        text_difficulty: Some("intermediate".to_string()),
        words_per_minute: Some(140.0),
        completion_percentage: Some(100.0),
        vocabulary_clicks: lookups.len() as u32,
        lookups: lookups
            .iter()
            .map(|w| VocabularyLookup {
                word: w.to_string(),
                difficulty_level: Some(5),
                looked_up_count: 1,
            })
            .collect(),
        responses: vec![ComprehensionResponse {
            question_id: format!("{}-q1", session),
            question_text: "What is the main idea of the passage?".to_string(),
            student_answer: Some("B".to_string()),
            correct_answer: Some("C".to_string()),
            is_correct: false,
            time_spent_secs: Some(40),
        }],
        chatbot_turns: vec![],
    })
}

/// Conversation session whose analysis reports grammar error types and
/// vocabulary gaps
pub fn conversation(student: &str, session: &str, errors: &[&str], gaps: &[&str]) -> SessionRecord {
    SessionRecord::Conversation(ConversationSession {
        session_id: session.to_string(),
        student_id: student.to_string(),
        completed_at: completed(),
        topic: Some("travel".to_string()),
        platform: None,
        messages: vec![],
        analysis: Some(ConversationAnalysis {
            grammar_errors: errors
                .iter()
                .map(|e| GrammarObservation {
                    error_type: e.to_string(),
                    example: Some("I goed there".to_string()),
                    correction: Some("I went there".to_string()),
                })
                .collect(),
            vocabulary_gaps: gaps
                .iter()
                .map(|w| VocabularyGap {
                    word: w.to_string(),
                    context: Some("snorkelling trip".to_string()),
                    issue: None,
                })
                .collect(),
            ..Default::default()
        }),
        pronunciation: None,
    })
}

pub fn engine_with(records: Vec<SessionRecord>) -> MemoryEngine {
    let sessions = InMemorySessions::new();
    for record in records {
        sessions.insert(record);
    }
    MemoryEngine::new(
        MemoryDb::open_in_memory().unwrap(),
        Arc::new(sessions),
        Config::new(),
    )
}
