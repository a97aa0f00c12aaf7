//! Conversation session extractor

use crate::base::Extractor;
use studymem_core::{ConversationObservations, GrammarIssue, Module, Observations, Severity};
use studymem_sessions::{ConversationSession, SessionRecord, SessionSource};

const MAX_ANALYSIS_ITEMS: usize = 15;
const MIN_TURNS_FOR_LENGTH_CHECK: usize = 3;
const SHORT_CONVERSATION_WORDS: usize = 50;
const VERY_SHORT_AVG_WORDS: f64 = 5.0;

#[derive(Debug, Default)]
pub struct ConversationExtractor;

impl Extractor for ConversationExtractor {
    fn module(&self) -> Module {
        Module::Conversation
    }

    fn extract(&self, record: &SessionRecord, _source: &dyn SessionSource) -> Observations {
        let SessionRecord::Conversation(session) = record else {
            return Observations::empty(Module::Conversation);
        };

        let total_messages = session.student_messages().count();
        let total_words = session.student_word_count();
        let avg_words_per_message = if total_messages == 0 {
            0.0
        } else {
            total_words as f64 / total_messages as f64
        };

        let mut obs = ConversationObservations {
            topic: Some(
                session
                    .topic
                    .clone()
                    .unwrap_or_else(|| "general_conversation".to_string()),
            ),
            total_messages,
            total_words,
            avg_words_per_message,
            ..Default::default()
        };

        apply_analysis(session, &mut obs);

        if let Some(pronunciation) = &session.pronunciation {
            obs.mispronounced_words = pronunciation.mispronounced_words.clone();
            obs.phoneme_errors = pronunciation.phoneme_errors.clone();
            obs.pronunciation_scores = pronunciation.scores.clone();
        }

        if total_messages > 0 && avg_words_per_message < VERY_SHORT_AVG_WORDS {
            obs.fluency_issues.push("very_short_responses".to_string());
        }

        Observations::Conversation(obs)
    }
}

fn apply_analysis(session: &ConversationSession, obs: &mut ConversationObservations) {
    let Some(analysis) = &session.analysis else {
        if obs.total_messages >= MIN_TURNS_FOR_LENGTH_CHECK
            && obs.total_words < SHORT_CONVERSATION_WORDS
        {
            obs.fluency_issues.push("short_responses".to_string());
        }
        return;
    };

    obs.grammar_errors = analysis
        .grammar_errors
        .iter()
        .take(MAX_ANALYSIS_ITEMS)
        .map(|e| GrammarIssue {
            error_type: e.error_type.clone(),
            original: e.example.clone(),
            correction: e.correction.clone(),
            explanation: None,
            severity: Severity::Medium,
        })
        .collect();
    obs.vocabulary_gaps = analysis
        .vocabulary_gaps
        .iter()
        .take(MAX_ANALYSIS_ITEMS)
        .cloned()
        .collect();
    obs.fluency_issues = analysis
        .fluency_issues
        .iter()
        .take(MAX_ANALYSIS_ITEMS)
        .cloned()
        .collect();
    obs.topic_struggles = analysis
        .topic_struggles
        .iter()
        .take(MAX_ANALYSIS_ITEMS)
        .cloned()
        .collect();
}

#[cfg(test)]
mod tests {
    use super::*;
    use studymem_core::VocabularyGap;
    use studymem_sessions::{
        ChatMessage, ChatRole, ConversationAnalysis, GrammarObservation, InMemorySessions,
        PronunciationData,
    };

    fn session(user_turns: &[&str], analysis: Option<ConversationAnalysis>) -> SessionRecord {
        let mut messages = Vec::new();
        for turn in user_turns {
            messages.push(ChatMessage {
                role: ChatRole::Assistant,
                content: "Tell me more about that, please.".to_string(),
            });
            messages.push(ChatMessage {
                role: ChatRole::User,
                content: turn.to_string(),
            });
        }
        SessionRecord::Conversation(ConversationSession {
            session_id: "c1".to_string(),
            student_id: "s1".to_string(),
            completed_at: None,
            topic: None,
            platform: None,
            messages,
            analysis,
            pronunciation: None,
        })
    }

    fn extract(record: &SessionRecord) -> ConversationObservations {
        match ConversationExtractor.extract(record, &InMemorySessions::new()) {
            Observations::Conversation(c) => c,
            other => panic!("unexpected: {:?}", other),
        }
    }

    #[test]
    fn test_short_responses_without_analysis() {
        let obs = extract(&session(&["yes", "I like it", "no thanks"], None));
        assert_eq!(obs.total_messages, 3);
        assert_eq!(obs.total_words, 6);
        assert_eq!(obs.fluency_issues, vec!["short_responses", "very_short_responses"]);
        assert_eq!(obs.topic.as_deref(), Some("general_conversation"));
    }

    #[test]
    fn test_analysis_lists_capped() {
        let analysis = ConversationAnalysis {
            grammar_errors: (0..20)
                .map(|i| GrammarObservation {
                    error_type: "past_tense".to_string(),
                    example: Some(format!("I go yesterday {}", i)),
                    correction: Some("I went yesterday".to_string()),
                })
                .collect(),
            vocabulary_gaps: vec![VocabularyGap {
                word: "commute".to_string(),
                context: Some("my travel to work".to_string()),
                issue: None,
            }],
            fluency_issues: vec![],
            topic_struggles: vec!["work".to_string()],
        };
        let long = "I usually take the early train to the office because it is quiet";
        let obs = extract(&session(&[long, long], Some(analysis)));

        assert_eq!(obs.grammar_errors.len(), 15);
        assert_eq!(obs.grammar_errors[0].original.as_deref(), Some("I go yesterday 0"));
        assert_eq!(obs.vocabulary_gaps.len(), 1);
        assert!(obs.fluency_issues.is_empty());
    }

    #[test]
    fn test_pronunciation_folded_in() {
        let mut record = session(&["I think so"], None);
        if let SessionRecord::Conversation(c) = &mut record {
            c.pronunciation = Some(PronunciationData {
                mispronounced_words: vec![studymem_core::MispronouncedWord {
                    word: "think".to_string(),
                    accuracy: 52.0,
                    error_type: None,
                }],
                ..Default::default()
            });
        }
        let obs = extract(&record);
        assert_eq!(obs.mispronounced_words.len(), 1);
        assert_eq!(obs.fluency_issues, vec!["very_short_responses"]);
    }
}
