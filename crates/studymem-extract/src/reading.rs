//! Reading session extractor

use crate::base::{truncate_chars, Extractor, MAX_SNIPPET_CHARS};
use crate::classifier::{KeywordClassifier, SkillClassifier};
use std::collections::{BTreeSet, HashSet};
use studymem_core::{
    ChatbotQuestion, Engagement, Module, Observations, QuestionOutcome, ReadingObservations,
    RepeatedLookup, RepeatedTopic, SkillType, WordLookup,
};
use studymem_sessions::{ComprehensionResponse, ReadingSession, SessionRecord, SessionSource};

/// Lookup difficulty above which a word counts as difficult
const DIFFICULT_WORD_LEVEL: u8 = 7;

/// Words per minute below which reading speed is flagged
const SLOW_READING_WPM: f64 = 100.0;

pub struct ReadingExtractor {
    classifier: Box<dyn SkillClassifier>,
}

impl ReadingExtractor {
    pub fn new() -> Self {
        Self::with_classifier(Box::new(KeywordClassifier::new(SkillType::Inference)))
    }

    pub fn with_classifier(classifier: Box<dyn SkillClassifier>) -> Self {
        Self { classifier }
    }
}

impl Default for ReadingExtractor {
    fn default() -> Self {
        Self::new()
    }
}

impl Extractor for ReadingExtractor {
    fn module(&self) -> Module {
        Module::Reading
    }

    fn extract(&self, record: &SessionRecord, source: &dyn SessionSource) -> Observations {
        let SessionRecord::Reading(session) = record else {
            return Observations::empty(Module::Reading);
        };

        let history = source.history(Module::Reading, &session.student_id);
        let others: Vec<&ReadingSession> = history
            .iter()
            .filter_map(|r| match r {
                SessionRecord::Reading(s) if s.session_id != session.session_id => Some(s),
                _ => None,
            })
            .collect();

        let mut obs = ReadingObservations {
            completion_rate: session.completion_percentage.unwrap_or(0.0),
            engagement: Engagement::from_vocabulary_clicks(session.vocabulary_clicks),
            reading_speed_issue: matches!(
                session.words_per_minute,
                Some(wpm) if wpm > 0.0 && wpm < SLOW_READING_WPM
            ),
            text_category: session.text_category.clone(),
            text_difficulty: session.text_difficulty.clone(),
            text_topic: session.text_title.clone(),
            ..Default::default()
        };

        collect_lookups(session, &others, &mut obs);
        self.collect_responses(&session.responses, &mut obs);
        collect_chatbot(session, &others, &mut obs);

        Observations::Reading(obs)
    }
}

impl ReadingExtractor {
    fn collect_responses(&self, responses: &[ComprehensionResponse], obs: &mut ReadingObservations) {
        let mut struggled = BTreeSet::new();
        for response in responses {
            let mut outcome = QuestionOutcome {
                question_id: response.question_id.clone(),
                question: truncate_chars(&response.question_text, MAX_SNIPPET_CHARS),
                student_answer: response.student_answer.clone(),
                correct_answer: response.correct_answer.clone(),
                time_spent_secs: response.time_spent_secs,
                skill: None,
            };
            if response.is_correct {
                obs.correct_questions.push(outcome);
            } else {
                let skill = self.classifier.classify(&response.question_text);
                struggled.insert(skill);
                outcome.skill = Some(skill);
                obs.incorrect_questions.push(outcome);
            }
        }
        obs.question_types_struggled = struggled.into_iter().collect();
    }
}

fn collect_lookups(session: &ReadingSession, others: &[&ReadingSession], obs: &mut ReadingObservations) {
    for lookup in &session.lookups {
        let word = WordLookup {
            word: lookup.word.clone(),
            difficulty: lookup.difficulty_level,
            lookup_count: lookup.looked_up_count,
        };

        if lookup.difficulty_level.is_some_and(|d| d > DIFFICULT_WORD_LEVEL) {
            obs.difficult_words.push(word.clone());
        }

        let previous_lookups: usize = others
            .iter()
            .map(|s| {
                s.lookups
                    .iter()
                    .filter(|l| l.word.eq_ignore_ascii_case(&lookup.word))
                    .count()
            })
            .sum();
        if previous_lookups > 0 {
            obs.repeated_lookups.push(RepeatedLookup {
                word: word.word.clone(),
                difficulty: word.difficulty,
                lookup_count: word.lookup_count,
                previous_lookups,
            });
        }

        obs.vocabulary_mistakes.push(word);
    }
}

fn collect_chatbot(session: &ReadingSession, others: &[&ReadingSession], obs: &mut ReadingObservations) {
    // Topics asked in other sessions; repeats within this one do not count
    let previous_topics: HashSet<&str> = others
        .iter()
        .flat_map(|s| s.chatbot_turns.iter())
        .filter_map(|t| t.topic_category.as_deref())
        .collect();

    let mut confused = BTreeSet::new();
    for turn in &session.chatbot_turns {
        let question = truncate_chars(&turn.user_message, MAX_SNIPPET_CHARS);
        obs.chatbot_questions.push(ChatbotQuestion {
            question: question.clone(),
            message_type: turn.message_type.clone(),
            topic: turn.topic_category.clone(),
        });

        let Some(topic) = turn.topic_category.as_deref() else {
            continue;
        };
        confused.insert(topic.to_string());
        if previous_topics.contains(topic) {
            obs.chatbot_repeated_topics.push(RepeatedTopic {
                topic: topic.to_string(),
                question,
            });
        }
    }
    obs.chatbot_topics_confused = confused.into_iter().collect();
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use studymem_sessions::{ChatbotTurn, InMemorySessions, VocabularyLookup};

    fn session(id: &str, words: &[(&str, u8)], topics: &[&str]) -> ReadingSession {
        ReadingSession {
            session_id: id.to_string(),
            student_id: "s1".to_string(),
            completed_at: Some(Utc.with_ymd_and_hms(2026, 2, 1, 12, 0, 0).unwrap()),
            text_title: Some("Coral reefs".to_string()),
            text_category: Some("science".to_string()),
            text_difficulty: None,
            words_per_minute: Some(85.0),
            completion_percentage: Some(70.0),
            vocabulary_clicks: words.len() as u32,
            lookups: words
                .iter()
                .map(|(w, d)| VocabularyLookup {
                    word: w.to_string(),
                    difficulty_level: Some(*d),
                    looked_up_count: 1,
                })
                .collect(),
            responses: vec![],
            chatbot_turns: topics
                .iter()
                .map(|t| ChatbotTurn {
                    user_message: format!("what does {} mean here", t),
                    message_type: Some("question".to_string()),
                    topic_category: Some(t.to_string()),
                })
                .collect(),
        }
    }

    fn reading(obs: Observations) -> ReadingObservations {
        match obs {
            Observations::Reading(r) => r,
            other => panic!("expected reading observations, got {:?}", other),
        }
    }

    #[test]
    fn test_repeated_lookup_uses_other_sessions() {
        let source = InMemorySessions::new();
        source.insert(SessionRecord::Reading(session("r1", &[("ubiquitous", 8)], &[])));
        let current = SessionRecord::Reading(session("r2", &[("ubiquitous", 8), ("reef", 2)], &[]));
        source.insert(current.clone());

        let obs = reading(ReadingExtractor::new().extract(&current, &source));
        assert_eq!(obs.vocabulary_mistakes.len(), 2);
        assert_eq!(obs.difficult_words.len(), 1);
        assert_eq!(obs.repeated_lookups.len(), 1);
        assert_eq!(obs.repeated_lookups[0].previous_lookups, 1);
        assert!(obs.reading_speed_issue);
        assert_eq!(obs.engagement, Engagement::Low);
        assert_eq!(obs.text_topic.as_deref(), Some("Coral reefs"));
    }

    #[test]
    fn test_chatbot_topics_deduplicated_and_repeated() {
        let source = InMemorySessions::new();
        source.insert(SessionRecord::Reading(session("r1", &[], &["idioms"])));
        let current = SessionRecord::Reading(session("r2", &[], &["idioms", "grammar", "grammar"]));

        let obs = reading(ReadingExtractor::new().extract(&current, &source));
        assert_eq!(obs.chatbot_questions.len(), 3);
        assert_eq!(obs.chatbot_topics_confused, vec!["grammar", "idioms"]);
        assert_eq!(obs.chatbot_repeated_topics.len(), 1);
        assert_eq!(obs.chatbot_repeated_topics[0].topic, "idioms");
    }

    #[test]
    fn test_topic_asked_twice_in_first_session_is_not_repeated() {
        let source = InMemorySessions::new();
        let current = SessionRecord::Reading(session("r1", &[], &["grammar", "grammar"]));
        source.insert(current.clone());

        let obs = reading(ReadingExtractor::new().extract(&current, &source));
        assert_eq!(obs.chatbot_questions.len(), 2);
        assert_eq!(obs.chatbot_topics_confused, vec!["grammar"]);
        assert!(obs.chatbot_repeated_topics.is_empty());
    }

    #[test]
    fn test_wrong_record_yields_empty() {
        let source = InMemorySessions::new();
        let record = SessionRecord::Listening(studymem_sessions::ListeningSession {
            session_id: "l".to_string(),
            student_id: "s1".to_string(),
            completed_at: None,
            audio_category: None,
            audio_difficulty: None,
            performance_score: None,
            results: vec![],
        });
        let obs = reading(ReadingExtractor::new().extract(&record, &source));
        assert!(obs.vocabulary_mistakes.is_empty());
    }
}
