//! Listening session extractor

use crate::base::{truncate_chars, Extractor, MAX_SNIPPET_CHARS};
use crate::classifier::{KeywordClassifier, SkillClassifier};
use std::collections::BTreeSet;
use studymem_core::{ListeningObservations, Module, Observations, QuestionOutcome};
use studymem_sessions::{SessionRecord, SessionSource};

/// Performance score below which audio speed is assumed to be a problem
const AUDIO_SPEED_SCORE: f64 = 50.0;

pub struct ListeningExtractor {
    classifier: Box<dyn SkillClassifier>,
}

impl ListeningExtractor {
    pub fn new() -> Self {
        Self::with_classifier(Box::new(KeywordClassifier::default()))
    }

    pub fn with_classifier(classifier: Box<dyn SkillClassifier>) -> Self {
        Self { classifier }
    }
}

impl Default for ListeningExtractor {
    fn default() -> Self {
        Self::new()
    }
}

impl Extractor for ListeningExtractor {
    fn module(&self) -> Module {
        Module::Listening
    }

    fn extract(&self, record: &SessionRecord, _source: &dyn SessionSource) -> Observations {
        let SessionRecord::Listening(session) = record else {
            return Observations::empty(Module::Listening);
        };

        let mut obs = ListeningObservations {
            audio_category: Some(
                session
                    .audio_category
                    .clone()
                    .unwrap_or_else(|| "general".to_string()),
            ),
            audio_difficulty: Some(
                session
                    .audio_difficulty
                    .clone()
                    .unwrap_or_else(|| "intermediate".to_string()),
            ),
            // An unscored session counts as zero
            audio_speed_issue: session.performance_score.unwrap_or(0.0) < AUDIO_SPEED_SCORE,
            ..Default::default()
        };

        let mut struggled = BTreeSet::new();
        for result in &session.results {
            let mut outcome = QuestionOutcome {
                question_id: result.question_id.clone(),
                question: truncate_chars(&result.question_text, MAX_SNIPPET_CHARS),
                student_answer: result.student_answer.clone(),
                correct_answer: None,
                time_spent_secs: result.time_spent_secs,
                skill: None,
            };
            if result.is_correct {
                obs.correct_questions.push(outcome);
            } else {
                let skill = self.classifier.classify(&result.question_text);
                struggled.insert(skill);
                outcome.correct_answer = result.correct_answer.clone();
                outcome.skill = Some(skill);
                obs.incorrect_questions.push(outcome);
            }
        }
        obs.question_types_struggled = struggled.into_iter().collect();

        Observations::Listening(obs)
    }
}
