//! Writing session extractor

use crate::base::{truncate_chars, Extractor, MAX_SNIPPET_CHARS};
use studymem_core::{
    ContentWeakness, GrammarIssue, Module, Observations, SentenceIssue, Severity, StyleIssue,
    VocabularyIssue, WritingObservations,
};
use studymem_sessions::{SessionRecord, SessionSource, WritingAnalysis};

const MAX_SPECIFIC_CORRECTIONS: usize = 10;
const MAX_GRAMMAR_ISSUES: usize = 20;
const MAX_STYLE_CONSIDERED: usize = 10;
const MAX_SENTENCES_CONSIDERED: usize = 20;
const MAX_KEPT: usize = 15;

#[derive(Debug, Default)]
pub struct WritingExtractor;

impl Extractor for WritingExtractor {
    fn module(&self) -> Module {
        Module::Writing
    }

    fn extract(&self, record: &SessionRecord, _source: &dyn SessionSource) -> Observations {
        let SessionRecord::Writing(session) = record else {
            return Observations::empty(Module::Writing);
        };

        let mut obs = WritingObservations {
            writing_type: Some(
                session
                    .writing_type
                    .clone()
                    .unwrap_or_else(|| "general".to_string()),
            ),
            topic: Some(session.topic.clone().unwrap_or_else(|| "unknown".to_string())),
            ..Default::default()
        };

        if let Some(analysis) = &session.analysis {
            obs.grammar_errors = grammar_issues(analysis);
            obs.style_issues = analysis
                .style_suggestions
                .iter()
                .take(MAX_STYLE_CONSIDERED)
                .map(|s| StyleIssue {
                    issue: s.issue.clone(),
                    example: s.example.clone(),
                    improvement: s.improvement.clone(),
                })
                .collect();
            obs.vocabulary_issues = vocabulary_issues(analysis);
            obs.sentence_issues = sentence_issues(analysis);
            obs.content_weaknesses = analysis
                .content_feedback
                .iter()
                .filter(|(_, rating)| {
                    let rating = rating.to_lowercase();
                    rating == "weak" || rating == "poor"
                })
                .map(|(area, rating)| ContentWeakness {
                    area: area.clone(),
                    rating: rating.clone(),
                })
                .collect();
            obs.overall_score = analysis.overall_score;
            obs.on_topic = analysis.on_topic.unwrap_or(true);
        }

        Observations::Writing(obs)
    }
}

fn grammar_issues(analysis: &WritingAnalysis) -> Vec<GrammarIssue> {
    let common = analysis.common_errors.iter().map(|error_type| GrammarIssue {
        error_type: error_type.clone(),
        original: None,
        correction: None,
        explanation: None,
        severity: Severity::Medium,
    });
    let specific = analysis
        .specific_corrections
        .iter()
        .take(MAX_SPECIFIC_CORRECTIONS)
        .map(|c| GrammarIssue {
            error_type: c.error_type.clone().unwrap_or_else(|| "unknown".to_string()),
            original: c.original.clone(),
            correction: c.correction.clone(),
            explanation: c.explanation.clone(),
            severity: Severity::High,
        });
    common.chain(specific).take(MAX_GRAMMAR_ISSUES).collect()
}

fn vocabulary_issues(analysis: &WritingAnalysis) -> Vec<VocabularyIssue> {
    let mut issues = Vec::new();
    let basic = analysis
        .vocabulary
        .complexity_level
        .as_deref()
        .is_some_and(|level| level.eq_ignore_ascii_case("basic"));
    if basic {
        issues.push(VocabularyIssue {
            issue: "limited_vocabulary".to_string(),
            suggestion: None,
            severity: Some(Severity::High),
        });
    }
    issues.extend(
        analysis
            .vocabulary
            .suggestions
            .iter()
            .map(|s| VocabularyIssue {
                issue: "vocabulary_suggestion".to_string(),
                suggestion: Some(s.clone()),
                severity: None,
            }),
    );
    issues.truncate(MAX_KEPT);
    issues
}

fn sentence_issues(analysis: &WritingAnalysis) -> Vec<SentenceIssue> {
    let mut issues = Vec::new();
    for sentence in analysis.sentences.iter().take(MAX_SENTENCES_CONSIDERED) {
        let text = truncate_chars(&sentence.original, MAX_SNIPPET_CHARS);
        if matches!(sentence.clarity.as_deref(), Some("Unclear") | Some("Confusing")) {
            issues.push(SentenceIssue {
                issue: "unclear_sentence".to_string(),
                sentence: text.clone(),
            });
        }
        if sentence.effectiveness.as_deref() == Some("Weak") {
            issues.push(SentenceIssue {
                issue: "weak_sentence".to_string(),
                sentence: text,
            });
        }
    }
    issues.truncate(MAX_KEPT);
    issues
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;
    use studymem_sessions::{
        GrammarCorrection, InMemorySessions, SentenceAnalysis, VocabularyAssessment,
        WritingSession,
    };

    fn extract(analysis: Option<WritingAnalysis>) -> WritingObservations {
        let record = SessionRecord::Writing(WritingSession {
            session_id: "w1".to_string(),
            student_id: "s1".to_string(),
            completed_at: None,
            writing_type: None,
            topic: Some("my hometown".to_string()),
            analysis,
        });
        match WritingExtractor.extract(&record, &InMemorySessions::new()) {
            Observations::Writing(w) => w,
            other => panic!("unexpected: {:?}", other),
        }
    }

    #[test]
    fn test_missing_analysis_is_empty_not_error() {
        let obs = extract(None);
        assert!(obs.grammar_errors.is_empty());
        assert!(obs.on_topic);
        assert_eq!(obs.writing_type.as_deref(), Some("general"));
    }

    #[test]
    fn test_structured_feedback_mapping() {
        let mut content = BTreeMap::new();
        content.insert("organization".to_string(), "weak".to_string());
        content.insert("ideas".to_string(), "strong".to_string());

        let obs = extract(Some(WritingAnalysis {
            common_errors: vec!["subject_verb_agreement".to_string()],
            specific_corrections: (0..15)
                .map(|i| GrammarCorrection {
                    error_type: if i == 0 { None } else { Some("article_usage".to_string()) },
                    original: Some(format!("a apple {}", i)),
                    correction: None,
                    explanation: None,
                })
                .collect(),
            style_suggestions: vec![],
            vocabulary: VocabularyAssessment {
                complexity_level: Some("Basic".to_string()),
                suggestions: vec!["use 'enormous'".to_string()],
            },
            sentences: vec![SentenceAnalysis {
                original: "x".repeat(150),
                clarity: Some("Confusing".to_string()),
                effectiveness: Some("Weak".to_string()),
            }],
            content_feedback: content,
            overall_score: Some(6.5),
            on_topic: Some(false),
        }));

        // 1 common + 10 specific
        assert_eq!(obs.grammar_errors.len(), 11);
        assert_eq!(obs.grammar_errors[0].severity, Severity::Medium);
        assert_eq!(obs.grammar_errors[1].error_type, "unknown");
        assert_eq!(obs.vocabulary_issues[0].issue, "limited_vocabulary");
        assert_eq!(obs.vocabulary_issues.len(), 2);
        assert_eq!(obs.sentence_issues.len(), 2);
        assert_eq!(obs.sentence_issues[0].sentence.len(), 100);
        assert_eq!(obs.content_weaknesses.len(), 1);
        assert_eq!(obs.content_weaknesses[0].area, "organization");
        assert!(!obs.on_topic);
    }
}
