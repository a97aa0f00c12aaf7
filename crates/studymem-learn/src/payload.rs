//! Per-module compressed pattern payloads

use crate::aggregator::{majority, round1, ChronicPattern, FrequencyAggregator, Observation};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use studymem_core::{
    ConversationObservations, Insight, ListeningObservations, Module, Observations,
    ReadingObservations, SpeakingObservations, WritingObservations,
};

/// Completion percentage below which a reading session counts as unfinished
const LOW_COMPLETION: f64 = 80.0;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ReadingPatterns {
    #[serde(default)]
    pub vocabulary_gaps: Vec<ChronicPattern>,
    #[serde(default)]
    pub comprehension_weaknesses: Vec<ChronicPattern>,
    #[serde(default)]
    pub chatbot_confusion_topics: Vec<ChronicPattern>,
    #[serde(default)]
    pub reading_speed_issue: bool,
    #[serde(default)]
    pub completion_issue: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ListeningPatterns {
    #[serde(default)]
    pub comprehension_weaknesses: Vec<ChronicPattern>,
    #[serde(default)]
    pub audio_speed_issue: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SpeakingPatterns {
    #[serde(default)]
    pub chronic_pronunciation_errors: Vec<ChronicPattern>,
    #[serde(default)]
    pub problem_phonemes: Vec<ChronicPattern>,
    #[serde(default)]
    pub fluency_patterns: Vec<ChronicPattern>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WritingPatterns {
    #[serde(default)]
    pub chronic_grammar_errors: Vec<ChronicPattern>,
    #[serde(default)]
    pub recurring_style_issues: Vec<ChronicPattern>,
    #[serde(default)]
    pub vocabulary_weaknesses: Vec<ChronicPattern>,
    #[serde(default)]
    pub content_patterns: Vec<ChronicPattern>,
    #[serde(default)]
    pub average_score: Option<f64>,
    #[serde(default)]
    pub off_topic_issue: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ConversationPatterns {
    #[serde(default)]
    pub chronic_grammar_errors: Vec<ChronicPattern>,
    #[serde(default)]
    pub vocabulary_gaps: Vec<ChronicPattern>,
    #[serde(default)]
    pub fluency_patterns: Vec<ChronicPattern>,
    #[serde(default)]
    pub topic_struggles: Vec<ChronicPattern>,
    #[serde(default)]
    pub chronic_mispronunciations: Vec<ChronicPattern>,
    #[serde(default)]
    pub problem_phonemes: Vec<ChronicPattern>,
    #[serde(default)]
    pub avg_words_per_session: f64,
}

/// Module-specific section of a payload
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "module", rename_all = "lowercase")]
pub enum ModulePatterns {
    Reading(ReadingPatterns),
    Listening(ListeningPatterns),
    Speaking(SpeakingPatterns),
    Writing(WritingPatterns),
    Conversation(ConversationPatterns),
}

impl ModulePatterns {
    pub fn empty(module: Module) -> Self {
        match module {
            Module::Reading => ModulePatterns::Reading(ReadingPatterns::default()),
            Module::Listening => ModulePatterns::Listening(ListeningPatterns::default()),
            Module::Speaking => ModulePatterns::Speaking(SpeakingPatterns::default()),
            Module::Writing => ModulePatterns::Writing(WritingPatterns::default()),
            Module::Conversation => ModulePatterns::Conversation(ConversationPatterns::default()),
        }
    }

    pub fn module(&self) -> Module {
        match self {
            ModulePatterns::Reading(_) => Module::Reading,
            ModulePatterns::Listening(_) => Module::Listening,
            ModulePatterns::Speaking(_) => Module::Speaking,
            ModulePatterns::Writing(_) => Module::Writing,
            ModulePatterns::Conversation(_) => Module::Conversation,
        }
    }

    /// Every ranked chronic list, named as it appears in the payload
    pub fn chronic_lists(&self) -> Vec<(&'static str, &[ChronicPattern])> {
        match self {
            ModulePatterns::Reading(p) => vec![
                ("vocabulary_gaps", p.vocabulary_gaps.as_slice()),
                ("comprehension_weaknesses", p.comprehension_weaknesses.as_slice()),
                ("chatbot_confusion_topics", p.chatbot_confusion_topics.as_slice()),
            ],
            ModulePatterns::Listening(p) => vec![(
                "comprehension_weaknesses",
                p.comprehension_weaknesses.as_slice(),
            )],
            ModulePatterns::Speaking(p) => vec![
                ("chronic_pronunciation_errors", p.chronic_pronunciation_errors.as_slice()),
                ("problem_phonemes", p.problem_phonemes.as_slice()),
                ("fluency_patterns", p.fluency_patterns.as_slice()),
            ],
            ModulePatterns::Writing(p) => vec![
                ("chronic_grammar_errors", p.chronic_grammar_errors.as_slice()),
                ("recurring_style_issues", p.recurring_style_issues.as_slice()),
                ("vocabulary_weaknesses", p.vocabulary_weaknesses.as_slice()),
                ("content_patterns", p.content_patterns.as_slice()),
            ],
            ModulePatterns::Conversation(p) => vec![
                ("chronic_grammar_errors", p.chronic_grammar_errors.as_slice()),
                ("vocabulary_gaps", p.vocabulary_gaps.as_slice()),
                ("fluency_patterns", p.fluency_patterns.as_slice()),
                ("topic_struggles", p.topic_struggles.as_slice()),
                ("chronic_mispronunciations", p.chronic_mispronunciations.as_slice()),
                ("problem_phonemes", p.problem_phonemes.as_slice()),
            ],
        }
    }
}

/// Compressed memory for one module, replaced wholesale on each compression
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompressedPayload {
    #[serde(flatten)]
    pub patterns: ModulePatterns,
    pub total_sessions_analyzed: usize,
    #[serde(default)]
    pub summary: Option<String>,
    #[serde(default)]
    pub last_compressed_at: Option<DateTime<Utc>>,
}

impl CompressedPayload {
    /// Payload of a module that has never been compressed
    pub fn empty(module: Module) -> Self {
        Self {
            patterns: ModulePatterns::empty(module),
            total_sessions_analyzed: 0,
            summary: None,
            last_compressed_at: None,
        }
    }

    pub fn module(&self) -> Module {
        self.patterns.module()
    }

    pub fn is_empty(&self) -> bool {
        self.total_sessions_analyzed == 0
    }

    /// Number of chronic entries across every list
    pub fn chronic_count(&self) -> usize {
        self.patterns
            .chronic_lists()
            .iter()
            .map(|(_, list)| list.len())
            .sum()
    }

    /// Aggregate a batch of insights. Insights from other modules are ignored.
    /// Pure: the summary is left unset.
    pub fn build(
        module: Module,
        insights: &[Insight],
        aggregator: &FrequencyAggregator,
        compressed_at: DateTime<Utc>,
    ) -> Self {
        let batch: Vec<&Observations> = insights
            .iter()
            .map(Insight::observations)
            .filter(|o| o.module() == module)
            .collect();

        let patterns = match module {
            Module::Reading => ModulePatterns::Reading(reading(&batch, aggregator)),
            Module::Listening => ModulePatterns::Listening(listening(&batch, aggregator)),
            Module::Speaking => ModulePatterns::Speaking(speaking(&batch, aggregator)),
            Module::Writing => ModulePatterns::Writing(writing(&batch, aggregator)),
            Module::Conversation => {
                ModulePatterns::Conversation(conversation(&batch, aggregator))
            }
        };

        Self {
            patterns,
            total_sessions_analyzed: batch.len(),
            summary: None,
            last_compressed_at: Some(compressed_at),
        }
    }
}

/// Chronic list over keys drawn from each insight
fn tags<'a, T: 'a>(
    agg: &FrequencyAggregator,
    insights: &[&'a T],
    keys: impl Fn(&'a T) -> Vec<Observation>,
) -> Vec<ChronicPattern> {
    agg.chronic(insights.iter().map(|i| keys(*i)))
}

fn reading(batch: &[&Observations], agg: &FrequencyAggregator) -> ReadingPatterns {
    let insights: Vec<&ReadingObservations> = batch
        .iter()
        .filter_map(|o| match o {
            Observations::Reading(r) => Some(r),
            _ => None,
        })
        .collect();

    ReadingPatterns {
        vocabulary_gaps: tags(agg, &insights, |r| {
            r.vocabulary_mistakes
                .iter()
                .map(|w| Observation::new(&w.word).with_context(r.text_topic.as_deref()))
                .collect()
        }),
        comprehension_weaknesses: tags(agg, &insights, |r| {
            r.question_types_struggled
                .iter()
                .map(|s| Observation::new(s.as_str()))
                .collect()
        }),
        chatbot_confusion_topics: tags(agg, &insights, |r| {
            r.chatbot_topics_confused.iter().map(Observation::new).collect()
        }),
        reading_speed_issue: majority(insights.iter().map(|r| r.reading_speed_issue)),
        completion_issue: majority(insights.iter().map(|r| r.completion_rate < LOW_COMPLETION)),
    }
}

fn listening(batch: &[&Observations], agg: &FrequencyAggregator) -> ListeningPatterns {
    let insights: Vec<&ListeningObservations> = batch
        .iter()
        .filter_map(|o| match o {
            Observations::Listening(l) => Some(l),
            _ => None,
        })
        .collect();

    ListeningPatterns {
        comprehension_weaknesses: tags(agg, &insights, |l| {
            l.question_types_struggled
                .iter()
                .map(|s| Observation::new(s.as_str()))
                .collect()
        }),
        audio_speed_issue: majority(insights.iter().map(|l| l.audio_speed_issue)),
    }
}

fn speaking(batch: &[&Observations], agg: &FrequencyAggregator) -> SpeakingPatterns {
    let insights: Vec<&SpeakingObservations> = batch
        .iter()
        .filter_map(|o| match o {
            Observations::Speaking(s) => Some(s),
            _ => None,
        })
        .collect();

    SpeakingPatterns {
        chronic_pronunciation_errors: tags(agg, &insights, |s| {
            s.mispronounced_words
                .iter()
                .map(|w| Observation::new(&w.word).with_score(w.accuracy))
                .collect()
        }),
        problem_phonemes: tags(agg, &insights, |s| {
            s.phoneme_errors
                .iter()
                .map(|p| Observation::new(&p.phoneme).with_score(p.accuracy))
                .collect()
        }),
        fluency_patterns: tags(agg, &insights, |s| {
            s.fluency_problems.iter().map(Observation::new).collect()
        }),
    }
}

fn writing(batch: &[&Observations], agg: &FrequencyAggregator) -> WritingPatterns {
    let insights: Vec<&WritingObservations> = batch
        .iter()
        .filter_map(|o| match o {
            Observations::Writing(w) => Some(w),
            _ => None,
        })
        .collect();

    let scores: Vec<f64> = insights
        .iter()
        .filter_map(|w| w.overall_score)
        .filter(|s| *s > 0.0)
        .collect();
    let average_score = if scores.is_empty() {
        None
    } else {
        Some(round1(scores.iter().sum::<f64>() / scores.len() as f64))
    };

    WritingPatterns {
        chronic_grammar_errors: tags(agg, &insights, |w| {
            w.grammar_errors
                .iter()
                .map(|e| Observation::new(&e.error_type).with_context(e.original.as_deref()))
                .collect()
        }),
        recurring_style_issues: tags(agg, &insights, |w| {
            w.style_issues
                .iter()
                .map(|s| Observation::new(&s.issue).with_context(s.example.as_deref()))
                .collect()
        }),
        vocabulary_weaknesses: tags(agg, &insights, |w| {
            w.vocabulary_issues
                .iter()
                .map(|v| Observation::new(&v.issue).with_context(v.suggestion.as_deref()))
                .collect()
        }),
        content_patterns: tags(agg, &insights, |w| {
            w.content_weaknesses
                .iter()
                .map(|c| Observation::new(&c.area))
                .collect()
        }),
        average_score,
        off_topic_issue: majority(insights.iter().map(|w| !w.on_topic)),
    }
}

fn conversation(batch: &[&Observations], agg: &FrequencyAggregator) -> ConversationPatterns {
    let insights: Vec<&ConversationObservations> = batch
        .iter()
        .filter_map(|o| match o {
            Observations::Conversation(c) => Some(c),
            _ => None,
        })
        .collect();

    let avg_words_per_session = if insights.is_empty() {
        0.0
    } else {
        let total: usize = insights.iter().map(|c| c.total_words).sum();
        round1(total as f64 / insights.len() as f64)
    };

    ConversationPatterns {
        chronic_grammar_errors: tags(agg, &insights, |c| {
            c.grammar_errors
                .iter()
                .map(|e| Observation::new(&e.error_type).with_context(e.original.as_deref()))
                .collect()
        }),
        vocabulary_gaps: tags(agg, &insights, |c| {
            c.vocabulary_gaps
                .iter()
                .map(|g| Observation::new(&g.word).with_context(g.context.as_deref()))
                .collect()
        }),
        fluency_patterns: tags(agg, &insights, |c| {
            c.fluency_issues.iter().map(Observation::new).collect()
        }),
        topic_struggles: tags(agg, &insights, |c| {
            c.topic_struggles.iter().map(Observation::new).collect()
        }),
        chronic_mispronunciations: tags(agg, &insights, |c| {
            c.mispronounced_words
                .iter()
                .map(|w| Observation::new(&w.word).with_score(w.accuracy))
                .collect()
        }),
        problem_phonemes: tags(agg, &insights, |c| {
            c.phoneme_errors
                .iter()
                .map(|p| Observation::new(&p.phoneme).with_score(p.accuracy))
                .collect()
        }),
        avg_words_per_session,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use studymem_core::{MispronouncedWord, Priority};

    fn at() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 5, 10, 8, 0, 0).unwrap()
    }

    fn speaking_insight(session: &str, words: &[(&str, f64)]) -> Insight {
        Insight::new(
            "s1",
            session,
            Observations::Speaking(SpeakingObservations {
                mispronounced_words: words
                    .iter()
                    .map(|(w, a)| MispronouncedWord {
                        word: w.to_string(),
                        accuracy: *a,
                        error_type: None,
                    })
                    .collect(),
                ..Default::default()
            }),
            at(),
        )
    }

    #[test]
    fn test_speaking_scenario() {
        let insights = vec![
            speaking_insight("1", &[("comfortable", 60.0), ("world", 80.0)]),
            speaking_insight("2", &[("comfortable", 65.0), ("world", 82.0)]),
            speaking_insight("3", &[("comfortable", 68.0)]),
            speaking_insight("4", &[]),
            speaking_insight("5", &[("rural", 40.0)]),
        ];
        let payload = CompressedPayload::build(
            Module::Speaking,
            &insights,
            &FrequencyAggregator::default(),
            at(),
        );

        assert_eq!(payload.total_sessions_analyzed, 5);
        assert_eq!(payload.summary, None);
        let ModulePatterns::Speaking(p) = &payload.patterns else {
            panic!("expected speaking patterns");
        };
        let words = &p.chronic_pronunciation_errors;
        assert_eq!(words.len(), 2);
        assert_eq!(
            (words[0].key.as_str(), words[0].frequency, words[0].avg_score, words[0].priority),
            ("comfortable", 3, Some(64.3), Priority::High)
        );
        assert_eq!(
            (words[1].key.as_str(), words[1].frequency, words[1].avg_score, words[1].priority),
            ("world", 2, Some(81.0), Priority::Medium)
        );
    }

    #[test]
    fn test_writing_average_and_off_topic() {
        let writing = |score: Option<f64>, on_topic: bool| {
            Insight::new(
                "s1",
                "w",
                Observations::Writing(WritingObservations {
                    overall_score: score,
                    on_topic,
                    ..Default::default()
                }),
                at(),
            )
        };
        let insights = vec![
            writing(Some(6.0), false),
            writing(Some(7.25), false),
            writing(None, true),
        ];
        let payload = CompressedPayload::build(
            Module::Writing,
            &insights,
            &FrequencyAggregator::default(),
            at(),
        );
        let ModulePatterns::Writing(p) = payload.patterns else {
            panic!("expected writing patterns");
        };
        assert_eq!(p.average_score, Some(6.6));
        assert!(p.off_topic_issue);
    }

    #[test]
    fn test_other_module_insights_ignored() {
        let insights = vec![speaking_insight("1", &[("a", 1.0)])];
        let payload = CompressedPayload::build(
            Module::Reading,
            &insights,
            &FrequencyAggregator::default(),
            at(),
        );
        assert_eq!(payload.total_sessions_analyzed, 0);
        assert_eq!(payload.module(), Module::Reading);
    }

    #[test]
    fn test_payload_json_shape() {
        let payload = CompressedPayload::empty(Module::Listening);
        let json = serde_json::to_value(&payload).unwrap();
        assert_eq!(json["module"], "listening");
        assert_eq!(json["total_sessions_analyzed"], 0);
        assert_eq!(json["audio_speed_issue"], false);

        let parsed: CompressedPayload = serde_json::from_value(json).unwrap();
        assert_eq!(parsed, payload);
        assert!(parsed.is_empty());
    }
}
