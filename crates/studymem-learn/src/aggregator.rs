//! Frequency aggregation and chronic detection.
//!
//! Frequency is the number of insights a key appears in, not the number of
//! occurrences: a word missed five times in one session is one data point.
//! Everything here is pure and deterministic.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use studymem_core::{Config, Priority, MAX_CHRONIC_PATTERNS};

const DEFAULT_MAX_EXAMPLES: usize = 3;

/// One keyed data point flattened out of an insight
#[derive(Debug, Clone, PartialEq)]
pub struct Observation {
    pub key: String,
    pub score: Option<f64>,
    pub context: Option<String>,
}

impl Observation {
    pub fn new(key: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            score: None,
            context: None,
        }
    }

    pub fn with_score(mut self, score: f64) -> Self {
        self.score = Some(score);
        self
    }

    pub fn with_context(mut self, context: Option<&str>) -> Self {
        self.context = context
            .map(str::trim)
            .filter(|c| !c.is_empty())
            .map(str::to_string);
        self
    }
}

/// A key recurring across at least two insights.
///
/// Every chronic list shares this shape. `key` is whatever the list counts
/// (a word, a phoneme, a grammar rule, a topic) and `avg_score` is the mean of
/// the per-occurrence score, e.g. pronunciation accuracy for
/// `chronic_pronunciation_errors`. The per-list names `word` and
/// `avg_accuracy` are accepted when reading.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChronicPattern {
    #[serde(alias = "word")]
    pub key: String,
    pub frequency: usize,
    #[serde(default, alias = "avg_accuracy", skip_serializing_if = "Option::is_none")]
    pub avg_score: Option<f64>,
    pub priority: Priority,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub example_context: Vec<String>,
}

#[derive(Default)]
struct KeyStats {
    frequency: usize,
    scores: Vec<f64>,
    contexts: Vec<String>,
}

/// Groups keyed observations and ranks the chronic ones
#[derive(Debug, Clone, Copy)]
pub struct FrequencyAggregator {
    max_patterns: usize,
    max_examples: usize,
}

impl FrequencyAggregator {
    pub fn new(max_patterns: usize, max_examples: usize) -> Self {
        Self {
            max_patterns,
            max_examples,
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(config.max_chronic_patterns, config.max_example_context)
    }

    /// Rank chronic keys. Each item of `batches` holds one insight's observations.
    pub fn chronic<I, B>(&self, batches: I) -> Vec<ChronicPattern>
    where
        I: IntoIterator<Item = B>,
        B: IntoIterator<Item = Observation>,
    {
        let mut stats: BTreeMap<String, KeyStats> = BTreeMap::new();

        for batch in batches {
            let mut seen = BTreeSet::new();
            for obs in batch {
                let key = normalize_key(&obs.key);
                if key.is_empty() {
                    continue;
                }
                let entry = stats.entry(key.clone()).or_default();
                if seen.insert(key) {
                    entry.frequency += 1;
                }
                if let Some(score) = obs.score {
                    entry.scores.push(score);
                }
                if let Some(context) = obs.context {
                    if entry.contexts.len() < self.max_examples && !entry.contexts.contains(&context)
                    {
                        entry.contexts.push(context);
                    }
                }
            }
        }

        let mut patterns: Vec<ChronicPattern> = stats
            .into_iter()
            .filter_map(|(key, s)| {
                let priority = Priority::from_frequency(s.frequency)?;
                let avg_score = if s.scores.is_empty() {
                    None
                } else {
                    Some(round1(s.scores.iter().sum::<f64>() / s.scores.len() as f64))
                };
                Some(ChronicPattern {
                    key,
                    frequency: s.frequency,
                    avg_score,
                    priority,
                    example_context: s.contexts,
                })
            })
            .collect();

        // BTreeMap order already gives key ascending; stable sort keeps it for ties
        patterns.sort_by(|a, b| b.frequency.cmp(&a.frequency));
        patterns.truncate(self.max_patterns);
        patterns
    }
}

impl Default for FrequencyAggregator {
    fn default() -> Self {
        Self::new(MAX_CHRONIC_PATTERNS, DEFAULT_MAX_EXAMPLES)
    }
}

fn normalize_key(key: &str) -> String {
    key.trim().to_lowercase()
}

/// True when strictly more than half of the flags are set
pub fn majority<I: IntoIterator<Item = bool>>(flags: I) -> bool {
    let (set, total) = flags
        .into_iter()
        .fold((0usize, 0usize), |(set, total), f| (set + usize::from(f), total + 1));
    total > 0 && set * 2 > total
}

/// Round to one decimal place
pub fn round1(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}
