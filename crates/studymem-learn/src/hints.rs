//! Adaptive generation hints derived from the memory board

use crate::aggregator::ChronicPattern;
use crate::board::MemoryBoard;
use crate::payload::{CompressedPayload, ModulePatterns};
use serde::{Deserialize, Serialize};
use studymem_core::{DifficultyHint, Module, Priority};

const MAX_CHALLENGE_KEYS: usize = 5;

/// Below this many challenge keys the student gets harder material
const ADVANCED_BELOW_CHALLENGES: usize = 3;

/// Hints handed to content generators
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AdaptiveHints {
    pub challenge_keys: Vec<String>,
    pub priority_categories: Vec<String>,
    pub difficulty_hint: DifficultyHint,
    pub summary: String,
}

impl AdaptiveHints {
    fn neutral(categories: &[&str]) -> Self {
        Self {
            challenge_keys: Vec::new(),
            priority_categories: categories.iter().map(|c| c.to_string()).collect(),
            difficulty_hint: DifficultyHint::Intermediate,
            summary: String::new(),
        }
    }
}

/// Pure reads over a memory board
pub struct AdaptiveHintProvider;

impl AdaptiveHintProvider {
    /// Reading-question focus: words to re-test and question types to favour
    pub fn reading_hints(board: Option<&MemoryBoard>) -> AdaptiveHints {
        Self::module_hints(board, Module::Reading)
    }

    /// Hints for any module; neutral defaults until the module is compressed
    pub fn module_hints(board: Option<&MemoryBoard>, module: Module) -> AdaptiveHints {
        let Some(payload) = board.map(|b| b.payload(module)).filter(|p| !p.is_empty()) else {
            return AdaptiveHints::neutral(no_memory_categories(module));
        };

        let (challenges, categories) = focus_lists(&payload.patterns);
        let challenge_keys: Vec<String> = challenges
            .iter()
            .take(MAX_CHALLENGE_KEYS)
            .map(|p| p.key.clone())
            .collect();

        let mut priority_categories: Vec<String> = categories
            .iter()
            .flat_map(|list| list.iter())
            .filter(|p| p.priority == Priority::High)
            .map(|p| p.key.clone())
            .collect();
        priority_categories.dedup();
        if priority_categories.is_empty() {
            priority_categories = standard_categories(module)
                .iter()
                .map(|c| c.to_string())
                .collect();
        }

        AdaptiveHints {
            challenge_keys,
            priority_categories,
            difficulty_hint: if challenges.len() < ADVANCED_BELOW_CHALLENGES {
                DifficultyHint::Advanced
            } else {
                DifficultyHint::Intermediate
            },
            summary: payload.summary.clone().unwrap_or_default(),
        }
    }

    /// First remembered issue across modules, phrased for a greeting
    pub fn welcome_focus(board: Option<&MemoryBoard>) -> Option<String> {
        let board = board?;
        let first = |payload: &CompressedPayload| -> Option<String> {
            match &payload.patterns {
                ModulePatterns::Reading(p) => p
                    .vocabulary_gaps
                    .first()
                    .map(|g| format!("vocabulary like '{}'", g.key)),
                ModulePatterns::Speaking(p) => p
                    .chronic_pronunciation_errors
                    .first()
                    .map(|w| format!("pronunciation of '{}'", w.key)),
                ModulePatterns::Writing(p) => {
                    p.chronic_grammar_errors.first().map(|e| e.key.clone())
                }
                ModulePatterns::Conversation(p) => {
                    p.chronic_grammar_errors.first().map(|e| e.key.clone())
                }
                ModulePatterns::Listening(_) => None,
            }
        };

        [
            Module::Reading,
            Module::Speaking,
            Module::Writing,
            Module::Conversation,
        ]
        .into_iter()
        .find_map(|m| first(board.payload(m)))
    }

    /// Greeting that mentions the remembered focus, if any
    pub fn welcome_message(board: Option<&MemoryBoard>) -> Option<String> {
        Self::welcome_focus(board).map(|focus| {
            format!(
                "Welcome back! I remember we've been working on {}. Let's have a great conversation today!",
                focus
            )
        })
    }
}

/// Challenge list and the lists whose high-priority keys become categories
fn focus_lists(patterns: &ModulePatterns) -> (&[ChronicPattern], Vec<&[ChronicPattern]>) {
    match patterns {
        ModulePatterns::Reading(p) => (
            p.vocabulary_gaps.as_slice(),
            vec![p.comprehension_weaknesses.as_slice()],
        ),
        ModulePatterns::Listening(p) => (
            p.comprehension_weaknesses.as_slice(),
            vec![p.comprehension_weaknesses.as_slice()],
        ),
        ModulePatterns::Speaking(p) => (
            p.chronic_pronunciation_errors.as_slice(),
            vec![p.problem_phonemes.as_slice(), p.fluency_patterns.as_slice()],
        ),
        ModulePatterns::Writing(p) => (
            p.chronic_grammar_errors.as_slice(),
            vec![p.recurring_style_issues.as_slice(), p.content_patterns.as_slice()],
        ),
        ModulePatterns::Conversation(p) => (
            p.vocabulary_gaps.as_slice(),
            vec![p.chronic_grammar_errors.as_slice(), p.topic_struggles.as_slice()],
        ),
    }
}

fn standard_categories(module: Module) -> &'static [&'static str] {
    match module {
        Module::Reading => &["inference", "main_idea", "detail"],
        Module::Listening => &["main_idea", "detail", "inference"],
        Module::Speaking => &["pronunciation", "fluency"],
        Module::Writing => &["grammar", "style", "vocabulary"],
        Module::Conversation => &["grammar", "vocabulary", "fluency"],
    }
}

fn no_memory_categories(module: Module) -> &'static [&'static str] {
    match module {
        Module::Reading => &["inference", "main_idea", "detail", "vocabulary"],
        other => standard_categories(other),
    }
}
