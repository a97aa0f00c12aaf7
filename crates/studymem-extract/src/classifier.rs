//! Coarse skill classification for missed comprehension questions

use regex::Regex;
use std::sync::OnceLock;
use studymem_core::SkillType;

/// Pluggable question classifier
pub trait SkillClassifier: Send + Sync {
    fn classify(&self, question: &str) -> SkillType;
}

struct SkillPattern {
    skill: SkillType,
    pattern: &'static str,
}

// Checked in order; first match wins
const SKILL_PATTERNS: &[SkillPattern] = &[
    SkillPattern {
        skill: SkillType::MainIdea,
        pattern: r"(?i)\bmain idea\b|\bprimarily about\b|\bmainly about\b|\bbest title\b",
    },
    SkillPattern {
        skill: SkillType::Detail,
        pattern: r"(?i)\bdetails?\b|\bmentioned\b|\baccording to\b",
    },
    SkillPattern {
        skill: SkillType::Inference,
        pattern: r"(?i)\binfer|\bimpl(y|ies|ied)\b|\bsuggests?\b|\bmost likely\b",
    },
    SkillPattern {
        skill: SkillType::Vocabulary,
        pattern: r"(?i)\bclosest in meaning\b|\b(word|phrase)\b.*\bmeans?\b",
    },
];

static SKILL_RES: OnceLock<Vec<(SkillType, Regex)>> = OnceLock::new();

fn skill_patterns() -> &'static [(SkillType, Regex)] {
    SKILL_RES.get_or_init(|| {
        SKILL_PATTERNS
            .iter()
            .map(|p| (p.skill, Regex::new(p.pattern).unwrap()))
            .collect()
    })
}

/// Keyword heuristic with a fallback for unmatched questions
#[derive(Debug, Clone, Copy)]
pub struct KeywordClassifier {
    fallback: SkillType,
}

impl KeywordClassifier {
    pub fn new(fallback: SkillType) -> Self {
        Self { fallback }
    }
}

impl Default for KeywordClassifier {
    fn default() -> Self {
        Self::new(SkillType::General)
    }
}

impl SkillClassifier for KeywordClassifier {
    fn classify(&self, question: &str) -> SkillType {
        skill_patterns()
            .iter()
            .find(|(_, re)| re.is_match(question))
            .map(|(skill, _)| *skill)
            .unwrap_or(self.fallback)
    }
}

/// Tags every question with the same skill
#[derive(Debug, Clone, Copy)]
pub struct FixedClassifier(pub SkillType);

impl SkillClassifier for FixedClassifier {
    fn classify(&self, _question: &str) -> SkillType {
        self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_keyword_classification() {
        let c = KeywordClassifier::default();
        assert_eq!(
            c.classify("What is the passage primarily about?"),
            SkillType::MainIdea
        );
        assert_eq!(
            c.classify("Which city is mentioned in the talk?"),
            SkillType::Detail
        );
        assert_eq!(
            c.classify("What can you infer about the speaker?"),
            SkillType::Inference
        );
        assert_eq!(
            c.classify("The word 'vivid' in line 3 means"),
            SkillType::Vocabulary
        );
        assert_eq!(c.classify("Why did she leave?"), SkillType::General);
    }

    #[test]
    fn test_fallback_is_configurable() {
        let c = KeywordClassifier::new(SkillType::Inference);
        assert_eq!(c.classify("Why did she leave?"), SkillType::Inference);
        assert_eq!(FixedClassifier(SkillType::Detail).classify("anything"), SkillType::Detail);
    }
}
