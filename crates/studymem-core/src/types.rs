//! Core types shared by extraction, aggregation and storage

use crate::config::{CHRONIC_MIN_FREQUENCY, HIGH_PRIORITY_FREQUENCY};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Learning module a session belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Module {
    Reading,
    Listening,
    Speaking,
    Writing,
    Conversation,
}

impl Module {
    pub const ALL: [Module; 5] = [
        Module::Reading,
        Module::Listening,
        Module::Speaking,
        Module::Writing,
        Module::Conversation,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Module::Reading => "reading",
            Module::Listening => "listening",
            Module::Speaking => "speaking",
            Module::Writing => "writing",
            Module::Conversation => "conversation",
        }
    }
}

impl fmt::Display for Module {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Module {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "reading" => Ok(Module::Reading),
            "listening" => Ok(Module::Listening),
            "speaking" => Ok(Module::Speaking),
            "writing" => Ok(Module::Writing),
            "conversation" => Ok(Module::Conversation),
            other => Err(format!("unknown module: {}", other)),
        }
    }
}

/// Priority tier of a chronic issue
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    /// Recurs in exactly two sessions
    Medium,
    /// Recurs in three or more sessions
    High,
}

impl Priority {
    /// Map a cross-session frequency to a tier. Single occurrences are noise.
    pub fn from_frequency(frequency: usize) -> Option<Self> {
        if frequency >= HIGH_PRIORITY_FREQUENCY {
            Some(Priority::High)
        } else if frequency >= CHRONIC_MIN_FREQUENCY {
            Some(Priority::Medium)
        } else {
            None
        }
    }
}

/// Coarse comprehension skill of a question
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SkillType {
    MainIdea,
    Detail,
    Inference,
    Vocabulary,
    General,
}

impl SkillType {
    pub fn as_str(&self) -> &'static str {
        match self {
            SkillType::MainIdea => "main_idea",
            SkillType::Detail => "detail",
            SkillType::Inference => "inference",
            SkillType::Vocabulary => "vocabulary",
            SkillType::General => "general",
        }
    }
}

impl fmt::Display for SkillType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Engagement with reading aids during a session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Engagement {
    #[default]
    Low,
    Medium,
    High,
}

impl Engagement {
    pub fn from_vocabulary_clicks(clicks: u32) -> Self {
        if clicks < 3 {
            Engagement::Low
        } else if clicks < 10 {
            Engagement::Medium
        } else {
            Engagement::High
        }
    }
}

/// Difficulty suggestion handed to content generators
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DifficultyHint {
    #[default]
    Intermediate,
    Advanced,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_priority_from_frequency() {
        assert_eq!(Priority::from_frequency(0), None);
        assert_eq!(Priority::from_frequency(1), None);
        assert_eq!(Priority::from_frequency(2), Some(Priority::Medium));
        assert_eq!(Priority::from_frequency(3), Some(Priority::High));
        assert_eq!(Priority::from_frequency(9), Some(Priority::High));
    }

    #[test]
    fn test_module_parse_and_display() {
        for module in Module::ALL {
            let parsed: Module = module.to_string().parse().unwrap();
            assert_eq!(parsed, module);
        }
        assert_eq!(" Speaking ".parse::<Module>(), Ok(Module::Speaking));
        assert!("math".parse::<Module>().is_err());
    }

    #[test]
    fn test_engagement_thresholds() {
        assert_eq!(Engagement::from_vocabulary_clicks(0), Engagement::Low);
        assert_eq!(Engagement::from_vocabulary_clicks(3), Engagement::Medium);
        assert_eq!(Engagement::from_vocabulary_clicks(9), Engagement::Medium);
        assert_eq!(Engagement::from_vocabulary_clicks(10), Engagement::High);
    }

    #[test]
    fn test_serde_names() {
        assert_eq!(serde_json::to_string(&Priority::High).unwrap(), "\"high\"");
        assert_eq!(
            serde_json::to_string(&SkillType::MainIdea).unwrap(),
            "\"main_idea\""
        );
        assert_eq!(
            serde_json::to_string(&Module::Conversation).unwrap(),
            "\"conversation\""
        );
    }
}
