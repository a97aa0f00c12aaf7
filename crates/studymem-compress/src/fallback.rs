use studymem_core::Module;
use studymem_learn::CompressedPayload;

fn focus(module: Module) -> &'static str {
    match module {
        Module::Reading => "vocabulary reinforcement and comprehension practice",
        Module::Listening => "comprehension practice",
        Module::Speaking => "pronunciation practice",
        Module::Writing => "grammar and style improvement",
        Module::Conversation => "grammar and fluency improvement",
    }
}

/// Deterministic summary used when no summarizer is configured or it fails
pub fn fallback_summary(payload: &CompressedPayload) -> String {
    let sessions = payload.total_sessions_analyzed;
    let issues = payload.chronic_count();
    format!(
        "Analyzed {} session{}; {} recurring issue{} found. Focus on {}.",
        sessions,
        if sessions == 1 { "" } else { "s" },
        issues,
        if issues == 1 { "" } else { "s" },
        focus(payload.module())
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use studymem_core::Priority;
    use studymem_learn::{ChronicPattern, ModulePatterns, SpeakingPatterns};

    #[test]
    fn test_fallback_summary_counts() {
        let pattern = |key: &str| ChronicPattern {
            key: key.to_string(),
            frequency: 3,
            avg_score: Some(60.0),
            priority: Priority::High,
            example_context: vec![],
        };
        let payload = CompressedPayload {
            patterns: ModulePatterns::Speaking(SpeakingPatterns {
                chronic_pronunciation_errors: vec![pattern("comfortable")],
                problem_phonemes: vec![pattern("th")],
                ..Default::default()
            }),
            total_sessions_analyzed: 5,
            summary: None,
            last_compressed_at: None,
        };

        assert_eq!(
            fallback_summary(&payload),
            "Analyzed 5 sessions; 2 recurring issues found. Focus on pronunciation practice."
        );
        assert_eq!(fallback_summary(&payload), fallback_summary(&payload.clone()));
    }

    #[test]
    fn test_fallback_summary_singular() {
        let mut payload = CompressedPayload::empty(Module::Writing);
        payload.total_sessions_analyzed = 1;
        assert_eq!(
            fallback_summary(&payload),
            "Analyzed 1 session; 0 recurring issues found. Focus on grammar and style improvement."
        );
    }
}
