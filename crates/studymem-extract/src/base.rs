//! Base extractor trait

use studymem_core::{Module, Observations};
use studymem_sessions::{SessionRecord, SessionSource};

/// Longest question or sentence snippet kept in an insight
pub const MAX_SNIPPET_CHARS: usize = 100;

/// Maps one completed session onto a module's observations.
///
/// Extraction is total: a session with missing or empty sub-records yields
/// observations with empty lists, never an error.
pub trait Extractor: Send + Sync {
    /// Module this extractor handles
    fn module(&self) -> Module;

    /// Extractor name, used in logs
    fn name(&self) -> &str {
        self.module().as_str()
    }

    /// Build observations for `record`. `source` gives access to the
    /// student's other sessions for cross-session flags.
    fn extract(&self, record: &SessionRecord, source: &dyn SessionSource) -> Observations;
}

/// Cut a string to at most `max` characters on a char boundary
pub fn truncate_chars(text: &str, max: usize) -> String {
    match text.char_indices().nth(max) {
        Some((end, _)) => text[..end].to_string(),
        None => text.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_truncate_chars() {
        assert_eq!(truncate_chars("short", 100), "short");
        assert_eq!(truncate_chars("abcdef", 3), "abc");
        // Multi-byte characters are never split
        assert_eq!(truncate_chars("ñandú", 2), "ña");
        assert_eq!(truncate_chars(&"x".repeat(250), MAX_SNIPPET_CHARS).len(), 100);
    }
}
