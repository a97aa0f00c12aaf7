//! Configuration for extraction and compression

use crate::error::{MemoryError, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Uncompressed sessions per module before compression fires
pub const COMPRESSION_THRESHOLD: usize = 5;

/// Minimum number of sessions a key must recur in to count as chronic
pub const CHRONIC_MIN_FREQUENCY: usize = 2;

/// Frequency at which a chronic issue becomes high priority
pub const HIGH_PRIORITY_FREQUENCY: usize = 3;

/// Maximum chronic entries kept per list
pub const MAX_CHRONIC_PATTERNS: usize = 10;

const DEFAULT_MAX_EXAMPLE_CONTEXT: usize = 3;
const DEFAULT_SUMMARIZER_TIMEOUT_SECS: u64 = 20;
const DEFAULT_SUMMARIZER_ATTEMPTS: u32 = 2;
const DEFAULT_SUMMARIZER_MODEL: &str = "claude-3-haiku-20240307";

/// Engine configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Sessions since last compression that trigger the next one
    pub compression_threshold: usize,

    /// Cap on each ranked chronic list
    pub max_chronic_patterns: usize,

    /// Cap on example contexts kept per chronic entry
    pub max_example_context: usize,

    /// Per-attempt timeout for the summarizer
    pub summarizer_timeout_secs: u64,

    /// Summarizer attempts before falling back
    pub summarizer_max_attempts: u32,

    /// Model name passed to the HTTP summarizer
    pub summarizer_model: String,
}

impl Config {
    pub fn new() -> Self {
        Self {
            compression_threshold: COMPRESSION_THRESHOLD,
            max_chronic_patterns: MAX_CHRONIC_PATTERNS,
            max_example_context: DEFAULT_MAX_EXAMPLE_CONTEXT,
            summarizer_timeout_secs: DEFAULT_SUMMARIZER_TIMEOUT_SECS,
            summarizer_max_attempts: DEFAULT_SUMMARIZER_ATTEMPTS,
            summarizer_model: DEFAULT_SUMMARIZER_MODEL.to_string(),
        }
    }

    /// Load from a JSON file. Missing file yields defaults.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::new());
        }
        let content = std::fs::read_to_string(path)?;
        let config: Config = serde_json::from_str(&content)
            .map_err(|e| MemoryError::Config(format!("{}: {}", path.display(), e)))?;
        Ok(config.normalized())
    }

    /// Load, falling back to defaults on any error
    pub fn load_or_default(path: &Path) -> Self {
        Self::load(path).unwrap_or_default()
    }

    fn normalized(mut self) -> Self {
        self.compression_threshold = self.compression_threshold.max(1);
        self.summarizer_max_attempts = self.summarizer_max_attempts.max(1);
        self
    }

    /// Compression trigger: counter has reached the threshold
    pub fn should_compress(&self, sessions_since_compression: usize) -> bool {
        sessions_since_compression >= self.compression_threshold
    }

    /// Sessions still needed before the next compression fires
    pub fn sessions_needed(&self, sessions_since_compression: usize) -> usize {
        self.compression_threshold
            .saturating_sub(sessions_since_compression)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_defaults() {
        let config = Config::new();
        assert_eq!(config.compression_threshold, 5);
        assert_eq!(config.max_chronic_patterns, 10);
        assert_eq!(config.summarizer_max_attempts, 2);
    }

    #[test]
    fn test_threshold_exactness() {
        let config = Config::new();
        assert!(!config.should_compress(4));
        assert!(config.should_compress(5));
        assert!(config.should_compress(7));
        assert_eq!(config.sessions_needed(0), 5);
        assert_eq!(config.sessions_needed(4), 1);
        assert_eq!(config.sessions_needed(8), 0);
    }

    #[test]
    fn test_partial_config_file() {
        let dir = std::env::temp_dir().join("studymem_config_partial");
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("studymem.json");
        std::fs::write(&path, r#"{"compression_threshold": 3, "summarizer_max_attempts": 0}"#)
            .unwrap();

        let config = Config::load(&path).unwrap();
        assert_eq!(config.compression_threshold, 3);
        assert_eq!(config.summarizer_max_attempts, 1);
        assert_eq!(config.max_chronic_patterns, 10);

        std::fs::remove_file(&path).ok();
    }

    #[test]
    fn test_malformed_config_falls_back() {
        let dir = std::env::temp_dir().join("studymem_config_malformed");
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("studymem.json");
        std::fs::write(&path, "{not json").unwrap();

        assert!(Config::load(&path).is_err());
        assert_eq!(Config::load_or_default(&path).compression_threshold, 5);

        std::fs::remove_file(&path).ok();
    }
}
