//! Path resolution for the data directory

use std::path::{Path, PathBuf};

/// Environment variable overriding the data directory
pub const HOME_ENV: &str = "STUDYMEM_HOME";

/// Resolves standard paths under the studymem data directory
#[derive(Debug, Clone)]
pub struct Paths {
    pub data_dir: PathBuf,
}

impl Paths {
    /// Resolve from `STUDYMEM_HOME`, else the platform data dir
    pub fn new() -> std::io::Result<Self> {
        if let Some(home) = std::env::var_os(HOME_ENV).filter(|v| !v.is_empty()) {
            return Ok(Self::with_data_dir(PathBuf::from(home)));
        }

        let base = dirs::data_dir().ok_or_else(|| {
            std::io::Error::new(std::io::ErrorKind::NotFound, "data directory not found")
        })?;
        Ok(Self::with_data_dir(base.join("studymem")))
    }

    pub fn with_data_dir(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            data_dir: data_dir.into(),
        }
    }

    /// SQLite database holding insights and memory boards
    pub fn db_path(&self) -> PathBuf {
        self.data_dir.join("memory.db")
    }

    pub fn config_path(&self) -> PathBuf {
        self.data_dir.join("studymem.json")
    }

    /// Archive of ingested sessions, replayed as extraction history
    pub fn sessions_path(&self) -> PathBuf {
        self.data_dir.join("sessions.jsonl")
    }

    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    #[test]
    #[serial]
    fn test_env_override() {
        std::env::set_var(HOME_ENV, "/tmp/studymem-test-home");
        let paths = Paths::new().unwrap();
        std::env::remove_var(HOME_ENV);

        assert_eq!(paths.data_dir, PathBuf::from("/tmp/studymem-test-home"));
        assert!(paths.db_path().ends_with("memory.db"));
        assert!(paths.config_path().ends_with("studymem.json"));
    }

    #[test]
    #[serial]
    fn test_default_location() {
        std::env::remove_var(HOME_ENV);
        if let Ok(paths) = Paths::new() {
            assert!(paths.data_dir.ends_with("studymem"));
        }
    }

    #[test]
    fn test_explicit_dir() {
        let paths = Paths::with_data_dir("/srv/memory");
        assert_eq!(paths.sessions_path(), PathBuf::from("/srv/memory/sessions.jsonl"));
    }
}
