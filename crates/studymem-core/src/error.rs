//! Error taxonomy

use crate::types::Module;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum MemoryError {
    /// Extraction target does not exist or belongs to another student
    #[error("{module} session {session_id} not found")]
    SessionNotFound { module: Module, session_id: String },

    /// Extraction target has not been completed yet
    #[error("{module} session {session_id} is still in progress")]
    SessionInProgress { module: Module, session_id: String },

    #[error("Storage error: {0}")]
    Storage(#[from] anyhow::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Configuration error: {0}")]
    Config(String),
}

pub type Result<T> = std::result::Result<T, MemoryError>;
