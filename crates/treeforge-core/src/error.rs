//! Error types for TreeForge

use thiserror::Error;

/// Main error type for TreeForge
#[derive(Error, Debug)]
pub enum ForgeError {
    #[error("No project structure found in input")]
    NoStructureFound,

    #[error("Invalid project structure: {0}")]
    InvalidStructure(String),

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Failed to parse generated response for chunk {chunk}")]
    FailedToParseResponse { chunk: usize },

    #[error("Storage error at {path}: {message}")]
    Storage { path: String, message: String },

    #[error("Generation error: {0}")]
    Generation(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Configuration file not found in {0}")]
    ConfigNotFound(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON parse error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("YAML parse error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("{0}")]
    Other(String),
}

impl ForgeError {
    /// Build a storage error tagged with the offending path
    pub fn storage(path: impl AsRef<std::path::Path>, err: impl std::fmt::Display) -> Self {
        ForgeError::Storage {
            path: path.as_ref().display().to_string(),
            message: err.to_string(),
        }
    }
}

pub type Result<T> = std::result::Result<T, ForgeError>;
