//! Derrick - a status aggregation engine for multi-agent work orchestration.
//!
//! This library provides the core functionality for the `dk` CLI tool:
//! merging the append-only work-item log with live status sources, deriving
//! convoy work-streams from the dependency graph, and reducing terminal
//! captures into activity summaries.

pub mod activity;
pub mod aggregate;
pub mod cli;
pub mod commands;
pub mod config;
pub mod models;
pub mod parse;
pub mod sources;
pub mod tmux;

/// Library-level error type for Derrick operations.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Config error: {0}")]
    Config(String),

    #[error("Work-item log unavailable: {0}")]
    LogUnavailable(String),

    #[error("Command failed: {0}")]
    CommandFailed(String),

    #[error("Timed out after {0}ms")]
    Timeout(u64),

    #[error("Entity not found: {0}")]
    NotFound(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("{0}")]
    Other(String),
}

impl From<toml::de::Error> for Error {
    fn from(e: toml::de::Error) -> Self {
        Error::Config(e.to_string())
    }
}

/// Result type alias for Derrick operations.
pub type Result<T> = std::result::Result<T, Error>;
