//! Error types for the host-facing edges of the crate
//!
//! The simulation itself has no failure modes; only configuration loading and
//! snapshot output can fail.

use thiserror::Error;

/// Errors surfaced by configuration loading and frame export
#[derive(Debug, Error)]
pub enum LanderError {
    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),

    #[error("config parse error: {0}")]
    Config(#[from] serde_json::Error),

    #[error("invalid config value for `{field}`: {reason}")]
    InvalidConfig { field: &'static str, reason: String },
}

pub type Result<T> = std::result::Result<T, LanderError>;
