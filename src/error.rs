//! Error types for depscope.
//!
//! Run-level failures (`Fetch`, `InvalidUrlFormat`, `Parse`, `Config`) abort an
//! analysis. `Syntax` is scoped to one file: the pipeline records it as a
//! [`crate::types::FileError`] and keeps going.

use thiserror::Error;

/// Every error the library can surface.
#[derive(Debug, Error)]
pub enum DepScopeError {
    /// The source tree (or one of its entries) could not be listed or read.
    #[error("failed to fetch {target}: {reason}")]
    Fetch { target: String, reason: String },

    /// The root identifier is not a recognizable path or repository URL.
    #[error("invalid URL format: {0}")]
    InvalidUrlFormat(String),

    /// Source text did not parse. Line is 1-based, column 0-based.
    #[error("syntax error at {line}:{column}: {message}")]
    Syntax {
        line: u32,
        column: u32,
        message: String,
    },

    /// The parser itself could not be set up or gave up.
    #[error("parser error: {0}")]
    Parse(String),

    #[error("configuration error: {0}")]
    Config(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),

    #[error("{0}")]
    Other(String),
}

impl DepScopeError {
    /// Shorthand for building a [`DepScopeError::Fetch`].
    pub fn fetch(target: impl Into<String>, reason: impl std::fmt::Display) -> Self {
        Self::Fetch {
            target: target.into(),
            reason: reason.to_string(),
        }
    }
}

pub type Result<T> = std::result::Result<T, DepScopeError>;
