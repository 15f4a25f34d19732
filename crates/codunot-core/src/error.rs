// SPDX-FileCopyrightText: 2026 Codunot Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Error types for Codunot.

use std::path::PathBuf;

use thiserror::Error;

/// The primary error type used across the Codunot crates.
///
/// Quota denial is deliberately absent: limit checks return `bool` and the
/// caller turns a `false` into a user-facing denial message.
#[derive(Debug, Error)]
pub enum CodunotError {
    /// Configuration errors (invalid TOML, unreadable allow-list files).
    #[error("configuration error: {0}")]
    Config(String),

    /// A mode name outside the closed set of personas.
    #[error("invalid mode `{value}`")]
    InvalidMode { value: String },

    /// Reading or writing durable state failed (missing permissions, disk
    /// full, corrupt JSON).
    #[error("persistence error for {}: {source}", path.display())]
    Persistence {
        path: PathBuf,
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// Chat platform errors (reply delivery failed, channel gone).
    #[error("channel error: {message}")]
    Channel {
        message: String,
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Generation API errors (HTTP failure, empty completion).
    #[error("provider error: {message}")]
    Provider {
        message: String,
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Operation timed out.
    #[error("operation timed out after {duration:?}")]
    Timeout { duration: std::time::Duration },

    /// Internal or unexpected errors.
    #[error("internal error: {0}")]
    Internal(String),
}

impl CodunotError {
    /// Wrap any error as a persistence failure for `path`.
    pub fn persistence(
        path: impl Into<PathBuf>,
        source: impl Into<Box<dyn std::error::Error + Send + Sync>>,
    ) -> Self {
        CodunotError::Persistence {
            path: path.into(),
            source: source.into(),
        }
    }
}
