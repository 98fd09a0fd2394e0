// SPDX-FileCopyrightText: 2026 Levo Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Error types shared by every Levo crate.

use thiserror::Error;

/// Failure reported by a remote collaborator (completion or search API).
#[derive(Debug, Error)]
#[error("{service} request failed: {message}")]
pub struct UpstreamError {
    /// Which collaborator failed (e.g. "groq", "web-search").
    pub service: String,
    /// Human-readable failure description.
    pub message: String,
    /// HTTP status returned by the collaborator, if any.
    pub status: Option<u16>,
    /// Underlying transport or decode error.
    #[source]
    pub source: Option<Box<dyn std::error::Error + Send + Sync>>,
}

impl UpstreamError {
    /// Creates an upstream error without a status code or source.
    pub fn new(service: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            service: service.into(),
            message: message.into(),
            status: None,
            source: None,
        }
    }

    /// Attaches the HTTP status code returned by the collaborator.
    pub fn with_status(mut self, status: u16) -> Self {
        self.status = Some(status);
        self
    }

    /// Attaches the underlying error.
    pub fn with_source(mut self, source: impl std::error::Error + Send + Sync + 'static) -> Self {
        self.source = Some(Box::new(source));
        self
    }
}

/// The primary error type used across Levo traits and the conversation service.
#[derive(Debug, Error)]
pub enum LevoError {
    /// Configuration errors (invalid TOML, missing API keys, bad values).
    #[error("configuration error: {0}")]
    Config(String),

    /// Caller supplied an empty or malformed prompt or user id.
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// Persistence failure (database unreachable, query failure, not initialized).
    #[error("storage error: {source}")]
    Storage {
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// A collaborator other than the completion provider failed.
    #[error(transparent)]
    Upstream(#[from] UpstreamError),

    /// The completion provider failed; the turn is aborted and nothing is persisted.
    #[error("completion failed: {0}")]
    Completion(#[source] UpstreamError),

    /// Internal or unexpected errors.
    #[error("internal error: {0}")]
    Internal(String),
}

impl LevoError {
    /// Wraps any error as a storage failure.
    pub fn storage(source: impl Into<Box<dyn std::error::Error + Send + Sync>>) -> Self {
        Self::Storage {
            source: source.into(),
        }
    }

    /// Returns true when the error was caused by the caller's input.
    pub fn is_invalid_input(&self) -> bool {
        matches!(self, Self::InvalidInput(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn upstream_error_display_names_service() {
        let err = UpstreamError::new("groq", "rate limited").with_status(429);
        assert_eq!(err.to_string(), "groq request failed: rate limited");
        assert_eq!(err.status, Some(429));
    }

    #[test]
    fn completion_error_wraps_upstream() {
        let err = LevoError::Completion(UpstreamError::new("groq", "model not found"));
        assert_eq!(
            err.to_string(),
            "completion failed: groq request failed: model not found"
        );
        let source = std::error::Error::source(&err).expect("completion keeps its source");
        assert!(source.to_string().contains("model not found"));
    }

    #[test]
    fn upstream_converts_with_question_mark() {
        fn search() -> Result<(), LevoError> {
            Err(UpstreamError::new("web-search", "timeout"))?
        }
        assert!(matches!(search(), Err(LevoError::Upstream(_))));
    }

    #[test]
    fn storage_helper_boxes_source() {
        let err = LevoError::storage("database is locked");
        assert!(err.to_string().contains("database is locked"));
        assert!(!err.is_invalid_input());
        assert!(LevoError::InvalidInput("empty".into()).is_invalid_input());
    }
}
