//! Error types for the drip content editor.
//!
//! This module defines the error hierarchy for all core operations,
//! including configuration loading, chain editing, wire conversion,
//! and calls to the course backend.

use std::path::PathBuf;

/// A specialized `Result` type for drip editor operations.
pub type Result<T> = std::result::Result<T, DripError>;

/// Errors that can occur while editing or persisting drip chains.
///
/// Configuration variants carry actionable suggestions for the user.
#[derive(Debug, thiserror::Error)]
pub enum DripError {
    // ========================================================================
    // Configuration Errors
    // ========================================================================
    /// Invalid JSON syntax in the configuration file.
    #[error("Invalid JSON in config file '{path}': {message}\n\nSuggestion: Validate your drip.json with a JSON linter")]
    ConfigParseError {
        /// Path to the configuration file.
        path: PathBuf,
        /// Description of the parse error.
        message: String,
    },

    /// Configuration validation failed.
    #[error("Invalid configuration: {message}\n\nSuggestion: {suggestion}")]
    ConfigValidationError {
        /// Description of the validation failure.
        message: String,
        /// Actionable suggestion for the user.
        suggestion: String,
    },

    // ========================================================================
    // Editing Errors
    // ========================================================================
    /// No chain with the given id exists in the store.
    #[error("Drip chain not found: '{chain_id}'")]
    ChainNotFound {
        /// The requested chain id.
        chain_id: String,
    },

    /// No section with the given id exists in the inventory.
    #[error("Section not found: '{section_id}'")]
    SectionNotFound {
        /// The requested section id.
        section_id: String,
    },

    // ========================================================================
    // Persistence Errors
    // ========================================================================
    /// A lesson id cannot be expressed as a backend (numeric) id.
    #[error("Lesson id '{id}' is not a valid backend id (expected an integer)")]
    InvalidLessonId {
        /// The offending lesson id.
        id: String,
    },

    /// Another save for the same course is still in flight.
    #[error("A save for course '{course_id}' is already in progress\n\nSuggestion: Wait for the current save to finish and try again")]
    SaveInProgress {
        /// The course being saved.
        course_id: String,
    },

    /// The course backend rejected or failed a request.
    #[error("Backend error ({kind}): {message}")]
    Backend {
        /// What went wrong at the transport level.
        kind: BackendErrorKind,
        /// Detailed message from the client or server.
        message: String,
    },
}

/// Categories of backend failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BackendErrorKind {
    /// The connection could not be established or was dropped.
    Network,
    /// The request did not complete within the configured timeout.
    Timeout,
    /// The server answered with a non-success status code.
    Status(u16),
    /// The response body could not be decoded.
    Decode,
}

impl std::fmt::Display for BackendErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Network => write!(f, "network"),
            Self::Timeout => write!(f, "timeout"),
            Self::Status(code) => write!(f, "status {code}"),
            Self::Decode => write!(f, "decode"),
        }
    }
}

impl DripError {
    /// Creates a new `ConfigParseError` with the given path and message.
    #[must_use]
    pub fn config_parse(path: impl Into<PathBuf>, message: impl Into<String>) -> Self {
        Self::ConfigParseError {
            path: path.into(),
            message: message.into(),
        }
    }

    /// Creates a new `ConfigValidationError` with the given message and suggestion.
    #[must_use]
    pub fn config_validation(message: impl Into<String>, suggestion: impl Into<String>) -> Self {
        Self::ConfigValidationError {
            message: message.into(),
            suggestion: suggestion.into(),
        }
    }

    /// Creates a new `ChainNotFound` error.
    #[must_use]
    pub fn chain_not_found(chain_id: impl Into<String>) -> Self {
        Self::ChainNotFound {
            chain_id: chain_id.into(),
        }
    }

    /// Creates a new `SectionNotFound` error.
    #[must_use]
    pub fn section_not_found(section_id: impl Into<String>) -> Self {
        Self::SectionNotFound {
            section_id: section_id.into(),
        }
    }

    /// Creates a new `InvalidLessonId` error.
    #[must_use]
    pub fn invalid_lesson_id(id: impl Into<String>) -> Self {
        Self::InvalidLessonId { id: id.into() }
    }

    /// Creates a new `SaveInProgress` error.
    #[must_use]
    pub fn save_in_progress(course_id: impl Into<String>) -> Self {
        Self::SaveInProgress {
            course_id: course_id.into(),
        }
    }

    /// Creates a new `Backend` error.
    #[must_use]
    pub fn backend(kind: BackendErrorKind, message: impl Into<String>) -> Self {
        Self::Backend {
            kind,
            message: message.into(),
        }
    }

    /// Returns `true` if this error is transient and the request may be retried.
    ///
    /// Network failures, timeouts, rate limiting, and 5xx responses are transient.
    #[must_use]
    pub const fn is_transient(&self) -> bool {
        matches!(
            self,
            Self::Backend {
                kind: BackendErrorKind::Network | BackendErrorKind::Timeout,
                ..
            } | Self::SaveInProgress { .. }
        ) || matches!(
            self,
            Self::Backend {
                kind: BackendErrorKind::Status(429 | 500..=599),
                ..
            }
        )
    }

    /// Returns `true` if the error refers to an entity the caller named but
    /// which does not exist.
    #[must_use]
    pub const fn is_not_found(&self) -> bool {
        matches!(
            self,
            Self::ChainNotFound { .. } | Self::SectionNotFound { .. }
        )
    }
}
