//! Error types for spacetraveling.
//!
//! Library crates use [`SpacetravelingError`] via `thiserror`.
//! The CLI wraps this with `color-eyre` for rich diagnostics.

use std::path::PathBuf;

/// Top-level error type for all spacetraveling operations.
#[derive(Debug, thiserror::Error)]
pub enum SpacetravelingError {
    /// Configuration loading or validation error.
    #[error("config error: {message}")]
    Config { message: String },

    /// Transport or auth failure talking to the content store.
    #[error("repository error: {0}")]
    Repository(String),

    /// The content store rejected a continuation token.
    #[error("invalid cursor: {message}")]
    InvalidCursor { message: String },

    /// No document of the given type matches the identifier.
    #[error("{document_type} '{identifier}' not found")]
    NotFound {
        document_type: String,
        identifier: String,
    },

    /// Malformed response from the content store.
    #[error("parse error: {message}")]
    Parse { message: String },

    /// Filesystem I/O error.
    #[error("I/O error at {path:?}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    /// Data validation error (bad slug, zero page size, etc.).
    #[error("validation error: {message}")]
    Validation { message: String },
}

/// Convenience alias used throughout the codebase.
pub type Result<T> = std::result::Result<T, SpacetravelingError>;

impl SpacetravelingError {
    /// Create a config error from any displayable message.
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config {
            message: msg.into(),
        }
    }

    /// Create a parse error from any displayable message.
    pub fn parse(msg: impl Into<String>) -> Self {
        Self::Parse {
            message: msg.into(),
        }
    }

    /// Create a validation error from any displayable message.
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation {
            message: msg.into(),
        }
    }

    /// Create an invalid-cursor error from any displayable message.
    pub fn invalid_cursor(msg: impl Into<String>) -> Self {
        Self::InvalidCursor {
            message: msg.into(),
        }
    }

    /// Create a not-found error for a document type and identifier.
    pub fn not_found(document_type: impl Into<String>, identifier: impl Into<String>) -> Self {
        Self::NotFound {
            document_type: document_type.into(),
            identifier: identifier.into(),
        }
    }

    /// Wrap a `std::io::Error` with a path for context.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// True for transport failures and rejected cursors alike.
    pub fn is_repository_error(&self) -> bool {
        matches!(self, Self::Repository(_) | Self::InvalidCursor { .. })
    }

    /// True when the requested document does not exist.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_display_formatting() {
        let err = SpacetravelingError::config("missing endpoint");
        assert_eq!(err.to_string(), "config error: missing endpoint");

        let err = SpacetravelingError::not_found("posts", "hello-world");
        assert_eq!(err.to_string(), "posts 'hello-world' not found");
    }

    #[test]
    fn invalid_cursor_is_a_repository_error() {
        assert!(SpacetravelingError::invalid_cursor("expired").is_repository_error());
        assert!(SpacetravelingError::Repository("timeout".into()).is_repository_error());
        assert!(!SpacetravelingError::not_found("posts", "x").is_repository_error());
        assert!(SpacetravelingError::not_found("posts", "x").is_not_found());
    }
}
