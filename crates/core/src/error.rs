//! Console-wide error model.

use thiserror::Error;

/// Result type used by the shared console primitives.
pub type ConsoleResult<T> = Result<T, ConsoleError>;

/// Error shared by the console crates.
///
/// Navigation denials are never represented here: they are ordinary render
/// directives. This type covers malformed input crossing a crate boundary.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConsoleError {
    /// A value failed validation (e.g. malformed input).
    #[error("validation failed: {0}")]
    Validation(String),

    /// An identifier was invalid (e.g. parse failure).
    #[error("invalid identifier: {0}")]
    InvalidId(String),
}

impl ConsoleError {
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    pub fn invalid_id(msg: impl Into<String>) -> Self {
        Self::InvalidId(msg.into())
    }
}
