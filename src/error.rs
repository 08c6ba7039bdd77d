//! Error types for verdict.
//!
//! Evaluation itself never fails: "cannot decide" is reported through
//! [`DecisionKind::Indeterminate`](crate::DecisionKind::Indeterminate).
//! The errors here cover the few fallible build-time steps, such as
//! looking up a resolution by name or turning a JSON document into a
//! [`Context`](crate::Context).

use thiserror::Error;

/// Errors raised while building policies or their inputs.
#[derive(Debug, Error)]
pub enum PolicyError {
    /// A resolution name was looked up but never registered.
    #[error("Resolution '{name}' is not registered")]
    UnknownResolution {
        name: String,
    },

    /// A context document could not be turned into a `Context`.
    #[error("Invalid context: {reason}")]
    InvalidContext {
        reason: String,
    },

    /// A regular expression predicate failed to compile.
    #[error("Invalid attribute pattern '{pattern}': {reason}")]
    InvalidPattern {
        pattern: String,
        reason: String,
    },
}

impl PolicyError {
    /// Creates an invalid-context error.
    #[must_use]
    pub fn invalid_context(reason: impl Into<String>) -> Self {
        Self::InvalidContext {
            reason: reason.into(),
        }
    }

    /// Returns true if a registry lookup failed.
    #[must_use]
    pub const fn is_unknown_resolution(&self) -> bool {
        matches!(self, Self::UnknownResolution { .. })
    }

    /// Returns true if a context document was rejected.
    #[must_use]
    pub const fn is_invalid_context(&self) -> bool {
        matches!(self, Self::InvalidContext { .. })
    }

    /// Returns true if a regex predicate failed to compile.
    #[must_use]
    pub const fn is_invalid_pattern(&self) -> bool {
        matches!(self, Self::InvalidPattern { .. })
    }
}

/// Result type alias for fallible policy construction.
pub type PolicyResult<T> = Result<T, PolicyError>;
