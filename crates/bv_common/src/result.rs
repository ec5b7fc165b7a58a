//! The internal-bug error channel, distinct from user-facing diagnostics.
//!
//! `InternalError` signals a compiler bug (a broken invariant the elaborator
//! itself should never let a well-formed AST violate), not a malformed BV
//! program. User-facing semantic failures (unknown name, type mismatch, …)
//! are reported through `bv_elaborate::errors::BvError` instead and never
//! construct an `InternalError`.

/// The result type for operations that can only fail on an internal bug.
pub type BvResult<T> = Result<T, InternalError>;

/// An internal compiler error: an invariant was violated that a correct
/// implementation should never allow.
#[derive(Debug, thiserror::Error)]
#[error("internal compiler error: {message}")]
pub struct InternalError {
    message: String,
}

impl InternalError {
    /// Creates a new internal error with the given message.
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

impl From<String> for InternalError {
    fn from(message: String) -> Self {
        Self::new(message)
    }
}
