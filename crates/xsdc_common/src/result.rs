//! Common result and error types for the XSDC compiler.

/// The standard result type for fallible internal operations.
///
/// `Ok` contains the result value, which may be partial or degraded after
/// error recovery. `Err` indicates an unrecoverable internal error (a bug
/// in XSDC), not a user-facing problem: user errors are reported through
/// the diagnostic sink and the operation still returns `Ok`.
pub type XsdcResult<T> = Result<T, InternalError>;

/// An internal compiler error indicating a bug in XSDC, not bad user input.
#[derive(Debug, thiserror::Error)]
#[error("internal compiler error: {message}")]
pub struct InternalError {
    /// Description of the internal error.
    pub message: String,
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
        Self { message }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_format() {
        let err = InternalError::new("container out of sync");
        assert_eq!(
            format!("{err}"),
            "internal compiler error: container out of sync"
        );
    }
}
