//! Error types for the composition engine.
//!
//! All errors here are authoring defects surfaced synchronously at
//! composition time - not transient runtime conditions. Stream-level
//! problems (a sink that never emits, a payload of the wrong kind on a
//! channel) are pass-through by policy and reported as warnings instead.

use std::error::Error;
use std::fmt;

/// Fatal composition error.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ComposeError {
    /// A required input channel was not supplied (e.g. state scoping was
    /// requested but the sources carry no state channel).
    MissingChannel(String),

    /// An explicit scope lens failed to read the current state - the state
    /// shape does not match the lens. Indicates a defect the caller must
    /// fix, not a recoverable condition.
    ScopeMismatch(String),
}

impl fmt::Display for ComposeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MissingChannel(name) => {
                write!(f, "missing required input channel '{name}'")
            }
            Self::ScopeMismatch(detail) => {
                write!(f, "scope lens does not match the current state shape: {detail}")
            }
        }
    }
}

impl Error for ComposeError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display() {
        let err = ComposeError::MissingChannel("state".into());
        assert_eq!(err.to_string(), "missing required input channel 'state'");

        let err = ComposeError::ScopeMismatch("no value at 'a.b'".into());
        assert!(err.to_string().contains("a.b"));
    }
}
