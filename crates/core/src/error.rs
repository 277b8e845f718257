//! Unified error types for gridstate.
//!
//! One taxonomy for the whole engine. The split that matters:
//!
//! - Programmer errors (illegal transition, use-after-dispose, unknown item)
//!   fail loudly and should never reach end users in a correctly wired host.
//! - Cancellation is its own variant, distinguishable from every failure,
//!   and is never logged as an error.
//! - Validation failures and save rejections are **not** errors at all; they
//!   are ordinary values (`PipelineVerdict`, `SaveOutcome`) surfaced inline
//!   at the cell.

use crate::kind::ValueKind;
use crate::state::CellState;
use thiserror::Error;

/// All gridstate errors.
///
/// This is the canonical error type for all engine operations.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum Error {
    /// Attempted state transition outside the legal set.
    #[error("illegal cell transition: {from} -> {to}")]
    IllegalTransition {
        /// State the cell was in
        from: CellState,
        /// State the caller asked for
        to: CellState,
    },

    /// The operation was cancelled before or during execution.
    #[error("operation cancelled")]
    Cancelled,

    /// The registry has been disposed; no further records can be created.
    #[error("registry disposed")]
    Disposed,

    /// No edit state exists for the item (begin an edit first).
    #[error("no edit state for item; begin_edit must run first")]
    UnknownItem,

    /// Raw input did not parse as the cell's value kind.
    #[error("cannot parse {input:?} as {kind}: {reason}")]
    Parse {
        /// Kind the input was parsed against
        kind: ValueKind,
        /// The raw input
        input: String,
        /// Parser's reason
        reason: String,
    },

    /// A validator faulted (not a validation failure, an actual fault).
    #[error("validator fault: {0}")]
    Validator(String),

    /// Internal error (bug or invariant violation).
    #[error("internal error: {0}")]
    Internal(String),
}

/// Result type for gridstate operations.
pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    /// Check if this error represents cancellation.
    ///
    /// Cancellation is distinct from failure and success; callers must not
    /// report it through failure channels.
    pub fn is_cancellation(&self) -> bool {
        matches!(self, Error::Cancelled)
    }

    /// Check if this is a programmer error: a misuse the host should fix,
    /// never show to end users.
    pub fn is_programmer_error(&self) -> bool {
        matches!(
            self,
            Error::IllegalTransition { .. }
                | Error::Disposed
                | Error::UnknownItem
                | Error::Internal(_)
        )
    }

    /// Check if this is a parse error from raw cell input.
    pub fn is_parse(&self) -> bool {
        matches!(self, Error::Parse { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cancellation_is_not_programmer_error() {
        assert!(Error::Cancelled.is_cancellation());
        assert!(!Error::Cancelled.is_programmer_error());
    }

    #[test]
    fn test_illegal_transition_classification() {
        let err = Error::IllegalTransition {
            from: CellState::Reading,
            to: CellState::Saving,
        };
        assert!(err.is_programmer_error());
        assert!(!err.is_cancellation());
    }

    #[test]
    fn test_display_includes_states() {
        let err = Error::IllegalTransition {
            from: CellState::Reading,
            to: CellState::Saving,
        };
        let msg = err.to_string();
        assert!(msg.contains("Reading"));
        assert!(msg.contains("Saving"));
    }

    #[test]
    fn test_parse_error_message() {
        let err = Error::Parse {
            kind: ValueKind::Integral,
            input: "abc".to_string(),
            reason: "invalid digit".to_string(),
        };
        assert!(err.is_parse());
        assert!(err.to_string().contains("abc"));
    }
}
