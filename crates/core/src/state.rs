//! Cell edit states and the legal-transition table.
//!
//! The table is the single authority on which phase changes are allowed.
//! Everything outside it is rejected with [`Error::IllegalTransition`] -
//! never silently coerced - so bugs like re-entering edit mode mid-save or
//! double-saving surface immediately at the call site.
//!
//! Legal moves:
//!
//! ```text
//! Reading -> Editing            enter edit mode
//! Editing -> Saving             save triggered on a valid draft
//! Editing -> Reading            cancel, discard draft
//! Saving  -> Reading            save succeeded, draft committed
//! Saving  -> Failed             save failed (caller-driven flows only)
//! Failed  -> Saving             retry the save
//! Failed  -> Reading            revert, discard draft
//! Failed  -> Editing            resume editing the draft
//! X       -> X                  no-op for every state
//! ```
//!
//! There is no terminal state; the cycle repeats for as long as the item is
//! displayed. The default session rolls a failed save back to `Editing`
//! through [`CellRecord::abort_save`](crate::record::CellRecord::abort_save)
//! rather than through this table; `Saving -> Editing` is deliberately not a
//! legal transition.

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};

/// Edit phase of a single cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CellState {
    /// Displaying the committed value; the initial state.
    Reading,
    /// A draft is open in the editor.
    Editing,
    /// The injected save function is in flight.
    Saving,
    /// A save failed and the failure is being shown as its own phase.
    ///
    /// Unreached by the default session, which surfaces failures inline in
    /// the still-open editor; reachable only via caller-driven retry flows.
    Failed,
}

impl CellState {
    /// Every state, in declaration order. Used by property tests and hosts
    /// that render a state legend.
    pub const ALL: [CellState; 4] = [
        CellState::Reading,
        CellState::Editing,
        CellState::Saving,
        CellState::Failed,
    ];

    /// Whether `from -> to` is a legal transition.
    ///
    /// Any state to itself is a valid no-op.
    pub fn can_transition(from: CellState, to: CellState) -> bool {
        use CellState::*;
        if from == to {
            return true;
        }
        matches!(
            (from, to),
            (Reading, Editing)
                | (Editing, Saving)
                | (Editing, Reading)
                | (Saving, Reading)
                | (Saving, Failed)
                | (Failed, Saving)
                | (Failed, Reading)
                | (Failed, Editing)
        )
    }

    /// The set of states legally reachable from `self`, the self no-op
    /// included.
    pub fn valid_next(self) -> &'static [CellState] {
        use CellState::*;
        match self {
            Reading => &[Reading, Editing],
            Editing => &[Editing, Saving, Reading],
            Saving => &[Saving, Reading, Failed],
            Failed => &[Failed, Saving, Reading, Editing],
        }
    }

    /// Guard a transition, failing loudly when it is illegal.
    pub fn check_transition(from: CellState, to: CellState) -> Result<()> {
        if Self::can_transition(from, to) {
            Ok(())
        } else {
            Err(Error::IllegalTransition { from, to })
        }
    }

    /// Whether this is the initial state.
    pub fn is_initial(self) -> bool {
        self == CellState::Reading
    }
}

impl std::fmt::Display for CellState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            CellState::Reading => "Reading",
            CellState::Editing => "Editing",
            CellState::Saving => "Saving",
            CellState::Failed => "Failed",
        };
        write!(f, "{}", name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use CellState::*;

    #[test]
    fn test_named_legal_pairs() {
        assert!(CellState::can_transition(Reading, Editing));
        assert!(CellState::can_transition(Editing, Saving));
        assert!(CellState::can_transition(Editing, Reading));
        assert!(CellState::can_transition(Saving, Reading));
        assert!(CellState::can_transition(Saving, Failed));
        assert!(CellState::can_transition(Failed, Saving));
        assert!(CellState::can_transition(Failed, Reading));
        assert!(CellState::can_transition(Failed, Editing));
    }

    #[test]
    fn test_named_illegal_pairs() {
        assert!(!CellState::can_transition(Reading, Saving));
        assert!(!CellState::can_transition(Reading, Failed));
        assert!(!CellState::can_transition(Editing, Failed));
        assert!(!CellState::can_transition(Saving, Editing));
    }

    #[test]
    fn test_self_transition_is_always_legal() {
        for state in CellState::ALL {
            assert!(CellState::can_transition(state, state));
        }
    }

    #[test]
    fn test_check_transition_fails_loudly() {
        let err = CellState::check_transition(Reading, Saving).unwrap_err();
        assert_eq!(
            err,
            Error::IllegalTransition {
                from: Reading,
                to: Saving
            }
        );
    }

    #[test]
    fn test_valid_next_matches_table() {
        for from in CellState::ALL {
            for to in CellState::ALL {
                let listed = from.valid_next().contains(&to);
                assert_eq!(
                    listed,
                    CellState::can_transition(from, to),
                    "valid_next and can_transition disagree on {} -> {}",
                    from,
                    to
                );
            }
        }
    }

    fn any_state() -> impl Strategy<Value = CellState> {
        prop::sample::select(CellState::ALL.to_vec())
    }

    proptest! {
        #[test]
        fn prop_check_agrees_with_table(from in any_state(), to in any_state()) {
            let checked = CellState::check_transition(from, to).is_ok();
            prop_assert_eq!(checked, CellState::can_transition(from, to));
        }

        #[test]
        fn prop_every_state_can_reach_reading_eventually(state in any_state()) {
            // Reading is reachable from every state in at most two hops;
            // the cycle never wedges.
            let direct = CellState::can_transition(state, CellState::Reading);
            let via_one_hop = state
                .valid_next()
                .iter()
                .any(|&mid| CellState::can_transition(mid, CellState::Reading));
            prop_assert!(direct || via_one_hop);
        }
    }
}
