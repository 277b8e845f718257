//! Per-cell edit records.
//!
//! A [`CellRecord`] is the value object behind one displayed cell: the last
//! committed value, the in-progress draft, the current [`CellState`], and
//! the user-facing error list. Records are created lazily by the registry
//! and mutated only by the single session (or caller-driven flow) owning
//! them; the host reads [`CellSnapshot`]s.
//!
//! State changes go through the transition table. The two deliberate
//! exceptions are [`CellRecord::abort_save`], an explicit rollback to the
//! state the save interrupted, and [`CellRecord::reset`], which forces the
//! record back to `Reading`.

use crate::error::{Error, Result};
use crate::state::CellState;
use parking_lot::{RwLock, RwLockReadGuard, RwLockWriteGuard};
use serde::Serialize;
use std::sync::Arc;

/// Edit state for a single (item, column) cell.
#[derive(Debug, Clone)]
pub struct CellRecord<V> {
    state: CellState,
    original: V,
    draft: V,
    errors: Vec<String>,
    retry_count: u32,
    previous_state: Option<CellState>,
    history: Vec<CellState>,
    draft_gen: u64,
    valid_gen: Option<u64>,
}

impl<V: Clone> CellRecord<V> {
    /// Create a record in `Reading` with draft and original both set to the
    /// item's current value.
    pub fn new(initial: V) -> Self {
        CellRecord {
            state: CellState::Reading,
            original: initial.clone(),
            draft: initial,
            errors: Vec::new(),
            retry_count: 0,
            previous_state: None,
            history: vec![CellState::Reading],
            draft_gen: 0,
            valid_gen: None,
        }
    }

    /// Current edit state.
    pub fn state(&self) -> CellState {
        self.state
    }

    /// Last committed value.
    pub fn original(&self) -> &V {
        &self.original
    }

    /// In-progress draft value.
    pub fn draft(&self) -> &V {
        &self.draft
    }

    /// Current user-facing messages. Non-empty only while `Editing` or
    /// `Failed`.
    pub fn errors(&self) -> &[String] {
        &self.errors
    }

    /// Save retries across the record's whole lifetime. Deliberately not
    /// cleared by [`reset`](Self::reset); cumulative across edit cycles.
    pub fn retry_count(&self) -> u32 {
        self.retry_count
    }

    /// The state before the most recent transition, if any.
    pub fn previous_state(&self) -> Option<CellState> {
        self.previous_state
    }

    /// States entered since creation or the last reset, oldest first.
    pub fn history(&self) -> &[CellState] {
        &self.history
    }

    /// Monotonic draft generation; bumped on every draft mutation. Used to
    /// pair validation rounds with the draft they observed.
    pub fn draft_gen(&self) -> u64 {
        self.draft_gen
    }

    /// Whether the current draft generation has a completed, passing
    /// validation round behind it.
    pub fn known_valid(&self) -> bool {
        self.valid_gen == Some(self.draft_gen)
    }

    /// Whether the draft differs from the committed value.
    pub fn is_modified(&self) -> bool
    where
        V: PartialEq,
    {
        self.draft != self.original
    }

    /// Guarded move to `to`. A self-transition is a valid no-op and leaves
    /// `previous_state` and the history untouched.
    pub fn transition_to(&mut self, to: CellState) -> Result<()> {
        CellState::check_transition(self.state, to)?;
        if self.state != to {
            self.previous_state = Some(self.state);
            self.state = to;
            self.history.push(to);
        }
        Ok(())
    }

    /// Enter edit mode: `Reading -> Editing`.
    pub fn begin_edit(&mut self) -> Result<()> {
        self.transition_to(CellState::Editing)
    }

    /// Replace the draft. No validation, no transition; bumps the draft
    /// generation so in-flight validation rounds become stale.
    pub fn set_draft(&mut self, value: V) {
        self.draft = value;
        self.draft_gen += 1;
    }

    /// Promote the draft to the committed value and clear messages.
    pub fn commit(&mut self) {
        self.original = self.draft.clone();
        self.errors.clear();
    }

    /// Discard the draft, restoring the committed value, and clear
    /// messages.
    pub fn cancel_edit(&mut self) {
        self.draft = self.original.clone();
        self.errors.clear();
        self.draft_gen += 1;
        self.valid_gen = None;
    }

    /// Force the record back to `Reading`, discarding the draft, messages,
    /// previous state, and history.
    ///
    /// `retry_count` survives; it is cumulative across edit cycles.
    pub fn reset(&mut self) {
        self.state = CellState::Reading;
        self.draft = self.original.clone();
        self.errors.clear();
        self.previous_state = None;
        self.history.clear();
        self.history.push(CellState::Reading);
        self.draft_gen += 1;
        self.valid_gen = None;
    }

    /// Record the result of a completed validation round for draft
    /// generation `gen`.
    ///
    /// Last-completed-wins: whatever round finishes last owns the message
    /// list, even if a newer round is still in flight. Only a round that
    /// observed the *current* generation can mark the draft known-valid.
    pub fn record_validation(&mut self, gen: u64, messages: Vec<String>) {
        let passed = messages.is_empty();
        self.errors = messages;
        if gen == self.draft_gen {
            self.valid_gen = if passed { Some(gen) } else { None };
        }
    }

    /// Start a save: `Editing -> Saving`.
    pub fn begin_save(&mut self) -> Result<()> {
        self.transition_to(CellState::Saving)
    }

    /// Finish a successful save: commit the draft and move
    /// `Saving -> Reading`.
    pub fn complete_save(&mut self) -> Result<()> {
        if self.state != CellState::Saving {
            return Err(Error::Internal(format!(
                "complete_save outside a save (state {})",
                self.state
            )));
        }
        self.commit();
        self.transition_to(CellState::Reading)
    }

    /// Roll an in-flight save back to the state it interrupted.
    ///
    /// Not a table transition: this is the explicit rollback used when the
    /// save is rejected (`reason: Some(message)` replaces the message list)
    /// or cancelled (`reason: None` leaves messages as they were). The
    /// record lands back in `Editing` (or `Failed` when the save was a
    /// retry), as if the attempt had not started.
    pub fn abort_save(&mut self, reason: Option<String>) -> Result<()> {
        if self.state != CellState::Saving {
            return Err(Error::Internal(format!(
                "abort_save outside a save (state {})",
                self.state
            )));
        }
        let resumed = self.previous_state.unwrap_or(CellState::Reading);
        self.previous_state = Some(self.state);
        self.state = resumed;
        self.history.push(resumed);
        if let Some(message) = reason {
            self.errors = vec![message];
            self.valid_gen = None;
        }
        Ok(())
    }

    /// Record a save failure as its own phase: `Saving -> Failed` with the
    /// failure as the sole message. Used by caller-driven flows; the
    /// default session rolls back to `Editing` instead.
    pub fn mark_failed(&mut self, message: String) -> Result<()> {
        self.transition_to(CellState::Failed)?;
        self.errors = vec![message];
        self.valid_gen = None;
        Ok(())
    }

    /// Retry a failed save: `Failed -> Saving`, counting the retry.
    pub fn begin_retry(&mut self) -> Result<()> {
        self.transition_to(CellState::Saving)?;
        self.retry_count += 1;
        Ok(())
    }

    /// Cheap read-only copy of the display-relevant fields.
    pub fn snapshot(&self) -> CellSnapshot<V>
    where
        V: PartialEq,
    {
        CellSnapshot {
            state: self.state,
            original: self.original.clone(),
            draft: self.draft.clone(),
            errors: self.errors.clone(),
            retry_count: self.retry_count,
            modified: self.is_modified(),
        }
    }
}

/// Read-only view of a record, handed to the host each render.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CellSnapshot<V> {
    /// Current edit state.
    pub state: CellState,
    /// Last committed value.
    pub original: V,
    /// In-progress draft value.
    pub draft: V,
    /// Current user-facing messages.
    pub errors: Vec<String>,
    /// Cumulative save retries.
    pub retry_count: u32,
    /// Whether draft differs from original.
    pub modified: bool,
}

/// Shared handle to a record.
///
/// The registry hands the same handle to every caller asking about the same
/// item; handle identity (`ptr_eq`) is record identity. Mutation belongs to
/// the single session driving the record; everyone else takes snapshots.
pub struct SharedRecord<V>(Arc<RwLock<CellRecord<V>>>);

impl<V> Clone for SharedRecord<V> {
    fn clone(&self) -> Self {
        SharedRecord(Arc::clone(&self.0))
    }
}

impl<V: Clone> SharedRecord<V> {
    /// Wrap a fresh record.
    pub fn new(record: CellRecord<V>) -> Self {
        SharedRecord(Arc::new(RwLock::new(record)))
    }

    /// Whether two handles refer to the same record instance.
    pub fn ptr_eq(&self, other: &SharedRecord<V>) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }

    /// Read access to the record.
    pub fn read(&self) -> RwLockReadGuard<'_, CellRecord<V>> {
        self.0.read()
    }

    /// Write access to the record. Reserved for the owning session or a
    /// caller-driven flow; concurrent writers are a wiring bug.
    pub fn write(&self) -> RwLockWriteGuard<'_, CellRecord<V>> {
        self.0.write()
    }

    /// Snapshot the record for rendering.
    pub fn snapshot(&self) -> CellSnapshot<V>
    where
        V: PartialEq,
    {
        self.read().snapshot()
    }
}

impl<V: Clone + std::fmt::Debug> std::fmt::Debug for SharedRecord<V> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let record = self.read();
        f.debug_struct("SharedRecord")
            .field("state", &record.state())
            .field("modified_gen", &record.draft_gen())
            .field("errors", &record.errors().len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn editing_record(value: &str) -> CellRecord<String> {
        let mut record = CellRecord::new(value.to_string());
        record.begin_edit().unwrap();
        record
    }

    #[test]
    fn test_new_record_reads_initial_value() {
        let record = CellRecord::new("A".to_string());
        assert_eq!(record.state(), CellState::Reading);
        assert_eq!(record.original(), "A");
        assert_eq!(record.draft(), "A");
        assert!(record.errors().is_empty());
        assert!(!record.is_modified());
    }

    #[test]
    fn test_set_draft_only_touches_draft() {
        let mut record = editing_record("A");
        record.set_draft("B".to_string());
        assert_eq!(record.original(), "A");
        assert_eq!(record.draft(), "B");
        assert!(record.is_modified());
        assert_eq!(record.state(), CellState::Editing);
    }

    #[test]
    fn test_cancel_edit_restores_draft_and_clears_errors() {
        let mut record = editing_record("A");
        record.set_draft("B".to_string());
        record.record_validation(record.draft_gen(), vec!["bad".to_string()]);
        record.cancel_edit();
        assert_eq!(record.draft(), "A");
        assert!(record.errors().is_empty());
        assert!(!record.is_modified());
    }

    #[test]
    fn test_commit_promotes_draft() {
        let mut record = editing_record("A");
        record.set_draft("B".to_string());
        record.commit();
        assert_eq!(record.original(), "B");
        assert!(!record.is_modified());
    }

    #[test]
    fn test_reset_preserves_retry_count() {
        let mut record = editing_record("A");
        record.set_draft("B".to_string());
        record.begin_save().unwrap();
        record.mark_failed("boom".to_string()).unwrap();
        record.begin_retry().unwrap();
        record.mark_failed("boom again".to_string()).unwrap();
        assert_eq!(record.retry_count(), 1);

        record.reset();
        assert_eq!(record.state(), CellState::Reading);
        assert_eq!(record.draft(), "A");
        assert!(record.errors().is_empty());
        assert_eq!(record.previous_state(), None);
        assert_eq!(record.history(), &[CellState::Reading]);
        // Cumulative across cycles, survives reset.
        assert_eq!(record.retry_count(), 1);
    }

    #[test]
    fn test_illegal_transition_rejected_loudly() {
        let mut record = CellRecord::new(1i64);
        let err = record.begin_save().unwrap_err();
        assert_eq!(
            err,
            Error::IllegalTransition {
                from: CellState::Reading,
                to: CellState::Saving,
            }
        );
        assert_eq!(record.state(), CellState::Reading);
    }

    #[test]
    fn test_self_transition_is_noop() {
        let mut record = editing_record("A");
        record.transition_to(CellState::Editing).unwrap();
        assert_eq!(record.previous_state(), Some(CellState::Reading));
        assert_eq!(record.history(), &[CellState::Reading, CellState::Editing]);
    }

    #[test]
    fn test_save_success_protocol() {
        let mut record = editing_record("A");
        record.set_draft("B".to_string());
        record.begin_save().unwrap();
        assert_eq!(record.state(), CellState::Saving);
        record.complete_save().unwrap();
        assert_eq!(record.state(), CellState::Reading);
        assert_eq!(record.original(), "B");
        assert!(record.errors().is_empty());
    }

    #[test]
    fn test_abort_save_rolls_back_to_editing_with_message() {
        let mut record = editing_record("A");
        record.set_draft("B".to_string());
        record.begin_save().unwrap();
        record.abort_save(Some("duplicate".to_string())).unwrap();
        assert_eq!(record.state(), CellState::Editing);
        assert_eq!(record.errors(), &["duplicate".to_string()]);
        assert_eq!(record.original(), "A");
        assert_eq!(record.draft(), "B");
    }

    #[test]
    fn test_abort_save_without_reason_keeps_messages() {
        let mut record = editing_record("A");
        record.set_draft("B".to_string());
        record.record_validation(record.draft_gen(), vec!["warn".to_string()]);
        // Messages in hand, then a save is forced and cancelled.
        record.errors.clear();
        record.begin_save().unwrap();
        record.abort_save(None).unwrap();
        assert_eq!(record.state(), CellState::Editing);
        assert!(record.errors().is_empty());
        assert_eq!(record.draft(), "B");
    }

    #[test]
    fn test_abort_save_outside_save_is_internal_error() {
        let mut record = editing_record("A");
        let err = record.abort_save(None).unwrap_err();
        assert!(matches!(err, Error::Internal(_)));
    }

    #[test]
    fn test_retry_flow_counts_retries() {
        let mut record = editing_record("A");
        record.set_draft("B".to_string());
        record.begin_save().unwrap();
        record.mark_failed("offline".to_string()).unwrap();
        assert_eq!(record.state(), CellState::Failed);
        assert_eq!(record.errors(), &["offline".to_string()]);

        record.begin_retry().unwrap();
        assert_eq!(record.state(), CellState::Saving);
        assert_eq!(record.retry_count(), 1);

        record.complete_save().unwrap();
        assert_eq!(record.state(), CellState::Reading);
        assert_eq!(record.original(), "B");
    }

    #[test]
    fn test_abort_save_during_retry_returns_to_failed() {
        let mut record = editing_record("A");
        record.set_draft("B".to_string());
        record.begin_save().unwrap();
        record.mark_failed("offline".to_string()).unwrap();
        record.begin_retry().unwrap();
        record.abort_save(None).unwrap();
        assert_eq!(record.state(), CellState::Failed);
        assert_eq!(record.errors(), &["offline".to_string()]);
    }

    #[test]
    fn test_validation_generation_pairing() {
        let mut record = editing_record("A");
        record.set_draft("B".to_string());
        let stale_gen = record.draft_gen();
        record.set_draft("C".to_string());

        // A stale round finishing last still owns the messages...
        record.record_validation(stale_gen, vec!["too short".to_string()]);
        assert_eq!(record.errors(), &["too short".to_string()]);
        // ...but cannot mark the current draft valid.
        record.record_validation(stale_gen, vec![]);
        assert!(!record.known_valid());

        record.record_validation(record.draft_gen(), vec![]);
        assert!(record.known_valid());
        record.set_draft("D".to_string());
        assert!(!record.known_valid());
    }

    #[test]
    fn test_shared_record_identity() {
        let a = SharedRecord::new(CellRecord::new(0i64));
        let b = a.clone();
        let c = SharedRecord::new(CellRecord::new(0i64));
        assert!(a.ptr_eq(&b));
        assert!(!a.ptr_eq(&c));
    }

    #[test]
    fn test_snapshot_reflects_record() {
        let shared = SharedRecord::new(CellRecord::new("A".to_string()));
        shared.write().begin_edit().unwrap();
        shared.write().set_draft("B".to_string());
        let snap = shared.snapshot();
        assert_eq!(snap.state, CellState::Editing);
        assert_eq!(snap.original, "A");
        assert_eq!(snap.draft, "B");
        assert!(snap.modified);
        assert_eq!(snap.retry_count, 0);
    }
}
