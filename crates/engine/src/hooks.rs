//! Notification contract between the engine and the host.
//!
//! Each phase of the edit lifecycle fires a plain callback with a
//! structured argument bundle. Only the before-edit hook participates in
//! control flow: it returns a [`Decision`] instead of mutating a flag, so
//! there is no ambiguity about who saw what under interleaved invocations.
//! Every other hook is informational; the engine never reads anything back
//! from it.
//!
//! Unset hooks cost one branch.

use crate::session::SaveOutcome;
use gridstate_core::CellState;
use std::sync::Arc;

/// Verdict of the before-edit hook.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    /// Enter edit mode.
    Proceed,
    /// Do not enter edit mode; no state is touched.
    Veto,
}

/// Argument bundle for the before-edit hook.
#[derive(Debug)]
pub struct BeforeEdit<'a, I, V> {
    /// The item whose cell is about to enter edit mode.
    pub item: &'a Arc<I>,
    /// The cell's current value.
    pub current: &'a V,
}

/// Argument bundle for the draft-mutation hook.
#[derive(Debug)]
pub struct ValueChanged<'a, I, V> {
    /// The item being edited.
    pub item: &'a Arc<I>,
    /// The draft before this mutation.
    pub previous: &'a V,
    /// The draft after this mutation.
    pub current: &'a V,
}

/// Argument bundle for the state-change hook.
#[derive(Debug)]
pub struct StateChanged<'a, I> {
    /// The item whose cell changed state.
    pub item: &'a Arc<I>,
    /// State before.
    pub from: CellState,
    /// State after.
    pub to: CellState,
}

/// Argument bundle for the save-result hook.
#[derive(Debug)]
pub struct SaveReport<'a, I, V> {
    /// The item that was saved.
    pub item: &'a Arc<I>,
    /// The value handed to the save sink.
    pub value: &'a V,
    /// How the save ended.
    pub outcome: &'a SaveOutcome,
}

/// Argument bundle for the cancel hook.
#[derive(Debug)]
pub struct EditCancelled<'a, I, V> {
    /// The item whose edit was cancelled.
    pub item: &'a Arc<I>,
    /// The committed value the cell returns to.
    pub kept: &'a V,
    /// The draft that was discarded.
    pub discarded: &'a V,
}

type BeforeEditFn<I, V> = dyn Fn(BeforeEdit<'_, I, V>) -> Decision + Send + Sync;
type ValueChangedFn<I, V> = dyn Fn(ValueChanged<'_, I, V>) + Send + Sync;
type StateChangedFn<I> = dyn Fn(StateChanged<'_, I>) + Send + Sync;
type SaveReportFn<I, V> = dyn Fn(SaveReport<'_, I, V>) + Send + Sync;
type CancelledFn<I, V> = dyn Fn(EditCancelled<'_, I, V>) + Send + Sync;

/// The host's hook registrations. All optional.
pub struct EditHooks<I, V> {
    before_edit: Option<Box<BeforeEditFn<I, V>>>,
    value_changed: Option<Box<ValueChangedFn<I, V>>>,
    state_changed: Option<Box<StateChangedFn<I>>>,
    save_result: Option<Box<SaveReportFn<I, V>>>,
    cancelled: Option<Box<CancelledFn<I, V>>>,
}

impl<I, V> EditHooks<I, V> {
    /// No hooks registered.
    pub fn new() -> Self {
        EditHooks {
            before_edit: None,
            value_changed: None,
            state_changed: None,
            save_result: None,
            cancelled: None,
        }
    }

    /// Register the cancellable before-edit hook.
    pub fn on_before_edit(
        mut self,
        hook: impl Fn(BeforeEdit<'_, I, V>) -> Decision + Send + Sync + 'static,
    ) -> Self {
        self.before_edit = Some(Box::new(hook));
        self
    }

    /// Register the informational draft-mutation hook.
    pub fn on_value_changed(
        mut self,
        hook: impl Fn(ValueChanged<'_, I, V>) + Send + Sync + 'static,
    ) -> Self {
        self.value_changed = Some(Box::new(hook));
        self
    }

    /// Register the state-change hook.
    pub fn on_state_changed(
        mut self,
        hook: impl Fn(StateChanged<'_, I>) + Send + Sync + 'static,
    ) -> Self {
        self.state_changed = Some(Box::new(hook));
        self
    }

    /// Register the save-result hook.
    pub fn on_save_result(
        mut self,
        hook: impl Fn(SaveReport<'_, I, V>) + Send + Sync + 'static,
    ) -> Self {
        self.save_result = Some(Box::new(hook));
        self
    }

    /// Register the cancel hook.
    pub fn on_cancelled(
        mut self,
        hook: impl Fn(EditCancelled<'_, I, V>) + Send + Sync + 'static,
    ) -> Self {
        self.cancelled = Some(Box::new(hook));
        self
    }

    /// Ask the before-edit hook for its decision; `Proceed` when unset.
    pub fn decide_before_edit(&self, item: &Arc<I>, current: &V) -> Decision {
        match &self.before_edit {
            Some(hook) => hook(BeforeEdit { item, current }),
            None => Decision::Proceed,
        }
    }

    /// Fire the draft-mutation hook.
    pub fn emit_value_changed(&self, item: &Arc<I>, previous: &V, current: &V) {
        if let Some(hook) = &self.value_changed {
            hook(ValueChanged {
                item,
                previous,
                current,
            });
        }
    }

    /// Fire the state-change hook.
    pub fn emit_state_changed(&self, item: &Arc<I>, from: CellState, to: CellState) {
        if let Some(hook) = &self.state_changed {
            hook(StateChanged { item, from, to });
        }
    }

    /// Fire the save-result hook.
    pub fn emit_save_result(&self, item: &Arc<I>, value: &V, outcome: &SaveOutcome) {
        if let Some(hook) = &self.save_result {
            hook(SaveReport {
                item,
                value,
                outcome,
            });
        }
    }

    /// Fire the cancel hook.
    pub fn emit_cancelled(&self, item: &Arc<I>, kept: &V, discarded: &V) {
        if let Some(hook) = &self.cancelled {
            hook(EditCancelled {
                item,
                kept,
                discarded,
            });
        }
    }
}

impl<I, V> Default for EditHooks<I, V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<I, V> std::fmt::Debug for EditHooks<I, V> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EditHooks")
            .field("before_edit", &self.before_edit.is_some())
            .field("value_changed", &self.value_changed.is_some())
            .field("state_changed", &self.state_changed.is_some())
            .field("save_result", &self.save_result.is_some())
            .field("cancelled", &self.cancelled.is_some())
            .finish()
    }
}
