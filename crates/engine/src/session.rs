//! The edit lifecycle driver.
//!
//! An [`EditSession`] ties one registry, one validation pipeline, one hook
//! set, and one save sink into the full per-cell protocol:
//!
//! ```text
//! begin_edit:  before-edit hook (may veto) -> get_or_create -> Reading->Editing
//! set_draft:   value-changed hook -> draft mutation -> debounced collect-all
//!              revalidation (last-completed-wins)
//! save:        revalidate unless known-valid -> Editing->Saving -> sink
//!              success:   commit, Saving->Reading
//!              rejected:  roll back to Editing, message inline
//!              cancelled: roll back, nothing reported as failure
//! cancel:      draft discarded, cancel hook, -> Reading
//! ```
//!
//! A failed save deliberately lands back in `Editing`, not `Failed`: the
//! message shows inline in the still-open editor instead of forcing a
//! dismissable error phase. `Failed` stays reachable only through
//! caller-driven record flows (`begin_save`/`mark_failed`/`begin_retry` on
//! [`CellRecord`](gridstate_core::CellRecord)); this session never routes
//! there.
//!
//! Sessions are cheap to clone (a handful of `Arc`s); clone one into a
//! spawned task to run a validation round without blocking input.

use crate::hooks::{Decision, EditHooks};
use crate::pipeline::{PipelineVerdict, ValidationPipeline};
use crate::registry::CellRegistry;
use crate::sink::{SaveDisposition, SaveSink};
use gridstate_core::{CellState, Error, Result, SessionId, SharedRecord};
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{debug, trace, warn};

/// Tunables for a session.
#[derive(Debug, Clone, Default)]
pub struct SessionConfig {
    /// Wait this long after a draft mutation before revalidating; a burst
    /// of keystrokes then costs one pipeline run, not one per key.
    pub validation_debounce: Option<Duration>,
}

/// How a [`EditSession::save`] call ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SaveOutcome {
    /// Committed and back to `Reading`.
    Saved,
    /// The draft failed validation; the sink was never invoked and the
    /// cell stays in `Editing` with these messages.
    Invalid(Vec<String>),
    /// The sink rejected the value; back in `Editing` with the message as
    /// the sole error.
    Rejected(String),
    /// Cancelled mid-flight; state and messages as before the attempt.
    Cancelled,
}

impl SaveOutcome {
    /// Whether the value was persisted.
    pub fn is_saved(&self) -> bool {
        matches!(self, SaveOutcome::Saved)
    }

    /// Whether the attempt was cancelled (distinct from any failure).
    pub fn is_cancelled(&self) -> bool {
        matches!(self, SaveOutcome::Cancelled)
    }
}

/// Drives cell records through the edit lifecycle.
pub struct EditSession<I, V> {
    id: SessionId,
    registry: Arc<CellRegistry<I, V>>,
    pipeline: Arc<ValidationPipeline<V>>,
    hooks: Arc<EditHooks<I, V>>,
    sink: Arc<dyn SaveSink<I, V>>,
    config: SessionConfig,
}

impl<I, V> Clone for EditSession<I, V> {
    fn clone(&self) -> Self {
        EditSession {
            id: self.id,
            registry: Arc::clone(&self.registry),
            pipeline: Arc::clone(&self.pipeline),
            hooks: Arc::clone(&self.hooks),
            sink: Arc::clone(&self.sink),
            config: self.config.clone(),
        }
    }
}

impl<I, V> EditSession<I, V>
where
    I: Send + Sync + 'static,
    V: Clone + PartialEq + Send + Sync + 'static,
{
    /// Assemble a session over its collaborators.
    pub fn new(
        registry: Arc<CellRegistry<I, V>>,
        pipeline: Arc<ValidationPipeline<V>>,
        hooks: Arc<EditHooks<I, V>>,
        sink: Arc<dyn SaveSink<I, V>>,
        config: SessionConfig,
    ) -> Self {
        EditSession {
            id: SessionId::new(),
            registry,
            pipeline,
            hooks,
            sink,
            config,
        }
    }

    /// This session's identifier.
    pub fn id(&self) -> SessionId {
        self.id
    }

    /// The registry this session drives records in.
    pub fn registry(&self) -> &Arc<CellRegistry<I, V>> {
        &self.registry
    }

    /// Enter edit mode for `item`, whose cell currently shows `current`.
    ///
    /// Fires the before-edit hook first; on a veto nothing is touched and
    /// `Ok(None)` is returned. Otherwise the record is obtained (created on
    /// first sight) and moved `Reading -> Editing`.
    pub fn begin_edit(
        &self,
        item: &Arc<I>,
        current: V,
        token: &CancellationToken,
    ) -> Result<Option<SharedRecord<V>>> {
        if self.hooks.decide_before_edit(item, &current) == Decision::Veto {
            trace!(session = %self.id, "edit vetoed by before-edit hook");
            return Ok(None);
        }

        let record = self.registry.get_or_create(item, current, token)?;
        let from = {
            let mut guard = record.write();
            let from = guard.state();
            guard.begin_edit()?;
            from
        };
        if from != CellState::Editing {
            debug!(session = %self.id, %from, "cell entered edit mode");
            self.hooks
                .emit_state_changed(item, from, CellState::Editing);
        }
        Ok(Some(record))
    }

    /// Replace the draft and revalidate it (collect-all).
    ///
    /// The mutation and the value-changed hook happen immediately; the
    /// returned future then waits out the configured debounce and runs the
    /// pipeline. Awaiting it is optional in spirit: spawn a cloned session
    /// to keep accepting input, and let rounds race - whichever round
    /// completes last owns the record's messages, and only a round that
    /// observed the latest draft can mark it known-valid.
    pub async fn set_draft(
        &self,
        item: &Arc<I>,
        value: V,
        token: &CancellationToken,
    ) -> Result<PipelineVerdict> {
        let record = self.registry.try_get(item).ok_or(Error::UnknownItem)?;

        let (state, previous) = {
            let guard = record.read();
            (guard.state(), guard.draft().clone())
        };
        if state != CellState::Editing {
            return Err(Error::Internal(format!(
                "draft mutation outside edit mode (state {})",
                state
            )));
        }
        self.hooks.emit_value_changed(item, &previous, &value);

        let gen = {
            let mut guard = record.write();
            guard.set_draft(value);
            guard.draft_gen()
        };
        trace!(session = %self.id, gen, "draft mutated");

        if let Some(delay) = self.config.validation_debounce {
            tokio::select! {
                biased;
                _ = token.cancelled() => return Ok(PipelineVerdict::Cancelled),
                _ = tokio::time::sleep(delay) => {}
            }
        }
        self.run_validation(&record, gen, token).await
    }

    /// Run a collect-all validation round against the current draft,
    /// without debounce.
    pub async fn revalidate(
        &self,
        item: &Arc<I>,
        token: &CancellationToken,
    ) -> Result<PipelineVerdict> {
        let record = self.registry.try_get(item).ok_or(Error::UnknownItem)?;
        let (state, gen) = {
            let guard = record.read();
            (guard.state(), guard.draft_gen())
        };
        if state != CellState::Editing {
            return Err(Error::Internal(format!(
                "validation outside edit mode (state {})",
                state
            )));
        }
        self.run_validation(&record, gen, token).await
    }

    async fn run_validation(
        &self,
        record: &SharedRecord<V>,
        gen: u64,
        token: &CancellationToken,
    ) -> Result<PipelineVerdict> {
        let value = record.read().draft().clone();
        let verdict = self.pipeline.validate_all(&value, token).await?;
        match &verdict {
            PipelineVerdict::Cancelled => {
                // A cancelled round records nothing.
                trace!(session = %self.id, gen, "validation round cancelled");
            }
            PipelineVerdict::Passed => {
                record.write().record_validation(gen, Vec::new());
            }
            PipelineVerdict::Failed(messages) => {
                record.write().record_validation(gen, messages.clone());
            }
        }
        Ok(verdict)
    }

    /// Save the draft through the sink.
    ///
    /// Revalidates (collect-all) unless the current draft is already
    /// known-valid. An invalid draft never reaches the sink. On success the
    /// draft is committed and the cell returns to `Reading`; on rejection
    /// the cell rolls back to `Editing` with the rejection message inline;
    /// on cancellation everything is as before the attempt.
    pub async fn save(&self, item: &Arc<I>, token: &CancellationToken) -> Result<SaveOutcome> {
        let record = self.registry.try_get(item).ok_or(Error::UnknownItem)?;

        let (state, known_valid, value, gen) = {
            let guard = record.read();
            (
                guard.state(),
                guard.known_valid(),
                guard.draft().clone(),
                guard.draft_gen(),
            )
        };
        if state != CellState::Editing {
            return Err(Error::IllegalTransition {
                from: state,
                to: CellState::Saving,
            });
        }

        if !known_valid {
            match self.pipeline.validate_all(&value, token).await? {
                PipelineVerdict::Cancelled => return Ok(SaveOutcome::Cancelled),
                PipelineVerdict::Failed(messages) => {
                    record.write().record_validation(gen, messages.clone());
                    warn!(session = %self.id, ?messages, "save blocked by validation");
                    return Ok(SaveOutcome::Invalid(messages));
                }
                PipelineVerdict::Passed => {
                    record.write().record_validation(gen, Vec::new());
                }
            }
        }

        record.write().begin_save()?;
        self.hooks
            .emit_state_changed(item, CellState::Editing, CellState::Saving);
        debug!(session = %self.id, "save started");

        let disposition = tokio::select! {
            biased;
            _ = token.cancelled() => Err(Error::Cancelled),
            result = self.sink.save(item, &value, token) => result,
        };

        match disposition {
            Ok(SaveDisposition::Persisted) => {
                record.write().complete_save()?;
                let outcome = SaveOutcome::Saved;
                self.hooks.emit_save_result(item, &value, &outcome);
                self.hooks
                    .emit_state_changed(item, CellState::Saving, CellState::Reading);
                debug!(session = %self.id, "save committed");
                Ok(outcome)
            }
            Ok(SaveDisposition::Rejected(message)) => {
                record.write().abort_save(Some(message.clone()))?;
                let outcome = SaveOutcome::Rejected(message);
                self.hooks.emit_save_result(item, &value, &outcome);
                self.hooks
                    .emit_state_changed(item, CellState::Saving, CellState::Editing);
                warn!(session = %self.id, "save rejected");
                Ok(outcome)
            }
            Err(e) if e.is_cancellation() => {
                record.write().abort_save(None)?;
                self.hooks
                    .emit_state_changed(item, CellState::Saving, CellState::Editing);
                trace!(session = %self.id, "save cancelled");
                Ok(SaveOutcome::Cancelled)
            }
            Err(e) => {
                // A sink fault propagates, but the record must not stay
                // wedged in Saving.
                record.write().abort_save(None)?;
                self.hooks
                    .emit_state_changed(item, CellState::Saving, CellState::Editing);
                Err(e)
            }
        }
    }

    /// Cancel the open edit: restore the draft from the committed value,
    /// fire the cancel hook, and return to `Reading`.
    pub fn cancel(&self, item: &Arc<I>) -> Result<()> {
        let record = self.registry.try_get(item).ok_or(Error::UnknownItem)?;

        let (from, kept, discarded) = {
            let mut guard = record.write();
            let from = guard.state();
            if from == CellState::Saving {
                return Err(Error::Internal(
                    "cancel during an in-flight save".to_string(),
                ));
            }
            let kept = guard.original().clone();
            let discarded = guard.draft().clone();
            guard.cancel_edit();
            guard.transition_to(CellState::Reading)?;
            (from, kept, discarded)
        };

        self.hooks.emit_cancelled(item, &kept, &discarded);
        if from != CellState::Reading {
            debug!(session = %self.id, %from, "edit cancelled");
            self.hooks
                .emit_state_changed(item, from, CellState::Reading);
        }
        Ok(())
    }

    /// Force the record back to `Reading`, keeping its cumulative retry
    /// count.
    pub fn reset(&self, item: &Arc<I>) -> Result<()> {
        let record = self.registry.try_get(item).ok_or(Error::UnknownItem)?;
        let from = {
            let mut guard = record.write();
            let from = guard.state();
            guard.reset();
            from
        };
        if from != CellState::Reading {
            self.hooks
                .emit_state_changed(item, from, CellState::Reading);
        }
        Ok(())
    }
}

impl<I, V> std::fmt::Debug for EditSession<I, V> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EditSession")
            .field("id", &self.id)
            .field("config", &self.config)
            .finish()
    }
}
