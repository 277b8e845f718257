//! The facade: a builder-assembled editor over one registry and session.

use gridstate_core::{kind, CellSnapshot, Classify, Result, SharedRecord};
use gridstate_engine::{
    AcceptAll, CancellationToken, CellRegistry, DirectWrite, EditHooks, EditSession,
    PipelineVerdict, SaveOutcome, SaveSink, SessionConfig, ValidationPipeline, Validator,
    ValueTarget,
};
use std::sync::Arc;
use std::time::Duration;

/// Entry point for hosts: per-render state lookups plus the action surface,
/// assembled by [`GridEditor::builder`].
///
/// Cheap to clone; clones share the same registry and collaborators.
pub struct GridEditor<I, V> {
    registry: Arc<CellRegistry<I, V>>,
    session: EditSession<I, V>,
}

impl<I, V> Clone for GridEditor<I, V> {
    fn clone(&self) -> Self {
        GridEditor {
            registry: Arc::clone(&self.registry),
            session: self.session.clone(),
        }
    }
}

impl<I, V> GridEditor<I, V>
where
    I: Send + Sync + 'static,
    V: Clone + PartialEq + Send + Sync + 'static,
{
    /// Start assembling an editor.
    pub fn builder() -> GridEditorBuilder<I, V> {
        GridEditorBuilder::new()
    }

    /// The underlying session, for hosts that need the driver directly
    /// (e.g. to clone it into a spawned validation task).
    pub fn session(&self) -> &EditSession<I, V> {
        &self.session
    }

    /// The underlying registry.
    pub fn registry(&self) -> &Arc<CellRegistry<I, V>> {
        &self.registry
    }

    /// Per-render lookup: the record for `item`, created in `Reading` on
    /// first sight. On a hit, `current` is ignored (first-write-wins).
    pub fn get_or_create(
        &self,
        item: &Arc<I>,
        current: V,
        token: &CancellationToken,
    ) -> Result<SharedRecord<V>> {
        self.registry.get_or_create(item, current, token)
    }

    /// Render view of `item`'s cell, if it has edit state.
    pub fn snapshot(&self, item: &Arc<I>) -> Option<CellSnapshot<V>> {
        self.registry.try_get(item).map(|record| record.snapshot())
    }

    /// Enter edit mode. `Ok(None)` means the before-edit hook vetoed.
    pub fn begin_edit(
        &self,
        item: &Arc<I>,
        current: V,
        token: &CancellationToken,
    ) -> Result<Option<SharedRecord<V>>> {
        self.session.begin_edit(item, current, token)
    }

    /// Replace the draft with an already-typed value and revalidate.
    pub async fn set_draft(
        &self,
        item: &Arc<I>,
        value: V,
        token: &CancellationToken,
    ) -> Result<PipelineVerdict> {
        self.session.set_draft(item, value, token).await
    }

    /// Run a collect-all validation round against the current draft.
    pub async fn revalidate(
        &self,
        item: &Arc<I>,
        token: &CancellationToken,
    ) -> Result<PipelineVerdict> {
        self.session.revalidate(item, token).await
    }

    /// Save the draft through the sink.
    pub async fn save(&self, item: &Arc<I>, token: &CancellationToken) -> Result<SaveOutcome> {
        self.session.save(item, token).await
    }

    /// Cancel the open edit, discarding the draft.
    pub fn cancel(&self, item: &Arc<I>) -> Result<()> {
        self.session.cancel(item)
    }

    /// Force `item`'s record back to `Reading`.
    pub fn reset(&self, item: &Arc<I>) -> Result<()> {
        self.session.reset(item)
    }

    /// Drop `item`'s record. Returns whether a live record existed.
    pub fn remove(&self, item: &Arc<I>) -> bool {
        self.registry.remove(item)
    }

    /// Prune records whose items have been dropped.
    pub fn sweep(&self) -> usize {
        self.registry.sweep()
    }

    /// Drop every record and refuse further creation. Idempotent.
    pub fn dispose(&self) {
        self.registry.dispose();
    }
}

impl<I, V> GridEditor<I, V>
where
    I: Send + Sync + 'static,
    V: Clone + PartialEq + Send + Sync + Classify + 'static,
{
    /// Parse a raw input payload as the cell's value kind and feed it to
    /// the draft.
    ///
    /// This is the key-press path: the host forwards editor text, the
    /// memoized kind profile for `V` turns it into a typed value, and the
    /// draft is mutated and revalidated. A parse failure is a loud
    /// [`Error::Parse`](gridstate_core::Error::Parse); it never touches
    /// the draft.
    pub async fn apply_input(
        &self,
        item: &Arc<I>,
        raw: &str,
        token: &CancellationToken,
    ) -> Result<PipelineVerdict> {
        let value = kind::parse_as::<V>(raw)?;
        self.session.set_draft(item, value, token).await
    }
}

impl<I, V> std::fmt::Debug for GridEditor<I, V> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GridEditor")
            .field("registry", &self.registry)
            .finish()
    }
}

/// Builder for [`GridEditor`]. Every collaborator is optional; the default
/// editor has an empty pipeline, no hooks, an accept-all sink, no debounce,
/// and the default sweep interval.
pub struct GridEditorBuilder<I, V> {
    pipeline: ValidationPipeline<V>,
    hooks: EditHooks<I, V>,
    sink: Option<Arc<dyn SaveSink<I, V>>>,
    config: SessionConfig,
    sweep_interval: Option<u64>,
}

impl<I, V> GridEditorBuilder<I, V>
where
    I: Send + Sync + 'static,
    V: Clone + PartialEq + Send + Sync + 'static,
{
    /// A builder with nothing configured.
    pub fn new() -> Self {
        GridEditorBuilder {
            pipeline: ValidationPipeline::new(),
            hooks: EditHooks::new(),
            sink: None,
            config: SessionConfig::default(),
            sweep_interval: None,
        }
    }

    /// Append a validator; registration order is execution order.
    pub fn validator(mut self, validator: impl Validator<V> + 'static) -> Self {
        self.pipeline.push(validator);
        self
    }

    /// Replace the whole validation pipeline.
    pub fn pipeline(mut self, pipeline: ValidationPipeline<V>) -> Self {
        self.pipeline = pipeline;
        self
    }

    /// Install the host's hook set.
    pub fn hooks(mut self, hooks: EditHooks<I, V>) -> Self {
        self.hooks = hooks;
        self
    }

    /// Inject the persistence layer.
    pub fn sink(mut self, sink: impl SaveSink<I, V> + 'static) -> Self {
        self.sink = Some(Arc::new(sink));
        self
    }

    /// Use the direct-write sink: committed values are written straight
    /// into the item and the save always succeeds. This is the
    /// conventional no-persistence-layer setup for items that accept
    /// writes.
    pub fn direct_write(mut self) -> Self
    where
        I: ValueTarget<V>,
    {
        self.sink = Some(Arc::new(DirectWrite));
        self
    }

    /// Debounce draft revalidation by `delay`.
    pub fn validation_debounce(mut self, delay: Duration) -> Self {
        self.config.validation_debounce = Some(delay);
        self
    }

    /// Prune dead records every `interval` mutating registry operations.
    pub fn sweep_interval(mut self, interval: u64) -> Self {
        self.sweep_interval = Some(interval);
        self
    }

    /// Assemble the editor.
    pub fn build(self) -> GridEditor<I, V> {
        let registry = Arc::new(match self.sweep_interval {
            Some(interval) => CellRegistry::with_sweep_interval(interval),
            None => CellRegistry::new(),
        });
        let sink = self.sink.unwrap_or_else(|| Arc::new(AcceptAll));
        let session = EditSession::new(
            Arc::clone(&registry),
            Arc::new(self.pipeline),
            Arc::new(self.hooks),
            sink,
            self.config,
        );
        GridEditor { registry, session }
    }
}

impl<I, V> Default for GridEditorBuilder<I, V>
where
    I: Send + Sync + 'static,
    V: Clone + PartialEq + Send + Sync + 'static,
{
    fn default() -> Self {
        Self::new()
    }
}
