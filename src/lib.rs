//! # Gridstate
//!
//! Embedded edit-state engine for tabular UIs.
//!
//! Gridstate owns the per-cell read/edit/save lifecycle while rendering
//! stays with the host: the host supplies the displayed items, asks the
//! engine for per-item edit state, and turns snapshots into pixels. Many
//! cells can be mid-edit at once on a single-threaded event loop that
//! interleaves user input with suspending save and validation calls.
//!
//! ## Quick Start
//!
//! ```ignore
//! use gridstate::prelude::*;
//!
//! let editor: GridEditor<Row, String> = GridEditor::builder()
//!     .validator(FnValidator::new(|v: &String| {
//!         if v.is_empty() { ValidationOutcome::fail("required") } else { ValidationOutcome::pass() }
//!     }))
//!     .direct_write()
//!     .build();
//!
//! let token = CancellationToken::new();
//!
//! // Render pass: one record per displayed item, created on first sight.
//! let record = editor.get_or_create(&row, row.email(), &token)?;
//!
//! // Action bindings.
//! editor.begin_edit(&row, row.email(), &token)?;
//! editor.apply_input(&row, "alice@example.com", &token).await?;
//! editor.save(&row, &token).await?;
//!
//! // Teardown.
//! editor.dispose();
//! ```
//!
//! ## Pieces
//!
//! - [`GridEditor`] - facade wiring the pieces together behind a builder
//! - [`CellRegistry`] - identity-keyed concurrent store of cell records
//! - [`CellRecord`] / [`CellSnapshot`] - per-cell state and its render view
//! - [`ValidationPipeline`] - ordered validators, collect-all or fail-fast
//! - [`EditHooks`] - notification contract (before-edit may veto)
//! - [`SaveSink`] - the injected asynchronous persistence boundary
//! - [`EditSession`] - the lifecycle driver underneath the facade

#![warn(missing_docs)]

mod editor;

pub mod prelude;

// Re-export main entry points
pub use editor::{GridEditor, GridEditorBuilder};

// Re-export the core vocabulary
pub use gridstate_core::{
    kind, CellRecord, CellSnapshot, CellState, Choice, Classify, Error, KindProfile, Result,
    SessionId, SharedRecord, ValueKind,
};

// Re-export the orchestration layer
pub use gridstate_engine::{
    AcceptAll, BeforeEdit, CancellationToken, CellRegistry, Decision, DirectWrite, EditCancelled,
    EditHooks, EditSession, FnSink, FnValidator, PipelineVerdict, SaveDisposition, SaveOutcome,
    SaveReport, SaveSink, SessionConfig, StateChanged, ValidationOutcome, ValidationPipeline,
    Validator, ValueChanged, ValueTarget,
};
