//! Convenience re-exports for hosts.
//!
//! ```ignore
//! use gridstate::prelude::*;
//! ```

pub use crate::editor::{GridEditor, GridEditorBuilder};
pub use gridstate_core::{
    CellRecord, CellSnapshot, CellState, Choice, Classify, Error, Result, SharedRecord, ValueKind,
};
pub use gridstate_engine::{
    CancellationToken, Decision, EditHooks, FnSink, FnValidator, PipelineVerdict, SaveDisposition,
    SaveOutcome, SaveSink, SessionConfig, ValidationOutcome, ValidationPipeline, Validator,
    ValueTarget,
};
