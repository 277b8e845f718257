//! Orchestration layer for gridstate.
//!
//! This crate implements the moving parts around the core types:
//! - [`CellRegistry`]: identity-keyed concurrent store of cell records
//! - [`ValidationPipeline`]: ordered validators, collect-all or fail-fast
//! - [`EditHooks`]: notification contract for the host
//! - [`SaveSink`]: the injected asynchronous persistence boundary
//! - [`EditSession`]: the lifecycle driver tying them together

pub mod hooks;
pub mod pipeline;
pub mod registry;
pub mod session;
pub mod sink;

pub use hooks::{
    BeforeEdit, Decision, EditCancelled, EditHooks, SaveReport, StateChanged, ValueChanged,
};
pub use pipeline::{FnValidator, PipelineVerdict, ValidationOutcome, ValidationPipeline, Validator};
pub use registry::CellRegistry;
pub use session::{EditSession, SaveOutcome, SessionConfig};
pub use sink::{AcceptAll, DirectWrite, FnSink, SaveDisposition, SaveSink, ValueTarget};

// The cancellation carrier used at every async entry point.
pub use tokio_util::sync::CancellationToken;
