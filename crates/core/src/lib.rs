//! Core types for the gridstate edit engine.
//!
//! This crate defines the fundamental vocabulary shared by every layer:
//! - [`CellState`]: the per-cell edit phase and its legal transitions
//! - [`CellRecord`]: the per-cell value object (original, draft, errors)
//! - [`ValueKind`]: type-kind classification with canonical parse/format
//! - [`Error`]: the unified error taxonomy
//!
//! Nothing in here performs I/O or holds locks beyond a single record's
//! `RwLock`; orchestration lives in `gridstate-engine`.

#![warn(missing_docs)]

pub mod error;
pub mod kind;
pub mod record;
pub mod state;
pub mod types;

pub use error::{Error, Result};
pub use kind::{Choice, Classify, KindProfile, ValueKind};
pub use record::{CellRecord, CellSnapshot, SharedRecord};
pub use state::CellState;
pub use types::SessionId;
