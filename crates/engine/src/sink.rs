//! The injected persistence boundary.
//!
//! The engine knows nothing about where committed values go; it invokes a
//! single asynchronous [`SaveSink`] with the item, the draft, and a
//! cancellation token. Rejection is a *disposition*, not an error: a sink
//! returns `Err` only for genuine faults, which the session propagates to
//! the caller.

use async_trait::async_trait;
use gridstate_core::Result;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

/// How a save attempt ended, as reported by the sink.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SaveDisposition {
    /// The value was persisted.
    Persisted,
    /// The persistence layer rejected the value (user-facing message).
    Rejected(String),
}

/// Asynchronous persistence function for committed cell values.
#[async_trait]
pub trait SaveSink<I, V>: Send + Sync {
    /// Persist `value` for `item`.
    async fn save(
        &self,
        item: &Arc<I>,
        value: &V,
        token: &CancellationToken,
    ) -> Result<SaveDisposition>;
}

/// An item that can accept a committed value written directly into it.
///
/// Items need interior mutability for this; the engine only ever holds
/// shared references.
pub trait ValueTarget<V> {
    /// Store `value` on the item.
    fn write_value(&self, value: &V);
}

/// Default sink when no persistence layer is injected: writes the value
/// directly into the item and declares unconditional success.
#[derive(Debug, Clone, Copy, Default)]
pub struct DirectWrite;

#[async_trait]
impl<I, V> SaveSink<I, V> for DirectWrite
where
    I: ValueTarget<V> + Send + Sync,
    V: Send + Sync,
{
    async fn save(
        &self,
        item: &Arc<I>,
        value: &V,
        _token: &CancellationToken,
    ) -> Result<SaveDisposition> {
        item.write_value(value);
        Ok(SaveDisposition::Persisted)
    }
}

/// Sink that accepts everything without touching the item, for hosts that
/// render purely from snapshots.
#[derive(Debug, Clone, Copy, Default)]
pub struct AcceptAll;

#[async_trait]
impl<I, V> SaveSink<I, V> for AcceptAll
where
    I: Send + Sync,
    V: Send + Sync,
{
    async fn save(
        &self,
        _item: &Arc<I>,
        _value: &V,
        _token: &CancellationToken,
    ) -> Result<SaveDisposition> {
        Ok(SaveDisposition::Persisted)
    }
}

/// Adapter turning a plain closure into a [`SaveSink`].
pub struct FnSink<F> {
    save: F,
}

impl<F> FnSink<F> {
    /// Wrap `save` as a sink.
    pub fn new(save: F) -> Self {
        FnSink { save }
    }
}

#[async_trait]
impl<I, V, F> SaveSink<I, V> for FnSink<F>
where
    I: Send + Sync,
    V: Send + Sync,
    F: Fn(&Arc<I>, &V) -> Result<SaveDisposition> + Send + Sync,
{
    async fn save(
        &self,
        item: &Arc<I>,
        value: &V,
        _token: &CancellationToken,
    ) -> Result<SaveDisposition> {
        (self.save)(item, value)
    }
}
