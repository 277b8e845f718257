//! Shared fixtures for the integration suite.

#![allow(dead_code)]

use async_trait::async_trait;
use gridstate::prelude::*;
use parking_lot::{Mutex, RwLock};
use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

/// A displayed row. Identity is the `Arc` allocation, never the fields;
/// two rows with the same name are still two rows.
pub struct Row {
    pub name: String,
    pub email: RwLock<String>,
}

impl Row {
    pub fn new(name: &str, email: &str) -> Arc<Row> {
        Arc::new(Row {
            name: name.to_string(),
            email: RwLock::new(email.to_string()),
        })
    }

    pub fn email(&self) -> String {
        self.email.read().clone()
    }
}

impl ValueTarget<String> for Row {
    fn write_value(&self, value: &String) {
        *self.email.write() = value.clone();
    }
}

/// Validator failing on empty input, counting its invocations.
pub fn required(
    calls: &Arc<AtomicUsize>,
) -> FnValidator<impl Fn(&String) -> ValidationOutcome + Send + Sync + 'static> {
    let calls = Arc::clone(calls);
    FnValidator::new(move |value: &String| {
        calls.fetch_add(1, Ordering::SeqCst);
        if value.trim().is_empty() {
            ValidationOutcome::fail("required")
        } else {
            ValidationOutcome::pass()
        }
    })
}

/// Sink replaying a script of dispositions, recording every call.
pub struct ScriptedSink {
    script: Mutex<VecDeque<SaveDisposition>>,
    pub calls: AtomicUsize,
}

impl ScriptedSink {
    pub fn new(script: Vec<SaveDisposition>) -> Arc<Self> {
        Arc::new(ScriptedSink {
            script: Mutex::new(script.into()),
            calls: AtomicUsize::new(0),
        })
    }

    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl SaveSink<Row, String> for Arc<ScriptedSink> {
    async fn save(
        &self,
        _item: &Arc<Row>,
        _value: &String,
        _token: &CancellationToken,
    ) -> Result<SaveDisposition> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let next = self.script.lock().pop_front();
        Ok(next.unwrap_or(SaveDisposition::Persisted))
    }
}

/// Sink that suspends long enough for a test to cancel it.
pub struct SlowSink {
    pub delay: Duration,
}

#[async_trait]
impl SaveSink<Row, String> for SlowSink {
    async fn save(
        &self,
        _item: &Arc<Row>,
        _value: &String,
        _token: &CancellationToken,
    ) -> Result<SaveDisposition> {
        tokio::time::sleep(self.delay).await;
        Ok(SaveDisposition::Persisted)
    }
}

/// Hook set appending every state change to a shared log.
pub fn state_logging_hooks(log: &Arc<Mutex<Vec<(CellState, CellState)>>>) -> EditHooks<Row, String> {
    let log = Arc::clone(log);
    EditHooks::new().on_state_changed(move |args| {
        log.lock().push((args.from, args.to));
    })
}

pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "warn".into()),
        )
        .with_test_writer()
        .try_init();
}
