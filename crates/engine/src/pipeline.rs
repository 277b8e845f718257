//! Ordered validation pipeline.
//!
//! Validators run in registration order under one of two strategies:
//!
//! - [`validate_all`](ValidationPipeline::validate_all): every validator
//!   runs regardless of earlier failures; failing messages aggregate in
//!   registration order (blank and duplicate messages filtered). Used for
//!   live feedback while the user types.
//! - [`validate_first_failure`](ValidationPipeline::validate_first_failure):
//!   stops at the first failure; later validators are never invoked, so
//!   their side effects never happen.
//!
//! Either way, cancellation yields [`PipelineVerdict::Cancelled`] -
//! distinct from both success and failure - and a validator *fault* (an
//! `Err` that is not cancellation) propagates to the caller untouched.

use async_trait::async_trait;
use gridstate_core::{Error, Result};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::trace;

/// Result of one validator call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationOutcome {
    /// Whether the value passed this validator.
    pub valid: bool,
    /// Messages for the user; meaningful when `valid` is false.
    pub messages: Vec<String>,
}

impl ValidationOutcome {
    /// A passing outcome.
    pub fn pass() -> Self {
        ValidationOutcome {
            valid: true,
            messages: Vec::new(),
        }
    }

    /// A failing outcome with one message.
    pub fn fail(message: impl Into<String>) -> Self {
        ValidationOutcome {
            valid: false,
            messages: vec![message.into()],
        }
    }

    /// A failing outcome with several messages.
    pub fn fail_all(messages: Vec<String>) -> Self {
        ValidationOutcome {
            valid: false,
            messages,
        }
    }
}

/// Aggregated verdict of a pipeline run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PipelineVerdict {
    /// Every consulted validator passed.
    Passed,
    /// At least one validator failed; messages in registration order.
    Failed(Vec<String>),
    /// The run was cancelled; neither success nor failure.
    Cancelled,
}

impl PipelineVerdict {
    /// Whether the run passed.
    pub fn is_passed(&self) -> bool {
        matches!(self, PipelineVerdict::Passed)
    }

    /// Whether the run was cancelled.
    pub fn is_cancelled(&self) -> bool {
        matches!(self, PipelineVerdict::Cancelled)
    }

    /// The failure messages, empty unless `Failed`.
    pub fn messages(&self) -> &[String] {
        match self {
            PipelineVerdict::Failed(messages) => messages,
            _ => &[],
        }
    }
}

/// A single validation rule.
///
/// Implementations may suspend (lookups, debounced remote checks) and must
/// treat `token` as a request to stop early; returning
/// `Err(Error::Cancelled)` is folded into the cancelled verdict rather
/// than treated as a fault.
#[async_trait]
pub trait Validator<V>: Send + Sync {
    /// Validate `value`.
    async fn validate(
        &self,
        value: &V,
        token: &CancellationToken,
    ) -> Result<ValidationOutcome>;
}

/// Adapter turning a plain closure into a [`Validator`].
pub struct FnValidator<F> {
    check: F,
}

impl<F> FnValidator<F> {
    /// Wrap `check` as a validator.
    pub fn new(check: F) -> Self {
        FnValidator { check }
    }
}

#[async_trait]
impl<V, F> Validator<V> for FnValidator<F>
where
    V: Sync,
    F: Fn(&V) -> ValidationOutcome + Send + Sync,
{
    async fn validate(
        &self,
        value: &V,
        _token: &CancellationToken,
    ) -> Result<ValidationOutcome> {
        Ok((self.check)(value))
    }
}

/// Ordered list of validators with two execution strategies.
pub struct ValidationPipeline<V> {
    validators: Vec<Arc<dyn Validator<V>>>,
}

impl<V: Sync> ValidationPipeline<V> {
    /// An empty pipeline; everything passes.
    pub fn new() -> Self {
        ValidationPipeline {
            validators: Vec::new(),
        }
    }

    /// Append a validator. Registration order is execution order.
    pub fn push(&mut self, validator: impl Validator<V> + 'static) {
        self.validators.push(Arc::new(validator));
    }

    /// Append an already-shared validator.
    pub fn push_arc(&mut self, validator: Arc<dyn Validator<V>>) {
        self.validators.push(validator);
    }

    /// Number of registered validators.
    pub fn len(&self) -> usize {
        self.validators.len()
    }

    /// Whether no validators are registered.
    pub fn is_empty(&self) -> bool {
        self.validators.is_empty()
    }

    /// Run every validator and aggregate all failing messages in
    /// registration order, blanks and duplicates filtered.
    pub async fn validate_all(
        &self,
        value: &V,
        token: &CancellationToken,
    ) -> Result<PipelineVerdict> {
        let mut messages: Vec<String> = Vec::new();
        let mut failed = false;

        for validator in &self.validators {
            if token.is_cancelled() {
                return Ok(PipelineVerdict::Cancelled);
            }
            let outcome = match validator.validate(value, token).await {
                Ok(outcome) => outcome,
                Err(e) if e.is_cancellation() => return Ok(PipelineVerdict::Cancelled),
                Err(e) => return Err(e),
            };
            if !outcome.valid {
                failed = true;
                collect_messages(&mut messages, outcome.messages);
            }
        }

        if failed {
            trace!(count = messages.len(), "validation failed");
            Ok(PipelineVerdict::Failed(messages))
        } else {
            Ok(PipelineVerdict::Passed)
        }
    }

    /// Run validators in registration order, stopping at the first
    /// failure. Validators after the failing one are never invoked.
    pub async fn validate_first_failure(
        &self,
        value: &V,
        token: &CancellationToken,
    ) -> Result<PipelineVerdict> {
        for validator in &self.validators {
            if token.is_cancelled() {
                return Ok(PipelineVerdict::Cancelled);
            }
            let outcome = match validator.validate(value, token).await {
                Ok(outcome) => outcome,
                Err(e) if e.is_cancellation() => return Ok(PipelineVerdict::Cancelled),
                Err(e) => return Err(e),
            };
            if !outcome.valid {
                let mut messages = Vec::new();
                collect_messages(&mut messages, outcome.messages);
                return Ok(PipelineVerdict::Failed(messages));
            }
        }
        Ok(PipelineVerdict::Passed)
    }
}

impl<V: Sync> Default for ValidationPipeline<V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<V> std::fmt::Debug for ValidationPipeline<V> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ValidationPipeline")
            .field("validators", &self.validators.len())
            .finish()
    }
}

fn collect_messages(into: &mut Vec<String>, messages: Vec<String>) {
    for message in messages {
        let trimmed = message.trim();
        if trimmed.is_empty() {
            continue;
        }
        if into.iter().any(|seen| seen.as_str() == trimmed) {
            continue;
        }
        into.push(trimmed.to_string());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct CountingValidator {
        calls: Arc<AtomicUsize>,
        outcome: ValidationOutcome,
    }

    #[async_trait]
    impl Validator<String> for CountingValidator {
        async fn validate(
            &self,
            _value: &String,
            _token: &CancellationToken,
        ) -> Result<ValidationOutcome> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(self.outcome.clone())
        }
    }

    struct FaultingValidator;

    #[async_trait]
    impl Validator<String> for FaultingValidator {
        async fn validate(
            &self,
            _value: &String,
            _token: &CancellationToken,
        ) -> Result<ValidationOutcome> {
            Err(Error::Validator("backing store unreachable".to_string()))
        }
    }

    fn counting(
        calls: &Arc<AtomicUsize>,
        outcome: ValidationOutcome,
    ) -> CountingValidator {
        CountingValidator {
            calls: Arc::clone(calls),
            outcome,
        }
    }

    #[tokio::test]
    async fn test_empty_pipeline_passes() {
        let pipeline: ValidationPipeline<String> = ValidationPipeline::new();
        let verdict = pipeline
            .validate_all(&"x".to_string(), &CancellationToken::new())
            .await
            .unwrap();
        assert_eq!(verdict, PipelineVerdict::Passed);
    }

    #[tokio::test]
    async fn test_validate_all_aggregates_in_registration_order() {
        let mut pipeline = ValidationPipeline::new();
        pipeline.push(FnValidator::new(|_: &String| ValidationOutcome::fail("A")));
        pipeline.push(FnValidator::new(|_: &String| {
            ValidationOutcome::fail_all(vec![])
        }));
        pipeline.push(FnValidator::new(|_: &String| ValidationOutcome::fail("B")));

        let verdict = pipeline
            .validate_all(&"x".to_string(), &CancellationToken::new())
            .await
            .unwrap();
        assert_eq!(
            verdict,
            PipelineVerdict::Failed(vec!["A".to_string(), "B".to_string()])
        );
    }

    #[tokio::test]
    async fn test_validate_all_filters_blank_and_duplicate_messages() {
        let mut pipeline = ValidationPipeline::new();
        pipeline.push(FnValidator::new(|_: &String| {
            ValidationOutcome::fail_all(vec!["  ".to_string(), "required".to_string()])
        }));
        pipeline.push(FnValidator::new(|_: &String| {
            ValidationOutcome::fail("required")
        }));

        let verdict = pipeline
            .validate_all(&"x".to_string(), &CancellationToken::new())
            .await
            .unwrap();
        assert_eq!(verdict, PipelineVerdict::Failed(vec!["required".to_string()]));
    }

    #[tokio::test]
    async fn test_first_failure_skips_later_validators() {
        let calls = Arc::new(AtomicUsize::new(0));
        let mut pipeline = ValidationPipeline::new();
        pipeline.push(counting(&calls, ValidationOutcome::pass()));
        pipeline.push(counting(&calls, ValidationOutcome::fail("X")));
        let third = Arc::new(AtomicUsize::new(0));
        pipeline.push(counting(&third, ValidationOutcome::fail("Y")));

        let verdict = pipeline
            .validate_first_failure(&"x".to_string(), &CancellationToken::new())
            .await
            .unwrap();

        assert_eq!(verdict, PipelineVerdict::Failed(vec!["X".to_string()]));
        assert_eq!(calls.load(Ordering::SeqCst), 2);
        // Never invoked: no side effects from skipped validators.
        assert_eq!(third.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_cancellation_is_distinct_from_failure() {
        let mut pipeline = ValidationPipeline::new();
        pipeline.push(FnValidator::new(|_: &String| ValidationOutcome::fail("A")));

        let token = CancellationToken::new();
        token.cancel();
        let verdict = pipeline
            .validate_all(&"x".to_string(), &token)
            .await
            .unwrap();
        assert!(verdict.is_cancelled());
        assert!(!verdict.is_passed());
        assert!(verdict.messages().is_empty());
    }

    #[tokio::test]
    async fn test_validator_cancellation_error_folds_into_verdict() {
        struct CancellingValidator;

        #[async_trait]
        impl Validator<String> for CancellingValidator {
            async fn validate(
                &self,
                _value: &String,
                _token: &CancellationToken,
            ) -> Result<ValidationOutcome> {
                Err(Error::Cancelled)
            }
        }

        let mut pipeline = ValidationPipeline::new();
        pipeline.push(CancellingValidator);
        let verdict = pipeline
            .validate_all(&"x".to_string(), &CancellationToken::new())
            .await
            .unwrap();
        assert!(verdict.is_cancelled());
    }

    #[tokio::test]
    async fn test_validator_fault_propagates() {
        let calls = Arc::new(AtomicUsize::new(0));
        let mut pipeline = ValidationPipeline::new();
        pipeline.push(FaultingValidator);
        pipeline.push(counting(&calls, ValidationOutcome::pass()));

        let err = pipeline
            .validate_all(&"x".to_string(), &CancellationToken::new())
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Validator(_)));
        assert!(!err.is_cancellation());
    }
}
