//! Retry/backoff policy shared by every provider adapter (C6).
//!
//! A provider calls [`with_retry`] around its own `generate` body rather
//! than the scheduler retrying at the step level — the scheduler sees only
//! the final success or failure, with `StepResult::retries` reflecting how
//! many attempts this helper made.

use crate::provider::ProviderError;
use lacquer_context::ExecutionContext;
use lacquer_core::{ExecutionEvent, ExecutionEventKind, ProgressSink};
use rand::Rng;
use std::future::Future;
use std::time::Duration;

/// Exponential backoff with full jitter.
#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    /// Maximum number of attempts, including the first.
    pub max_attempts: u32,
    /// Base delay before the first retry.
    pub base_delay: Duration,
    /// Upper bound any single backoff delay is clamped to.
    pub max_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 4,
            base_delay: Duration::from_millis(250),
            max_delay: Duration::from_secs(8),
        }
    }
}

impl RetryPolicy {
    fn delay_for(&self, attempt: u32) -> Duration {
        let exp = self.base_delay.as_millis().saturating_mul(1u128 << attempt.min(16));
        let capped = exp.min(self.max_delay.as_millis());
        let jittered = rand::thread_rng().gen_range(0..=capped.max(1));
        Duration::from_millis(jittered as u64)
    }
}

/// Run `call` under `policy`, retrying on [`ProviderError::is_retryable`]
/// errors until `max_attempts` is exhausted. Returns the last error if
/// every attempt fails, along with the number of retries actually
/// consumed (attempts beyond the first).
///
/// Each backoff sleep is raced against `ctx`'s cancellation signal, and
/// every retry emits a `StepRetrying` event into `sink` so callers watching
/// the progress stream see why a step is taking longer than one call.
#[allow(clippy::too_many_arguments)]
pub async fn with_retry<T, F, Fut>(
    policy: RetryPolicy,
    ctx: &ExecutionContext,
    step_id: &str,
    sink: &dyn ProgressSink,
    mut call: F,
) -> (Result<T, ProviderError>, u32)
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, ProviderError>>,
{
    let mut retries = 0;
    for attempt in 0..policy.max_attempts {
        match call().await {
            Ok(value) => return (Ok(value), retries),
            Err(err) if attempt + 1 < policy.max_attempts && err.is_retryable() => {
                let delay = match &err {
                    ProviderError::RateLimited(Some(retry_after)) => *retry_after,
                    _ => policy.delay_for(attempt),
                };
                tracing::debug!(attempt, delay_ms = delay.as_millis() as u64, "retrying provider call");
                sink.emit(
                    ExecutionEvent::step(ctx.run_id().as_str(), step_id, 0, ExecutionEventKind::StepRetrying)
                        .with_attempt(attempt + 1)
                        .with_error(err.to_string()),
                );
                tokio::select! {
                    _ = tokio::time::sleep(delay) => {}
                    _ = ctx.cancelled() => return (Err(err), retries),
                }
                retries += 1;
            }
            Err(err) => return (Err(err), retries),
        }
    }
    unreachable!("loop always returns within max_attempts iterations")
}

#[cfg(test)]
mod tests {
    use super::*;
    use lacquer_core::{NullSink, Step, StepKind, Workflow, WorkflowBody};
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicU32, Ordering};

    fn test_ctx() -> ExecutionContext {
        let wf = Workflow {
            version: "1".into(),
            name: None,
            metadata: HashMap::new(),
            agents: HashMap::new(),
            workflow: WorkflowBody {
                inputs: serde_json::json!({}),
                state: HashMap::new(),
                steps: vec![Step {
                    id: "s1".into(),
                    kind: StepKind::Action { action: "update_state".into(), with: HashMap::new() },
                    condition: None,
                    skip_if: None,
                    updates: HashMap::new(),
                    timeout_ms: None,
                }],
                outputs: HashMap::new(),
            },
        };
        ExecutionContext::new(&wf, serde_json::json!({}))
    }

    #[tokio::test]
    async fn succeeds_without_retry_when_first_call_succeeds() {
        let ctx = test_ctx();
        let calls = AtomicU32::new(0);
        let (result, retries) = with_retry(RetryPolicy::default(), &ctx, "s1", &NullSink, || {
            calls.fetch_add(1, Ordering::SeqCst);
            async { Ok::<_, ProviderError>(42) }
        })
        .await;
        assert_eq!(result.unwrap(), 42);
        assert_eq!(retries, 0);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn retries_retryable_errors_until_success() {
        let ctx = test_ctx();
        let calls = AtomicU32::new(0);
        let policy = RetryPolicy {
            max_attempts: 3,
            base_delay: Duration::from_millis(1),
            max_delay: Duration::from_millis(5),
        };
        let (result, retries) = with_retry(policy, &ctx, "s1", &NullSink, || {
            let n = calls.fetch_add(1, Ordering::SeqCst);
            async move {
                if n < 2 {
                    Err(ProviderError::ServerError("502".into()))
                } else {
                    Ok(7)
                }
            }
        })
        .await;
        assert_eq!(result.unwrap(), 7);
        assert_eq!(retries, 2);
    }

    #[tokio::test]
    async fn never_retries_a_non_retryable_error() {
        let ctx = test_ctx();
        let calls = AtomicU32::new(0);
        let policy = RetryPolicy {
            max_attempts: 5,
            base_delay: Duration::from_millis(1),
            max_delay: Duration::from_millis(5),
        };
        let (result, retries) = with_retry(policy, &ctx, "s1", &NullSink, || {
            calls.fetch_add(1, Ordering::SeqCst);
            async { Err::<i32, _>(ProviderError::AuthFailed("bad key".into())) }
        })
        .await;
        assert!(result.is_err());
        assert_eq!(retries, 0);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn cancelling_during_backoff_stops_retrying_early() {
        let ctx = test_ctx();
        ctx.cancel();
        let calls = AtomicU32::new(0);
        let policy = RetryPolicy {
            max_attempts: 5,
            base_delay: Duration::from_millis(1),
            max_delay: Duration::from_millis(5),
        };
        let (result, retries) = with_retry(policy, &ctx, "s1", &NullSink, || {
            calls.fetch_add(1, Ordering::SeqCst);
            async { Err::<i32, _>(ProviderError::RateLimited(Some(Duration::from_secs(30)))) }
        })
        .await;
        assert!(result.is_err());
        assert_eq!(retries, 0);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn exhausts_max_attempts_on_persistent_retryable_error() {
        let ctx = test_ctx();
        let calls = AtomicU32::new(0);
        let policy = RetryPolicy {
            max_attempts: 3,
            base_delay: Duration::from_millis(1),
            max_delay: Duration::from_millis(5),
        };
        let (result, retries) = with_retry(policy, &ctx, "s1", &NullSink, || {
            calls.fetch_add(1, Ordering::SeqCst);
            async { Err::<i32, _>(ProviderError::ServerError("502".into())) }
        })
        .await;
        assert!(result.is_err());
        assert_eq!(retries, 2);
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }
}
