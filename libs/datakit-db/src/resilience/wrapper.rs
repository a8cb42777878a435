use std::future::Future;
use std::sync::Arc;

use futures::future::join_all;
use tokio::time::{Instant, sleep, timeout};
use tracing::Instrument;

use super::{
    Admission, CircuitBreaker, CircuitState, Classification, ErrorKind, OperationFailure,
    OperationOutcome, RetryPolicy, classify,
};
use crate::store::StoreError;

fn elapsed_ms(started: Instant) -> u64 {
    u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX)
}

fn duration_to_u64_ms(d: std::time::Duration) -> u64 {
    u64::try_from(d.as_millis()).unwrap_or(u64::MAX)
}

/// Resilience envelope around store operations.
///
/// Each logical call is: breaker admission, then up to
/// [`RetryPolicy::max_attempts`] attempts, each raced against
/// [`RetryPolicy::timeout`], with exponential backoff between retryable
/// failures. The breaker sees one success or failure per logical call, and
/// only retryable failures count against it.
///
/// Retries assume the operation is idempotent.
#[derive(Debug, Clone, Default)]
#[must_use]
pub struct OperationWrapper {
    policy: RetryPolicy,
    breaker: Option<Arc<CircuitBreaker>>,
}

impl OperationWrapper {
    pub fn new(policy: RetryPolicy) -> Self {
        Self {
            policy,
            breaker: None,
        }
    }

    pub fn with_circuit_breaker(mut self, breaker: Arc<CircuitBreaker>) -> Self {
        self.breaker = Some(breaker);
        self
    }

    #[must_use]
    pub fn policy(&self) -> &RetryPolicy {
        &self.policy
    }

    #[must_use]
    pub fn circuit_breaker(&self) -> Option<&Arc<CircuitBreaker>> {
        self.breaker.as_ref()
    }

    #[must_use]
    pub fn circuit_state(&self) -> Option<CircuitState> {
        self.breaker.as_ref().map(|b| b.state())
    }

    /// Run `op` under timeout, retry and circuit breaking.
    ///
    /// `op` is invoked once per attempt and must produce a fresh future each time.
    pub async fn execute<T, F, Fut>(&self, operation: &str, mut op: F) -> OperationOutcome<T>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, StoreError>>,
    {
        let started = Instant::now();

        let admission = self
            .breaker
            .as_ref()
            .map_or(Admission::Allowed, |b| b.admit());
        if admission == Admission::Rejected {
            tracing::warn!(op = operation, "circuit open, store call skipped");
            return OperationOutcome::Failure(OperationFailure::new(
                operation,
                ErrorKind::CircuitOpen,
                0,
                elapsed_ms(started),
                true,
            ));
        }

        let result = self.attempt_loop(operation, &mut op).await;

        if let Some(breaker) = &self.breaker {
            match &result {
                Err((_, c)) if c.retryable => breaker.record_failure(),
                _ => breaker.record_success(),
            }
        }

        match result {
            Ok((data, attempts)) => OperationOutcome::Success {
                data,
                attempts,
                duration_ms: elapsed_ms(started),
            },
            Err((attempts, c)) => OperationOutcome::Failure(OperationFailure::new(
                operation,
                c.kind,
                attempts,
                elapsed_ms(started),
                c.retryable,
            )),
        }
    }

    async fn attempt_loop<T, F, Fut>(
        &self,
        operation: &str,
        op: &mut F,
    ) -> Result<(T, u32), (u32, Classification)>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, StoreError>>,
    {
        let max_attempts = self.policy.attempts();
        let deadline = self.policy.timeout;
        let mut attempt: u32 = 0;

        loop {
            attempt += 1;

            let span = tracing::debug_span!("store_op", op = operation, attempt);
            let result = async {
                match timeout(deadline, op()).await {
                    Ok(res) => res,
                    Err(_) => Err(StoreError::timeout(format!(
                        "attempt exceeded {}ms",
                        duration_to_u64_ms(deadline)
                    ))),
                }
            }
            .instrument(span)
            .await;

            match result {
                Ok(data) => {
                    if attempt > 1 {
                        tracing::info!(op = operation, attempt, "store operation succeeded after retries");
                    }
                    return Ok((data, attempt));
                }
                Err(err) => {
                    let c = classify(&err);
                    tracing::debug!(
                        op = operation,
                        attempt,
                        code = %err.code,
                        error = %err.message,
                        "store operation failed"
                    );

                    if !c.retryable {
                        return Err((attempt, c));
                    }
                    if attempt >= max_attempts {
                        tracing::error!(
                            op = operation,
                            attempt,
                            kind = %c.kind,
                            "store operation giving up"
                        );
                        return Err((attempt, c));
                    }

                    let backoff = self.policy.backoff_for(attempt);
                    tracing::warn!(
                        op = operation,
                        attempt,
                        kind = %c.kind,
                        backoff_ms = duration_to_u64_ms(backoff),
                        "retrying store operation after backoff"
                    );
                    sleep(backoff).await;
                }
            }
        }
    }

    /// [`OperationWrapper::execute`] collapsed into a `Result`.
    ///
    /// # Errors
    /// Returns the classified [`OperationFailure`].
    pub async fn execute_result<T, F, Fut>(&self, operation: &str, op: F) -> Result<T, OperationFailure>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, StoreError>>,
    {
        self.execute(operation, op).await.into_result()
    }

    /// Run all operations concurrently; outcomes keep input order.
    pub async fn execute_parallel<T, F, Fut>(&self, operation: &str, ops: Vec<F>) -> Vec<OperationOutcome<T>>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, StoreError>>,
    {
        join_all(ops.into_iter().map(|op| self.execute(operation, op))).await
    }

    /// Run operations one after another.
    ///
    /// With `stop_on_error` the first failure ends the batch and is the last
    /// element of the returned list.
    pub async fn execute_sequential<T, F, Fut>(
        &self,
        operation: &str,
        ops: Vec<F>,
        stop_on_error: bool,
    ) -> Vec<OperationOutcome<T>>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, StoreError>>,
    {
        let mut outcomes = Vec::with_capacity(ops.len());
        for op in ops {
            let outcome = self.execute(operation, op).await;
            let failed = !outcome.is_success();
            outcomes.push(outcome);
            if failed && stop_on_error {
                break;
            }
        }
        outcomes
    }
}
