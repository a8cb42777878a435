use std::time::Duration;

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use tokio::time::Instant;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum CircuitState {
    Closed,
    Open,
    HalfOpen,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CircuitBreakerConfig {
    /// Consecutive failures that open the circuit.
    pub failure_threshold: u32,

    /// Time the circuit stays open before a probe is allowed.
    #[serde(with = "humantime_serde")]
    pub reset_timeout: Duration,
}

impl Default for CircuitBreakerConfig {
    fn default() -> Self {
        Self {
            failure_threshold: 5,
            reset_timeout: Duration::from_secs(60),
        }
    }
}

/// Verdict for a call that wants to pass the breaker.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Admission {
    /// Circuit closed.
    Allowed,
    /// Circuit half-open; this call is the single probe.
    Probe,
    /// Circuit open; the call must not reach the store.
    Rejected,
}

#[derive(Debug)]
struct BreakerState {
    state: CircuitState,
    failure_count: u32,
    last_failure_time: Option<Instant>,
    probe_started: Option<Instant>,
}

/// Consecutive-failure circuit breaker guarding one operation family.
///
/// All transitions happen under one mutex. A half-open breaker admits exactly
/// one probe; if that probe never reports back, another is admitted once
/// `reset_timeout` has passed since it started.
#[derive(Debug)]
pub struct CircuitBreaker {
    name: String,
    config: CircuitBreakerConfig,
    inner: Mutex<BreakerState>,
}

impl CircuitBreaker {
    #[must_use]
    pub fn new(name: impl Into<String>, config: CircuitBreakerConfig) -> Self {
        Self {
            name: name.into(),
            config,
            inner: Mutex::new(BreakerState {
                state: CircuitState::Closed,
                failure_count: 0,
                last_failure_time: None,
                probe_started: None,
            }),
        }
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub fn config(&self) -> &CircuitBreakerConfig {
        &self.config
    }

    #[must_use]
    pub fn state(&self) -> CircuitState {
        self.inner.lock().state
    }

    #[must_use]
    pub fn failure_count(&self) -> u32 {
        self.inner.lock().failure_count
    }

    fn threshold(&self) -> u32 {
        self.config.failure_threshold.max(1)
    }

    /// Decide whether a call may proceed, moving open to half-open when due.
    pub fn admit(&self) -> Admission {
        let mut inner = self.inner.lock();
        let now = Instant::now();
        match inner.state {
            CircuitState::Closed => Admission::Allowed,
            CircuitState::Open => {
                let due = inner
                    .last_failure_time
                    .is_none_or(|t| now.duration_since(t) >= self.config.reset_timeout);
                if due {
                    inner.state = CircuitState::HalfOpen;
                    inner.probe_started = Some(now);
                    tracing::info!(breaker = %self.name, "circuit half-open, admitting probe");
                    Admission::Probe
                } else {
                    Admission::Rejected
                }
            }
            CircuitState::HalfOpen => {
                let stale = inner
                    .probe_started
                    .is_none_or(|t| now.duration_since(t) >= self.config.reset_timeout);
                if stale {
                    inner.probe_started = Some(now);
                    Admission::Probe
                } else {
                    Admission::Rejected
                }
            }
        }
    }

    /// Close the circuit and reset the failure count.
    pub fn record_success(&self) {
        let mut inner = self.inner.lock();
        if inner.state != CircuitState::Closed {
            tracing::info!(breaker = %self.name, "circuit closed");
        }
        inner.state = CircuitState::Closed;
        inner.failure_count = 0;
        inner.probe_started = None;
    }

    /// Count a failure; opens at the threshold and reopens from half-open.
    pub fn record_failure(&self) {
        let mut inner = self.inner.lock();
        inner.failure_count = inner.failure_count.saturating_add(1);
        inner.last_failure_time = Some(Instant::now());
        match inner.state {
            CircuitState::HalfOpen => {
                inner.state = CircuitState::Open;
                inner.probe_started = None;
                tracing::warn!(breaker = %self.name, "probe failed, circuit reopened");
            }
            CircuitState::Closed if inner.failure_count >= self.threshold() => {
                inner.state = CircuitState::Open;
                tracing::warn!(
                    breaker = %self.name,
                    failures = inner.failure_count,
                    "circuit opened"
                );
            }
            CircuitState::Closed | CircuitState::Open => {}
        }
    }
}
