//! Per-tool circuit breaker.
//!
//! ```text
//!   CLOSED ──(failures >= threshold)──▶ OPEN ──(cooldown elapsed)──▶ HALF_OPEN
//!     ◲                                                                  │
//!     └──────────────────(probe succeeds)───────────────────────────────┘
//!                    (probe fails reopens immediately)
//! ```
//!
//! Unlike a single-threaded breaker keyed by `&mut self`, this one is
//! shared by concurrent callers of the same tool name, so per-tool state
//! lives behind a `dashmap` entry lock rather than requiring external
//! synchronization.

use std::fmt;
use std::time::Duration;

use dashmap::DashMap;
use tripforge_core::Clock;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CircuitState {
    Closed,
    Open,
    HalfOpen,
}

impl fmt::Display for CircuitState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CircuitState::Closed => write!(f, "closed"),
            CircuitState::Open => write!(f, "open"),
            CircuitState::HalfOpen => write!(f, "half_open"),
        }
    }
}

#[derive(Debug, Clone, Copy)]
struct ToolBreaker {
    state: CircuitState,
    failures: u32,
    opened_at: Option<std::time::Instant>,
}

impl ToolBreaker {
    fn new() -> Self {
        Self {
            state: CircuitState::Closed,
            failures: 0,
            opened_at: None,
        }
    }
}

/// Outcome of a breaker gate check, performed before a tool attempt.
pub enum GateOutcome {
    /// Proceed normally.
    Proceed,
    /// Proceed as a half-open probe (a single call allowed through).
    Probe,
    /// Short-circuit: remaining cooldown, in seconds (rounded up).
    Blocked { retry_after_seconds: u64 },
}

pub struct CircuitBreaker {
    tools: DashMap<String, ToolBreaker>,
    failure_threshold: u32,
    cooldown: Duration,
}

impl CircuitBreaker {
    pub fn new(failure_threshold: u32, cooldown_seconds: u64) -> Self {
        Self {
            tools: DashMap::new(),
            failure_threshold,
            cooldown: Duration::from_secs(cooldown_seconds),
        }
    }

    pub fn state(&self, name: &str) -> CircuitState {
        self.tools.get(name).map(|b| b.state).unwrap_or(CircuitState::Closed)
    }

    pub fn failures(&self, name: &str) -> u32 {
        self.tools.get(name).map(|b| b.failures).unwrap_or(0)
    }

    /// Evaluate the gate for `name`, transitioning `open` -> `half_open`
    /// in place once the cooldown has elapsed.
    pub fn gate(&self, name: &str, clock: &dyn Clock) -> GateOutcome {
        let mut entry = self.tools.entry(name.to_string()).or_insert_with(ToolBreaker::new);
        match entry.state {
            CircuitState::Closed => GateOutcome::Proceed,
            CircuitState::HalfOpen => GateOutcome::Probe,
            CircuitState::Open => {
                let opened_at = entry.opened_at.unwrap_or_else(|| clock.now());
                let elapsed = clock.now().saturating_duration_since(opened_at);
                if elapsed >= self.cooldown {
                    entry.state = CircuitState::HalfOpen;
                    GateOutcome::Probe
                } else {
                    let remaining = self.cooldown - elapsed;
                    GateOutcome::Blocked {
                        retry_after_seconds: remaining.as_secs() + u64::from(remaining.subsec_nanos() > 0),
                    }
                }
            }
        }
    }

    /// Record a successful invocation against the breaker.
    pub fn record_success(&self, name: &str) {
        let mut entry = self.tools.entry(name.to_string()).or_insert_with(ToolBreaker::new);
        match entry.state {
            CircuitState::HalfOpen | CircuitState::Open => {
                entry.state = CircuitState::Closed;
                entry.failures = 0;
                entry.opened_at = None;
            }
            CircuitState::Closed => {
                entry.failures = entry.failures.saturating_sub(1);
            }
        }
    }

    /// Record a non-success outcome that actually reached the tool.
    /// Returns `true` if this call transitioned the breaker into `open`.
    pub fn record_failure(&self, name: &str, clock: &dyn Clock) -> bool {
        let mut entry = self.tools.entry(name.to_string()).or_insert_with(ToolBreaker::new);
        match entry.state {
            CircuitState::HalfOpen => {
                entry.state = CircuitState::Open;
                entry.opened_at = Some(clock.now());
                true
            }
            CircuitState::Closed => {
                entry.failures += 1;
                if entry.failures >= self.failure_threshold {
                    entry.state = CircuitState::Open;
                    entry.opened_at = Some(clock.now());
                    true
                } else {
                    false
                }
            }
            CircuitState::Open => false,
        }
    }

    pub fn reset(&self, name: &str) {
        self.tools.remove(name);
    }
}
