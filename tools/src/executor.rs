//! The resilient tool executor: cancellation preflight, cache lookup,
//! breaker gate, a bounded retry loop with jittered backoff, breaker
//! update, cache write-back, and metrics emission, composed in that
//! order around a single `ToolCallable` invocation.

use std::sync::Arc;
use std::time::Duration;

use rand::SeedableRng;
use rand::Rng;
use rand_xoshiro::Xoshiro256PlusPlus;
use serde_json::Value;
use tokio_util::sync::CancellationToken;
use tracing::{info_span, warn, Instrument};
use tripforge_core::{Clock, MetricsFacade};

use crate::cache::{canonical_cache_key, ResultCache};
use crate::callable::ToolCallable;
use crate::circuit_breaker::{CircuitBreaker, GateOutcome};
use crate::errors::ToolError;
use crate::result::{ToolResult, ToolStatus};

/// Recoverable outcome types the attempt loop is allowed to retry.
const MAX_RETRIES: u32 = 1;
/// Backoff sleeps are chunked this small so cancellation is observed
/// promptly inside the wait.
const BACKOFF_CHUNK_MS: u64 = 10;

#[derive(Debug, Clone, Copy)]
pub struct CachePolicy {
    pub enabled: bool,
    pub ttl_seconds: u64,
}

impl CachePolicy {
    pub fn disabled() -> Self {
        Self { enabled: false, ttl_seconds: 0 }
    }

    pub fn with_ttl(ttl_seconds: u64) -> Self {
        Self { enabled: true, ttl_seconds }
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct BreakerPolicy {
    pub enabled: bool,
}

impl BreakerPolicy {
    pub fn enabled() -> Self {
        Self { enabled: true }
    }
}

pub struct ExecutorSettings {
    pub soft_timeout: Duration,
    pub hard_timeout: Duration,
    pub retry_jitter_min_ms: u64,
    pub retry_jitter_max_ms: u64,
    pub breaker_failure_threshold: u32,
    pub breaker_cooldown_seconds: u64,
    pub eval_rng_seed: u64,
}

pub struct ToolExecutor {
    settings: ExecutorSettings,
    clock: Arc<dyn Clock>,
    cache: Arc<dyn ResultCache>,
    metrics: Arc<dyn MetricsFacade>,
    breaker: CircuitBreaker,
}

impl ToolExecutor {
    pub fn new(
        settings: ExecutorSettings,
        clock: Arc<dyn Clock>,
        cache: Arc<dyn ResultCache>,
        metrics: Arc<dyn MetricsFacade>,
    ) -> Self {
        let breaker = CircuitBreaker::new(settings.breaker_failure_threshold, settings.breaker_cooldown_seconds);
        Self { settings, clock, cache, metrics, breaker }
    }

    pub fn breaker_state(&self, name: &str) -> crate::circuit_breaker::CircuitState {
        self.breaker.state(name)
    }

    /// Run one `execute()` call through the full resilience composition.
    pub async fn execute(
        &self,
        tool: &dyn ToolCallable,
        args: Value,
        cache_policy: CachePolicy,
        breaker_policy: BreakerPolicy,
        cancel: &CancellationToken,
    ) -> ToolResult {
        let name = tool.name().to_string();
        let span = info_span!("tool_execute", tool = %name);
        self.execute_inner(&name, tool, args, cache_policy, breaker_policy, cancel)
            .instrument(span)
            .await
    }

    async fn execute_inner(
        &self,
        name: &str,
        tool: &dyn ToolCallable,
        args: Value,
        cache_policy: CachePolicy,
        breaker_policy: BreakerPolicy,
        cancel: &CancellationToken,
    ) -> ToolResult {
        // 1. Cancellation preflight.
        if cancel.is_cancelled() {
            self.metrics.inc_tool_errors(name, "cancelled");
            return ToolResult::cancelled();
        }

        // 2. Cache lookup.
        let cache_key = canonical_cache_key(name, &args);
        if cache_policy.enabled {
            if let Some(mut hit) = self.cache.get(&cache_key).await {
                hit.from_cache = true;
                self.metrics.inc_tool_cache_hit(name);
                return hit;
            }
        }

        // 3. Breaker gate.
        let mut is_probe = false;
        if breaker_policy.enabled {
            match self.breaker.gate(name, self.clock.as_ref()) {
                GateOutcome::Proceed => {}
                GateOutcome::Probe => {
                    is_probe = true;
                    self.metrics.set_breaker_state(name, "half_open");
                }
                GateOutcome::Blocked { retry_after_seconds } => {
                    self.metrics.inc_breaker_open(name);
                    return ToolResult::breaker_open(retry_after_seconds);
                }
            }
        }

        // 4. Attempt loop.
        let start = self.clock.now();
        let mut retries = 0u32;
        let mut intermediate_error_recorded = false;
        let mut final_result;

        loop {
            if cancel.is_cancelled() {
                final_result = ToolResult::cancelled();
                break;
            }

            if self.clock.now().saturating_duration_since(start) >= self.settings.hard_timeout {
                let latency_ms = self.clock.now().saturating_duration_since(start).as_millis() as u64;
                final_result = ToolResult::timeout(latency_ms, retries);
                break;
            }

            let attempt_start = self.clock.now();
            let attempt = tokio::time::timeout(self.settings.soft_timeout, tool.call(args.clone())).await;
            let latency_ms = self.clock.now().saturating_duration_since(attempt_start).as_millis() as u64;

            final_result = match attempt {
                Ok(Ok(data)) => ToolResult::success(data, latency_ms, retries, false),
                Ok(Err(err)) => ToolResult::error(
                    tool_error_reason(&err),
                    err.type_name(),
                    err.to_string(),
                    latency_ms,
                    retries,
                ),
                Err(_elapsed) => ToolResult::timeout(latency_ms, retries),
            };

            if final_result.is_success() {
                break;
            }

            let recoverable = matches!(final_result.status, ToolStatus::Timeout)
                || matches!(&final_result.error, Some(e) if e.error_type.as_deref().is_some_and(is_recoverable_type));

            if !recoverable || retries >= MAX_RETRIES {
                break;
            }

            self.metrics.inc_tool_errors(name, &final_result.error.as_ref().map(|e| e.reason.clone()).unwrap_or_default());
            intermediate_error_recorded = true;

            self.sleep_with_jitter(name, retries, cancel).await;
            if cancel.is_cancelled() {
                final_result = ToolResult::cancelled();
                break;
            }
            retries += 1;
        }

        // 5. Breaker update.
        if breaker_policy.enabled {
            if final_result.is_success() {
                self.breaker.record_success(name);
                if is_probe {
                    self.metrics.set_breaker_state(name, "closed");
                }
            } else if !matches!(final_result.status, ToolStatus::Cancelled | ToolStatus::BreakerOpen) {
                let opened = self.breaker.record_failure(name, self.clock.as_ref());
                if opened {
                    self.metrics.inc_breaker_open(name);
                    self.metrics.set_breaker_state(name, "open");
                } else if is_probe {
                    self.metrics.set_breaker_state(name, "open");
                }
            }
        }

        // 6. Cache write-back.
        if final_result.is_success() && cache_policy.enabled {
            self.cache.set(&cache_key, final_result.clone(), cache_policy.ttl_seconds).await;
        }

        // 7. Metrics emission.
        let status_label = status_label(final_result.status);
        self.metrics.observe_tool_latency(name, status_label, final_result.latency_ms);
        if final_result.retries > 0 {
            self.metrics.inc_tool_retries(name, final_result.retries);
        }
        if !final_result.is_success() && !intermediate_error_recorded {
            self.metrics.inc_tool_errors(
                name,
                &final_result.error.as_ref().map(|e| e.reason.clone()).unwrap_or_default(),
            );
        }

        final_result
    }

    /// Sleep a deterministic jitter in `[min, max)` derived from
    /// `(name, attempt, eval_rng_seed)`, broken into short chunks so
    /// cancellation is observed promptly.
    async fn sleep_with_jitter(&self, name: &str, attempt: u32, cancel: &CancellationToken) {
        let span = (self.settings.retry_jitter_max_ms - self.settings.retry_jitter_min_ms).max(1);
        let seed = jitter_seed(name, attempt, self.settings.eval_rng_seed);
        let mut rng = Xoshiro256PlusPlus::seed_from_u64(seed);
        let jitter_ms = self.settings.retry_jitter_min_ms + rng.gen_range(0..span);

        let mut remaining = jitter_ms;
        while remaining > 0 {
            if cancel.is_cancelled() {
                warn!(tool = name, "backoff interrupted by cancellation");
                return;
            }
            let chunk = remaining.min(BACKOFF_CHUNK_MS);
            tokio::time::sleep(Duration::from_millis(chunk)).await;
            remaining -= chunk;
        }
    }
}

fn jitter_seed(name: &str, attempt: u32, eval_rng_seed: u64) -> u64 {
    use std::hash::{Hash, Hasher};
    let mut hasher = std::collections::hash_map::DefaultHasher::new();
    name.hash(&mut hasher);
    attempt.hash(&mut hasher);
    eval_rng_seed.hash(&mut hasher);
    hasher.finish()
}

fn is_recoverable_type(type_name: &str) -> bool {
    matches!(type_name, "ConnectionError" | "TimeoutError" | "TemporaryError")
}

fn tool_error_reason(err: &ToolError) -> &'static str {
    match err {
        ToolError::ConnectionError(_) => "connection_error",
        ToolError::TemporaryError(_) => "temporary_error",
        ToolError::TimeoutError(_) => "timeout_error",
        ToolError::ValidationError(_) => "validation_error",
        ToolError::NotFound(_) => "not_found",
    }
}

fn status_label(status: ToolStatus) -> &'static str {
    match status {
        ToolStatus::Success => "success",
        ToolStatus::Error => "error",
        ToolStatus::Timeout => "timeout",
        ToolStatus::Cancelled => "cancelled",
        ToolStatus::BreakerOpen => "breaker_open",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::InMemoryResultCache;
    use async_trait::async_trait;
    use chrono::Utc;
    use std::sync::atomic::{AtomicU32, Ordering};
    use tripforge_core::{FakeClock, InMemoryMetrics};

    struct CountingTool {
        name: String,
        calls: AtomicU32,
        fail_until: u32,
    }

    #[async_trait]
    impl ToolCallable for CountingTool {
        fn name(&self) -> &str {
            &self.name
        }

        async fn call(&self, _args: Value) -> Result<Value, ToolError> {
            let n = self.calls.fetch_add(1, Ordering::SeqCst);
            if n < self.fail_until {
                Err(ToolError::TemporaryError("not ready".to_string()))
            } else {
                Ok(serde_json::json!({ "ok": true }))
            }
        }
    }

    fn test_executor() -> ToolExecutor {
        let clock: Arc<dyn Clock> = Arc::new(FakeClock::new(Utc::now()));
        let cache: Arc<dyn ResultCache> = Arc::new(InMemoryResultCache::new(clock.clone()));
        let metrics: Arc<dyn MetricsFacade> = Arc::new(InMemoryMetrics::new());
        ToolExecutor::new(
            ExecutorSettings {
                soft_timeout: Duration::from_millis(200),
                hard_timeout: Duration::from_secs(4),
                retry_jitter_min_ms: 0,
                retry_jitter_max_ms: 1,
                breaker_failure_threshold: 3,
                breaker_cooldown_seconds: 30,
                eval_rng_seed: 42,
            },
            clock,
            cache,
            metrics,
        )
    }

    #[tokio::test]
    async fn success_on_first_attempt_is_not_retried() {
        let executor = test_executor();
        let tool = CountingTool { name: "w".into(), calls: AtomicU32::new(0), fail_until: 0 };
        let cancel = CancellationToken::new();
        let result = executor
            .execute(&tool, serde_json::json!({}), CachePolicy::disabled(), BreakerPolicy::enabled(), &cancel)
            .await;
        assert!(result.is_success());
        assert_eq!(result.retries, 0);
    }

    #[tokio::test]
    async fn transient_failure_is_retried_once() {
        let executor = test_executor();
        let tool = CountingTool { name: "w".into(), calls: AtomicU32::new(0), fail_until: 1 };
        let cancel = CancellationToken::new();
        let result = executor
            .execute(&tool, serde_json::json!({}), CachePolicy::disabled(), BreakerPolicy::enabled(), &cancel)
            .await;
        assert!(result.is_success());
        assert_eq!(result.retries, 1);
    }

    #[tokio::test]
    async fn cancelled_token_short_circuits_before_invocation() {
        let executor = test_executor();
        let tool = CountingTool { name: "w".into(), calls: AtomicU32::new(0), fail_until: 0 };
        let cancel = CancellationToken::new();
        cancel.cancel();
        let result = executor
            .execute(&tool, serde_json::json!({}), CachePolicy::disabled(), BreakerPolicy::enabled(), &cancel)
            .await;
        assert_eq!(result.status, ToolStatus::Cancelled);
        assert_eq!(tool.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn cache_hit_does_not_invoke_the_tool() {
        let executor = test_executor();
        let tool = CountingTool { name: "w".into(), calls: AtomicU32::new(0), fail_until: 0 };
        let cancel = CancellationToken::new();
        let policy = CachePolicy::with_ttl(60);
        let first = executor
            .execute(&tool, serde_json::json!({}), policy, BreakerPolicy::enabled(), &cancel)
            .await;
        assert!(first.is_success());
        let second = executor
            .execute(&tool, serde_json::json!({}), policy, BreakerPolicy::enabled(), &cancel)
            .await;
        assert!(second.from_cache);
        assert_eq!(tool.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn breaker_trips_after_threshold_consecutive_failures() {
        let executor = test_executor();
        let cancel = CancellationToken::new();
        for _ in 0..3 {
            let tool = CountingTool { name: "w".into(), calls: AtomicU32::new(0), fail_until: u32::MAX };
            let _ = executor
                .execute(&tool, serde_json::json!({}), CachePolicy::disabled(), BreakerPolicy::enabled(), &cancel)
                .await;
        }
        let tool = CountingTool { name: "w".into(), calls: AtomicU32::new(0), fail_until: 0 };
        let result = executor
            .execute(&tool, serde_json::json!({}), CachePolicy::disabled(), BreakerPolicy::enabled(), &cancel)
            .await;
        assert_eq!(result.status, ToolStatus::BreakerOpen);
        assert_eq!(tool.calls.load(Ordering::SeqCst), 0);
    }
}
