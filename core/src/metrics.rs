//! In-process metrics façade.
//!
//! The pipeline and executor never reach for a concrete metrics backend;
//! they call through this trait, exactly mirroring the operation list a
//! production Prometheus-backed implementation would also have to
//! provide. `InMemoryMetrics` is the façade used by tests and the CLI
//! demo runner.

use std::collections::VecDeque;
use std::sync::Mutex;

use dashmap::DashMap;

/// Bounded ring buffer of recent observations, used as a cheap stand-in
/// for a histogram.
const HISTOGRAM_CAPACITY: usize = 256;

/// Every metrics operation the core invokes.
pub trait MetricsFacade: Send + Sync {
    fn observe_tool_latency(&self, name: &str, status: &str, latency_ms: u64);
    fn inc_tool_retries(&self, name: &str, count: u32);
    fn inc_tool_errors(&self, name: &str, reason: &str);
    fn inc_tool_cache_hit(&self, name: &str);
    fn inc_breaker_open(&self, name: &str);
    fn set_breaker_state(&self, name: &str, state: &str);

    fn observe_budget_delta(&self, budget_cents: i64, actual_cents: i64);
    fn inc_violation(&self, kind: &str);
    fn inc_weather_blocking(&self);
    fn inc_weather_advisory(&self);
    fn inc_feasibility_violation(&self, reason: &str);
    fn inc_pref_violation(&self, pref: &str);

    fn observe_repair_cycles(&self, n: u32);
    fn observe_repair_moves(&self, n: u32);
    fn observe_repair_reuse_ratio(&self, r: f64);
    fn inc_repair_success(&self);
    fn inc_repair_attempt(&self);

    fn observe_synthesis_latency(&self, ms: u64);
    fn observe_citation_coverage(&self, citations: usize, claims: usize);
}

/// In-process counters and bounded histograms, backed by `dashmap` so
/// concurrent runs can share one façade without an external coordinator.
#[derive(Default)]
pub struct InMemoryMetrics {
    counters: DashMap<String, u64>,
    gauges: DashMap<String, f64>,
    labels: DashMap<String, String>,
    histograms: DashMap<String, Mutex<VecDeque<f64>>>,
}

impl InMemoryMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    fn incr(&self, key: impl Into<String>, by: u64) {
        *self.counters.entry(key.into()).or_insert(0) += by;
    }

    fn observe(&self, key: impl Into<String>, value: f64) {
        let entry = self
            .histograms
            .entry(key.into())
            .or_insert_with(|| Mutex::new(VecDeque::with_capacity(HISTOGRAM_CAPACITY)));
        let mut buf = entry.lock().expect("histogram mutex poisoned");
        if buf.len() == HISTOGRAM_CAPACITY {
            buf.pop_front();
        }
        buf.push_back(value);
    }

    pub fn counter(&self, key: &str) -> u64 {
        self.counters.get(key).map(|v| *v).unwrap_or(0)
    }

    pub fn label(&self, key: &str) -> Option<String> {
        self.labels.get(key).map(|v| v.clone())
    }

    pub fn histogram_len(&self, key: &str) -> usize {
        self.histograms
            .get(key)
            .map(|h| h.lock().expect("histogram mutex poisoned").len())
            .unwrap_or(0)
    }
}

impl MetricsFacade for InMemoryMetrics {
    fn observe_tool_latency(&self, name: &str, status: &str, latency_ms: u64) {
        self.observe(format!("tool_latency:{name}:{status}"), latency_ms as f64);
    }

    fn inc_tool_retries(&self, name: &str, count: u32) {
        self.incr(format!("tool_retries:{name}"), count as u64);
    }

    fn inc_tool_errors(&self, name: &str, reason: &str) {
        self.incr(format!("tool_errors:{name}:{reason}"), 1);
    }

    fn inc_tool_cache_hit(&self, name: &str) {
        self.incr(format!("tool_cache_hit:{name}"), 1);
    }

    fn inc_breaker_open(&self, name: &str) {
        self.incr(format!("breaker_open:{name}"), 1);
    }

    fn set_breaker_state(&self, name: &str, state: &str) {
        self.labels
            .insert(format!("breaker_state:{name}"), state.to_string());
    }

    fn observe_budget_delta(&self, budget_cents: i64, actual_cents: i64) {
        self.gauges.insert(
            "budget_delta".to_string(),
            (actual_cents - budget_cents).abs() as f64,
        );
        self.observe("budget_delta", (actual_cents - budget_cents).abs() as f64);
    }

    fn inc_violation(&self, kind: &str) {
        self.incr(format!("violation:{kind}"), 1);
    }

    fn inc_weather_blocking(&self) {
        self.incr("weather_blocking", 1);
    }

    fn inc_weather_advisory(&self) {
        self.incr("weather_advisory", 1);
    }

    fn inc_feasibility_violation(&self, reason: &str) {
        self.incr(format!("feasibility_violation:{reason}"), 1);
    }

    fn inc_pref_violation(&self, pref: &str) {
        self.incr(format!("pref_violation:{pref}"), 1);
    }

    fn observe_repair_cycles(&self, n: u32) {
        self.observe("repair_cycles", n as f64);
    }

    fn observe_repair_moves(&self, n: u32) {
        self.observe("repair_moves", n as f64);
    }

    fn observe_repair_reuse_ratio(&self, r: f64) {
        self.observe("repair_reuse_ratio", r);
    }

    fn inc_repair_success(&self) {
        self.incr("repair_success", 1);
    }

    fn inc_repair_attempt(&self) {
        self.incr("repair_attempt", 1);
    }

    fn observe_synthesis_latency(&self, ms: u64) {
        self.observe("synthesis_latency_ms", ms as f64);
    }

    fn observe_citation_coverage(&self, citations: usize, claims: usize) {
        let coverage = if claims == 0 {
            1.0
        } else {
            citations as f64 / claims as f64
        };
        self.gauges.insert("citation_coverage".to_string(), coverage);
        self.observe("citation_coverage", coverage);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counters_accumulate_per_key() {
        let metrics = InMemoryMetrics::new();
        metrics.inc_tool_retries("weather", 1);
        metrics.inc_tool_retries("weather", 2);
        assert_eq!(metrics.counter("tool_retries:weather"), 3);
    }

    #[test]
    fn breaker_state_is_labeled() {
        let metrics = InMemoryMetrics::new();
        metrics.set_breaker_state("weather", "open");
        assert_eq!(metrics.label("breaker_state:weather").as_deref(), Some("open"));
    }

    #[test]
    fn citation_coverage_is_a_ratio() {
        let metrics = InMemoryMetrics::new();
        metrics.observe_citation_coverage(19, 20);
        assert_eq!(metrics.histogram_len("citation_coverage"), 1);
    }
}
