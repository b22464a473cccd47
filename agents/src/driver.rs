//! Owns the eight-stage sequence: intent validation, planning, selection,
//! tool execution, verification, repair, synthesis, and response
//! assembly. Each stage is wrapped in a tracing span, emits `running`/
//! `completed` events through the configured sink, and persists the run
//! record's status between stages.

use std::sync::Arc;

use chrono::Utc;
use tokio_util::sync::CancellationToken;
use tracing::{info_span, Instrument};
use tripforge_core::{Intent, Itinerary, RunState};
use tripforge_tools::ToolExecutor;
use uuid::Uuid;

use crate::errors::StageError;
use crate::event_sink::EventSink;
use crate::run_store::{RunRecord, RunStore, RunStatus, RunUpdate};
use crate::synthesizer::SynthesisMetrics;
use crate::tool_exec::ToolRegistry;
use crate::{planner, repair, selector, synthesizer, verifiers};

const FANOUT_CAP: usize = 4;

/// Outcome of a completed run: the assembled itinerary (if synthesis
/// reached completion) plus the final state for inspection.
pub struct DriverOutcome {
    pub itinerary: Option<Itinerary>,
    pub synthesis_metrics: Option<SynthesisMetrics>,
    pub state: RunState,
}

pub struct Driver {
    pub event_sink: Arc<dyn EventSink>,
    pub run_store: Arc<dyn RunStore>,
    pub tool_executor: ToolExecutor,
    pub tool_registry: ToolRegistry,
}

impl Driver {
    pub async fn run(&self, org_id: &str, user_id: &str, intent: Intent, seed: u64) -> Result<DriverOutcome, StageError> {
        intent.validate().map_err(StageError::Core)?;

        let mut state = RunState::new(org_id, user_id, intent, seed);
        let run_id = state.trace_id;
        let cancel = CancellationToken::new();

        self.run_store
            .create(RunRecord {
                run_id,
                org_id: org_id.to_string(),
                user_id: user_id.to_string(),
                status: RunStatus::Running,
                completed_at: None,
                plan_snapshot: None,
            })
            .await;

        let synthesis_metrics = match self.run_stages(&mut state, &cancel).await {
            Ok(metrics) => metrics,
            Err(err) => {
                self.emit(&state, "error", None, Some(err.to_string())).await;
                self.run_store.update(run_id, RunUpdate { status: Some(RunStatus::Error), completed_at: Some(Utc::now()), plan_snapshot: None }).await;
                return Err(err);
            }
        };

        self.run_store
            .update(
                run_id,
                RunUpdate {
                    status: Some(RunStatus::Completed),
                    completed_at: Some(Utc::now()),
                    plan_snapshot: state.plan.as_ref().and_then(|p| serde_json::to_value(p).ok()),
                },
            )
            .await;

        Ok(DriverOutcome { itinerary: state.itinerary.clone(), synthesis_metrics, state })
    }

    async fn run_stages(&self, state: &mut RunState, cancel: &CancellationToken) -> Result<Option<SynthesisMetrics>, StageError> {
        self.stage("planner", state, |state| {
            let candidates = planner::build_candidate_plans(&state.intent, FANOUT_CAP, Utc::now());
            if candidates.is_empty() {
                return Err(StageError::NoCandidates);
            }
            state.candidates = candidates;
            Ok(())
        })
        .await?;

        self.stage("selector", state, |state| {
            let ranked = selector::score(state.candidates.clone(), &state.intent);
            state.plan = ranked.into_iter().next().map(|sp| sp.plan);
            if state.plan.is_none() {
                return Err(StageError::NoCandidates);
            }
            Ok(())
        })
        .await?;

        self.emit(state, "tool_exec", Some("running"), None).await;
        let span = info_span!("stage", node = "tool_exec", trace_id = %state.trace_id);
        async {
            tool_exec_run(state, &self.tool_executor, &self.tool_registry, cancel).await
        }
        .instrument(span)
        .await?;
        self.emit(state, "tool_exec", Some("completed"), None).await;

        self.stage("verifier", state, |state| {
            state.violations = verifiers::verify_all(state);
            Ok(())
        })
        .await?;

        self.stage("repair", state, |state| {
            let Some(plan) = state.plan.clone() else { return Ok(()) };
            let violations = std::mem::take(&mut state.violations);
            let outcome = repair::repair(plan, violations);

            state.repair.cycles_run = outcome.cycles_run;
            state.repair.moves_applied = outcome.moves_applied;
            state.repair.reuse_ratio = outcome.reuse_ratio;
            state.plan = Some(outcome.plan_after);
            state.violations = outcome.remaining;

            // A repair run that can't clear every blocking violation is not
            // a stage failure: the synthesizer still assembles an itinerary
            // and the remaining violations ride along in the response.
            if !outcome.success {
                tracing::info!(
                    trace_id = %state.trace_id,
                    remaining_blocking = state.violations.iter().filter(|v| v.blocking).count(),
                    "repair budget exhausted with blocking violations outstanding"
                );
            }
            Ok(())
        })
        .await?;

        let mut synthesis_metrics = None;
        self.stage("synthesizer", state, |state| {
            let (itinerary, metrics) = synthesizer::synthesize(state).ok_or(StageError::NoCandidates)?;
            state.itinerary = Some(itinerary);
            synthesis_metrics = Some(metrics);
            Ok(())
        })
        .await?;

        self.stage("responder", state, |state| {
            state.done = true;
            Ok(())
        })
        .await?;

        Ok(synthesis_metrics)
    }

    async fn stage<F>(&self, node: &str, state: &mut RunState, f: F) -> Result<(), StageError>
    where
        F: FnOnce(&mut RunState) -> Result<(), StageError>,
    {
        self.emit(state, node, Some("running"), None).await;
        let span = info_span!("stage", node = %node, trace_id = %state.trace_id);
        let _guard = span.enter();
        let result = f(state);
        drop(_guard);
        match &result {
            Ok(()) => self.emit(state, node, Some("completed"), None).await,
            Err(err) => tracing::error!(node, trace_id = %state.trace_id, error = %err, "stage failed"),
        }
        result
    }

    async fn emit(&self, state: &RunState, node: &str, status: Option<&str>, message: Option<String>) {
        let payload = serde_json::json!({
            "node": node,
            "status": status.unwrap_or("error"),
            "ts": Utc::now(),
            "message": message,
        });
        self.event_sink.append(&state.org_id, state.trace_id, "node_event", payload).await;
    }
}

async fn tool_exec_run(
    state: &mut RunState,
    executor: &ToolExecutor,
    tools: &ToolRegistry,
    cancel: &CancellationToken,
) -> Result<(), StageError> {
    crate::tool_exec::run(state, executor, tools, cancel).await
}

/// Placeholder trace id helper kept for CLI callers that want to
/// pre-allocate a run id before constructing an Intent.
pub fn new_trace_id() -> Uuid {
    Uuid::new_v4()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use std::time::Duration;
    use tripforge_core::{Clock, FakeClock, InMemoryMetrics, MetricsFacade, Preferences};
    use tripforge_tools::{ExecutorSettings, InMemoryResultCache, ResultCache};

    use crate::event_sink::InMemoryEventSink;
    use crate::run_store::InMemoryRunStore;

    fn driver() -> Driver {
        let clock: Arc<dyn Clock> = Arc::new(FakeClock::new(Utc::now()));
        let cache: Arc<dyn ResultCache> = Arc::new(InMemoryResultCache::new(clock.clone()));
        let metrics: Arc<dyn MetricsFacade> = Arc::new(InMemoryMetrics::new());
        let tool_executor = ToolExecutor::new(
            ExecutorSettings {
                soft_timeout: Duration::from_millis(500),
                hard_timeout: Duration::from_secs(4),
                retry_jitter_min_ms: 0,
                retry_jitter_max_ms: 1,
                breaker_failure_threshold: 3,
                breaker_cooldown_seconds: 30,
                eval_rng_seed: 11,
            },
            clock.clone(),
            cache,
            metrics,
        );
        Driver {
            event_sink: Arc::new(InMemoryEventSink::new()),
            run_store: Arc::new(InMemoryRunStore::new()),
            tool_executor,
            tool_registry: ToolRegistry::fixtures(clock),
        }
    }

    fn sample_intent() -> Intent {
        Intent {
            city: "Paris".to_string(),
            window_start: NaiveDate::from_ymd_opt(2025, 6, 1).unwrap(),
            window_end: NaiveDate::from_ymd_opt(2025, 6, 4).unwrap(),
            tz: chrono_tz::Europe::Paris,
            budget_cents: 500_000,
            airports: vec!["JFK".to_string()],
            preferences: Preferences::default(),
        }
    }

    #[tokio::test]
    async fn a_well_formed_intent_produces_an_itinerary() {
        let driver = driver();
        let outcome = driver.run("org", "user", sample_intent(), 1).await.unwrap();
        assert!(outcome.itinerary.is_some());
        assert!(outcome.state.done);
    }

    #[tokio::test]
    async fn an_invalid_intent_is_rejected_before_any_stage_runs() {
        let driver = driver();
        let mut intent = sample_intent();
        intent.budget_cents = -1;
        let result = driver.run("org", "user", intent, 1).await;
        assert!(result.is_err());
    }
}
