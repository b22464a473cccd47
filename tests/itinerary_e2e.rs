//! End-to-end scenarios driving the orchestration driver against the
//! fixture tool adapters.

use std::sync::Arc;
use std::time::Duration;

use chrono::{NaiveDate, Utc};
use tripforge_agents::{Driver, InMemoryEventSink, InMemoryRunStore};
use tripforge_core::{Clock, FakeClock, InMemoryMetrics, Intent, Preferences};
use tripforge_tools::{ExecutorSettings, InMemoryResultCache};

fn test_driver() -> Driver {
    let clock: Arc<dyn Clock> = Arc::new(FakeClock::new(Utc::now()));
    let cache = Arc::new(InMemoryResultCache::new(clock.clone()));
    let metrics = Arc::new(InMemoryMetrics::new());
    let tool_executor = tripforge_tools::ToolExecutor::new(
        ExecutorSettings {
            soft_timeout: Duration::from_millis(500),
            hard_timeout: Duration::from_secs(4),
            retry_jitter_min_ms: 0,
            retry_jitter_max_ms: 1,
            breaker_failure_threshold: 3,
            breaker_cooldown_seconds: 30,
            eval_rng_seed: 99,
        },
        clock.clone(),
        cache,
        metrics,
    );
    Driver {
        event_sink: Arc::new(InMemoryEventSink::new()),
        run_store: Arc::new(InMemoryRunStore::new()),
        tool_executor,
        tool_registry: tripforge_agents::ToolRegistry::fixtures(clock),
    }
}

fn paris_intent(budget_cents: i64) -> Intent {
    Intent {
        city: "Paris".to_string(),
        window_start: NaiveDate::from_ymd_opt(2025, 6, 1).unwrap(),
        window_end: NaiveDate::from_ymd_opt(2025, 6, 5).unwrap(),
        tz: chrono_tz::Europe::Paris,
        budget_cents,
        airports: vec!["CDG".to_string()],
        preferences: Preferences { themes: vec!["art".to_string()], ..Preferences::default() },
    }
}

#[tokio::test]
async fn happy_paris_completes_with_a_full_week_itinerary() {
    let driver = test_driver();
    let outcome = driver.run("org", "user", paris_intent(250_000), 1).await.unwrap();

    let itinerary = outcome.itinerary.expect("itinerary should be produced");
    assert_eq!(itinerary.days.len(), 5);

    let budget_limit = (250_000f64 * 1.10) as i64;
    assert!(itinerary.cost_breakdown.total_cents <= budget_limit);

    let metrics = outcome.synthesis_metrics.expect("synthesis metrics should be recorded");
    assert!(metrics.coverage() >= 0.95, "citation coverage {} below golden-case floor", metrics.coverage());
}

#[tokio::test]
async fn over_budget_still_produces_an_itinerary_with_a_blocking_violation() {
    let driver = test_driver();
    let outcome = driver.run("org", "user", paris_intent(50_000), 1).await.unwrap();

    assert!(outcome.itinerary.is_some(), "synthesizer must still run despite an unresolved budget violation");
    let blocking: Vec<_> = outcome.state.violations.iter().filter(|v| v.blocking).collect();
    assert!(blocking.iter().any(|v| v.reason == "total_over_budget"));
}

#[tokio::test]
async fn repair_downgrades_lodging_and_reuses_most_of_the_plan() {
    let driver = test_driver();
    let outcome = driver.run("org", "user", paris_intent(60_000), 1).await.unwrap();

    assert!(outcome.state.repair.moves_applied >= 1);
    assert!(outcome.state.repair.reuse_ratio >= 0.5);
}

#[tokio::test]
async fn an_invalid_window_is_rejected_before_any_stage_runs() {
    let driver = test_driver();
    let mut intent = paris_intent(250_000);
    intent.window_end = intent.window_start - chrono::Duration::days(1);
    let result = driver.run("org", "user", intent, 1).await;
    assert!(result.is_err());
}
