//! Populates `RunState`'s tool-result dictionaries for every choice the
//! selected plan actually uses, via the resilient tool executor. Tool
//! failures are swallowed here (not bubbled up as stage errors): a
//! missing record downstream means "unknown", never a fabricated claim.

use std::sync::Arc;

use chrono::{Datelike, TimeZone, Utc};
use tokio_util::sync::CancellationToken;
use tripforge_core::{
    AttractionResult, Choice, ChoiceKind, FlightResult, FxRateResult, LodgingResult, Provenance,
    TransitLegResult, WeatherDayResult, RunState,
};
use tripforge_tools::{
    fixtures::{FixtureAttractionTool, FixtureFlightTool, FixtureFxTool, FixtureLodgingTool, FixtureTransitTool, FixtureWeatherTool},
    BreakerPolicy, CachePolicy, ToolCallable, ToolExecutor, ToolStatus,
};

use crate::errors::StageError;

const WEATHER_TTL_SECONDS: u64 = 86_400;
const CATALOG_TTL_SECONDS: u64 = 3_600;

/// The fixture-backed tool set the ToolExec stage drives. A live
/// deployment would swap these for real adapters behind the same
/// `ToolCallable` contract without touching the stage logic.
pub struct ToolRegistry {
    pub weather: Box<dyn ToolCallable>,
    pub flight: Box<dyn ToolCallable>,
    pub lodging: Box<dyn ToolCallable>,
    pub attraction: Box<dyn ToolCallable>,
    pub transit: Box<dyn ToolCallable>,
    pub fx: Box<dyn ToolCallable>,
}

impl ToolRegistry {
    pub fn fixtures(clock: Arc<dyn tripforge_core::Clock>) -> Self {
        Self {
            weather: Box::new(FixtureWeatherTool::new(clock.clone())),
            flight: Box::new(FixtureFlightTool::new(clock.clone())),
            lodging: Box::new(FixtureLodgingTool::new(clock.clone())),
            attraction: Box::new(FixtureAttractionTool::new(clock.clone())),
            transit: Box::new(FixtureTransitTool::new(clock.clone())),
            fx: Box::new(FixtureFxTool::new(clock)),
        }
    }
}

fn currency_for(city: &str) -> &'static str {
    match city {
        "Tokyo" => "JPY",
        "London" => "GBP",
        _ => "EUR",
    }
}

/// Run the ToolExec stage: fetch weather for every planned day, then
/// fetch a record for every selected choice not already present in the
/// run state's dictionaries.
pub async fn run(
    state: &mut RunState,
    executor: &ToolExecutor,
    tools: &ToolRegistry,
    cancel: &CancellationToken,
) -> Result<(), StageError> {
    let plan = state.plan.clone().ok_or(StageError::NoCandidates)?;
    let tz_name = state.intent.tz.to_string();

    for day in &plan.days {
        if !state.weather.contains_key(&day.date) {
            let args = serde_json::json!({"city": state.intent.city, "date": day.date.to_string()});
            state.record_tool_call("weather");
            let result = executor
                .execute(tools.weather.as_ref(), args, CachePolicy::with_ttl(WEATHER_TTL_SECONDS), BreakerPolicy::enabled(), cancel)
                .await;
            if let Some(record) = decode::<WeatherDayResult>(&result) {
                state.weather.insert(day.date, record);
            }
        }

        for slot in &day.slots {
            let Some(choice) = slot.selected() else { continue };
            let option_ref = choice.option_ref.clone();
            let parts: Vec<&str> = option_ref.split(':').collect();

            match choice.kind {
                ChoiceKind::Flight if !state.flights.contains_key(&option_ref) => {
                    if let [_, origin, destination] = parts[..] {
                        let args = serde_json::json!({
                            "origin": origin,
                            "destination": destination,
                            "date": day.date.to_string(),
                            "tz": tz_name,
                        });
                        state.record_tool_call("flight");
                        let result = executor
                            .execute(tools.flight.as_ref(), args, CachePolicy::with_ttl(CATALOG_TTL_SECONDS), BreakerPolicy::enabled(), cancel)
                            .await;
                        let record = decode::<FlightResult>(&result)
                            .unwrap_or_else(|| fallback_flight(&option_ref, origin, destination, day.date, state.intent.tz, choice));
                        state.flights.insert(option_ref.clone(), record);
                    }
                }
                ChoiceKind::Lodging if !state.lodgings.contains_key(&option_ref) => {
                    if let [_, city, index] = parts[..] {
                        let args = serde_json::json!({"city": city, "index": index.parse::<u64>().unwrap_or(0)});
                        state.record_tool_call("lodging");
                        let result = executor
                            .execute(tools.lodging.as_ref(), args, CachePolicy::with_ttl(CATALOG_TTL_SECONDS), BreakerPolicy::enabled(), cancel)
                            .await;
                        let record = decode::<LodgingResult>(&result).unwrap_or_else(|| fallback_lodging(&option_ref, choice));
                        state.lodgings.insert(option_ref.clone(), record);
                    }
                }
                ChoiceKind::Attraction if !state.attractions.contains_key(&option_ref) => {
                    if let [_, city, index] = parts[..] {
                        let args = serde_json::json!({"city": city, "index": index.parse::<u64>().unwrap_or(0)});
                        state.record_tool_call("attraction");
                        let result = executor
                            .execute(tools.attraction.as_ref(), args, CachePolicy::with_ttl(CATALOG_TTL_SECONDS), BreakerPolicy::enabled(), cancel)
                            .await;
                        let record = decode::<AttractionResult>(&result).unwrap_or_else(|| fallback_attraction(&option_ref, choice));
                        state.attractions.insert(option_ref.clone(), record);
                    }
                }
                ChoiceKind::Transit if !state.transit.contains_key(&option_ref) => {
                    if let [_, city, index] = parts[..] {
                        let args = serde_json::json!({"city": city, "index": index.parse::<u64>().unwrap_or(0)});
                        state.record_tool_call("transit");
                        let result = executor
                            .execute(tools.transit.as_ref(), args, CachePolicy::with_ttl(CATALOG_TTL_SECONDS), BreakerPolicy::enabled(), cancel)
                            .await;
                        let record = decode::<TransitLegResult>(&result).unwrap_or_else(|| fallback_transit(&option_ref, choice));
                        state.transit.insert(option_ref.clone(), record);
                    }
                }
                _ => {}
            }
        }
    }

    let pair = format!("USD/{}", currency_for(&state.intent.city));
    if !state.fx.contains_key(&pair) {
        state.record_tool_call("fx");
        let result = executor
            .execute(tools.fx.as_ref(), serde_json::json!({"pair": pair}), CachePolicy::with_ttl(CATALOG_TTL_SECONDS), BreakerPolicy::enabled(), cancel)
            .await;
        if let Some(record) = decode::<FxRateResult>(&result) {
            state.fx.insert(pair, record);
        }
    }

    Ok(())
}

fn decode<T: serde::de::DeserializeOwned>(result: &tripforge_tools::ToolResult) -> Option<T> {
    if result.status != ToolStatus::Success {
        return None;
    }
    result.data.clone().and_then(|data| serde_json::from_value(data).ok())
}

/// When a tool call doesn't yield a decodable record, synthesize a
/// minimal one from the choice's own features rather than leaving the
/// dictionary entry absent. Marked with planner provenance: the value
/// didn't round-trip through a tool, it's a restatement of what the
/// plan already assumed.
fn fallback_flight(option_ref: &str, origin: &str, destination: &str, date: chrono::NaiveDate, tz: chrono_tz::Tz, choice: &Choice) -> FlightResult {
    let depart = tz
        .with_ymd_and_hms(date.year(), date.month(), date.day(), 12, 0, 0)
        .single()
        .expect("noon is not a DST-ambiguous hour");
    let arrive = depart + chrono::Duration::seconds(choice.features.travel_seconds.unwrap_or(0));
    FlightResult {
        option_ref: option_ref.to_string(),
        origin: origin.to_string(),
        destination: destination.to_string(),
        depart,
        arrive,
        price_cents: choice.features.cost_cents,
        overnight: arrive.date_naive() != depart.date_naive(),
        carrier: "unknown".to_string(),
        provenance: Provenance::planner(Utc::now()),
    }
}

fn fallback_lodging(option_ref: &str, choice: &Choice) -> LodgingResult {
    LodgingResult {
        option_ref: option_ref.to_string(),
        name: format!("Unknown lodging ({option_ref})"),
        price_per_night_cents: choice.features.cost_cents,
        geo: None,
        provenance: Provenance::planner(Utc::now()),
    }
}

fn fallback_attraction(option_ref: &str, choice: &Choice) -> AttractionResult {
    AttractionResult {
        option_ref: option_ref.to_string(),
        name: format!("Unknown attraction ({option_ref})"),
        venue_type: "other".to_string(),
        opening_hours: std::collections::HashMap::new(),
        indoor: choice.features.indoor,
        kid_friendly: tripforge_core::Tri::Unknown,
        themes: choice.features.themes.clone(),
        geo: None,
        provenance: Provenance::planner(Utc::now()),
    }
}

fn fallback_transit(option_ref: &str, choice: &Choice) -> TransitLegResult {
    TransitLegResult {
        option_ref: option_ref.to_string(),
        mode: "unknown".to_string(),
        duration_seconds: choice.features.travel_seconds.unwrap_or(0),
        price_cents: choice.features.cost_cents,
        provenance: Provenance::planner(Utc::now()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{NaiveDate, Utc};
    use std::time::Duration;
    use tripforge_core::{FakeClock, InMemoryMetrics, Intent, Preferences};
    use tripforge_tools::{ExecutorSettings, InMemoryResultCache};

    fn test_state() -> RunState {
        let intent = Intent {
            city: "Paris".to_string(),
            window_start: NaiveDate::from_ymd_opt(2025, 6, 1).unwrap(),
            window_end: NaiveDate::from_ymd_opt(2025, 6, 4).unwrap(),
            tz: chrono_tz::Europe::Paris,
            budget_cents: 150_000,
            airports: vec!["JFK".to_string()],
            preferences: Preferences::default(),
        };
        let plans = crate::planner::build_candidate_plans(&intent, 1, Utc::now());
        let mut state = RunState::new("org", "user", intent, 7);
        state.plan = Some(plans.into_iter().next().unwrap());
        state
    }

    fn test_executor(clock: Arc<dyn tripforge_core::Clock>) -> ToolExecutor {
        let cache: Arc<dyn tripforge_tools::ResultCache> = Arc::new(InMemoryResultCache::new(clock.clone()));
        let metrics: Arc<dyn tripforge_core::MetricsFacade> = Arc::new(InMemoryMetrics::new());
        ToolExecutor::new(
            ExecutorSettings {
                soft_timeout: Duration::from_millis(500),
                hard_timeout: Duration::from_secs(4),
                retry_jitter_min_ms: 0,
                retry_jitter_max_ms: 1,
                breaker_failure_threshold: 3,
                breaker_cooldown_seconds: 30,
                eval_rng_seed: 7,
            },
            clock,
            cache,
            metrics,
        )
    }

    #[tokio::test]
    async fn populates_weather_and_selected_choice_dictionaries() {
        let clock: Arc<dyn tripforge_core::Clock> = Arc::new(FakeClock::new(Utc::now()));
        let executor = test_executor(clock.clone());
        let registry = ToolRegistry::fixtures(clock);
        let mut state = test_state();
        let cancel = CancellationToken::new();

        run(&mut state, &executor, &registry, &cancel).await.unwrap();

        assert!(!state.weather.is_empty());
        assert!(!state.attractions.is_empty());
        assert!(!state.flights.is_empty());
    }

    #[tokio::test]
    async fn a_missing_fixture_route_falls_back_to_a_feature_derived_record() {
        let clock: Arc<dyn tripforge_core::Clock> = Arc::new(FakeClock::new(Utc::now()));
        let executor = test_executor(clock.clone());
        let registry = ToolRegistry::fixtures(clock);
        let mut state = test_state();
        state.intent.airports = vec!["LAX".to_string()];
        if let Some(plan) = state.plan.as_mut() {
            for day in plan.days.iter_mut() {
                for slot in day.slots.iter_mut() {
                    for choice in slot.choices.iter_mut() {
                        if matches!(choice.kind, ChoiceKind::Flight) {
                            choice.option_ref = choice.option_ref.replacen("JFK", "LAX", 1);
                        }
                    }
                }
            }
        }
        let cancel = CancellationToken::new();
        run(&mut state, &executor, &registry, &cancel).await.unwrap();
        assert!(!state.flights.is_empty());
        assert!(state.flights.values().any(|f| f.origin == "LAX" && f.carrier == "unknown"));
    }
}
