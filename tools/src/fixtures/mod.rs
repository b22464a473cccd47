//! Deterministic fixture tool adapters.
//!
//! Real third-party weather/flight/lodging/attraction/transit/FX APIs are
//! out of scope; these adapters implement the same `ToolCallable`
//! contract a production adapter would, seeded from small in-memory
//! tables keyed by city/day so repeated runs with the same intent are
//! byte-identical. Every result's Provenance carries `source=fixture`.

mod attraction;
mod flight;
mod fx;
mod lodging;
mod transit;
mod weather;

pub use attraction::FixtureAttractionTool;
pub use flight::FixtureFlightTool;
pub use fx::FixtureFxTool;
pub use lodging::FixtureLodgingTool;
pub use transit::FixtureTransitTool;
pub use weather::FixtureWeatherTool;

use tripforge_core::Clock;

/// Argument parsing shared by every fixture adapter: extract a required
/// string field, erroring with a validation-type `ToolError` if absent.
pub(crate) fn require_str<'a>(args: &'a serde_json::Value, field: &str) -> Result<&'a str, crate::errors::ToolError> {
    args.get(field)
        .and_then(|v| v.as_str())
        .ok_or_else(|| crate::errors::ToolError::ValidationError(format!("missing field '{field}'")))
}

pub(crate) fn clock_now_utc(clock: &dyn Clock) -> chrono::DateTime<chrono::Utc> {
    clock.now_utc()
}
