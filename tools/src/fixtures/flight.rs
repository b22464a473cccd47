//! Deterministic flight-by-route fixture table.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{Datelike, TimeZone};
use serde_json::Value;
use tripforge_core::{Clock, FlightResult, Provenance};

use crate::callable::ToolCallable;
use crate::errors::ToolError;

use super::require_str;

struct Route {
    origin: &'static str,
    destination: &'static str,
    price_cents: i64,
    depart_hour: u32,
    duration_hours: i64,
    carrier: &'static str,
}

const ROUTES: &[Route] = &[
    Route { origin: "JFK", destination: "CDG", price_cents: 62_000, depart_hour: 19, duration_hours: 7, carrier: "AF" },
    Route { origin: "CDG", destination: "JFK", price_cents: 58_000, depart_hour: 11, duration_hours: 9, carrier: "AF" },
    Route { origin: "JFK", destination: "NRT", price_cents: 95_000, depart_hour: 13, duration_hours: 14, carrier: "NH" },
];

pub struct FixtureFlightTool {
    clock: Arc<dyn Clock>,
}

impl FixtureFlightTool {
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self { clock }
    }
}

#[async_trait]
impl ToolCallable for FixtureFlightTool {
    fn name(&self) -> &str {
        "flight"
    }

    async fn call(&self, args: Value) -> Result<Value, ToolError> {
        let origin = require_str(&args, "origin")?;
        let destination = require_str(&args, "destination")?;
        let date_str = require_str(&args, "date")?;
        let tz_name = require_str(&args, "tz")?;
        let tz: chrono_tz::Tz = tz_name
            .parse()
            .map_err(|_| ToolError::ValidationError(format!("unknown timezone '{tz_name}'")))?;
        let date: chrono::NaiveDate = date_str
            .parse()
            .map_err(|_| ToolError::ValidationError(format!("invalid date '{date_str}'")))?;

        let route = ROUTES
            .iter()
            .find(|r| r.origin == origin && r.destination == destination)
            .ok_or_else(|| ToolError::NotFound(format!("no fixture route {origin}->{destination}")))?;

        let depart = tz
            .with_ymd_and_hms(date.year(), date.month(), date.day(), route.depart_hour, 0, 0)
            .single()
            .ok_or_else(|| ToolError::ValidationError("ambiguous departure instant".to_string()))?;
        let arrive = depart + chrono::Duration::hours(route.duration_hours);
        let overnight = arrive.date_naive() != depart.date_naive();

        let result = FlightResult {
            option_ref: format!("fl:{origin}:{destination}:{date}"),
            origin: origin.to_string(),
            destination: destination.to_string(),
            depart,
            arrive,
            price_cents: route.price_cents,
            overnight,
            carrier: route.carrier.to_string(),
            provenance: Provenance::fixture(super::clock_now_utc(self.clock.as_ref()), format!("flight:{origin}:{destination}:{date}")),
        };
        Ok(serde_json::to_value(result).expect("FlightResult always serializes"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tripforge_core::SystemClock;

    #[tokio::test]
    async fn known_route_returns_fixture_price() {
        let tool = FixtureFlightTool::new(Arc::new(SystemClock));
        let out = tool
            .call(serde_json::json!({"origin": "JFK", "destination": "CDG", "date": "2025-06-01", "tz": "Europe/Paris"}))
            .await
            .unwrap();
        let result: FlightResult = serde_json::from_value(out).unwrap();
        assert_eq!(result.price_cents, 62_000);
        assert_eq!(result.carrier, "AF");
    }

    #[tokio::test]
    async fn unknown_route_is_not_found() {
        let tool = FixtureFlightTool::new(Arc::new(SystemClock));
        let err = tool
            .call(serde_json::json!({"origin": "LAX", "destination": "CDG", "date": "2025-06-01", "tz": "Europe/Paris"}))
            .await
            .unwrap_err();
        assert!(matches!(err, ToolError::NotFound(_)));
    }
}
