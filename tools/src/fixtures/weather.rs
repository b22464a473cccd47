//! Deterministic weather-by-city-and-date fixture table.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{Datelike, NaiveDate};
use serde_json::Value;
use tripforge_core::{Clock, Provenance, WeatherDayResult};

use crate::callable::ToolCallable;
use crate::errors::ToolError;

use super::require_str;

/// `(city, day_of_month)` -> `(precip_prob, wind_kmh)`. Any day not listed
/// falls back to a mild default so fixture coverage never needs to be
/// exhaustive over a trip window.
const TABLE: &[((&str, u32), (f64, f64))] = &[
    (("Paris", 1), (0.10, 12.0)),
    (("Paris", 2), (0.70, 18.0)),
    (("Paris", 3), (0.20, 40.0)),
    (("Tokyo", 1), (0.05, 8.0)),
    (("Tokyo", 2), (0.65, 10.0)),
];

const DEFAULT: (f64, f64) = (0.15, 10.0);

pub struct FixtureWeatherTool {
    clock: Arc<dyn Clock>,
}

impl FixtureWeatherTool {
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self { clock }
    }
}

#[async_trait]
impl ToolCallable for FixtureWeatherTool {
    fn name(&self) -> &str {
        "weather"
    }

    async fn call(&self, args: Value) -> Result<Value, ToolError> {
        let city = require_str(&args, "city")?;
        let date_str = require_str(&args, "date")?;
        let date: NaiveDate = date_str
            .parse()
            .map_err(|_| ToolError::ValidationError(format!("invalid date '{date_str}'")))?;

        let (precip_prob, wind_kmh) = TABLE
            .iter()
            .find(|((c, d), _)| *c == city && *d == date.day())
            .map(|(_, v)| *v)
            .unwrap_or(DEFAULT);

        let result = WeatherDayResult {
            date,
            precip_prob,
            wind_kmh,
            provenance: Provenance::fixture(super::clock_now_utc(self.clock.as_ref()), format!("weather:{city}:{date}")),
        };
        Ok(serde_json::to_value(result).expect("WeatherDayResult always serializes"))
    }
}
