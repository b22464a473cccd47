//! Deterministic lodging-by-city fixture table.

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;
use tripforge_core::{Clock, LodgingResult, Provenance};

use crate::callable::ToolCallable;
use crate::errors::ToolError;

use super::require_str;

struct Listing {
    city: &'static str,
    name: &'static str,
    price_per_night_cents: i64,
    geo: (f64, f64),
}

const LISTINGS: &[Listing] = &[
    Listing { city: "Paris", name: "Hotel Lumiere", price_per_night_cents: 14_000, geo: (48.8566, 2.3522) },
    Listing { city: "Paris", name: "Le Marais Flat", price_per_night_cents: 9_500, geo: (48.8590, 2.3620) },
    Listing { city: "Tokyo", name: "Shinjuku Inn", price_per_night_cents: 11_000, geo: (35.6938, 139.7034) },
];

pub struct FixtureLodgingTool {
    clock: Arc<dyn Clock>,
}

impl FixtureLodgingTool {
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self { clock }
    }
}

#[async_trait]
impl ToolCallable for FixtureLodgingTool {
    fn name(&self) -> &str {
        "lodging"
    }

    async fn call(&self, args: Value) -> Result<Value, ToolError> {
        let city = require_str(&args, "city")?;
        let index = args.get("index").and_then(|v| v.as_u64()).unwrap_or(0) as usize;

        let matches: Vec<&Listing> = LISTINGS.iter().filter(|l| l.city == city).collect();
        let listing = matches
            .get(index)
            .copied()
            .ok_or_else(|| ToolError::NotFound(format!("no fixture lodging for '{city}' at index {index}")))?;

        let result = LodgingResult {
            option_ref: format!("lg:{city}:{index}"),
            name: listing.name.to_string(),
            price_per_night_cents: listing.price_per_night_cents,
            geo: Some(listing.geo),
            provenance: Provenance::fixture(super::clock_now_utc(self.clock.as_ref()), format!("lodging:{city}:{index}")),
        };
        Ok(serde_json::to_value(result).expect("LodgingResult always serializes"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tripforge_core::SystemClock;

    #[tokio::test]
    async fn first_listing_for_city_is_index_zero() {
        let tool = FixtureLodgingTool::new(Arc::new(SystemClock));
        let out = tool.call(serde_json::json!({"city": "Paris"})).await.unwrap();
        let result: LodgingResult = serde_json::from_value(out).unwrap();
        assert_eq!(result.name, "Hotel Lumiere");
    }

    #[tokio::test]
    async fn out_of_range_index_is_not_found() {
        let tool = FixtureLodgingTool::new(Arc::new(SystemClock));
        let err = tool.call(serde_json::json!({"city": "Paris", "index": 9})).await.unwrap_err();
        assert!(matches!(err, ToolError::NotFound(_)));
    }
}
