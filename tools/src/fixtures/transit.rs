//! Deterministic transit-leg-by-city fixture table.

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;
use tripforge_core::{Clock, Provenance, TransitLegResult};

use crate::callable::ToolCallable;
use crate::errors::ToolError;

use super::require_str;

struct Leg {
    city: &'static str,
    mode: &'static str,
    duration_seconds: i64,
    price_cents: i64,
}

const LEGS: &[Leg] = &[
    Leg { city: "Paris", mode: "metro", duration_seconds: 1_200, price_cents: 210 },
    Leg { city: "Paris", mode: "taxi", duration_seconds: 900, price_cents: 2_400 },
    Leg { city: "Tokyo", mode: "train", duration_seconds: 1_500, price_cents: 300 },
];

pub struct FixtureTransitTool {
    clock: Arc<dyn Clock>,
}

impl FixtureTransitTool {
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self { clock }
    }
}

#[async_trait]
impl ToolCallable for FixtureTransitTool {
    fn name(&self) -> &str {
        "transit"
    }

    async fn call(&self, args: Value) -> Result<Value, ToolError> {
        let city = require_str(&args, "city")?;
        let index = args.get("index").and_then(|v| v.as_u64()).unwrap_or(0) as usize;

        let matches: Vec<&Leg> = LEGS.iter().filter(|l| l.city == city).collect();
        let leg = matches
            .get(index)
            .copied()
            .ok_or_else(|| ToolError::NotFound(format!("no fixture transit for '{city}' at index {index}")))?;

        let result = TransitLegResult {
            option_ref: format!("tr:{city}:{index}"),
            mode: leg.mode.to_string(),
            duration_seconds: leg.duration_seconds,
            price_cents: leg.price_cents,
            provenance: Provenance::fixture(super::clock_now_utc(self.clock.as_ref()), format!("transit:{city}:{index}")),
        };
        Ok(serde_json::to_value(result).expect("TransitLegResult always serializes"))
    }
}
