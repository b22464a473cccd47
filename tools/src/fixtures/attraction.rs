//! Deterministic attraction-by-city fixture table, including opening
//! hours so the verifier suite has real feasibility windows to check.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::NaiveTime;
use serde_json::Value;
use tripforge_core::{AttractionResult, Clock, Provenance, Tri};

use crate::callable::ToolCallable;
use crate::errors::ToolError;

use super::require_str;

struct Venue {
    city: &'static str,
    name: &'static str,
    /// One of `"museum"`, `"park"`, `"temple"`.
    venue_type: &'static str,
    indoor: Tri,
    kid_friendly: Tri,
    themes: &'static [&'static str],
    geo: (f64, f64),
    /// `(weekday, open_hour, close_hour)`; weekday 0 = Monday.
    hours: &'static [(u8, u32, u32)],
}

const VENUES: &[Venue] = &[
    Venue {
        city: "Paris",
        name: "Louvre Museum",
        venue_type: "museum",
        indoor: Tri::Yes,
        kid_friendly: Tri::Yes,
        themes: &["art", "history"],
        geo: (48.8606, 2.3376),
        hours: &[(1, 9, 18), (2, 9, 18), (3, 9, 18), (4, 9, 21), (5, 9, 18)],
    },
    Venue {
        city: "Paris",
        name: "Jardin du Luxembourg",
        venue_type: "park",
        indoor: Tri::No,
        kid_friendly: Tri::Yes,
        themes: &["outdoors"],
        geo: (48.8462, 2.3372),
        hours: &[(0, 7, 21), (1, 7, 21), (2, 7, 21), (3, 7, 21), (4, 7, 21), (5, 7, 21), (6, 7, 21)],
    },
    Venue {
        city: "Tokyo",
        name: "Senso-ji Temple",
        venue_type: "temple",
        indoor: Tri::No,
        kid_friendly: Tri::Yes,
        themes: &["history", "culture"],
        geo: (35.7148, 139.7967),
        hours: &[(0, 6, 17), (1, 6, 17), (2, 6, 17), (3, 6, 17), (4, 6, 17), (5, 6, 17), (6, 6, 17)],
    },
];

pub struct FixtureAttractionTool {
    clock: Arc<dyn Clock>,
}

impl FixtureAttractionTool {
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self { clock }
    }
}

#[async_trait]
impl ToolCallable for FixtureAttractionTool {
    fn name(&self) -> &str {
        "attraction"
    }

    async fn call(&self, args: Value) -> Result<Value, ToolError> {
        let city = require_str(&args, "city")?;
        let index = args.get("index").and_then(|v| v.as_u64()).unwrap_or(0) as usize;

        let matches: Vec<&Venue> = VENUES.iter().filter(|v| v.city == city).collect();
        let venue = matches
            .get(index)
            .copied()
            .ok_or_else(|| ToolError::NotFound(format!("no fixture attraction for '{city}' at index {index}")))?;

        let mut opening_hours: HashMap<u8, Vec<(NaiveTime, NaiveTime)>> = HashMap::new();
        for &(weekday, open_hour, close_hour) in venue.hours {
            let open = NaiveTime::from_hms_opt(open_hour, 0, 0).expect("fixture hour in range");
            let close = NaiveTime::from_hms_opt(close_hour, 0, 0).expect("fixture hour in range");
            opening_hours.entry(weekday).or_default().push((open, close));
        }

        let result = AttractionResult {
            option_ref: format!("at:{city}:{index}"),
            name: venue.name.to_string(),
            venue_type: venue.venue_type.to_string(),
            opening_hours,
            indoor: venue.indoor,
            kid_friendly: venue.kid_friendly,
            themes: venue.themes.iter().map(|s| s.to_string()).collect(),
            geo: Some(venue.geo),
            provenance: Provenance::fixture(super::clock_now_utc(self.clock.as_ref()), format!("attraction:{city}:{index}")),
        };
        Ok(serde_json::to_value(result).expect("AttractionResult always serializes"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tripforge_core::SystemClock;

    #[tokio::test]
    async fn louvre_is_closed_on_mondays() {
        let tool = FixtureAttractionTool::new(Arc::new(SystemClock));
        let out = tool.call(serde_json::json!({"city": "Paris", "index": 0})).await.unwrap();
        let result: AttractionResult = serde_json::from_value(out).unwrap();
        assert!(!result.opening_hours.contains_key(&0));
        assert!(result.opening_hours.contains_key(&1));
    }

    #[tokio::test]
    async fn themes_are_carried_verbatim() {
        let tool = FixtureAttractionTool::new(Arc::new(SystemClock));
        let out = tool.call(serde_json::json!({"city": "Tokyo", "index": 0})).await.unwrap();
        let result: AttractionResult = serde_json::from_value(out).unwrap();
        assert_eq!(result.themes, vec!["history".to_string(), "culture".to_string()]);
    }
}
