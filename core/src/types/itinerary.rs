//! The final, immutable Itinerary assembled by the synthesizer.

use chrono::{NaiveDate, NaiveTime};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::choice::ChoiceKind;
use super::plan::Intent;
use super::provenance::Provenance;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Activity {
    pub option_ref: String,
    pub kind: ChoiceKind,
    pub name: String,
    pub geo: Option<(f64, f64)>,
    pub notes: String,
    pub start: NaiveTime,
    pub end: NaiveTime,
    pub cost_cents: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DayItinerary {
    pub date: NaiveDate,
    pub activities: Vec<Activity>,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, Default)]
pub struct CostBreakdown {
    pub flights_cents: i64,
    pub lodging_cents: i64,
    pub attractions_cents: i64,
    pub transit_cents: i64,
    pub daily_spend_cents: i64,
    pub total_cents: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Decision {
    pub stage: String,
    pub rationale: String,
    pub alternatives_considered: Vec<String>,
    pub selected: String,
}

/// `{claim, provenance}` pair; guarantees "no evidence, no claim".
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Citation {
    pub claim: String,
    pub provenance: Provenance,
}

/// Currency disclaimer shown alongside every cost breakdown, since costs
/// are computed from a mix of quoted and FX-converted fixture/tool data.
pub const CURRENCY_DISCLAIMER: &str =
    "Costs are estimates in USD cents and may not reflect final booking prices.";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Itinerary {
    pub itinerary_id: Uuid,
    pub intent: Intent,
    pub days: Vec<DayItinerary>,
    pub cost_breakdown: CostBreakdown,
    pub currency_disclaimer: String,
    pub decisions: Vec<Decision>,
    pub citations: Vec<Citation>,
}
