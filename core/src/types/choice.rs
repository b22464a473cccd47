//! Choice and ChoiceFeatures — the only contact surface the selector and
//! verifiers are allowed to read for choice-level scoring.

use serde::{Deserialize, Serialize};

use super::provenance::Provenance;
use super::tri::Tri;

/// What kind of thing a Choice represents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChoiceKind {
    Flight,
    Lodging,
    Attraction,
    Transit,
    Meal,
}

/// Numeric/categorical summary of a Choice. Raw tool-result fields are
/// off-limits to the selector and verifiers outside of the feature mapper
/// (see `tripforge_core::features`) — this is the only structure they may
/// read.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChoiceFeatures {
    pub cost_cents: i64,
    pub travel_seconds: Option<i64>,
    pub indoor: Tri,
    pub themes: Vec<String>,
}

/// A ranked option for a slot; the first in a slot's `choices` list is
/// "selected".
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Choice {
    pub kind: ChoiceKind,
    pub option_ref: String,
    pub features: ChoiceFeatures,
    pub score: Option<f64>,
    pub provenance: Provenance,
}
