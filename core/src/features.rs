//! The canonical feature-mapper: derives `ChoiceFeatures` from each
//! domain's tool-result record.
//!
//! §9 flags that two divergent theme-derivation tables existed for
//! attractions in the source material; this module adopts exactly one
//! canonical mapping per venue kind, resolving that open question.

use crate::types::{
    AttractionResult, ChoiceFeatures, FlightResult, LodgingResult, TransitLegResult, Tri,
};

/// Derive features for a flight choice.
pub fn flight_features(flight: &FlightResult) -> ChoiceFeatures {
    let travel_seconds = (flight.arrive.clone() - flight.depart.clone())
        .num_seconds()
        .max(0);
    ChoiceFeatures {
        cost_cents: flight.price_cents,
        travel_seconds: Some(travel_seconds),
        indoor: Tri::Unknown,
        themes: Vec::new(),
    }
}

/// Derive features for a lodging choice, given the number of nights it is
/// booked for.
pub fn lodging_features(lodging: &LodgingResult, nights: i64) -> ChoiceFeatures {
    ChoiceFeatures {
        cost_cents: lodging.price_per_night_cents * nights.max(1),
        travel_seconds: None,
        indoor: Tri::Yes,
        themes: Vec::new(),
    }
}

/// Derive features for an attraction choice. This is the single canonical
/// theme-derivation rule for attractions: the attraction's own `themes`
/// list, verbatim, with no secondary inference from its name or category.
pub fn attraction_features(attraction: &AttractionResult, cost_cents: i64) -> ChoiceFeatures {
    ChoiceFeatures {
        cost_cents,
        travel_seconds: None,
        indoor: attraction.indoor,
        themes: attraction.themes.clone(),
    }
}

/// Derive features for a transit leg choice.
pub fn transit_features(transit: &TransitLegResult) -> ChoiceFeatures {
    ChoiceFeatures {
        cost_cents: transit.price_cents,
        travel_seconds: Some(transit.duration_seconds),
        indoor: Tri::Unknown,
        themes: Vec::new(),
    }
}
