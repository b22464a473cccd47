//! Canonical data model shared across the pipeline.

mod choice;
mod itinerary;
mod plan;
mod provenance;
mod run_state;
mod tool_results;
mod tri;
mod violation;

pub use choice::{Choice, ChoiceFeatures, ChoiceKind};
pub use itinerary::{Activity, CostBreakdown, Citation, DayItinerary, Decision, Itinerary, CURRENCY_DISCLAIMER};
pub use plan::{Assumptions, DayPlan, Intent, LockedSlot, Plan, Preferences, Slot, TimeWindow};
pub use provenance::{Provenance, ProvenanceSource};
pub use run_state::{Message, NodeStatus, RepairBookkeeping, RunState};
pub use tool_results::{
    AttractionResult, FlightResult, FxRateResult, LodgingResult, TransitLegResult,
    WeatherDayResult,
};
pub use tri::Tri;
pub use violation::{Violation, ViolationKind};
