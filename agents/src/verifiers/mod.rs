//! The verifier suite: four pure, independent checks run in a fixed
//! order and concatenated. Each reads only the selected (first) choice
//! per slot plus whatever tool-result dictionaries it needs.

mod budget;
mod feasibility;
mod preferences;
mod weather;

use tripforge_core::{RunState, Violation};

/// Run every verifier against the run state's current plan and append
/// their violations, in the fixed budget/feasibility/weather/preferences
/// order the repair engine's priority list expects.
pub fn verify_all(state: &RunState) -> Vec<Violation> {
    let Some(plan) = state.plan.as_ref() else { return Vec::new() };

    let mut violations = Vec::new();
    violations.extend(budget::verify(plan, state.intent.budget_cents));
    violations.extend(feasibility::verify(plan, state.intent.tz, &state.attractions));
    violations.extend(weather::verify(plan, &state.weather));
    violations.extend(preferences::verify(plan, &state.intent.preferences, &state.flights, &state.attractions));
    violations
}
