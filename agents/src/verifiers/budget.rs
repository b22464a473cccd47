//! Blocking budget check: sums every selected choice's cost plus the
//! plan's daily discretionary estimate and compares against a 10%
//! tolerance over the intent's stated budget.

use tripforge_core::{ChoiceKind, Plan, Violation, ViolationKind};

const TOLERANCE: f64 = 1.10;

pub fn verify(plan: &Plan, budget_cents: i64) -> Vec<Violation> {
    let mut flight_cents = 0i64;
    let mut lodging_cents = 0i64;
    let mut attraction_cents = 0i64;
    let mut transit_cents = 0i64;

    for day in &plan.days {
        for slot in &day.slots {
            let Some(choice) = slot.selected() else { continue };
            match choice.kind {
                ChoiceKind::Flight => flight_cents += choice.features.cost_cents,
                ChoiceKind::Lodging => lodging_cents += choice.features.cost_cents,
                ChoiceKind::Attraction => attraction_cents += choice.features.cost_cents,
                ChoiceKind::Transit => transit_cents += choice.features.cost_cents,
                ChoiceKind::Meal => attraction_cents += choice.features.cost_cents,
            }
        }
    }

    let discretionary_cents = plan.assumptions.daily_discretionary_cents * plan.day_count() as i64;
    let total_cents = flight_cents + lodging_cents + attraction_cents + transit_cents + discretionary_cents;
    let limit_cents = (budget_cents as f64 * TOLERANCE) as i64;

    if total_cents <= limit_cents {
        return Vec::new();
    }

    let violation = Violation::new(ViolationKind::BudgetExceeded, "total_over_budget", "budget", true)
        .with_detail("flight_cents", flight_cents)
        .with_detail("lodging_cents", lodging_cents)
        .with_detail("attraction_cents", attraction_cents)
        .with_detail("transit_cents", transit_cents)
        .with_detail("discretionary_cents", discretionary_cents)
        .with_detail("total_cents", total_cents)
        .with_detail("over_by_usd_cents", total_cents - budget_cents);

    vec![violation]
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use tripforge_core::{Intent, Preferences};

    fn sample_plan(budget_cents: i64) -> Plan {
        let intent = Intent {
            city: "Paris".to_string(),
            window_start: chrono::NaiveDate::from_ymd_opt(2025, 6, 1).unwrap(),
            window_end: chrono::NaiveDate::from_ymd_opt(2025, 6, 4).unwrap(),
            tz: chrono_tz::Europe::Paris,
            budget_cents,
            airports: vec!["JFK".to_string()],
            preferences: Preferences::default(),
        };
        crate::planner::build_candidate_plans(&intent, 1, Utc::now()).into_iter().next().unwrap()
    }

    #[test]
    fn generous_budget_produces_no_violation() {
        let plan = sample_plan(10_000_000);
        assert!(verify(&plan, 10_000_000).is_empty());
    }

    #[test]
    fn tiny_budget_is_flagged_as_blocking() {
        let plan = sample_plan(1_000);
        let violations = verify(&plan, 1_000);
        assert_eq!(violations.len(), 1);
        assert!(violations[0].blocking);
        assert_eq!(violations[0].kind, ViolationKind::BudgetExceeded);
    }
}
