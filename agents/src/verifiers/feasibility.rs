//! Blocking timing and venue checks: zone-aware gap buffers between
//! consecutive slots, attraction opening hours, and a last-train check
//! on the final slot of each day.

use std::collections::HashMap;

use chrono::{Datelike, NaiveTime};
use tripforge_core::{AttractionResult, ChoiceKind, Plan, Violation, ViolationKind};
use chrono_tz::Tz;

const LAST_SLOT_CUTOFF: (u32, u32) = (23, 30);
const MUSEUM_BUFFER_MIN: i64 = 20;

fn is_museum(attractions: &HashMap<String, AttractionResult>, option_ref: &str) -> bool {
    attractions.get(option_ref).map(|a| a.venue_type == "museum").unwrap_or(false)
}

pub fn verify(plan: &Plan, tz: Tz, attractions: &HashMap<String, AttractionResult>) -> Vec<Violation> {
    let mut violations = Vec::new();

    for day in &plan.days {
        let sorted = day.slots_sorted();
        let weekday = day.date.weekday().num_days_from_monday() as u8;

        for window in sorted.windows(2) {
            let (prev, next) = (window[0], window[1]);
            let Some(prev_choice) = prev.selected() else { continue };
            let Some(next_choice) = next.selected() else { continue };

            let (_, prev_end) = prev.time_window.localize(day.date, tz);
            let (next_start, _) = next.time_window.localize(day.date, tz);
            let gap_min = (next_start - prev_end).num_minutes();

            let required_min = match prev_choice.kind {
                ChoiceKind::Flight => plan.assumptions.airport_buffer_min,
                ChoiceKind::Attraction if is_museum(attractions, &prev_choice.option_ref) => MUSEUM_BUFFER_MIN,
                _ => plan.assumptions.transit_buffer_min,
            };

            if gap_min < required_min {
                violations.push(
                    Violation::new(ViolationKind::TimingInfeasible, "insufficient_buffer", next_choice.option_ref.as_str(), true)
                        .with_detail("gap_minutes", gap_min)
                        .with_detail("required_minutes", required_min),
                );
            }
        }

        for slot in &sorted {
            let Some(choice) = slot.selected() else { continue };
            if !matches!(choice.kind, ChoiceKind::Attraction) {
                continue;
            }
            if let Some(record) = attractions.get(&choice.option_ref) {
                if !record.is_open_during(weekday, slot.time_window.start, slot.time_window.end) {
                    violations.push(Violation::new(
                        ViolationKind::VenueClosed,
                        "closed_during_slot",
                        choice.option_ref.as_str(),
                        true,
                    ));
                }
            }
        }

        if let Some(last) = sorted.last() {
            let cutoff = NaiveTime::from_hms_opt(LAST_SLOT_CUTOFF.0, LAST_SLOT_CUTOFF.1, 0).expect("valid cutoff time");
            let allowed_end = cutoff - chrono::Duration::minutes(plan.assumptions.transit_buffer_min);
            if last.time_window.end > allowed_end {
                if let Some(choice) = last.selected() {
                    violations.push(Violation::new(
                        ViolationKind::TimingInfeasible,
                        "last_train_missed",
                        choice.option_ref.as_str(),
                        true,
                    ));
                }
            }
        }
    }

    violations
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{NaiveDate, NaiveTime, Utc};
    use tripforge_core::{Choice, ChoiceFeatures, DayPlan, Assumptions, Provenance, Slot, TimeWindow, Tri};

    fn choice(kind: ChoiceKind, option_ref: &str) -> Choice {
        Choice {
            kind,
            option_ref: option_ref.to_string(),
            features: ChoiceFeatures { cost_cents: 0, travel_seconds: None, indoor: Tri::Unknown, themes: Vec::new() },
            score: None,
            provenance: Provenance::planner(Utc::now()),
        }
    }

    fn slot(start_h: u32, end_h: u32, kind: ChoiceKind, option_ref: &str) -> Slot {
        Slot {
            time_window: TimeWindow::new(NaiveTime::from_hms_opt(start_h, 0, 0).unwrap(), NaiveTime::from_hms_opt(end_h, 0, 0).unwrap()),
            locked: false,
            choices: vec![choice(kind, option_ref)],
        }
    }

    fn plan_with_slots(slots: Vec<Slot>) -> Plan {
        Plan {
            variant: "test".to_string(),
            days: vec![DayPlan { date: NaiveDate::from_ymd_opt(2025, 6, 2).unwrap(), slots }],
            assumptions: Assumptions { fx_rate: 1.0, daily_discretionary_cents: 0, transit_buffer_min: 15, airport_buffer_min: 120 },
            rng_seed: 1,
        }
    }

    #[test]
    fn tight_back_to_back_slots_violate_the_buffer() {
        let plan = plan_with_slots(vec![
            slot(9, 10, ChoiceKind::Attraction, "at:Paris:0"),
            slot(10, 11, ChoiceKind::Attraction, "at:Paris:1"),
        ]);
        let violations = verify(&plan, chrono_tz::Europe::Paris, &HashMap::new());
        assert!(violations.iter().any(|v| v.reason == "insufficient_buffer"));
    }

    #[test]
    fn comfortable_gap_has_no_violation() {
        let plan = plan_with_slots(vec![
            slot(9, 10, ChoiceKind::Attraction, "at:Paris:0"),
            slot(11, 12, ChoiceKind::Attraction, "at:Paris:1"),
        ]);
        let violations = verify(&plan, chrono_tz::Europe::Paris, &HashMap::new());
        assert!(violations.is_empty());
    }

    #[test]
    fn late_last_slot_misses_the_last_train() {
        let late_slot = Slot {
            time_window: TimeWindow::new(NaiveTime::from_hms_opt(22, 30, 0).unwrap(), NaiveTime::from_hms_opt(23, 45, 0).unwrap()),
            locked: false,
            choices: vec![choice(ChoiceKind::Attraction, "at:Paris:0")],
        };
        let plan = plan_with_slots(vec![late_slot]);
        let violations = verify(&plan, chrono_tz::Europe::Paris, &HashMap::new());
        assert!(violations.iter().any(|v| v.reason == "last_train_missed"));
    }

    fn attraction_record(option_ref: &str, venue_type: &str) -> AttractionResult {
        AttractionResult {
            option_ref: option_ref.to_string(),
            name: "Venue".to_string(),
            venue_type: venue_type.to_string(),
            opening_hours: HashMap::new(),
            indoor: Tri::Yes,
            kid_friendly: Tri::Unknown,
            themes: Vec::new(),
            geo: None,
            provenance: Provenance::planner(Utc::now()),
        }
    }

    fn slots_with_gap(gap_minutes: u32) -> Vec<Slot> {
        vec![
            Slot {
                time_window: TimeWindow::new(NaiveTime::from_hms_opt(9, 0, 0).unwrap(), NaiveTime::from_hms_opt(10, 0, 0).unwrap()),
                locked: false,
                choices: vec![choice(ChoiceKind::Attraction, "at:Paris:0")],
            },
            Slot {
                time_window: TimeWindow::new(NaiveTime::from_hms_opt(10, gap_minutes, 0).unwrap(), NaiveTime::from_hms_opt(18, 0, 0).unwrap()),
                locked: false,
                choices: vec![choice(ChoiceKind::Attraction, "at:Paris:1")],
            },
        ]
    }

    #[test]
    fn a_museum_needs_the_twenty_minute_buffer() {
        let plan = plan_with_slots(slots_with_gap(17));
        let mut attractions = HashMap::new();
        attractions.insert("at:Paris:0".to_string(), attraction_record("at:Paris:0", "museum"));
        let violations = verify(&plan, chrono_tz::Europe::Paris, &attractions);
        assert!(violations.iter().any(|v| v.reason == "insufficient_buffer"));
    }

    #[test]
    fn a_non_museum_attraction_only_needs_the_transit_buffer() {
        let plan = plan_with_slots(slots_with_gap(17));
        let mut attractions = HashMap::new();
        attractions.insert("at:Paris:0".to_string(), attraction_record("at:Paris:0", "park"));
        let violations = verify(&plan, chrono_tz::Europe::Paris, &attractions);
        assert!(violations.is_empty());
    }
}
