//! Preference checks: blocking must-haves (`avoid_overnight`,
//! `kid_friendly`) and an advisory nice-to-have (theme overlap).

use std::collections::HashMap;

use chrono::Timelike;
use tripforge_core::{AttractionResult, ChoiceKind, FlightResult, Plan, Preferences, Tri, Violation, ViolationKind};

const LATE_NIGHT_HOUR: u32 = 20;
const THEME_OVERLAP_MIN: f64 = 0.5;

pub fn verify(
    plan: &Plan,
    preferences: &Preferences,
    flights: &HashMap<String, FlightResult>,
    attractions: &HashMap<String, AttractionResult>,
) -> Vec<Violation> {
    let mut violations = Vec::new();

    if preferences.avoid_overnight {
        for day in &plan.days {
            for slot in &day.slots {
                let Some(choice) = slot.selected() else { continue };
                if !matches!(choice.kind, ChoiceKind::Flight) {
                    continue;
                }
                if flights.get(&choice.option_ref).is_some_and(|f| f.overnight) {
                    violations.push(Violation::new(
                        ViolationKind::PrefViolated,
                        "avoid_overnight_violated",
                        choice.option_ref.as_str(),
                        true,
                    ));
                }
            }
        }
    }

    if preferences.kid_friendly {
        for day in &plan.days {
            for slot in &day.slots {
                let Some(choice) = slot.selected() else { continue };
                if slot.time_window.end.hour() >= LATE_NIGHT_HOUR {
                    violations.push(Violation::new(
                        ViolationKind::PrefViolated,
                        "late_night_activity",
                        choice.option_ref.as_str(),
                        true,
                    ));
                }
                if !matches!(choice.kind, ChoiceKind::Attraction) {
                    continue;
                }
                if let Some(record) = attractions.get(&choice.option_ref) {
                    match record.kid_friendly {
                        Tri::No => violations.push(Violation::new(
                            ViolationKind::PrefViolated,
                            "not_kid_friendly",
                            choice.option_ref.as_str(),
                            true,
                        )),
                        Tri::Unknown => violations.push(Violation::new(
                            ViolationKind::PrefViolated,
                            "uncertain_kid_friendly",
                            choice.option_ref.as_str(),
                            false,
                        )),
                        Tri::Yes => {}
                    }
                }
            }
        }
    }

    if !preferences.themes.is_empty() {
        let mut matched = 0usize;
        let mut total = 0usize;
        for day in &plan.days {
            for slot in &day.slots {
                let Some(choice) = slot.selected() else { continue };
                if !matches!(choice.kind, ChoiceKind::Attraction) {
                    continue;
                }
                total += 1;
                if choice.features.themes.iter().any(|t| preferences.themes.contains(t)) {
                    matched += 1;
                }
            }
        }
        let overlap = if total == 0 { 1.0 } else { matched as f64 / total as f64 };
        if overlap < THEME_OVERLAP_MIN {
            violations.push(
                Violation::new(ViolationKind::PrefViolated, "low_theme_match", "preferences", false)
                    .with_detail("overlap", overlap),
            );
        }
    }

    violations
}
