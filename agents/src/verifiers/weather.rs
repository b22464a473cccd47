//! Tri-state weather check: a known-bad day blocks any slot kind with a
//! known-outdoor choice, advises on choices with unknown indoor/outdoor
//! status, and says nothing about known-indoor ones.

use std::collections::HashMap;

use chrono::NaiveDate;
use tripforge_core::{Plan, Tri, Violation, ViolationKind, WeatherDayResult};

pub fn verify(plan: &Plan, weather: &HashMap<NaiveDate, WeatherDayResult>) -> Vec<Violation> {
    let mut violations = Vec::new();

    for day in &plan.days {
        let Some(record) = weather.get(&day.date) else { continue };
        if !record.is_bad() {
            continue;
        }

        for slot in &day.slots {
            let Some(choice) = slot.selected() else { continue };

            match choice.features.indoor {
                Tri::No => violations.push(
                    Violation::new(ViolationKind::WeatherUnsuitable, "outdoor_activity_bad_weather", choice.option_ref.as_str(), true)
                        .with_detail("precip_prob", record.precip_prob)
                        .with_detail("wind_kmh", record.wind_kmh),
                ),
                Tri::Unknown => violations.push(Violation::new(
                    ViolationKind::WeatherUnsuitable,
                    "uncertain_weather",
                    choice.option_ref.as_str(),
                    false,
                )),
                Tri::Yes => {}
            }
        }
    }

    violations
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{NaiveDate, NaiveTime, Utc};
    use tripforge_core::{Assumptions, Choice, ChoiceFeatures, ChoiceKind, DayPlan, Provenance, Slot, TimeWindow};

    fn weather_record(date: NaiveDate, precip_prob: f64, wind_kmh: f64) -> WeatherDayResult {
        WeatherDayResult { date, precip_prob, wind_kmh, provenance: Provenance::fixture(Utc::now(), "weather:test") }
    }

    fn choice_with(kind: ChoiceKind, indoor: Tri) -> Choice {
        Choice {
            kind,
            option_ref: "at:Paris:0".to_string(),
            features: ChoiceFeatures { cost_cents: 0, travel_seconds: None, indoor, themes: Vec::new() },
            score: None,
            provenance: Provenance::planner(Utc::now()),
        }
    }

    fn attraction_choice(indoor: Tri) -> Choice {
        choice_with(ChoiceKind::Attraction, indoor)
    }

    fn plan_with_choice(date: NaiveDate, choice: Choice) -> Plan {
        Plan {
            variant: "test".to_string(),
            days: vec![DayPlan {
                date,
                slots: vec![Slot {
                    time_window: TimeWindow::new(NaiveTime::from_hms_opt(9, 0, 0).unwrap(), NaiveTime::from_hms_opt(11, 0, 0).unwrap()),
                    locked: false,
                    choices: vec![choice],
                }],
            }],
            assumptions: Assumptions { fx_rate: 1.0, daily_discretionary_cents: 0, transit_buffer_min: 15, airport_buffer_min: 120 },
            rng_seed: 1,
        }
    }

    fn plan_for(date: NaiveDate, indoor: Tri) -> Plan {
        plan_with_choice(date, attraction_choice(indoor))
    }

    #[test]
    fn outdoor_activity_on_a_bad_day_is_blocking() {
        let date = NaiveDate::from_ymd_opt(2025, 6, 1).unwrap();
        let plan = plan_for(date, Tri::No);
        let mut weather = HashMap::new();
        weather.insert(date, weather_record(date, 0.9, 5.0));
        let violations = verify(&plan, &weather);
        assert_eq!(violations.len(), 1);
        assert!(violations[0].blocking);
    }

    #[test]
    fn unknown_indoor_status_on_a_bad_day_is_advisory() {
        let date = NaiveDate::from_ymd_opt(2025, 6, 1).unwrap();
        let plan = plan_for(date, Tri::Unknown);
        let mut weather = HashMap::new();
        weather.insert(date, weather_record(date, 0.9, 5.0));
        let violations = verify(&plan, &weather);
        assert_eq!(violations.len(), 1);
        assert!(!violations[0].blocking);
    }

    #[test]
    fn indoor_activity_on_a_bad_day_is_silent() {
        let date = NaiveDate::from_ymd_opt(2025, 6, 1).unwrap();
        let plan = plan_for(date, Tri::Yes);
        let mut weather = HashMap::new();
        weather.insert(date, weather_record(date, 0.9, 5.0));
        assert!(verify(&plan, &weather).is_empty());
    }

    #[test]
    fn good_weather_day_is_never_checked() {
        let date = NaiveDate::from_ymd_opt(2025, 6, 1).unwrap();
        let plan = plan_for(date, Tri::No);
        let mut weather = HashMap::new();
        weather.insert(date, weather_record(date, 0.05, 5.0));
        assert!(verify(&plan, &weather).is_empty());
    }

    #[test]
    fn a_non_attraction_slot_is_checked_too() {
        let date = NaiveDate::from_ymd_opt(2025, 6, 1).unwrap();
        let plan = plan_with_choice(date, choice_with(ChoiceKind::Transit, Tri::No));
        let mut weather = HashMap::new();
        weather.insert(date, weather_record(date, 0.9, 5.0));
        let violations = verify(&plan, &weather);
        assert_eq!(violations.len(), 1);
        assert!(violations[0].blocking);
    }
}
