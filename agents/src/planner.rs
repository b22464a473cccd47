//! Builds 1..FANOUT candidate plans from an intent. Pure and
//! deterministic: the same intent always produces byte-equal plans.

use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};

use chrono::{Duration as ChronoDuration, NaiveDate, NaiveTime};
use tripforge_core::{
    Assumptions, Choice, ChoiceFeatures, ChoiceKind, DayPlan, Intent, Plan, Provenance, Slot,
    TimeWindow, Tri,
};

/// Destination airport codes for the fixture cities this workspace ships
/// data for; any other city falls back to an uppercased three-letter
/// stub so the planner still produces a structurally valid plan.
fn destination_airport(city: &str) -> String {
    match city {
        "Paris" => "CDG".to_string(),
        "Tokyo" => "NRT".to_string(),
        other => other.chars().filter(|c| c.is_alphabetic()).take(3).collect::<String>().to_uppercase(),
    }
}

struct VariantSpec {
    name: &'static str,
    cost_multiplier: f64,
    density: f64,
    daily_spend_cents: i64,
    fx_rate: f64,
}

const VARIANTS: &[VariantSpec] = &[
    VariantSpec { name: "cost-conscious", cost_multiplier: 0.7, density: 0.8, daily_spend_cents: 8_000, fx_rate: 1.0 },
    VariantSpec { name: "convenience", cost_multiplier: 1.0, density: 1.0, daily_spend_cents: 12_000, fx_rate: 1.0 },
    VariantSpec { name: "experience", cost_multiplier: 1.3, density: 1.1, daily_spend_cents: 18_000, fx_rate: 1.0 },
    VariantSpec { name: "relaxed", cost_multiplier: 0.9, density: 0.6, daily_spend_cents: 10_000, fx_rate: 1.0 },
];

/// Stable hash over `{city, window.start, budget, sorted airports,
/// kid_friendly, sorted themes}`, used to seed every deterministic choice
/// the planner and selector make downstream.
pub fn derive_seed(intent: &Intent) -> u64 {
    let mut hasher = DefaultHasher::new();
    intent.city.hash(&mut hasher);
    intent.window_start.hash(&mut hasher);
    intent.budget_cents.hash(&mut hasher);
    let mut airports = intent.airports.clone();
    airports.sort();
    airports.hash(&mut hasher);
    intent.preferences.kid_friendly.hash(&mut hasher);
    let mut themes = intent.preferences.themes.clone();
    themes.sort();
    themes.hash(&mut hasher);
    hasher.finish()
}

fn select_variants(intent: &Intent, fanout_cap: usize) -> Vec<&'static VariantSpec> {
    let mut chosen = vec![&VARIANTS[0]];
    if intent.budget_cents > 100_000 {
        chosen.push(&VARIANTS[1]);
    }
    if intent.budget_cents > 200_000 {
        chosen.push(&VARIANTS[2]);
    }
    if intent.preferences.themes.len() > 1 {
        chosen.push(&VARIANTS[3]);
    }
    chosen.truncate(fanout_cap);
    chosen
}

const MORNING: (u32, u32) = (9, 12);
const AFTERNOON: (u32, u32) = (13, 17);
const EVENING: (u32, u32) = (18, 20);

fn window(start_hour: u32, end_hour: u32) -> TimeWindow {
    TimeWindow::new(
        NaiveTime::from_hms_opt(start_hour, 0, 0).expect("fixture hour in range"),
        NaiveTime::from_hms_opt(end_hour, 0, 0).expect("fixture hour in range"),
    )
}

/// Build the candidate plans for `intent`, truncated to at most
/// `fanout_cap` variants.
pub fn build_candidate_plans(intent: &Intent, fanout_cap: usize, fetched_at: chrono::DateTime<chrono::Utc>) -> Vec<Plan> {
    let seed = derive_seed(intent);
    let day_count = intent.window_days().clamp(4, 7) as usize;
    let variants = select_variants(intent, fanout_cap);

    variants
        .into_iter()
        .map(|variant| build_variant(intent, variant, day_count, seed, fetched_at))
        .collect()
}

fn build_variant(
    intent: &Intent,
    variant: &VariantSpec,
    day_count: usize,
    seed: u64,
    fetched_at: chrono::DateTime<chrono::Utc>,
) -> Plan {
    let origin = intent.airports.first().cloned().unwrap_or_default();
    let destination = destination_airport(&intent.city);
    let provenance = Provenance::planner(fetched_at);

    let mut days = Vec::with_capacity(day_count);
    for day_index in 0..day_count {
        let date = intent.window_start + ChronoDuration::days(day_index as i64);
        let mut slots = build_locked_slots(intent, day_index as i64);

        if day_index == 0 {
            try_push_slot(&mut slots, flight_slot(&origin, &destination, variant, &provenance, true));
        }
        if day_index + 1 == day_count {
            try_push_slot(&mut slots, flight_slot(&destination, &origin, variant, &provenance, false));
        } else {
            try_push_slot(&mut slots, lodging_slot(&intent.city, day_index, variant, &provenance));
        }

        if variant.density >= 0.5 {
            try_push_slot(&mut slots, attraction_slot(&intent.city, day_index, 0, MORNING, variant, &provenance));
        }
        if variant.density >= 0.8 {
            try_push_slot(&mut slots, attraction_slot(&intent.city, day_index, 1, AFTERNOON, variant, &provenance));
        }
        if variant.density >= 1.0 {
            try_push_slot(&mut slots, transit_slot(&intent.city, day_index, variant, &provenance));
        }

        days.push(DayPlan { date, slots });
    }

    Plan {
        variant: variant.name.to_string(),
        days,
        assumptions: Assumptions {
            fx_rate: variant.fx_rate,
            daily_discretionary_cents: variant.daily_spend_cents,
            transit_buffer_min: 15,
            airport_buffer_min: 120,
        },
        rng_seed: seed,
    }
}

fn try_push_slot(slots: &mut Vec<Slot>, candidate: Slot) {
    let overlaps = slots.iter().any(|s| s.time_window.overlaps(&candidate.time_window));
    if !overlaps {
        slots.push(candidate);
    }
}

fn build_locked_slots(intent: &Intent, day_offset: i64) -> Vec<Slot> {
    intent
        .preferences
        .locked_slots
        .iter()
        .filter(|locked| locked.day_offset == day_offset)
        .map(|locked| Slot {
            time_window: locked.time_window,
            locked: true,
            choices: vec![Choice {
                kind: ChoiceKind::Attraction,
                option_ref: locked.activity_ref.clone(),
                features: ChoiceFeatures { cost_cents: 0, travel_seconds: None, indoor: Tri::Unknown, themes: Vec::new() },
                score: None,
                provenance: Provenance::planner(intent.window_start.and_time(NaiveTime::MIN).and_utc()),
            }],
        })
        .collect()
}

fn flight_slot(origin: &str, destination: &str, variant: &VariantSpec, provenance: &Provenance, outbound: bool) -> Slot {
    let time_window = if outbound { window(MORNING.0.saturating_sub(3), MORNING.0) } else { window(EVENING.1, EVENING.1 + 2) };
    let base_cost = 60_000.0 * variant.cost_multiplier;
    Slot {
        time_window,
        locked: false,
        choices: vec![Choice {
            kind: ChoiceKind::Flight,
            option_ref: format!("fl:{origin}:{destination}"),
            features: ChoiceFeatures { cost_cents: base_cost as i64, travel_seconds: Some(8 * 3600), indoor: Tri::Unknown, themes: Vec::new() },
            score: None,
            provenance: provenance.clone(),
        }],
    }
}

fn lodging_slot(city: &str, day_index: usize, variant: &VariantSpec, provenance: &Provenance) -> Slot {
    let index = day_index % 2;
    let base_cost = 12_000.0 * variant.cost_multiplier;
    Slot {
        time_window: window(21, 23),
        locked: false,
        choices: vec![Choice {
            kind: ChoiceKind::Lodging,
            option_ref: format!("lg:{city}:{index}"),
            features: ChoiceFeatures { cost_cents: base_cost as i64, travel_seconds: None, indoor: Tri::Yes, themes: Vec::new() },
            score: None,
            provenance: provenance.clone(),
        }],
    }
}

fn attraction_slot(
    city: &str,
    day_index: usize,
    bucket: usize,
    hours: (u32, u32),
    variant: &VariantSpec,
    provenance: &Provenance,
) -> Slot {
    let index = (day_index + bucket) % 2;
    let base_cost = 2_000.0 * variant.cost_multiplier;
    Slot {
        time_window: window(hours.0, hours.1),
        locked: false,
        choices: vec![Choice {
            kind: ChoiceKind::Attraction,
            option_ref: format!("at:{city}:{index}"),
            features: ChoiceFeatures { cost_cents: base_cost as i64, travel_seconds: None, indoor: Tri::Unknown, themes: Vec::new() },
            score: None,
            provenance: provenance.clone(),
        }],
    }
}

fn transit_slot(city: &str, day_index: usize, variant: &VariantSpec, provenance: &Provenance) -> Slot {
    let index = day_index % 2;
    let base_cost = 500.0 * variant.cost_multiplier;
    Slot {
        time_window: window(17, 18),
        locked: false,
        choices: vec![Choice {
            kind: ChoiceKind::Transit,
            option_ref: format!("tr:{city}:{index}"),
            features: ChoiceFeatures { cost_cents: base_cost as i64, travel_seconds: Some(1_200), indoor: Tri::Unknown, themes: Vec::new() },
            score: None,
            provenance: provenance.clone(),
        }],
    }
}
