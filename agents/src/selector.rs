//! Scores candidate plans against frozen baseline statistics and ranks
//! them descending. Pure: no tool calls, no randomness beyond what the
//! plans already carry.

use tripforge_core::{ChoiceKind, Intent, Plan};

/// A candidate plan together with its aggregate feature vector and the
/// final weighted score used to rank it.
#[derive(Debug, Clone)]
pub struct ScoredPlan {
    pub plan: Plan,
    pub features: FeatureVector,
    pub score: f64,
}

#[derive(Debug, Clone, Copy)]
pub struct FeatureVector {
    pub cost_total_cents: i64,
    pub travel_time_mean_seconds: f64,
    pub theme_match: f64,
    pub indoor_pref_mean: f64,
    pub cost_weight: f64,
    pub z_cost: f64,
    pub z_travel: f64,
    pub z_theme: f64,
    pub z_indoor: f64,
}

/// Frozen baseline mean/std used to z-score every candidate. These are
/// fixed reference statistics, never recomputed from the candidate set
/// itself — recomputing them per run would make scores incomparable
/// across runs with different fan-outs.
struct Baseline {
    mean: f64,
    std: f64,
}

const COST_BASELINE: Baseline = Baseline { mean: 3500.0, std: 1800.0 };
const TRAVEL_BASELINE: Baseline = Baseline { mean: 1800.0, std: 600.0 };
const THEME_BASELINE: Baseline = Baseline { mean: 0.6, std: 0.3 };
const INDOOR_BASELINE: Baseline = Baseline { mean: 0.0, std: 1.0 };

/// Daily discretionary spend ($230/day) the budget ratio is measured
/// against, fixed so the cost weight is comparable across runs.
const BUDGET_BASELINE_CENTS_PER_DAY: f64 = 23_000.0;

fn z_score(value: f64, baseline: &Baseline) -> f64 {
    if baseline.std == 0.0 {
        0.0
    } else {
        (value - baseline.mean) / baseline.std
    }
}

/// Tiers the trip's overall budget-per-day against the baseline, once per
/// run. Does not vary per candidate: every plan shares the same intent
/// and trip length.
fn cost_weight_for_intent(intent: &Intent) -> f64 {
    let trip_days = intent.window_days().max(1) as f64;
    let budget_per_day = intent.budget_cents as f64 / trip_days;
    let ratio = budget_per_day / BUDGET_BASELINE_CENTS_PER_DAY;
    if ratio < 1.0 {
        -1.5
    } else if ratio < 1.5 {
        -1.0
    } else if ratio < 3.0 {
        -0.3
    } else {
        0.5
    }
}

fn aggregate(plan: &Plan, intent_themes: &[String], cost_weight: f64) -> FeatureVector {
    let mut cost_total_cents = 0i64;
    let mut travel_samples = Vec::new();
    let mut themes_seen = std::collections::HashSet::new();
    let mut indoor_samples = Vec::new();

    for day in &plan.days {
        for slot in &day.slots {
            if let Some(choice) = slot.selected() {
                cost_total_cents += choice.features.cost_cents;
                if let Some(seconds) = choice.features.travel_seconds {
                    travel_samples.push(seconds as f64);
                }
                if matches!(choice.kind, ChoiceKind::Attraction) {
                    indoor_samples.push(choice.features.indoor.as_signed_unit());
                    for theme in &choice.features.themes {
                        if intent_themes.is_empty() || intent_themes.contains(theme) {
                            themes_seen.insert(theme.clone());
                        }
                    }
                }
            }
        }
    }

    let travel_time_mean_seconds = if travel_samples.is_empty() {
        0.0
    } else {
        travel_samples.iter().sum::<f64>() / travel_samples.len() as f64
    };
    let theme_match = themes_seen.len() as f64 / 5.0;
    let indoor_pref_mean = if indoor_samples.is_empty() {
        0.0
    } else {
        indoor_samples.iter().sum::<f64>() / indoor_samples.len() as f64
    };

    FeatureVector {
        cost_total_cents,
        travel_time_mean_seconds,
        theme_match,
        indoor_pref_mean,
        cost_weight,
        z_cost: z_score(cost_total_cents as f64, &COST_BASELINE),
        z_travel: z_score(travel_time_mean_seconds, &TRAVEL_BASELINE),
        z_theme: z_score(theme_match, &THEME_BASELINE),
        z_indoor: z_score(indoor_pref_mean, &INDOOR_BASELINE),
    }
}

fn weighted_score(features: &FeatureVector) -> f64 {
    features.cost_weight * features.z_cost
        + (-0.5) * features.z_travel
        + 1.5 * features.z_theme
        + 0.3 * features.z_indoor
}

/// Score and rank candidates descending by weighted score. Logs the
/// feature vector of the winner plus up to two runners-up.
pub fn score(candidates: Vec<Plan>, intent: &Intent) -> Vec<ScoredPlan> {
    let cost_weight = cost_weight_for_intent(intent);

    let mut scored: Vec<ScoredPlan> = candidates
        .into_iter()
        .map(|plan| {
            let features = aggregate(&plan, &intent.preferences.themes, cost_weight);
            let score = weighted_score(&features);
            ScoredPlan { plan, features, score }
        })
        .collect();

    scored.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(std::cmp::Ordering::Equal));

    if let Some(winner) = scored.first() {
        tracing::info!(
            variant = %winner.plan.variant,
            score = winner.score,
            cost_weight = winner.features.cost_weight,
            "selector chose plan"
        );
    }
    for runner_up in scored.iter().skip(1).take(2) {
        tracing::info!(
            variant = %runner_up.plan.variant,
            score = runner_up.score,
            cost_weight = runner_up.features.cost_weight,
            "selector discarded plan"
        );
    }

    scored
}
