//! Intent, Plan and the day/slot structures a Plan is built from.

use chrono::{DateTime, NaiveDate, NaiveTime};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};

use super::choice::Choice;
use crate::errors::CoreError;

/// A `[start, end)` time-of-day window within a single day.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeWindow {
    pub start: NaiveTime,
    pub end: NaiveTime,
}

impl TimeWindow {
    pub fn new(start: NaiveTime, end: NaiveTime) -> Self {
        Self { start, end }
    }

    pub fn overlaps(&self, other: &TimeWindow) -> bool {
        self.start < other.end && other.start < self.end
    }

    /// Localize this window's start/end to a zone-aware instant on `date`
    /// in `tz`, so gap and DST-sensitive arithmetic never touches naive
    /// clock times directly.
    pub fn localize(&self, date: NaiveDate, tz: Tz) -> (DateTime<Tz>, DateTime<Tz>) {
        let start = date.and_time(self.start).and_local_timezone(tz).single();
        let end = date.and_time(self.end).and_local_timezone(tz).single();
        // Fall back to the earliest/latest valid mapping across a DST gap
        // rather than panicking — a plan slot that lands exactly in a
        // spring-forward gap is rare but must not crash the verifier.
        (
            start.unwrap_or_else(|| date.and_time(self.start).and_utc().with_timezone(&tz)),
            end.unwrap_or_else(|| date.and_time(self.end).and_utc().with_timezone(&tz)),
        )
    }
}

/// A slot a day's locked preference pins to a specific activity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LockedSlot {
    pub day_offset: i64,
    pub time_window: TimeWindow,
    pub activity_ref: String,
}

/// User preferences carried on the Intent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Preferences {
    pub kid_friendly: bool,
    pub themes: Vec<String>,
    pub avoid_overnight: bool,
    pub locked_slots: Vec<LockedSlot>,
}

impl Default for Preferences {
    fn default() -> Self {
        Self {
            kid_friendly: false,
            themes: Vec::new(),
            avoid_overnight: false,
            locked_slots: Vec::new(),
        }
    }
}

/// A normalized user request: destination, window, budget, preferences.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Intent {
    pub city: String,
    pub window_start: NaiveDate,
    pub window_end: NaiveDate,
    pub tz: Tz,
    pub budget_cents: i64,
    pub airports: Vec<String>,
    pub preferences: Preferences,
}

impl Intent {
    /// Validates the invariants §3 requires of an Intent: positive budget,
    /// a non-empty airport list, and a non-inverted date window.
    pub fn validate(&self) -> Result<(), CoreError> {
        if self.budget_cents <= 0 {
            return Err(CoreError::InvalidIntent(
                "budget_cents must be > 0".to_string(),
            ));
        }
        if self.airports.is_empty() {
            return Err(CoreError::InvalidIntent(
                "airports must be non-empty".to_string(),
            ));
        }
        if self.window_end < self.window_start {
            return Err(CoreError::InvalidIntent(
                "window_end must not precede window_start".to_string(),
            ));
        }
        Ok(())
    }

    /// Inclusive day count of the intent's window.
    pub fn window_days(&self) -> i64 {
        (self.window_end - self.window_start).num_days() + 1
    }
}

/// A time window within a day assigned to one ranked set of `Choice`s.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Slot {
    pub time_window: TimeWindow,
    pub locked: bool,
    /// Ranked choices; `choices[0]` is the selected option.
    pub choices: Vec<Choice>,
}

impl Slot {
    pub fn selected(&self) -> Option<&Choice> {
        self.choices.first()
    }

    pub fn selected_mut(&mut self) -> Option<&mut Choice> {
        self.choices.first_mut()
    }
}

/// A single day's ordered, non-overlapping slots.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DayPlan {
    pub date: NaiveDate,
    pub slots: Vec<Slot>,
}

impl DayPlan {
    /// Whether any two slots in this day overlap.
    pub fn has_overlap(&self) -> bool {
        for i in 0..self.slots.len() {
            for j in (i + 1)..self.slots.len() {
                if self.slots[i].time_window.overlaps(&self.slots[j].time_window) {
                    return true;
                }
            }
        }
        false
    }

    /// Slots sorted by start time; used by the feasibility verifier and
    /// the repair engine to walk a day in order.
    pub fn slots_sorted(&self) -> Vec<&Slot> {
        let mut sorted: Vec<&Slot> = self.slots.iter().collect();
        sorted.sort_by_key(|s| s.time_window.start);
        sorted
    }
}

/// Planner-chosen assumptions a Plan is built under.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Assumptions {
    pub fx_rate: f64,
    pub daily_discretionary_cents: i64,
    pub transit_buffer_min: i64,
    pub airport_buffer_min: i64,
}

/// An ordered list of days with ranked choices per slot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Plan {
    pub variant: String,
    pub days: Vec<DayPlan>,
    pub assumptions: Assumptions,
    pub rng_seed: u64,
}

impl Plan {
    /// True iff no day in the plan has overlapping slots.
    pub fn is_non_overlapping(&self) -> bool {
        self.days.iter().all(|d| !d.has_overlap())
    }

    pub fn day_count(&self) -> usize {
        self.days.len()
    }
}
