//! Constraint violations: not errors, but first-class data differentiated
//! by `blocking`.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ViolationKind {
    BudgetExceeded,
    TimingInfeasible,
    VenueClosed,
    WeatherUnsuitable,
    PrefViolated,
}

/// A constraint failure, either blocking (must-fix) or advisory (warning).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Violation {
    pub kind: ViolationKind,
    /// The specific sub-reason, e.g. `"last_train_missed"`,
    /// `"uncertain_weather"`, `"late_night_activity"`.
    pub reason: String,
    /// Typically the offending `option_ref`, or a sentinel like `"budget"`.
    pub node_ref: String,
    pub details: HashMap<String, Value>,
    pub blocking: bool,
}

impl Violation {
    pub fn new(
        kind: ViolationKind,
        reason: impl Into<String>,
        node_ref: impl Into<String>,
        blocking: bool,
    ) -> Self {
        Self {
            kind,
            reason: reason.into(),
            node_ref: node_ref.into(),
            details: HashMap::new(),
            blocking,
        }
    }

    pub fn with_detail(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.details.insert(key.into(), value.into());
        self
    }
}
