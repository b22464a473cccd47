//! RunState: the canonical mutable state carried through the pipeline for
//! a single run, plus the append-only message buffer used as the
//! streaming event log.

use std::collections::HashMap;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::itinerary::Itinerary;
use super::plan::{Intent, Plan};
use super::tool_results::{
    AttractionResult, FlightResult, FxRateResult, LodgingResult, TransitLegResult,
    WeatherDayResult,
};
use super::violation::Violation;

/// Status of a node (stage) event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NodeStatus {
    Running,
    Completed,
    Error,
}

/// One entry in the append-only streaming event log.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    pub node: String,
    pub status: NodeStatus,
    pub ts: DateTime<Utc>,
    pub message: Option<String>,
}

/// Repair bookkeeping carried on the RunState across the repair stage.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RepairBookkeeping {
    pub cycles_run: u32,
    pub moves_applied: u32,
    pub reuse_ratio: f64,
    pub pre_repair_snapshot: Option<Plan>,
}

/// The canonical mutable state carried through the pipeline for a single
/// run. Exclusively owned by the orchestration driver; never shared
/// across runs.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunState {
    pub trace_id: Uuid,
    pub org_id: String,
    pub user_id: String,
    pub seed: u64,
    pub intent: Intent,

    pub plan: Option<Plan>,
    pub candidates: Vec<Plan>,

    pub flights: HashMap<String, FlightResult>,
    pub lodgings: HashMap<String, LodgingResult>,
    pub attractions: HashMap<String, AttractionResult>,
    pub transit: HashMap<String, TransitLegResult>,
    pub weather: HashMap<NaiveDate, WeatherDayResult>,
    pub fx: HashMap<String, FxRateResult>,

    pub violations: Vec<Violation>,
    pub tool_call_counts: HashMap<String, u64>,

    pub repair: RepairBookkeeping,

    pub itinerary: Option<Itinerary>,
    pub done: bool,
    pub messages: Vec<Message>,
}

impl RunState {
    pub fn new(org_id: impl Into<String>, user_id: impl Into<String>, intent: Intent, seed: u64) -> Self {
        Self {
            trace_id: Uuid::new_v4(),
            org_id: org_id.into(),
            user_id: user_id.into(),
            seed,
            intent,
            plan: None,
            candidates: Vec::new(),
            flights: HashMap::new(),
            lodgings: HashMap::new(),
            attractions: HashMap::new(),
            transit: HashMap::new(),
            weather: HashMap::new(),
            fx: HashMap::new(),
            violations: Vec::new(),
            tool_call_counts: HashMap::new(),
            repair: RepairBookkeeping::default(),
            itinerary: None,
            done: false,
            messages: Vec::new(),
        }
    }

    /// Append a message to the streaming event log.
    pub fn push_message(&mut self, node: impl Into<String>, status: NodeStatus, message: Option<String>, ts: DateTime<Utc>) {
        self.messages.push(Message {
            node: node.into(),
            status,
            ts,
            message,
        });
    }

    pub fn blocking_violations(&self) -> impl Iterator<Item = &Violation> {
        self.violations.iter().filter(|v| v.blocking)
    }

    pub fn advisory_violations(&self) -> impl Iterator<Item = &Violation> {
        self.violations.iter().filter(|v| !v.blocking)
    }

    pub fn record_tool_call(&mut self, name: &str) {
        *self.tool_call_counts.entry(name.to_string()).or_insert(0) += 1;
    }
}
