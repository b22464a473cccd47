//! The staged orchestration pipeline: intent validation, planning,
//! selection, tool execution, verification, repair, synthesis, and the
//! driver that sequences them.

pub mod driver;
pub mod errors;
pub mod event_sink;
pub mod planner;
pub mod repair;
pub mod run_store;
pub mod selector;
pub mod synthesizer;
pub mod tool_exec;
pub mod verifiers;

pub use driver::{Driver, DriverOutcome};
pub use errors::StageError;
pub use event_sink::{EventRecord, EventSink, InMemoryEventSink, TracingEventSink};
pub use planner::{build_candidate_plans, derive_seed};
pub use repair::{diff_to_value, repair as run_repair, RepairDiff, RepairOutcome};
pub use run_store::{InMemoryRunStore, RunRecord, RunStatus, RunStore, RunUpdate};
pub use selector::{score, FeatureVector, ScoredPlan};
pub use synthesizer::{synthesize, SynthesisMetrics};
pub use tool_exec::ToolRegistry;
pub use verifiers::verify_all;
