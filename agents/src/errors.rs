//! Stage and driver errors.

#[derive(Debug, thiserror::Error)]
pub enum StageError {
    #[error("invalid intent: {0}")]
    InvalidIntent(String),

    #[error("planner produced no candidate plans")]
    NoCandidates,

    #[error("tool execution failed for '{tool}': {reason}")]
    ToolFailed { tool: String, reason: String },

    #[error("repair budget exhausted with {remaining} blocking violations outstanding")]
    RepairIncomplete { remaining: usize },

    #[error("synthesis failed: {0}")]
    SynthesisFailed(String),

    #[error(transparent)]
    Core(#[from] tripforge_core::CoreError),
}
