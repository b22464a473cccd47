//! Tool execution errors.

/// Recoverable vs terminal tool failures, surfaced by a `ToolCallable`.
#[derive(Debug, Clone, thiserror::Error)]
pub enum ToolError {
    #[error("connection error: {0}")]
    ConnectionError(String),

    #[error("temporary error: {0}")]
    TemporaryError(String),

    #[error("timeout error: {0}")]
    TimeoutError(String),

    #[error("validation error: {0}")]
    ValidationError(String),

    #[error("not found: {0}")]
    NotFound(String),
}

impl ToolError {
    /// Whether this error type belongs to the recoverable set the
    /// executor's attempt loop is allowed to retry.
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            ToolError::ConnectionError(_) | ToolError::TemporaryError(_) | ToolError::TimeoutError(_)
        )
    }

    pub fn type_name(&self) -> &'static str {
        match self {
            ToolError::ConnectionError(_) => "ConnectionError",
            ToolError::TemporaryError(_) => "TemporaryError",
            ToolError::TimeoutError(_) => "TimeoutError",
            ToolError::ValidationError(_) => "ValidationError",
            ToolError::NotFound(_) => "NotFound",
        }
    }
}
