//! Core crate errors — data-model and configuration validation failures.

/// Errors raised while constructing or validating core data-model values
/// and configuration.
#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    #[error("invalid intent: {0}")]
    InvalidIntent(String),

    #[error("invalid plan: {0}")]
    InvalidPlan(String),

    #[error("invalid settings: {0}")]
    InvalidSettings(String),

    #[error("unknown timezone: {0}")]
    UnknownTimezone(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("TOML parse error: {0}")]
    TomlParse(#[from] toml::de::Error),
}
