//! Layered settings: compiled-in defaults, an optional TOML file, then
//! `TRIPFORGE_*` environment variable overrides. Mirrors the
//! defaults-then-file-then-env loading order used elsewhere in this
//! workspace's configuration management.

use std::env;
use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::errors::CoreError;

/// Every tunable knob the orchestration pipeline and tool executor read.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Settings {
    /// Per-attempt soft timeout for a tool invocation, in seconds.
    pub soft_timeout_s: f64,
    /// Total executor budget for one `execute()` call, in seconds.
    pub hard_timeout_s: f64,

    /// Minimum retry backoff jitter, in milliseconds.
    pub retry_jitter_min_ms: u64,
    /// Maximum retry backoff jitter, in milliseconds.
    pub retry_jitter_max_ms: u64,

    /// Consecutive failures before a per-tool breaker opens.
    pub breaker_failure_threshold: u32,
    /// Rolling window considered for breaker failure counting, in seconds.
    pub breaker_window_seconds: u64,
    /// Cooldown before an open breaker allows a half-open probe, in seconds.
    pub breaker_cooldown_seconds: u64,

    /// TTL for cached FX rates, in hours.
    pub fx_ttl_hours: u64,
    /// TTL for cached weather forecasts, in hours.
    pub weather_ttl_hours: u64,

    /// Required buffer after a flight slot, in minutes.
    pub airport_buffer_min: i64,
    /// Default buffer between slots absent a more specific rule, in minutes.
    pub transit_buffer_min: i64,

    /// Maximum number of candidate plans the planner may emit.
    pub fanout_cap: usize,

    /// Time-to-first-event budget, in milliseconds (informational).
    pub ttfe_budget_ms: u64,
    /// End-to-end p50 latency budget, in seconds (informational).
    pub e2e_p50_budget_s: u64,
    /// End-to-end p95 latency budget, in seconds (informational).
    pub e2e_p95_budget_s: u64,

    /// Seed used by evaluation/golden-path harnesses.
    pub eval_rng_seed: u64,

    /// `tracing_subscriber::EnvFilter` default when `RUST_LOG` is unset.
    pub log_level: String,

    /// Path the settings were loaded from, if any. Not itself loaded from
    /// the file or environment; set by `load()` for diagnostics.
    #[serde(skip)]
    pub config_path: Option<std::path::PathBuf>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            soft_timeout_s: 2.0,
            hard_timeout_s: 4.0,
            retry_jitter_min_ms: 200,
            retry_jitter_max_ms: 500,
            breaker_failure_threshold: 5,
            breaker_window_seconds: 60,
            breaker_cooldown_seconds: 30,
            fx_ttl_hours: 24,
            weather_ttl_hours: 24,
            airport_buffer_min: 120,
            transit_buffer_min: 15,
            fanout_cap: 4,
            ttfe_budget_ms: 800,
            e2e_p50_budget_s: 6,
            e2e_p95_budget_s: 10,
            eval_rng_seed: 42,
            log_level: "info".to_string(),
            config_path: None,
        }
    }
}

impl Settings {
    /// Load defaults, then overlay an optional TOML file, then overlay
    /// `TRIPFORGE_*` environment variables.
    pub fn load(config_path: Option<&Path>) -> Result<Self, CoreError> {
        let mut settings = Self::default();

        if let Some(path) = config_path {
            if path.exists() {
                let text = fs::read_to_string(path)?;
                settings = toml::from_str(&text)?;
            }
        }

        settings.apply_env_overrides();
        settings.validate()?;
        settings.config_path = config_path.map(Path::to_path_buf);
        Ok(settings)
    }

    fn apply_env_overrides(&mut self) {
        macro_rules! override_parsed {
            ($field:ident, $env:literal) => {
                if let Ok(raw) = env::var($env) {
                    if let Ok(parsed) = raw.parse() {
                        self.$field = parsed;
                    }
                }
            };
        }

        override_parsed!(soft_timeout_s, "TRIPFORGE_SOFT_TIMEOUT_S");
        override_parsed!(hard_timeout_s, "TRIPFORGE_HARD_TIMEOUT_S");
        override_parsed!(retry_jitter_min_ms, "TRIPFORGE_RETRY_JITTER_MIN_MS");
        override_parsed!(retry_jitter_max_ms, "TRIPFORGE_RETRY_JITTER_MAX_MS");
        override_parsed!(
            breaker_failure_threshold,
            "TRIPFORGE_BREAKER_FAILURE_THRESHOLD"
        );
        override_parsed!(breaker_window_seconds, "TRIPFORGE_BREAKER_WINDOW_SECONDS");
        override_parsed!(
            breaker_cooldown_seconds,
            "TRIPFORGE_BREAKER_COOLDOWN_SECONDS"
        );
        override_parsed!(fx_ttl_hours, "TRIPFORGE_FX_TTL_HOURS");
        override_parsed!(weather_ttl_hours, "TRIPFORGE_WEATHER_TTL_HOURS");
        override_parsed!(airport_buffer_min, "TRIPFORGE_AIRPORT_BUFFER_MIN");
        override_parsed!(transit_buffer_min, "TRIPFORGE_TRANSIT_BUFFER_MIN");
        override_parsed!(fanout_cap, "TRIPFORGE_FANOUT_CAP");
        override_parsed!(eval_rng_seed, "TRIPFORGE_EVAL_RNG_SEED");

        if let Ok(level) = env::var("TRIPFORGE_LOG_LEVEL") {
            self.log_level = level;
        }
    }

    /// Reject nonsensical combinations before the pipeline starts.
    pub fn validate(&self) -> Result<(), CoreError> {
        if self.soft_timeout_s <= 0.0 || self.hard_timeout_s <= 0.0 {
            return Err(CoreError::InvalidSettings(
                "timeouts must be positive".to_string(),
            ));
        }
        if self.soft_timeout_s > self.hard_timeout_s {
            return Err(CoreError::InvalidSettings(
                "soft_timeout_s must not exceed hard_timeout_s".to_string(),
            ));
        }
        if self.retry_jitter_min_ms > self.retry_jitter_max_ms {
            return Err(CoreError::InvalidSettings(
                "retry_jitter_min_ms must not exceed retry_jitter_max_ms".to_string(),
            ));
        }
        if self.breaker_failure_threshold == 0 {
            return Err(CoreError::InvalidSettings(
                "breaker_failure_threshold must be > 0".to_string(),
            ));
        }
        if self.fanout_cap == 0 {
            return Err(CoreError::InvalidSettings(
                "fanout_cap must be > 0".to_string(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_specification() {
        let settings = Settings::default();
        assert_eq!(settings.soft_timeout_s, 2.0);
        assert_eq!(settings.hard_timeout_s, 4.0);
        assert_eq!(settings.retry_jitter_min_ms, 200);
        assert_eq!(settings.retry_jitter_max_ms, 500);
        assert_eq!(settings.breaker_failure_threshold, 5);
        assert_eq!(settings.breaker_cooldown_seconds, 30);
        assert_eq!(settings.fanout_cap, 4);
        assert_eq!(settings.eval_rng_seed, 42);
    }

    #[test]
    fn validate_rejects_inverted_jitter_bounds() {
        let settings = Settings {
            retry_jitter_min_ms: 600,
            retry_jitter_max_ms: 500,
            ..Settings::default()
        };
        assert!(settings.validate().is_err());
    }

    #[test]
    fn validate_rejects_zero_fanout() {
        let settings = Settings {
            fanout_cap: 0,
            ..Settings::default()
        };
        assert!(settings.validate().is_err());
    }

    #[test]
    fn load_overlays_file_then_env() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("tripforge.toml");
        fs::write(&path, "fanout_cap = 2\nbreaker_failure_threshold = 7\n").unwrap();

        env::set_var("TRIPFORGE_FANOUT_CAP", "3");
        let settings = Settings::load(Some(&path)).unwrap();
        env::remove_var("TRIPFORGE_FANOUT_CAP");

        // env overrides the file
        assert_eq!(settings.fanout_cap, 3);
        // file overrides the default
        assert_eq!(settings.breaker_failure_threshold, 7);
    }
}
