//! The ToolResult record returned by every `execute()` call.
//!
//! Resilience outcomes are data, never exceptions: stage code branches on
//! `ToolResult::status` explicitly instead of matching on an `Err` value.

use serde::{Deserialize, Serialize};
use serde_json::Value;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ToolStatus {
    Success,
    Error,
    Timeout,
    Cancelled,
    BreakerOpen,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ToolErrorShape {
    pub reason: String,
    #[serde(rename = "type")]
    pub error_type: Option<String>,
    pub message: Option<String>,
    pub retry_after_seconds: Option<u64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolResult {
    pub status: ToolStatus,
    pub data: Option<Value>,
    pub error: Option<ToolErrorShape>,
    pub from_cache: bool,
    pub latency_ms: u64,
    pub retries: u32,
}

impl ToolResult {
    pub fn success(data: Value, latency_ms: u64, retries: u32, from_cache: bool) -> Self {
        Self {
            status: ToolStatus::Success,
            data: Some(data),
            error: None,
            from_cache,
            latency_ms,
            retries,
        }
    }

    pub fn cancelled() -> Self {
        Self {
            status: ToolStatus::Cancelled,
            data: None,
            error: Some(ToolErrorShape {
                reason: "cancelled".to_string(),
                ..Default::default()
            }),
            from_cache: false,
            latency_ms: 0,
            retries: 0,
        }
    }

    pub fn breaker_open(retry_after_seconds: u64) -> Self {
        Self {
            status: ToolStatus::BreakerOpen,
            data: None,
            error: Some(ToolErrorShape {
                reason: "breaker_open".to_string(),
                retry_after_seconds: Some(retry_after_seconds),
                ..Default::default()
            }),
            from_cache: false,
            latency_ms: 0,
            retries: 0,
        }
    }

    pub fn timeout(latency_ms: u64, retries: u32) -> Self {
        Self {
            status: ToolStatus::Timeout,
            data: None,
            error: Some(ToolErrorShape {
                reason: "timeout".to_string(),
                ..Default::default()
            }),
            from_cache: false,
            latency_ms,
            retries,
        }
    }

    pub fn error(reason: impl Into<String>, error_type: &str, message: impl Into<String>, latency_ms: u64, retries: u32) -> Self {
        Self {
            status: ToolStatus::Error,
            data: None,
            error: Some(ToolErrorShape {
                reason: reason.into(),
                error_type: Some(error_type.to_string()),
                message: Some(message.into()),
                retry_after_seconds: None,
            }),
            from_cache: false,
            latency_ms,
            retries,
        }
    }

    pub fn is_success(&self) -> bool {
        self.status == ToolStatus::Success
    }
}
