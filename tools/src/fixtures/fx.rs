//! Deterministic FX-rate-by-pair fixture table.

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;
use tripforge_core::{Clock, FxRateResult, Provenance};

use crate::callable::ToolCallable;
use crate::errors::ToolError;

use super::require_str;

const RATES: &[(&str, f64)] = &[("USD/EUR", 0.92), ("USD/JPY", 149.5), ("USD/GBP", 0.79)];

pub struct FixtureFxTool {
    clock: Arc<dyn Clock>,
}

impl FixtureFxTool {
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self { clock }
    }
}

#[async_trait]
impl ToolCallable for FixtureFxTool {
    fn name(&self) -> &str {
        "fx"
    }

    async fn call(&self, args: Value) -> Result<Value, ToolError> {
        let pair = require_str(&args, "pair")?;
        let rate = RATES
            .iter()
            .find(|(p, _)| *p == pair)
            .map(|(_, r)| *r)
            .ok_or_else(|| ToolError::NotFound(format!("no fixture FX rate for '{pair}'")))?;

        let result = FxRateResult {
            pair: pair.to_string(),
            rate,
            provenance: Provenance::fixture(super::clock_now_utc(self.clock.as_ref()), format!("fx:{pair}")),
        };
        Ok(serde_json::to_value(result).expect("FxRateResult always serializes"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tripforge_core::SystemClock;

    #[tokio::test]
    async fn known_pair_returns_tabulated_rate() {
        let tool = FixtureFxTool::new(Arc::new(SystemClock));
        let out = tool.call(serde_json::json!({"pair": "USD/EUR"})).await.unwrap();
        let result: FxRateResult = serde_json::from_value(out).unwrap();
        assert_eq!(result.rate, 0.92);
    }

    #[tokio::test]
    async fn unknown_pair_is_not_found() {
        let tool = FixtureFxTool::new(Arc::new(SystemClock));
        let err = tool.call(serde_json::json!({"pair": "USD/XXX"})).await.unwrap_err();
        assert!(matches!(err, ToolError::NotFound(_)));
    }
}
