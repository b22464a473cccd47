//! The contract every tool adapter implements: a function from JSON args
//! to a JSON result, synchronous or asynchronous.

use async_trait::async_trait;
use serde_json::Value;

use crate::errors::ToolError;

#[async_trait]
pub trait ToolCallable: Send + Sync {
    fn name(&self) -> &str;

    async fn call(&self, args: Value) -> Result<Value, ToolError>;
}

/// A synchronous variant, offloaded to a blocking worker thread by the
/// executor so a soft timeout can still be enforced around it.
pub trait SyncToolCallable: Send + Sync {
    fn name(&self) -> &str;

    fn call_sync(&self, args: Value) -> Result<Value, ToolError>;
}

/// Adapts any `SyncToolCallable` into a `ToolCallable` via
/// `spawn_blocking`.
pub struct BlockingAdapter<T> {
    inner: std::sync::Arc<T>,
}

impl<T> BlockingAdapter<T> {
    pub fn new(inner: std::sync::Arc<T>) -> Self {
        Self { inner }
    }
}

#[async_trait]
impl<T> ToolCallable for BlockingAdapter<T>
where
    T: SyncToolCallable + 'static,
{
    fn name(&self) -> &str {
        self.inner.name()
    }

    async fn call(&self, args: Value) -> Result<Value, ToolError> {
        let inner = self.inner.clone();
        tokio::task::spawn_blocking(move || inner.call_sync(args))
            .await
            .map_err(|e| ToolError::TemporaryError(format!("blocking task panicked: {e}")))?
    }
}
