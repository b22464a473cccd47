//! Resilient tool execution: the `ToolExecutor` resilience core, its
//! supporting cache and circuit breaker, and the deterministic fixture
//! adapters used to exercise the pipeline end to end.

pub mod cache;
pub mod callable;
pub mod circuit_breaker;
pub mod errors;
pub mod executor;
pub mod fixtures;
pub mod result;

pub use cache::{InMemoryResultCache, ResultCache};
pub use callable::{BlockingAdapter, SyncToolCallable, ToolCallable};
pub use circuit_breaker::{CircuitBreaker, CircuitState};
pub use errors::ToolError;
pub use executor::{BreakerPolicy, CachePolicy, ExecutorSettings, ToolExecutor};
pub use result::{ToolErrorShape, ToolResult, ToolStatus};
