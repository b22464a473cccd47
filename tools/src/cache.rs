//! Process-wide tool result cache, keyed by the SHA-256 of canonical JSON.

use std::time::Duration;

use async_trait::async_trait;
use dashmap::DashMap;
use serde_json::Value;
use sha2::{Digest, Sha256};
use tripforge_core::Clock;

use crate::result::ToolResult;

/// Canonical JSON form used for cache keys: keys sorted, compact
/// separators. `serde_json::Value`'s own `Map` is a `BTreeMap` by default
/// once the `preserve_order` feature is off, so `to_string` already
/// produces sorted, compact output.
pub fn canonical_cache_key(tool: &str, args: &Value) -> String {
    let envelope = serde_json::json!({ "tool": tool, "args": args });
    let canonical = serde_json::to_string(&envelope).expect("value is always serializable");
    let mut hasher = Sha256::new();
    hasher.update(canonical.as_bytes());
    hex::encode(hasher.finalize())
}

// TODO: if serde_json ever gains the `preserve_order` feature in this
// workspace, switch to an explicit BTreeMap re-serialization here to keep
// cache keys stable regardless of feature flags elsewhere in the tree.

struct CacheEntry {
    result: ToolResult,
    expires_at: std::time::Instant,
}

#[async_trait]
pub trait ResultCache: Send + Sync {
    async fn get(&self, key: &str) -> Option<ToolResult>;
    async fn set(&self, key: &str, result: ToolResult, ttl_seconds: u64);
}

/// `dashmap`-backed cache with expiry checked lazily on read.
pub struct InMemoryResultCache {
    entries: DashMap<String, CacheEntry>,
    clock: std::sync::Arc<dyn Clock>,
}

impl InMemoryResultCache {
    pub fn new(clock: std::sync::Arc<dyn Clock>) -> Self {
        Self {
            entries: DashMap::new(),
            clock,
        }
    }
}

#[async_trait]
impl ResultCache for InMemoryResultCache {
    async fn get(&self, key: &str) -> Option<ToolResult> {
        let now = self.clock.now();
        let hit = self.entries.get(key).and_then(|entry| {
            if entry.expires_at > now {
                Some(entry.result.clone())
            } else {
                None
            }
        });
        if hit.is_none() {
            self.entries.remove(key);
        }
        hit
    }

    async fn set(&self, key: &str, result: ToolResult, ttl_seconds: u64) {
        self.entries.insert(
            key.to_string(),
            CacheEntry {
                result,
                expires_at: self.clock.now() + Duration::from_secs(ttl_seconds),
            },
        );
    }
}
