//! Provenance: where a piece of data came from, including cache status.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::tri::Tri;

/// The kind of collaborator that produced a value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProvenanceSource {
    Tool,
    Rag,
    User,
    Fixture,
    Repair,
    Planner,
}

/// Record of where a piece of data came from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Provenance {
    pub source: ProvenanceSource,
    pub ref_id: Option<String>,
    pub source_url: Option<String>,
    pub fetched_at: DateTime<Utc>,
    pub cache_hit: Tri,
    pub digest_sha256: Option<String>,
}

impl Provenance {
    /// Provenance for a value the planner synthesized directly (no tool
    /// round-trip involved).
    pub fn planner(fetched_at: DateTime<Utc>) -> Self {
        Self {
            source: ProvenanceSource::Planner,
            ref_id: None,
            source_url: None,
            fetched_at,
            cache_hit: Tri::Unknown,
            digest_sha256: None,
        }
    }

    /// Provenance for a value produced by the repair engine.
    pub fn repair(fetched_at: DateTime<Utc>, reason: impl Into<String>) -> Self {
        Self {
            source: ProvenanceSource::Repair,
            ref_id: Some(reason.into()),
            source_url: None,
            fetched_at,
            cache_hit: Tri::Unknown,
            digest_sha256: None,
        }
    }

    /// Provenance for a value retrieved through the tool executor.
    pub fn tool(
        fetched_at: DateTime<Utc>,
        ref_id: impl Into<String>,
        from_cache: bool,
        digest_sha256: Option<String>,
    ) -> Self {
        Self {
            source: ProvenanceSource::Tool,
            ref_id: Some(ref_id.into()),
            source_url: None,
            fetched_at,
            cache_hit: Tri::from_bool(from_cache),
            digest_sha256,
        }
    }

    /// Provenance for a value retrieved from a deterministic fixture
    /// adapter rather than a live third-party API.
    pub fn fixture(fetched_at: DateTime<Utc>, ref_id: impl Into<String>) -> Self {
        Self {
            source: ProvenanceSource::Fixture,
            ref_id: Some(ref_id.into()),
            source_url: None,
            fetched_at,
            cache_hit: Tri::No,
            digest_sha256: None,
        }
    }
}
