//! The run store contract: `create`, `get`, `update` with status lifecycle
//! `running -> completed | error`.

use async_trait::async_trait;
use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunStatus {
    Running,
    Completed,
    Error,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunRecord {
    pub run_id: Uuid,
    pub org_id: String,
    pub user_id: String,
    pub status: RunStatus,
    pub completed_at: Option<chrono::DateTime<chrono::Utc>>,
    pub plan_snapshot: Option<Value>,
}

#[derive(Debug, Clone, Default)]
pub struct RunUpdate {
    pub status: Option<RunStatus>,
    pub completed_at: Option<chrono::DateTime<chrono::Utc>>,
    pub plan_snapshot: Option<Value>,
}

#[async_trait]
pub trait RunStore: Send + Sync {
    async fn create(&self, record: RunRecord);
    async fn get(&self, run_id: Uuid) -> Option<RunRecord>;
    async fn update(&self, run_id: Uuid, update: RunUpdate);
}

/// `dashmap`-backed run store for tests and the CLI demo.
#[derive(Default)]
pub struct InMemoryRunStore {
    runs: DashMap<Uuid, RunRecord>,
}

impl InMemoryRunStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl RunStore for InMemoryRunStore {
    async fn create(&self, record: RunRecord) {
        self.runs.insert(record.run_id, record);
    }

    async fn get(&self, run_id: Uuid) -> Option<RunRecord> {
        self.runs.get(&run_id).map(|r| r.clone())
    }

    async fn update(&self, run_id: Uuid, update: RunUpdate) {
        if let Some(mut record) = self.runs.get_mut(&run_id) {
            if let Some(status) = update.status {
                record.status = status;
            }
            if update.completed_at.is_some() {
                record.completed_at = update.completed_at;
            }
            if update.plan_snapshot.is_some() {
                record.plan_snapshot = update.plan_snapshot;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn update_transitions_status_lifecycle() {
        let store = InMemoryRunStore::new();
        let run_id = Uuid::new_v4();
        store
            .create(RunRecord {
                run_id,
                org_id: "org".to_string(),
                user_id: "user".to_string(),
                status: RunStatus::Running,
                completed_at: None,
                plan_snapshot: None,
            })
            .await;
        store
            .update(
                run_id,
                RunUpdate { status: Some(RunStatus::Completed), completed_at: Some(chrono::Utc::now()), plan_snapshot: None },
            )
            .await;
        let record = store.get(run_id).await.unwrap();
        assert_eq!(record.status, RunStatus::Completed);
        assert!(record.completed_at.is_some());
    }
}
