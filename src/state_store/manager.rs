use chrono::{DateTime, Utc};
use std::sync::Arc;
use tracing::{debug, instrument};
use uuid::Uuid;

use crate::error::Result;
use crate::orchestration::Saga;
use crate::state_store::snapshot::{
    SagaStateSnapshot, SnapshotParams, SnapshotPatch, StepStateSnapshot,
};
use crate::state_store::store::{SagaStateStore, SnapshotPage, SnapshotQuery, StoreStatistics};

/// Facade over a [`SagaStateStore`] used by recovery and monitoring
/// tooling. Store-layer failures propagate unchanged.
#[derive(Clone)]
pub struct SagaStateManager {
    store: Arc<dyn SagaStateStore>,
}

impl SagaStateManager {
    pub fn new(store: Arc<dyn SagaStateStore>) -> Self {
        Self { store }
    }

    /// Pure snapshot builder: version 1, `completed_at` only when the
    /// status is terminal
    pub fn create_snapshot(&self, params: SnapshotParams) -> SagaStateSnapshot {
        SagaStateSnapshot::create(params)
    }

    /// Build a snapshot from a live saga and persist it. The snapshot is
    /// independent of the saga: later saga mutations do not touch it.
    #[instrument(skip_all, fields(saga_id = %saga.saga_id()))]
    pub async fn capture(&self, saga: &Saga) -> Result<SagaStateSnapshot> {
        let context = saga.context().await;
        let step_states = saga
            .steps()
            .iter()
            .enumerate()
            .map(|(step_index, step)| StepStateSnapshot {
                step_index,
                step_name: step.name().to_string(),
                status: step.status(),
                executed_at: step.statistics().last_executed_at,
            })
            .collect();

        let snapshot = self.create_snapshot(SnapshotParams {
            saga_id: saga.saga_id(),
            aggregate_id: saga.aggregate_id(),
            status: saga.status(),
            current_step_index: context.current_step_index,
            start_time: Some(context.start_time),
            context_data: context.data,
            error: context.error,
            compensation_reason: context.compensation_reason,
            step_states,
        });

        self.save(snapshot.clone()).await?;
        Ok(snapshot)
    }

    pub async fn save(&self, snapshot: SagaStateSnapshot) -> Result<()> {
        debug!(saga_id = %snapshot.saga_id, version = snapshot.version, "Saving snapshot");
        self.store.save(snapshot).await
    }

    pub async fn get_by_id(&self, saga_id: Uuid) -> Result<Option<SagaStateSnapshot>> {
        self.store.get_by_id(saga_id).await
    }

    pub async fn get_by_aggregate_id(&self, aggregate_id: Uuid) -> Result<Vec<SagaStateSnapshot>> {
        self.store.get_by_aggregate_id(aggregate_id).await
    }

    pub async fn query(&self, query: &SnapshotQuery) -> Result<SnapshotPage> {
        self.store.query(query).await
    }

    /// Merge a partial update; the version is bumped by exactly 1.
    /// Unknown saga ids fail with `SnapshotNotFound`.
    pub async fn update(&self, saga_id: Uuid, patch: SnapshotPatch) -> Result<SagaStateSnapshot> {
        debug!(saga_id = %saga_id, "Updating snapshot");
        self.store.update(saga_id, patch).await
    }

    pub async fn delete(&self, saga_id: Uuid) -> Result<bool> {
        debug!(saga_id = %saga_id, "Deleting snapshot");
        self.store.delete(saga_id).await
    }

    /// Retention cleanup: removes snapshots created before `before` and
    /// returns the removed count
    #[instrument(skip(self))]
    pub async fn cleanup(&self, before: DateTime<Utc>) -> Result<usize> {
        let removed = self.store.cleanup(before).await?;
        debug!(removed, "Snapshot cleanup finished");
        Ok(removed)
    }

    pub async fn get_statistics(&self, aggregate_id: Option<Uuid>) -> Result<StoreStatistics> {
        self.store.get_statistics(aggregate_id).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{SagaConfig, StepConfig};
    use crate::state_store::memory::InMemorySagaStateStore;
    use crate::states::{SagaStatus, StepStatus};
    use crate::step::FnStep;
    use serde_json::json;

    fn manager() -> SagaStateManager {
        SagaStateManager::new(Arc::new(InMemorySagaStateStore::new()))
    }

    #[tokio::test]
    async fn test_capture_reflects_live_saga_progress() {
        let saga = Saga::builder(SagaConfig::new("checkout"), Uuid::new_v4())
            .step(
                StepConfig::new("validate"),
                Arc::new(FnStep::new(|ctx| {
                    Box::pin(async move {
                        ctx.insert("validated", json!(true));
                        Ok(json!(null))
                    })
                })),
            )
            .build()
            .unwrap();

        saga.execute(Default::default()).await.unwrap();

        let manager = manager();
        let snapshot = manager.capture(&saga).await.unwrap();

        assert_eq!(snapshot.saga_id, saga.saga_id());
        assert_eq!(snapshot.status, SagaStatus::Completed);
        assert_eq!(snapshot.version, 1);
        assert!(snapshot.completed_at.is_some());
        assert_eq!(snapshot.step_states.len(), 1);
        assert_eq!(snapshot.step_states[0].status, StepStatus::Completed);
        assert_eq!(snapshot.context_data.get("validated"), Some(&json!(true)));

        let loaded = manager.get_by_id(saga.saga_id()).await.unwrap().unwrap();
        assert_eq!(loaded, snapshot);
    }

    #[tokio::test]
    async fn test_sequential_updates_accumulate_version() {
        let manager = manager();
        let snapshot = manager.create_snapshot(SnapshotParams {
            saga_id: Uuid::new_v4(),
            aggregate_id: Uuid::new_v4(),
            status: SagaStatus::Running,
            ..SnapshotParams::default()
        });
        let saga_id = snapshot.saga_id;
        manager.save(snapshot).await.unwrap();

        for _ in 0..4 {
            manager
                .update(saga_id, SnapshotPatch::default())
                .await
                .unwrap();
        }

        let loaded = manager.get_by_id(saga_id).await.unwrap().unwrap();
        assert_eq!(loaded.version, 5);
    }
}
