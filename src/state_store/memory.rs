use async_trait::async_trait;
use chrono::{DateTime, Utc};
use dashmap::DashMap;
use uuid::Uuid;

use crate::error::{Result, SagaError};
use crate::state_store::snapshot::{SagaStateSnapshot, SnapshotPatch};
use crate::state_store::store::{
    PageInfo, SagaStateStore, SnapshotPage, SnapshotQuery, SortDirection, SortField,
    StoreStatistics,
};

/// Reference state store: a concurrent in-memory map keyed by saga id.
///
/// Single-key updates are atomic through the map's entry guard; queries
/// see a point-in-time copy of each snapshot.
#[derive(Debug, Default)]
pub struct InMemorySagaStateStore {
    snapshots: DashMap<Uuid, SagaStateSnapshot>,
}

impl InMemorySagaStateStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.snapshots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.snapshots.is_empty()
    }
}

#[async_trait]
impl SagaStateStore for InMemorySagaStateStore {
    async fn save(&self, snapshot: SagaStateSnapshot) -> Result<()> {
        self.snapshots.insert(snapshot.saga_id, snapshot);
        Ok(())
    }

    async fn get_by_id(&self, saga_id: Uuid) -> Result<Option<SagaStateSnapshot>> {
        Ok(self.snapshots.get(&saga_id).map(|entry| entry.clone()))
    }

    async fn get_by_aggregate_id(&self, aggregate_id: Uuid) -> Result<Vec<SagaStateSnapshot>> {
        Ok(self
            .snapshots
            .iter()
            .filter(|entry| entry.aggregate_id == aggregate_id)
            .map(|entry| entry.clone())
            .collect())
    }

    async fn query(&self, query: &SnapshotQuery) -> Result<SnapshotPage> {
        let filter = &query.filter;
        let mut matches: Vec<SagaStateSnapshot> = self
            .snapshots
            .iter()
            .filter(|entry| {
                filter.status.is_none_or(|status| entry.status == status)
                    && filter.aggregate_id.is_none_or(|id| entry.aggregate_id == id)
                    && filter.created_after.is_none_or(|t| entry.created_at >= t)
                    && filter.created_before.is_none_or(|t| entry.created_at < t)
            })
            .map(|entry| entry.clone())
            .collect();

        if let Some(sort) = query.sort {
            matches.sort_by(|a, b| {
                let ordering = match sort.field {
                    SortField::CreatedAt => a.created_at.cmp(&b.created_at),
                    SortField::UpdatedAt => a.updated_at.cmp(&b.updated_at),
                    SortField::Status => a.status.to_string().cmp(&b.status.to_string()),
                };
                match sort.direction {
                    SortDirection::Ascending => ordering,
                    SortDirection::Descending => ordering.reverse(),
                }
            });
        }

        let pagination = match query.pagination {
            Some(page_request) => {
                let total = matches.len();
                let info = PageInfo::compute(page_request.page, page_request.page_size, total);
                let start = page_request
                    .page
                    .saturating_sub(1)
                    .saturating_mul(page_request.page_size);
                matches = matches
                    .into_iter()
                    .skip(start)
                    .take(page_request.page_size)
                    .collect();
                Some(info)
            }
            None => None,
        };

        Ok(SnapshotPage {
            snapshots: matches,
            pagination,
        })
    }

    async fn update(&self, saga_id: Uuid, patch: SnapshotPatch) -> Result<SagaStateSnapshot> {
        match self.snapshots.get_mut(&saga_id) {
            Some(mut entry) => {
                entry.apply(patch);
                Ok(entry.clone())
            }
            None => Err(SagaError::SnapshotNotFound { saga_id }),
        }
    }

    async fn delete(&self, saga_id: Uuid) -> Result<bool> {
        Ok(self.snapshots.remove(&saga_id).is_some())
    }

    async fn cleanup(&self, before: DateTime<Utc>) -> Result<usize> {
        let expired: Vec<Uuid> = self
            .snapshots
            .iter()
            .filter(|entry| entry.created_at < before)
            .map(|entry| entry.saga_id)
            .collect();

        let mut removed = 0;
        for saga_id in expired {
            if self.snapshots.remove(&saga_id).is_some() {
                removed += 1;
            }
        }
        Ok(removed)
    }

    async fn get_statistics(&self, aggregate_id: Option<Uuid>) -> Result<StoreStatistics> {
        let mut stats = StoreStatistics::default();
        for entry in self.snapshots.iter() {
            if aggregate_id.is_some_and(|id| entry.aggregate_id != id) {
                continue;
            }
            stats.total += 1;
            *stats.by_status.entry(entry.status).or_insert(0) += 1;
        }
        Ok(stats)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state_store::snapshot::SnapshotParams;
    use crate::state_store::store::{PageRequest, SnapshotFilter, SnapshotSort};
    use crate::states::SagaStatus;

    fn snapshot(status: SagaStatus, aggregate_id: Uuid) -> SagaStateSnapshot {
        SagaStateSnapshot::create(SnapshotParams {
            saga_id: Uuid::new_v4(),
            aggregate_id,
            status,
            ..SnapshotParams::default()
        })
    }

    #[tokio::test]
    async fn test_save_is_upsert_by_saga_id() {
        let store = InMemorySagaStateStore::new();
        let mut snap = snapshot(SagaStatus::Running, Uuid::new_v4());
        store.save(snap.clone()).await.unwrap();

        snap.status = SagaStatus::Completed;
        store.save(snap.clone()).await.unwrap();

        assert_eq!(store.len(), 1);
        let loaded = store.get_by_id(snap.saga_id).await.unwrap().unwrap();
        assert_eq!(loaded.status, SagaStatus::Completed);
    }

    #[tokio::test]
    async fn test_update_unknown_id_fails() {
        let store = InMemorySagaStateStore::new();
        let missing = Uuid::new_v4();
        let error = store
            .update(missing, SnapshotPatch::default())
            .await
            .unwrap_err();
        assert!(matches!(
            error,
            SagaError::SnapshotNotFound { saga_id } if saga_id == missing
        ));
    }

    #[tokio::test]
    async fn test_query_combines_filters_with_and() {
        let store = InMemorySagaStateStore::new();
        let aggregate = Uuid::new_v4();
        store
            .save(snapshot(SagaStatus::Completed, aggregate))
            .await
            .unwrap();
        store
            .save(snapshot(SagaStatus::Failed, aggregate))
            .await
            .unwrap();
        store
            .save(snapshot(SagaStatus::Completed, Uuid::new_v4()))
            .await
            .unwrap();

        let page = store
            .query(&SnapshotQuery {
                filter: SnapshotFilter {
                    status: Some(SagaStatus::Completed),
                    aggregate_id: Some(aggregate),
                    ..SnapshotFilter::default()
                },
                ..SnapshotQuery::default()
            })
            .await
            .unwrap();

        assert_eq!(page.snapshots.len(), 1);
        assert!(page.pagination.is_none());
    }

    #[tokio::test]
    async fn test_query_sorts_by_created_at_descending() {
        let store = InMemorySagaStateStore::new();
        for _ in 0..3 {
            store
                .save(snapshot(SagaStatus::Running, Uuid::new_v4()))
                .await
                .unwrap();
            tokio::time::sleep(std::time::Duration::from_millis(2)).await;
        }

        let page = store
            .query(&SnapshotQuery {
                sort: Some(SnapshotSort {
                    field: SortField::CreatedAt,
                    direction: SortDirection::Descending,
                }),
                ..SnapshotQuery::default()
            })
            .await
            .unwrap();

        let times: Vec<_> = page.snapshots.iter().map(|s| s.created_at).collect();
        let mut sorted = times.clone();
        sorted.sort_by(|a, b| b.cmp(a));
        assert_eq!(times, sorted);
    }

    #[tokio::test]
    async fn test_pagination_math() {
        let store = InMemorySagaStateStore::new();
        for _ in 0..5 {
            store
                .save(snapshot(SagaStatus::Running, Uuid::new_v4()))
                .await
                .unwrap();
        }

        let page = store
            .query(&SnapshotQuery {
                pagination: Some(PageRequest { page: 2, page_size: 2 }),
                ..SnapshotQuery::default()
            })
            .await
            .unwrap();

        assert_eq!(page.snapshots.len(), 2);
        let info = page.pagination.unwrap();
        assert_eq!(info.total, 5);
        assert_eq!(info.total_pages, 3);
    }

    #[tokio::test]
    async fn test_delete_is_idempotent() {
        let store = InMemorySagaStateStore::new();
        let snap = snapshot(SagaStatus::Running, Uuid::new_v4());
        let saga_id = snap.saga_id;
        store.save(snap).await.unwrap();

        assert!(store.delete(saga_id).await.unwrap());
        assert!(!store.delete(saga_id).await.unwrap());
    }

    #[tokio::test]
    async fn test_statistics_histogram_scoped_by_aggregate() {
        let store = InMemorySagaStateStore::new();
        let aggregate = Uuid::new_v4();
        store
            .save(snapshot(SagaStatus::Completed, aggregate))
            .await
            .unwrap();
        store
            .save(snapshot(SagaStatus::Completed, aggregate))
            .await
            .unwrap();
        store
            .save(snapshot(SagaStatus::Failed, Uuid::new_v4()))
            .await
            .unwrap();

        let all = store.get_statistics(None).await.unwrap();
        assert_eq!(all.total, 3);
        assert_eq!(all.by_status[&SagaStatus::Completed], 2);
        assert_eq!(all.by_status[&SagaStatus::Failed], 1);

        let scoped = store.get_statistics(Some(aggregate)).await.unwrap();
        assert_eq!(scoped.total, 2);
        assert!(!scoped.by_status.contains_key(&SagaStatus::Failed));
    }
}
