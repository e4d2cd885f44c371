use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use uuid::Uuid;

use crate::error::Result;
use crate::state_store::snapshot::{SagaStateSnapshot, SnapshotPatch};
use crate::states::SagaStatus;

/// AND-combined snapshot filters; absent fields match everything
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SnapshotFilter {
    pub status: Option<SagaStatus>,
    pub aggregate_id: Option<Uuid>,
    pub created_after: Option<DateTime<Utc>>,
    pub created_before: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortField {
    CreatedAt,
    UpdatedAt,
    Status,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortDirection {
    Ascending,
    Descending,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct SnapshotSort {
    pub field: SortField,
    pub direction: SortDirection,
}

/// 1-based page request
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct PageRequest {
    pub page: usize,
    pub page_size: usize,
}

/// Pagination metadata for a query result
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageInfo {
    pub page: usize,
    pub page_size: usize,
    /// Count of snapshots matching the filter, across all pages
    pub total: usize,
    /// `ceil(total / page_size)`
    pub total_pages: usize,
}

/// Full query: filter, optional sort, optional pagination
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SnapshotQuery {
    pub filter: SnapshotFilter,
    pub sort: Option<SnapshotSort>,
    pub pagination: Option<PageRequest>,
}

/// Query result; `pagination` is present iff the query paginated
#[derive(Debug, Clone)]
pub struct SnapshotPage {
    pub snapshots: Vec<SagaStateSnapshot>,
    pub pagination: Option<PageInfo>,
}

/// Snapshot counts, total and per status
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StoreStatistics {
    pub total: usize,
    pub by_status: HashMap<SagaStatus, usize>,
}

/// Contract for durable saga-state storage.
///
/// Implementations must support concurrent save/update/query from
/// unrelated sagas; a single-key update must be atomic. No cross-sagaId
/// ordering guarantee is required. Store-layer failures surface as
/// [`SagaError::Store`](crate::error::SagaError::Store) and propagate
/// unchanged.
#[async_trait]
pub trait SagaStateStore: Send + Sync {
    /// Upsert by saga id
    async fn save(&self, snapshot: SagaStateSnapshot) -> Result<()>;

    async fn get_by_id(&self, saga_id: Uuid) -> Result<Option<SagaStateSnapshot>>;

    async fn get_by_aggregate_id(&self, aggregate_id: Uuid) -> Result<Vec<SagaStateSnapshot>>;

    async fn query(&self, query: &SnapshotQuery) -> Result<SnapshotPage>;

    /// Merge a partial update and bump the version by exactly 1. Fails
    /// with `SnapshotNotFound` for an unknown saga id.
    async fn update(&self, saga_id: Uuid, patch: SnapshotPatch) -> Result<SagaStateSnapshot>;

    /// Idempotent removal; returns whether a snapshot was present
    async fn delete(&self, saga_id: Uuid) -> Result<bool>;

    /// Delete snapshots created before the given instant; returns the
    /// removed count
    async fn cleanup(&self, before: DateTime<Utc>) -> Result<usize>;

    /// Total count plus per-status histogram, optionally scoped to one
    /// aggregate
    async fn get_statistics(&self, aggregate_id: Option<Uuid>) -> Result<StoreStatistics>;
}

impl PageInfo {
    pub fn compute(page: usize, page_size: usize, total: usize) -> Self {
        let total_pages = if page_size == 0 {
            0
        } else {
            total.div_ceil(page_size)
        };
        Self {
            page,
            page_size,
            total,
            total_pages,
        }
    }
}
