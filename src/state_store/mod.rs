//! # Durable Saga State
//!
//! Snapshot-based persistence of saga progress, independent of the live
//! `Saga` object, for recovery, querying, auditing, and retention cleanup.
//!
//! The storage contract is [`SagaStateStore`]; no persistence technology
//! is mandated. [`InMemorySagaStateStore`] is the reference
//! implementation, a concurrent map keyed by saga id.

pub mod manager;
pub mod memory;
pub mod snapshot;
pub mod store;

pub use manager::SagaStateManager;
pub use memory::InMemorySagaStateStore;
pub use snapshot::{SagaStateSnapshot, SnapshotParams, SnapshotPatch, StepStateSnapshot};
pub use store::{
    PageInfo, PageRequest, SagaStateStore, SnapshotFilter, SnapshotPage, SnapshotQuery,
    SnapshotSort, SortDirection, SortField, StoreStatistics,
};
