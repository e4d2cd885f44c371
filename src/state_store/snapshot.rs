use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;
use uuid::Uuid;

use crate::states::{SagaStatus, StepStatus};

/// Durable record of one step's progress inside a snapshot
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StepStateSnapshot {
    pub step_index: usize,
    pub step_name: String,
    pub status: StepStatus,
    pub executed_at: Option<DateTime<Utc>>,
}

/// Durable, point-in-time representation of a saga's progress, independent
/// of the live `Saga` object. The field set is the recovery contract and
/// must stay stable across versions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SagaStateSnapshot {
    pub saga_id: Uuid,
    pub aggregate_id: Uuid,
    pub status: SagaStatus,
    pub current_step_index: Option<usize>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub start_time: DateTime<Utc>,
    /// Set exactly once, when the status first becomes terminal
    pub completed_at: Option<DateTime<Utc>>,
    pub context_data: HashMap<String, Value>,
    pub error: Option<String>,
    pub compensation_reason: Option<String>,
    pub step_states: Vec<StepStateSnapshot>,
    /// Starts at 1 and is incremented by exactly 1 per update
    pub version: u64,
}

/// Inputs to the pure snapshot builder
#[derive(Debug, Clone, Default)]
pub struct SnapshotParams {
    pub saga_id: Uuid,
    pub aggregate_id: Uuid,
    pub status: SagaStatus,
    pub current_step_index: Option<usize>,
    pub start_time: Option<DateTime<Utc>>,
    pub context_data: HashMap<String, Value>,
    pub error: Option<String>,
    pub compensation_reason: Option<String>,
    pub step_states: Vec<StepStateSnapshot>,
}

impl SagaStateSnapshot {
    /// Pure builder: version 1, `completed_at` only for terminal status
    pub fn create(params: SnapshotParams) -> Self {
        let now = Utc::now();
        Self {
            saga_id: params.saga_id,
            aggregate_id: params.aggregate_id,
            status: params.status,
            current_step_index: params.current_step_index,
            created_at: now,
            updated_at: now,
            start_time: params.start_time.unwrap_or(now),
            completed_at: params.status.is_terminal().then_some(now),
            context_data: params.context_data,
            error: params.error,
            compensation_reason: params.compensation_reason,
            step_states: params.step_states,
            version: 1,
        }
    }

    /// Merge a partial update: version +1, `updated_at` refreshed,
    /// `completed_at` stamped the first time the status turns terminal
    pub fn apply(&mut self, patch: SnapshotPatch) {
        let now = Utc::now();

        if let Some(status) = patch.status {
            self.status = status;
        }
        if let Some(index) = patch.current_step_index {
            self.current_step_index = Some(index);
        }
        if let Some(context_data) = patch.context_data {
            self.context_data = context_data;
        }
        if let Some(error) = patch.error {
            self.error = Some(error);
        }
        if let Some(reason) = patch.compensation_reason {
            self.compensation_reason = Some(reason);
        }
        if let Some(step_states) = patch.step_states {
            self.step_states = step_states;
        }

        if self.status.is_terminal() && self.completed_at.is_none() {
            self.completed_at = Some(now);
        }
        self.updated_at = now;
        self.version += 1;
    }
}

/// Partial snapshot update; absent fields are left untouched
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SnapshotPatch {
    pub status: Option<SagaStatus>,
    pub current_step_index: Option<usize>,
    pub context_data: Option<HashMap<String, Value>>,
    pub error: Option<String>,
    pub compensation_reason: Option<String>,
    pub step_states: Option<Vec<StepStateSnapshot>>,
}
