//! # Execution Statistics
//!
//! Counters and an incremental running-average execution time, maintained
//! per saga and per step.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Execution counters shared by sagas and steps
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ExecutionStatistics {
    pub execution_count: u64,
    pub success_count: u64,
    pub failure_count: u64,
    pub compensation_count: u64,
    /// Running average over finished executions, successful or not
    pub average_execution_time_ms: f64,
    pub last_executed_at: Option<DateTime<Utc>>,
    pub last_success_at: Option<DateTime<Utc>>,
    pub last_failure_at: Option<DateTime<Utc>>,
}

impl ExecutionStatistics {
    /// Record that an execution has started
    pub fn begin_execution(&mut self) {
        self.execution_count += 1;
        self.last_executed_at = Some(Utc::now());
    }

    /// Record a successful finish and fold its duration into the average
    pub fn finish_success(&mut self, execution_time_ms: u64) {
        self.success_count += 1;
        self.last_success_at = Some(Utc::now());
        self.update_average(execution_time_ms);
    }

    /// Record a failed finish and fold its duration into the average
    pub fn finish_failure(&mut self, execution_time_ms: u64) {
        self.failure_count += 1;
        self.last_failure_at = Some(Utc::now());
        self.update_average(execution_time_ms);
    }

    /// Record a completed compensation pass
    pub fn record_compensation(&mut self) {
        self.compensation_count += 1;
    }

    // Welford-style incremental mean over finished runs.
    fn update_average(&mut self, execution_time_ms: u64) {
        let finished = (self.success_count + self.failure_count) as f64;
        self.average_execution_time_ms +=
            (execution_time_ms as f64 - self.average_execution_time_ms) / finished;
    }
}
