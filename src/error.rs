//! # Error Types
//!
//! Structured error taxonomy for saga orchestration.
//!
//! Step failures retry locally (bounded by the step's retry policy); once the
//! retry budget is exhausted they propagate to the saga, which propagates to
//! the caller unchanged. The only deliberately silent outcomes in the engine
//! are disabled saga/step no-ops and cooperative cancellation.

use thiserror::Error;
use uuid::Uuid;

use crate::states::SagaStatus;

/// Boxed error type carried by step bodies, hooks, and condition checks.
///
/// Handlers surface whatever error type they like; the engine wraps it while
/// preserving the original message and source chain.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Convenient result alias used throughout the crate.
pub type Result<T> = std::result::Result<T, SagaError>;

/// Errors raised by the saga orchestration engine.
#[derive(Error, Debug)]
pub enum SagaError {
    /// `execute` is one-shot; re-invoking it on any non-fresh saga fails.
    #[error("saga has already been executed (status: {status})")]
    AlreadyExecuted { status: SagaStatus },

    /// `pause` is only valid while the saga is running.
    #[error("cannot pause saga: not running (status: {status})")]
    NotRunning { status: SagaStatus },

    /// `resume` is only valid while the saga is paused.
    #[error("cannot resume saga: not paused (status: {status})")]
    NotPaused { status: SagaStatus },

    /// The saga-level timeout elapsed before the forward step loop finished.
    #[error("saga '{saga}' timed out after {timeout_ms}ms")]
    SagaTimeout { saga: String, timeout_ms: u64 },

    /// A step body did not complete within its configured timeout.
    #[error("step '{step}' timed out after {timeout_ms}ms")]
    StepTimeout { step: String, timeout_ms: u64 },

    /// A compensating body did not complete within the compensation timeout.
    #[error("compensation for step '{step}' timed out after {timeout_ms}ms")]
    StepCompensationTimeout { step: String, timeout_ms: u64 },

    /// A step body failed after exhausting its retry budget.
    #[error("step '{step}' failed after {attempts} attempt(s): {source}")]
    StepFailed {
        step: String,
        attempts: u32,
        #[source]
        source: BoxError,
    },

    /// A compensating body failed after exhausting its retry budget.
    #[error("compensation for step '{step}' failed after {attempts} attempt(s): {source}")]
    CompensationFailed {
        step: String,
        attempts: u32,
        #[source]
        source: BoxError,
    },

    /// A lifecycle hook or condition check raised.
    #[error("hook '{hook}' for '{scope}' failed: {source}")]
    HookFailed {
        scope: String,
        hook: &'static str,
        #[source]
        source: BoxError,
    },

    /// `update` was called for a saga id the store has never seen.
    #[error("no state snapshot found for saga {saga_id}")]
    SnapshotNotFound { saga_id: Uuid },

    /// Opaque state-store failure, propagated unchanged.
    #[error("state store error: {0}")]
    Store(String),

    /// Configuration rejected at construction time.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// Snapshot or context serialization failure.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl SagaError {
    /// True when the error represents a step-level timeout (forward or
    /// compensating direction).
    pub fn is_timeout(&self) -> bool {
        matches!(
            self,
            Self::SagaTimeout { .. }
                | Self::StepTimeout { .. }
                | Self::StepCompensationTimeout { .. }
        )
    }
}
