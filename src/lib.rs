#![allow(clippy::missing_errors_doc)] // Allow public functions without # Errors sections
#![allow(clippy::must_use_candidate)] // Allow methods without must_use when context is clear

//! # Saga Core Rust
//!
//! Saga orchestration engine: a long-running, multi-step
//! business-transaction coordinator that guarantees either full completion
//! of an ordered sequence of steps or a deterministic reverse-order
//! rollback (compensation) of every step that already completed, even
//! though steps have independent side effects that cannot share one atomic
//! transaction.
//!
//! ## Architecture
//!
//! Four components, leaves first:
//!
//! - **Step** ([`step`]) — named unit of work with an execute action and a
//!   compensating action, its own retry/timeout/compensation policy, and
//!   hook points
//! - **Saga** ([`orchestration`]) — ordered, named collection of steps
//!   sharing one execution [`context`]; owns the lifecycle state machine
//!   and forward/backward iteration
//! - **State snapshot + store** ([`state_store`]) — durable representation
//!   of a saga's progress, independent of the live saga, for recovery,
//!   querying, and retention cleanup
//! - **Explicit construction** ([`orchestration::SagaBuilder`]) — steps,
//!   ordering, hooks, and policies declared directly at build time
//!
//! ## Key Guarantees
//!
//! - Steps execute strictly sequentially, in declared order
//! - On unrecoverable step failure, completed steps compensate in strict
//!   reverse order; pending/failed/skipped steps are untouched
//! - Pause, resume, and cancel are cooperative, observed at step
//!   boundaries only
//! - Step failures retry locally with bounded exponential backoff, then
//!   propagate unchanged; nothing is silently swallowed except disabled
//!   no-ops and cancellation
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use saga_core::config::{SagaConfig, StepConfig};
//! use saga_core::orchestration::Saga;
//! use saga_core::step::FnStep;
//! use serde_json::json;
//! use std::collections::HashMap;
//! use std::sync::Arc;
//! use uuid::Uuid;
//!
//! # async fn example() -> saga_core::error::Result<()> {
//! let saga = Saga::builder(SagaConfig::new("order_fulfillment"), Uuid::new_v4())
//!     .step(
//!         StepConfig::new("reserve_inventory"),
//!         Arc::new(FnStep::with_compensation(
//!             |ctx| Box::pin(async move {
//!                 ctx.insert("reserved", json!(true));
//!                 Ok(json!(null))
//!             }),
//!             |ctx| Box::pin(async move {
//!                 ctx.insert("reserved", json!(false));
//!                 Ok(())
//!             }),
//!         )),
//!     )
//!     .build()?;
//!
//! saga.execute(HashMap::new()).await?;
//! assert!(saga.is_completed());
//! # Ok(())
//! # }
//! ```
//!
//! ## Module Organization
//!
//! - [`orchestration`] - Saga lifecycle, builder, and concurrent runner
//! - [`step`] - Step contract, closure steps, and the execution engine
//! - [`state_store`] - Snapshot model, store contract, in-memory store
//! - [`config`] - Saga and step configuration with defaults and overrides
//! - [`context`] - Shared per-execution data bag and cursor
//! - [`events`] - Lifecycle event publishing
//! - [`states`] - Saga and step status enums
//! - [`statistics`] - Execution counters and running averages
//! - [`error`] - Structured error taxonomy
//! - [`logging`] - Structured logging initialization

pub mod config;
pub mod context;
pub mod error;
pub mod events;
pub mod logging;
pub mod orchestration;
pub mod state_store;
pub mod states;
pub mod statistics;
pub mod step;

pub use config::{
    CompensationConfig, ConditionConfig, PerformanceConfig, RetryConfig, SagaConfig, StepConfig,
};
pub use context::SagaContext;
pub use error::{BoxError, Result, SagaError};
pub use events::EventPublisher;
pub use orchestration::{NoopHooks, Saga, SagaBuilder, SagaHooks, SagaRun, SagaRunOutcome, SagaRunner};
pub use state_store::{
    InMemorySagaStateStore, SagaStateManager, SagaStateSnapshot, SagaStateStore, SnapshotFilter,
    SnapshotPatch, SnapshotQuery,
};
pub use states::{SagaStatus, StepStatus};
pub use statistics::ExecutionStatistics;
pub use step::{FnStep, SagaStep, StepExecutionResult, StepHandler};
