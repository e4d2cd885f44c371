//! # Saga Orchestration
//!
//! The top-level lifecycle state machine and its construction surface.
//!
//! ## Core Components
//!
//! - **Saga**: ordered step execution with forward/backward iteration,
//!   cooperative pause/resume/cancel, and compensation on failure
//! - **SagaBuilder**: explicit ordered construction of steps and hooks
//! - **SagaRunner**: bounded-concurrency execution of many sagas
//!
//! ## Lifecycle
//!
//! ```text
//! NotStarted ──execute──▶ Running ──all ok──▶ Completed
//!                            │ │
//!                 pause/resume │ └─step fails─▶ Failed ──compensation──▶ Compensated
//!                            ▼
//!                          Paused        any non-terminal ──cancel──▶ Cancelled
//! ```

pub mod builder;
pub mod runner;
pub mod saga;

pub use builder::SagaBuilder;
pub use runner::{SagaRun, SagaRunOutcome, SagaRunner};
pub use saga::{NoopHooks, Saga, SagaHooks};
