//! # Step Execution
//!
//! A step is one named unit of forward work paired with its undo action,
//! carrying its own retry/timeout/compensation policy and hook points.
//!
//! - [`StepHandler`] is the contract a step implements: a required forward
//!   body plus defaulted compensation, condition, and hook methods.
//! - [`FnStep`] wraps plain async closures for steps needing no hook
//!   overrides.
//! - [`SagaStep`] is the execution engine: condition check, hooks, a timed
//!   body raced against the step timeout, bounded exponential-backoff
//!   retries, and the mirrored compensation path.

pub mod handler;
#[allow(clippy::module_inception)]
pub mod step;

pub use handler::{FnStep, StepHandler};
pub use step::{SagaStep, StepExecutionResult};
