//! # Saga Lifecycle Events
//!
//! Broadcast-based event publishing for saga and step lifecycle
//! transitions. Publishing never fails the engine: events with no
//! subscribers are dropped silently.

pub mod publisher;

pub use publisher::{EventPublisher, PublishedEvent};

/// Event names published by the engine
pub mod names {
    pub const SAGA_STARTED: &str = "saga.started";
    pub const SAGA_COMPLETED: &str = "saga.completed";
    pub const SAGA_FAILED: &str = "saga.failed";
    pub const SAGA_COMPENSATION_STARTED: &str = "saga.compensation_started";
    pub const SAGA_COMPENSATED: &str = "saga.compensated";
    pub const SAGA_PAUSED: &str = "saga.paused";
    pub const SAGA_RESUMED: &str = "saga.resumed";
    pub const SAGA_CANCELLED: &str = "saga.cancelled";

    pub const STEP_STARTED: &str = "step.started";
    pub const STEP_COMPLETED: &str = "step.completed";
    pub const STEP_FAILED: &str = "step.failed";
    pub const STEP_SKIPPED: &str = "step.skipped";
    pub const STEP_COMPENSATED: &str = "step.compensated";
}
