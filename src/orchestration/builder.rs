//! # Saga Construction
//!
//! Explicit, ordered saga assembly. Steps are built and appended directly;
//! hooks are trait objects resolved at construction time. There is no
//! metadata or reflection subsystem: what you append is what runs, in the
//! order you appended it.

use std::collections::HashSet;
use std::sync::Arc;
use uuid::Uuid;

use crate::config::{SagaConfig, StepConfig};
use crate::error::{Result, SagaError};
use crate::events::EventPublisher;
use crate::orchestration::saga::{NoopHooks, Saga, SagaHooks};
use crate::step::{SagaStep, StepHandler};

/// Builder assembling a saga from its config, ordered steps, and hooks.
///
/// ```rust,no_run
/// use saga_core::config::{SagaConfig, StepConfig};
/// use saga_core::orchestration::Saga;
/// use saga_core::step::FnStep;
/// use serde_json::json;
/// use std::sync::Arc;
/// use uuid::Uuid;
///
/// # fn main() -> saga_core::error::Result<()> {
/// let saga = Saga::builder(SagaConfig::new("order_fulfillment"), Uuid::new_v4())
///     .step(
///         StepConfig::new("validate_order"),
///         Arc::new(FnStep::new(|_ctx| Box::pin(async { Ok(json!({"valid": true})) }))),
///     )
///     .step(
///         StepConfig::new("reserve_inventory"),
///         Arc::new(FnStep::new(|_ctx| Box::pin(async { Ok(json!(null)) }))),
///     )
///     .build()?;
/// # Ok(())
/// # }
/// ```
pub struct SagaBuilder {
    config: SagaConfig,
    aggregate_id: Uuid,
    steps: Vec<SagaStep>,
    hooks: Arc<dyn SagaHooks>,
    events: Option<EventPublisher>,
}

impl SagaBuilder {
    pub fn new(config: SagaConfig, aggregate_id: Uuid) -> Self {
        Self {
            config,
            aggregate_id,
            steps: Vec::new(),
            hooks: Arc::new(NoopHooks),
            events: None,
        }
    }

    /// Append a step; execution order is append order
    pub fn step(mut self, config: StepConfig, handler: Arc<dyn StepHandler>) -> Self {
        self.steps.push(SagaStep::new(config, handler));
        self
    }

    /// Append an already-built step
    pub fn push_step(mut self, step: SagaStep) -> Self {
        self.steps.push(step);
        self
    }

    /// Install saga-level lifecycle hooks
    pub fn hooks(mut self, hooks: Arc<dyn SagaHooks>) -> Self {
        self.hooks = hooks;
        self
    }

    /// Use a shared event publisher instead of a saga-private one
    pub fn event_publisher(mut self, events: EventPublisher) -> Self {
        self.events = Some(events);
        self
    }

    /// Validate configuration and produce the `NotStarted` saga. Steps are
    /// initialized exactly once, here, and persist for the saga's lifetime.
    pub fn build(self) -> Result<Saga> {
        self.config.validate()?;

        let mut seen = HashSet::new();
        for step in &self.steps {
            step.config().validate()?;
            if !seen.insert(step.name().to_string()) {
                return Err(SagaError::InvalidConfig(format!(
                    "duplicate step name '{}' in saga '{}'",
                    step.name(),
                    self.config.name
                )));
            }
        }

        Ok(Saga::new(
            self.config,
            self.aggregate_id,
            self.steps,
            self.hooks,
            self.events.unwrap_or_default(),
        ))
    }
}
