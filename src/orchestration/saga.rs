use async_trait::async_trait;
use parking_lot::RwLock;
use serde_json::{json, Value};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::{Mutex, Notify};
use tokio::time::timeout;
use tracing::{debug, error, info, instrument, warn};

use crate::config::SagaConfig;
use crate::context::SagaContext;
use crate::error::{BoxError, Result, SagaError};
use crate::events::{names, EventPublisher};
use crate::states::{SagaStatus, StepStatus};
use crate::statistics::ExecutionStatistics;
use crate::step::SagaStep;
use uuid::Uuid;

/// Saga-level lifecycle hooks with default no-op implementations.
///
/// Hooks were originally declared through attached metadata and discovered
/// via reflection; here they are explicit override methods resolved at
/// construction time.
#[async_trait]
pub trait SagaHooks: Send + Sync {
    async fn on_before_execute(&self, _context: &mut SagaContext) -> std::result::Result<(), BoxError> {
        Ok(())
    }

    async fn on_after_execute(&self, _context: &mut SagaContext) -> std::result::Result<(), BoxError> {
        Ok(())
    }

    async fn on_before_compensate(
        &self,
        _context: &mut SagaContext,
    ) -> std::result::Result<(), BoxError> {
        Ok(())
    }

    async fn on_after_compensate(
        &self,
        _context: &mut SagaContext,
    ) -> std::result::Result<(), BoxError> {
        Ok(())
    }
}

/// Default hook set: every hook is a no-op
pub struct NoopHooks;

#[async_trait]
impl SagaHooks for NoopHooks {}

/// Orchestrator for one long-running business transaction: an ordered,
/// named collection of steps sharing one execution context.
///
/// `execute` drives steps in declared order and is one-shot. On
/// unrecoverable step failure the saga compensates completed steps in
/// reverse order (when compensation is enabled) and re-raises the original
/// error. Pause, resume, and cancel are cooperative, observed at step
/// boundaries only; all control methods take `&self`, so a saga shared
/// through an `Arc` can be controlled while `execute` is in flight.
pub struct Saga {
    config: SagaConfig,
    steps: Vec<SagaStep>,
    hooks: Arc<dyn SagaHooks>,
    saga_id: Uuid,
    aggregate_id: Uuid,
    context: Mutex<SagaContext>,
    status: RwLock<SagaStatus>,
    statistics: RwLock<ExecutionStatistics>,
    cancel_reason: RwLock<Option<String>>,
    events: EventPublisher,
    resume_signal: Notify,
}

impl Saga {
    pub(crate) fn new(
        config: SagaConfig,
        aggregate_id: Uuid,
        steps: Vec<SagaStep>,
        hooks: Arc<dyn SagaHooks>,
        events: EventPublisher,
    ) -> Self {
        let saga_id = Uuid::new_v4();
        Self {
            context: Mutex::new(SagaContext::new(saga_id, aggregate_id)),
            config,
            steps,
            hooks,
            saga_id,
            aggregate_id,
            status: RwLock::new(SagaStatus::NotStarted),
            statistics: RwLock::new(ExecutionStatistics::default()),
            cancel_reason: RwLock::new(None),
            events,
            resume_signal: Notify::new(),
        }
    }

    /// Start building a saga for the given aggregate
    pub fn builder(config: SagaConfig, aggregate_id: Uuid) -> crate::orchestration::SagaBuilder {
        crate::orchestration::SagaBuilder::new(config, aggregate_id)
    }

    /// Run the saga forward. One-shot: any status other than `NotStarted`
    /// fails with `AlreadyExecuted`. A disabled saga no-ops with a warning.
    /// Cancellation observed mid-run returns `Ok` — partial execution is
    /// intentional, visible through per-step statuses.
    #[instrument(skip_all, fields(saga = %self.config.name, saga_id = %self.saga_id))]
    pub async fn execute(&self, data: HashMap<String, Value>) -> Result<()> {
        {
            let status = self.status.read();
            if *status != SagaStatus::NotStarted {
                return Err(SagaError::AlreadyExecuted { status: *status });
            }
        }

        if !self.config.enabled {
            warn!("Saga disabled, skipping execution");
            return Ok(());
        }

        {
            let mut status = self.status.write();
            if *status != SagaStatus::NotStarted {
                return Err(SagaError::AlreadyExecuted { status: *status });
            }
            self.statistics.write().begin_execution();
            *status = SagaStatus::Running;
        }

        info!(steps = self.steps.len(), "Saga execution started");
        self.publish(names::SAGA_STARTED, json!({ "steps": self.steps.len() }));

        {
            let mut context = self.context.lock().await;
            context.merge_data(data);
            if let Err(source) = self.hooks.on_before_execute(&mut context).await {
                drop(context);
                let hook_error = SagaError::HookFailed {
                    scope: self.config.name.clone(),
                    hook: "on_before_execute",
                    source,
                };
                return self.fail_and_maybe_compensate(hook_error, 0).await;
            }
        }

        let started = Instant::now();
        let run = timeout(self.config.timeout, self.execute_steps()).await;
        let elapsed_ms = started.elapsed().as_millis() as u64;

        match run {
            Ok(Ok(())) => {
                if self.status() == SagaStatus::Cancelled {
                    info!(elapsed_ms, "Saga cancelled during execution");
                    return Ok(());
                }

                {
                    let mut context = self.context.lock().await;
                    if let Err(source) = self.hooks.on_after_execute(&mut context).await {
                        drop(context);
                        let hook_error = SagaError::HookFailed {
                            scope: self.config.name.clone(),
                            hook: "on_after_execute",
                            source,
                        };
                        return self.fail_and_maybe_compensate(hook_error, elapsed_ms).await;
                    }
                }

                *self.status.write() = SagaStatus::Completed;
                self.statistics.write().finish_success(elapsed_ms);
                info!(elapsed_ms, "Saga completed");
                self.publish(names::SAGA_COMPLETED, json!({ "elapsed_ms": elapsed_ms }));
                Ok(())
            }
            Ok(Err(step_error)) => self.fail_and_maybe_compensate(step_error, elapsed_ms).await,
            Err(_) => {
                let timeout_error = SagaError::SagaTimeout {
                    saga: self.config.name.clone(),
                    timeout_ms: self.config.timeout.as_millis() as u64,
                };
                self.fail_and_maybe_compensate(timeout_error, elapsed_ms).await
            }
        }
    }

    /// Mark the saga failed, then compensate when enabled. The original
    /// error is re-raised unchanged; a compensation failure is logged and
    /// left detectable through per-step statuses.
    async fn fail_and_maybe_compensate(&self, error: SagaError, elapsed_ms: u64) -> Result<()> {
        *self.status.write() = SagaStatus::Failed;
        {
            let mut context = self.context.lock().await;
            context.record_error(error.to_string());
        }
        self.statistics.write().finish_failure(elapsed_ms);
        error!(error = %error, elapsed_ms, "Saga failed");
        self.publish(names::SAGA_FAILED, json!({ "error": error.to_string() }));

        if self.config.compensation.enabled {
            if let Err(compensation_error) = self
                .compensate(Some(format!("execution failed: {error}")))
                .await
            {
                error!(
                    error = %compensation_error,
                    "Compensation failed after execution failure; rollback is partial"
                );
            }
        }

        Err(error)
    }

    /// Iterate steps in declared order, observing cancel/pause at each
    /// boundary. A step error aborts the loop and propagates; there is no
    /// compensation at this layer.
    async fn execute_steps(&self) -> Result<()> {
        for (index, step) in self.steps.iter().enumerate() {
            loop {
                match self.status() {
                    SagaStatus::Cancelled => {
                        debug!(executed_steps = index, "Cancellation observed at step boundary");
                        return Ok(());
                    }
                    SagaStatus::Paused => {
                        let resumed = self.resume_signal.notified();
                        tokio::pin!(resumed);
                        // Register interest before re-checking: a resume or
                        // cancel landing between the check and the await
                        // would otherwise be missed.
                        resumed.as_mut().enable();
                        if self.status() == SagaStatus::Paused {
                            resumed.await;
                        }
                    }
                    _ => break,
                }
            }

            let mut context = self.context.lock().await;
            context.advance_to_step(index);
            debug!(step = step.name(), index, "Executing step");
            self.publish(
                names::STEP_STARTED,
                json!({ "step": step.name(), "index": index }),
            );

            let outcome = step.execute(&mut context).await;
            context.touch();
            drop(context);

            match outcome {
                Ok(_) => {
                    let event = if step.status() == StepStatus::Skipped {
                        names::STEP_SKIPPED
                    } else {
                        names::STEP_COMPLETED
                    };
                    self.publish(event, json!({ "step": step.name(), "index": index }));
                }
                Err(step_error) => {
                    self.publish(
                        names::STEP_FAILED,
                        json!({
                            "step": step.name(),
                            "index": index,
                            "error": step_error.to_string(),
                        }),
                    );
                    return Err(step_error);
                }
            }
        }
        Ok(())
    }

    /// Roll back completed steps in reverse order. No-op when already
    /// compensated or when compensation is disabled. The status moves to
    /// `Compensated` eagerly; a mid-rollback failure leaves the remaining
    /// completed steps uncompensated and detectable.
    #[instrument(skip_all, fields(saga = %self.config.name, saga_id = %self.saga_id))]
    pub async fn compensate(&self, reason: Option<String>) -> Result<()> {
        {
            let status = self.status.read();
            if *status == SagaStatus::Compensated {
                debug!("Saga already compensated");
                return Ok(());
            }
        }

        if !self.config.compensation.enabled {
            warn!("Compensation disabled, skipping");
            return Ok(());
        }

        *self.status.write() = SagaStatus::Compensated;
        let reason = reason.unwrap_or_else(|| "saga compensation requested".to_string());
        {
            let mut context = self.context.lock().await;
            context.compensation_reason = Some(reason.clone());
            context.touch();
        }

        info!(reason = %reason, "Saga compensation started");
        self.publish(names::SAGA_COMPENSATION_STARTED, json!({ "reason": reason }));

        {
            let mut context = self.context.lock().await;
            if let Err(source) = self.hooks.on_before_compensate(&mut context).await {
                return Err(SagaError::HookFailed {
                    scope: self.config.name.clone(),
                    hook: "on_before_compensate",
                    source,
                });
            }
        }

        self.execute_compensation_steps().await?;

        {
            let mut context = self.context.lock().await;
            if let Err(source) = self.hooks.on_after_compensate(&mut context).await {
                return Err(SagaError::HookFailed {
                    scope: self.config.name.clone(),
                    hook: "on_after_compensate",
                    source,
                });
            }
        }

        self.statistics.write().record_compensation();
        info!("Saga compensated");
        self.publish(names::SAGA_COMPENSATED, json!({}));
        Ok(())
    }

    /// Compensate completed steps in reverse declared order; pending,
    /// failed, and skipped steps are untouched. The first compensation
    /// error aborts the loop.
    async fn execute_compensation_steps(&self) -> Result<()> {
        for (index, step) in self.steps.iter().enumerate().rev() {
            if step.status() != StepStatus::Completed {
                continue;
            }

            let mut context = self.context.lock().await;
            debug!(step = step.name(), index, "Compensating step");
            let outcome = step.compensate(&mut context).await;
            context.touch();
            drop(context);

            outcome?;
            self.publish(
                names::STEP_COMPENSATED,
                json!({ "step": step.name(), "index": index }),
            );
        }
        Ok(())
    }

    /// Park forward execution at the next step boundary. Only valid while
    /// running.
    pub fn pause(&self) -> Result<()> {
        {
            let mut status = self.status.write();
            if *status != SagaStatus::Running {
                return Err(SagaError::NotRunning { status: *status });
            }
            *status = SagaStatus::Paused;
        }
        info!(saga = %self.config.name, saga_id = %self.saga_id, "Saga paused");
        self.publish(names::SAGA_PAUSED, json!({}));
        Ok(())
    }

    /// Resume a paused saga. Only valid while paused.
    pub fn resume(&self) -> Result<()> {
        {
            let mut status = self.status.write();
            if *status != SagaStatus::Paused {
                return Err(SagaError::NotPaused { status: *status });
            }
            *status = SagaStatus::Running;
        }
        self.resume_signal.notify_waiters();
        info!(saga = %self.config.name, saga_id = %self.saga_id, "Saga resumed");
        self.publish(names::SAGA_RESUMED, json!({}));
        Ok(())
    }

    /// Cancel the saga. No-op when already completed or cancelled;
    /// otherwise transitions unconditionally from any state. Takes effect
    /// at the next step boundary, never mid-step.
    pub fn cancel(&self, reason: Option<String>) {
        {
            let mut status = self.status.write();
            if matches!(*status, SagaStatus::Completed | SagaStatus::Cancelled) {
                return;
            }
            *status = SagaStatus::Cancelled;
        }
        *self.cancel_reason.write() = reason.clone();
        self.resume_signal.notify_waiters();
        info!(
            saga = %self.config.name,
            saga_id = %self.saga_id,
            reason = reason.as_deref().unwrap_or("none"),
            "Saga cancelled"
        );
        self.publish(names::SAGA_CANCELLED, json!({ "reason": reason }));
    }

    fn publish(&self, event_name: &str, mut context: Value) {
        if let Some(fields) = context.as_object_mut() {
            fields.insert("saga_id".to_string(), json!(self.saga_id.to_string()));
            fields.insert("saga".to_string(), json!(self.config.name));
        }
        self.events.publish(event_name, context);
    }

    // --- Read accessors ---

    pub fn saga_id(&self) -> Uuid {
        self.saga_id
    }

    pub fn aggregate_id(&self) -> Uuid {
        self.aggregate_id
    }

    pub fn name(&self) -> &str {
        &self.config.name
    }

    pub fn config(&self) -> &SagaConfig {
        &self.config
    }

    pub fn status(&self) -> SagaStatus {
        *self.status.read()
    }

    pub fn statistics(&self) -> ExecutionStatistics {
        self.statistics.read().clone()
    }

    /// Point-in-time clone of the execution context. Waits for the current
    /// step to finish if one is in flight.
    pub async fn context(&self) -> SagaContext {
        self.context.lock().await.clone()
    }

    pub fn steps(&self) -> &[SagaStep] {
        &self.steps
    }

    pub fn step_count(&self) -> usize {
        self.steps.len()
    }

    pub fn step(&self, index: usize) -> Option<&SagaStep> {
        self.steps.get(index)
    }

    pub fn step_statuses(&self) -> Vec<(String, StepStatus)> {
        self.steps
            .iter()
            .map(|step| (step.name().to_string(), step.status()))
            .collect()
    }

    /// Index of the step last started, if any
    pub async fn current_step_index(&self) -> Option<usize> {
        self.context.lock().await.current_step_index
    }

    /// The step last started, if any
    pub async fn current_step(&self) -> Option<&SagaStep> {
        let index = self.current_step_index().await?;
        self.steps.get(index)
    }

    pub fn cancel_reason(&self) -> Option<String> {
        self.cancel_reason.read().clone()
    }

    pub fn is_terminal(&self) -> bool {
        self.status().is_terminal()
    }

    pub fn is_completed(&self) -> bool {
        self.status() == SagaStatus::Completed
    }

    pub fn is_compensated(&self) -> bool {
        self.status() == SagaStatus::Compensated
    }

    pub fn is_cancelled(&self) -> bool {
        self.status() == SagaStatus::Cancelled
    }

    /// Subscribe-capable handle to this saga's lifecycle events
    pub fn event_publisher(&self) -> &EventPublisher {
        &self.events
    }
}

impl std::fmt::Debug for Saga {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Saga")
            .field("name", &self.config.name)
            .field("saga_id", &self.saga_id)
            .field("status", &self.status())
            .field("steps", &self.steps.len())
            .finish()
    }
}
