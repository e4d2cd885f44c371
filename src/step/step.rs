use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::time::{sleep, timeout};
use tracing::{debug, warn};

use crate::config::{RetryConfig, StepConfig};
use crate::context::SagaContext;
use crate::error::{BoxError, Result, SagaError};
use crate::states::StepStatus;
use crate::statistics::ExecutionStatistics;
use crate::step::handler::StepHandler;

/// Outcome of one step execution, cached per step.
///
/// `execution_time_ms` spans all retries, including backoff delays.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StepExecutionResult {
    pub success: bool,
    pub data: Option<Value>,
    pub error: Option<String>,
    pub execution_time_ms: u64,
    pub retry_count: u32,
    pub needs_compensation: bool,
}

impl StepExecutionResult {
    fn success(data: Value, execution_time_ms: u64, retry_count: u32, needs_compensation: bool) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
            execution_time_ms,
            retry_count,
            needs_compensation,
        }
    }

    /// Result for a disabled or skipped step: success, zero work
    fn noop() -> Self {
        Self {
            success: true,
            data: None,
            error: None,
            execution_time_ms: 0,
            retry_count: 0,
            needs_compensation: false,
        }
    }

    fn failure(error: String, execution_time_ms: u64, retry_count: u32) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(error),
            execution_time_ms,
            retry_count,
            needs_compensation: false,
        }
    }
}

enum AttemptError {
    Timeout,
    Body(BoxError),
}

/// A named unit of work inside a saga: forward body, compensating body,
/// retry/timeout policies, and hook points.
///
/// Created once at saga construction and retained for the saga's lifetime;
/// status, statistics, and the last result are interior-mutable so the saga
/// can expose them while execution is in flight.
pub struct SagaStep {
    config: StepConfig,
    handler: Arc<dyn StepHandler>,
    status: RwLock<StepStatus>,
    statistics: RwLock<ExecutionStatistics>,
    last_result: RwLock<Option<StepExecutionResult>>,
}

impl SagaStep {
    pub fn new(config: StepConfig, handler: Arc<dyn StepHandler>) -> Self {
        Self {
            config,
            handler,
            status: RwLock::new(StepStatus::Pending),
            statistics: RwLock::new(ExecutionStatistics::default()),
            last_result: RwLock::new(None),
        }
    }

    pub fn name(&self) -> &str {
        &self.config.name
    }

    pub fn config(&self) -> &StepConfig {
        &self.config
    }

    pub fn status(&self) -> StepStatus {
        *self.status.read()
    }

    pub fn statistics(&self) -> ExecutionStatistics {
        self.statistics.read().clone()
    }

    pub fn last_result(&self) -> Option<StepExecutionResult> {
        self.last_result.read().clone()
    }

    /// Run the forward body: condition check, before-hook, timed invocation
    /// with bounded exponential-backoff retries, then after/error hook.
    pub async fn execute(&self, context: &mut SagaContext) -> Result<StepExecutionResult> {
        let step = self.config.name.as_str();

        if !self.config.enabled {
            debug!(step = step, "Step disabled, skipping execution");
            let result = StepExecutionResult::noop();
            *self.last_result.write() = Some(result.clone());
            return Ok(result);
        }

        self.statistics.write().begin_execution();

        if self.config.condition.enabled {
            match self.handler.check_condition(context).await {
                Ok(true) => {}
                Ok(false) => {
                    debug!(
                        step = step,
                        expression = self.config.condition.expression.as_deref(),
                        "Step condition false, skipping"
                    );
                    *self.status.write() = StepStatus::Skipped;
                    let result = StepExecutionResult::noop();
                    *self.last_result.write() = Some(result.clone());
                    return Ok(result);
                }
                Err(source) => {
                    let error = SagaError::HookFailed {
                        scope: step.to_string(),
                        hook: "check_condition",
                        source,
                    };
                    return self.fail(context, error, 0, 0).await;
                }
            }
        }

        *self.status.write() = StepStatus::Running;

        if let Err(source) = self.handler.on_before_execute(context).await {
            let error = SagaError::HookFailed {
                scope: step.to_string(),
                hook: "on_before_execute",
                source,
            };
            return self.fail(context, error, 0, 0).await;
        }

        let started = Instant::now();
        let mut attempt: u32 = 0;
        let last_error = loop {
            attempt += 1;
            let outcome = match timeout(self.config.timeout, self.handler.execute(context)).await {
                Ok(Ok(value)) => Ok(value),
                Ok(Err(source)) => Err(AttemptError::Body(source)),
                Err(_) => Err(AttemptError::Timeout),
            };

            match outcome {
                Ok(value) => {
                    let execution_time_ms = started.elapsed().as_millis() as u64;
                    let result = StepExecutionResult::success(
                        value,
                        execution_time_ms,
                        attempt - 1,
                        self.config.compensation.enabled,
                    );
                    *self.status.write() = StepStatus::Completed;
                    self.statistics.write().finish_success(execution_time_ms);
                    *self.last_result.write() = Some(result.clone());
                    debug!(
                        step = step,
                        duration_ms = execution_time_ms,
                        retries = attempt - 1,
                        "Step completed"
                    );

                    if let Err(source) = self.handler.on_after_execute(context, &result).await {
                        // The body's side effect is real: the step stays
                        // completed so compensation still covers it.
                        return Err(SagaError::HookFailed {
                            scope: step.to_string(),
                            hook: "on_after_execute",
                            source,
                        });
                    }
                    return Ok(result);
                }
                Err(attempt_error) => {
                    if attempt >= self.config.retry.max_attempts {
                        break attempt_error;
                    }
                    let delay = backoff_delay(&self.config.retry, attempt);
                    warn!(
                        step = step,
                        attempt = attempt,
                        max_attempts = self.config.retry.max_attempts,
                        delay_ms = delay.as_millis() as u64,
                        timed_out = matches!(attempt_error, AttemptError::Timeout),
                        "Step attempt failed, backing off before retry"
                    );
                    sleep(delay).await;
                }
            }
        };

        let execution_time_ms = started.elapsed().as_millis() as u64;
        let error = match last_error {
            AttemptError::Timeout => SagaError::StepTimeout {
                step: step.to_string(),
                timeout_ms: self.config.timeout.as_millis() as u64,
            },
            AttemptError::Body(source) => SagaError::StepFailed {
                step: step.to_string(),
                attempts: attempt,
                source,
            },
        };
        self.fail(context, error, execution_time_ms, attempt - 1).await
    }

    async fn fail(
        &self,
        context: &mut SagaContext,
        error: SagaError,
        execution_time_ms: u64,
        retry_count: u32,
    ) -> Result<StepExecutionResult> {
        *self.status.write() = StepStatus::Failed;
        self.statistics.write().finish_failure(execution_time_ms);
        *self.last_result.write() = Some(StepExecutionResult::failure(
            error.to_string(),
            execution_time_ms,
            retry_count,
        ));
        warn!(step = %self.config.name, error = %error, "Step failed");
        self.handler.on_error(context, &error).await;
        Err(error)
    }

    /// Run the compensating body. No-op success unless the step completed
    /// and compensation is enabled; otherwise mirrors `execute` with the
    /// compensation timeout and attempt budget.
    pub async fn compensate(&self, context: &mut SagaContext) -> Result<()> {
        let step = self.config.name.as_str();

        if self.status() != StepStatus::Completed || !self.config.compensation.enabled {
            debug!(
                step = step,
                status = %self.status(),
                compensation_enabled = self.config.compensation.enabled,
                "Skipping compensation"
            );
            return Ok(());
        }

        if let Err(source) = self.handler.on_before_compensate(context).await {
            let error = SagaError::HookFailed {
                scope: step.to_string(),
                hook: "on_before_compensate",
                source,
            };
            self.handler.on_compensation_error(context, &error).await;
            return Err(error);
        }

        let mut attempt: u32 = 0;
        let last_error = loop {
            attempt += 1;
            let outcome = match timeout(
                self.config.compensation.timeout,
                self.handler.compensate(context),
            )
            .await
            {
                Ok(Ok(())) => Ok(()),
                Ok(Err(source)) => Err(AttemptError::Body(source)),
                Err(_) => Err(AttemptError::Timeout),
            };

            match outcome {
                Ok(()) => {
                    *self.status.write() = StepStatus::Compensated;
                    self.statistics.write().record_compensation();
                    debug!(step = step, retries = attempt - 1, "Step compensated");

                    if let Err(source) = self.handler.on_after_compensate(context).await {
                        return Err(SagaError::HookFailed {
                            scope: step.to_string(),
                            hook: "on_after_compensate",
                            source,
                        });
                    }
                    return Ok(());
                }
                Err(attempt_error) => {
                    if attempt >= self.config.compensation.max_attempts {
                        break attempt_error;
                    }
                    // Compensation reuses the step's backoff curve.
                    let delay = backoff_delay(&self.config.retry, attempt);
                    warn!(
                        step = step,
                        attempt = attempt,
                        max_attempts = self.config.compensation.max_attempts,
                        delay_ms = delay.as_millis() as u64,
                        "Compensation attempt failed, backing off before retry"
                    );
                    sleep(delay).await;
                }
            }
        };

        let error = match last_error {
            AttemptError::Timeout => SagaError::StepCompensationTimeout {
                step: step.to_string(),
                timeout_ms: self.config.compensation.timeout.as_millis() as u64,
            },
            AttemptError::Body(source) => SagaError::CompensationFailed {
                step: step.to_string(),
                attempts: attempt,
                source,
            },
        };
        warn!(step = step, error = %error, "Step compensation failed");
        self.handler.on_compensation_error(context, &error).await;
        Err(error)
    }
}

impl std::fmt::Debug for SagaStep {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SagaStep")
            .field("name", &self.config.name)
            .field("status", &self.status())
            .finish()
    }
}

/// Exponential backoff for the retry following the given 1-based attempt:
/// `backoff_ms * multiplier^(attempt-1)`, optionally jittered upward by at
/// most 10%, capped at `max_backoff_ms`.
pub(crate) fn backoff_delay(retry: &RetryConfig, attempt: u32) -> Duration {
    let exponent = attempt.saturating_sub(1).min(30) as i32;
    let mut delay_ms = retry.backoff_ms as f64 * retry.multiplier.powi(exponent);
    if retry.jitter {
        delay_ms *= 1.0 + fastrand::f64() * 0.1;
    }
    Duration::from_millis(delay_ms.min(retry.max_backoff_ms as f64) as u64)
}
