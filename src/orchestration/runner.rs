//! # Saga Runner
//!
//! Concurrent execution of many independent sagas. Steps within one saga
//! stay strictly sequential; the runner only bounds how many sagas run
//! side by side, using the saga-type `performance` settings.
//!
//! The engine enforces no cross-saga locking; "at most one saga per
//! aggregate" remains a caller responsibility.

use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::Semaphore;
use tracing::{error, info, instrument};
use uuid::Uuid;

use crate::config::PerformanceConfig;
use crate::orchestration::saga::Saga;
use crate::states::SagaStatus;

/// One saga plus its initial input data
pub struct SagaRun {
    pub saga: Arc<Saga>,
    pub input: HashMap<String, Value>,
}

impl SagaRun {
    pub fn new(saga: Arc<Saga>) -> Self {
        Self {
            saga,
            input: HashMap::new(),
        }
    }

    pub fn with_input(saga: Arc<Saga>, input: HashMap<String, Value>) -> Self {
        Self { saga, input }
    }
}

/// Outcome of one saga execution within a batch
#[derive(Debug, Clone)]
pub struct SagaRunOutcome {
    pub saga_id: Uuid,
    pub name: String,
    pub status: SagaStatus,
    pub error: Option<String>,
}

/// Executes batches of sagas concurrently under a semaphore
pub struct SagaRunner {
    max_concurrency: usize,
    batch_size: usize,
}

impl SagaRunner {
    pub fn new(performance: &PerformanceConfig) -> Self {
        Self {
            max_concurrency: performance.max_concurrency,
            batch_size: performance.batch_size,
        }
    }

    /// Run every saga to its outcome, dispatching `batch_size` sagas per
    /// wave with at most `max_concurrency` executing at once. Outcomes are
    /// returned in submission order; a saga error becomes an outcome, not a
    /// runner failure.
    #[instrument(skip_all, fields(sagas = runs.len()))]
    pub async fn run_all(&self, runs: Vec<SagaRun>) -> Vec<SagaRunOutcome> {
        let semaphore = Arc::new(Semaphore::new(self.max_concurrency));
        let mut outcomes = Vec::with_capacity(runs.len());

        let mut pending = runs;
        while !pending.is_empty() {
            let remainder = pending.split_off(self.batch_size.min(pending.len()));
            let batch = pending;
            pending = remainder;

            let mut handles = Vec::with_capacity(batch.len());
            for run in batch {
                let semaphore = semaphore.clone();
                handles.push(tokio::spawn(async move {
                    let saga = run.saga;
                    let error = match semaphore.acquire().await {
                        Ok(_permit) => saga.execute(run.input).await.err().map(|e| e.to_string()),
                        Err(acquire_error) => {
                            Some(format!("saga runner semaphore closed: {acquire_error}"))
                        }
                    };
                    SagaRunOutcome {
                        saga_id: saga.saga_id(),
                        name: saga.name().to_string(),
                        status: saga.status(),
                        error,
                    }
                }));
            }

            for handle in handles {
                match handle.await {
                    Ok(outcome) => outcomes.push(outcome),
                    Err(join_error) => {
                        error!(error = %join_error, "Saga execution task panicked");
                    }
                }
            }
        }

        info!(
            completed = outcomes
                .iter()
                .filter(|o| o.status == SagaStatus::Completed)
                .count(),
            failed = outcomes
                .iter()
                .filter(|o| o.status != SagaStatus::Completed)
                .count(),
            "Saga batch finished"
        );
        outcomes
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{SagaConfig, StepConfig};
    use crate::step::FnStep;
    use serde_json::json;

    fn quick_saga(name: &str) -> Arc<Saga> {
        Arc::new(
            Saga::builder(SagaConfig::new(name), Uuid::new_v4())
                .step(
                    StepConfig::new("only_step"),
                    Arc::new(FnStep::new(|_ctx| Box::pin(async move { Ok(json!(null)) }))),
                )
                .build()
                .unwrap(),
        )
    }

    #[tokio::test]
    async fn test_run_all_completes_every_saga() {
        let performance = PerformanceConfig {
            max_concurrency: 2,
            batch_size: 3,
        };
        let runner = SagaRunner::new(&performance);

        let runs: Vec<_> = (0..7)
            .map(|i| SagaRun::new(quick_saga(&format!("saga_{i}"))))
            .collect();
        let outcomes = runner.run_all(runs).await;

        assert_eq!(outcomes.len(), 7);
        assert!(outcomes.iter().all(|o| o.status == SagaStatus::Completed));
        assert!(outcomes.iter().all(|o| o.error.is_none()));
    }

    #[tokio::test]
    async fn test_failing_saga_becomes_outcome_not_panic() {
        let failing = Arc::new(
            Saga::builder(
                SagaConfig::new("doomed"),
                Uuid::new_v4(),
            )
            .step(
                StepConfig::new("explode").with_retry(crate::config::RetryConfig {
                    max_attempts: 1,
                    backoff_ms: 1,
                    max_backoff_ms: 1,
                    multiplier: 1.0,
                    jitter: false,
                }),
                Arc::new(FnStep::new(|_ctx| {
                    Box::pin(async move { Err("boom".into()) })
                })),
            )
            .build()
            .unwrap(),
        );

        let runner = SagaRunner::new(&PerformanceConfig::default());
        let outcomes = runner
            .run_all(vec![SagaRun::new(failing), SagaRun::new(quick_saga("fine"))])
            .await;

        assert_eq!(outcomes.len(), 2);
        assert_eq!(outcomes[0].status, SagaStatus::Compensated);
        assert!(outcomes[0].error.as_deref().unwrap().contains("boom"));
        assert_eq!(outcomes[1].status, SagaStatus::Completed);
    }
}
