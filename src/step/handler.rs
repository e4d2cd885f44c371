use async_trait::async_trait;
use serde_json::Value;
use std::future::Future;
use std::pin::Pin;

use crate::context::SagaContext;
use crate::error::{BoxError, SagaError};
use crate::step::step::StepExecutionResult;

/// Contract for one unit of forward work and its undo action.
///
/// Only `execute` is required. Compensation defaults to a safe no-op,
/// the condition defaults to true, and every hook defaults to doing
/// nothing, so simple steps implement a single method.
#[async_trait]
pub trait StepHandler: Send + Sync {
    /// Forward body. The returned value is stored as the step's result data.
    async fn execute(&self, context: &mut SagaContext) -> Result<Value, BoxError>;

    /// Undo the forward body's side effect.
    async fn compensate(&self, _context: &mut SagaContext) -> Result<(), BoxError> {
        Ok(())
    }

    /// Consulted before the body when the step's condition is enabled;
    /// false skips the step without error.
    async fn check_condition(&self, _context: &SagaContext) -> Result<bool, BoxError> {
        Ok(true)
    }

    async fn on_before_execute(&self, _context: &mut SagaContext) -> Result<(), BoxError> {
        Ok(())
    }

    async fn on_after_execute(
        &self,
        _context: &mut SagaContext,
        _result: &StepExecutionResult,
    ) -> Result<(), BoxError> {
        Ok(())
    }

    /// Observes the final (post-retry) failure. Must not fail.
    async fn on_error(&self, _context: &mut SagaContext, _error: &SagaError) {}

    async fn on_before_compensate(&self, _context: &mut SagaContext) -> Result<(), BoxError> {
        Ok(())
    }

    async fn on_after_compensate(&self, _context: &mut SagaContext) -> Result<(), BoxError> {
        Ok(())
    }

    /// Observes the final compensation failure. Must not fail.
    async fn on_compensation_error(&self, _context: &mut SagaContext, _error: &SagaError) {}
}

type ExecuteFn = Box<
    dyn for<'a> Fn(
            &'a mut SagaContext,
        ) -> Pin<Box<dyn Future<Output = Result<Value, BoxError>> + Send + 'a>>
        + Send
        + Sync,
>;

type CompensateFn = Box<
    dyn for<'a> Fn(
            &'a mut SagaContext,
        ) -> Pin<Box<dyn Future<Output = Result<(), BoxError>> + Send + 'a>>
        + Send
        + Sync,
>;

/// Lightweight handler wrapping a plain execute closure and an optional
/// compensate closure. Without a compensate closure, `compensate` is a
/// safe no-op.
///
/// ```rust,no_run
/// use saga_core::step::FnStep;
/// use serde_json::json;
///
/// let step = FnStep::new(|ctx| {
///     Box::pin(async move {
///         ctx.insert("charged", json!(true));
///         Ok(json!({"amount": 100}))
///     })
/// });
/// ```
pub struct FnStep {
    execute: ExecuteFn,
    compensate: Option<CompensateFn>,
}

impl FnStep {
    pub fn new<F>(execute: F) -> Self
    where
        F: for<'a> Fn(
                &'a mut SagaContext,
            )
                -> Pin<Box<dyn Future<Output = Result<Value, BoxError>> + Send + 'a>>
            + Send
            + Sync
            + 'static,
    {
        Self {
            execute: Box::new(execute),
            compensate: None,
        }
    }

    pub fn with_compensation<F, C>(execute: F, compensate: C) -> Self
    where
        F: for<'a> Fn(
                &'a mut SagaContext,
            )
                -> Pin<Box<dyn Future<Output = Result<Value, BoxError>> + Send + 'a>>
            + Send
            + Sync
            + 'static,
        C: for<'a> Fn(
                &'a mut SagaContext,
            )
                -> Pin<Box<dyn Future<Output = Result<(), BoxError>> + Send + 'a>>
            + Send
            + Sync
            + 'static,
    {
        Self {
            execute: Box::new(execute),
            compensate: Some(Box::new(compensate)),
        }
    }
}

#[async_trait]
impl StepHandler for FnStep {
    async fn execute(&self, context: &mut SagaContext) -> Result<Value, BoxError> {
        (self.execute)(context).await
    }

    async fn compensate(&self, context: &mut SagaContext) -> Result<(), BoxError> {
        match &self.compensate {
            Some(compensate) => compensate(context).await,
            None => Ok(()),
        }
    }
}
