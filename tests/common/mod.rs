//! Shared helpers for saga integration tests.
#![allow(dead_code)] // not every test binary uses every helper

use parking_lot::Mutex;
use serde_json::json;
use std::sync::Arc;

use saga_core::config::{RetryConfig, StepConfig};
use saga_core::step::FnStep;

/// Records the order of execute/compensate invocations across steps
#[derive(Clone, Default)]
pub struct CallRecorder {
    calls: Arc<Mutex<Vec<String>>>,
}

impl CallRecorder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&self, call: impl Into<String>) {
        self.calls.lock().push(call.into());
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().clone()
    }

    pub fn executed(&self) -> Vec<String> {
        self.filtered("execute:")
    }

    pub fn compensated(&self) -> Vec<String> {
        self.filtered("compensate:")
    }

    fn filtered(&self, prefix: &str) -> Vec<String> {
        self.calls
            .lock()
            .iter()
            .filter_map(|call| call.strip_prefix(prefix).map(str::to_string))
            .collect()
    }
}

/// Retry policy that fails fast and deterministically
pub fn no_retry() -> RetryConfig {
    RetryConfig {
        max_attempts: 1,
        backoff_ms: 1,
        max_backoff_ms: 1,
        multiplier: 1.0,
        jitter: false,
    }
}

/// Step config with a single-attempt retry policy
pub fn step_config(name: &str) -> StepConfig {
    StepConfig::new(name).with_retry(no_retry())
}

/// Step that records its execute and compensate calls and always succeeds
pub fn tracked_step(recorder: &CallRecorder, name: &str) -> Arc<FnStep> {
    let exec_recorder = recorder.clone();
    let exec_name = name.to_string();
    let comp_recorder = recorder.clone();
    let comp_name = name.to_string();

    Arc::new(FnStep::with_compensation(
        move |_ctx| {
            let recorder = exec_recorder.clone();
            let name = exec_name.clone();
            Box::pin(async move {
                recorder.record(format!("execute:{name}"));
                Ok(json!(null))
            })
        },
        move |_ctx| {
            let recorder = comp_recorder.clone();
            let name = comp_name.clone();
            Box::pin(async move {
                recorder.record(format!("compensate:{name}"));
                Ok(())
            })
        },
    ))
}

/// Step that records its execute call, then fails
pub fn failing_step(recorder: &CallRecorder, name: &str, message: &str) -> Arc<FnStep> {
    let recorder = recorder.clone();
    let name = name.to_string();
    let message = message.to_string();

    Arc::new(FnStep::new(move |_ctx| {
        let recorder = recorder.clone();
        let name = name.clone();
        let message = message.clone();
        Box::pin(async move {
            recorder.record(format!("execute:{name}"));
            Err(message.clone().into())
        })
    }))
}
