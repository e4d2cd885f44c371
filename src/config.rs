//! # Saga and Step Configuration
//!
//! Plain configuration structs with defaults merged with overrides at
//! construction time. Configuration is immutable once a saga is built;
//! environment overrides (`SAGA_*` variables) are applied via
//! [`SagaConfig::from_env`].

use crate::error::{Result, SagaError};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Retry policy for step execution and compensation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetryConfig {
    /// Total attempt budget: one initial attempt plus up to
    /// `max_attempts - 1` retries
    pub max_attempts: u32,
    /// Base delay in milliseconds for exponential backoff
    pub backoff_ms: u64,
    /// Maximum delay cap in milliseconds
    pub max_backoff_ms: u64,
    /// Exponential multiplier
    pub multiplier: f64,
    /// Add jitter to retry delays to avoid lock-step retries
    pub jitter: bool,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            backoff_ms: 1000,
            max_backoff_ms: 30_000,
            multiplier: 2.0,
            jitter: true,
        }
    }
}

/// Compensation policy
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompensationConfig {
    /// Whether completed steps are rolled back on failure
    pub enabled: bool,
    /// Timeout for a single compensating invocation
    pub timeout: Duration,
    /// Total attempt budget for the compensating body
    pub max_attempts: u32,
}

impl Default for CompensationConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            timeout: Duration::from_secs(30),
            max_attempts: 3,
        }
    }
}

/// Concurrency settings for running many sagas side by side.
///
/// Steps within one saga are always sequential; these settings only bound
/// the [`SagaRunner`](crate::orchestration::SagaRunner).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PerformanceConfig {
    /// Maximum number of sagas executing concurrently
    pub max_concurrency: usize,
    /// Number of sagas dispatched per batch
    pub batch_size: usize,
}

impl Default for PerformanceConfig {
    fn default() -> Self {
        Self {
            max_concurrency: 10,
            batch_size: 100,
        }
    }
}

/// Conditional-execution settings for a step.
///
/// When enabled, the step's `check_condition` hook is consulted before the
/// body runs; a false result skips the step. `expression` is a descriptive
/// label carried for auditing, not evaluated by the engine.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ConditionConfig {
    pub enabled: bool,
    pub expression: Option<String>,
}

/// Saga-level configuration, unique per saga type
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SagaConfig {
    pub name: String,
    pub description: String,
    pub version: String,
    pub enabled: bool,
    /// Bound on the whole forward step loop
    pub timeout: Duration,
    pub retry: RetryConfig,
    pub compensation: CompensationConfig,
    pub performance: PerformanceConfig,
}

impl SagaConfig {
    /// Create a configuration with defaults for the given saga name
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: String::new(),
            version: "1.0.0".to_string(),
            enabled: true,
            timeout: Duration::from_secs(300),
            retry: RetryConfig::default(),
            compensation: CompensationConfig::default(),
            performance: PerformanceConfig::default(),
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn with_version(mut self, version: impl Into<String>) -> Self {
        self.version = version.into();
        self
    }

    pub fn with_enabled(mut self, enabled: bool) -> Self {
        self.enabled = enabled;
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_retry(mut self, retry: RetryConfig) -> Self {
        self.retry = retry;
        self
    }

    pub fn with_compensation(mut self, compensation: CompensationConfig) -> Self {
        self.compensation = compensation;
        self
    }

    pub fn with_performance(mut self, performance: PerformanceConfig) -> Self {
        self.performance = performance;
        self
    }

    /// Apply `SAGA_*` environment overrides on top of the current values
    pub fn from_env(name: impl Into<String>) -> Result<Self> {
        let mut config = Self::new(name);

        if let Ok(timeout_ms) = std::env::var("SAGA_TIMEOUT_MS") {
            let ms: u64 = timeout_ms.parse().map_err(|e| {
                SagaError::InvalidConfig(format!("Invalid SAGA_TIMEOUT_MS: {e}"))
            })?;
            config.timeout = Duration::from_millis(ms);
        }

        if let Ok(max_attempts) = std::env::var("SAGA_RETRY_MAX_ATTEMPTS") {
            config.retry.max_attempts = max_attempts.parse().map_err(|e| {
                SagaError::InvalidConfig(format!("Invalid SAGA_RETRY_MAX_ATTEMPTS: {e}"))
            })?;
        }

        if let Ok(backoff_ms) = std::env::var("SAGA_RETRY_BACKOFF_MS") {
            config.retry.backoff_ms = backoff_ms.parse().map_err(|e| {
                SagaError::InvalidConfig(format!("Invalid SAGA_RETRY_BACKOFF_MS: {e}"))
            })?;
        }

        if let Ok(max_backoff_ms) = std::env::var("SAGA_RETRY_MAX_BACKOFF_MS") {
            config.retry.max_backoff_ms = max_backoff_ms.parse().map_err(|e| {
                SagaError::InvalidConfig(format!("Invalid SAGA_RETRY_MAX_BACKOFF_MS: {e}"))
            })?;
        }

        if let Ok(max_concurrency) = std::env::var("SAGA_MAX_CONCURRENCY") {
            config.performance.max_concurrency = max_concurrency.parse().map_err(|e| {
                SagaError::InvalidConfig(format!("Invalid SAGA_MAX_CONCURRENCY: {e}"))
            })?;
        }

        config.validate()?;
        Ok(config)
    }

    /// Reject configurations the engine cannot honor
    pub fn validate(&self) -> Result<()> {
        if self.name.is_empty() {
            return Err(SagaError::InvalidConfig("saga name is empty".to_string()));
        }
        if self.retry.max_attempts == 0 {
            return Err(SagaError::InvalidConfig(
                "retry.max_attempts must be at least 1".to_string(),
            ));
        }
        if self.compensation.max_attempts == 0 {
            return Err(SagaError::InvalidConfig(
                "compensation.max_attempts must be at least 1".to_string(),
            ));
        }
        if self.performance.max_concurrency == 0 {
            return Err(SagaError::InvalidConfig(
                "performance.max_concurrency must be at least 1".to_string(),
            ));
        }
        if self.performance.batch_size == 0 {
            return Err(SagaError::InvalidConfig(
                "performance.batch_size must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

/// Step-level configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StepConfig {
    pub name: String,
    pub description: String,
    pub enabled: bool,
    /// Bound on a single forward invocation of the step body
    pub timeout: Duration,
    pub retry: RetryConfig,
    pub compensation: CompensationConfig,
    pub condition: ConditionConfig,
}

impl StepConfig {
    /// Create a configuration with defaults for the given step name
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: String::new(),
            enabled: true,
            timeout: Duration::from_secs(30),
            retry: RetryConfig::default(),
            compensation: CompensationConfig::default(),
            condition: ConditionConfig::default(),
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn with_enabled(mut self, enabled: bool) -> Self {
        self.enabled = enabled;
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_retry(mut self, retry: RetryConfig) -> Self {
        self.retry = retry;
        self
    }

    pub fn with_compensation(mut self, compensation: CompensationConfig) -> Self {
        self.compensation = compensation;
        self
    }

    pub fn with_condition(mut self, condition: ConditionConfig) -> Self {
        self.condition = condition;
        self
    }

    pub fn validate(&self) -> Result<()> {
        if self.name.is_empty() {
            return Err(SagaError::InvalidConfig("step name is empty".to_string()));
        }
        if self.retry.max_attempts == 0 {
            return Err(SagaError::InvalidConfig(format!(
                "step '{}': retry.max_attempts must be at least 1",
                self.name
            )));
        }
        if self.compensation.max_attempts == 0 {
            return Err(SagaError::InvalidConfig(format!(
                "step '{}': compensation.max_attempts must be at least 1",
                self.name
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_merge_with_overrides() {
        let config = SagaConfig::new("order_fulfillment")
            .with_description("order fulfillment flow")
            .with_timeout(Duration::from_secs(60));

        assert_eq!(config.name, "order_fulfillment");
        assert_eq!(config.timeout, Duration::from_secs(60));
        // untouched fields keep defaults
        assert_eq!(config.retry.max_attempts, 3);
        assert!(config.compensation.enabled);
        assert_eq!(config.performance.max_concurrency, 10);
    }

    #[test]
    fn test_zero_attempts_rejected() {
        let mut config = SagaConfig::new("bad");
        config.retry.max_attempts = 0;
        assert!(config.validate().is_err());

        let mut step = StepConfig::new("bad_step");
        step.retry.max_attempts = 0;
        assert!(step.validate().is_err());
    }

    #[test]
    fn test_empty_name_rejected() {
        assert!(SagaConfig::new("").validate().is_err());
        assert!(StepConfig::new("").validate().is_err());
    }

    #[test]
    fn test_condition_defaults_disabled() {
        let step = StepConfig::new("maybe");
        assert!(!step.condition.enabled);
        assert!(step.condition.expression.is_none());
    }
}
