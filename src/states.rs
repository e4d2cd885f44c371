use serde::{Deserialize, Serialize};
use std::fmt;

/// Saga lifecycle state definitions
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SagaStatus {
    /// Initial state when saga is created
    NotStarted,
    /// Saga is currently executing steps
    Running,
    /// All steps completed successfully
    Completed,
    /// A step failed and forward execution stopped
    Failed,
    /// Completed steps were rolled back in reverse order
    Compensated,
    /// Forward execution is parked at a step boundary
    Paused,
    /// Saga was cancelled before completing
    Cancelled,
}

impl SagaStatus {
    /// Check if this is a terminal state (no further transitions allowed)
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed | Self::Cancelled | Self::Compensated)
    }

    /// Check if this is an error state that may still be compensated
    pub fn is_error(&self) -> bool {
        matches!(self, Self::Failed)
    }

    /// Check if this is an active state (saga is being processed)
    pub fn is_active(&self) -> bool {
        matches!(self, Self::Running | Self::Paused)
    }
}

impl fmt::Display for SagaStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotStarted => write!(f, "not_started"),
            Self::Running => write!(f, "running"),
            Self::Completed => write!(f, "completed"),
            Self::Failed => write!(f, "failed"),
            Self::Compensated => write!(f, "compensated"),
            Self::Paused => write!(f, "paused"),
            Self::Cancelled => write!(f, "cancelled"),
        }
    }
}

impl std::str::FromStr for SagaStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "not_started" => Ok(Self::NotStarted),
            "running" => Ok(Self::Running),
            "completed" => Ok(Self::Completed),
            "failed" => Ok(Self::Failed),
            "compensated" => Ok(Self::Compensated),
            "paused" => Ok(Self::Paused),
            "cancelled" => Ok(Self::Cancelled),
            _ => Err(format!("Invalid saga status: {s}")),
        }
    }
}

impl Default for SagaStatus {
    fn default() -> Self {
        Self::NotStarted
    }
}

/// Step state definitions
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StepStatus {
    /// Initial state when step is created
    Pending,
    /// Step is currently being executed
    Running,
    /// Step completed successfully
    Completed,
    /// Step failed after exhausting its retry budget
    Failed,
    /// Step's forward effect was undone
    Compensated,
    /// Step's condition evaluated false; body never ran
    Skipped,
}

impl StepStatus {
    /// Check if this is a terminal state for the step
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            Self::Completed | Self::Failed | Self::Compensated | Self::Skipped
        )
    }

    /// Check if this is an active state (step is being processed)
    pub fn is_active(&self) -> bool {
        matches!(self, Self::Running)
    }

    /// Only completed steps carry a forward effect that compensation must undo
    pub fn needs_compensation(&self) -> bool {
        matches!(self, Self::Completed)
    }
}

impl fmt::Display for StepStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Pending => write!(f, "pending"),
            Self::Running => write!(f, "running"),
            Self::Completed => write!(f, "completed"),
            Self::Failed => write!(f, "failed"),
            Self::Compensated => write!(f, "compensated"),
            Self::Skipped => write!(f, "skipped"),
        }
    }
}

impl std::str::FromStr for StepStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(Self::Pending),
            "running" => Ok(Self::Running),
            "completed" => Ok(Self::Completed),
            "failed" => Ok(Self::Failed),
            "compensated" => Ok(Self::Compensated),
            "skipped" => Ok(Self::Skipped),
            _ => Err(format!("Invalid step status: {s}")),
        }
    }
}

impl Default for StepStatus {
    fn default() -> Self {
        Self::Pending
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_saga_status_terminal_check() {
        assert!(SagaStatus::Completed.is_terminal());
        assert!(SagaStatus::Cancelled.is_terminal());
        assert!(SagaStatus::Compensated.is_terminal());
        assert!(!SagaStatus::NotStarted.is_terminal());
        assert!(!SagaStatus::Running.is_terminal());
        assert!(!SagaStatus::Failed.is_terminal());
        assert!(!SagaStatus::Paused.is_terminal());
    }

    #[test]
    fn test_step_status_compensation_eligibility() {
        assert!(StepStatus::Completed.needs_compensation());
        assert!(!StepStatus::Pending.needs_compensation());
        assert!(!StepStatus::Failed.needs_compensation());
        assert!(!StepStatus::Skipped.needs_compensation());
        assert!(!StepStatus::Compensated.needs_compensation());
    }

    #[test]
    fn test_status_string_conversion() {
        assert_eq!(SagaStatus::NotStarted.to_string(), "not_started");
        assert_eq!(
            "compensated".parse::<SagaStatus>().unwrap(),
            SagaStatus::Compensated
        );

        assert_eq!(StepStatus::Skipped.to_string(), "skipped");
        assert_eq!("failed".parse::<StepStatus>().unwrap(), StepStatus::Failed);
    }

    #[test]
    fn test_status_serde() {
        let status = SagaStatus::Running;
        let json = serde_json::to_string(&status).unwrap();
        assert_eq!(json, "\"running\"");

        let parsed: SagaStatus = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, status);
    }
}
