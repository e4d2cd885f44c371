//! Property-based invariants over statuses, pagination math, and
//! statistics averaging.

use proptest::prelude::*;
use saga_core::state_store::PageInfo;
use saga_core::states::{SagaStatus, StepStatus};
use saga_core::statistics::ExecutionStatistics;

const SAGA_STATUSES: [SagaStatus; 7] = [
    SagaStatus::NotStarted,
    SagaStatus::Running,
    SagaStatus::Completed,
    SagaStatus::Failed,
    SagaStatus::Compensated,
    SagaStatus::Paused,
    SagaStatus::Cancelled,
];

const STEP_STATUSES: [StepStatus; 6] = [
    StepStatus::Pending,
    StepStatus::Running,
    StepStatus::Completed,
    StepStatus::Failed,
    StepStatus::Compensated,
    StepStatus::Skipped,
];

proptest! {
    #[test]
    fn saga_status_display_round_trips(status in proptest::sample::select(&SAGA_STATUSES[..])) {
        let parsed: SagaStatus = status.to_string().parse().unwrap();
        prop_assert_eq!(parsed, status);
    }

    #[test]
    fn step_status_display_round_trips(status in proptest::sample::select(&STEP_STATUSES[..])) {
        let parsed: StepStatus = status.to_string().parse().unwrap();
        prop_assert_eq!(parsed, status);
    }

    #[test]
    fn total_pages_covers_exactly_the_total(
        page_size in 1usize..1000,
        total in 0usize..100_000,
    ) {
        let info = PageInfo::compute(1, page_size, total);

        // enough pages to hold every row
        prop_assert!(info.total_pages * page_size >= total);
        // and not one page more than needed
        if total > 0 {
            prop_assert!((info.total_pages - 1) * page_size < total);
        } else {
            prop_assert_eq!(info.total_pages, 0);
        }
    }

    #[test]
    fn running_average_stays_within_observed_bounds(
        durations in proptest::collection::vec(0u64..100_000, 1..50),
    ) {
        let mut stats = ExecutionStatistics::default();
        for duration in &durations {
            stats.begin_execution();
            stats.finish_success(*duration);
        }

        let min = *durations.iter().min().unwrap() as f64;
        let max = *durations.iter().max().unwrap() as f64;
        prop_assert!(stats.average_execution_time_ms >= min - 1e-6);
        prop_assert!(stats.average_execution_time_ms <= max + 1e-6);
        prop_assert_eq!(stats.success_count, durations.len() as u64);
    }
}
