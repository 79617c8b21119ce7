//! Exit code logic for the downloader process.
//!
//! Single responsibility: map a batch summary to the process exit outcome.

use csv_downloader_core::BatchSummary;

use crate::ProcessExit;

/// Determines the process exit outcome from completed and failed download counts.
pub(crate) fn determine_exit_outcome(completed: usize, failed: usize) -> ProcessExit {
    if failed == 0 {
        ProcessExit::Success
    } else if completed > 0 {
        ProcessExit::Partial
    } else {
        ProcessExit::Failure
    }
}

/// Exit outcome for a finished batch; an interrupted batch always exits 130.
pub(crate) fn exit_outcome_for_summary(summary: &BatchSummary) -> ProcessExit {
    if summary.cancelled {
        ProcessExit::Cancelled
    } else {
        determine_exit_outcome(summary.succeeded, summary.failed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exit_outcome_success_when_no_failures() {
        assert_eq!(determine_exit_outcome(3, 0), ProcessExit::Success);
    }

    #[test]
    fn test_exit_outcome_success_when_zero_completed_zero_failed() {
        assert_eq!(determine_exit_outcome(0, 0), ProcessExit::Success);
    }

    #[test]
    fn test_exit_outcome_partial_when_mixed() {
        assert_eq!(determine_exit_outcome(2, 1), ProcessExit::Partial);
    }

    #[test]
    fn test_exit_outcome_failure_when_all_failed() {
        assert_eq!(determine_exit_outcome(0, 2), ProcessExit::Failure);
    }

    #[test]
    fn test_exit_outcome_cancelled_summary() {
        let summary = BatchSummary {
            total: 3,
            succeeded: 1,
            failed: 2,
            cancelled: true,
            ..BatchSummary::default()
        };
        assert_eq!(exit_outcome_for_summary(&summary), ProcessExit::Cancelled);
    }

    #[test]
    fn test_exit_outcome_for_complete_summary() {
        let summary = BatchSummary {
            total: 2,
            succeeded: 2,
            ..BatchSummary::default()
        };
        assert_eq!(exit_outcome_for_summary(&summary), ProcessExit::Success);
    }
}
