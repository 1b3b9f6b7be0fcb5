//! Pure summary computation over recorded steps.
//!
//! Both functions here are deterministic over a fixed step sequence and have
//! no side effects; the reporter calls them during finalization and callers
//! may invoke them freely on their own step slices.

use serde::{Deserialize, Serialize};

use crate::types::{TestStatus, TestStep};

/// Aggregate numeric counts for a session
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Summary {
    /// Number of recorded steps
    pub total: usize,

    /// Steps with status `Passed`
    pub passed: usize,

    /// Steps with status `Failed`
    pub failed: usize,

    /// Steps with status `Skipped`
    pub skipped: usize,

    /// Sum of step durations in millis (not session wall-clock time)
    pub duration: i64,
}

/// Compute per-status counts and total step duration.
pub fn summarize(steps: &[TestStep]) -> Summary {
    let mut summary = Summary {
        total: steps.len(),
        ..Default::default()
    };

    for step in steps {
        match step.status {
            TestStatus::Passed => summary.passed += 1,
            TestStatus::Failed => summary.failed += 1,
            TestStatus::Skipped => summary.skipped += 1,
        }
        summary.duration += step.duration;
    }

    summary
}

/// Compute the aggregate session status.
///
/// Empty sequence counts as passed. Any failure makes the session failed.
/// A non-empty all-skipped run is reported as skipped; a mix of skipped and
/// passed counts as passed.
pub fn aggregate_status(steps: &[TestStep]) -> TestStatus {
    if steps.is_empty() {
        return TestStatus::Passed;
    }

    if steps.iter().any(|s| s.status == TestStatus::Failed) {
        return TestStatus::Failed;
    }

    if steps.iter().all(|s| s.status == TestStatus::Skipped) {
        return TestStatus::Skipped;
    }

    TestStatus::Passed
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn step(status: TestStatus, duration: i64) -> TestStep {
        TestStep {
            name: "step".to_string(),
            status,
            description: None,
            error: None,
            screenshot: None,
            timestamp: 0,
            duration,
        }
    }

    #[test]
    fn test_summary_counts_and_duration() {
        let steps = vec![
            step(TestStatus::Passed, 10),
            step(TestStatus::Failed, 25),
            step(TestStatus::Skipped, 0),
            step(TestStatus::Passed, 5),
        ];

        let summary = summarize(&steps);
        assert_eq!(summary.total, 4);
        assert_eq!(summary.passed, 2);
        assert_eq!(summary.failed, 1);
        assert_eq!(summary.skipped, 1);
        assert_eq!(summary.duration, 40);
        assert_eq!(
            summary.passed + summary.failed + summary.skipped,
            summary.total
        );
    }

    #[test]
    fn test_summary_empty() {
        assert_eq!(summarize(&[]), Summary::default());
    }

    #[test]
    fn test_summary_is_idempotent() {
        let steps = vec![step(TestStatus::Passed, 7), step(TestStatus::Skipped, 0)];
        assert_eq!(summarize(&steps), summarize(&steps));
    }

    #[test]
    fn test_aggregate_empty_is_passed() {
        assert_eq!(aggregate_status(&[]), TestStatus::Passed);
    }

    #[test]
    fn test_aggregate_any_failure_dominates() {
        let steps = vec![
            step(TestStatus::Passed, 1),
            step(TestStatus::Skipped, 0),
            step(TestStatus::Failed, 1),
        ];
        assert_eq!(aggregate_status(&steps), TestStatus::Failed);
    }

    #[test]
    fn test_aggregate_all_skipped() {
        let steps = vec![step(TestStatus::Skipped, 0), step(TestStatus::Skipped, 0)];
        assert_eq!(aggregate_status(&steps), TestStatus::Skipped);
    }

    #[test]
    fn test_aggregate_mixed_skip_and_pass_is_passed() {
        let steps = vec![step(TestStatus::Skipped, 0), step(TestStatus::Passed, 3)];
        assert_eq!(aggregate_status(&steps), TestStatus::Passed);
    }
}
