//! Runner Result Types
//!
//! Per-test results, the run summary, and the fatal errors that abort a
//! whole run (as opposed to failing a single test).

use chrono::{DateTime, Utc};
use serde::Serialize;
use thiserror::Error;

/// Outcome of one test unit.
#[derive(Serialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum TestStatus {
    Passed,
    /// An assertion observed a mismatch.
    Failed,
    /// An infrastructure or language fault, including syntax errors.
    Error,
}

/// The recorded result of one test unit.
#[derive(Serialize, Debug, Clone)]
pub struct TestResult {
    pub name: String,
    pub file: String,
    pub status: TestStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    pub duration_ms: u64,
    /// Retries consumed (0 when the first attempt decided the outcome).
    pub retries: u32,
    pub finished_at: DateTime<Utc>,
}

impl TestResult {
    pub fn passed(&self) -> bool {
        self.status == TestStatus::Passed
    }
}

/// Aggregate outcome of a run.
#[derive(Serialize, Debug, Clone)]
pub struct RunSummary {
    pub total: usize,
    pub passed: usize,
    pub failed: usize,
    pub errors: usize,
    pub duration_ms: u64,
    pub results: Vec<TestResult>,
}

impl RunSummary {
    /// Build a summary from results, ordered by file then test name so the
    /// output is stable regardless of completion order.
    pub fn from_results(mut results: Vec<TestResult>, duration_ms: u64) -> Self {
        results.sort_by(|a, b| (&a.file, &a.name).cmp(&(&b.file, &b.name)));
        let passed = results.iter().filter(|r| r.status == TestStatus::Passed).count();
        let failed = results.iter().filter(|r| r.status == TestStatus::Failed).count();
        let errors = results.iter().filter(|r| r.status == TestStatus::Error).count();
        Self {
            total: results.len(),
            passed,
            failed,
            errors,
            duration_ms,
            results,
        }
    }

    pub fn all_passed(&self) -> bool {
        self.failed == 0 && self.errors == 0
    }
}

/// A fault that aborts the whole run rather than failing one test.
#[derive(Error, Debug)]
pub enum RunnerError {
    #[error("cannot read {path}: {source}")]
    ReadFile {
        path: String,
        source: std::io::Error,
    },

    #[error("session setup failed: {reason}")]
    Session { reason: String },

    #[error("worker pool failure: {reason}")]
    Pool { reason: String },
}

#[cfg(test)]
mod tests {
    use super::*;

    fn result(file: &str, name: &str, status: TestStatus) -> TestResult {
        TestResult {
            name: name.to_string(),
            file: file.to_string(),
            status,
            message: None,
            duration_ms: 1,
            retries: 0,
            finished_at: Utc::now(),
        }
    }

    #[test]
    fn test_summary_counts_and_ordering() {
        let summary = RunSummary::from_results(
            vec![
                result("b.ws", "z", TestStatus::Failed),
                result("a.ws", "y", TestStatus::Passed),
                result("a.ws", "x", TestStatus::Error),
            ],
            12,
        );
        assert_eq!(summary.total, 3);
        assert_eq!(summary.passed, 1);
        assert_eq!(summary.failed, 1);
        assert_eq!(summary.errors, 1);
        assert!(!summary.all_passed());

        let order: Vec<(&str, &str)> = summary
            .results
            .iter()
            .map(|r| (r.file.as_str(), r.name.as_str()))
            .collect();
        assert_eq!(order, vec![("a.ws", "x"), ("a.ws", "y"), ("b.ws", "z")]);
    }

    #[test]
    fn test_status_serializes_lowercase() {
        let json = serde_json::to_string(&TestStatus::Passed).unwrap();
        assert_eq!(json, "\"passed\"");
    }
}
