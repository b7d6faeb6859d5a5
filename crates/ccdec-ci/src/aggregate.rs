//! Folding suite results into the CI verdict.

use crate::driver::SuiteResult;
use crate::matrix::TestSuite;

/// Every suite passed.
pub const EXIT_SUCCESS: i32 = 0;
/// At least one suite failed.
pub const EXIT_SUITES_FAILED: i32 = 1;
/// Configuration or provisioning error; no suite was attempted.
pub const EXIT_SETUP_FAILED: i32 = 2;

#[derive(Debug, Clone, Default)]
pub struct Aggregate {
    results: Vec<SuiteResult>,
}

impl Aggregate {
    pub fn from_results(results: Vec<SuiteResult>) -> Self {
        Self { results }
    }

    pub fn results(&self) -> &[SuiteResult] {
        &self.results
    }

    /// Vacuously true when no suite ran.
    pub fn all_passed(&self) -> bool {
        self.results.iter().all(SuiteResult::success)
    }

    /// Failing suites in execution order.
    pub fn failed_suites(&self) -> Vec<&TestSuite> {
        self.results
            .iter()
            .filter(|result| !result.success())
            .map(|result| &result.suite)
            .collect()
    }

    pub fn passed_count(&self) -> usize {
        self.results.iter().filter(|result| result.success()).count()
    }

    pub fn exit_code(&self) -> i32 {
        if self.all_passed() {
            EXIT_SUCCESS
        } else {
            EXIT_SUITES_FAILED
        }
    }
}
