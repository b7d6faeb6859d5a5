//! Harness parameters shared by every suite of one invocation.

use std::fmt;
use std::time::Duration;

/// Per-vector timeout handed to the harness unless overridden.
pub const DEFAULT_TIMEOUT_SECONDS: u64 = 300;

/// How many vectors the harness evaluates in parallel within one suite.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Concurrency {
    /// Leave the choice to the harness (no `-j` flag).
    #[default]
    HarnessDefault,
    Fixed(usize),
}

impl fmt::Display for Concurrency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Concurrency::HarnessDefault => f.write_str("harness default"),
            Concurrency::Fixed(jobs) => write!(f, "{jobs}"),
        }
    }
}

/// Optional user overrides collected from the command line.
#[derive(Debug, Clone, Copy, Default)]
pub struct RunOverrides {
    pub jobs: Option<usize>,
    pub timeout_seconds: Option<u64>,
    pub suite_time_limit: Option<Duration>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunConfig {
    pub timeout_seconds: u64,
    pub concurrency: Concurrency,
    /// Wall-clock bound on a whole harness invocation.
    pub suite_time_limit: Option<Duration>,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            timeout_seconds: DEFAULT_TIMEOUT_SECONDS,
            concurrency: Concurrency::HarnessDefault,
            suite_time_limit: None,
        }
    }
}

impl RunConfig {
    /// Resolve the run template. Single-run mode always wins over `jobs`.
    pub fn resolve(single_run: bool, overrides: RunOverrides) -> Self {
        let concurrency = if single_run {
            Concurrency::Fixed(1)
        } else {
            match overrides.jobs {
                Some(jobs) => Concurrency::Fixed(jobs.max(1)),
                None => Concurrency::HarnessDefault,
            }
        };

        Self {
            timeout_seconds: overrides
                .timeout_seconds
                .unwrap_or(DEFAULT_TIMEOUT_SECONDS),
            concurrency,
            suite_time_limit: overrides.suite_time_limit,
        }
    }
}
