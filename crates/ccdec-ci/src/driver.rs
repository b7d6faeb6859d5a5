//! Suite execution.
//!
//! Suites run one after another in matrix order. Each one gets a fresh
//! scratch directory for the harness's result files, removed as soon as the
//! outcome is known. A failing suite never stops the loop.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use tracing::{error, info, info_span, warn};

use crate::error::Result;
use crate::harness::{Harness, HarnessInvocation};
use crate::matrix::{Architecture, Codec, Matrix, SuitePlan, TestSuite};
use crate::provision::DecoderBinary;
use crate::run_config::RunConfig;

pub use crate::harness::SuiteOutcome;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SuiteResult {
    pub codec: Codec,
    pub suite: TestSuite,
    pub outcome: SuiteOutcome,
    pub duration: Duration,
}

impl SuiteResult {
    pub fn success(&self) -> bool {
        self.outcome.success()
    }
}

pub struct Driver<H> {
    harness: H,
    work_root: PathBuf,
}

impl<H: Harness> Driver<H> {
    /// `work_root` holds the per-suite scratch directories.
    pub fn new(harness: H, work_root: impl Into<PathBuf>) -> Self {
        Self {
            harness,
            work_root: work_root.into(),
        }
    }

    /// Resolve the plan for `arch` and run it.
    ///
    /// Matrix errors are returned before any suite starts.
    pub fn run_architecture(
        &self,
        matrix: &Matrix,
        arch: Architecture,
        decoder: &DecoderBinary,
        config: &RunConfig,
    ) -> Result<Vec<SuiteResult>> {
        let plan = matrix.plan(arch)?;
        info!(%arch, suites = plan.len(), "running conformance matrix");
        Ok(self.run_all(&plan, decoder, config))
    }

    pub fn run_all(
        &self,
        plan: &[SuitePlan],
        decoder: &DecoderBinary,
        config: &RunConfig,
    ) -> Vec<SuiteResult> {
        plan.iter()
            .map(|entry| self.run_suite(entry, decoder, config))
            .collect()
    }

    fn run_suite(&self, entry: &SuitePlan, decoder: &DecoderBinary, config: &RunConfig) -> SuiteResult {
        let _span = info_span!("suite", codec = %entry.codec, suite = %entry.suite).entered();
        info!(skip = %entry.skip, concurrency = %config.concurrency, "running suite");

        let invocation = HarnessInvocation::new(entry, config);
        let started = Instant::now();

        let outcome = match self.scratch_dir(&entry.suite) {
            Ok(work_dir) => {
                let outcome = self.harness.run(&invocation, work_dir.path(), decoder);
                let path = work_dir.path().to_path_buf();
                if let Err(err) = work_dir.close() {
                    warn!(path = %path.display(), error = %err, "failed to remove suite artifacts");
                }
                outcome
            }
            Err(err) => SuiteOutcome::LaunchFailed {
                reason: format!("creating scratch directory: {err}"),
            },
        };

        let duration = started.elapsed();
        if outcome.success() {
            info!(elapsed_secs = duration.as_secs(), "suite passed");
        } else {
            error!(elapsed_secs = duration.as_secs(), %outcome, "suite failed");
        }

        SuiteResult {
            codec: entry.codec,
            suite: entry.suite.clone(),
            outcome,
            duration,
        }
    }

    fn scratch_dir(&self, suite: &TestSuite) -> std::io::Result<tempfile::TempDir> {
        fs::create_dir_all(&self.work_root)?;
        tempfile::Builder::new()
            .prefix(&format!("{}-", sanitize(suite.as_str())))
            .tempdir_in(&self.work_root)
    }

    pub fn work_root(&self) -> &Path {
        &self.work_root
    }
}

/// Suite names end up in directory names.
fn sanitize(name: &str) -> String {
    name.chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '-' || c == '_' || c == '.' {
                c
            } else {
                '_'
            }
        })
        .collect()
}

#[cfg(test)]
#[path = "tests/driver.rs"]
mod tests;
