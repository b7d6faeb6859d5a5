//! Fluster harness invocation.
//!
//! The harness is driven through `fluster_parser.py`:
//!
//! ```text
//! python3 /usr/bin/fluster_parser.py -ts <suite> -d ccdec-<codec> -t <timeout> [-j <n>] [-sv <vector>...]
//! ```
//!
//! It runs with the suite's scratch directory as its working directory, so
//! whatever result files it writes are removed together with that directory.
//! On unix the harness leads its own process group; hitting the suite time
//! limit kills the whole group, decoder processes included.

use std::ffi::OsString;
use std::fmt;
use std::path::{Path, PathBuf};
use std::process::{ExitStatus, Stdio};
use std::time::Duration;

use tokio::process::{Child, Command};
use tracing::{debug, info, warn};

use crate::matrix::{SuitePlan, TestSuite};
use crate::provision::DecoderBinary;
use crate::run_config::{Concurrency, RunConfig};
use crate::skip_list::SkipList;

pub const DEFAULT_PYTHON: &str = "python3";
pub const DEFAULT_HARNESS_SCRIPT: &str = "/usr/bin/fluster_parser.py";

/// Everything the harness needs to run one suite.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HarnessInvocation {
    pub suite: TestSuite,
    pub decoder_adapter: String,
    pub skip: SkipList,
    pub timeout_seconds: u64,
    pub concurrency: Concurrency,
    pub time_limit: Option<Duration>,
}

impl HarnessInvocation {
    pub fn new(plan: &SuitePlan, config: &RunConfig) -> Self {
        Self {
            suite: plan.suite.clone(),
            decoder_adapter: plan.codec.decoder_adapter(),
            skip: plan.skip.clone(),
            timeout_seconds: config.timeout_seconds,
            concurrency: config.concurrency,
            time_limit: config.suite_time_limit,
        }
    }

    /// Harness arguments. `-j` is left out for the harness default and
    /// `-sv` is left out entirely when nothing is skipped.
    pub fn args(&self) -> Vec<String> {
        let mut args = vec![
            "-ts".to_string(),
            self.suite.to_string(),
            "-d".to_string(),
            self.decoder_adapter.clone(),
            "-t".to_string(),
            self.timeout_seconds.to_string(),
        ];
        if let Concurrency::Fixed(jobs) = self.concurrency {
            args.push("-j".to_string());
            args.push(jobs.to_string());
        }
        if !self.skip.is_empty() {
            args.push("-sv".to_string());
            args.extend(self.skip.iter().map(str::to_string));
        }
        args
    }
}

/// Process-level result of one harness run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SuiteOutcome {
    Passed,
    Failed { exit_code: i32 },
    Signaled { signal: i32 },
    TimedOut { limit: Duration },
    LaunchFailed { reason: String },
}

impl SuiteOutcome {
    pub fn success(&self) -> bool {
        matches!(self, SuiteOutcome::Passed)
    }
}

impl fmt::Display for SuiteOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SuiteOutcome::Passed => f.write_str("passed"),
            SuiteOutcome::Failed { exit_code } => write!(f, "failed (exit code {exit_code})"),
            SuiteOutcome::Signaled { signal } => write!(f, "killed by signal {signal}"),
            SuiteOutcome::TimedOut { limit } => {
                write!(f, "timed out after {}s", limit.as_secs())
            }
            SuiteOutcome::LaunchFailed { reason } => write!(f, "could not start harness: {reason}"),
        }
    }
}

/// Something that can run a suite.
pub trait Harness {
    fn run(
        &self,
        invocation: &HarnessInvocation,
        work_dir: &Path,
        decoder: &DecoderBinary,
    ) -> SuiteOutcome;
}

impl<T: Harness + ?Sized> Harness for &T {
    fn run(
        &self,
        invocation: &HarnessInvocation,
        work_dir: &Path,
        decoder: &DecoderBinary,
    ) -> SuiteOutcome {
        (**self).run(invocation, work_dir, decoder)
    }
}

/// Runs `fluster_parser.py` as a child process.
#[derive(Debug, Clone)]
pub struct ProcessHarness {
    python: PathBuf,
    script: PathBuf,
}

impl Default for ProcessHarness {
    fn default() -> Self {
        Self::new(DEFAULT_PYTHON, DEFAULT_HARNESS_SCRIPT)
    }
}

impl ProcessHarness {
    pub fn new(python: impl Into<PathBuf>, script: impl Into<PathBuf>) -> Self {
        Self {
            python: python.into(),
            script: script.into(),
        }
    }

    /// Full command line, for logs and dry runs.
    pub fn command_line(&self, invocation: &HarnessInvocation) -> String {
        let mut parts = vec![
            self.python.display().to_string(),
            self.script.display().to_string(),
        ];
        parts.extend(invocation.args());
        parts.join(" ")
    }
}

impl Harness for ProcessHarness {
    fn run(
        &self,
        invocation: &HarnessInvocation,
        work_dir: &Path,
        decoder: &DecoderBinary,
    ) -> SuiteOutcome {
        let path = match search_path_with(decoder.dir()) {
            Ok(path) => path,
            Err(reason) => return SuiteOutcome::LaunchFailed { reason },
        };

        info!(command = %self.command_line(invocation), cwd = %work_dir.display(), "starting harness");

        let runtime = match tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
        {
            Ok(runtime) => runtime,
            Err(err) => {
                return SuiteOutcome::LaunchFailed {
                    reason: format!("starting process runtime: {err}"),
                };
            }
        };
        runtime.block_on(self.run_child(invocation, work_dir, path))
    }
}

impl ProcessHarness {
    async fn run_child(
        &self,
        invocation: &HarnessInvocation,
        work_dir: &Path,
        path: OsString,
    ) -> SuiteOutcome {
        let mut command = Command::new(&self.python);
        command
            .arg(&self.script)
            .args(invocation.args())
            .current_dir(work_dir)
            .env("PATH", path)
            .stdin(Stdio::null())
            .kill_on_drop(true);
        #[cfg(unix)]
        command.process_group(0);

        let mut child = match command.spawn() {
            Ok(child) => child,
            Err(err) => {
                return SuiteOutcome::LaunchFailed {
                    reason: format!("{}: {err}", self.python.display()),
                };
            }
        };

        let status = match invocation.time_limit {
            Some(limit) => match tokio::time::timeout(limit, child.wait()).await {
                Ok(status) => status,
                Err(_) => {
                    warn!(limit_secs = limit.as_secs(), "harness exceeded its time limit, killing it");
                    kill_process_group(&child);
                    if let Err(err) = child.kill().await {
                        debug!(error = %err, "kill after time limit failed");
                    }
                    return SuiteOutcome::TimedOut { limit };
                }
            },
            None => child.wait().await,
        };

        match status {
            Ok(status) => outcome_from_status(status),
            Err(err) => SuiteOutcome::LaunchFailed {
                reason: format!("waiting for harness: {err}"),
            },
        }
    }
}

/// Prints each harness command instead of running it; every suite passes.
#[derive(Debug, Clone, Default)]
pub struct DryRunHarness {
    inner: ProcessHarness,
}

impl DryRunHarness {
    pub fn new(inner: ProcessHarness) -> Self {
        Self { inner }
    }
}

impl Harness for DryRunHarness {
    fn run(
        &self,
        invocation: &HarnessInvocation,
        work_dir: &Path,
        decoder: &DecoderBinary,
    ) -> SuiteOutcome {
        let command = self.inner.command_line(invocation);
        info!(%command, cwd = %work_dir.display(), decoder = %decoder.path.display(), "dry run");
        println!("{command}");
        SuiteOutcome::Passed
    }
}

/// The parent's `PATH` with the decoder directory appended. Only the child
/// sees it; this process's environment is left alone.
fn search_path_with(decoder_dir: &Path) -> Result<OsString, String> {
    let mut dirs: Vec<PathBuf> = std::env::var_os("PATH")
        .map(|path| std::env::split_paths(&path).collect())
        .unwrap_or_default();
    if !dirs.iter().any(|dir| dir == decoder_dir) {
        dirs.push(decoder_dir.to_path_buf());
    }
    std::env::join_paths(dirs).map_err(|err| format!("invalid PATH entry: {err}"))
}

/// SIGKILL the harness's process group so decoders it started die with it.
#[cfg(unix)]
#[allow(unsafe_code)]
fn kill_process_group(child: &Child) {
    let Some(pgid) = child.id().and_then(|pid| libc::pid_t::try_from(pid).ok()) else {
        return;
    };
    // SAFETY: kill(2) only takes integers; the group was created for this child.
    if unsafe { libc::kill(-pgid, libc::SIGKILL) } != 0 {
        debug!(error = %std::io::Error::last_os_error(), "killing harness process group failed");
    }
}

#[cfg(not(unix))]
fn kill_process_group(_child: &Child) {}

fn outcome_from_status(status: ExitStatus) -> SuiteOutcome {
    if status.success() {
        return SuiteOutcome::Passed;
    }

    #[cfg(unix)]
    {
        use std::os::unix::process::ExitStatusExt;
        if let Some(signal) = status.signal() {
            return SuiteOutcome::Signaled { signal };
        }
    }

    SuiteOutcome::Failed {
        exit_code: status.code().unwrap_or(-1),
    }
}

#[cfg(test)]
#[path = "tests/harness.rs"]
mod tests;
