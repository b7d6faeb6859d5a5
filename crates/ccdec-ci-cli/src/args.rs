use clap::{Args, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

use ccdec_ci::harness::{DEFAULT_HARNESS_SCRIPT, DEFAULT_PYTHON};
use ccdec_ci::lava_job::DEFAULT_TEST_BRANCH;
use ccdec_ci::provision::{
    DEFAULT_BASE_URL, DEFAULT_BINARY_NAME, DEFAULT_FALLBACK_URL, DEFAULT_INSTALL_DIR,
};
use ccdec_ci::run_config::DEFAULT_TIMEOUT_SECONDS;
use ccdec_ci::{Architecture, RunOverrides};

/// CLI arguments for the ccdec-ci binary.
#[derive(Parser, Debug)]
#[command(
    name = "ccdec-ci",
    version,
    about = "Run fluster conformance suites against the ccdec decoder"
)]
pub struct CliArgs {
    #[command(subcommand)]
    pub command: Command,

    /// Disable colored output.
    #[arg(long, global = true)]
    pub no_color: bool,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Provision ccdec and run every suite configured for an architecture.
    Run(RunArgs),
    /// Print the suites, adapters and skip lists an architecture would run.
    Plan(PlanArgs),
    /// Render a LAVA job definition from a template.
    LavaJob(LavaJobArgs),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Arch {
    Amd,
    Intel,
}

impl From<Arch> for Architecture {
    fn from(value: Arch) -> Self {
        match value {
            Arch::Amd => Architecture::Amd,
            Arch::Intel => Architecture::Intel,
        }
    }
}

#[derive(Args, Debug, Clone)]
pub struct MatrixArgs {
    /// YAML configuration replacing the built-in conformance matrix.
    #[arg(long, visible_alias = "config-file")]
    pub matrix_file: Option<PathBuf>,
}

#[derive(Args, Debug)]
pub struct RunArgs {
    /// Architecture under test.
    #[arg(long, value_enum, ignore_case = true)]
    pub arch: Arch,

    /// Build id of the ccdec binary to fetch.
    #[arg(long = "ccdec-build-id")]
    pub build_id: String,

    /// Run vectors one at a time (forces -j 1).
    #[arg(long)]
    pub single: bool,

    /// Vectors evaluated in parallel by the harness (harness default if unset).
    #[arg(short = 'j', long, value_parser = clap::value_parser!(u64).range(1..))]
    pub jobs: Option<u64>,

    /// Per-vector timeout passed to the harness, in seconds.
    #[arg(long, default_value_t = DEFAULT_TIMEOUT_SECONDS)]
    pub timeout: u64,

    /// Kill a suite's harness after this many seconds.
    #[arg(long, value_parser = clap::value_parser!(u64).range(1..))]
    pub suite_time_limit: Option<u64>,

    /// Directory the decoder is cached in.
    #[arg(long, default_value = DEFAULT_INSTALL_DIR)]
    pub install_dir: PathBuf,

    /// File name of the decoder binary.
    #[arg(long, default_value = DEFAULT_BINARY_NAME)]
    pub binary_name: String,

    /// Base URL; the decoder is fetched from <base>/<build id>/<binary name>.
    #[arg(long, default_value = DEFAULT_BASE_URL)]
    pub artifact_base_url: String,

    /// URL tried when the build-specific download fails.
    #[arg(long, default_value = DEFAULT_FALLBACK_URL)]
    pub fallback_url: String,

    /// Interpreter used to run the harness script.
    #[arg(long, default_value = DEFAULT_PYTHON)]
    pub python: PathBuf,

    /// Path to fluster_parser.py.
    #[arg(long, default_value = DEFAULT_HARNESS_SCRIPT)]
    pub harness: PathBuf,

    /// Root for per-suite scratch directories (defaults to the system temp dir).
    #[arg(long)]
    pub work_dir: Option<PathBuf>,

    /// Print harness commands without running them.
    #[arg(long)]
    pub dry_run: bool,

    #[command(flatten)]
    pub matrix: MatrixArgs,
}

impl RunArgs {
    pub fn overrides(&self) -> RunOverrides {
        RunOverrides {
            jobs: self.jobs.map(|jobs| jobs as usize),
            timeout_seconds: Some(self.timeout),
            suite_time_limit: self.suite_time_limit.map(std::time::Duration::from_secs),
        }
    }

    pub fn work_root(&self) -> PathBuf {
        self.work_dir
            .clone()
            .unwrap_or_else(|| std::env::temp_dir().join("ccdec-ci"))
    }
}

#[derive(Args, Debug)]
pub struct PlanArgs {
    #[arg(long, value_enum, ignore_case = true)]
    pub arch: Arch,

    /// Emit the plan as JSON.
    #[arg(long)]
    pub json: bool,

    #[command(flatten)]
    pub matrix: MatrixArgs,
}

#[derive(Args, Debug)]
pub struct LavaJobArgs {
    /// Input template file.
    #[arg(long)]
    pub template: PathBuf,

    #[arg(long, value_enum, ignore_case = true)]
    pub arch: Arch,

    #[arg(long = "ccdec-build-id")]
    pub build_id: String,

    /// The repository being tested.
    #[arg(long)]
    pub test_repo: String,

    /// The branch being tested.
    #[arg(long, default_value = DEFAULT_TEST_BRANCH)]
    pub test_branch: String,

    /// Write the job here instead of stdout.
    #[arg(short = 'o', long)]
    pub output: Option<PathBuf>,

    #[command(flatten)]
    pub matrix: MatrixArgs,
}
