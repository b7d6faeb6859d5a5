use anyhow::{Context, Result};
use tracing::info;

use ccdec_ci::aggregate::EXIT_SUCCESS;
use ccdec_ci::harness::DryRunHarness;
use ccdec_ci::lava_job::{self, JobParams};
use ccdec_ci::provision::ProvisionSettings;
use ccdec_ci::{
    Aggregate, Architecture, Driver, Matrix, ProcessHarness, Provisioner, RunConfig, UreqFetcher,
    matrix_file,
};

use crate::args::{CliArgs, Command, LavaJobArgs, MatrixArgs, PlanArgs, RunArgs};
use crate::reporter::Reporter;

/// Run the selected subcommand and return the process exit code.
pub fn dispatch(args: &CliArgs, color: bool) -> Result<i32> {
    let reporter = Reporter::new(color);
    match &args.command {
        Command::Run(run_args) => run(run_args, &reporter),
        Command::Plan(plan_args) => plan(plan_args, &reporter),
        Command::LavaJob(job_args) => lava_job(job_args),
    }
}

fn load_matrix(args: &MatrixArgs) -> Result<Matrix> {
    match &args.matrix_file {
        Some(path) => {
            info!(path = %path.display(), "loading matrix file");
            Ok(matrix_file::load(path)?)
        }
        None => Ok(Matrix::builtin()),
    }
}

pub fn run(args: &RunArgs, reporter: &Reporter) -> Result<i32> {
    let arch: Architecture = args.arch.into();
    let matrix = load_matrix(&args.matrix).context("failed to load conformance matrix")?;

    // Resolve everything before touching the network.
    let plan = matrix
        .plan(arch)
        .with_context(|| format!("failed to resolve suites for {arch}"))?;
    let config = RunConfig::resolve(args.single, args.overrides());
    info!(
        %arch,
        build_id = %args.build_id,
        suites = plan.len(),
        concurrency = %config.concurrency,
        timeout_secs = config.timeout_seconds,
        "starting conformance run"
    );

    let settings = ProvisionSettings {
        install_dir: args.install_dir.clone(),
        binary_name: args.binary_name.clone(),
        base_url: args.artifact_base_url.clone(),
        fallback_url: args.fallback_url.clone(),
    };
    let decoder = Provisioner::new(settings, UreqFetcher::new())
        .ensure(&args.build_id)
        .with_context(|| format!("failed to provision ccdec build {} for {arch}", args.build_id))?;

    let harness = ProcessHarness::new(&args.python, &args.harness);
    let results = if args.dry_run {
        Driver::new(DryRunHarness::new(harness), args.work_root()).run_all(&plan, &decoder, &config)
    } else {
        Driver::new(harness, args.work_root()).run_all(&plan, &decoder, &config)
    };

    let aggregate = Aggregate::from_results(results);
    print!("{}", reporter.render_summary(arch, &aggregate));
    Ok(aggregate.exit_code())
}

pub fn plan(args: &PlanArgs, reporter: &Reporter) -> Result<i32> {
    let arch: Architecture = args.arch.into();
    let matrix = load_matrix(&args.matrix).context("failed to load conformance matrix")?;
    let plan = matrix
        .plan(arch)
        .with_context(|| format!("failed to resolve suites for {arch}"))?;

    if args.json {
        let entries: Vec<_> = plan
            .iter()
            .map(|entry| {
                serde_json::json!({
                    "codec": entry.codec.as_str(),
                    "suite": entry.suite,
                    "decoder": entry.codec.decoder_adapter(),
                    "skip_vectors": entry.skip,
                })
            })
            .collect();
        let document = serde_json::json!({ "arch": arch.as_str(), "suites": entries });
        println!("{}", serde_json::to_string_pretty(&document)?);
    } else {
        print!("{}", reporter.render_plan(arch, &plan));
    }
    Ok(EXIT_SUCCESS)
}

pub fn lava_job(args: &LavaJobArgs) -> Result<i32> {
    let arch: Architecture = args.arch.into();
    let matrix = load_matrix(&args.matrix).context("failed to load conformance matrix")?;
    let params = JobParams::new(
        &matrix,
        arch,
        args.build_id.clone(),
        args.test_repo.clone(),
        args.test_branch.clone(),
    )?;
    let job = lava_job::render_file(&args.template, &params)
        .with_context(|| format!("failed to render {}", args.template.display()))?;

    match &args.output {
        Some(path) => std::fs::write(path, job)
            .with_context(|| format!("failed to write {}", path.display()))?,
        None => print!("{job}"),
    }
    Ok(EXIT_SUCCESS)
}

#[cfg(test)]
#[path = "tests/commands.rs"]
mod tests;
