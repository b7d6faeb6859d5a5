use super::*;
use crate::matrix::Codec;
use crate::provision::Provenance;
use crate::run_config::RunOverrides;

fn plan(codec: Codec, suite: &str, skip: &[&str]) -> SuitePlan {
    SuitePlan {
        codec,
        suite: TestSuite::new(suite),
        skip: skip.iter().copied().collect(),
    }
}

#[test]
fn args_without_skip_or_jobs() {
    let invocation = HarnessInvocation::new(
        &plan(Codec::Vp8, "VP8-TEST-VECTORS", &[]),
        &RunConfig::default(),
    );
    assert_eq!(
        invocation.args(),
        ["-ts", "VP8-TEST-VECTORS", "-d", "ccdec-VP8", "-t", "300"]
    );
    assert!(!invocation.args().iter().any(|arg| arg == "-sv"));
}

#[test]
fn args_with_skip_list_and_single_run() {
    let config = RunConfig::resolve(true, RunOverrides::default());
    let invocation = HarnessInvocation::new(
        &plan(
            Codec::Vp9,
            "VP9-TEST-VECTORS",
            &["vp91-2-04-yuv444.webm", "vp91-2-04-yuv422.webm"],
        ),
        &config,
    );
    assert_eq!(
        invocation.args(),
        [
            "-ts",
            "VP9-TEST-VECTORS",
            "-d",
            "ccdec-VP9",
            "-t",
            "300",
            "-j",
            "1",
            "-sv",
            "vp91-2-04-yuv422.webm",
            "vp91-2-04-yuv444.webm",
        ]
    );
}

#[test]
fn empty_skip_list_matches_omitted_flag() {
    let config = RunConfig::default();
    let omitted = HarnessInvocation::new(&plan(Codec::H264, "JVT-AVC_V1", &[]), &config);
    let explicit = HarnessInvocation {
        skip: SkipList::new(),
        ..omitted.clone()
    };
    assert_eq!(omitted.args(), explicit.args());
}

#[test]
fn command_line_includes_interpreter_and_script() {
    let harness = ProcessHarness::default();
    let invocation = HarnessInvocation::new(
        &plan(Codec::H265, "JCT-VC-HEVC_V1", &[]),
        &RunConfig::default(),
    );
    assert_eq!(
        harness.command_line(&invocation),
        "python3 /usr/bin/fluster_parser.py -ts JCT-VC-HEVC_V1 -d ccdec-H.265 -t 300"
    );
}

#[test]
fn outcome_display() {
    assert_eq!(SuiteOutcome::Passed.to_string(), "passed");
    assert_eq!(
        SuiteOutcome::Failed { exit_code: 2 }.to_string(),
        "failed (exit code 2)"
    );
    assert!(!SuiteOutcome::TimedOut {
        limit: Duration::from_secs(1)
    }
    .success());
}

#[cfg(unix)]
mod process {
    use super::*;
    use std::fs;
    use std::os::unix::fs::PermissionsExt;
    use std::path::{Path, PathBuf};
    use std::time::{Duration, Instant};
    use tempfile::TempDir;

    fn write_script(dir: &Path, body: &str) -> PathBuf {
        let path = dir.join("fake_fluster.sh");
        fs::write(&path, format!("#!/bin/sh\n{body}\n")).unwrap();
        path
    }

    fn decoder_in(dir: &Path) -> DecoderBinary {
        let bin_dir = dir.join("bin");
        fs::create_dir_all(&bin_dir).unwrap();
        let path = bin_dir.join("ccdec");
        fs::write(&path, "#!/bin/sh\nexit 0\n").unwrap();
        fs::set_permissions(&path, fs::Permissions::from_mode(0o755)).unwrap();
        DecoderBinary {
            path,
            provenance: Provenance::Cached,
        }
    }

    fn invocation(suite: &str, time_limit: Option<Duration>) -> HarnessInvocation {
        HarnessInvocation {
            time_limit,
            ..HarnessInvocation::new(&plan(Codec::Vp9, suite, &[]), &RunConfig::default())
        }
    }

    #[test]
    fn passes_arguments_and_reports_exit_code() {
        let dir = TempDir::new().unwrap();
        let work = dir.path().join("work");
        fs::create_dir_all(&work).unwrap();
        let script = write_script(
            dir.path(),
            "echo \"$@\" > args.txt\n[ \"$2\" = VP9-TEST-VECTORS ] && exit 3\nexit 0",
        );
        let harness = ProcessHarness::new("sh", &script);
        let decoder = decoder_in(dir.path());

        let outcome = harness.run(&invocation("VP9-TEST-VECTORS", None), &work, &decoder);
        assert_eq!(outcome, SuiteOutcome::Failed { exit_code: 3 });
        let args = fs::read_to_string(work.join("args.txt")).unwrap();
        assert_eq!(args.trim(), "-ts VP9-TEST-VECTORS -d ccdec-VP9 -t 300");

        let outcome = harness.run(&invocation("VP8-TEST-VECTORS", None), &work, &decoder);
        assert_eq!(outcome, SuiteOutcome::Passed);
    }

    #[test]
    fn decoder_dir_is_on_child_path() {
        let dir = TempDir::new().unwrap();
        let script = write_script(dir.path(), "command -v ccdec >/dev/null || exit 9");
        let harness = ProcessHarness::new("sh", &script);
        let decoder = decoder_in(dir.path());

        let outcome = harness.run(&invocation("VP9-TEST-VECTORS", None), dir.path(), &decoder);
        assert_eq!(outcome, SuiteOutcome::Passed);
    }

    #[test]
    fn time_limit_kills_the_harness() {
        let dir = TempDir::new().unwrap();
        let script = write_script(dir.path(), "sleep 10");
        let harness = ProcessHarness::new("sh", &script);
        let decoder = decoder_in(dir.path());
        let limit = Duration::from_millis(300);

        let started = Instant::now();
        let outcome = harness.run(
            &invocation("VP9-TEST-VECTORS", Some(limit)),
            dir.path(),
            &decoder,
        );
        assert_eq!(outcome, SuiteOutcome::TimedOut { limit });
        assert!(started.elapsed() < Duration::from_secs(5));
    }

    /// `kill -0` succeeds for zombies too, so consult `/proc` where it exists.
    fn is_running(pid: &str) -> bool {
        let signalable = std::process::Command::new("sh")
            .args(["-c", &format!("kill -0 {pid} 2>/dev/null")])
            .status()
            .unwrap()
            .success();
        if !signalable {
            return false;
        }
        match fs::read_to_string(format!("/proc/{pid}/stat")) {
            Ok(stat) => stat
                .rsplit_once(") ")
                .is_none_or(|(_, rest)| !rest.starts_with('Z')),
            Err(_) => true,
        }
    }

    #[test]
    fn time_limit_kills_decoder_grandchildren() {
        let dir = TempDir::new().unwrap();
        let script = write_script(dir.path(), "sleep 30 &\necho $! > grandchild.pid\nwait");
        let harness = ProcessHarness::new("sh", &script);
        let decoder = decoder_in(dir.path());
        let limit = Duration::from_millis(500);

        let outcome = harness.run(
            &invocation("VP9-TEST-VECTORS", Some(limit)),
            dir.path(),
            &decoder,
        );
        assert_eq!(outcome, SuiteOutcome::TimedOut { limit });

        let pid = fs::read_to_string(dir.path().join("grandchild.pid")).unwrap();
        let pid = pid.trim();
        let deadline = Instant::now() + Duration::from_secs(5);
        while is_running(pid) {
            assert!(Instant::now() < deadline, "grandchild {pid} outlived the harness");
            std::thread::sleep(Duration::from_millis(50));
        }
    }

    #[test]
    fn missing_interpreter_is_launch_failure() {
        let dir = TempDir::new().unwrap();
        let harness = ProcessHarness::new(dir.path().join("no-such-python"), "fluster_parser.py");
        let decoder = decoder_in(dir.path());

        let outcome = harness.run(&invocation("VP9-TEST-VECTORS", None), dir.path(), &decoder);
        assert!(matches!(outcome, SuiteOutcome::LaunchFailed { .. }));
    }
}
