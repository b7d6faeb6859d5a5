//! Runs the built `ccdec-ci` binary end to end.

use std::fs;
use std::path::Path;
use std::process::{Command, Output};

use tempfile::TempDir;

fn ccdec_ci(args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_ccdec-ci"))
        .args(args)
        .env("CCDEC_CI_LOG", "warn")
        .output()
        .expect("failed to spawn ccdec-ci")
}

fn stdout(output: &Output) -> String {
    String::from_utf8_lossy(&output.stdout).into_owned()
}

/// Pre-populate the install dir so no download is attempted.
fn cached_decoder(root: &Path) -> String {
    let install = root.join("opt");
    fs::create_dir_all(&install).unwrap();
    fs::write(install.join("ccdec"), "#!/bin/sh\nexit 0\n").unwrap();
    install.to_str().unwrap().to_string()
}

#[test]
fn plan_lists_intel_suites() {
    let output = ccdec_ci(&["plan", "--arch", "intel"]);

    assert_eq!(output.status.code(), Some(0));
    let text = stdout(&output);
    assert!(text.contains("VP8-TEST-VECTORS"));
    assert!(text.contains("VP9-TEST-VECTORS"));
    assert!(text.contains("vp91-2-04-yuv422.webm"));
    assert!(!text.contains("JVT-AVC_V1"));
}

#[test]
fn plan_json_for_amd() {
    let output = ccdec_ci(&["plan", "--arch", "amd", "--json"]);

    assert_eq!(output.status.code(), Some(0));
    let text = stdout(&output);
    assert!(text.contains("\"arch\": \"amd\""));
    assert!(text.contains("\"decoder\": \"ccdec-H.265\""));
    assert!(text.contains("vp91-2-04-yuv444.webm"));
}

#[test]
fn plan_reads_ci_config_file() {
    let root = TempDir::new().unwrap();
    let config = root.path().join("ci.yaml");
    fs::write(
        &config,
        "intel:\n  device_type: test-device\n  codecs:\n    - VP9:\n        test-suites:\n          - VP9-TEST-VECTORS:\n              skip-vectors:\n                - vp91-2-04-yuv444.webm\n",
    )
    .unwrap();

    let output = ccdec_ci(&["plan", "--arch", "intel", "--config-file", config.to_str().unwrap()]);

    assert_eq!(output.status.code(), Some(0));
    let text = stdout(&output);
    assert!(text.contains("VP9-TEST-VECTORS"));
    assert!(text.contains("vp91-2-04-yuv444.webm"));
    assert!(!text.contains("VP8-TEST-VECTORS"));
}

#[test]
fn unknown_arch_is_a_usage_error() {
    let output = ccdec_ci(&["run", "--arch", "arm", "--ccdec-build-id", "1"]);

    assert_eq!(output.status.code(), Some(2));
    assert!(String::from_utf8_lossy(&output.stderr).contains("arm"));
}

#[test]
fn dry_run_prints_every_harness_command() {
    let root = TempDir::new().unwrap();
    let install = cached_decoder(root.path());
    let work = root.path().join("work");

    let output = ccdec_ci(&[
        "run",
        "--arch",
        "intel",
        "--ccdec-build-id",
        "1",
        "--install-dir",
        &install,
        "--work-dir",
        work.to_str().unwrap(),
        "--single",
        "--dry-run",
    ]);

    assert_eq!(output.status.code(), Some(0));
    let text = stdout(&output);
    assert!(text.contains("-ts VP8-TEST-VECTORS -d ccdec-VP8 -t 300 -j 1"));
    assert!(text.contains("-ts VP9-TEST-VECTORS -d ccdec-VP9 -t 300 -j 1 -sv vp91-2-04-yuv422.webm"));
    assert!(text.contains("2 of 2 suites passed"));
}

#[cfg(unix)]
#[test]
fn failing_suite_sets_exit_code() {
    let root = TempDir::new().unwrap();
    let install = cached_decoder(root.path());
    let script = root.path().join("fake_fluster.sh");
    fs::write(
        &script,
        "case \"$*\" in\n  *VP9-TEST-VECTORS*) exit 1 ;;\nesac\nexit 0\n",
    )
    .unwrap();

    let output = ccdec_ci(&[
        "run",
        "--arch",
        "intel",
        "--ccdec-build-id",
        "1",
        "--install-dir",
        &install,
        "--work-dir",
        root.path().join("work").to_str().unwrap(),
        "--python",
        "/bin/sh",
        "--harness",
        script.to_str().unwrap(),
    ]);

    assert_eq!(output.status.code(), Some(1));
    let text = stdout(&output);
    assert!(text.contains("[PASS] vp8"));
    assert!(text.contains("[FAIL] vp9"));
    assert!(text.contains("1 of 2 suites failed: VP9-TEST-VECTORS"));
}
