use std::time::Duration;

use ccdec_ci::{
    Aggregate, Architecture, Codec, Matrix, SuiteOutcome, SuiteResult, TestSuite,
};

use super::reporter::Reporter;

fn result(codec: Codec, suite: &str, outcome: SuiteOutcome) -> SuiteResult {
    SuiteResult {
        codec,
        suite: TestSuite::new(suite),
        outcome,
        duration: Duration::from_millis(1500),
    }
}

#[test]
fn summary_lists_failed_suites() {
    let aggregate = Aggregate::from_results(vec![
        result(Codec::Vp8, "VP8-TEST-VECTORS", SuiteOutcome::Passed),
        result(
            Codec::Vp9,
            "VP9-TEST-VECTORS",
            SuiteOutcome::Failed { exit_code: 3 },
        ),
    ]);

    let summary = Reporter::new(false).render_summary(Architecture::Intel, &aggregate);

    assert!(summary.starts_with("Conformance results for intel:\n"));
    assert!(summary.contains("[PASS] vp8"));
    assert!(summary.contains("[FAIL] vp9"));
    assert!(summary.contains("failed (exit code 3)"));
    assert!(summary.ends_with("1 of 2 suites failed: VP9-TEST-VECTORS\n"));
}

#[test]
fn summary_for_clean_run() {
    let aggregate = Aggregate::from_results(vec![result(
        Codec::H264,
        "JVT-AVC_V1",
        SuiteOutcome::Passed,
    )]);

    let summary = Reporter::new(false).render_summary(Architecture::Amd, &aggregate);

    assert!(summary.ends_with("1 of 1 suites passed\n"));
    assert!(!summary.contains("FAIL"));
}

#[test]
fn plan_shows_adapter_and_skip_list() {
    let plan = Matrix::builtin().plan(Architecture::Intel).unwrap();

    let text = Reporter::new(false).render_plan(Architecture::Intel, &plan);

    assert!(text.starts_with("Suites for intel:\n"));
    assert!(text.contains("ccdec-VP8"));
    assert!(text.contains("skip: none"));
    assert!(text.contains("skip: vp91-2-04-yuv422.webm"));
}
