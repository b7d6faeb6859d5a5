use colored::Colorize;

use ccdec_ci::{Aggregate, Architecture, SuitePlan, SuiteResult};

pub struct Reporter {
    color: bool,
}

impl Reporter {
    pub fn new(color: bool) -> Self {
        Reporter { color }
    }

    /// One line per suite, then the failing suites if any.
    pub fn render_summary(&self, arch: Architecture, aggregate: &Aggregate) -> String {
        let mut out = String::new();
        out.push_str(&format!("Conformance results for {arch}:\n"));
        for result in aggregate.results() {
            out.push_str(&self.format_result(result));
            out.push('\n');
        }

        let total = aggregate.results().len();
        let failed = aggregate.failed_suites();
        if failed.is_empty() {
            let line = format!("{} of {total} suites passed", aggregate.passed_count());
            out.push_str(&self.paint_ok(&line));
        } else {
            let names: Vec<_> = failed.iter().map(|suite| suite.as_str()).collect();
            let line = format!(
                "{} of {total} suites failed: {}",
                failed.len(),
                names.join(", ")
            );
            out.push_str(&self.paint_err(&line));
        }
        out.push('\n');
        out
    }

    pub fn render_plan(&self, arch: Architecture, plan: &[SuitePlan]) -> String {
        let mut out = format!("Suites for {arch}:\n");
        for entry in plan {
            out.push_str(&format!(
                "  {:<6} {:<18} {:<13} skip: {}\n",
                entry.codec.as_str(),
                entry.suite.as_str(),
                entry.codec.decoder_adapter(),
                entry.skip
            ));
        }
        out
    }

    fn format_result(&self, result: &SuiteResult) -> String {
        let status = if result.success() {
            self.paint_ok("PASS")
        } else {
            self.paint_err("FAIL")
        };
        let mut line = format!(
            "  [{status}] {:<6} {:<18} {:>6.1}s",
            result.codec.as_str(),
            result.suite.as_str(),
            result.duration.as_secs_f64()
        );
        if !result.success() {
            line.push_str(&format!("  {}", result.outcome));
        }
        line
    }

    fn paint_ok(&self, text: &str) -> String {
        if self.color {
            text.green().bold().to_string()
        } else {
            text.to_string()
        }
    }

    fn paint_err(&self, text: &str) -> String {
        if self.color {
            text.red().bold().to_string()
        } else {
            text.to_string()
        }
    }
}
