//! LAVA job definitions.
//!
//! Job templates use `{{ name }}` placeholders. Rendering is strict: a
//! placeholder without a value is an error rather than an empty string.

use std::path::Path;

use once_cell::sync::Lazy;
use regex::Regex;

use crate::error::{CiError, Result};
use crate::matrix::{Architecture, Matrix};

/// Matches: {{ name }}
static PLACEHOLDER_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\{\{\s*([A-Za-z_][A-Za-z0-9_]*)\s*\}\}").unwrap());

pub const DEFAULT_TEST_BRANCH: &str = "main";

#[derive(Debug, Clone)]
pub struct JobParams {
    pub ccdec_build_id: String,
    pub arch: Architecture,
    pub device_type: String,
    pub test_branch: String,
    pub repo_url: String,
}

impl JobParams {
    /// Fill in the device type for `arch` from the matrix.
    pub fn new(
        matrix: &Matrix,
        arch: Architecture,
        ccdec_build_id: impl Into<String>,
        repo_url: impl Into<String>,
        test_branch: impl Into<String>,
    ) -> Result<Self> {
        Ok(Self {
            ccdec_build_id: ccdec_build_id.into(),
            arch,
            device_type: matrix.device_type_for(arch)?.to_string(),
            test_branch: test_branch.into(),
            repo_url: repo_url.into(),
        })
    }

    fn lookup(&self, name: &str) -> Option<&str> {
        match name {
            "ccdec_build_id" => Some(&self.ccdec_build_id),
            "arch" => Some(self.arch.as_str()),
            "device_type" => Some(&self.device_type),
            "test_branch" => Some(&self.test_branch),
            "repo_url" => Some(&self.repo_url),
            _ => None,
        }
    }
}

pub fn render(template: &str, params: &JobParams) -> Result<String> {
    let mut out = String::with_capacity(template.len());
    let mut last = 0;

    for cap in PLACEHOLDER_RE.captures_iter(template) {
        let (Some(whole), Some(name)) = (cap.get(0), cap.get(1)) else {
            continue;
        };
        let name = name.as_str();
        let value = params
            .lookup(name)
            .ok_or_else(|| CiError::Template(format!("'{name}' is undefined")))?;
        push_literal(&mut out, template, last, whole.start())?;
        out.push_str(value);
        last = whole.end();
    }
    push_literal(&mut out, template, last, template.len())?;

    Ok(out)
}

/// Copy template text between placeholders; any `{{` left in it is malformed.
fn push_literal(out: &mut String, template: &str, start: usize, end: usize) -> Result<()> {
    let literal = &template[start..end];
    if let Some(pos) = literal.find("{{") {
        let line = template[..start + pos].matches('\n').count() + 1;
        return Err(CiError::Template(format!(
            "malformed placeholder near line {line}"
        )));
    }
    out.push_str(literal);
    Ok(())
}

pub fn render_file(path: &Path, params: &JobParams) -> Result<String> {
    let template = std::fs::read_to_string(path)?;
    render(&template, params)
}
