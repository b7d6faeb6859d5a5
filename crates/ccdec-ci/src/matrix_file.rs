//! Matrix configuration files.
//!
//! A matrix file replaces the built-in tables entirely. It is keyed by
//! architecture; each architecture lists its codecs in run order, and each
//! codec lists its suites with the vectors skipped on that architecture:
//!
//! ```yaml
//! intel:
//!   device_type: hp-x360-12b-ca0010nr-n4020-octopus
//!   codecs:
//!     - VP8:
//!         test-suites:
//!           - VP8-TEST-VECTORS:
//!               skip-vectors: []
//!     - VP9:
//!         test-suites:
//!           - VP9-TEST-VECTORS:
//!               skip-vectors:
//!                 - vp91-2-04-yuv422.webm
//! ```
//!
//! The same shape written as JSON loads too.

use std::collections::BTreeMap;
use std::path::Path;

use serde::Deserialize;

use crate::error::{CiError, Result};
use crate::matrix::{Architecture, Codec, Matrix, TestSuite};
use crate::skip_list::SkipList;

type MatrixDocument = BTreeMap<String, ArchitectureEntry>;

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct ArchitectureEntry {
    #[serde(default)]
    device_type: Option<String>,
    codecs: Vec<BTreeMap<String, CodecEntry>>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct CodecEntry {
    #[serde(rename = "test-suites")]
    test_suites: Vec<BTreeMap<String, Option<SuiteEntry>>>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct SuiteEntry {
    #[serde(rename = "skip-vectors", default)]
    skip_vectors: Option<SkipList>,
}

/// Read and validate a matrix file.
pub fn load(path: &Path) -> Result<Matrix> {
    let text = std::fs::read_to_string(path).map_err(|err| CiError::MatrixFile {
        path: path.to_path_buf(),
        reason: err.to_string(),
    })?;
    parse(&text).map_err(|err| match err {
        CiError::MatrixFile { reason, .. } => CiError::MatrixFile {
            path: path.to_path_buf(),
            reason,
        },
        other => other,
    })
}

/// Parse a matrix document from YAML (or JSON) text.
///
/// Name errors surface as [`CiError::UnknownArchitecture`] /
/// [`CiError::UnknownCodec`]; structural problems as
/// [`CiError::MatrixFile`] with an empty path.
pub fn parse(text: &str) -> Result<Matrix> {
    let document: MatrixDocument =
        serde_yaml::from_str(text).map_err(|err| structural(err.to_string()))?;

    let mut matrix = Matrix::default();

    for (arch_name, entry) in document {
        let arch: Architecture = arch_name.parse()?;
        if entry.codecs.is_empty() {
            return Err(structural(format!("architecture {arch} lists no codecs")));
        }

        let mut codecs = Vec::with_capacity(entry.codecs.len());
        for item in entry.codecs {
            let (codec_name, codec_entry) = single_entry(item, || format!("{arch} codecs"))?;
            let codec: Codec = codec_name.parse()?;
            if codecs.contains(&codec) {
                return Err(structural(format!("codec {codec} listed twice for {arch}")));
            }

            let suites = add_suites(&mut matrix, arch, codec, codec_entry)?;
            // Suites belong to the codec; every architecture must agree on them.
            let agrees = matrix
                .suites_for(codec)
                .ok()
                .map(|existing| existing == suites.as_slice());
            match agrees {
                Some(true) => {}
                Some(false) => {
                    return Err(structural(format!(
                        "conflicting test suites for codec {codec} on {arch}"
                    )));
                }
                None => matrix.set_suites(codec, suites),
            }
            codecs.push(codec);
        }
        matrix.set_codecs(arch, codecs);

        if let Some(device_type) = entry.device_type {
            matrix.set_device_type(arch, device_type);
        }
    }

    if matrix.architectures().is_empty() {
        return Err(structural("no architectures defined".to_string()));
    }

    Ok(matrix)
}

/// Record the skip lists of one codec entry and return its suites in order.
fn add_suites(
    matrix: &mut Matrix,
    arch: Architecture,
    codec: Codec,
    entry: CodecEntry,
) -> Result<Vec<TestSuite>> {
    if entry.test_suites.is_empty() {
        return Err(structural(format!(
            "codec {codec} lists no test suites for {arch}"
        )));
    }

    let mut suites = Vec::with_capacity(entry.test_suites.len());
    for item in entry.test_suites {
        let (name, suite_entry) = single_entry(item, || format!("{arch} {codec} test-suites"))?;
        let suite = TestSuite::new(name);
        if suites.contains(&suite) {
            return Err(structural(format!(
                "suite {suite} listed twice for {codec} on {arch}"
            )));
        }
        let skip = suite_entry
            .and_then(|entry| entry.skip_vectors)
            .unwrap_or_default();
        matrix.set_skip_list(arch, suite.clone(), skip);
        suites.push(suite);
    }
    Ok(suites)
}

/// List items are one-key maps (`- NAME: {...}`).
fn single_entry<V>(
    item: BTreeMap<String, V>,
    location: impl FnOnce() -> String,
) -> Result<(String, V)> {
    let mut entries = item.into_iter();
    match (entries.next(), entries.next()) {
        (Some(entry), None) => Ok(entry),
        _ => Err(structural(format!(
            "each entry of {} must name exactly one key",
            location()
        ))),
    }
}

fn structural(reason: String) -> CiError {
    CiError::MatrixFile {
        path: Default::default(),
        reason,
    }
}

#[cfg(test)]
#[path = "tests/matrix_file.rs"]
mod tests;
