//! Error taxonomy for configuration, provisioning and rendering failures.
//!
//! Suite-level failures are not errors: they are recorded as
//! [`crate::driver::SuiteOutcome`] values so the remaining suites still run.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

pub type Result<T, E = CiError> = std::result::Result<T, E>;

#[derive(Debug, Error)]
pub enum CiError {
    #[error("unknown architecture: {0} (expected one of: amd, intel)")]
    UnknownArchitecture(String),
    #[error("no test suite configured for codec {0}")]
    UnknownCodec(String),
    #[error("invalid matrix file {}: {reason}", path.display())]
    MatrixFile { path: PathBuf, reason: String },
    #[error(
        "failed to provision decoder for build {build_id}: primary: {primary}; fallback: {fallback}"
    )]
    ProvisioningFailed {
        build_id: String,
        primary: String,
        fallback: String,
    },
    #[error("invalid url: {0}")]
    InvalidUrl(String),
    #[error("template error: {0}")]
    Template(String),
    #[error(transparent)]
    Io(#[from] io::Error),
}
