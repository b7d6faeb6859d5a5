//! Conformance CI orchestration for the `ccdec` decoder.
//!
//! The crate resolves which fluster suites apply to a target architecture,
//! makes sure the decoder under test is installed, runs the harness once per
//! suite and folds the per-suite outcomes into a single CI verdict.
//!
//! The pieces are layered leaf-first:
//!
//! - [`matrix`] / [`skip_list`]: architecture → codec → suite → skip-list tables
//! - [`matrix_file`]: optional YAML override for the built-in tables
//! - [`provision`]: fetch-and-cache of the decoder binary
//! - [`run_config`]: timeout / concurrency resolution
//! - [`harness`]: argument construction and child-process execution
//! - [`driver`]: the per-suite loop with artifact cleanup
//! - [`aggregate`]: overall pass/fail and exit status
//! - [`lava_job`]: LAVA job template rendering

pub mod aggregate;
pub mod driver;
pub mod error;
pub mod harness;
pub mod lava_job;
pub mod matrix;
pub mod matrix_file;
pub mod provision;
pub mod run_config;
pub mod skip_list;
pub mod tracing_config;

pub use aggregate::Aggregate;
pub use driver::{Driver, SuiteOutcome, SuiteResult};
pub use error::{CiError, Result};
pub use harness::{Harness, HarnessInvocation, ProcessHarness};
pub use matrix::{Architecture, Codec, Matrix, SuitePlan, TestSuite};
pub use provision::{DecoderBinary, Fetch, Provenance, Provisioner, UreqFetcher};
pub use run_config::{Concurrency, RunConfig, RunOverrides};
pub use skip_list::SkipList;
