//! Command-line front end for the ccdec conformance orchestrator.

pub mod args;
pub mod commands;
pub mod reporter;

#[cfg(test)]
#[path = "tests/args.rs"]
mod args_tests;

#[cfg(test)]
#[path = "tests/reporter.rs"]
mod reporter_tests;
