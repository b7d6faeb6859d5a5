//! Tracing setup for CI runs.
//!
//! Output format is selected by `CCDEC_CI_LOG_FORMAT`:
//!
//! - `text` (default): standard `tracing-subscriber` lines
//! - `tree`: indented span hierarchy via `tracing-tree`, one block per suite
//! - `json`: one JSON object per event, for log collectors
//!
//! ```bash
//! CCDEC_CI_LOG=debug ccdec-ci run --arch intel --ccdec-build-id 1234
//! CCDEC_CI_LOG_FORMAT=tree ccdec-ci run --arch amd --ccdec-build-id 1234
//! CCDEC_CI_LOG="ccdec_ci::provision=debug,info" ccdec-ci run ...
//! ```
//!
//! The filter falls back to `info` when neither `CCDEC_CI_LOG` nor `RUST_LOG`
//! is set. Everything goes to stderr; stdout carries the summary.

use tracing_subscriber::prelude::*;
use tracing_subscriber::{EnvFilter, Registry, fmt};

const DEFAULT_FILTER: &str = "info";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Text,
    Tree,
    Json,
}

impl LogFormat {
    pub fn parse(value: &str) -> Self {
        match value.trim().to_lowercase().as_str() {
            "tree" => Self::Tree,
            "json" => Self::Json,
            _ => Self::Text,
        }
    }

    fn from_env() -> Self {
        Self::parse(&std::env::var("CCDEC_CI_LOG_FORMAT").unwrap_or_default())
    }
}

/// `CCDEC_CI_LOG` wins over `RUST_LOG`; both use `RUST_LOG` syntax.
fn build_filter() -> EnvFilter {
    if let Ok(val) = std::env::var("CCDEC_CI_LOG") {
        EnvFilter::builder().parse_lossy(val)
    } else if std::env::var("RUST_LOG").is_ok() {
        EnvFilter::from_default_env()
    } else {
        EnvFilter::new(DEFAULT_FILTER)
    }
}

/// Install the global subscriber. Safe to call more than once; later calls
/// are ignored.
pub fn init_tracing() {
    let filter = build_filter();

    let _ = match LogFormat::from_env() {
        LogFormat::Tree => {
            let tree_layer = tracing_tree::HierarchicalLayer::default()
                .with_indent_amount(2)
                .with_indent_lines(true)
                .with_deferred_spans(true)
                .with_targets(true);

            Registry::default().with(filter).with(tree_layer).try_init()
        }
        LogFormat::Json => {
            let json_layer = fmt::layer().json().with_writer(std::io::stderr);

            Registry::default().with(filter).with(json_layer).try_init()
        }
        LogFormat::Text => {
            let text_layer = fmt::layer().with_writer(std::io::stderr);

            Registry::default().with(filter).with(text_layer).try_init()
        }
    };
}
