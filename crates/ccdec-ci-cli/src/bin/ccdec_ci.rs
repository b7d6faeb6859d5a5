#![allow(clippy::print_stderr)]

use std::io::IsTerminal;

use clap::Parser;

use ccdec_ci::aggregate::EXIT_SETUP_FAILED;
use ccdec_ci::tracing_config::init_tracing;
use ccdec_ci_cli::args::CliArgs;
use ccdec_ci_cli::commands;

fn main() {
    init_tracing();
    let args = CliArgs::parse();

    let color = !args.no_color && std::io::stdout().is_terminal();
    colored::control::set_override(color);

    let code = match commands::dispatch(&args, color) {
        Ok(code) => code,
        Err(err) => {
            eprintln!("error: {err:#}");
            EXIT_SETUP_FAILED
        }
    };
    std::process::exit(code);
}
