#![allow(clippy::print_stderr)]

use anyhow::Result;
use clap::Parser;
use std::process::ExitCode;

use strata_cli::args::CliArgs;
use strata_cli::driver;

const EXIT_SUCCESS: u8 = 0;
const EXIT_FAULTS: u8 = 1;

fn main() -> Result<ExitCode> {
    strata_cli::tracing_config::init_tracing();

    let args = CliArgs::parse();
    if args.no_color {
        colored::control::set_override(false);
    }

    let outcome = driver::run(&args)?;
    println!("{}", outcome.output);

    if outcome.error_count > 0 {
        eprintln!("resolution reported {} error(s)", outcome.error_count);
        return Ok(ExitCode::from(EXIT_FAULTS));
    }
    Ok(ExitCode::from(EXIT_SUCCESS))
}
