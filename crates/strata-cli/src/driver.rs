use anyhow::{Context, Result};
use serde::Serialize;
use std::time::Instant;
use strata_common::Diagnostic;
use strata_solver::{Program, ResolveOptions, Snapshot, resolve};
use tracing::debug;

use crate::args::{CliArgs, OutputFormat};
use crate::input;
use crate::reporter::Reporter;

/// Rendered output of one run and the number of error diagnostics in it.
#[derive(Debug)]
pub struct RunOutcome {
    pub output: String,
    pub error_count: usize,
}

#[derive(Serialize)]
struct JsonReport<'a> {
    diagnostics: &'a [Diagnostic],
    #[serde(skip_serializing_if = "Option::is_none")]
    snapshot: Option<Snapshot>,
}

pub fn resolve_options(args: &CliArgs) -> ResolveOptions {
    let options = ResolveOptions::default().reporting_contracts(args.report_contracts);
    match args.max_depth {
        Some(depth) => options.with_max_construction_depth(depth),
        None => options,
    }
}

/// Load, resolve, and render the graph named by `args`.
pub fn run(args: &CliArgs) -> Result<RunOutcome> {
    let program = input::load_program(&args.input)?;
    run_program(&program, args, !args.no_color)
}

pub fn run_program(program: &Program, args: &CliArgs, color: bool) -> Result<RunOutcome> {
    let started = Instant::now();
    let resolution = resolve(program, &resolve_options(args)).context("resolution failed")?;
    let diagnostics = resolution.diagnostics(program);
    debug!(
        nodes = resolution.cache().len(),
        faults = resolution.faults().len(),
        elapsed_us = started.elapsed().as_micros() as u64,
        "resolved"
    );

    let error_count = diagnostics.iter().filter(|d| d.is_error()).count();
    let snapshot = args.snapshot.then(|| resolution.snapshot(program));

    let output = match args.format {
        OutputFormat::Json => {
            let report = JsonReport {
                diagnostics: &diagnostics,
                snapshot,
            };
            serde_json::to_string_pretty(&report)?
        }
        OutputFormat::Text => {
            let reporter = Reporter::new(color);
            let mut output = reporter.render(&diagnostics);
            if !output.is_empty() {
                output.push_str("\n\n");
            }
            output.push_str(&reporter.summary(&diagnostics));
            if let Some(snapshot) = snapshot {
                output.push('\n');
                output.push_str(&serde_json::to_string_pretty(&snapshot)?);
            }
            output
        }
    };

    Ok(RunOutcome {
        output,
        error_count,
    })
}

#[cfg(test)]
#[path = "tests/driver_tests.rs"]
mod tests;
