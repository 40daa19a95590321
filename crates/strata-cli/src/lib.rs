//! Command-line driver for the strata resolver.
//!
//! Loads a JSON graph description, runs one resolution pass and renders the
//! resulting diagnostics as text or JSON.

pub mod args;
pub mod driver;
pub mod input;
pub mod reporter;
pub mod tracing_config;
