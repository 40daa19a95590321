//! Parallel Type-Graph Resolver
//!
//! Turns a web of declarations and annotation statements, possibly spread
//! over many documents, into a graph of resolved multiple-inheritance nodes
//! ("parallels"), isolating contradictions instead of aborting.
//!
//! - **Phrases**: interned subject paths, the address space of the graph
//! - **Forks**: one edge per annotation statement
//! - **Parallels**: explicit (declared) and implicit (fan-in) nodes
//! - **Contracts**: base obligations inherited across diamonds
//! - **Cruft**: faults that exclude graph elements from the pass
//!
//! Resolution is a single synchronous pass per program generation:
//!
//! ```text
//! let resolution = strata_solver::resolve(&program, &ResolveOptions::default())?;
//! for diagnostic in resolution.diagnostics(&program) { ... }
//! ```
pub mod cache;
pub mod contract;
pub mod cruft;
mod error;
pub mod fork;
mod options;
pub mod parallel;
pub mod phrase;
pub mod program;
pub mod recursion;
pub mod resolution;
mod resolver;
pub mod sanitizer;
pub mod subject;

pub use cache::ParallelCache;
pub use contract::Contract;
pub use cruft::{CruftCache, CruftSource, Fault, FaultKind};
pub use error::ResolveError;
pub use fork::{ForkId, SpanId};
pub use options::ResolveOptions;
pub use parallel::{ParallelFlags, ParallelId};
pub use phrase::{DocumentId, PhraseId};
pub use program::Program;
pub use resolution::{Resolution, Snapshot};
pub use subject::{AlternationPattern, PatternComparison, PatternMatcher, Subject, Term};

/// Run one resolution pass over `program`.
pub fn resolve(program: &Program, options: &ResolveOptions) -> Result<Resolution, ResolveError> {
    resolver::Resolver::new(program, *options).run()
}
