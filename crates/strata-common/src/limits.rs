//! Centralized limits and thresholds for the resolver.
//!
//! Recursion limits for the graph walks themselves are exposed through
//! `strata_solver::recursion::RecursionProfile`; the profiles read their
//! numbers from here so a host can see every limit in one place.

// =============================================================================
// Recursion Depth Limits
// =============================================================================

/// Maximum nesting of on-demand node construction.
///
/// Building a node may require building the nodes of its bases first, which
/// may in turn require their bases. Each hop adds a frame. A chain this long
/// only arises from generated input; past it the node is built bare and a
/// `ResolutionLimitExceeded` fault is recorded on its phrase.
///
/// ```text
/// T0 : T1
/// T1 : T2
/// ...            // 256 hops deep
/// ```
pub const MAX_CONSTRUCTION_DEPTH: u32 = 256;

/// Maximum depth of a base-closure or cycle-detection walk.
pub const MAX_BASE_WALK_DEPTH: u32 = 1_024;

/// Maximum depth when recursing through implicit contributors.
pub const MAX_CONTRIBUTOR_DEPTH: u32 = 128;

// =============================================================================
// Operation Counts
// =============================================================================

/// Work budget for a single graph walk (closure, cycle DFS, contract build).
pub const MAX_WALK_ITERATIONS: u32 = 100_000;

/// Work budget for one resolution pass's construction guard.
pub const MAX_CONSTRUCTION_ITERATIONS: u32 = 1_000_000;

// =============================================================================
// Capacity
// =============================================================================

/// Initial capacity for per-pass node arenas.
pub const INITIAL_NODE_CAPACITY: usize = 256;
