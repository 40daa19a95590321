//! Resolution options.

use crate::recursion::RecursionProfile;

/// Knobs for one resolution pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResolveOptions {
    /// Bounds on-demand construction of successor nodes.
    pub construction: RecursionProfile,
    /// Bounds base-closure walks and cycle detection.
    pub base_walk: RecursionProfile,
    /// Bounds recursion through implicit contributors.
    pub contributor_walk: RecursionProfile,
    /// Emit a warning diagnostic for every unsatisfied contract condition.
    pub report_unsatisfied_contracts: bool,
}

impl Default for ResolveOptions {
    fn default() -> Self {
        Self {
            construction: RecursionProfile::Construction,
            base_walk: RecursionProfile::BaseWalk,
            contributor_walk: RecursionProfile::ContributorWalk,
            report_unsatisfied_contracts: false,
        }
    }
}

impl ResolveOptions {
    /// Override the construction depth, keeping its iteration budget.
    #[must_use]
    pub fn with_max_construction_depth(mut self, max_depth: u32) -> Self {
        self.construction = RecursionProfile::Custom {
            max_depth,
            max_iterations: self.construction.max_iterations(),
        };
        self
    }

    #[must_use]
    pub fn reporting_contracts(mut self, enabled: bool) -> Self {
        self.report_unsatisfied_contracts = enabled;
        self
    }
}
