//! One resolution pass over a program generation.
//!
//! ## Order
//!
//! Document roots are seeded first. Every other live phrase is then ensured
//! in `(length, id)` order, so containers always exist before their contents.
//! Ensuring a phrase:
//!
//! 1. materializes nodes for its ancestry, bare (explicit for declared
//!    phrases, implicit for hypothetical ones);
//! 2. processes it once: ensures its container, computes contributors, then
//!    walks its incoming forks.
//!
//! Walking a fork may need nodes for phrases that come later in the order.
//! Those are ensured on demand under the construction guard; when the guard
//! trips, the phrase keeps a bare node and a `ResolutionLimitExceeded` fault.
//!
//! ## Applying a fork
//!
//! The fork is screened once first; an excluded or conflicting fork applies
//! nothing. Each successor then resolves to candidate bases: its own node if
//! explicit, or the explicit nodes contributing to it if implicit. A
//! candidate already applied is skipped (the first fork wins). Otherwise the
//! target's contract is built if needed, the edge is sanitized, and a clean
//! edge is applied and propagated to every contract downstream of the target.
//! A faulted edge skips that base only.

use crate::cache::{FxIndexSet, ParallelCache};
use crate::contract::{Contract, ContractTable};
use crate::cruft::{CruftCache, CruftSource, Fault, FaultKind};
use crate::error::ResolveError;
use crate::fork::ForkId;
use crate::options::ResolveOptions;
use crate::parallel::ParallelId;
use crate::phrase::PhraseId;
use crate::program::Program;
use crate::recursion::{RecursionGuard, RecursionResult};
use crate::resolution::Resolution;
use crate::sanitizer::Sanitizer;
use crate::subject::Subject;
use rustc_hash::FxHashSet;
use smallvec::SmallVec;
use tracing::{debug, trace};

pub struct Resolver<'p> {
    program: &'p Program,
    options: ResolveOptions,
    cache: ParallelCache,
    contracts: ContractTable,
    cruft: CruftCache,
    processed: FxHashSet<PhraseId>,
    construction: RecursionGuard<PhraseId>,
}

impl<'p> Resolver<'p> {
    pub fn new(program: &'p Program, options: ResolveOptions) -> Self {
        Self {
            program,
            options,
            cache: ParallelCache::new(),
            contracts: ContractTable::new(),
            cruft: CruftCache::new(),
            processed: FxHashSet::default(),
            construction: RecursionGuard::with_profile(options.construction),
        }
    }

    /// Run the pass to completion.
    pub fn run(mut self) -> Result<Resolution, ResolveError> {
        let program = self.program;
        let phrases = program.phrases();
        debug!(
            generation = program.generation(),
            phrases = phrases.len(),
            "resolution pass started"
        );

        for (_, root) in program.roots() {
            self.cache.create_root(phrases, root)?;
            self.processed.insert(root);
        }

        for phrase in phrases.construction_order() {
            self.ensure(phrase)?;
        }

        let explicit: Vec<ParallelId> = self
            .cache
            .iter()
            .filter(|(_, node)| node.is_explicit() && node.container.is_some())
            .map(|(id, _)| id)
            .collect();
        for id in explicit {
            self.ensure_contract(id);
        }

        debug!(
            nodes = self.cache.len(),
            faults = self.cruft.len(),
            "resolution pass finished"
        );
        Ok(Resolution::new(
            program.generation(),
            self.options,
            self.cache,
            self.contracts,
            self.cruft,
        ))
    }

    // -----------------------------------------------------------------------
    // Construction
    // -----------------------------------------------------------------------

    /// The node for `phrase`, built and processed.
    fn ensure(&mut self, phrase: PhraseId) -> Result<ParallelId, ResolveError> {
        let id = self.materialize(phrase)?;
        if self.processed.contains(&phrase) {
            return Ok(id);
        }

        match self.construction.enter(phrase) {
            RecursionResult::Entered => {
                self.processed.insert(phrase);
                let result = self.process(id);
                self.construction.leave(phrase);
                result?;
            }
            RecursionResult::Cycle => {}
            RecursionResult::DepthExceeded | RecursionResult::IterationExceeded => {
                debug!(
                    phrase = ?phrase,
                    depth = self.construction.depth(),
                    "construction limit exceeded"
                );
                self.processed.insert(phrase);
                self.cruft.record(
                    Fault::new(FaultKind::ResolutionLimitExceeded, phrase)
                        .with_source(CruftSource::Phrase(phrase)),
                );
            }
        }
        Ok(id)
    }

    /// Create bare nodes for `phrase` and any uncached ancestors.
    fn materialize(&mut self, phrase: PhraseId) -> Result<ParallelId, ResolveError> {
        if let Some(id) = self.cache.get(phrase) {
            return Ok(id);
        }
        let program = self.program;
        let phrases = program.phrases();
        let data = program.phrase(phrase)?;
        if data.is_orphaned() {
            return Err(ResolveError::Orphaned(phrase));
        }

        let mut last = None;
        for prefix in phrases.ancestry(phrase) {
            if let Some(id) = self.cache.get(prefix) {
                last = Some(id);
                continue;
            }
            let hypothetical = program.phrase(prefix)?.is_hypothetical();
            let id = if hypothetical {
                self.cache.create_implicit(phrases, prefix)?
            } else {
                self.cache.create_explicit(phrases, prefix)?
            };
            trace!(phrase = ?prefix, node = ?id, hypothetical, "node created");
            last = Some(id);
        }
        last.ok_or(ResolveError::NotCached(phrase))
    }

    fn process(&mut self, id: ParallelId) -> Result<(), ResolveError> {
        let program = self.program;
        let phrase = self.cache.phrase_of(id);
        let Some(subject) = program.phrase(phrase)?.terminal else {
            return Ok(());
        };

        if let Some(container) = self.cache.node(id).container {
            let container_phrase = self.cache.phrase_of(container);
            self.ensure(container_phrase)?;
            let contributors = self.descend(container, subject, id)?;
            if !contributors.is_empty() {
                trace!(phrase = ?phrase, contributors = contributors.len(), "contributors found");
            }
            self.cache.node_mut(id).set_contributors(contributors);
        }

        let incoming = program.forks().incoming(phrase);
        if !incoming.is_empty() && !self.cache.node(id).is_explicit() {
            return Err(ResolveError::HypotheticalPredecessor(phrase));
        }
        for &fork in incoming {
            self.apply_fork(id, fork)?;
        }
        Ok(())
    }

    /// Nodes at `subject` beneath every source feeding `container`: its
    /// applied bases (transitively) and its own contributors.
    fn descend(
        &mut self,
        container: ParallelId,
        subject: Subject,
        exclude: ParallelId,
    ) -> Result<SmallVec<[ParallelId; 2]>, ResolveError> {
        let mut sources: FxIndexSet<ParallelId> = FxIndexSet::default();
        let node = self.cache.node(container);
        if node.is_explicit() {
            sources.extend(self.cache.base_closure(container).into_iter().skip(1));
        }
        sources.extend(node.contributors().iter().copied());

        let program = self.program;
        let phrases = program.phrases();
        let mut contributors: SmallVec<[ParallelId; 2]> = SmallVec::new();
        for source in sources {
            let source_phrase = self.cache.phrase_of(source);
            let Some(child) = phrases.peek(source_phrase, subject) else {
                continue;
            };
            if phrases.get(child).is_none_or(|d| d.is_orphaned()) {
                continue;
            }
            let child_node = self.ensure(child)?;
            if child_node != exclude && !contributors.contains(&child_node) {
                contributors.push(child_node);
            }
        }
        Ok(contributors)
    }

    // -----------------------------------------------------------------------
    // Forks
    // -----------------------------------------------------------------------

    fn apply_fork(&mut self, target: ParallelId, fork: ForkId) -> Result<(), ResolveError> {
        let program = self.program;
        let forks = program.forks();
        let Some(data) = forks.get(fork) else {
            return Ok(());
        };
        if data.is_alias() {
            trace!(fork = ?fork, "alias fork");
            return Ok(());
        }

        let sanitizer = Sanitizer::new(
            program.phrases(),
            forks,
            program.subjects(),
            self.options.base_walk,
        );
        let target_phrase = self.cache.phrase_of(target);
        if !sanitizer.check_fork(&mut self.cruft, target_phrase, fork).is_clean() {
            return Ok(());
        }

        let mut candidates: SmallVec<[ParallelId; 2]> = SmallVec::new();
        for &successor in &data.successors {
            if program
                .phrases()
                .get(successor)
                .is_none_or(|d| d.is_orphaned())
            {
                trace!(fork = ?fork, successor = ?successor, "orphaned successor skipped");
                continue;
            }
            let node = self.ensure(successor)?;
            if self.cache.node(node).is_explicit() {
                push_unique(&mut candidates, node);
            } else {
                for contributor in self.explicit_contributors(node) {
                    push_unique(&mut candidates, contributor);
                }
            }
        }

        for base in candidates {
            let already = self
                .cache
                .explicit(target)
                .is_some_and(|e| e.bases.contains_key(&base));
            if already {
                continue;
            }

            self.ensure_contract(target);
            let outcome = sanitizer.check(&mut self.cache, &mut self.cruft, target, base, fork);
            if outcome.is_clean() && self.cache.add_base(target, base, fork) {
                trace!(target = ?target, base = ?base, fork = ?fork, "base applied");
                self.propagate(target, base);
            }
        }
        Ok(())
    }

    /// Explicit nodes contributing to an implicit node, flattened.
    fn explicit_contributors(&self, node: ParallelId) -> SmallVec<[ParallelId; 2]> {
        let mut out = SmallVec::new();
        let mut guard = RecursionGuard::with_profile(self.options.contributor_walk);
        self.collect_explicit(node, &mut out, &mut guard);
        out
    }

    fn collect_explicit(
        &self,
        node: ParallelId,
        out: &mut SmallVec<[ParallelId; 2]>,
        guard: &mut RecursionGuard<ParallelId>,
    ) {
        if !guard.enter(node).is_entered() {
            return;
        }
        for &contributor in self.cache.node(node).contributors() {
            if self.cache.node(contributor).is_explicit() {
                push_unique(out, contributor);
            } else {
                self.collect_explicit(contributor, out, guard);
            }
        }
        guard.leave(node);
    }

    // -----------------------------------------------------------------------
    // Contracts
    // -----------------------------------------------------------------------

    fn ensure_contract(&mut self, id: ParallelId) {
        if self.contracts.is_built(id) || !self.cache.node(id).is_explicit() {
            return;
        }
        let mut contract = Contract::build(&self.cache, id, self.options.contributor_walk);
        let bases: SmallVec<[ParallelId; 4]> = self.cache.node(id).bases().map(|(b, _)| b).collect();
        for base in bases {
            contract.try_satisfy_condition(&self.cache, base);
        }
        trace!(
            node = ?id,
            unsatisfied = contract.unsatisfied().count(),
            "contract built"
        );
        self.contracts.insert(id, contract);
    }

    /// Offer `base` to every built contract at or downstream of `target`.
    fn propagate(&mut self, target: ParallelId, base: ParallelId) {
        for watcher in self.cache.derived_closure(target) {
            if let Some(contract) = self.contracts.get_mut(watcher) {
                contract.try_satisfy_condition(&self.cache, base);
            }
        }
    }
}

fn push_unique(list: &mut SmallVec<[ParallelId; 2]>, id: ParallelId) {
    if !list.contains(&id) {
        list.push(id);
    }
}

#[cfg(test)]
#[path = "tests/resolver_tests.rs"]
mod tests;
