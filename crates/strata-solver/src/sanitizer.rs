//! Base-edge sanitization.
//!
//! A fork is screened once, before any of its successors is considered.
//! Every proposed base edge `(target, base, fork)` then passes through here
//! before it is applied. The edge checks are independent and additive, and
//! a fault on one edge never blocks the fork's other edges:
//!
//! | Check | Scope | Trigger | Fault | Faulted element |
//! |-------|-------|---------|-------|-----------------|
//! | list fragments | fork | the fork mixes `Name` and `Name...` | `ListAnnotationConflict` | each mixed span |
//! | circularity | edge | the base's applied closure reaches the target | `CircularFactReference` | every fork on the path |
//! | dimensionality | edge | `dim(target) != dim(base) + list-annotated` | `ListDimensionalDiscrepancy` | the fork |
//! | covariance | edge | both patterns, target not within base | `PatternNonCovariant` | the fork |
//!
//! Dimensionality accumulates along applied bases, so a target without bases
//! takes whatever depth its first base gives it. A fork that already carries
//! cruft when it is screened is excluded without re-checking. When a cycle is
//! found, the edges on it that were applied earlier are pruned from their
//! owners so the surviving graph stays acyclic.

use crate::cache::ParallelCache;
use crate::cruft::{CruftCache, CruftSource, Fault, FaultKind};
use crate::fork::{ForkId, ForkTable};
use crate::parallel::ParallelId;
use crate::phrase::{PhraseId, PhraseTable};
use crate::recursion::{RecursionGuard, RecursionProfile};
use crate::subject::SubjectTable;
use rustc_hash::FxHashSet;
use smallvec::SmallVec;
use tracing::{debug, trace};

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum SanitizeOutcome {
    /// No check fired; the edge may be applied.
    Clean,
    /// At least one fault was recorded by this call.
    Faulted,
    /// The fork or one of its spans was already cruft.
    Excluded,
}

impl SanitizeOutcome {
    #[inline]
    pub fn is_clean(self) -> bool {
        matches!(self, Self::Clean)
    }
}

/// Whether `fork` or any of its annotation spans is already cruft.
fn is_excluded(forks: &ForkTable, cruft: &CruftCache, fork: ForkId) -> bool {
    if cruft.has(CruftSource::Fork(fork)) {
        return true;
    }
    forks.get(fork).is_some_and(|data| {
        data.annotations
            .iter()
            .any(|&span| cruft.has(CruftSource::Span(span)))
    })
}

/// One applied edge on a circular path.
#[derive(Copy, Clone, Debug)]
struct CycleEdge {
    owner: ParallelId,
    base: ParallelId,
    fork: ForkId,
}

pub struct Sanitizer<'a> {
    phrases: &'a PhraseTable,
    forks: &'a ForkTable,
    subjects: &'a SubjectTable,
    base_walk: RecursionProfile,
}

impl<'a> Sanitizer<'a> {
    pub fn new(
        phrases: &'a PhraseTable,
        forks: &'a ForkTable,
        subjects: &'a SubjectTable,
        base_walk: RecursionProfile,
    ) -> Self {
        Self {
            phrases,
            forks,
            subjects,
            base_walk,
        }
    }

    /// Screen a fork before any of its successors is considered. Faults
    /// recorded here cover the whole statement.
    pub fn check_fork(
        &self,
        cruft: &mut CruftCache,
        target_phrase: PhraseId,
        fork: ForkId,
    ) -> SanitizeOutcome {
        if is_excluded(self.forks, cruft, fork) {
            trace!(fork = ?fork, "fork already excluded");
            return SanitizeOutcome::Excluded;
        }

        let conflicts = self.forks.list_fragment_conflicts(fork);
        if conflicts.is_empty() {
            return SanitizeOutcome::Clean;
        }
        debug!(fork = ?fork, spans = conflicts.len(), "list annotation conflict");
        cruft.record(
            Fault::new(FaultKind::ListAnnotationConflict, target_phrase)
                .with_sources(conflicts.into_iter().map(CruftSource::Span)),
        );
        SanitizeOutcome::Faulted
    }

    /// Run every edge check against one proposed edge.
    pub fn check(
        &self,
        cache: &mut ParallelCache,
        cruft: &mut CruftCache,
        target: ParallelId,
        base: ParallelId,
        fork: ForkId,
    ) -> SanitizeOutcome {
        let target_phrase = cache.phrase_of(target);
        let base_phrase = cache.phrase_of(base);
        let before = cruft.len();

        if let Some(path) = self.find_cycle(cache, target, base, fork) {
            debug!(target = ?target_phrase, base = ?base_phrase, edges = path.len(), "circular reference");
            for edge in &path {
                if cache.remove_base(edge.owner, edge.base).is_some() {
                    trace!(owner = ?edge.owner, base = ?edge.base, fork = ?edge.fork, "pruned cyclic edge");
                }
            }
            cruft.record(
                Fault::new(FaultKind::CircularFactReference, target_phrase)
                    .with_base(base_phrase)
                    .with_sources(path.into_iter().map(|edge| CruftSource::Fork(edge.fork))),
            );
        }

        if !self.dimensions_agree(cache, target, base, fork) {
            debug!(target = ?target_phrase, base = ?base_phrase, "list dimensionality mismatch");
            cruft.record(
                Fault::new(FaultKind::ListDimensionalDiscrepancy, target_phrase)
                    .with_base(base_phrase)
                    .with_source(CruftSource::Fork(fork)),
            );
        }

        if !self.patterns_covariant(cache, target, base) {
            debug!(target = ?target_phrase, base = ?base_phrase, "pattern is not covariant");
            cruft.record(
                Fault::new(FaultKind::PatternNonCovariant, target_phrase)
                    .with_base(base_phrase)
                    .with_source(CruftSource::Fork(fork)),
            );
        }

        if cruft.len() > before {
            SanitizeOutcome::Faulted
        } else {
            SanitizeOutcome::Clean
        }
    }

    /// Depth-first search from `base` over applied edges for a path back to
    /// `target`. Returns the edges on the cycle, starting with the proposed
    /// one.
    fn find_cycle(
        &self,
        cache: &ParallelCache,
        target: ParallelId,
        base: ParallelId,
        fork: ForkId,
    ) -> Option<SmallVec<[CycleEdge; 4]>> {
        let mut path: SmallVec<[CycleEdge; 4]> = SmallVec::new();
        path.push(CycleEdge {
            owner: target,
            base,
            fork,
        });
        if base == target {
            return Some(path);
        }

        let mut guard = RecursionGuard::with_profile(self.base_walk);
        let mut visited = FxHashSet::default();
        visited.insert(base);
        if !guard.enter(base).is_entered() {
            return None;
        }
        let found = self.walk(cache, base, target, &mut path, &mut visited, &mut guard);
        guard.leave(base);
        found.then_some(path)
    }

    fn walk(
        &self,
        cache: &ParallelCache,
        current: ParallelId,
        target: ParallelId,
        path: &mut SmallVec<[CycleEdge; 4]>,
        visited: &mut FxHashSet<ParallelId>,
        guard: &mut RecursionGuard<ParallelId>,
    ) -> bool {
        for (next, fork) in cache.node(current).bases() {
            path.push(CycleEdge {
                owner: current,
                base: next,
                fork,
            });
            if next == target {
                return true;
            }
            if visited.insert(next) && guard.enter(next).is_entered() {
                let found = self.walk(cache, next, target, path, visited, guard);
                guard.leave(next);
                if found {
                    return true;
                }
            }
            path.pop();
        }
        false
    }

    /// A fork is list-annotated when the phrase it is declared on is a list.
    /// The first base applied to a target fixes its depth; later bases must
    /// agree with it.
    fn dimensions_agree(
        &self,
        cache: &ParallelCache,
        target: ParallelId,
        base: ParallelId,
        fork: ForkId,
    ) -> bool {
        if cache.inherited_dimensionality(target, self.phrases).is_none() {
            return true;
        }
        let list_annotated = self
            .forks
            .get(fork)
            .and_then(|f| self.phrases.get(f.predecessor))
            .is_some_and(|d| d.is_list());
        let target_dim = cache.dimensionality(target, self.phrases);
        let base_dim = cache.dimensionality(base, self.phrases);
        target_dim == base_dim + u32::from(list_annotated)
    }

    fn patterns_covariant(&self, cache: &ParallelCache, target: ParallelId, base: ParallelId) -> bool {
        let pattern_of = |id: ParallelId| {
            self.phrases
                .get(cache.phrase_of(id))
                .and_then(|d| d.terminal)
                .and_then(|s| s.as_pattern())
        };
        match (pattern_of(target), pattern_of(base)) {
            (Some(t), Some(b)) => self.subjects.compare(t, b).is_covariant(),
            _ => true,
        }
    }
}

#[cfg(test)]
#[path = "tests/sanitizer_tests.rs"]
mod tests;
