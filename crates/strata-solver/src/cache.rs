//! The parallel cache: the arena of resolved nodes for one generation.
//!
//! Nodes are addressed by [`ParallelId`] and looked up by phrase. The cache
//! enforces construction order: a node may only be created once, and only
//! after its container's node exists. Violations are internal-invariant
//! errors, never user faults.
//!
//! The cache also keeps a reverse index from each base to the nodes that
//! name it directly, so contract propagation can walk "who derives from
//! this" without scanning the arena.

use crate::error::ResolveError;
use crate::fork::ForkId;
use crate::parallel::{ExplicitParallel, ImplicitParallel, Parallel, ParallelId, ParallelKind};
use crate::phrase::{PhraseId, PhraseTable};
use crate::recursion::{RecursionGuard, RecursionProfile};
use indexmap::IndexSet;
use rustc_hash::{FxBuildHasher, FxHashMap};
use smallvec::SmallVec;
use strata_common::limits;
use tracing::trace;

pub type FxIndexSet<T> = IndexSet<T, FxBuildHasher>;

#[derive(Debug, Default, Clone)]
pub struct ParallelCache {
    nodes: Vec<Parallel>,
    by_phrase: FxHashMap<PhraseId, ParallelId>,
    derived: FxHashMap<ParallelId, SmallVec<[ParallelId; 2]>>,
}

impl ParallelCache {
    pub fn new() -> Self {
        Self {
            nodes: Vec::with_capacity(limits::INITIAL_NODE_CAPACITY),
            ..Self::default()
        }
    }

    /// Seed the node for a document root. Roots are the only nodes without
    /// a container.
    pub fn create_root(
        &mut self,
        phrases: &PhraseTable,
        phrase: PhraseId,
    ) -> Result<ParallelId, ResolveError> {
        let data = phrases.get(phrase).ok_or(ResolveError::UnknownPhrase(phrase))?;
        if !data.is_root() {
            return Err(ResolveError::NotRoot(phrase));
        }
        if self.has(phrase) {
            return Err(ResolveError::AlreadyCached(phrase));
        }
        Ok(self.push(phrase, None, ParallelKind::Explicit(ExplicitParallel::default())))
    }

    /// Build an explicit node for a declared phrase. If the phrase has a
    /// list twin, the twin's node is built (or linked, if it exists) too, so
    /// both views of a list can be checked symmetrically.
    pub fn create_explicit(
        &mut self,
        phrases: &PhraseTable,
        phrase: PhraseId,
    ) -> Result<ParallelId, ResolveError> {
        let container = self.check_creatable(phrases, phrase)?;
        if phrases.get(phrase).is_some_and(|d| d.is_hypothetical()) {
            return Err(ResolveError::HypotheticalExplicit(phrase));
        }

        let id = self.push(
            phrase,
            Some(container),
            ParallelKind::Explicit(ExplicitParallel::default()),
        );

        if let Some(twin) = phrases.list_bridge(phrase) {
            let twin_live = phrases
                .get(twin)
                .is_some_and(|d| !d.is_orphaned() && !d.is_hypothetical());
            let bridge = match self.get(twin) {
                Some(existing) if self.nodes[existing.0 as usize].is_explicit() => Some(existing),
                Some(_) => None,
                None if twin_live => Some(self.push(
                    twin,
                    Some(container),
                    ParallelKind::Explicit(ExplicitParallel::default()),
                )),
                None => None,
            };
            if let Some(bridge) = bridge {
                trace!(phrase = ?phrase, twin = ?twin, "linking list bridge");
                self.link_bridge(id, bridge);
            }
        }
        Ok(id)
    }

    /// Build an implicit node for a hypothetical phrase.
    pub fn create_implicit(
        &mut self,
        phrases: &PhraseTable,
        phrase: PhraseId,
    ) -> Result<ParallelId, ResolveError> {
        let container = self.check_creatable(phrases, phrase)?;
        if phrases.get(phrase).is_some_and(|d| !d.is_hypothetical()) {
            return Err(ResolveError::ConcreteImplicit(phrase));
        }
        Ok(self.push(
            phrase,
            Some(container),
            ParallelKind::Implicit(ImplicitParallel::default()),
        ))
    }

    fn check_creatable(
        &self,
        phrases: &PhraseTable,
        phrase: PhraseId,
    ) -> Result<ParallelId, ResolveError> {
        let data = phrases.get(phrase).ok_or(ResolveError::UnknownPhrase(phrase))?;
        if data.is_orphaned() {
            return Err(ResolveError::Orphaned(phrase));
        }
        if data.is_root() {
            return Err(ResolveError::NotRoot(phrase));
        }
        if self.has(phrase) {
            return Err(ResolveError::AlreadyCached(phrase));
        }
        self.get(data.parent).ok_or(ResolveError::OutOfOrder {
            phrase,
            container: data.parent,
        })
    }

    fn push(&mut self, phrase: PhraseId, container: Option<ParallelId>, kind: ParallelKind) -> ParallelId {
        let id = ParallelId(self.nodes.len() as u32);
        self.nodes.push(Parallel {
            phrase,
            container,
            kind,
        });
        self.by_phrase.insert(phrase, id);
        id
    }

    fn link_bridge(&mut self, a: ParallelId, b: ParallelId) {
        if let Some(explicit) = self.nodes[a.0 as usize].as_explicit_mut() {
            explicit.bridge = Some(b);
        }
        if let Some(explicit) = self.nodes[b.0 as usize].as_explicit_mut() {
            explicit.bridge = Some(a);
        }
    }

    // -----------------------------------------------------------------------
    // Lookups
    // -----------------------------------------------------------------------

    #[inline]
    pub fn get(&self, phrase: PhraseId) -> Option<ParallelId> {
        self.by_phrase.get(&phrase).copied()
    }

    /// The explicit node for `phrase`. Fails if nothing is cached, or if the
    /// cached node is implicit.
    pub fn get_explicit(&self, phrase: PhraseId) -> Result<ParallelId, ResolveError> {
        let id = self.get(phrase).ok_or(ResolveError::NotCached(phrase))?;
        if self.nodes[id.0 as usize].is_explicit() {
            Ok(id)
        } else {
            Err(ResolveError::NotExplicit(phrase))
        }
    }

    #[inline]
    pub fn has(&self, phrase: PhraseId) -> bool {
        self.by_phrase.contains_key(&phrase)
    }

    #[inline]
    pub fn node(&self, id: ParallelId) -> &Parallel {
        &self.nodes[id.0 as usize]
    }

    #[inline]
    pub fn node_mut(&mut self, id: ParallelId) -> &mut Parallel {
        &mut self.nodes[id.0 as usize]
    }

    #[inline]
    pub fn explicit(&self, id: ParallelId) -> Option<&ExplicitParallel> {
        self.nodes.get(id.0 as usize).and_then(Parallel::as_explicit)
    }

    #[inline]
    pub fn phrase_of(&self, id: ParallelId) -> PhraseId {
        self.nodes[id.0 as usize].phrase
    }

    pub fn iter(&self) -> impl Iterator<Item = (ParallelId, &Parallel)> {
        self.nodes
            .iter()
            .enumerate()
            .map(|(i, node)| (ParallelId(i as u32), node))
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    // -----------------------------------------------------------------------
    // Base edges
    // -----------------------------------------------------------------------

    /// Apply `base` to `target`. Returns false when `target` is implicit or
    /// already has that base.
    pub fn add_base(&mut self, target: ParallelId, base: ParallelId, fork: ForkId) -> bool {
        let Some(explicit) = self.nodes[target.0 as usize].as_explicit_mut() else {
            return false;
        };
        if explicit.bases.contains_key(&base) {
            return false;
        }
        explicit.bases.insert(base, fork);
        self.derived.entry(base).or_default().push(target);
        true
    }

    /// Remove the single edge `owner -> base`. Returns the fork that had
    /// applied it.
    pub fn remove_base(&mut self, owner: ParallelId, base: ParallelId) -> Option<ForkId> {
        let explicit = self.nodes[owner.0 as usize].as_explicit_mut()?;
        let fork = explicit.bases.shift_remove(&base)?;
        if let Some(derived) = self.derived.get_mut(&base) {
            derived.retain(|d| *d != owner);
        }
        Some(fork)
    }

    // -----------------------------------------------------------------------
    // Dimensionality
    // -----------------------------------------------------------------------

    /// List nesting depth accumulated along applied bases: 1 for a
    /// list-suffixed phrase, plus the deepest base. The extrinsic twin of a
    /// list is not a list, so it carries only what its bases give it.
    pub fn dimensionality(&self, id: ParallelId, phrases: &PhraseTable) -> u32 {
        let own = u32::from(phrases.get(self.phrase_of(id)).is_some_and(|d| d.is_list()));
        own + self.inherited_dimensionality(id, phrases).unwrap_or(0)
    }

    /// The deepest dimensionality among `id`'s applied bases, or `None` when
    /// nothing is applied yet.
    pub fn inherited_dimensionality(&self, id: ParallelId, phrases: &PhraseTable) -> Option<u32> {
        let mut guard = RecursionGuard::with_profile(RecursionProfile::BaseWalk);
        if !guard.enter(id).is_entered() {
            return None;
        }
        let deepest = self.deepest_base(id, phrases, &mut guard);
        guard.leave(id);
        if guard.is_exceeded() {
            trace!(node = ?id, "dimensionality walk truncated");
        }
        deepest
    }

    fn deepest_base(
        &self,
        id: ParallelId,
        phrases: &PhraseTable,
        guard: &mut RecursionGuard<ParallelId>,
    ) -> Option<u32> {
        let mut deepest = None;
        for (base, _) in self.node(id).bases() {
            let own = u32::from(phrases.get(self.phrase_of(base)).is_some_and(|d| d.is_list()));
            let inherited = if guard.enter(base).is_entered() {
                let inherited = self.deepest_base(base, phrases, guard);
                guard.leave(base);
                inherited.unwrap_or(0)
            } else {
                0
            };
            deepest = deepest.max(Some(own + inherited));
        }
        deepest
    }

    /// `id` followed by every transitive base, breadth first.
    pub fn base_closure(&self, id: ParallelId) -> FxIndexSet<ParallelId> {
        let mut closure = FxIndexSet::default();
        closure.insert(id);
        let mut cursor = 0;
        while let Some(&current) = closure.get_index(cursor) {
            cursor += 1;
            if closure.len() as u32 >= limits::MAX_WALK_ITERATIONS {
                break;
            }
            if let Some(explicit) = self.explicit(current) {
                for &base in explicit.bases.keys() {
                    closure.insert(base);
                }
            }
        }
        closure
    }

    /// `id` followed by every node that has `id` in its base closure.
    pub fn derived_closure(&self, id: ParallelId) -> FxIndexSet<ParallelId> {
        let mut closure = FxIndexSet::default();
        closure.insert(id);
        let mut cursor = 0;
        while let Some(&current) = closure.get_index(cursor) {
            cursor += 1;
            if closure.len() as u32 >= limits::MAX_WALK_ITERATIONS {
                break;
            }
            if let Some(derived) = self.derived.get(&current) {
                for &node in derived {
                    closure.insert(node);
                }
            }
        }
        closure
    }
}

#[cfg(test)]
#[path = "tests/cache_tests.rs"]
mod tests;
