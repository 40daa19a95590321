//! Parallels: the resolved multiple-inheritance node for a phrase.
//!
//! There are two shapes, carried as one node type with a discriminant:
//!
//! | Shape | Phrase | Bases | Contract |
//! |-------|--------|-------|----------|
//! | Implicit | hypothetical (never declared) | none | none |
//! | Explicit | declared | ordered base -> fork mapping | lazily built |
//!
//! Implicit nodes are cheap fan-in points: positions that exist only because
//! several inheriting branches converge there. They expose the nested
//! parallels that contribute to them. Explicit nodes pay for full base and
//! contract bookkeeping.
//!
//! Derived flags are computed on demand from the node's shape, its phrase and
//! the cruft cache; nothing here stores them.

use crate::cruft::{CruftCache, CruftSource, FaultKind};
use crate::fork::{ForkId, ForkTable};
use crate::phrase::{PhraseId, PhraseTable};
use bitflags::bitflags;
use indexmap::IndexMap;
use rustc_hash::FxBuildHasher;
use serde::Serialize;
use smallvec::SmallVec;

pub type FxIndexMap<K, V> = IndexMap<K, V, FxBuildHasher>;

/// Arena index of a node within a `ParallelCache`.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct ParallelId(pub u32);

bitflags! {
    /// Flags derived from a node's resolved shape.
    #[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
    pub struct ParallelFlags: u8 {
        /// The phrase terminal is a list-suffixed term.
        const IS_LIST = 1 << 0;
        /// Explicit, with no bases and nothing contributing to it.
        const IS_FRESH = 1 << 1;
        /// The phrase terminal is a pattern.
        const IS_ANONYMOUS = 1 << 2;
        /// Explicit, redeclaring a position inherited from a base.
        const IS_OVERRIDE = 1 << 3;
        /// One of the phrase's forks lies on a detected inheritance cycle.
        const IN_CIRCULAR_GROUP = 1 << 4;
        /// Any fault touches the phrase, its forks, or their spans.
        const IS_FAULTED = 1 << 5;
    }
}

impl ParallelFlags {
    /// Lowercase names of the set flags, for snapshots and display.
    pub fn names(self) -> Vec<&'static str> {
        let mut names = Vec::new();
        for (flag, name) in [
            (Self::IS_LIST, "list"),
            (Self::IS_FRESH, "fresh"),
            (Self::IS_ANONYMOUS, "anonymous"),
            (Self::IS_OVERRIDE, "override"),
            (Self::IN_CIRCULAR_GROUP, "circular"),
            (Self::IS_FAULTED, "faulted"),
        ] {
            if self.contains(flag) {
                names.push(name);
            }
        }
        names
    }
}

#[derive(Clone, Debug, Default)]
pub struct ImplicitParallel {
    /// Nested parallels that fan into this position from different branches.
    pub contributors: SmallVec<[ParallelId; 2]>,
}

#[derive(Clone, Debug, Default)]
pub struct ExplicitParallel {
    /// Applied bases, each labelled with the fork that introduced it.
    pub bases: FxIndexMap<ParallelId, ForkId>,
    /// The other half of a list's intrinsic/extrinsic pair.
    pub bridge: Option<ParallelId>,
    /// Nested parallels inherited at this position through the container.
    pub contributors: SmallVec<[ParallelId; 2]>,
}

#[derive(Clone, Debug)]
pub enum ParallelKind {
    Implicit(ImplicitParallel),
    Explicit(ExplicitParallel),
}

#[derive(Clone, Debug)]
pub struct Parallel {
    pub phrase: PhraseId,
    /// `None` only for document roots.
    pub container: Option<ParallelId>,
    pub kind: ParallelKind,
}

impl Parallel {
    #[inline]
    pub fn is_explicit(&self) -> bool {
        matches!(self.kind, ParallelKind::Explicit(_))
    }

    #[inline]
    pub fn as_explicit(&self) -> Option<&ExplicitParallel> {
        match &self.kind {
            ParallelKind::Explicit(explicit) => Some(explicit),
            ParallelKind::Implicit(_) => None,
        }
    }

    #[inline]
    pub fn as_explicit_mut(&mut self) -> Option<&mut ExplicitParallel> {
        match &mut self.kind {
            ParallelKind::Explicit(explicit) => Some(explicit),
            ParallelKind::Implicit(_) => None,
        }
    }

    pub fn contributors(&self) -> &[ParallelId] {
        match &self.kind {
            ParallelKind::Implicit(implicit) => &implicit.contributors,
            ParallelKind::Explicit(explicit) => &explicit.contributors,
        }
    }

    pub fn set_contributors(&mut self, contributors: SmallVec<[ParallelId; 2]>) {
        match &mut self.kind {
            ParallelKind::Implicit(implicit) => implicit.contributors = contributors,
            ParallelKind::Explicit(explicit) => explicit.contributors = contributors,
        }
    }

    /// Applied bases with their forks, in application order.
    pub fn bases(&self) -> impl Iterator<Item = (ParallelId, ForkId)> + '_ {
        self.as_explicit()
            .into_iter()
            .flat_map(|explicit| explicit.bases.iter().map(|(&b, &f)| (b, f)))
    }

    /// Compute the derived flags.
    pub fn flags(&self, phrases: &PhraseTable, forks: &ForkTable, cruft: &CruftCache) -> ParallelFlags {
        let mut flags = ParallelFlags::empty();
        let Some(data) = phrases.get(self.phrase) else {
            return flags;
        };

        if data.is_list() {
            flags |= ParallelFlags::IS_LIST;
        }
        if data.terminal.is_some_and(|s| s.is_pattern()) {
            flags |= ParallelFlags::IS_ANONYMOUS;
        }
        if let ParallelKind::Explicit(explicit) = &self.kind {
            if explicit.contributors.is_empty() {
                if explicit.bases.is_empty() {
                    flags |= ParallelFlags::IS_FRESH;
                }
            } else {
                flags |= ParallelFlags::IS_OVERRIDE;
            }
        }

        let mut faulted = cruft.has(CruftSource::Phrase(self.phrase));
        for &fork in forks.incoming(self.phrase) {
            let source = CruftSource::Fork(fork);
            if cruft.has_kind(FaultKind::CircularFactReference, source) {
                flags |= ParallelFlags::IN_CIRCULAR_GROUP;
            }
            faulted |= cruft.has(source);
            if let Some(data) = forks.get(fork) {
                faulted |= data
                    .annotations
                    .iter()
                    .any(|&span| cruft.has(CruftSource::Span(span)));
            }
        }
        if faulted {
            flags |= ParallelFlags::IS_FAULTED;
        }
        flags
    }
}
