//! The cruft cache: a sink for user-authored contradictions.
//!
//! Anything recorded here is excluded from the rest of the resolution pass.
//! Faults are appended to a flat list and indexed by source, so exclusion
//! checks are a hash lookup. A fault may name several sources (every fork on
//! a cycle, every span of a conflicting annotation) and still counts as one
//! fault.

use crate::fork::{ForkId, SpanId};
use crate::phrase::PhraseId;
use rustc_hash::FxHashMap;
use serde::Serialize;
use smallvec::SmallVec;
use strata_common::{DiagnosticMessage, diagnostic_messages};

/// What kind of contradiction was found.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub enum FaultKind {
    ListAnnotationConflict,
    CircularFactReference,
    ListDimensionalDiscrepancy,
    PatternNonCovariant,
    ResolutionLimitExceeded,
}

impl FaultKind {
    pub const fn message(self) -> &'static DiagnosticMessage {
        match self {
            Self::ListAnnotationConflict => &diagnostic_messages::LIST_ANNOTATION_CONFLICT,
            Self::CircularFactReference => &diagnostic_messages::CIRCULAR_FACT_REFERENCE,
            Self::ListDimensionalDiscrepancy => {
                &diagnostic_messages::LIST_DIMENSIONAL_DISCREPANCY
            }
            Self::PatternNonCovariant => &diagnostic_messages::PATTERN_NON_COVARIANT,
            Self::ResolutionLimitExceeded => &diagnostic_messages::RESOLUTION_LIMIT_EXCEEDED,
        }
    }

    #[inline]
    pub const fn code(self) -> u32 {
        self.message().code
    }
}

/// The graph element a fault points at.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub enum CruftSource {
    Fork(ForkId),
    Span(SpanId),
    Phrase(PhraseId),
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct FaultId(pub u32);

/// One recorded contradiction.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Fault {
    pub kind: FaultKind,
    pub sources: SmallVec<[CruftSource; 2]>,
    /// The phrase whose resolution detected the fault.
    pub target: PhraseId,
    /// The proposed base, when the fault concerns a base edge.
    pub base: Option<PhraseId>,
}

impl Fault {
    pub fn new(kind: FaultKind, target: PhraseId) -> Self {
        Self {
            kind,
            sources: SmallVec::new(),
            target,
            base: None,
        }
    }

    #[must_use]
    pub fn with_base(mut self, base: PhraseId) -> Self {
        self.base = Some(base);
        self
    }

    #[must_use]
    pub fn with_source(mut self, source: CruftSource) -> Self {
        self.sources.push(source);
        self
    }

    #[must_use]
    pub fn with_sources(mut self, sources: impl IntoIterator<Item = CruftSource>) -> Self {
        self.sources.extend(sources);
        self
    }
}

#[derive(Debug, Default, Clone)]
pub struct CruftCache {
    faults: Vec<Fault>,
    index: FxHashMap<CruftSource, SmallVec<[FaultId; 1]>>,
}

impl CruftCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a fault and index it under each of its sources.
    pub fn record(&mut self, fault: Fault) -> FaultId {
        let id = FaultId(self.faults.len() as u32);
        for &source in &fault.sources {
            let entry = self.index.entry(source).or_default();
            if !entry.contains(&id) {
                entry.push(id);
            }
        }
        self.faults.push(fault);
        id
    }

    /// Whether `source` is excluded from the graph.
    #[inline]
    pub fn has(&self, source: CruftSource) -> bool {
        self.index.contains_key(&source)
    }

    pub fn has_kind(&self, kind: FaultKind, source: CruftSource) -> bool {
        self.faults_for(source).any(|fault| fault.kind == kind)
    }

    pub fn faults_for(&self, source: CruftSource) -> impl Iterator<Item = &Fault> {
        self.index
            .get(&source)
            .into_iter()
            .flatten()
            .filter_map(|id| self.faults.get(id.0 as usize))
    }

    #[inline]
    pub fn get(&self, id: FaultId) -> Option<&Fault> {
        self.faults.get(id.0 as usize)
    }

    /// All faults, in detection order.
    #[inline]
    pub fn faults(&self) -> &[Fault] {
        &self.faults
    }

    /// Every (element, kind) pair, in detection order.
    pub fn pairs(&self) -> impl Iterator<Item = (CruftSource, FaultKind)> + '_ {
        self.faults
            .iter()
            .flat_map(|fault| fault.sources.iter().map(move |&s| (s, fault.kind)))
    }

    pub fn count_of(&self, kind: FaultKind) -> usize {
        self.faults.iter().filter(|f| f.kind == kind).count()
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.faults.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.faults.is_empty()
    }

    /// Forget everything; used when a generation is rebuilt.
    pub fn clear(&mut self) {
        self.faults.clear();
        self.index.clear();
    }
}

#[cfg(test)]
#[path = "tests/cruft_tests.rs"]
mod tests;
