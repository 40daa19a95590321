//! Forks: the edges of the type graph.
//!
//! One fork is produced per annotation statement. It links the declared
//! (predecessor) phrase to the phrases its annotations name as bases. A fork
//! with no successors records an alias: the annotation term is known but
//! names nothing in the graph.
//!
//! The annotation spans that contributed to a fork are kept individually so
//! faults can point at exactly the offending text.

use crate::phrase::{DocumentId, PhraseId};
use crate::subject::Term;
use rustc_hash::{FxHashMap, FxHashSet};
use serde::Serialize;
use smallvec::SmallVec;
use strata_common::{Atom, Span};

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct ForkId(pub u32);

/// Identifies one contributing annotation span.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct SpanId(pub u32);

/// The text of one annotation, as written.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct AnnotationSpan {
    pub document: DocumentId,
    pub span: Span,
    pub term: Term,
}

#[derive(Clone, Debug)]
pub struct Fork {
    pub predecessor: PhraseId,
    pub successors: SmallVec<[PhraseId; 2]>,
    /// The term that caused the fork (the first contributing annotation).
    pub term: Term,
    pub annotations: SmallVec<[SpanId; 2]>,
}

impl Fork {
    #[inline]
    pub fn is_alias(&self) -> bool {
        self.successors.is_empty()
    }
}

/// Owns every fork and annotation span of a program.
#[derive(Debug, Default)]
pub struct ForkTable {
    forks: Vec<Fork>,
    spans: Vec<AnnotationSpan>,
    incoming: FxHashMap<PhraseId, SmallVec<[ForkId; 2]>>,
    retired: FxHashSet<ForkId>,
}

impl ForkTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a fork. The causing term is the first annotation's term.
    pub fn add(
        &mut self,
        predecessor: PhraseId,
        successors: &[PhraseId],
        annotations: &[AnnotationSpan],
    ) -> ForkId {
        debug_assert!(!annotations.is_empty(), "a fork needs at least one annotation");
        let term = annotations
            .first()
            .map(|a| a.term)
            .unwrap_or(Term::new(Atom::NONE, false));

        let mut span_ids = SmallVec::new();
        for annotation in annotations {
            span_ids.push(SpanId(self.spans.len() as u32));
            self.spans.push(*annotation);
        }

        let id = ForkId(self.forks.len() as u32);
        self.forks.push(Fork {
            predecessor,
            successors: successors.iter().copied().collect(),
            term,
            annotations: span_ids,
        });
        self.incoming.entry(predecessor).or_default().push(id);
        id
    }

    #[inline]
    pub fn get(&self, id: ForkId) -> Option<&Fork> {
        self.forks.get(id.0 as usize)
    }

    #[inline]
    pub fn span(&self, id: SpanId) -> Option<&AnnotationSpan> {
        self.spans.get(id.0 as usize)
    }

    /// Live forks declared on `phrase`, in statement order.
    pub fn incoming(&self, phrase: PhraseId) -> &[ForkId] {
        self.incoming.get(&phrase).map(|v| v.as_slice()).unwrap_or(&[])
    }

    #[inline]
    pub fn is_retired(&self, id: ForkId) -> bool {
        self.retired.contains(&id)
    }

    /// Live forks, in creation order.
    pub fn iter(&self) -> impl Iterator<Item = (ForkId, &Fork)> {
        self.forks
            .iter()
            .enumerate()
            .map(|(i, fork)| (ForkId(i as u32), fork))
            .filter(|(id, _)| !self.retired.contains(id))
    }

    /// Retire every fork whose predecessor matches `predicate`.
    pub fn retire_where(&mut self, mut predicate: impl FnMut(PhraseId) -> bool) {
        for (i, fork) in self.forks.iter().enumerate() {
            if predicate(fork.predecessor) {
                self.retired.insert(ForkId(i as u32));
            }
        }
        let retired = &self.retired;
        self.incoming.retain(|_, forks| {
            forks.retain(|f| !retired.contains(f));
            !forks.is_empty()
        });
    }

    /// The annotation spans of `fork` that conflict on list-ness: spans
    /// whose term name also appears with the opposite list suffix within the
    /// same fork. Empty when the fork is consistent.
    pub fn list_fragment_conflicts(&self, fork: ForkId) -> SmallVec<[SpanId; 2]> {
        let Some(data) = self.get(fork) else {
            return SmallVec::new();
        };
        let mut seen: FxHashMap<Atom, (bool, bool)> = FxHashMap::default();
        for &span in &data.annotations {
            if let Some(annotation) = self.span(span) {
                let entry = seen.entry(annotation.term.name).or_default();
                if annotation.term.is_list {
                    entry.0 = true;
                } else {
                    entry.1 = true;
                }
            }
        }
        data.annotations
            .iter()
            .copied()
            .filter(|&span| {
                self.span(span)
                    .and_then(|a| seen.get(&a.term.name))
                    .is_some_and(|&(list, item)| list && item)
            })
            .collect()
    }
}

#[cfg(test)]
#[path = "tests/fork_tests.rs"]
mod tests;
