//! Phrase interning.
//!
//! A phrase is the interned path of subjects naming one position in the type
//! graph: `Animal/Legs` is the phrase whose parent is `Animal` and whose
//! terminal is `Legs`. Each document owns a root phrase (length 0) whose
//! parent is itself.
//!
//! ## Forwarding
//!
//! `forward(parent, subject)` is the only way to create a non-root phrase.
//! It consults one table keyed by `(parent id, subject)`, so for a given
//! parent and subject at most one phrase exists per generation, and lookups
//! are deterministic regardless of allocation order.

use crate::subject::{Subject, Term};
use rustc_hash::FxHashMap;
use serde::Serialize;
use smallvec::SmallVec;
use strata_common::Span;

/// Identifies one document within a program.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct DocumentId(pub u32);

/// Interned phrase handle.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct PhraseId(pub u32);

/// Stored phrase data.
#[derive(Clone, Debug)]
pub struct PhraseData {
    /// Containing phrase. Roots point at themselves.
    pub parent: PhraseId,
    /// `None` only for document roots.
    pub terminal: Option<Subject>,
    pub document: DocumentId,
    /// Number of subjects on the path. Roots have length 0.
    pub length: u32,
    /// Where the phrase was declared, if it was.
    pub declaration: Option<Span>,
    hypothetical: bool,
    orphaned: bool,
}

impl PhraseData {
    /// Hypothetical phrases are reachable positions nobody declared.
    #[inline]
    pub fn is_hypothetical(&self) -> bool {
        self.hypothetical
    }

    #[inline]
    pub fn is_orphaned(&self) -> bool {
        self.orphaned
    }

    #[inline]
    pub fn is_root(&self) -> bool {
        self.terminal.is_none()
    }

    /// Terminal term, if the terminal is a term.
    #[inline]
    pub fn terminal_term(&self) -> Option<Term> {
        self.terminal.and_then(|s| s.as_term())
    }

    #[inline]
    pub fn is_list(&self) -> bool {
        self.terminal.is_some_and(|s| s.is_list())
    }
}

/// Owns every phrase of a program and the forwarding table.
#[derive(Debug, Default)]
pub struct PhraseTable {
    phrases: Vec<PhraseData>,
    forwards: FxHashMap<(PhraseId, Subject), PhraseId>,
    children: FxHashMap<PhraseId, SmallVec<[PhraseId; 4]>>,
}

impl PhraseTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Allocate the root phrase of a document.
    pub fn new_root(&mut self, document: DocumentId) -> PhraseId {
        let id = PhraseId(self.phrases.len() as u32);
        self.phrases.push(PhraseData {
            parent: id,
            terminal: None,
            document,
            length: 0,
            declaration: None,
            hypothetical: false,
            orphaned: false,
        });
        id
    }

    /// Return the unique child of `parent` for `subject`, creating it on
    /// first request. New phrases start out hypothetical.
    pub fn forward(&mut self, parent: PhraseId, subject: Subject) -> PhraseId {
        if let Some(&existing) = self.forwards.get(&(parent, subject)) {
            return existing;
        }
        let (document, length) = {
            let data = &self.phrases[parent.0 as usize];
            debug_assert!(!data.orphaned, "forwarding from an orphaned phrase");
            (data.document, data.length + 1)
        };
        let id = PhraseId(self.phrases.len() as u32);
        self.phrases.push(PhraseData {
            parent,
            terminal: Some(subject),
            document,
            length,
            declaration: None,
            hypothetical: true,
            orphaned: false,
        });
        self.forwards.insert((parent, subject), id);
        self.children.entry(parent).or_default().push(id);
        id
    }

    /// Look up a child without creating it.
    #[inline]
    pub fn peek(&self, parent: PhraseId, subject: Subject) -> Option<PhraseId> {
        self.forwards.get(&(parent, subject)).copied()
    }

    #[inline]
    pub fn get(&self, id: PhraseId) -> Option<&PhraseData> {
        self.phrases.get(id.0 as usize)
    }

    #[inline]
    pub fn contains(&self, id: PhraseId) -> bool {
        (id.0 as usize) < self.phrases.len()
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.phrases.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.phrases.is_empty()
    }

    /// Live children of a phrase, in creation order.
    pub fn children(&self, id: PhraseId) -> impl Iterator<Item = PhraseId> + '_ {
        self.children
            .get(&id)
            .into_iter()
            .flatten()
            .copied()
            .filter(|&child| !self.phrases[child.0 as usize].orphaned)
    }

    /// Mark `id` and all of its non-root ancestors as concrete. The span is
    /// recorded on `id` only.
    pub fn declare(&mut self, id: PhraseId, span: Span) {
        if let Some(data) = self.phrases.get_mut(id.0 as usize) {
            data.declaration.get_or_insert(span);
        }
        let mut current = id;
        loop {
            let data = &mut self.phrases[current.0 as usize];
            if data.terminal.is_none() {
                break;
            }
            data.hypothetical = false;
            current = data.parent;
        }
    }

    /// The non-root prefixes of `id`, outermost first, ending with `id`.
    pub fn ancestry(&self, id: PhraseId) -> Vec<PhraseId> {
        let mut chain = Vec::new();
        let mut current = id;
        while let Some(data) = self.get(current) {
            if data.terminal.is_none() {
                break;
            }
            chain.push(current);
            current = data.parent;
        }
        chain.reverse();
        chain
    }

    /// The subjects of `id`, outermost first.
    pub fn subjects(&self, id: PhraseId) -> Vec<Subject> {
        self.ancestry(id)
            .into_iter()
            .filter_map(|p| self.phrases[p.0 as usize].terminal)
            .collect()
    }

    /// The list/non-list twin of a term phrase under the same parent.
    pub fn list_bridge(&self, id: PhraseId) -> Option<PhraseId> {
        let data = self.get(id)?;
        let term = data.terminal_term()?;
        self.peek(data.parent, Subject::Term(term.twin()))
    }

    /// Orphan every phrase of `document` and drop them from forwarding, so
    /// the next generation interns fresh phrases.
    pub fn orphan_document(&mut self, document: DocumentId) {
        for data in self.phrases.iter_mut() {
            if data.document == document {
                data.orphaned = true;
            }
        }
        let phrases = &self.phrases;
        self.forwards
            .retain(|_, child| !phrases[child.0 as usize].orphaned);
        self.children
            .retain(|parent, _| !phrases[parent.0 as usize].orphaned);
    }

    /// Live, non-root phrases sorted by (length, id): the order in which
    /// containers always precede their contents.
    pub fn construction_order(&self) -> Vec<PhraseId> {
        let mut order: Vec<PhraseId> = self
            .phrases
            .iter()
            .enumerate()
            .filter(|(_, data)| !data.orphaned && data.terminal.is_some())
            .map(|(i, _)| PhraseId(i as u32))
            .collect();
        order.sort_by_key(|id| (self.phrases[id.0 as usize].length, *id));
        order
    }
}

#[cfg(test)]
#[path = "tests/phrase_tests.rs"]
mod tests;
