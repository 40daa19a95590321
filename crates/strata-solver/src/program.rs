//! The input surface: documents, declarations, and annotation statements.
//!
//! A `Program` is what an upstream parser hands the resolver. It owns the
//! phrase graph, the subject caches, and every fork. Resolution reads it and
//! never mutates it; edits go through [`Program::invalidate_document`], which
//! retires a document's phrases and forks wholesale and bumps the
//! generation.

use crate::error::ResolveError;
use crate::fork::{AnnotationSpan, ForkId, ForkTable};
use crate::phrase::{DocumentId, PhraseData, PhraseId, PhraseTable};
use crate::subject::{PatternId, PatternMatcher, Subject, SubjectTable, Term, UriId};
use std::sync::Arc;
use strata_common::Span;
use tracing::debug;

#[derive(Clone, Debug)]
struct Document {
    uri: Arc<str>,
    root: PhraseId,
}

#[derive(Debug)]
pub struct Program {
    documents: Vec<Document>,
    phrases: PhraseTable,
    subjects: SubjectTable,
    forks: ForkTable,
    generation: u64,
}

impl Default for Program {
    fn default() -> Self {
        Self::new()
    }
}

impl Program {
    pub fn new() -> Self {
        Self {
            documents: Vec::new(),
            phrases: PhraseTable::new(),
            subjects: SubjectTable::new(),
            forks: ForkTable::new(),
            generation: 0,
        }
    }

    pub fn add_document(&mut self, uri: &str) -> DocumentId {
        let id = DocumentId(self.documents.len() as u32);
        let root = self.phrases.new_root(id);
        self.documents.push(Document {
            uri: Arc::from(uri),
            root,
        });
        id
    }

    pub fn root(&self, document: DocumentId) -> Result<PhraseId, ResolveError> {
        self.documents
            .get(document.0 as usize)
            .map(|d| d.root)
            .ok_or(ResolveError::UnknownDocument(document))
    }

    pub fn document_uri(&self, document: DocumentId) -> &str {
        self.documents
            .get(document.0 as usize)
            .map(|d| d.uri.as_ref())
            .unwrap_or("")
    }

    pub fn document_by_uri(&self, uri: &str) -> Option<DocumentId> {
        self.documents
            .iter()
            .position(|d| d.uri.as_ref() == uri)
            .map(|i| DocumentId(i as u32))
    }

    /// Current root of every document.
    pub fn roots(&self) -> impl Iterator<Item = (DocumentId, PhraseId)> + '_ {
        self.documents
            .iter()
            .enumerate()
            .map(|(i, d)| (DocumentId(i as u32), d.root))
    }

    // -----------------------------------------------------------------------
    // Subjects
    // -----------------------------------------------------------------------

    pub fn term(&mut self, name: &str) -> Term {
        self.subjects.term(name, false)
    }

    pub fn list_term(&mut self, name: &str) -> Term {
        self.subjects.term(name, true)
    }

    /// `Name` or `Name...`.
    pub fn parse_term(&mut self, text: &str) -> Term {
        self.subjects.parse_term(text)
    }

    pub fn pattern(&mut self, matcher: Arc<dyn PatternMatcher>) -> PatternId {
        self.subjects.pattern(matcher)
    }

    pub fn uri(&mut self, text: &str) -> UriId {
        self.subjects.uri(text)
    }

    // -----------------------------------------------------------------------
    // Phrases
    // -----------------------------------------------------------------------

    /// Declare the phrase at `path` under the document root, marking every
    /// prefix concrete. Declaring a list term also declares its non-list
    /// twin, the element position of the list.
    pub fn declare(
        &mut self,
        document: DocumentId,
        path: &[Subject],
        span: Span,
    ) -> Result<PhraseId, ResolveError> {
        let phrase = self.hypothesize(document, path)?;
        self.phrases.declare(phrase, span);

        let list = self.phrases.get(phrase).and_then(|data| {
            data.terminal_term()
                .filter(|t| t.is_list)
                .map(|t| (data.parent, t))
        });
        if let Some((parent, term)) = list {
            let twin = self.phrases.forward(parent, Subject::Term(term.as_item()));
            self.phrases.declare(twin, span);
        }
        Ok(phrase)
    }

    /// Intern the phrase at `path` without declaring it.
    pub fn hypothesize(
        &mut self,
        document: DocumentId,
        path: &[Subject],
    ) -> Result<PhraseId, ResolveError> {
        let mut current = self.root(document)?;
        for &subject in path {
            current = self.phrases.forward(current, subject);
        }
        Ok(current)
    }

    /// Find the phrase at `path` without creating anything.
    pub fn lookup(&self, document: DocumentId, path: &[Subject]) -> Option<PhraseId> {
        let mut current = self.root(document).ok()?;
        for &subject in path {
            current = self.phrases.peek(current, subject)?;
        }
        Some(current)
    }

    /// `forward` for callers that already hold a phrase.
    pub fn child(&mut self, parent: PhraseId, subject: Subject) -> Result<PhraseId, ResolveError> {
        let data = self.phrase(parent)?;
        if data.is_orphaned() {
            return Err(ResolveError::Orphaned(parent));
        }
        Ok(self.phrases.forward(parent, subject))
    }

    pub fn phrase(&self, id: PhraseId) -> Result<&PhraseData, ResolveError> {
        self.phrases.get(id).ok_or(ResolveError::UnknownPhrase(id))
    }

    /// Render a phrase as `Outer/Inner/Leaf...`.
    pub fn phrase_path(&self, id: PhraseId) -> String {
        self.phrases
            .subjects(id)
            .into_iter()
            .map(|s| self.subjects.display(s))
            .collect::<Vec<_>>()
            .join("/")
    }

    // -----------------------------------------------------------------------
    // Annotations
    // -----------------------------------------------------------------------

    /// Record one annotation statement on `predecessor`. `successors` are
    /// the phrases the statement's terms resolved to; empty makes the
    /// statement an alias.
    pub fn annotate(
        &mut self,
        predecessor: PhraseId,
        successors: &[PhraseId],
        annotations: &[(Term, Span)],
    ) -> Result<ForkId, ResolveError> {
        let data = self.phrase(predecessor)?;
        if data.is_orphaned() {
            return Err(ResolveError::Orphaned(predecessor));
        }
        if data.is_hypothetical() {
            return Err(ResolveError::HypotheticalPredecessor(predecessor));
        }
        if annotations.is_empty() {
            return Err(ResolveError::EmptyAnnotation(predecessor));
        }
        let document = data.document;
        for &successor in successors {
            self.phrase(successor)?;
        }

        let spans: Vec<AnnotationSpan> = annotations
            .iter()
            .map(|&(term, span)| AnnotationSpan {
                document,
                span,
                term,
            })
            .collect();
        Ok(self.forks.add(predecessor, successors, &spans))
    }

    /// Drop everything `document` contributed. The document gets a fresh
    /// root; phrases and forks from the old generation stay addressable but
    /// orphaned.
    pub fn invalidate_document(&mut self, document: DocumentId) -> Result<(), ResolveError> {
        let index = document.0 as usize;
        if index >= self.documents.len() {
            return Err(ResolveError::UnknownDocument(document));
        }
        self.phrases.orphan_document(document);
        let phrases = &self.phrases;
        self.forks.retire_where(|predecessor| {
            phrases
                .get(predecessor)
                .is_some_and(|d| d.document == document)
        });
        let root = self.phrases.new_root(document);
        self.documents[index].root = root;
        self.generation += 1;
        debug!(document = ?document, generation = self.generation, "document invalidated");
        Ok(())
    }

    #[inline]
    pub fn generation(&self) -> u64 {
        self.generation
    }

    #[inline]
    pub fn phrases(&self) -> &PhraseTable {
        &self.phrases
    }

    #[inline]
    pub fn subjects(&self) -> &SubjectTable {
        &self.subjects
    }

    #[inline]
    pub fn forks(&self) -> &ForkTable {
        &self.forks
    }
}

#[cfg(test)]
#[path = "tests/program_tests.rs"]
mod tests;
