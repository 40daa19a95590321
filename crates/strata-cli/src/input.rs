//! JSON graph descriptions.
//!
//! ```json
//! {
//!   "documents": [{
//!     "uri": "file:///shapes.strata",
//!     "declarations": [
//!       { "path": ["Shape"] },
//!       { "path": ["Square"], "span": { "start": 10, "end": 16 },
//!         "annotations": [{ "term": "Shape", "span": { "start": 19, "end": 24 } }] }
//!     ],
//!     "hypothetical": [["Square", "Corner"]]
//!   }]
//! }
//! ```
//!
//! Path elements are terms (`Name`, `Name...`), patterns (`/a|b/`) or
//! document references (`<file:///other.strata>`). The annotations of one
//! declaration form a single annotation statement.

use anyhow::{Context, Result, bail};
use serde::Deserialize;
use std::path::Path;
use std::sync::Arc;
use strata_common::Span;
use strata_solver::{AlternationPattern, DocumentId, PhraseId, Program, Subject};
use tracing::debug;

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct GraphInput {
    #[serde(default)]
    pub documents: Vec<DocumentInput>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DocumentInput {
    pub uri: String,
    #[serde(default)]
    pub declarations: Vec<DeclarationInput>,
    /// Phrases mentioned but never declared, such as annotation targets
    /// that only exist through inheritance.
    #[serde(default)]
    pub hypothetical: Vec<Vec<String>>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DeclarationInput {
    pub path: Vec<String>,
    #[serde(default)]
    pub span: Option<Span>,
    #[serde(default)]
    pub annotations: Vec<AnnotationInput>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AnnotationInput {
    pub term: String,
    #[serde(default)]
    pub span: Option<Span>,
    /// Explicit successor path. Without it the term is looked up lexically.
    #[serde(default)]
    pub target: Option<Vec<String>>,
    /// Document of `target`; defaults to the declaring document.
    #[serde(default)]
    pub document: Option<String>,
}

/// Read and build the program described by the file at `path`.
pub fn load_program(path: &Path) -> Result<Program> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    let input = parse_input(&text).with_context(|| format!("invalid graph in {}", path.display()))?;
    build_program(&input)
}

pub fn parse_input(text: &str) -> Result<GraphInput> {
    Ok(serde_json::from_str(text)?)
}

/// Declarations first, so that annotation lookups see every document.
pub fn build_program(input: &GraphInput) -> Result<Program> {
    let mut program = Program::new();
    let mut declared: Vec<(DocumentId, Vec<PhraseId>)> = Vec::with_capacity(input.documents.len());

    for document in &input.documents {
        if program.document_by_uri(&document.uri).is_some() {
            bail!("duplicate document '{}'", document.uri);
        }
        let doc = program.add_document(&document.uri);
        let mut phrases = Vec::with_capacity(document.declarations.len());
        for declaration in &document.declarations {
            if declaration.path.is_empty() {
                bail!("empty declaration path in '{}'", document.uri);
            }
            let path = parse_path(&mut program, &declaration.path)?;
            let span = declaration.span.unwrap_or_else(Span::dummy);
            let phrase = program
                .declare(doc, &path, span)
                .with_context(|| format!("cannot declare '{}'", declaration.path.join("/")))?;
            phrases.push(phrase);
        }
        for hypothetical in &document.hypothetical {
            let path = parse_path(&mut program, hypothetical)?;
            program.hypothesize(doc, &path)?;
        }
        declared.push((doc, phrases));
    }

    for (document, (doc, phrases)) in input.documents.iter().zip(declared) {
        for (declaration, &phrase) in document.declarations.iter().zip(&phrases) {
            if declaration.annotations.is_empty() {
                continue;
            }
            annotate(&mut program, doc, phrase, declaration)
                .with_context(|| format!("in annotations of '{}'", declaration.path.join("/")))?;
        }
    }

    debug!(
        documents = input.documents.len(),
        phrases = program.phrases().len(),
        "program loaded"
    );
    Ok(program)
}

fn annotate(
    program: &mut Program,
    doc: DocumentId,
    phrase: PhraseId,
    declaration: &DeclarationInput,
) -> Result<()> {
    let mut successors = Vec::with_capacity(declaration.annotations.len());
    let mut annotations = Vec::with_capacity(declaration.annotations.len());

    for annotation in &declaration.annotations {
        let term = program.parse_term(&annotation.term);
        let span = annotation.span.unwrap_or_else(Span::dummy);
        annotations.push((term, span));

        let successor = match &annotation.target {
            Some(target) => {
                let target_doc = match &annotation.document {
                    Some(uri) => program
                        .document_by_uri(uri)
                        .with_context(|| format!("unknown document '{uri}'"))?,
                    None => doc,
                };
                let path = parse_path(program, target)?;
                Some(program.hypothesize(target_doc, &path)?)
            }
            None => lexical_lookup(program, phrase, Subject::Term(term)),
        };
        if let Some(successor) = successor
            && !successors.contains(&successor)
        {
            successors.push(successor);
        }
    }

    program.annotate(phrase, &successors, &annotations)?;
    Ok(())
}

/// Find the declared phrase `subject` names as seen from `phrase`: the
/// enclosing scopes from innermost outward, then the other document roots.
/// `None` makes the annotation an alias.
pub fn lexical_lookup(program: &Program, phrase: PhraseId, subject: Subject) -> Option<PhraseId> {
    let phrases = program.phrases();
    let declared = |id: &PhraseId| phrases.get(*id).is_some_and(|d| !d.is_hypothetical());

    let data = phrases.get(phrase)?;
    let mut container = data.parent;
    loop {
        if let Some(found) = phrases.peek(container, subject).filter(declared) {
            return Some(found);
        }
        match phrases.get(container) {
            Some(scope) if !scope.is_root() => container = scope.parent,
            _ => break,
        }
    }

    program
        .roots()
        .filter(|&(doc, _)| doc != data.document)
        .find_map(|(_, root)| phrases.peek(root, subject).filter(declared))
}

fn parse_path(program: &mut Program, elements: &[String]) -> Result<Vec<Subject>> {
    elements
        .iter()
        .map(|element| parse_subject(program, element))
        .collect()
}

/// Parse one path element.
pub fn parse_subject(program: &mut Program, element: &str) -> Result<Subject> {
    let element = element.trim();
    if element.is_empty() {
        bail!("empty path element");
    }
    if let Some(source) = element
        .strip_prefix('/')
        .and_then(|rest| rest.strip_suffix('/'))
    {
        if source.is_empty() {
            bail!("empty pattern '{element}'");
        }
        let matcher = Arc::new(AlternationPattern::parse(source));
        return Ok(Subject::Pattern(program.pattern(matcher)));
    }
    if let Some(uri) = element
        .strip_prefix('<')
        .and_then(|rest| rest.strip_suffix('>'))
    {
        return Ok(Subject::Uri(program.uri(uri)));
    }
    Ok(Subject::Term(program.parse_term(element)))
}

#[cfg(test)]
#[path = "tests/input_tests.rs"]
mod tests;
