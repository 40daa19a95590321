//! Subjects: the terminal element of a phrase.
//!
//! A subject is one of:
//! - a **Term**: an identifier, optionally list-suffixed (`Item...`)
//! - a **Pattern**: a compiled literal matcher declaring an anonymous type
//! - a **KnownUri**: a reference to another document
//!
//! Terms compare structurally. Patterns and URIs are reference-cached: the
//! [`SubjectTable`] hands out one id per distinct source text, so comparing
//! two pattern subjects is an integer comparison.

use rustc_hash::FxHashMap;
use serde::Serialize;
use std::fmt;
use std::sync::Arc;
use strata_common::{Atom, Interner};

/// Suffix marking a list term in source text.
pub const LIST_SUFFIX: &str = "...";

/// An identifier subject, optionally list-suffixed.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct Term {
    pub name: Atom,
    pub is_list: bool,
}

impl Term {
    pub const fn new(name: Atom, is_list: bool) -> Self {
        Self { name, is_list }
    }

    /// The same name with the list suffix.
    pub const fn as_list(self) -> Self {
        Self {
            name: self.name,
            is_list: true,
        }
    }

    /// The same name without the list suffix.
    pub const fn as_item(self) -> Self {
        Self {
            name: self.name,
            is_list: false,
        }
    }

    /// The list/non-list partner of this term.
    pub const fn twin(self) -> Self {
        Self {
            name: self.name,
            is_list: !self.is_list,
        }
    }
}

/// Reference-cached pattern literal.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct PatternId(pub u32);

/// Reference-cached external document reference.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct UriId(pub u32);

/// The terminal element of a phrase.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub enum Subject {
    Term(Term),
    Pattern(PatternId),
    Uri(UriId),
}

impl Subject {
    #[inline]
    pub fn is_list(&self) -> bool {
        matches!(self, Subject::Term(term) if term.is_list)
    }

    #[inline]
    pub fn is_pattern(&self) -> bool {
        matches!(self, Subject::Pattern(_))
    }

    #[inline]
    pub fn as_term(&self) -> Option<Term> {
        match self {
            Subject::Term(term) => Some(*term),
            _ => None,
        }
    }

    #[inline]
    pub fn as_pattern(&self) -> Option<PatternId> {
        match self {
            Subject::Pattern(id) => Some(*id),
            _ => None,
        }
    }
}

impl From<Term> for Subject {
    fn from(term: Term) -> Self {
        Subject::Term(term)
    }
}

// =============================================================================
// Pattern capability
// =============================================================================

/// How the languages accepted by two patterns relate.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize)]
pub enum PatternComparison {
    /// Every value the left pattern accepts, the right accepts too.
    Subset,
    /// Every value the right pattern accepts, the left accepts too.
    Superset,
    Equal,
    Unequal,
}

impl PatternComparison {
    /// True when the left pattern's values are all accepted by the right.
    #[inline]
    pub fn is_covariant(self) -> bool {
        matches!(self, Self::Subset | Self::Equal)
    }
}

/// A compiled pattern literal.
///
/// Compiling pattern source into a matcher happens outside the resolver;
/// this is the capability the resolver consumes.
pub trait PatternMatcher: fmt::Debug {
    /// The pattern's source text, used as its cache key.
    fn source(&self) -> &str;

    /// Whether the pattern accepts `value`.
    fn test(&self, value: &str) -> bool;

    /// The finite set of values this pattern accepts, if it is finite.
    fn finite_language(&self) -> Option<Vec<&str>> {
        None
    }

    /// Compare this pattern's language with `other`'s.
    fn compare(&self, other: &dyn PatternMatcher) -> PatternComparison;
}

/// A pattern accepting exactly a fixed set of literal alternatives,
/// written `a|b|c`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AlternationPattern {
    source: String,
    alternatives: Vec<String>,
}

impl AlternationPattern {
    pub fn parse(source: &str) -> Self {
        let mut alternatives: Vec<String> = source.split('|').map(str::to_string).collect();
        alternatives.sort();
        alternatives.dedup();
        Self {
            source: source.to_string(),
            alternatives,
        }
    }

    pub fn alternatives(&self) -> &[String] {
        &self.alternatives
    }
}

impl PatternMatcher for AlternationPattern {
    fn source(&self) -> &str {
        &self.source
    }

    fn test(&self, value: &str) -> bool {
        self.alternatives
            .binary_search_by(|alt| alt.as_str().cmp(value))
            .is_ok()
    }

    fn finite_language(&self) -> Option<Vec<&str>> {
        Some(self.alternatives.iter().map(String::as_str).collect())
    }

    fn compare(&self, other: &dyn PatternMatcher) -> PatternComparison {
        let mine_in_other = self.alternatives.iter().all(|alt| other.test(alt));
        let theirs_in_mine = other
            .finite_language()
            .map(|values| values.iter().all(|value| self.test(value)));

        match (mine_in_other, theirs_in_mine) {
            (true, Some(true)) => PatternComparison::Equal,
            (true, _) => PatternComparison::Subset,
            (false, Some(true)) => PatternComparison::Superset,
            (false, _) => PatternComparison::Unequal,
        }
    }
}

// =============================================================================
// SubjectTable
// =============================================================================

/// Owns term names, the pattern cache, and the URI cache for one program.
#[derive(Debug, Default)]
pub struct SubjectTable {
    names: Interner,
    patterns: Vec<Arc<dyn PatternMatcher>>,
    pattern_index: FxHashMap<Arc<str>, PatternId>,
    uris: Vec<Arc<str>>,
    uri_index: FxHashMap<Arc<str>, UriId>,
}

impl SubjectTable {
    pub fn new() -> Self {
        let mut names = Interner::new();
        names.intern_common();
        Self {
            names,
            ..Self::default()
        }
    }

    pub fn term(&mut self, name: &str, is_list: bool) -> Term {
        Term::new(self.names.intern(name), is_list)
    }

    /// Parse `Name` or `Name...` into a term.
    pub fn parse_term(&mut self, text: &str) -> Term {
        let text = text.trim();
        match text.strip_suffix(LIST_SUFFIX) {
            Some(name) => self.term(name.trim_end(), true),
            None => self.term(text, false),
        }
    }

    /// Cache a pattern matcher, returning the existing id when a pattern
    /// with the same source is already cached.
    pub fn pattern(&mut self, matcher: Arc<dyn PatternMatcher>) -> PatternId {
        if let Some(&id) = self.pattern_index.get(matcher.source()) {
            return id;
        }
        let id = PatternId(self.patterns.len() as u32);
        self.pattern_index.insert(Arc::from(matcher.source()), id);
        self.patterns.push(matcher);
        id
    }

    pub fn uri(&mut self, text: &str) -> UriId {
        if let Some(&id) = self.uri_index.get(text) {
            return id;
        }
        let id = UriId(self.uris.len() as u32);
        let owned: Arc<str> = Arc::from(text);
        self.uris.push(owned.clone());
        self.uri_index.insert(owned, id);
        id
    }

    #[inline]
    pub fn name(&self, term: Term) -> &str {
        self.names.resolve(term.name)
    }

    pub fn matcher(&self, id: PatternId) -> Option<&dyn PatternMatcher> {
        self.patterns.get(id.0 as usize).map(|m| m.as_ref())
    }

    pub fn uri_text(&self, id: UriId) -> &str {
        self.uris.get(id.0 as usize).map(|u| u.as_ref()).unwrap_or("")
    }

    /// Whether `subject` accepts `value`: patterns test it, terms and URIs
    /// accept only their own text.
    pub fn test(&self, subject: Subject, value: &str) -> bool {
        match subject {
            Subject::Term(term) => !term.is_list && self.name(term) == value,
            Subject::Pattern(id) => self.matcher(id).is_some_and(|m| m.test(value)),
            Subject::Uri(id) => self.uri_text(id) == value,
        }
    }

    /// Compare two cached patterns. Unknown ids compare unequal.
    pub fn compare(&self, left: PatternId, right: PatternId) -> PatternComparison {
        if left == right {
            return PatternComparison::Equal;
        }
        match (self.matcher(left), self.matcher(right)) {
            (Some(l), Some(r)) => l.compare(r),
            _ => PatternComparison::Unequal,
        }
    }

    /// Source-like rendering of a subject (`Item...`, `/a|b/`, a URI).
    pub fn display(&self, subject: Subject) -> String {
        match subject {
            Subject::Term(term) if term.is_list => format!("{}{LIST_SUFFIX}", self.name(term)),
            Subject::Term(term) => self.name(term).to_string(),
            Subject::Pattern(id) => match self.matcher(id) {
                Some(m) => format!("/{}/", m.source()),
                None => "/?/".to_string(),
            },
            Subject::Uri(id) => self.uri_text(id).to_string(),
        }
    }
}

#[cfg(test)]
#[path = "tests/subject_tests.rs"]
mod tests;
