//! The result of one resolution pass, and the queries downstream layers run
//! against it.
//!
//! A `Resolution` owns the node arena, the contracts and the cruft of one
//! generation. Queries take phrases and answer in phrases; the arena ids
//! stay an implementation detail. Queries that need names, spans or phrase
//! shape take the [`Program`] the pass ran over.

use crate::cache::ParallelCache;
use crate::contract::ContractTable;
use crate::cruft::{CruftCache, CruftSource, Fault, FaultKind};
use crate::fork::ForkId;
use crate::options::ResolveOptions;
use crate::parallel::{Parallel, ParallelFlags, ParallelId};
use crate::phrase::{DocumentId, PhraseId};
use crate::program::Program;
use serde::Serialize;
use strata_common::{Diagnostic, Span, diagnostic_messages};

#[derive(Debug, Clone)]
pub struct Resolution {
    generation: u64,
    options: ResolveOptions,
    cache: ParallelCache,
    contracts: ContractTable,
    cruft: CruftCache,
}

impl Resolution {
    pub(crate) fn new(
        generation: u64,
        options: ResolveOptions,
        cache: ParallelCache,
        contracts: ContractTable,
        cruft: CruftCache,
    ) -> Self {
        Self {
            generation,
            options,
            cache,
            contracts,
            cruft,
        }
    }

    #[inline]
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Whether `program` is still at the generation this pass resolved.
    #[inline]
    pub fn is_current(&self, program: &Program) -> bool {
        program.generation() == self.generation
    }

    #[inline]
    pub fn cache(&self) -> &ParallelCache {
        &self.cache
    }

    #[inline]
    pub fn parallel_of(&self, phrase: PhraseId) -> Option<&Parallel> {
        self.cache.get(phrase).map(|id| self.cache.node(id))
    }

    pub fn is_explicit(&self, phrase: PhraseId) -> bool {
        self.parallel_of(phrase).is_some_and(Parallel::is_explicit)
    }

    /// Applied bases with the forks that introduced them, in order.
    pub fn bases(&self, phrase: PhraseId) -> Vec<(PhraseId, ForkId)> {
        self.parallel_of(phrase)
            .map(|node| {
                node.bases()
                    .map(|(base, fork)| (self.cache.phrase_of(base), fork))
                    .collect()
            })
            .unwrap_or_default()
    }

    /// `phrase` followed by every transitive base.
    pub fn base_closure(&self, phrase: PhraseId) -> Vec<PhraseId> {
        self.cache
            .get(phrase)
            .map(|id| self.phrases_of(self.cache.base_closure(id)))
            .unwrap_or_default()
    }

    /// Whether `base` is a strict transitive base of `derived`.
    pub fn is_derived_from(&self, derived: PhraseId, base: PhraseId) -> bool {
        match (self.cache.get(derived), self.cache.get(base)) {
            (Some(d), Some(b)) if d != b => self.cache.base_closure(d).contains(&b),
            _ => false,
        }
    }

    pub fn flags(&self, program: &Program, phrase: PhraseId) -> ParallelFlags {
        self.parallel_of(phrase)
            .map(|node| node.flags(program.phrases(), program.forks(), &self.cruft))
            .unwrap_or_else(ParallelFlags::empty)
    }

    pub fn contributors(&self, phrase: PhraseId) -> Vec<PhraseId> {
        self.parallel_of(phrase)
            .map(|node| self.phrases_of(node.contributors().iter().copied()))
            .unwrap_or_default()
    }

    /// Conditions the node's contract still requires. Empty for implicit
    /// nodes and nodes without a contract.
    pub fn unsatisfied_conditions(&self, phrase: PhraseId) -> Vec<PhraseId> {
        self.cache
            .get(phrase)
            .and_then(|id| self.contracts.get(id))
            .map(|contract| self.phrases_of(contract.unsatisfied()))
            .unwrap_or_default()
    }

    #[inline]
    pub fn cruft(&self) -> &CruftCache {
        &self.cruft
    }

    #[inline]
    pub fn faults(&self) -> &[Fault] {
        self.cruft.faults()
    }

    /// Pattern-declared explicit children of `container`, or of any of its
    /// bases, whose pattern accepts `value`.
    pub fn matching_patterns(&self, program: &Program, container: PhraseId, value: &str) -> Vec<PhraseId> {
        let phrases = program.phrases();
        let subjects = program.subjects();
        let mut matches = Vec::new();
        for scope in self.base_closure(container) {
            for child in phrases.children(scope) {
                let Some(subject) = phrases.get(child).and_then(|d| d.terminal) else {
                    continue;
                };
                if subject.is_pattern()
                    && self.is_explicit(child)
                    && subjects.test(subject, value)
                    && !matches.contains(&child)
                {
                    matches.push(child);
                }
            }
        }
        matches
    }

    fn phrases_of(&self, ids: impl IntoIterator<Item = ParallelId>) -> Vec<PhraseId> {
        ids.into_iter().map(|id| self.cache.phrase_of(id)).collect()
    }

    // -----------------------------------------------------------------------
    // Diagnostics
    // -----------------------------------------------------------------------

    /// Every fault as a positioned diagnostic, in detection order, followed
    /// by unsatisfied-contract warnings when enabled.
    pub fn diagnostics(&self, program: &Program) -> Vec<Diagnostic> {
        let mut out: Vec<Diagnostic> = self
            .cruft
            .faults()
            .iter()
            .map(|fault| self.fault_diagnostic(program, fault))
            .collect();

        if self.options.report_unsatisfied_contracts {
            for (id, contract) in self.contracts.iter() {
                let phrase = self.cache.phrase_of(id);
                let (document, span) = phrase_location(program, phrase);
                let path = program.phrase_path(phrase);
                for condition in contract.unsatisfied() {
                    let condition_path = program.phrase_path(self.cache.phrase_of(condition));
                    out.push(Diagnostic::from_message(
                        &diagnostic_messages::UNSATISFIED_CONTRACT,
                        program.document_uri(document),
                        span.start,
                        span.len(),
                        &[&path, &condition_path],
                    ));
                }
            }
        }
        out
    }

    fn fault_diagnostic(&self, program: &Program, fault: &Fault) -> Diagnostic {
        let target = program.phrase_path(fault.target);
        let base = fault.base.map(|b| program.phrase_path(b)).unwrap_or_default();

        let args: Vec<String> = match fault.kind {
            FaultKind::ListAnnotationConflict => {
                let term = fault
                    .sources
                    .iter()
                    .find_map(|&s| match s {
                        CruftSource::Span(span) => program.forks().span(span),
                        _ => None,
                    })
                    .map(|a| program.subjects().name(a.term).to_string())
                    .unwrap_or_default();
                vec![target, term]
            }
            FaultKind::CircularFactReference => vec![target, base],
            FaultKind::ListDimensionalDiscrepancy => {
                let phrases = program.phrases();
                let dim = |p: PhraseId| {
                    self.cache
                        .get(p)
                        .map_or(0, |id| self.cache.dimensionality(id, phrases))
                };
                let list_annotated = u32::from(phrases.get(fault.target).is_some_and(|d| d.is_list()));
                let target_dim = dim(fault.target);
                let required = fault.base.map(dim).unwrap_or(0) + list_annotated;
                vec![target, target_dim.to_string(), base, required.to_string()]
            }
            FaultKind::PatternNonCovariant => vec![target, base],
            FaultKind::ResolutionLimitExceeded => vec![target],
        };
        let args: Vec<&str> = args.iter().map(String::as_str).collect();

        let (document, span) = fault
            .sources
            .first()
            .map(|&s| source_location(program, s))
            .unwrap_or_else(|| phrase_location(program, fault.target));
        let mut diagnostic = Diagnostic::from_message(
            fault.kind.message(),
            program.document_uri(document),
            span.start,
            span.len(),
            &args,
        );

        for &source in fault.sources.iter().skip(1) {
            let (document, span) = source_location(program, source);
            diagnostic = diagnostic.with_related(
                program.document_uri(document),
                span.start,
                span.len(),
                related_message(program, source),
            );
        }
        diagnostic
    }

    // -----------------------------------------------------------------------
    // Snapshot
    // -----------------------------------------------------------------------

    /// A name-based, comparable view of the whole pass.
    pub fn snapshot(&self, program: &Program) -> Snapshot {
        let name = |id: ParallelId| program.phrase_path(self.cache.phrase_of(id));

        let nodes = self
            .cache
            .iter()
            .filter(|(_, node)| node.container.is_some())
            .map(|(id, node)| {
                let phrase = node.phrase;
                let document = program
                    .phrases()
                    .get(phrase)
                    .map(|d| program.document_uri(d.document).to_string())
                    .unwrap_or_default();
                NodeSnapshot {
                    phrase: program.phrase_path(phrase),
                    document,
                    explicit: node.is_explicit(),
                    bases: node
                        .bases()
                        .map(|(base, fork)| BaseSnapshot {
                            phrase: name(base),
                            fork: fork.0,
                        })
                        .collect(),
                    contributors: node.contributors().iter().map(|&c| name(c)).collect(),
                    unsatisfied: self
                        .contracts
                        .get(id)
                        .map(|c| c.unsatisfied().map(name).collect())
                        .unwrap_or_default(),
                    flags: node
                        .flags(program.phrases(), program.forks(), &self.cruft)
                        .names(),
                }
            })
            .collect();

        let faults = self
            .cruft
            .faults()
            .iter()
            .map(|fault| FaultSnapshot {
                kind: fault.kind,
                code: fault.kind.code(),
                target: program.phrase_path(fault.target),
                base: fault.base.map(|b| program.phrase_path(b)),
                sources: fault.sources.to_vec(),
            })
            .collect();

        Snapshot {
            generation: self.generation,
            nodes,
            faults,
        }
    }
}

fn phrase_location(program: &Program, phrase: PhraseId) -> (DocumentId, Span) {
    program
        .phrases()
        .get(phrase)
        .map(|d| (d.document, d.declaration.unwrap_or_default()))
        .unwrap_or((DocumentId(0), Span::dummy()))
}

fn source_location(program: &Program, source: CruftSource) -> (DocumentId, Span) {
    let forks = program.forks();
    match source {
        CruftSource::Fork(fork) => forks
            .get(fork)
            .and_then(|f| f.annotations.first())
            .and_then(|&span| forks.span(span))
            .map(|a| (a.document, a.span))
            .unwrap_or_else(|| {
                let owner = forks.get(fork).map(|f| f.predecessor).unwrap_or(PhraseId(0));
                phrase_location(program, owner)
            }),
        CruftSource::Span(span) => forks
            .span(span)
            .map(|a| (a.document, a.span))
            .unwrap_or((DocumentId(0), Span::dummy())),
        CruftSource::Phrase(phrase) => phrase_location(program, phrase),
    }
}

fn related_message(program: &Program, source: CruftSource) -> String {
    match source {
        CruftSource::Fork(fork) => {
            let owner = program
                .forks()
                .get(fork)
                .map(|f| program.phrase_path(f.predecessor))
                .unwrap_or_default();
            format!("'{owner}' inherits here.")
        }
        CruftSource::Span(_) => "Conflicting annotation.".to_string(),
        CruftSource::Phrase(phrase) => format!("'{}' is declared here.", program.phrase_path(phrase)),
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Snapshot {
    pub generation: u64,
    pub nodes: Vec<NodeSnapshot>,
    pub faults: Vec<FaultSnapshot>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NodeSnapshot {
    pub phrase: String,
    pub document: String,
    pub explicit: bool,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub bases: Vec<BaseSnapshot>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub contributors: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub unsatisfied: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub flags: Vec<&'static str>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BaseSnapshot {
    pub phrase: String,
    pub fork: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FaultSnapshot {
    pub kind: FaultKind,
    pub code: u32,
    pub target: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub base: Option<String>,
    pub sources: Vec<CruftSource>,
}
