use super::*;
use crate::fork::AnnotationSpan;
use crate::phrase::{DocumentId, PhraseId};
use crate::subject::{AlternationPattern, Subject, Term};
use std::sync::Arc;
use strata_common::Span;

struct World {
    phrases: PhraseTable,
    forks: ForkTable,
    subjects: SubjectTable,
    cache: ParallelCache,
    cruft: CruftCache,
    root: PhraseId,
}

impl World {
    fn new() -> Self {
        let mut phrases = PhraseTable::new();
        let root = phrases.new_root(DocumentId(0));
        let mut cache = ParallelCache::new();
        cache.create_root(&phrases, root).expect("root");
        Self {
            phrases,
            forks: ForkTable::new(),
            subjects: SubjectTable::new(),
            cache,
            cruft: CruftCache::new(),
            root,
        }
    }

    fn declare(&mut self, subject: Subject) -> (PhraseId, ParallelId) {
        let phrase = self.phrases.forward(self.root, subject);
        self.phrases.declare(phrase, Span::dummy());
        let node = match self.cache.get(phrase) {
            Some(node) => node,
            None => self.cache.create_explicit(&self.phrases, phrase).expect("explicit"),
        };
        (phrase, node)
    }

    fn term(&mut self, text: &str) -> Term {
        self.subjects.parse_term(text)
    }

    fn named(&mut self, text: &str) -> (PhraseId, ParallelId) {
        let term = self.term(text);
        self.declare(Subject::Term(term))
    }

    fn pattern(&mut self, source: &str) -> (PhraseId, ParallelId) {
        let id = self.subjects.pattern(Arc::new(AlternationPattern::parse(source)));
        self.declare(Subject::Pattern(id))
    }

    fn fork(&mut self, predecessor: PhraseId, successor: PhraseId, terms: &[&str]) -> ForkId {
        let annotations: Vec<AnnotationSpan> = terms
            .iter()
            .enumerate()
            .map(|(i, text)| AnnotationSpan {
                document: DocumentId(0),
                span: Span::at(i as u32 * 10, 4),
                term: self.subjects.parse_term(text),
            })
            .collect();
        self.forks.add(predecessor, &[successor], &annotations)
    }

    fn screen(&mut self, target: PhraseId, fork: ForkId) -> SanitizeOutcome {
        let sanitizer = Sanitizer::new(
            &self.phrases,
            &self.forks,
            &self.subjects,
            RecursionProfile::BaseWalk,
        );
        sanitizer.check_fork(&mut self.cruft, target, fork)
    }

    fn check(&mut self, target: ParallelId, base: ParallelId, fork: ForkId) -> SanitizeOutcome {
        let sanitizer = Sanitizer::new(
            &self.phrases,
            &self.forks,
            &self.subjects,
            RecursionProfile::BaseWalk,
        );
        sanitizer.check(&mut self.cache, &mut self.cruft, target, base, fork)
    }

    fn dim(&self, node: ParallelId) -> u32 {
        self.cache.dimensionality(node, &self.phrases)
    }
}

#[test]
fn test_clean_edge() {
    let mut w = World::new();
    let (a, na) = w.named("A");
    let (b, nb) = w.named("B");
    let fork = w.fork(a, b, &["B"]);

    assert_eq!(w.check(na, nb, fork), SanitizeOutcome::Clean);
    assert!(w.cruft.is_empty());
}

#[test]
fn test_two_node_cycle_records_one_fault_and_prunes() {
    let mut w = World::new();
    let (a, na) = w.named("A");
    let (b, nb) = w.named("B");
    let fa = w.fork(a, b, &["B"]);
    let fb = w.fork(b, a, &["A"]);

    assert!(w.check(nb, na, fb).is_clean());
    w.cache.add_base(nb, na, fb);

    assert_eq!(w.check(na, nb, fa), SanitizeOutcome::Faulted);
    assert_eq!(w.cruft.count_of(FaultKind::CircularFactReference), 1);
    assert!(w.cruft.has(CruftSource::Fork(fa)));
    assert!(w.cruft.has(CruftSource::Fork(fb)));
    assert!(w.cache.node(nb).bases().next().is_none(), "applied cyclic edge pruned");
}

#[test]
fn test_self_reference_is_circular() {
    let mut w = World::new();
    let (a, na) = w.named("A");
    let fork = w.fork(a, a, &["A"]);

    assert_eq!(w.check(na, na, fork), SanitizeOutcome::Faulted);
    let fault = &w.cruft.faults()[0];
    assert_eq!(fault.kind, FaultKind::CircularFactReference);
    assert_eq!(fault.sources.as_slice(), &[CruftSource::Fork(fork)]);
}

#[test]
fn test_cycle_through_three_forks_names_every_fork() {
    let mut w = World::new();
    let (a, na) = w.named("A");
    let (b, nb) = w.named("B");
    let (c, nc) = w.named("C");
    let fa = w.fork(a, b, &["B"]);
    let fb = w.fork(b, c, &["C"]);
    let fc = w.fork(c, a, &["A"]);
    w.cache.add_base(nb, nc, fb);
    w.cache.add_base(nc, na, fc);

    assert_eq!(w.check(na, nb, fa), SanitizeOutcome::Faulted);
    let fault = &w.cruft.faults()[0];
    assert_eq!(
        fault.sources.as_slice(),
        &[CruftSource::Fork(fa), CruftSource::Fork(fb), CruftSource::Fork(fc)]
    );
}

#[test]
fn test_mixed_list_annotation_faults_each_span() {
    let mut w = World::new();
    let (a, _) = w.named("A");
    let (b, _) = w.named("B");
    let fork = w.fork(a, b, &["B", "B..."]);

    assert_eq!(w.screen(a, fork), SanitizeOutcome::Faulted);
    let spans = w.forks.get(fork).expect("fork").annotations.clone();
    for span in spans {
        assert!(w.cruft.has_kind(FaultKind::ListAnnotationConflict, CruftSource::Span(span)));
    }
    assert_eq!(w.cruft.faults()[0].base, None);
    assert_eq!(w.screen(a, fork), SanitizeOutcome::Excluded);
}

#[test]
fn test_screening_a_plain_fork_is_clean() {
    let mut w = World::new();
    let (a, _) = w.named("A");
    let (b, _) = w.named("B");
    let fork = w.fork(a, b, &["B"]);

    assert!(w.screen(a, fork).is_clean());
    assert!(w.cruft.is_empty());
}

#[test]
fn test_edge_faults_do_not_exclude_the_fork() {
    let mut w = World::new();
    let (a, na) = w.named("A");
    let (_, nbase) = w.named("Base");
    let (cs, ncs) = w.named("Cs...");
    let (_, nb) = w.named("B");
    let fork = w.fork(a, cs, &["Cs..."]);
    w.cache.add_base(na, nbase, ForkId(99));

    assert_eq!(w.check(na, ncs, fork), SanitizeOutcome::Faulted);
    assert!(w.check(na, nb, fork).is_clean());
}

#[test]
fn test_list_onto_item_is_dimensionally_sound() {
    let mut w = World::new();
    let (list, nlist) = w.named("Items...");
    let (item, nitem) = w.named("Item");
    let fork = w.fork(list, item, &["Item"]);

    assert!(w.check(nlist, nitem, fork).is_clean());
    w.cache.add_base(nlist, nitem, fork);
    assert_eq!(w.dim(nlist), 1);
}

#[test]
fn test_list_of_lists_is_clean() {
    let mut w = World::new();
    let (cell, ncell) = w.named("Cell");
    let (row, nrow) = w.named("Row...");
    let (grid, ngrid) = w.named("Grid...");
    let row_fork = w.fork(row, cell, &["Cell"]);
    let grid_fork = w.fork(grid, row, &["Row..."]);

    assert!(w.check(nrow, ncell, row_fork).is_clean());
    w.cache.add_base(nrow, ncell, row_fork);
    assert!(w.check(ngrid, nrow, grid_fork).is_clean());
    w.cache.add_base(ngrid, nrow, grid_fork);

    assert!(w.cruft.is_empty());
    assert_eq!(w.dim(nrow), 1);
    assert_eq!(w.dim(ngrid), 2);
}

#[test]
fn test_list_base_after_item_base_is_a_dimensional_discrepancy() {
    let mut w = World::new();
    let (list, nlist) = w.named("Items...");
    let (_, nitem) = w.named("Item");
    let (other, nother) = w.named("Others...");
    w.cache.add_base(nlist, nitem, ForkId(99));
    let fork = w.fork(list, other, &["Others..."]);

    assert_eq!(w.check(nlist, nother, fork), SanitizeOutcome::Faulted);
    assert!(w.cruft.has_kind(FaultKind::ListDimensionalDiscrepancy, CruftSource::Fork(fork)));
    assert_eq!(w.dim(nlist), 1, "established depth is kept");
}

#[test]
fn test_item_onto_list_takes_the_list_depth() {
    let mut w = World::new();
    let (item, nitem) = w.named("Item");
    let (list, nlist) = w.named("Things...");
    let fork = w.fork(item, list, &["Things..."]);

    assert!(w.check(nitem, nlist, fork).is_clean());
    w.cache.add_base(nitem, nlist, fork);
    assert_eq!(w.dim(nitem), 1);
}

#[test]
fn test_list_onto_established_item_is_a_dimensional_discrepancy() {
    let mut w = World::new();
    let (item, nitem) = w.named("Item");
    let (_, nshape) = w.named("Shape");
    let (list, nlist) = w.named("Things...");
    w.cache.add_base(nitem, nshape, ForkId(99));
    let fork = w.fork(item, list, &["Things..."]);

    assert_eq!(w.check(nitem, nlist, fork), SanitizeOutcome::Faulted);
}

#[test]
fn test_narrower_pattern_is_covariant() {
    let mut w = World::new();
    let (narrow, nn) = w.pattern("yes");
    let (wide, nw) = w.pattern("yes|no");
    let fork = w.fork(narrow, wide, &["Answer"]);

    assert!(w.check(nn, nw, fork).is_clean());
}

#[test]
fn test_wider_pattern_is_not_covariant() {
    let mut w = World::new();
    let (wide, nw) = w.pattern("yes|no|maybe");
    let (narrow, nn) = w.pattern("yes|no");
    let fork = w.fork(wide, narrow, &["Answer"]);

    assert_eq!(w.check(nw, nn, fork), SanitizeOutcome::Faulted);
    assert_eq!(w.cruft.count_of(FaultKind::PatternNonCovariant), 1);
}

#[test]
fn test_faults_are_additive() {
    let mut w = World::new();
    let (list, nlist) = w.named("Items...");
    let (_, nitem) = w.named("Item");
    let (other, nother) = w.named("Others...");
    let fork = w.fork(list, other, &["Others..."]);
    let back = w.fork(other, list, &["Items..."]);
    w.cache.add_base(nlist, nitem, ForkId(99));
    w.cache.add_base(nother, nlist, back);

    assert_eq!(w.check(nlist, nother, fork), SanitizeOutcome::Faulted);
    assert_eq!(w.cruft.count_of(FaultKind::CircularFactReference), 1);
    assert_eq!(w.cruft.count_of(FaultKind::ListDimensionalDiscrepancy), 1);
    assert!(w.cache.node(nother).bases().next().is_none(), "cyclic edge pruned");
}
