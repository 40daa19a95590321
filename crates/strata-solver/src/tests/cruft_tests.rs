use super::*;

#[test]
fn test_record_indexes_every_source() {
    let mut cruft = CruftCache::new();
    let fault = Fault::new(FaultKind::CircularFactReference, PhraseId(1))
        .with_base(PhraseId(2))
        .with_sources([CruftSource::Fork(ForkId(0)), CruftSource::Fork(ForkId(1))]);

    let id = cruft.record(fault);

    assert_eq!(cruft.len(), 1);
    assert!(cruft.has(CruftSource::Fork(ForkId(0))));
    assert!(cruft.has(CruftSource::Fork(ForkId(1))));
    assert!(!cruft.has(CruftSource::Fork(ForkId(2))));
    assert_eq!(cruft.get(id).map(|f| f.base), Some(Some(PhraseId(2))));
}

#[test]
fn test_has_kind_distinguishes_kinds() {
    let mut cruft = CruftCache::new();
    let span = CruftSource::Span(SpanId(3));
    cruft.record(Fault::new(FaultKind::ListAnnotationConflict, PhraseId(1)).with_source(span));

    assert!(cruft.has_kind(FaultKind::ListAnnotationConflict, span));
    assert!(!cruft.has_kind(FaultKind::CircularFactReference, span));
}

#[test]
fn test_faults_are_additive_per_source() {
    let mut cruft = CruftCache::new();
    let fork = CruftSource::Fork(ForkId(7));
    cruft.record(Fault::new(FaultKind::ListDimensionalDiscrepancy, PhraseId(1)).with_source(fork));
    cruft.record(Fault::new(FaultKind::PatternNonCovariant, PhraseId(1)).with_source(fork));

    assert_eq!(cruft.faults_for(fork).count(), 2);
    assert_eq!(cruft.count_of(FaultKind::PatternNonCovariant), 1);
}

#[test]
fn test_pairs_flatten_sources() {
    let mut cruft = CruftCache::new();
    cruft.record(
        Fault::new(FaultKind::ListAnnotationConflict, PhraseId(1))
            .with_sources([CruftSource::Span(SpanId(0)), CruftSource::Span(SpanId(1))]),
    );
    cruft.record(
        Fault::new(FaultKind::ResolutionLimitExceeded, PhraseId(4))
            .with_source(CruftSource::Phrase(PhraseId(4))),
    );

    let pairs: Vec<_> = cruft.pairs().collect();
    assert_eq!(
        pairs,
        vec![
            (CruftSource::Span(SpanId(0)), FaultKind::ListAnnotationConflict),
            (CruftSource::Span(SpanId(1)), FaultKind::ListAnnotationConflict),
            (CruftSource::Phrase(PhraseId(4)), FaultKind::ResolutionLimitExceeded),
        ]
    );
}

#[test]
fn test_clear_forgets_everything() {
    let mut cruft = CruftCache::new();
    let fork = CruftSource::Fork(ForkId(0));
    cruft.record(Fault::new(FaultKind::CircularFactReference, PhraseId(1)).with_source(fork));
    cruft.clear();
    assert!(cruft.is_empty());
    assert!(!cruft.has(fork));
}

#[test]
fn test_fault_kind_codes_match_message_table() {
    assert_eq!(
        FaultKind::CircularFactReference.code(),
        strata_common::diagnostic_codes::CIRCULAR_FACT_REFERENCE
    );
    assert_eq!(
        FaultKind::ListAnnotationConflict.code(),
        strata_common::diagnostic_codes::LIST_ANNOTATION_CONFLICT
    );
}
