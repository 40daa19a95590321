use super::*;

#[test]
fn test_declare_marks_prefixes_concrete() {
    let mut program = Program::new();
    let doc = program.add_document("main.strata");
    let outer = Subject::Term(program.term("Outer"));
    let inner = Subject::Term(program.term("Inner"));

    let phrase = program
        .declare(doc, &[outer, inner], Span::at(10, 5))
        .expect("declare");

    let outer_phrase = program.lookup(doc, &[outer]).expect("prefix interned");
    assert!(!program.phrase(outer_phrase).expect("outer").is_hypothetical());
    let data = program.phrase(phrase).expect("inner");
    assert!(!data.is_hypothetical());
    assert_eq!(data.declaration, Some(Span::at(10, 5)));
    assert_eq!(program.phrase_path(phrase), "Outer/Inner");
}

#[test]
fn test_hypothesize_leaves_phrase_hypothetical() {
    let mut program = Program::new();
    let doc = program.add_document("main.strata");
    let gap = Subject::Term(program.term("Gap"));

    let phrase = program.hypothesize(doc, &[gap]).expect("hypothesize");
    assert!(program.phrase(phrase).expect("gap").is_hypothetical());
}

#[test]
fn test_declaring_a_list_declares_its_element_twin() {
    let mut program = Program::new();
    let doc = program.add_document("main.strata");
    let tags = program.list_term("Tags");

    let list = program
        .declare(doc, &[Subject::Term(tags)], Span::at(0, 7))
        .expect("declare");
    let twin = program
        .lookup(doc, &[Subject::Term(tags.as_item())])
        .expect("twin declared");

    assert!(!program.phrase(twin).expect("twin").is_hypothetical());
    assert_eq!(program.phrases().list_bridge(list), Some(twin));
    assert_eq!(program.phrase_path(list), "Tags...");
}

#[test]
fn test_annotate_requires_terms() {
    let mut program = Program::new();
    let doc = program.add_document("main.strata");
    let a = Subject::Term(program.term("A"));
    let phrase = program.declare(doc, &[a], Span::dummy()).expect("declare");

    assert_eq!(
        program.annotate(phrase, &[], &[]),
        Err(ResolveError::EmptyAnnotation(phrase))
    );
}

#[test]
fn test_annotate_rejects_unknown_successor() {
    let mut program = Program::new();
    let doc = program.add_document("main.strata");
    let a = Subject::Term(program.term("A"));
    let b = program.term("B");
    let phrase = program.declare(doc, &[a], Span::dummy()).expect("declare");

    assert_eq!(
        program.annotate(phrase, &[PhraseId(999)], &[(b, Span::dummy())]),
        Err(ResolveError::UnknownPhrase(PhraseId(999)))
    );
}

#[test]
fn test_annotate_rejects_hypothetical_predecessor() {
    let mut program = Program::new();
    let doc = program.add_document("main.strata");
    let gap = Subject::Term(program.term("Gap"));
    let b = Subject::Term(program.term("B"));
    let b_term = program.term("B");
    let base = program.declare(doc, &[b], Span::dummy()).expect("declare");
    let phrase = program.hypothesize(doc, &[gap]).expect("hypothesize");

    assert_eq!(
        program.annotate(phrase, &[base], &[(b_term, Span::dummy())]),
        Err(ResolveError::HypotheticalPredecessor(phrase))
    );
    assert!(program.forks().incoming(phrase).is_empty());
}

#[test]
fn test_invalidate_document_orphans_and_bumps_generation() {
    let mut program = Program::new();
    let doc = program.add_document("main.strata");
    let a = Subject::Term(program.term("A"));
    let b_term = program.term("B");
    let b = Subject::Term(b_term);
    let pa = program.declare(doc, &[a], Span::dummy()).expect("a");
    let pb = program.declare(doc, &[b], Span::dummy()).expect("b");
    program
        .annotate(pa, &[pb], &[(b_term, Span::dummy())])
        .expect("annotate");
    let old_root = program.root(doc).expect("root");

    program.invalidate_document(doc).expect("invalidate");

    assert_eq!(program.generation(), 1);
    assert_ne!(program.root(doc).expect("root"), old_root);
    assert!(program.phrase(pa).expect("a").is_orphaned());
    assert!(program.forks().incoming(pa).is_empty());
    assert_eq!(program.lookup(doc, &[a]), None);
    assert_eq!(program.annotate(pa, &[], &[(b_term, Span::dummy())]), Err(ResolveError::Orphaned(pa)));

    let fresh = program.declare(doc, &[a], Span::dummy()).expect("redeclare");
    assert_ne!(fresh, pa);
}

#[test]
fn test_unknown_document() {
    let mut program = Program::new();
    let a = Subject::Term(program.term("A"));
    assert_eq!(
        program.declare(DocumentId(3), &[a], Span::dummy()),
        Err(ResolveError::UnknownDocument(DocumentId(3)))
    );
    assert_eq!(
        program.invalidate_document(DocumentId(3)),
        Err(ResolveError::UnknownDocument(DocumentId(3)))
    );
}
