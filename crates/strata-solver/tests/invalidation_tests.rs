//! Multi-document programs and generation turnover.

use strata_common::Span;
use strata_solver::{FaultKind, PhraseId, Program, ResolveError, ResolveOptions, Subject, resolve};

fn declare(program: &mut Program, doc: strata_solver::DocumentId, name: &str) -> PhraseId {
    let subject = Subject::Term(program.parse_term(name));
    program.declare(doc, &[subject], Span::dummy()).expect("declare")
}

fn inherit(program: &mut Program, target: PhraseId, base: PhraseId, name: &str) {
    let term = program.parse_term(name);
    program
        .annotate(target, &[base], &[(term, Span::dummy())])
        .expect("annotate");
}

#[test]
fn cross_document_bases_resolve() {
    let mut program = Program::new();
    let lib = program.add_document("file:///lib.strata");
    let main = program.add_document("file:///main.strata");
    let shape = declare(&mut program, lib, "Shape");
    let square = declare(&mut program, main, "Square");
    inherit(&mut program, square, shape, "Shape");

    let resolution = resolve(&program, &ResolveOptions::default()).expect("resolve");
    assert!(resolution.is_derived_from(square, shape));
    assert_eq!(program.document_by_uri("file:///lib.strata"), Some(lib));
}

#[test]
fn invalidation_drops_edges_into_the_old_generation() {
    let mut program = Program::new();
    let lib = program.add_document("file:///lib.strata");
    let main = program.add_document("file:///main.strata");
    let shape = declare(&mut program, lib, "Shape");
    let square = declare(&mut program, main, "Square");
    inherit(&mut program, square, shape, "Shape");

    let before = resolve(&program, &ResolveOptions::default()).expect("resolve");
    assert!(before.is_current(&program));

    program.invalidate_document(lib).expect("invalidate");
    assert!(!before.is_current(&program));

    let after = resolve(&program, &ResolveOptions::default()).expect("resolve");
    assert!(after.is_current(&program));
    assert_eq!(after.generation(), 1);
    assert!(after.parallel_of(shape).is_none(), "orphaned phrase has no node");
    assert!(after.bases(square).is_empty());
    assert!(after.faults().is_empty());
}

#[test]
fn invalidation_clears_faults_owned_by_the_document() {
    let mut program = Program::new();
    let doc = program.add_document("file:///main.strata");
    let a = declare(&mut program, doc, "A");
    let b = declare(&mut program, doc, "B");
    inherit(&mut program, a, b, "B");
    inherit(&mut program, b, a, "A");

    let before = resolve(&program, &ResolveOptions::default()).expect("resolve");
    assert_eq!(before.cruft().count_of(FaultKind::CircularFactReference), 1);

    program.invalidate_document(doc).expect("invalidate");
    let a = declare(&mut program, doc, "A");
    let b = declare(&mut program, doc, "B");
    inherit(&mut program, a, b, "B");

    let after = resolve(&program, &ResolveOptions::default()).expect("resolve");
    assert!(after.faults().is_empty());
    assert!(after.is_derived_from(a, b));
}

#[test]
fn edits_to_orphaned_phrases_are_rejected() {
    let mut program = Program::new();
    let doc = program.add_document("file:///main.strata");
    let a = declare(&mut program, doc, "A");
    program.invalidate_document(doc).expect("invalidate");

    let subject = Subject::Term(program.parse_term("Inner"));
    assert_eq!(program.child(a, subject), Err(ResolveError::Orphaned(a)));
}
