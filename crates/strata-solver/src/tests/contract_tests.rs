use super::*;
use crate::fork::ForkId;
use crate::phrase::{DocumentId, PhraseId, PhraseTable};
use crate::subject::{Subject, SubjectTable};
use smallvec::smallvec;
use strata_common::Span;

/// Explicit nodes `X`, `Y`, `Z`, `Left`, `Right`, `Slot` under one root,
/// plus an implicit `Gap`.
struct Graph {
    cache: ParallelCache,
    ids: Vec<ParallelId>,
    gap: ParallelId,
}

fn graph() -> Graph {
    let mut phrases = PhraseTable::new();
    let mut subjects = SubjectTable::new();
    let root = phrases.new_root(DocumentId(0));
    let mut cache = ParallelCache::new();
    cache.create_root(&phrases, root).expect("root");

    let mut ids = Vec::new();
    for name in ["X", "Y", "Z", "Left", "Right", "Slot"] {
        let phrase: PhraseId = phrases.forward(root, Subject::Term(subjects.term(name, false)));
        phrases.declare(phrase, Span::dummy());
        ids.push(cache.create_explicit(&phrases, phrase).expect("explicit"));
    }
    let gap_phrase = phrases.forward(root, Subject::Term(subjects.term("Gap", false)));
    let gap = cache.create_implicit(&phrases, gap_phrase).expect("implicit");
    Graph { cache, ids, gap }
}

#[test]
fn test_no_contributors_means_no_conditions() {
    let g = graph();
    let contract = Contract::build(&g.cache, g.ids[5], RecursionProfile::ContributorWalk);
    assert!(contract.is_satisfied());
    assert_eq!(contract.unsatisfied().count(), 0);
}

#[test]
fn test_diamond_conditions_shrink_as_bases_apply() {
    let mut g = graph();
    let (x, y, z, left, right, slot) = (g.ids[0], g.ids[1], g.ids[2], g.ids[3], g.ids[4], g.ids[5]);
    g.cache.add_base(left, x, ForkId(0));
    g.cache.add_base(right, y, ForkId(1));
    g.cache.node_mut(slot).set_contributors(smallvec![left, right]);

    let mut contract = Contract::build(&g.cache, slot, RecursionProfile::ContributorWalk);
    assert_eq!(contract.unsatisfied().collect::<Vec<_>>(), vec![x, y]);

    assert_eq!(contract.try_satisfy_condition(&g.cache, x), 1);
    assert_eq!(contract.unsatisfied().collect::<Vec<_>>(), vec![y]);

    assert_eq!(contract.try_satisfy_condition(&g.cache, x), 0, "nothing new");

    g.cache.add_base(z, y, ForkId(2));
    assert_eq!(contract.try_satisfy_condition(&g.cache, z), 1);
    assert!(contract.is_satisfied());
    assert_eq!(contract.satisfied().collect::<Vec<_>>(), vec![x, y]);
}

#[test]
fn test_implicit_contributors_are_walked_through() {
    let mut g = graph();
    let (x, left, slot) = (g.ids[0], g.ids[3], g.ids[5]);
    g.cache.add_base(left, x, ForkId(0));
    g.cache.node_mut(g.gap).set_contributors(smallvec![left]);
    g.cache.node_mut(slot).set_contributors(smallvec![g.gap]);

    let contract = Contract::build(&g.cache, slot, RecursionProfile::ContributorWalk);
    assert_eq!(contract.unsatisfied().collect::<Vec<_>>(), vec![x]);
}

#[test]
fn test_satisfied_conditions_are_never_reinstated() {
    let mut g = graph();
    let (x, left, slot) = (g.ids[0], g.ids[3], g.ids[5]);
    let fork = ForkId(0);
    g.cache.add_base(left, x, fork);
    g.cache.node_mut(slot).set_contributors(smallvec![left]);

    let mut contract = Contract::build(&g.cache, slot, RecursionProfile::ContributorWalk);
    assert_eq!(contract.try_satisfy_condition(&g.cache, x), 1);

    g.cache.remove_base(left, x);
    assert!(contract.is_satisfied());
}

#[test]
fn test_contract_table_slots() {
    let g = graph();
    let mut table = ContractTable::new();
    assert!(!table.is_built(g.ids[5]));

    table.insert(g.ids[5], Contract::default());
    assert!(table.is_built(g.ids[5]));
    assert!(!table.is_built(g.ids[0]));
    assert_eq!(table.iter().count(), 1);
}
