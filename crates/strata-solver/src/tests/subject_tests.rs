use super::*;

fn alternation(source: &str) -> Arc<dyn PatternMatcher> {
    Arc::new(AlternationPattern::parse(source))
}

#[test]
fn test_parse_term_list_suffix() {
    let mut table = SubjectTable::new();
    let list = table.parse_term("Item...");
    let item = table.parse_term("Item");

    assert!(list.is_list);
    assert!(!item.is_list);
    assert_eq!(list.name, item.name);
    assert_eq!(list.twin(), item);
    assert_eq!(table.display(Subject::Term(list)), "Item...");
}

#[test]
fn test_terms_compare_structurally() {
    let mut table = SubjectTable::new();
    let a = table.term("Number", false);
    let b = table.term("Number", false);
    assert_eq!(Subject::Term(a), Subject::Term(b));
    assert_ne!(Subject::Term(a), Subject::Term(a.as_list()));
}

#[test]
fn test_patterns_are_cached_by_source() {
    let mut table = SubjectTable::new();
    let first = table.pattern(alternation("yes|no"));
    let second = table.pattern(alternation("yes|no"));
    let other = table.pattern(alternation("maybe"));

    assert_eq!(first, second);
    assert_ne!(first, other);
}

#[test]
fn test_uris_are_cached() {
    let mut table = SubjectTable::new();
    let a = table.uri("file:///types.st");
    let b = table.uri("file:///types.st");
    assert_eq!(a, b);
    assert_eq!(table.uri_text(a), "file:///types.st");
}

#[test]
fn test_subject_test_dispatches_by_variant() {
    let mut table = SubjectTable::new();
    let pattern = Subject::Pattern(table.pattern(alternation("on|off")));
    let term = Subject::Term(table.term("On", false));

    assert!(table.test(pattern, "on"));
    assert!(!table.test(pattern, "dim"));
    assert!(table.test(term, "On"));
    assert!(!table.test(term, "on"));
}

#[test]
fn test_alternation_comparison() {
    let mut table = SubjectTable::new();
    let small = table.pattern(alternation("a|b"));
    let large = table.pattern(alternation("a|b|c"));
    let same = table.pattern(alternation("b|a"));
    let disjoint = table.pattern(alternation("x"));

    assert_eq!(table.compare(small, large), PatternComparison::Subset);
    assert_eq!(table.compare(large, small), PatternComparison::Superset);
    assert_eq!(table.compare(small, same), PatternComparison::Equal);
    assert_eq!(table.compare(small, disjoint), PatternComparison::Unequal);
    assert!(table.compare(small, small).is_covariant());
}
