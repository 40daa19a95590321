use super::*;

#[test]
fn test_format_message_replaces_positional_args() {
    let text = format_message("'{0}' has {1} and '{0}' again", &["A", "two"]);
    assert_eq!(text, "'A' has two and 'A' again");
}

#[test]
fn test_message_codes_are_unique() {
    for (i, a) in DIAGNOSTIC_MESSAGES.iter().enumerate() {
        for b in &DIAGNOSTIC_MESSAGES[i + 1..] {
            assert_ne!(a.code, b.code, "duplicate code {}", a.code);
        }
    }
}

#[test]
fn test_get_message_template() {
    assert!(
        get_message_template(diagnostic_codes::CIRCULAR_FACT_REFERENCE)
            .is_some_and(|m| m.contains("circularly"))
    );
    assert!(get_message_template(9999).is_none());
}

#[test]
fn test_from_message_uses_category_and_code() {
    let diag = Diagnostic::from_message(
        &diagnostic_messages::UNSATISFIED_CONTRACT,
        "file:///a.st",
        4,
        3,
        &["Z", "Y"],
    );
    assert_eq!(diag.category, DiagnosticCategory::Warning);
    assert_eq!(diag.code, diagnostic_codes::UNSATISFIED_CONTRACT);
    assert!(diag.message_text.starts_with("'Z' does not inherit 'Y'"));
    assert!(!diag.is_error());
}

#[test]
fn test_related_information_serializes_only_when_present() {
    let plain = Diagnostic::error("f", 0, 1, "m", 1);
    let json = serde_json::to_string(&plain).unwrap();
    assert!(!json.contains("related_information"));

    let related = plain.with_related("g", 2, 3, "see here");
    let json = serde_json::to_string(&related).unwrap();
    assert!(json.contains("see here"));
}
