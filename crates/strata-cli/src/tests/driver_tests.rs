use super::*;
use clap::Parser;

const CYCLE: &str = r#"{ "documents": [{ "uri": "file:///main.strata", "declarations": [
    { "path": ["A"], "span": { "start": 0, "end": 1 },
      "annotations": [{ "term": "B", "span": { "start": 4, "end": 5 } }] },
    { "path": ["B"], "span": { "start": 7, "end": 8 },
      "annotations": [{ "term": "A", "span": { "start": 11, "end": 12 } }] }
] }] }"#;

fn program(text: &str) -> Program {
    input::build_program(&input::parse_input(text).expect("parse")).expect("build")
}

fn args(extra: &[&str]) -> CliArgs {
    let mut argv = vec!["strata", "graph.json"];
    argv.extend_from_slice(extra);
    CliArgs::parse_from(argv)
}

#[test]
fn test_resolve_options_follow_flags() {
    let options = resolve_options(&args(&["--report-contracts", "--max-depth", "7"]));
    assert!(options.report_unsatisfied_contracts);
    assert_eq!(options.construction.max_depth(), 7);

    let defaults = resolve_options(&args(&[]));
    assert_eq!(defaults, ResolveOptions::default());
}

#[test]
fn test_text_output_lists_faults_and_summary() {
    let outcome = run_program(&program(CYCLE), &args(&[]), false).expect("run");
    assert_eq!(outcome.error_count, 1);
    assert!(outcome.output.contains("error S1002"), "{}", outcome.output);
    assert!(outcome.output.ends_with("1 error, 0 warnings"));
}

#[test]
fn test_json_output_with_snapshot() {
    let outcome = run_program(
        &program(CYCLE),
        &args(&["--format", "JSON", "--snapshot"]),
        false,
    )
    .expect("run");
    let value: serde_json::Value = serde_json::from_str(&outcome.output).expect("json");
    assert_eq!(value["diagnostics"][0]["code"], 1002);
    assert_eq!(value["diagnostics"][0]["file"], "file:///main.strata");
    assert_eq!(value["snapshot"]["faults"][0]["code"], 1002);
    assert_eq!(value["snapshot"]["nodes"][0]["phrase"], "A");
}

#[test]
fn test_json_output_omits_snapshot_by_default() {
    let clean = r#"{ "documents": [{ "uri": "main", "declarations": [{ "path": ["A"] }] }] }"#;
    let outcome = run_program(&program(clean), &args(&["--format", "json"]), false).expect("run");
    let value: serde_json::Value = serde_json::from_str(&outcome.output).expect("json");
    assert_eq!(outcome.error_count, 0);
    assert!(value.get("snapshot").is_none());
    assert_eq!(value["diagnostics"].as_array().map(Vec::len), Some(0));
}
