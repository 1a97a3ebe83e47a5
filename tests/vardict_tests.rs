//! Variable store tests
//!
//! Exercises change tracking, diff, output filtering, facts and the result
//! payload built from a store.

use pretty_assertions::assert_eq;
use rustible_tags::diagnostics::{Deprecation, Diagnostics};
use rustible_tags::result::{ResultOptions, TaskResult};
use rustible_tags::vars::{VarDict, VarOptions, RESERVED_NAMES};
use rustible_tags::Error;
use serde_json::json;

#[test]
fn test_diffed_variable_reports_change() {
    let mut vars = VarDict::new();
    vars.set_with("x", 1, VarOptions::new().diff(true)).unwrap();
    vars.set("x", 2).unwrap();

    assert!(vars.var_has_changed("x").unwrap());
    assert!(vars.has_changed());

    let diff = vars.diff(0).unwrap();
    assert_eq!(diff.before.get("x"), Some(&json!(1)));
    assert_eq!(diff.after.get("x"), Some(&json!(2)));
    assert_eq!(diff.before.len(), 1);
}

#[test]
fn test_same_value_is_not_a_change() {
    let mut vars = VarDict::new();
    vars.set_with("x", 1, VarOptions::new().diff(true)).unwrap();
    vars.set("x", 1).unwrap();

    assert!(!vars.var_has_changed("x").unwrap());
    assert!(!vars.has_changed());
    assert_eq!(vars.diff(0), None);
}

#[test]
fn test_change_follows_diff_by_default() {
    let mut vars = VarDict::new();
    vars.set_with("y", 1, VarOptions::new().diff(false)).unwrap();
    vars.set("y", 2).unwrap();
    assert!(!vars.has_changed());

    vars.set_meta("y", VarOptions::new().change(true)).unwrap();
    assert!(vars.has_changed());
    // not diffed, so nothing to show
    assert_eq!(vars.diff(0), None);
}

#[test]
fn test_explicit_change_false_hides_diffed_change() {
    let mut vars = VarDict::new();
    vars.set_with("x", "a", VarOptions::new().diff(true).change(false))
        .unwrap();
    vars.set("x", "b").unwrap();

    assert!(!vars.has_changed());
    assert_eq!(vars.diff(0), None);
}

#[test]
fn test_output_excludes_hidden_and_verbose_entries() {
    let mut vars = VarDict::new();
    vars.set("name", "web").unwrap();
    vars.set_with("secret", "hunter2", VarOptions::new().output(false))
        .unwrap();
    vars.set_with("detail", "x", VarOptions::new().verbosity(2))
        .unwrap();

    let output = vars.output(0);
    assert_eq!(output.keys().collect::<Vec<_>>(), vec!["name"]);

    let output = vars.output(2);
    assert_eq!(output.keys().collect::<Vec<_>>(), vec!["name", "detail"]);
}

#[test]
fn test_facts_none_without_fact_entries() {
    let mut vars = VarDict::new();
    vars.set("a", 1).unwrap();
    assert_eq!(vars.facts(), None);

    vars.set_with("b", 2, VarOptions::new().fact(true)).unwrap();
    let facts = vars.facts().unwrap();
    assert_eq!(facts.get("b"), Some(&json!(2)));
    assert_eq!(facts.len(), 1);
}

#[test]
fn test_reserved_names_rejected() {
    let mut vars = VarDict::new();
    for name in RESERVED_NAMES {
        let err = vars.set(name, 1).unwrap_err();
        assert!(matches!(err, Error::ReservedName(ref n) if n == name));
    }
    assert!(vars.is_empty());
}

#[test]
fn test_missing_variable_errors() {
    let vars = VarDict::new();
    assert!(matches!(vars.get("nope"), Err(Error::VariableNotFound(_))));
    assert!(matches!(vars.get_meta("nope"), Err(Error::VariableNotFound(_))));
    assert!(vars.try_get("nope").is_none());
}

#[test]
fn test_set_meta_on_missing_variable_errors() {
    let mut vars = VarDict::new();
    let err = vars.set_meta("nope", VarOptions::new().diff(true)).unwrap_err();
    assert!(matches!(err, Error::VariableNotFound(_)));
}

#[test]
fn test_invalid_verbosity_rejected() {
    let mut vars = VarDict::new();
    let err = vars
        .set_with("x", 1, VarOptions::new().verbosity(5))
        .unwrap_err();
    assert!(matches!(err, Error::InvalidVerbosity(5)));
    assert!(!vars.contains("x"));
}

#[test]
fn test_initial_value_override() {
    let mut vars = VarDict::new();
    vars.set_with(
        "state",
        "present",
        VarOptions::new().diff(true).initial_value("absent"),
    )
    .unwrap();

    let snapshot = vars.var("state").unwrap();
    assert_eq!(snapshot.initial_value, json!("absent"));
    assert_eq!(snapshot.value, json!("present"));
    assert!(snapshot.meta.change);
    assert!(vars.has_changed());
}

#[test]
fn test_insertion_order_preserved() {
    let mut vars = VarDict::new();
    vars.set("zeta", 1).unwrap();
    vars.set("alpha", 2).unwrap();
    vars.set("mid", 3).unwrap();
    vars.set("zeta", 4).unwrap();

    assert_eq!(vars.names().collect::<Vec<_>>(), vec!["zeta", "alpha", "mid"]);
    assert_eq!(vars.as_dict().get("zeta"), Some(&json!(4)));
}

#[test]
fn test_result_payload() {
    let mut vars = VarDict::new();
    vars.set_with("state", "absent", VarOptions::new().diff(true))
        .unwrap();
    vars.set("state", "present").unwrap();
    vars.set_with("version", "1.2", VarOptions::new().fact(true))
        .unwrap();

    let mut diagnostics = Diagnostics::new();
    diagnostics.warn("check this");
    diagnostics.deprecate(Deprecation::new("old option").with_version("2.0"));

    let options = ResultOptions::new()
        .with_diff_mode(true)
        .with_facts_name("pkg")
        .with_msg("done");
    let result = TaskResult::from_vars(&vars, &options, &mut diagnostics);

    assert!(result.changed);
    assert_eq!(result.msg, "done");
    assert_eq!(result.warnings, vec!["check this".to_string()]);
    assert_eq!(result.deprecations.len(), 1);
    assert!(diagnostics.is_empty());

    let json = serde_json::to_value(&result).unwrap();
    assert_eq!(json["state"], json!("present"));
    assert_eq!(json["diff"]["before"]["state"], json!("absent"));
    assert_eq!(json["ansible_facts"]["pkg"]["version"], json!("1.2"));
}

#[test]
fn test_result_without_diff_mode_has_no_diff() {
    let mut vars = VarDict::new();
    vars.set_with("x", 1, VarOptions::new().diff(true)).unwrap();
    vars.set("x", 2).unwrap();

    let result = TaskResult::from_vars(&vars, &ResultOptions::new(), &mut Diagnostics::new());
    assert!(result.changed);
    assert_eq!(result.diff, None);

    let json = serde_json::to_value(&result).unwrap();
    assert!(json.get("diff").is_none());
    assert!(json.get("ansible_facts").is_none());
}
