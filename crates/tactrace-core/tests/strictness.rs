//! Schema violations in files on disk, for both encodings.

use anyhow::Result;
use serde_json::{json, Value};
use tactrace_core::io::read_trace_auto;
use tactrace_core::{ErrorKind, TraceError};
use tempfile::tempdir;

fn pv() -> Value {
    json!({
        "default": "x", "full_path": "x", "no_notations": "x",
        "low_level": "x", "default_pretty": "x", "references": []
    })
}

fn tactic_event(details: Value) -> Value {
    json!({
        "type": "Tactic",
        "goals_before": [], "goals_after": [],
        "kind": {"type": "Builtin", "s": "intro"},
        "tactic": pv(),
        "details": details
    })
}

/// A trace with one interactive declaration whose single step runs `event`.
fn with_event(event: Value) -> Value {
    json!({
        "sub_filenames": [],
        "declarations": [{
            "path": "Top.l",
            "type_": pv(),
            "kind": {
                "type": "Interactive",
                "outcome": {"type": "Proved"},
                "steps": [{
                    "goals_before": [], "goals_after": [],
                    "kind": {
                        "type": "Tactic",
                        "goal_selector": "1",
                        "tactic_raw": "intro.",
                        "tactic": pv(),
                        "event": event
                    }
                }]
            }
        }]
    })
}

/// Write `doc` as text and as CBOR; both must fail the same way.
fn rejected(doc: &Value) -> Vec<TraceError> {
    let dir = tempdir().unwrap();
    let text = dir.path().join("t.json");
    std::fs::write(&text, serde_json::to_vec_pretty(doc).unwrap()).unwrap();
    let bin = dir.path().join("t.pickle");
    let mut bytes = Vec::new();
    ciborium::ser::into_writer(doc, &mut bytes).unwrap();
    std::fs::write(&bin, bytes).unwrap();

    [text, bin]
        .iter()
        .map(|p| read_trace_auto(p).unwrap_err())
        .collect()
}

fn assert_invalid_at(doc: &Value, path: &str, needle: &str) {
    for err in rejected(doc) {
        assert_eq!(err.kind(), ErrorKind::Validation, "{err}");
        let v = err.validation().unwrap();
        assert_eq!(v.path.to_string(), path, "{err}");
        assert!(v.to_string().contains(needle), "{v} lacks {needle}");
    }
}

const STEP: &str = "$.declarations[0].kind.steps[0].kind";

#[test]
fn well_formed_document_is_accepted() -> Result<()> {
    let dir = tempdir()?;
    let p = dir.path().join("ok.json");
    let doc = with_event(tactic_event(json!({"type": "Message", "message": "m"})));
    std::fs::write(&p, serde_json::to_vec(&doc)?)?;
    let t = read_trace_auto(&p)?;
    assert_eq!(t.declarations.len(), 1);
    Ok(())
}

#[test]
fn unknown_event_tag() {
    let doc = with_event(tactic_event(json!({"type": "Bogus"})));
    assert_invalid_at(&doc, &format!("{STEP}.event.details"), "Bogus");
}

#[test]
fn missing_event_tag() {
    let doc = with_event(json!({"elements": []}));
    assert_invalid_at(&doc, &format!("{STEP}.event"), "type");
}

#[test]
fn extra_field_on_event() {
    let doc = with_event(json!({"type": "Message", "message": "m", "note": 1}));
    assert_invalid_at(&doc, &format!("{STEP}.event"), "note");
}

#[test]
fn missing_field_deep_in_a_sequence() {
    let doc = with_event(json!({
        "type": "Sequence",
        "elements": [
            {"type": "Message", "message": "ok"},
            tactic_event(json!({"type": "Message"}))
        ]
    }));
    assert_invalid_at(&doc, &format!("{STEP}.event.elements[1].details"), "message");
}

#[test]
fn no_scalar_coercion() {
    let doc = with_event(json!({"type": "Message", "message": 42}));
    assert_invalid_at(&doc, &format!("{STEP}.event.message"), "number");

    let doc = with_event(json!({"type": "Sequence", "elements": null}));
    assert_invalid_at(&doc, &format!("{STEP}.event.elements"), "null");
}

#[test]
fn hyp_definition_needs_value() {
    let mut doc = with_event(json!({"type": "Message", "message": "m"}));
    doc["declarations"][0]["kind"]["steps"][0]["goals_before"] = json!([{
        "hyps": [{"name": "h", "type_": pv(), "kind": {"type": "Definition"}}],
        "concl": pv()
    }]);
    assert_invalid_at(
        &doc,
        "$.declarations[0].kind.steps[0].goals_before[0].hyps[0].kind",
        "value",
    );
}

#[test]
fn unknown_outcome() {
    let mut doc = with_event(json!({"type": "Message", "message": "m"}));
    doc["declarations"][0]["kind"]["outcome"] = json!({"type": "Qed"});
    assert_invalid_at(&doc, "$.declarations[0].kind.outcome", "Qed");
}

#[test]
fn field_less_variant_rejects_extras() {
    let mut doc = with_event(json!({"type": "Message", "message": "m"}));
    doc["declarations"][0]["kind"]["steps"][0]["kind"] =
        json!({"type": "EndSubproof", "bullet": "-"});
    assert_invalid_at(&doc, STEP, "bullet");
}

#[test]
fn reference_without_path() {
    let mut doc = with_event(json!({"type": "Message", "message": "m"}));
    doc["declarations"][0]["type_"]["references"] = json!([{"type": "Ind"}]);
    assert_invalid_at(&doc, "$.declarations[0].type_.references[0]", "path");
}

#[test]
fn top_level_must_be_a_trace() {
    assert_invalid_at(&json!([]), "$", "object");
    assert_invalid_at(&json!({"declarations": []}), "$", "sub_filenames");
}

#[test]
fn malformed_text_is_a_decode_error() -> Result<()> {
    let dir = tempdir()?;
    let p = dir.path().join("broken.json");
    std::fs::write(&p, b"{\"sub_filenames\": [], \"declarations\": [")?;
    let err = read_trace_auto(&p).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Decode);
    assert!(err.validation().is_none());
    Ok(())
}
