//! Textual dependency discovery (C10).
//!
//! For every step, every string value it carries — `prompt`, `condition`,
//! `skip_if`, and each value in `updates` — is scanned for `{{
//! steps.<id>…}}` references. This is a textual scan over the raw
//! template strings, not a parse of the expression AST: a reference
//! inside a string literal inside an expression still counts, which is
//! deliberately over-inclusive (a false-positive dependency costs a
//! little scheduling slack; a missed one costs correctness).

use std::collections::BTreeSet;

use lacquer_core::{Step, StepKind};

/// The step ids `step` textually references via `steps.<id>`, excluding
/// references to unknown ids (ids not present in `known_ids`) and to
/// itself.
pub fn step_dependencies(step: &Step, known_ids: &BTreeSet<String>) -> BTreeSet<String> {
    let mut deps = BTreeSet::new();
    let mut scan = |text: &str| collect_step_refs(text, known_ids, &mut deps);

    match &step.kind {
        StepKind::Agent { prompt, .. } => scan(prompt),
        StepKind::Block { with, .. } => {
            for value in with.values() {
                scan_json_strings(value, &mut scan);
            }
        }
        StepKind::Action { with, .. } => {
            for value in with.values() {
                scan_json_strings(value, &mut scan);
            }
        }
    }
    if let Some(condition) = &step.condition {
        scan(condition);
    }
    if let Some(skip_if) = &step.skip_if {
        scan(skip_if);
    }
    for value in step.updates.values() {
        scan(value);
    }

    deps.remove(&step.id);
    deps
}

fn scan_json_strings(value: &serde_json::Value, scan: &mut impl FnMut(&str)) {
    match value {
        serde_json::Value::String(s) => scan(s),
        serde_json::Value::Array(items) => items.iter().for_each(|v| scan_json_strings(v, scan)),
        serde_json::Value::Object(map) => map.values().for_each(|v| scan_json_strings(v, scan)),
        _ => {}
    }
}

/// Find every `steps.<id>` occurrence in `text` (whether or not it's
/// wrapped in `{{ }}`, matching the "textual discovery" contract) and add
/// every `<id>` that's in `known_ids` to `out`.
fn collect_step_refs(text: &str, known_ids: &BTreeSet<String>, out: &mut BTreeSet<String>) {
    const PREFIX: &str = "steps.";
    let mut rest = text;
    while let Some(pos) = rest.find(PREFIX) {
        let after = &rest[pos + PREFIX.len()..];
        let id_len = after
            .find(|c: char| !(c.is_alphanumeric() || c == '_' || c == '-'))
            .unwrap_or(after.len());
        let candidate = &after[..id_len];
        if known_ids.contains(candidate) {
            out.insert(candidate.to_string());
        }
        rest = &after[id_len.max(1).min(after.len())..];
    }
}
