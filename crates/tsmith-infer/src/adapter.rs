//! The inference adapter: dedup, engine invocation, and text post-processing.

use std::collections::BTreeSet;

use serde_json::Value;
use tracing::{debug, warn};

use tsmith_dedup::{find_duplicate_keys, prefix_duplicate_keys, strip_prefix, DELIMITER_CORE};
use tsmith_model::parse::parse_interfaces;

use crate::engine::{InferenceEngine, StructuralEngine};
use crate::InferError;

/// Number of input characters embedded in an invalid-JSON error message.
pub const PREVIEW_LEN: usize = 120;

/// Internal sample name handed to the inference engine; the root declaration
/// is renamed to the caller's interface name afterwards.
const SAMPLE_NAME: &str = "InferredSample";

/// Infers TypeScript interface declarations from a JSON sample.
///
/// Malformed JSON is the caller's problem and returns an `Err` carrying a
/// truncated preview of the input. Downstream failures (engine errors,
/// post-processing, the duplicate-property consistency check) are logged at
/// warn and soften to `Ok(None)` — they never escape this layer.
pub fn infer_interface(json: &str, interface_name: &str) -> Result<Option<String>, InferError> {
    let value: Value = serde_json::from_str(json).map_err(|err| invalid_json(json, &err))?;

    match infer_declarations(&value, interface_name) {
        Ok(text) => Ok(Some(text)),
        Err(err) => {
            warn!(target: "infer", interface = interface_name, %err, "inference failed, skipping");
            Ok(None)
        }
    }
}

fn invalid_json(json: &str, err: &serde_json::Error) -> InferError {
    let preview: String = json.chars().take(PREVIEW_LEN).collect();
    InferError::InvalidJson {
        preview,
        message: err.to_string(),
        offset: byte_offset(json, err.line(), err.column()),
    }
}

/// Converts serde_json's 1-based line/column into a byte offset.
fn byte_offset(source: &str, line: usize, column: usize) -> usize {
    let mut offset = 0;
    for (idx, text) in source.lines().enumerate() {
        if idx + 1 == line {
            return (offset + column.saturating_sub(1)).min(source.len());
        }
        offset += text.len() + 1;
    }
    source.len().saturating_sub(1)
}

fn infer_declarations(value: &Value, interface_name: &str) -> Result<String, InferError> {
    let duplicates = find_duplicate_keys(value);
    let mut ledger = BTreeSet::new();
    let deduped = prefix_duplicate_keys(value, &duplicates, Some(&mut ledger));
    if !ledger.is_empty() {
        debug!(target: "infer", prefixed = ledger.len(), "deduplicated colliding keys");
    }

    let serialized =
        serde_json::to_string(&deduped).map_err(|e| InferError::Engine(e.to_string()))?;
    let raw = StructuralEngine.emit_declarations(SAMPLE_NAME, &serialized)?;

    let text = rewrite_nullable_fields(&raw);
    let text = unprefix_ledger_entries(&text, &ledger);
    let text = scrub_fused_delimiters(&text);
    check_duplicate_properties(&text)?;
    Ok(rename_root_interface(&text, interface_name))
}

/// Rewrites every field typed exactly `null` to an optional `any` field.
///
/// This erases the distinction between "can be null" and "can be omitted",
/// trading null-safety for generation simplicity.
fn rewrite_nullable_fields(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for line in text.lines() {
        match line.strip_suffix(": null;") {
            Some(head) if head.trim_start().ends_with('?') => {
                out.push_str(head);
                out.push_str(": any;");
            }
            Some(head) => {
                out.push_str(head);
                out.push_str("?: any;");
            }
            None => out.push_str(line),
        }
        out.push('\n');
    }
    out
}

/// Restores the original bare names for every prefixed key the deduplication
/// pass introduced. Longer entries are replaced first so an entry that is a
/// substring of another cannot corrupt it.
fn unprefix_ledger_entries(text: &str, ledger: &BTreeSet<String>) -> String {
    let mut entries: Vec<&String> = ledger.iter().collect();
    entries.sort_by_key(|e| std::cmp::Reverse(e.len()));

    let mut out = text.to_string();
    for entry in entries {
        out = out.replace(entry.as_str(), strip_prefix(entry));
    }
    out
}

/// Deletes the bare delimiter core token when it appears fused between two
/// identifier characters, in either its original or title-cased form — an
/// inference engine building identifiers out of prefixed keys mangles the
/// delimiter's casing but leaves the core recognizable.
fn scrub_fused_delimiters(text: &str) -> String {
    let title_case = title_case(DELIMITER_CORE);
    let mut out = text.to_string();
    for token in [DELIMITER_CORE, title_case.as_str()] {
        out = scrub_token(&out, token);
    }
    out
}

fn title_case(token: &str) -> String {
    let mut chars = token.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().collect::<String>() + &chars.as_str().to_lowercase(),
        None => String::new(),
    }
}

fn scrub_token(text: &str, token: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut rest = text;
    loop {
        let Some(pos) = rest.find(token) else {
            out.push_str(rest);
            return out;
        };
        let before = rest[..pos].chars().next_back();
        let after = rest[pos + token.len()..].chars().next();
        let fused = before.is_some_and(is_identifier_char) && after.is_some_and(is_identifier_char);

        out.push_str(&rest[..pos]);
        if !fused {
            out.push_str(token);
        }
        rest = &rest[pos + token.len()..];
    }
}

fn is_identifier_char(c: char) -> bool {
    c.is_alphanumeric() || c == '_'
}

/// Last-resort consistency check: the text rewrites above must not leave any
/// interface with two properties sharing a final name.
fn check_duplicate_properties(text: &str) -> Result<(), InferError> {
    for interface in parse_interfaces(text) {
        let mut seen = BTreeSet::new();
        let mut colliding: Vec<String> = vec![];
        for prop in &interface.properties {
            if !seen.insert(prop.name.as_str()) && !colliding.contains(&prop.name) {
                colliding.push(prop.name.clone());
            }
        }
        if !colliding.is_empty() {
            return Err(InferError::DuplicateProperties {
                interface: interface.name,
                names: colliding,
            });
        }
    }
    Ok(())
}

/// Renames the first (root) interface declaration to the caller's name;
/// nested declarations keep their engine-assigned names.
fn rename_root_interface(text: &str, interface_name: &str) -> String {
    let marker = "export interface ";
    let Some(start) = text.find(marker) else {
        return text.to_string();
    };
    let name_start = start + marker.len();
    let name_end = text[name_start..]
        .find(|c: char| c == ' ' || c == '<' || c == '{')
        .map(|i| name_start + i)
        .unwrap_or(text.len());

    let mut out = String::with_capacity(text.len());
    out.push_str(&text[..name_start]);
    out.push_str(interface_name);
    out.push_str(&text[name_end..]);
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_infer_end_to_end() {
        let text = infer_interface(r#"{"id":"u_1","age":29,"roles":["admin"]}"#, "User")
            .unwrap()
            .unwrap();
        assert!(text.contains("export interface User"));
        assert!(text.contains("id: string"));
        assert!(text.contains("age: number"));
        assert!(text.contains("roles: string[]"));
    }

    #[test]
    fn test_invalid_json_throws() {
        let err = infer_interface(r#"{"id": "1""#, "X").unwrap_err();
        match err {
            InferError::InvalidJson { preview, .. } => {
                assert!(preview.starts_with(r#"{"id": "1""#));
            }
            other => panic!("expected InvalidJson, got {other:?}"),
        }
    }

    #[test]
    fn test_preview_truncated() {
        let long = format!("{{\"key\": \"{}\"", "x".repeat(500));
        let err = infer_interface(&long, "X").unwrap_err();
        match err {
            InferError::InvalidJson { preview, .. } => assert_eq!(preview.len(), PREVIEW_LEN),
            other => panic!("expected InvalidJson, got {other:?}"),
        }
    }

    #[test]
    fn test_duplicate_keys_round_trip() {
        let sample = r#"{
            "user": { "id": 1, "profile": { "id": "p-1", "status": "active" } },
            "metadata": { "status": "ok", "timestamp": "t" }
        }"#;
        let text = infer_interface(sample, "Payload").unwrap().unwrap();

        // Every field keeps its original unprefixed name.
        assert!(text.contains("  id: number;"));
        assert!(text.contains("  id: string;"));
        assert!(!text.contains("PREFIX"));
        assert!(!text.contains("Prefix"));

        // And no interface ends up with colliding properties.
        for iface in parse_interfaces(&text) {
            let mut names: Vec<_> = iface.properties.iter().map(|p| &p.name).collect();
            let total = names.len();
            names.sort();
            names.dedup();
            assert_eq!(names.len(), total, "duplicates in {}", iface.name);
        }
    }

    #[test]
    fn test_nullable_becomes_optional_any() {
        let text = infer_interface(r#"{"id": 1, "note": null}"#, "Item")
            .unwrap()
            .unwrap();
        assert!(text.contains("note?: any;"));
        assert!(!text.contains(": null;"));
    }

    #[test]
    fn test_root_renamed_nested_kept() {
        let text = infer_interface(r#"{"profile": {"bio": "hi"}}"#, "Account")
            .unwrap()
            .unwrap();
        assert!(text.contains("export interface Account {"));
        assert!(text.contains("export interface Profile {"));
        assert!(!text.contains(SAMPLE_NAME));
    }

    #[test]
    fn test_scrub_fused_tokens() {
        let text = "export interface UserPrefixProfile {\n  a: FooPREFIXBar;\n}\n";
        let scrubbed = scrub_fused_delimiters(text);
        assert!(scrubbed.contains("UserProfile"));
        assert!(scrubbed.contains("FooBar"));
    }

    #[test]
    fn test_scrub_keeps_unfused_tokens() {
        // Token at an identifier boundary is legitimate text, not a fused
        // delimiter remnant.
        let text = "  keyPrefix: string;\n  Prefix: number;\n";
        assert_eq!(scrub_fused_delimiters(text), text);
    }

    #[test]
    fn test_duplicate_property_check() {
        let bad = "export interface X {\n  id: string;\n  id: number;\n}\n";
        let err = check_duplicate_properties(bad).unwrap_err();
        match err {
            InferError::DuplicateProperties { interface, names } => {
                assert_eq!(interface, "X");
                assert_eq!(names, vec!["id"]);
            }
            other => panic!("expected DuplicateProperties, got {other:?}"),
        }
    }

    #[test]
    fn test_soft_failure_returns_none() {
        // Valid JSON whose root is not an object: the engine rejects it, and
        // the adapter converts that into a logged None.
        assert_eq!(infer_interface("[1, 2, 3]", "X").unwrap(), None);
    }
}
