//! Duplicate key detection and prefix rewriting for JSON value trees.
//!
//! A flattened type-inference pass over a JSON sample collides when the same
//! property name appears in more than one object. This crate finds those
//! names and rewrites each occurrence to `<parentKey>__PREFIX__<key>`, scoped
//! by the key the enclosing object is held under, so inference sees a
//! collision-free tree. The adapter strips the prefixes back out of the
//! emitted declarations afterwards.

use std::collections::{BTreeMap, BTreeSet};

use serde_json::{Map, Value};

/// The delimiter inserted between the parent label and the original key.
pub const KEY_DELIMITER: &str = "__PREFIX__";

/// The delimiter's core token, which must stay recognizable even after a
/// downstream identifier pass title-cases it (`Prefix`).
pub const DELIMITER_CORE: &str = "PREFIX";

/// Strips everything up to and including the last delimiter occurrence,
/// recovering the original bare key from a prefixed one.
pub fn strip_prefix(key: &str) -> &str {
    match key.rfind(KEY_DELIMITER) {
        Some(pos) => &key[pos + KEY_DELIMITER.len()..],
        None => key,
    }
}

/// Finds property names that occur as an own-key on two or more distinct
/// object nodes anywhere in the tree.
///
/// Siblings, cousins and ancestor/descendant repetitions all count the same;
/// a key used once in a single object never does. Literal duplicate keys
/// within one object are a structural-validation concern, not detected here.
pub fn find_duplicate_keys(value: &Value) -> BTreeSet<String> {
    let mut counts: BTreeMap<&str, usize> = BTreeMap::new();
    count_own_keys(value, &mut counts);
    counts
        .into_iter()
        .filter(|(_, n)| *n > 1)
        .map(|(k, _)| k.to_string())
        .collect()
}

fn count_own_keys<'a>(value: &'a Value, counts: &mut BTreeMap<&'a str, usize>) {
    match value {
        Value::Object(map) => {
            for (key, child) in map {
                *counts.entry(key.as_str()).or_insert(0) += 1;
                count_own_keys(child, counts);
            }
        }
        Value::Array(items) => {
            for item in items {
                count_own_keys(item, counts);
            }
        }
        _ => {}
    }
}

/// Rebuilds the tree with every duplicated key renamed to
/// `<parentKey>__PREFIX__<key>`.
///
/// The parent label is the key the object itself is held under, whether
/// directly or as an array element; top-level keys have no enclosing key and
/// are left alone. Children are renamed against their own nearest parent, not
/// an ancestor's. Every introduced key is recorded into `ledger` when one is
/// supplied. The input is not mutated.
pub fn prefix_duplicate_keys(
    value: &Value,
    duplicates: &BTreeSet<String>,
    mut ledger: Option<&mut BTreeSet<String>>,
) -> Value {
    rewrite(value, None, duplicates, &mut ledger)
}

fn rewrite(
    value: &Value,
    parent_label: Option<&str>,
    duplicates: &BTreeSet<String>,
    ledger: &mut Option<&mut BTreeSet<String>>,
) -> Value {
    match value {
        Value::Object(map) => {
            let mut rebuilt = Map::with_capacity(map.len());
            for (key, child) in map {
                let renamed = match parent_label {
                    Some(parent) if duplicates.contains(key) => {
                        let prefixed = format!("{parent}{KEY_DELIMITER}{key}");
                        if let Some(ledger) = ledger.as_deref_mut() {
                            ledger.insert(prefixed.clone());
                        }
                        prefixed
                    }
                    _ => key.clone(),
                };
                // Recurse under the bare key so nested objects take their own
                // nearest parent's label.
                rebuilt.insert(renamed, rewrite(child, Some(key), duplicates, ledger));
            }
            Value::Object(rebuilt)
        }
        Value::Array(items) => Value::Array(
            items
                .iter()
                .map(|item| rewrite(item, parent_label, duplicates, ledger))
                .collect(),
        ),
        other => other.clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn prefixed(value: &Value) -> (Value, BTreeSet<String>) {
        let duplicates = find_duplicate_keys(value);
        let mut ledger = BTreeSet::new();
        let rewritten = prefix_duplicate_keys(value, &duplicates, Some(&mut ledger));
        (rewritten, ledger)
    }

    #[test]
    fn test_no_accidental_collisions() {
        let value = json!({ "a": { "x": 1 }, "b": { "y": 2 }, "c": { "z": 3 } });
        assert!(find_duplicate_keys(&value).is_empty());
    }

    #[test]
    fn test_multi_level_duplication() {
        let value = json!({
            "user": { "id": 1, "profile": { "id": "p-1", "status": "active" } },
            "metadata": { "status": "ok", "timestamp": "t" }
        });
        let duplicates = find_duplicate_keys(&value);
        let expected: BTreeSet<String> =
            ["id", "status"].into_iter().map(String::from).collect();
        assert_eq!(duplicates, expected);
    }

    #[test]
    fn test_prefixing_uses_nearest_parent() {
        let value = json!({
            "user": { "id": 1, "profile": { "id": "p-1" } }
        });
        let (rewritten, ledger) = prefixed(&value);

        let user = rewritten.get("user").unwrap();
        assert!(user.get("user__PREFIX__id").is_some());
        let profile = user.get("profile").unwrap();
        assert!(profile.get("profile__PREFIX__id").is_some());

        let expected: BTreeSet<String> = ["user__PREFIX__id", "profile__PREFIX__id"]
            .into_iter()
            .map(String::from)
            .collect();
        assert_eq!(ledger, expected);
    }

    #[test]
    fn test_array_elements_take_owning_key_label() {
        let value = json!({
            "badges": [ { "id": 1 }, { "id": 2 } ],
            "owner": { "id": 3 }
        });
        let (rewritten, _) = prefixed(&value);

        for badge in rewritten.get("badges").unwrap().as_array().unwrap() {
            assert!(badge.get("badges__PREFIX__id").is_some());
            assert!(badge.get("id").is_none());
        }
        assert!(rewritten["owner"].get("owner__PREFIX__id").is_some());
    }

    #[test]
    fn test_root_keys_never_renamed() {
        let value = json!({ "id": 1, "user": { "id": 2 } });
        let (rewritten, _) = prefixed(&value);
        assert!(rewritten.get("id").is_some());
        assert!(rewritten["user"].get("user__PREFIX__id").is_some());
    }

    #[test]
    fn test_arrays_of_primitives_untouched() {
        let value = json!({ "tags": ["a", "b"], "more": { "tags": [1, 2] } });
        let (rewritten, _) = prefixed(&value);
        assert_eq!(rewritten["more"]["more__PREFIX__tags"], json!([1, 2]));
        assert_eq!(rewritten["tags"], json!(["a", "b"]));
    }

    #[test]
    fn test_empty_containers_pass_through() {
        let value = json!({ "empty": {}, "list": [] });
        assert!(find_duplicate_keys(&value).is_empty());
        let (rewritten, ledger) = prefixed(&value);
        assert_eq!(rewritten, value);
        assert!(ledger.is_empty());
    }

    #[test]
    fn test_dedup_idempotence() {
        let value = json!({
            "user": { "id": 1, "profile": { "id": "p-1", "status": "x" } },
            "metadata": { "status": "ok" },
            "items": [ { "id": 9 } ]
        });
        let (rewritten, _) = prefixed(&value);
        assert!(find_duplicate_keys(&rewritten).is_empty());
    }

    #[test]
    fn test_ledger_reversibility() {
        let value = json!({
            "user": { "id": 1 },
            "group": { "id": 2, "name": "g" },
            "owner": { "name": "o" }
        });
        let (_, ledger) = prefixed(&value);
        let duplicates = find_duplicate_keys(&value);

        let recovered: BTreeSet<String> = ledger
            .iter()
            .map(|entry| strip_prefix(entry).to_string())
            .collect();
        assert_eq!(recovered, duplicates);
    }

    #[test]
    fn test_strip_prefix() {
        assert_eq!(strip_prefix("user__PREFIX__id"), "id");
        assert_eq!(strip_prefix("a__PREFIX__b__PREFIX__c"), "c");
        assert_eq!(strip_prefix("plain"), "plain");
    }
}
