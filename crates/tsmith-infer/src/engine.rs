//! Structural JSON-to-declaration inference engine.
//!
//! The engine is a black box to the adapter: it receives serialized JSON and
//! returns TypeScript type declarations, nothing else. The bundled
//! [`StructuralEngine`] emits one interface per object shape with
//! union-widening and enum-inference disabled, so structurally different
//! array elements become broader types rather than spurious unions.

use std::collections::{BTreeSet, VecDeque};

use serde_json::{Map, Value};

use crate::InferError;

/// A JSON-to-TypeScript type-declaration generator.
pub trait InferenceEngine {
    /// Emits type declarations (no runtime code) for the given JSON text,
    /// naming the root declaration `root_name`.
    fn emit_declarations(&self, root_name: &str, json: &str) -> Result<String, InferError>;
}

/// The default engine: one interface per object node, breadth-first, with
/// nested interfaces named by PascalCasing the owning key.
#[derive(Debug, Clone, Copy, Default)]
pub struct StructuralEngine;

impl InferenceEngine for StructuralEngine {
    fn emit_declarations(&self, root_name: &str, json: &str) -> Result<String, InferError> {
        let value: Value =
            serde_json::from_str(json).map_err(|e| InferError::Engine(e.to_string()))?;

        let root = match value {
            Value::Object(map) => map,
            other => {
                return Err(InferError::Engine(format!(
                    "root sample must be an object, found {}",
                    json_kind(&other)
                )))
            }
        };

        let mut emitter = Emitter::default();
        emitter.enqueue(root_name.to_string(), root);
        emitter.drain()
    }
}

#[derive(Default)]
struct Emitter {
    queue: VecDeque<(String, Map<String, Value>)>,
    used_names: BTreeSet<String>,
    output: String,
}

impl Emitter {
    fn enqueue(&mut self, name: String, map: Map<String, Value>) -> String {
        let name = self.unique_name(name);
        self.queue.push_back((name.clone(), map));
        name
    }

    fn unique_name(&mut self, base: String) -> String {
        let mut candidate = base.clone();
        let mut counter = 2;
        while !self.used_names.insert(candidate.clone()) {
            candidate = format!("{base}{counter}");
            counter += 1;
        }
        candidate
    }

    fn drain(mut self) -> Result<String, InferError> {
        while let Some((name, map)) = self.queue.pop_front() {
            if !self.output.is_empty() {
                self.output.push('\n');
            }
            self.output.push_str(&format!("export interface {name} {{\n"));
            // Collect first to keep borrowck happy while enqueueing children.
            let fields: Vec<(String, Value)> =
                map.into_iter().collect();
            for (key, child) in fields {
                let ty = self.type_of(&key, child);
                self.output.push_str(&format!("  {key}: {ty};\n"));
            }
            self.output.push_str("}\n");
        }
        Ok(self.output)
    }

    fn type_of(&mut self, key: &str, value: Value) -> String {
        match value {
            Value::Null => "null".to_string(),
            Value::Bool(_) => "boolean".to_string(),
            Value::Number(_) => "number".to_string(),
            Value::String(_) => "string".to_string(),
            Value::Object(map) => self.enqueue(to_pascal_case(key), map),
            Value::Array(items) => format!("{}[]", self.element_type_of(key, items)),
        }
    }

    /// Element type of an array: a single primitive kind stays precise, any
    /// mix widens to `any`, and object elements merge into one interface.
    fn element_type_of(&mut self, key: &str, items: Vec<Value>) -> String {
        if items.is_empty() {
            return "any".to_string();
        }

        if items.iter().all(|v| v.is_object()) {
            let mut merged = Map::new();
            for item in items {
                if let Value::Object(map) = item {
                    for (k, v) in map {
                        merged.entry(k).or_insert(v);
                    }
                }
            }
            return self.enqueue(format!("{}Item", to_pascal_case(key)), merged);
        }

        let kinds: BTreeSet<&'static str> = items.iter().map(json_kind).collect();
        if kinds.len() == 1 && !matches!(items[0], Value::Array(_)) {
            match items.into_iter().next() {
                Some(first) => self.type_of(key, first),
                None => "any".to_string(),
            }
        } else {
            "any".to_string()
        }
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// PascalCases a key by splitting on non-alphanumeric characters and
/// uppercasing the first letter of each segment. The rest of a segment is
/// kept as-is, so an all-caps token survives in its original casing.
pub(crate) fn to_pascal_case(key: &str) -> String {
    let mut result = String::with_capacity(key.len());
    for segment in key.split(|c: char| !c.is_alphanumeric()) {
        let mut chars = segment.chars();
        if let Some(first) = chars.next() {
            result.extend(first.to_uppercase());
            result.push_str(chars.as_str());
        }
    }
    if result.is_empty() {
        result.push_str("Unnamed");
    }
    result
}

#[cfg(test)]
mod tests {
    use super::*;

    fn emit(json: &str) -> String {
        StructuralEngine
            .emit_declarations("Sample", json)
            .unwrap()
    }

    #[test]
    fn test_primitive_fields() {
        let out = emit(r#"{"id": "u_1", "age": 29, "active": true, "note": null}"#);
        assert!(out.contains("export interface Sample {"));
        assert!(out.contains("  id: string;"));
        assert!(out.contains("  age: number;"));
        assert!(out.contains("  active: boolean;"));
        assert!(out.contains("  note: null;"));
    }

    #[test]
    fn test_array_of_strings() {
        let out = emit(r#"{"roles": ["admin", "user"]}"#);
        assert!(out.contains("  roles: string[];"));
    }

    #[test]
    fn test_mixed_array_widens() {
        let out = emit(r#"{"values": [1, "two"]}"#);
        assert!(out.contains("  values: any[];"));
    }

    #[test]
    fn test_empty_array() {
        let out = emit(r#"{"items": []}"#);
        assert!(out.contains("  items: any[];"));
    }

    #[test]
    fn test_nested_object_gets_named_interface() {
        let out = emit(r#"{"profile": {"bio": "hi"}}"#);
        assert!(out.contains("  profile: Profile;"));
        assert!(out.contains("export interface Profile {"));
        assert!(out.contains("  bio: string;"));
    }

    #[test]
    fn test_array_of_objects_merges_shapes() {
        let out = emit(r#"{"badges": [{"id": 1}, {"id": 2, "label": "x"}]}"#);
        assert!(out.contains("  badges: BadgesItem[];"));
        assert!(out.contains("export interface BadgesItem {"));
        assert!(out.contains("  id: number;"));
        assert!(out.contains("  label: string;"));
    }

    #[test]
    fn test_name_collision_suffixed() {
        let out = emit(r#"{"info": {"a": 1}, "more": {"info": {"b": 2}}}"#);
        assert!(out.contains("export interface Info {"));
        assert!(out.contains("export interface Info2 {"));
    }

    #[test]
    fn test_non_object_root_rejected() {
        let err = StructuralEngine
            .emit_declarations("Sample", "[1, 2]")
            .unwrap_err();
        assert!(matches!(err, InferError::Engine(_)));
    }

    #[test]
    fn test_pascal_case() {
        assert_eq!(to_pascal_case("user_profile"), "UserProfile");
        assert_eq!(to_pascal_case("badges"), "Badges");
        assert_eq!(to_pascal_case("user__PREFIX__id"), "UserPREFIXId");
    }
}
