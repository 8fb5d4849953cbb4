//! JSON Schema pass: `<fileBase>.schemas.json` from the generated types file.

use serde_json::{json, Map, Value};
use tsmith_model::parse::parse_interfaces;
use tsmith_model::{ParsedInterface, ParsedProperty, PropertyKind};

use crate::pass::{GenerationContext, Pass};
use crate::{CodegenError, Project};

/// Schema pass that maps every non-generic interface of the types file to a
/// JSON Schema definition.
///
/// Unlike the append-style helper files, the schema document is fully derived
/// from the types file on each run, so it is rewritten wholesale; determinism
/// comes from the types file itself.
pub struct SchemaPass;

impl Pass for SchemaPass {
    fn name(&self) -> &'static str {
        "schema"
    }

    fn depends_on(&self) -> &[&'static str] {
        // The express pass contributes webhook payload interfaces to the
        // types file; when present it must run first. A missing dependency is
        // fine (types-only pipelines).
        &["types", "express"]
    }

    fn run(&self, project: &Project, ctx: &mut GenerationContext) -> Result<(), CodegenError> {
        let Some(types) = ctx.get_file(&project.types_file()) else {
            return Ok(());
        };

        let mut definitions = Map::new();
        for interface in parse_interfaces(types) {
            // Generic interfaces (the ApiResponse<T> wrapper) have no closed
            // schema and are skipped.
            if !interface.type_parameters.is_empty() {
                continue;
            }
            definitions.insert(interface.name.clone(), interface_schema(&interface));
        }

        let document = json!({
            "$schema": "http://json-schema.org/draft-07/schema#",
            "definitions": Value::Object(definitions),
        });
        let rendered = serde_json::to_string_pretty(&document)
            .map_err(|e| CodegenError::Custom(e.to_string()))?;

        ctx.set_file(project.schemas_file(), rendered + "\n");
        ctx.set_metadata("has:schema", "true");
        Ok(())
    }
}

fn interface_schema(interface: &ParsedInterface) -> Value {
    let mut properties = Map::new();
    for prop in &interface.properties {
        properties.insert(prop.name.clone(), property_schema(prop));
    }

    let required: Vec<&str> = interface
        .required_properties()
        .map(|p| p.name.as_str())
        .collect();

    json!({
        "type": "object",
        "properties": Value::Object(properties),
        "required": required,
        "additionalProperties": false,
    })
}

fn property_schema(prop: &ParsedProperty) -> Value {
    match &prop.kind {
        PropertyKind::String => json!({"type": "string"}),
        PropertyKind::Number => json!({"type": "number"}),
        PropertyKind::Boolean => json!({"type": "boolean"}),
        PropertyKind::Array => {
            let items = prop
                .element_type
                .as_deref()
                .map(type_name_schema)
                .unwrap_or(json!({}));
            json!({"type": "array", "items": items})
        }
        PropertyKind::Enum => json!({"type": "string", "enum": prop.enum_values}),
        PropertyKind::Union => {
            let members: Vec<Value> = prop
                .union_types
                .iter()
                .map(|m| type_name_schema(m))
                .collect();
            json!({"anyOf": members})
        }
        PropertyKind::Reference(name) => type_name_schema(name),
    }
}

fn type_name_schema(name: &str) -> Value {
    match name {
        "string" => json!({"type": "string"}),
        "number" => json!({"type": "number"}),
        "boolean" => json!({"type": "boolean"}),
        "null" => json!({"type": "null"}),
        "any" | "unknown" => json!({}),
        reference => json!({"$ref": format!("#/definitions/{reference}")}),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tsmith_model::ClientConfig;

    fn run() -> Value {
        let config: ClientConfig = serde_json::from_value(json!({
            "baseUrl": "https://api.example.com",
            "endpoints": [
                {"name": "GetUser", "path": "/users/{id}",
                 "responseSample": {
                     "id": "u_1",
                     "age": 29,
                     "roles": ["admin"],
                     "profile": {"bio": "hi"}
                 }}
            ]
        }))
        .unwrap();

        let mut pm = crate::pass::PassManager::new();
        pm.add(crate::typescript::TypesPass);
        pm.add(SchemaPass);
        let files = pm.run(&Project::for_client("petstore", config)).unwrap();
        serde_json::from_str(files.get("petstore.schemas.json").unwrap()).unwrap()
    }

    #[test]
    fn test_definitions_for_inferred_interfaces() {
        let doc = run();
        let defs = &doc["definitions"];

        let user = &defs["GetUserResponse"];
        assert_eq!(user["type"], "object");
        assert_eq!(user["properties"]["id"]["type"], "string");
        assert_eq!(user["properties"]["age"]["type"], "number");
        assert_eq!(user["properties"]["roles"]["type"], "array");
        assert_eq!(user["properties"]["roles"]["items"]["type"], "string");
        assert_eq!(
            user["properties"]["profile"]["$ref"],
            "#/definitions/Profile"
        );

        assert_eq!(defs["Profile"]["properties"]["bio"]["type"], "string");
    }

    #[test]
    fn test_generic_wrapper_skipped() {
        let doc = run();
        assert!(doc["definitions"].get("ApiResponse").is_none());
        // The non-generic RetryOptions shape does get a definition.
        assert!(doc["definitions"].get("RetryOptions").is_some());
    }

    #[test]
    fn test_required_excludes_optional() {
        let doc = run();
        let retry = &doc["definitions"]["RetryOptions"];
        let required: Vec<&str> = retry["required"]
            .as_array()
            .unwrap()
            .iter()
            .map(|v| v.as_str().unwrap())
            .collect();
        assert_eq!(required, vec!["enabled"]);
    }
}
