//! Static analysis of existing TypeScript interface declarations.
//!
//! This is a deliberately small line scanner, not a TypeScript parser: it
//! recovers enough structure (names, optionality, element types, unions,
//! string-literal enums, one-line JSDoc) for JSON Schema mapping and for the
//! duplicate-property consistency pass. Constructs it does not understand are
//! skipped rather than rejected.

use crate::{ParsedInterface, ParsedProperty, PropertyKind};

/// Parses every `export interface` block in the given source text.
///
/// Interfaces appear in source order; malformed or foreign lines inside a
/// block are ignored.
pub fn parse_interfaces(source: &str) -> Vec<ParsedInterface> {
    let mut interfaces = Vec::new();
    let mut current: Option<ParsedInterface> = None;
    let mut pending_doc: Option<String> = None;
    let mut depth = 0usize;

    for line in source.lines() {
        let trimmed = line.trim();

        if current.is_none() {
            if let Some(header) = parse_interface_header(trimmed) {
                current = Some(header);
                depth = 1;
                pending_doc = None;
            }
            continue;
        }

        // Inside an interface body.
        if let Some(doc) = parse_jsdoc_line(trimmed) {
            pending_doc = Some(doc);
            continue;
        }

        depth += trimmed.matches('{').count();
        depth = depth.saturating_sub(trimmed.matches('}').count());
        if depth == 0 {
            if let Some(iface) = current.take() {
                interfaces.push(iface);
            }
            pending_doc = None;
            continue;
        }
        if depth > 1 {
            // Inside an inline object type; property lines there belong to no
            // named interface and are skipped.
            continue;
        }

        if let Some(mut prop) = parse_property_line(trimmed) {
            prop.js_doc = pending_doc.take();
            if let Some(iface) = current.as_mut() {
                iface.properties.push(prop);
            }
        } else {
            pending_doc = None;
        }
    }

    interfaces
}

/// Parses `export interface Name {` / `export interface Name<T, U> {`.
fn parse_interface_header(line: &str) -> Option<ParsedInterface> {
    let rest = line.strip_prefix("export interface ")?;
    let brace = rest.find('{')?;
    let decl = rest[..brace].trim();

    let (name, type_parameters) = match decl.split_once('<') {
        Some((name, params)) => {
            let params = params.strip_suffix('>').unwrap_or(params);
            let list = params
                .split(',')
                .map(|p| p.trim().to_string())
                .filter(|p| !p.is_empty())
                .collect();
            (name.trim(), list)
        }
        None => (decl, vec![]),
    };

    if name.is_empty() || !name.chars().all(|c| c.is_alphanumeric() || c == '_') {
        return None;
    }

    Some(ParsedInterface {
        name: name.to_string(),
        properties: vec![],
        type_parameters,
    })
}

/// Recognizes a one-line `/** ... */` JSDoc comment.
fn parse_jsdoc_line(line: &str) -> Option<String> {
    let inner = line.strip_prefix("/**")?.strip_suffix("*/")?;
    Some(inner.trim().to_string())
}

/// Parses a `name: type;` / `name?: type;` property line.
fn parse_property_line(line: &str) -> Option<ParsedProperty> {
    let line = line.trim_end_matches(',').trim_end_matches(';');
    if line.starts_with("//") || line.is_empty() {
        return None;
    }

    let colon = line.find(':')?;
    let (raw_name, raw_type) = (line[..colon].trim(), line[colon + 1..].trim());

    let (name, optional) = match raw_name.strip_suffix('?') {
        Some(name) => (name.trim(), true),
        None => (raw_name, false),
    };
    let name = name.trim_matches('"').trim_matches('\'');
    if name.is_empty()
        || !name
            .chars()
            .all(|c| c.is_alphanumeric() || c == '_' || c == '-' || c == '$')
    {
        return None;
    }
    if raw_type.is_empty() || raw_type.ends_with('{') {
        return None;
    }

    let mut prop = ParsedProperty::new(name, classify_type(raw_type));
    prop.optional = optional;

    match prop.kind {
        PropertyKind::Array => {
            prop.element_type = Some(element_type_of(raw_type));
        }
        PropertyKind::Union => {
            prop.union_types = split_union(raw_type);
        }
        PropertyKind::Enum => {
            prop.enum_values = split_union(raw_type)
                .into_iter()
                .map(|v| v.trim_matches('"').trim_matches('\'').to_string())
                .collect();
        }
        _ => {}
    }

    Some(prop)
}

fn classify_type(ty: &str) -> PropertyKind {
    if ty.contains('|') {
        let members = split_union(ty);
        let all_literals = members
            .iter()
            .all(|m| m.starts_with('"') || m.starts_with('\''));
        return if all_literals {
            PropertyKind::Enum
        } else {
            PropertyKind::Union
        };
    }
    if ty.ends_with("[]") || ty.starts_with("Array<") {
        return PropertyKind::Array;
    }
    match ty {
        "string" => PropertyKind::String,
        "number" => PropertyKind::Number,
        "boolean" => PropertyKind::Boolean,
        other => PropertyKind::Reference(other.to_string()),
    }
}

fn element_type_of(ty: &str) -> String {
    if let Some(elem) = ty.strip_suffix("[]") {
        return elem.to_string();
    }
    ty.strip_prefix("Array<")
        .and_then(|s| s.strip_suffix('>'))
        .unwrap_or(ty)
        .to_string()
}

fn split_union(ty: &str) -> Vec<String> {
    ty.split('|').map(|p| p.trim().to_string()).collect()
}
