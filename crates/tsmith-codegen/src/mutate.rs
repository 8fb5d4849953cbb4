//! Idempotent mutation of shared TypeScript output files.
//!
//! Registries, routers and helper modules are living artifacts: several
//! generation passes (and several generation runs) append to the same file
//! over time. Every mutation here follows the same protocol: look the target
//! symbol up by a stable key (module specifier, function name, route
//! signature, literal statement); if present, skip or merge; if absent,
//! append. "Symbol already exists" is the expected steady state and is never
//! an error.
//!
//! The mutation substrate is line scanning over the full file text, which is
//! sufficient for the regular shape of generated TypeScript. Callers read the
//! whole file, mutate in memory, and write the whole file back.

use tracing::debug;

/// An import declaration requirement for a generated file.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ImportSpec {
    /// Exact module specifier (e.g. `./petstore.types`).
    pub module: String,
    /// Named imports to carry.
    pub named: Vec<String>,
    /// Default import binding, if any.
    pub default_import: Option<String>,
    /// Namespace import binding (`* as alias`), if any.
    pub namespace: Option<String>,
    /// Whether this is a type-only import.
    pub type_only: bool,
}

impl ImportSpec {
    /// A value import of named symbols.
    pub fn named(module: impl Into<String>, symbols: &[&str]) -> Self {
        Self {
            module: module.into(),
            named: symbols.iter().map(|s| s.to_string()).collect(),
            ..Self::default()
        }
    }

    /// A type-only import of named symbols.
    pub fn type_only(module: impl Into<String>, symbols: &[&str]) -> Self {
        Self {
            type_only: true,
            ..Self::named(module, symbols)
        }
    }

    /// A default import (`import express from "express"`).
    pub fn default_import(module: impl Into<String>, binding: impl Into<String>) -> Self {
        Self {
            module: module.into(),
            default_import: Some(binding.into()),
            ..Self::default()
        }
    }

    fn render(&self) -> String {
        let mut head = String::from("import ");
        if self.type_only {
            head.push_str("type ");
        }

        let mut bindings: Vec<String> = vec![];
        if let Some(default) = &self.default_import {
            bindings.push(default.clone());
        }
        if let Some(namespace) = &self.namespace {
            bindings.push(format!("* as {namespace}"));
        }
        if !self.named.is_empty() {
            bindings.push(format!("{{ {} }}", self.named.join(", ")));
        }

        format!("{head}{} from \"{}\";", bindings.join(", "), self.module)
    }
}

/// A shared output file being incrementally populated.
///
/// States: Absent (no prior content) → Created (base scaffold written) →
/// Populated (N symbols present). There is no terminal state; every
/// generation run is a potential transition back into the file.
#[derive(Debug, Clone)]
pub struct SourceFile {
    text: String,
    created: bool,
}

impl SourceFile {
    /// Opens existing content, or writes the base scaffold when absent.
    pub fn open(existing: Option<&str>, scaffold: &str) -> Self {
        match existing {
            Some(text) => Self {
                text: text.to_string(),
                created: false,
            },
            None => Self {
                text: scaffold.to_string(),
                created: true,
            },
        }
    }

    /// Whether this call created the file from scaffold.
    pub fn was_created(&self) -> bool {
        self.created
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn into_text(self) -> String {
        self.text
    }

    /// Ensures an import declaration satisfying `spec` exists.
    ///
    /// Looks up existing declarations by exact module specifier. A compatible
    /// declaration (same type-only-ness) absorbs the missing named symbols; a
    /// declaration with the opposite type-only flag is left untouched and a
    /// second, separate declaration is added instead, preserving the existing
    /// code's semantics. Returns true if the file changed.
    pub fn ensure_import(&mut self, spec: &ImportSpec) -> bool {
        // Namespace bindings cannot share a declaration with named imports,
        // so they get their own declaration keyed by (module, alias).
        if let Some(ns) = &spec.namespace {
            let binding = format!("* as {ns}");
            let present = self
                .text
                .lines()
                .any(|l| is_import_of(l, &spec.module) && l.contains(&binding));
            if present {
                debug!(target: "mutate", module = %spec.module, "namespace import present, skipping");
                return false;
            }
            self.insert_import_line(&spec.render());
            return true;
        }

        let lines: Vec<&str> = self.text.lines().collect();
        let matching: Vec<usize> = lines
            .iter()
            .enumerate()
            .filter(|(_, line)| is_import_of(line, &spec.module))
            .map(|(i, _)| i)
            .collect();

        let compatible = matching.iter().copied().find(|&i| {
            import_is_type_only(lines[i]) == spec.type_only
                && (spec.named.is_empty() || namespace_binding_of(lines[i]).is_none())
        });

        let Some(line_idx) = compatible else {
            // No declaration with the right flag: add a fresh one, after any
            // existing imports for stable layout.
            let rendered = spec.render();
            if matching.is_empty() {
                debug!(target: "mutate", module = %spec.module, "adding import declaration");
            } else {
                debug!(
                    target: "mutate",
                    module = %spec.module,
                    "type-only flag differs from existing import, adding separate declaration"
                );
            }
            self.insert_import_line(&rendered);
            return true;
        };

        let existing = lines[line_idx];
        let existing_named = named_imports_of(existing);
        let missing: Vec<&String> = spec
            .named
            .iter()
            .filter(|name| !existing_named.iter().any(|e| e == *name))
            .collect();

        let needs_default = spec
            .default_import
            .as_ref()
            .filter(|binding| !has_default_binding(existing, binding))
            .cloned();

        if missing.is_empty() && needs_default.is_none() {
            debug!(target: "mutate", module = %spec.module, "import already satisfied, skipping");
            return false;
        }

        let mut merged_named = existing_named;
        merged_named.extend(missing.into_iter().cloned());

        let merged = ImportSpec {
            module: spec.module.clone(),
            named: merged_named,
            default_import: default_binding_of(existing).or(needs_default),
            namespace: namespace_binding_of(existing),
            type_only: spec.type_only,
        };

        let mut rebuilt: Vec<String> = lines.iter().map(|l| l.to_string()).collect();
        rebuilt[line_idx] = merged.render();
        self.text = rebuilt.join("\n");
        if !self.text.ends_with('\n') {
            self.text.push('\n');
        }
        true
    }

    /// Ensures a function with the given generated name exists, appending
    /// `source` when absent. Returns true if the file changed.
    pub fn ensure_function(&mut self, name: &str, source: &str) -> bool {
        if self.has_function(name) {
            debug!(target: "mutate", function = name, "symbol already present, skipping");
            return false;
        }
        self.append_block(source);
        true
    }

    /// Whether a function with this generated name is already declared.
    pub fn has_function(&self, name: &str) -> bool {
        let marker = format!("function {name}");
        let mut rest = self.text.as_str();
        while let Some(pos) = rest.find(&marker) {
            // The name must end at the match, not continue into a longer
            // identifier (generic functions declare `name<T>(`).
            let after = rest[pos + marker.len()..].chars().next();
            if matches!(after, None | Some('(') | Some('<') | Some(' ')) {
                return true;
            }
            rest = &rest[pos + marker.len()..];
        }
        self.text.contains(&format!("const {name} = "))
    }

    /// Ensures a route registration for (method, path) exists. Returns true
    /// if the file changed.
    pub fn ensure_route(&mut self, method: &str, path: &str, source: &str) -> bool {
        let marker = format!("router.{}(\"{}\"", method.to_lowercase(), path);
        if self.text.contains(&marker) {
            debug!(target: "mutate", method, path, "route already registered, skipping");
            return false;
        }
        self.insert_before_default_export(source);
        true
    }

    /// Ensures the literal statement exists somewhere in the file. Returns
    /// true if the file changed.
    pub fn ensure_statement(&mut self, statement: &str) -> bool {
        if self.text.contains(statement.trim_end()) {
            debug!(target: "mutate", statement = statement.trim_end(), "statement present, skipping");
            return false;
        }
        if statement.trim_start().starts_with("export default") {
            self.append_block(statement);
        } else {
            self.insert_before_default_export(statement);
        }
        true
    }

    /// Ensures an `export interface <name>` block exists, appending the block
    /// text when absent. Returns true if the file changed.
    pub fn ensure_interface(&mut self, name: &str, block: &str) -> bool {
        let marker = format!("export interface {name} ");
        let generic_marker = format!("export interface {name}<");
        if self.text.contains(&marker) || self.text.contains(&generic_marker) {
            debug!(target: "mutate", interface = name, "interface already present, skipping");
            return false;
        }
        self.append_block(block);
        true
    }

    fn insert_import_line(&mut self, rendered: &str) {
        let mut lines: Vec<String> = self.text.lines().map(String::from).collect();
        let mut insert_pos = 0;

        // After leading comments/blank lines, and after the last import.
        for (i, line) in lines.iter().enumerate() {
            let trimmed = line.trim();
            if trimmed.is_empty() || trimmed.starts_with("//") {
                if insert_pos == i {
                    insert_pos = i + 1;
                }
            } else if trimmed.starts_with("import ") {
                insert_pos = i + 1;
            }
        }

        lines.insert(insert_pos, rendered.to_string());
        self.text = lines.join("\n");
        if !self.text.ends_with('\n') {
            self.text.push('\n');
        }
    }

    fn insert_before_default_export(&mut self, block: &str) {
        let mut lines: Vec<String> = self.text.lines().map(String::from).collect();
        let export_pos = lines
            .iter()
            .position(|l| l.trim_start().starts_with("export default"));

        match export_pos {
            Some(pos) => {
                for (offset, line) in block.trim_end().lines().enumerate() {
                    lines.insert(pos + offset, line.to_string());
                }
                self.text = lines.join("\n");
                if !self.text.ends_with('\n') {
                    self.text.push('\n');
                }
            }
            None => self.append_block(block),
        }
    }

    fn append_block(&mut self, block: &str) {
        if !self.text.is_empty() && !self.text.ends_with('\n') {
            self.text.push('\n');
        }
        if !self.text.is_empty() && !self.text.ends_with("\n\n") {
            self.text.push('\n');
        }
        self.text.push_str(block.trim_end());
        self.text.push('\n');
    }
}

fn is_import_of(line: &str, module: &str) -> bool {
    let trimmed = line.trim_start();
    trimmed.starts_with("import ")
        && (trimmed.contains(&format!("from \"{module}\""))
            || trimmed.contains(&format!("from '{module}'")))
}

fn import_is_type_only(line: &str) -> bool {
    line.trim_start().starts_with("import type ")
}

/// Named symbols inside the braces of an import line, in source order.
fn named_imports_of(line: &str) -> Vec<String> {
    let Some(open) = line.find('{') else {
        return vec![];
    };
    let Some(close) = line[open..].find('}').map(|i| open + i) else {
        return vec![];
    };
    line[open + 1..close]
        .split(',')
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect()
}

fn default_binding_of(line: &str) -> Option<String> {
    let trimmed = line.trim_start();
    let rest = trimmed
        .strip_prefix("import type ")
        .or_else(|| trimmed.strip_prefix("import "))?;
    let head: &str = rest.split("from").next()?.trim();
    let first = head.split(',').next()?.trim();
    if first.is_empty() || first.starts_with('{') || first.starts_with('*') {
        None
    } else {
        Some(first.to_string())
    }
}

fn has_default_binding(line: &str, binding: &str) -> bool {
    default_binding_of(line).as_deref() == Some(binding)
}

fn namespace_binding_of(line: &str) -> Option<String> {
    let star = line.find("* as ")?;
    let rest = &line[star + "* as ".len()..];
    let end = rest
        .find(|c: char| !c.is_alphanumeric() && c != '_' && c != '$')
        .unwrap_or(rest.len());
    Some(rest[..end].to_string())
}
