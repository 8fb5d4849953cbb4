//! TypeScript base pass - infers and merges interface declarations.

use tracing::warn;
use tsmith_infer::infer_interface;

use crate::mutate::SourceFile;
use crate::pass::{GenerationContext, Pass};
use crate::{CodegenError, Project};

/// Base pass that infers TypeScript interfaces for every endpoint sample.
///
/// This pass merges inferred declarations into `<fileBase>.types.ts`. The
/// generated file also carries the `ApiResponse<T>` wrapper and the
/// `RetryOptions` shape that helper modules import type-only.
pub struct TypesPass;

impl Pass for TypesPass {
    fn name(&self) -> &'static str {
        "types"
    }

    fn run(&self, project: &Project, ctx: &mut GenerationContext) -> Result<(), CodegenError> {
        let path = project.types_file();
        let mut file = SourceFile::open(ctx.get_file(&path), &types_scaffold(project));

        if let Some(config) = &project.client {
            for endpoint in &config.endpoints {
                let type_name = response_type_name(&endpoint.name);
                let Some(sample) = &endpoint.response_sample else {
                    warn!(
                        target: "codegen",
                        endpoint = %endpoint.name,
                        "no response sample, typing response as unknown"
                    );
                    continue;
                };

                let json = serde_json::to_string(sample)
                    .map_err(|e| CodegenError::Custom(e.to_string()))?;
                if let Some(text) = infer_interface(&json, &type_name)? {
                    ensure_interface_blocks(&mut file, &text);
                    ctx.set_metadata(format!("type:{type_name}"), "true");
                }
            }

            // Mark endpoints for other passes.
            for endpoint in &config.endpoints {
                ctx.set_metadata(format!("endpoint:{}", function_name(&endpoint.name)), "true");
            }
        }

        ctx.set_file(path, file.into_text());
        Ok(())
    }
}

/// Base scaffold of a types file: the response wrapper and retry options
/// shapes that companion helper modules import type-only.
pub fn types_scaffold(project: &Project) -> String {
    format!(
        r#"// Generated types for {base}

export interface ApiResponse<T> {{
  status: number;
  data: T;
}}

export interface RetryOptions {{
  enabled: boolean;
  maxAttempts?: number;
  initialDelayMs?: number;
  multiplier?: number;
  retryStatuses?: number[];
  method?: string;
  idempotentMethods?: string[];
}}
"#,
        base = project.file_base
    )
}

/// Merges every `export interface` block of an inferred declaration text into
/// the file, skipping blocks whose interface name is already present.
pub fn ensure_interface_blocks(file: &mut SourceFile, text: &str) {
    for (name, block) in split_interface_blocks(text) {
        file.ensure_interface(&name, &block);
    }
}

/// Splits declaration text into (interface name, block text) pairs.
fn split_interface_blocks(text: &str) -> Vec<(String, String)> {
    let mut blocks = vec![];
    let mut current: Option<(String, String)> = None;

    for line in text.lines() {
        if let Some(rest) = line.strip_prefix("export interface ") {
            let name = rest
                .split(|c: char| c == ' ' || c == '<' || c == '{')
                .next()
                .unwrap_or("")
                .to_string();
            current = Some((name, String::new()));
        }
        if let Some((_, block)) = current.as_mut() {
            block.push_str(line);
            block.push('\n');
        }
        if line.trim_end() == "}" {
            if let Some(done) = current.take() {
                blocks.push(done);
            }
        }
    }
    blocks
}

/// Derives the generated client function name for an endpoint
/// (`GetUser` → `getUser`).
pub fn function_name(endpoint_name: &str) -> String {
    to_camel_case(endpoint_name)
}

/// Derives the response interface name for an endpoint
/// (`GetUser` → `GetUserResponse`).
pub fn response_type_name(endpoint_name: &str) -> String {
    format!("{}Response", to_pascal_case(endpoint_name))
}

/// Converts a string to camelCase.
pub fn to_camel_case(s: &str) -> String {
    let snake = to_snake_case(s);
    let mut result = String::new();
    let mut capitalize_next = false;

    for c in snake.chars() {
        if c == '_' || c == '-' {
            capitalize_next = true;
        } else if capitalize_next {
            result.extend(c.to_uppercase());
            capitalize_next = false;
        } else {
            result.push(c);
        }
    }

    result
}

/// Converts a string to PascalCase.
pub fn to_pascal_case(s: &str) -> String {
    let camel = to_camel_case(s);
    let mut chars = camel.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().collect::<String>() + chars.as_str(),
        None => camel,
    }
}

/// Converts a string to snake_case.
pub fn to_snake_case(s: &str) -> String {
    let mut result = String::new();
    for (i, c) in s.chars().enumerate() {
        if c.is_uppercase() {
            if i > 0 {
                result.push('_');
            }
            result.extend(c.to_lowercase());
        } else {
            result.push(c);
        }
    }
    result
}
