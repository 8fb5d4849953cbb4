//! API client pass for TypeScript.

use tsmith_model::{AuthScheme, Endpoint};

use crate::mutate::{ImportSpec, SourceFile};
use crate::pass::{GenerationContext, Pass};
use crate::typescript::base::{function_name, response_type_name};
use crate::{CodegenError, Project};

/// Client pass that generates a fetch-based API client.
///
/// This pass merges one async function per endpoint into
/// `<fileBase>.client.ts`. It depends on the `types` pass so that response
/// interfaces exist before they are imported.
pub struct ClientPass;

impl Pass for ClientPass {
    fn name(&self) -> &'static str {
        "client"
    }

    fn depends_on(&self) -> &[&'static str] {
        &["types"]
    }

    fn run(&self, project: &Project, ctx: &mut GenerationContext) -> Result<(), CodegenError> {
        let Some(config) = &project.client else {
            return Ok(());
        };

        let path = project.client_file();
        let scaffold = format!(
            "// Generated API client for {base}\n\nconst BASE_URL = \"{url}\";\n",
            base = project.file_base,
            url = config.base_url
        );
        let mut file = SourceFile::open(ctx.get_file(&path), &scaffold);

        file.ensure_statement(&format!("const BASE_URL = \"{}\";", config.base_url));

        let has_auth = config.auth != AuthScheme::None;
        if has_auth {
            file.ensure_import(&ImportSpec::named(
                format!("./{}.authHelper", project.file_base),
                &["getAuthHeaders"],
            ));
        }

        for endpoint in &config.endpoints {
            let fn_name = function_name(&endpoint.name);
            let type_name = response_type_name(&endpoint.name);
            let typed = ctx.has_metadata(&format!("type:{type_name}"));

            let mut named: Vec<&str> = vec!["ApiResponse"];
            if typed {
                named.push(&type_name);
            }
            file.ensure_import(&ImportSpec::type_only(project.types_module(), &named));

            let data_type = if typed { type_name.as_str() } else { "unknown" };
            let source = generate_client_function(endpoint, &fn_name, data_type, has_auth);
            file.ensure_function(&fn_name, &source);
        }

        ctx.set_file(path, file.into_text());
        ctx.set_metadata("has:client", "true");
        Ok(())
    }
}

/// Generates one client function.
fn generate_client_function(
    endpoint: &Endpoint,
    fn_name: &str,
    data_type: &str,
    has_auth: bool,
) -> String {
    let method = endpoint.method.to_uppercase();
    let has_body = matches!(method.as_str(), "POST" | "PUT" | "PATCH");
    let path_params = path_params(&endpoint.path);

    let mut params: Vec<String> = path_params
        .iter()
        .map(|p| format!("{p}: string"))
        .collect();
    if has_body {
        params.push("body: unknown".to_string());
    }

    let mut path_template = endpoint.path.clone();
    for param in &path_params {
        path_template = path_template.replace(&format!("{{{param}}}"), &format!("${{{param}}}"));
    }

    let headers = if has_auth {
        "{ \"Content-Type\": \"application/json\", ...getAuthHeaders() }"
    } else {
        "{ \"Content-Type\": \"application/json\" }"
    };

    let body_line = if has_body {
        "\n    body: JSON.stringify(body),"
    } else {
        ""
    };

    format!(
        r#"export async function {fn_name}({params}): Promise<ApiResponse<{data_type}>> {{
  const response = await fetch(`${{BASE_URL}}{path_template}`, {{
    method: "{method}",
    headers: {headers},{body_line}
  }});
  const data = (await response.json()) as {data_type};
  return {{ status: response.status, data }};
}}
"#,
        params = params.join(", "),
    )
}

/// Extracts `{param}` segment names from a path, in order.
fn path_params(path: &str) -> Vec<String> {
    let mut params = vec![];
    let mut rest = path;
    while let Some(open) = rest.find('{') {
        let Some(close) = rest[open..].find('}').map(|i| open + i) else {
            break;
        };
        params.push(rest[open + 1..close].to_string());
        rest = &rest[close + 1..];
    }
    params
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tsmith_model::ClientConfig;

    fn project() -> Project {
        let config: ClientConfig = serde_json::from_value(json!({
            "baseUrl": "https://api.example.com",
            "auth": "apiKey",
            "endpoints": [
                {"name": "GetUser", "path": "/users/{id}",
                 "responseSample": {"id": "u_1"}},
                {"name": "CreateUser", "method": "POST", "path": "/users",
                 "responseSample": {"id": "u_1"}}
            ]
        }))
        .unwrap();
        Project::for_client("petstore", config)
    }

    fn generate() -> String {
        let mut pm = crate::pass::PassManager::new();
        pm.add(crate::typescript::TypesPass);
        pm.add(ClientPass);
        pm.run(&project())
            .unwrap()
            .get("petstore.client.ts")
            .unwrap()
            .to_string()
    }

    #[test]
    fn test_path_params() {
        assert_eq!(path_params("/users/{id}"), vec!["id"]);
        assert_eq!(
            path_params("/users/{userId}/pets/{petId}"),
            vec!["userId", "petId"]
        );
        assert!(path_params("/users").is_empty());
    }

    #[test]
    fn test_get_with_path_param() {
        let code = generate();
        assert!(code.contains("export async function getUser(id: string)"));
        assert!(code.contains("Promise<ApiResponse<GetUserResponse>>"));
        assert!(code.contains("`${BASE_URL}/users/${id}`"));
        assert!(code.contains("method: \"GET\""));
    }

    #[test]
    fn test_post_with_body() {
        let code = generate();
        assert!(code.contains("export async function createUser(body: unknown)"));
        assert!(code.contains("body: JSON.stringify(body)"));
    }

    #[test]
    fn test_type_imports_merged_into_one_declaration() {
        let code = generate();
        assert_eq!(
            code.matches("from \"./petstore.types\";").count(),
            1,
            "expected a single merged type import:\n{code}"
        );
        assert!(code.contains("GetUserResponse"));
        assert!(code.contains("CreateUserResponse"));
    }

    #[test]
    fn test_auth_header_spread() {
        let code = generate();
        assert!(code.contains("...getAuthHeaders()"));
        assert!(code.contains("import { getAuthHeaders } from \"./petstore.authHelper\";"));
    }

    #[test]
    fn test_client_idempotent() {
        let mut pm = crate::pass::PassManager::new();
        pm.add(crate::typescript::TypesPass);
        pm.add(ClientPass);
        let project = project();

        let first = pm.run(&project).unwrap();
        let client = first.get("petstore.client.ts").unwrap().to_string();
        let types = first.get("petstore.types.ts").unwrap().to_string();

        let seeded = crate::pass::GenerationContext::seeded([
            ("petstore.client.ts", client.clone()),
            ("petstore.types.ts", types),
        ]);
        let second = pm.run_with(&project, seeded).unwrap();
        assert_eq!(second.get("petstore.client.ts").unwrap(), client);
    }
}
