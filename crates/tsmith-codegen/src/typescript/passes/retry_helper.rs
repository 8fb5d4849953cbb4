//! Retry helper pass: `<fileBase>.requestWithRetry.ts`.

use tsmith_model::EndpointMeta;

use crate::mutate::{ImportSpec, SourceFile};
use crate::pass::{GenerationContext, Pass};
use crate::retry::REQUEST_WITH_RETRY_IMPL;
use crate::typescript::base::{function_name, response_type_name};
use crate::{CodegenError, Project};

/// Generates the companion retry helper module for every retry-enabled
/// endpoint: the canonical `requestWithRetryImpl` plus one typed
/// `requestWithRetry_<functionName>` wrapper per endpoint.
///
/// Wrappers are emitted in lexicographic order of the generated function
/// name, regardless of the config's endpoint order, so repeated generation
/// from a re-ordered endpoint list produces byte-identical output.
pub struct RetryHelperPass;

impl Pass for RetryHelperPass {
    fn name(&self) -> &'static str {
        "retry-helper"
    }

    fn depends_on(&self) -> &[&'static str] {
        &["client"]
    }

    fn run(&self, project: &Project, ctx: &mut GenerationContext) -> Result<(), CodegenError> {
        let Some(config) = &project.client else {
            return Ok(());
        };

        let mut metas: Vec<EndpointMeta> = config
            .endpoints
            .iter()
            .filter(|e| {
                e.effective_retry(config.retry.as_ref())
                    .is_some_and(|p| p.enabled)
            })
            .map(|e| EndpointMeta {
                function_name: function_name(&e.name),
                response_type: response_type_name(&e.name),
                response_module: project.types_module(),
                endpoint: Some(e.path.clone()),
            })
            .collect();
        if metas.is_empty() {
            return Ok(());
        }
        metas.sort_by(|a, b| a.function_name.cmp(&b.function_name));

        let path = project.retry_helper_file();
        let scaffold = format!(
            "// Generated retry helpers for {base}\n",
            base = project.file_base
        );
        let mut file = SourceFile::open(ctx.get_file(&path), &scaffold);

        file.ensure_import(&ImportSpec::type_only(
            project.types_module(),
            &["ApiResponse", "RetryOptions"],
        ));
        for meta in &metas {
            if ctx.has_metadata(&format!("type:{}", meta.response_type)) {
                file.ensure_import(&ImportSpec::type_only(
                    meta.response_module.clone(),
                    &[meta.response_type.as_str()],
                ));
            }
        }

        file.ensure_function("requestWithRetryImpl", REQUEST_WITH_RETRY_IMPL);

        for meta in &metas {
            let typed = ctx.has_metadata(&format!("type:{}", meta.response_type));
            let wrapper_name = format!("requestWithRetry_{}", meta.function_name);
            let source = generate_wrapper(&wrapper_name, meta, typed);
            file.ensure_function(&wrapper_name, &source);
        }

        ctx.set_file(path, file.into_text());
        ctx.set_metadata("has:retry-helper", "true");
        Ok(())
    }
}

fn generate_wrapper(wrapper_name: &str, meta: &EndpointMeta, typed: bool) -> String {
    let data_type = if typed {
        meta.response_type.as_str()
    } else {
        "unknown"
    };
    format!(
        r#"export function {wrapper_name}(
  attempt: () => Promise<ApiResponse<{data_type}>>,
  options: RetryOptions
): Promise<ApiResponse<{data_type}>> {{
  return requestWithRetryImpl(attempt, options);
}}
"#
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;
    use tsmith_model::ClientConfig;

    fn project(endpoint_order: &[&str]) -> Project {
        let endpoints: Vec<_> = endpoint_order
            .iter()
            .map(|name| {
                json!({"name": name, "path": format!("/{name}"),
                       "responseSample": {"ok": true}})
            })
            .collect();
        let config: ClientConfig = serde_json::from_value(json!({
            "baseUrl": "https://api.example.com",
            "retry": {"enabled": true},
            "endpoints": endpoints
        }))
        .unwrap();
        Project::for_client("petstore", config)
    }

    fn pipeline() -> crate::pass::PassManager {
        let mut pm = crate::pass::PassManager::new();
        pm.add(crate::typescript::TypesPass);
        pm.add(crate::typescript::passes::ClientPass);
        pm.add(RetryHelperPass);
        pm
    }

    #[test]
    fn test_helper_exports() {
        let files = pipeline().run(&project(&["GetUser", "ListPets"])).unwrap();
        let helper = files.get("petstore.requestWithRetry.ts").unwrap();

        assert!(helper.contains("export async function requestWithRetryImpl<T>"));
        assert!(helper.contains("export function requestWithRetry_getUser("));
        assert!(helper.contains("export function requestWithRetry_listPets("));
        assert!(helper.contains("import type { ApiResponse, RetryOptions, GetUserResponse, ListPetsResponse } from \"./petstore.types\";"));
    }

    #[test]
    fn test_wrappers_sorted_regardless_of_input_order() {
        let forward = pipeline().run(&project(&["GetUser", "ListPets"])).unwrap();
        let reversed = pipeline().run(&project(&["ListPets", "GetUser"])).unwrap();

        assert_eq!(
            forward.get("petstore.requestWithRetry.ts").unwrap(),
            reversed.get("petstore.requestWithRetry.ts").unwrap()
        );

        let helper = forward.get("petstore.requestWithRetry.ts").unwrap();
        let get_pos = helper.find("requestWithRetry_getUser").unwrap();
        let list_pos = helper.find("requestWithRetry_listPets").unwrap();
        assert!(get_pos < list_pos);
    }

    #[test]
    fn test_double_run_byte_identical() {
        let project = project(&["GetUser", "ListPets"]);
        let pm = pipeline();

        let first = pm.run(&project).unwrap();
        let seeded = crate::pass::GenerationContext::seeded(
            first
                .files
                .iter()
                .map(|f| (f.path.to_str().unwrap().to_string(), f.content.clone())),
        );
        let second = pm.run_with(&project, seeded).unwrap();

        for file in &first.files {
            assert_eq!(
                second.get(file.path.to_str().unwrap()).unwrap(),
                file.content,
                "file {} changed on second run",
                file.path.display()
            );
        }
    }

    #[test]
    fn test_new_endpoint_joins_existing_import() {
        let pm = pipeline();
        let first = pm.run(&project(&["GetUser"])).unwrap();

        let seeded = crate::pass::GenerationContext::seeded(
            first
                .files
                .iter()
                .map(|f| (f.path.to_str().unwrap().to_string(), f.content.clone())),
        );
        let second = pm
            .run_with(&project(&["GetUser", "ListPets"]), seeded)
            .unwrap();
        let helper = second.get("petstore.requestWithRetry.ts").unwrap();

        // The new response type joins the existing type-only import instead
        // of spawning a second declaration for the same module.
        assert_eq!(
            helper.matches("from \"./petstore.types\";").count(),
            1,
            "expected one import declaration:\n{helper}"
        );
        assert!(helper.contains("ListPetsResponse"));
        assert!(helper.contains("requestWithRetry_listPets"));
    }

    #[test]
    fn test_no_retry_endpoints_no_helper() {
        let config: ClientConfig = serde_json::from_value(json!({
            "baseUrl": "https://api.example.com",
            "endpoints": [{"name": "GetUser", "path": "/users", "responseSample": {"ok": true}}]
        }))
        .unwrap();
        let files = pipeline()
            .run(&Project::for_client("petstore", config))
            .unwrap();
        assert!(files.get("petstore.requestWithRetry.ts").is_none());
    }
}
