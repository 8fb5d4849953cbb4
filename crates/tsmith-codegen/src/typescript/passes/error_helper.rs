//! Error handler pass: `<fileBase>.errorHandler.ts`.

use tsmith_model::EndpointMeta;

use crate::mutate::{ImportSpec, SourceFile};
use crate::pass::{GenerationContext, Pass};
use crate::typescript::base::{function_name, response_type_name};
use crate::{CodegenError, Project};

/// The canonical error-handling implementation shared by every generated
/// error helper: HTTP errors keep their status in the message, everything
/// without a response is reported as a network error.
const HANDLE_ERRORS_IMPL: &str = r#"export async function handleErrorsImpl<T>(
  attempt: () => Promise<T>,
  context: string
): Promise<T> {
  try {
    return await attempt();
  } catch (error) {
    const response = (error as { response?: { status?: number; statusText?: string } })
      .response;
    if (response) {
      throw new Error(
        `${context} failed: HTTP ${response.status} ${response.statusText ?? ""}`.trim()
      );
    }
    throw new Error(`${context} failed: network error (${String(error)})`);
  }
}
"#;

/// Generates the companion error-handling helper module: `handleErrorsImpl`
/// plus one `handleErrors_<functionName>` wrapper per endpoint, sorted by
/// function name for stable output.
pub struct ErrorHelperPass;

impl Pass for ErrorHelperPass {
    fn name(&self) -> &'static str {
        "error-helper"
    }

    fn depends_on(&self) -> &[&'static str] {
        &["client"]
    }

    fn run(&self, project: &Project, ctx: &mut GenerationContext) -> Result<(), CodegenError> {
        let Some(config) = &project.client else {
            return Ok(());
        };
        if config.endpoints.is_empty() {
            return Ok(());
        }

        let mut metas: Vec<EndpointMeta> = config
            .endpoints
            .iter()
            .map(|e| EndpointMeta {
                function_name: function_name(&e.name),
                response_type: response_type_name(&e.name),
                response_module: project.types_module(),
                endpoint: Some(e.path.clone()),
            })
            .collect();
        metas.sort_by(|a, b| a.function_name.cmp(&b.function_name));

        let path = project.error_helper_file();
        let scaffold = format!(
            "// Generated error handlers for {base}\n",
            base = project.file_base
        );
        let mut file = SourceFile::open(ctx.get_file(&path), &scaffold);

        file.ensure_import(&ImportSpec::type_only(
            project.types_module(),
            &["ApiResponse"],
        ));
        for meta in &metas {
            if ctx.has_metadata(&format!("type:{}", meta.response_type)) {
                file.ensure_import(&ImportSpec::type_only(
                    meta.response_module.clone(),
                    &[meta.response_type.as_str()],
                ));
            }
        }

        file.ensure_function("handleErrorsImpl", HANDLE_ERRORS_IMPL);

        for meta in &metas {
            let typed = ctx.has_metadata(&format!("type:{}", meta.response_type));
            let wrapper_name = format!("handleErrors_{}", meta.function_name);
            file.ensure_function(&wrapper_name, &generate_wrapper(&wrapper_name, meta, typed));
        }

        ctx.set_file(path, file.into_text());
        ctx.set_metadata("has:error-helper", "true");
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
  attempt: () => Promise<ApiResponse<{data_type}>>
): Promise<ApiResponse<{data_type}>> {{
  return handleErrorsImpl(attempt, "{context}");
}}
"#,
        context = meta.function_name
    )
}
