//! Auth helper pass: `<baseName>.authHelper.ts`.

use tsmith_model::AuthScheme;

use crate::mutate::SourceFile;
use crate::pass::{GenerationContext, Pass};
use crate::{CodegenError, Project};

/// Generates the auth helper module for a client config.
///
/// API-key auth reads `<BASENAME>_APIKEY` with a literal fallback; basic auth
/// reads `<BASENAME>_USERNAME` / `<BASENAME>_PASSWORD`; no-auth exports a
/// function returning an empty object so callers can spread it
/// unconditionally.
pub struct AuthHelperPass;

impl Pass for AuthHelperPass {
    fn name(&self) -> &'static str {
        "auth-helper"
    }

    fn run(&self, project: &Project, ctx: &mut GenerationContext) -> Result<(), CodegenError> {
        let Some(config) = &project.client else {
            return Ok(());
        };

        let path = project.auth_helper_file();
        let scaffold = format!(
            "// Generated auth helper for {base}\n",
            base = project.file_base
        );
        let mut file = SourceFile::open(ctx.get_file(&path), &scaffold);

        let source = generate_auth_function(config.auth, &project.base_upper());
        file.ensure_function("getAuthHeaders", &source);

        ctx.set_file(path, file.into_text());
        ctx.set_metadata("has:auth-helper", "true");
        Ok(())
    }
}

fn generate_auth_function(scheme: AuthScheme, base_upper: &str) -> String {
    match scheme {
        AuthScheme::ApiKey => format!(
            r#"export function getAuthHeaders(): Record<string, string> {{
  const apiKey = process.env.{base_upper}_APIKEY ?? "changeme";
  return {{ "X-API-Key": apiKey }};
}}
"#
        ),
        AuthScheme::Basic => format!(
            r#"export function getAuthHeaders(): Record<string, string> {{
  const username = process.env.{base_upper}_USERNAME ?? "user";
  const password = process.env.{base_upper}_PASSWORD ?? "password";
  const token = Buffer.from(`${{username}}:${{password}}`).toString("base64");
  return {{ Authorization: `Basic ${{token}}` }};
}}
"#
        ),
        AuthScheme::None => r#"export function getAuthHeaders(): Record<string, string> {
  return {};
}
"#
        .to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tsmith_model::ClientConfig;

    fn run(auth: &str) -> String {
        let config: ClientConfig = serde_json::from_value(json!({
            "baseUrl": "https://api.example.com",
            "auth": auth,
            "endpoints": []
        }))
        .unwrap();

        let mut pm = crate::pass::PassManager::new();
        pm.add(AuthHelperPass);
        pm.run(&Project::for_client("petstore", config))
            .unwrap()
            .get("petstore.authHelper.ts")
            .unwrap()
            .to_string()
    }

    #[test]
    fn test_api_key_env_lookup() {
        let code = run("apiKey");
        assert!(code.contains("process.env.PETSTORE_APIKEY ?? \"changeme\""));
        assert!(code.contains("\"X-API-Key\": apiKey"));
    }

    #[test]
    fn test_basic_auth_env_lookup() {
        let code = run("basic");
        assert!(code.contains("process.env.PETSTORE_USERNAME"));
        assert!(code.contains("process.env.PETSTORE_PASSWORD"));
        assert!(code.contains("Basic ${token}"));
    }

    #[test]
    fn test_no_auth_empty_object() {
        let code = run("none");
        assert!(code.contains("return {};"));
        assert!(!code.contains("process.env"));
    }
}
