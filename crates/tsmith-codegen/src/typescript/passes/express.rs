//! Express webhook pass: handler module + shared `routes.ts` router.

use tracing::warn;
use tsmith_infer::infer_interface;
use tsmith_model::Webhook;

use crate::mutate::{ImportSpec, SourceFile};
use crate::pass::{GenerationContext, Pass};
use crate::typescript::base::{ensure_interface_blocks, to_camel_case, to_pascal_case, types_scaffold};
use crate::{CodegenError, Project};

/// The shared router file every webhook config registers into.
pub const ROUTES_FILE: &str = "routes.ts";

const ROUTER_BOOTSTRAP: &str = "const router = express.Router();";
const ROUTER_EXPORT: &str = "export default router;";

/// Express pass that generates webhook handlers and routing.
///
/// This pass creates:
/// - `<fileBase>.webhooks.ts` - one handler function per webhook, with the
///   payload type inferred from the config's sample
/// - `routes.ts` - a shared router; registrations are keyed by
///   (method, path) so independent configs can append to it over time
pub struct ExpressPass;

impl Pass for ExpressPass {
    fn name(&self) -> &'static str {
        "express"
    }

    fn depends_on(&self) -> &[&'static str] {
        &["types"]
    }

    fn run(&self, project: &Project, ctx: &mut GenerationContext) -> Result<(), CodegenError> {
        let Some(config) = &project.webhooks else {
            return Ok(());
        };

        // Payload types join the config's types file.
        let types_path = project.types_file();
        let mut types = SourceFile::open(ctx.get_file(&types_path), &types_scaffold(project));
        for webhook in &config.webhooks {
            let type_name = payload_type_name(&webhook.name);
            let Some(sample) = &webhook.sample else {
                warn!(
                    target: "codegen",
                    webhook = %webhook.name,
                    "no payload sample, typing payload as unknown"
                );
                continue;
            };
            let json =
                serde_json::to_string(sample).map_err(|e| CodegenError::Custom(e.to_string()))?;
            if let Some(text) = infer_interface(&json, &type_name)? {
                ensure_interface_blocks(&mut types, &text);
                ctx.set_metadata(format!("type:{type_name}"), "true");
            }
        }
        ctx.set_file(types_path, types.into_text());

        // Handler module.
        let handlers_path = project.webhooks_file();
        let scaffold = format!(
            "// Generated webhook handlers for {base}\n",
            base = project.file_base
        );
        let mut handlers = SourceFile::open(ctx.get_file(&handlers_path), &scaffold);
        handlers.ensure_import(&ImportSpec::type_only("express", &["Request", "Response"]));

        for webhook in &config.webhooks {
            let handler = handler_name(&webhook.name);
            let type_name = payload_type_name(&webhook.name);
            let typed = ctx.has_metadata(&format!("type:{type_name}"));
            if typed {
                handlers.ensure_import(&ImportSpec::type_only(
                    project.types_module(),
                    &[type_name.as_str()],
                ));
            }
            handlers.ensure_function(&handler, &generate_handler(webhook, &handler, &type_name, typed));
        }
        ctx.set_file(handlers_path, handlers.into_text());

        // Shared router.
        let mut router = SourceFile::open(ctx.get_file(ROUTES_FILE), &router_scaffold());
        router.ensure_import(&ImportSpec::default_import("express", "express"));
        router.ensure_statement(ROUTER_BOOTSTRAP);
        router.ensure_statement(ROUTER_EXPORT);

        for webhook in &config.webhooks {
            let handler = handler_name(&webhook.name);
            router.ensure_import(&ImportSpec::named(
                format!("./{}.webhooks", project.file_base),
                &[handler.as_str()],
            ));
            let method = webhook.method.to_lowercase();
            router.ensure_route(
                &method,
                &webhook.path,
                &format!("router.{method}(\"{path}\", {handler});", path = webhook.path),
            );
        }
        ctx.set_file(ROUTES_FILE, router.into_text());

        ctx.set_metadata("has:express", "true");
        Ok(())
    }
}

fn router_scaffold() -> String {
    format!(
        "// Generated Express routes\n\nimport express from \"express\";\n\n{ROUTER_BOOTSTRAP}\n\n{ROUTER_EXPORT}\n"
    )
}

/// `OrderShipped` → `handleOrderShipped`.
pub fn handler_name(webhook_name: &str) -> String {
    format!("handle{}", to_pascal_case(webhook_name))
}

/// `OrderShipped` → `OrderShippedPayload`.
pub fn payload_type_name(webhook_name: &str) -> String {
    format!("{}Payload", to_pascal_case(webhook_name))
}

fn generate_handler(webhook: &Webhook, handler: &str, type_name: &str, typed: bool) -> String {
    let payload_type = if typed { type_name } else { "unknown" };
    let tag = to_camel_case(&webhook.name);
    format!(
        r#"export async function {handler}(req: Request, res: Response): Promise<void> {{
  const payload = req.body as {payload_type};
  console.log("{tag} received", payload);
  res.status(204).end();
}}
"#
    )
}
