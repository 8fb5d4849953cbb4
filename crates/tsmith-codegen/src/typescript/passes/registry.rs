//! Registry pass: shared `registry.ts` accumulating client functions.

use crate::mutate::{ImportSpec, SourceFile};
use crate::pass::{GenerationContext, Pass};
use crate::typescript::base::function_name;
use crate::{CodegenError, Project};

/// The shared registry file every client config registers into.
pub const REGISTRY_FILE: &str = "registry.ts";

const REGISTRY_BOOTSTRAP: &str = "export const registry: Record<string, unknown> = {};";

/// Registry pass that accumulates every generated client function into a
/// shared lookup table, one registration statement per function. Independent
/// configs append to the same file across runs.
pub struct RegistryPass;

impl Pass for RegistryPass {
    fn name(&self) -> &'static str {
        "registry"
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

        let scaffold = format!("// Generated client registry\n\n{REGISTRY_BOOTSTRAP}\n");
        let mut file = SourceFile::open(ctx.get_file(REGISTRY_FILE), &scaffold);
        file.ensure_statement(REGISTRY_BOOTSTRAP);

        let mut names: Vec<String> = config
            .endpoints
            .iter()
            .map(|e| function_name(&e.name))
            .collect();
        names.sort();

        let module = format!("./{}.client", project.file_base);
        for name in &names {
            file.ensure_import(&ImportSpec::named(module.clone(), &[name.as_str()]));
            file.ensure_statement(&format!("registry[\"{name}\"] = {name};"));
        }

        ctx.set_file(REGISTRY_FILE, file.into_text());
        ctx.set_metadata("has:registry", "true");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tsmith_model::ClientConfig;

    fn project(file_base: &str, names: &[&str]) -> Project {
        let endpoints: Vec<_> = names
            .iter()
            .map(|n| json!({"name": n, "path": format!("/{n}"), "responseSample": {"ok": true}}))
            .collect();
        let config: ClientConfig = serde_json::from_value(json!({
            "baseUrl": "https://api.example.com",
            "endpoints": endpoints
        }))
        .unwrap();
        Project::for_client(file_base, config)
    }

    fn pipeline() -> crate::pass::PassManager {
        let mut pm = crate::pass::PassManager::new();
        pm.add(crate::typescript::TypesPass);
        pm.add(crate::typescript::passes::ClientPass);
        pm.add(RegistryPass);
        pm
    }

    #[test]
    fn test_registry_registers_functions() {
        let files = pipeline()
            .run(&project("petstore", &["GetUser", "ListPets"]))
            .unwrap();
        let registry = files.get(REGISTRY_FILE).unwrap();

        assert_eq!(registry.matches(REGISTRY_BOOTSTRAP).count(), 1);
        assert!(registry
            .contains("import { getUser, listPets } from \"./petstore.client\";"));
        assert!(registry.contains("registry[\"getUser\"] = getUser;"));
        assert!(registry.contains("registry[\"listPets\"] = listPets;"));
    }

    #[test]
    fn test_two_configs_accumulate() {
        let pm = pipeline();
        let first = pm.run(&project("petstore", &["GetUser"])).unwrap();

        let seeded = crate::pass::GenerationContext::seeded([(
            REGISTRY_FILE.to_string(),
            first.get(REGISTRY_FILE).unwrap().to_string(),
        )]);
        let second = pm
            .run_with(&project("billing", &["GetInvoice"]), seeded)
            .unwrap();
        let registry = second.get(REGISTRY_FILE).unwrap();

        assert!(registry.contains("import { getUser } from \"./petstore.client\";"));
        assert!(registry.contains("import { getInvoice } from \"./billing.client\";"));
        assert!(registry.contains("registry[\"getUser\"] = getUser;"));
        assert!(registry.contains("registry[\"getInvoice\"] = getInvoice;"));
        assert_eq!(registry.matches(REGISTRY_BOOTSTRAP).count(), 1);
    }

    #[test]
    fn test_rerun_byte_identical() {
        let pm = pipeline();
        let project = project("petstore", &["GetUser", "ListPets"]);

        let first = pm.run(&project).unwrap();
        let registry = first.get(REGISTRY_FILE).unwrap().to_string();

        let seeded =
            crate::pass::GenerationContext::seeded([(REGISTRY_FILE.to_string(), registry.clone())]);
        let second = pm.run_with(&project, seeded).unwrap();
        assert_eq!(second.get(REGISTRY_FILE).unwrap(), registry);
    }
}
