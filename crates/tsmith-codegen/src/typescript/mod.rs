//! TypeScript code generation passes.
//!
//! The base pass infers interfaces for every configured endpoint sample, and
//! feature passes enhance the output with a fetch client, retry/error/auth
//! helper modules, Express webhook routes, a client registry and JSON
//! Schemas.
//!
//! # Example
//!
//! ```ignore
//! use tsmith_codegen::pass::PassManager;
//! use tsmith_codegen::typescript::{TypesPass, passes::{ClientPass, RetryHelperPass}};
//!
//! let mut pm = PassManager::new();
//! pm.add(TypesPass);
//! pm.add(ClientPass);
//! pm.add(RetryHelperPass);
//!
//! let files = pm.run(&project)?;
//! ```

pub mod base;
pub mod passes;

pub use base::TypesPass;
pub use base::{function_name, response_type_name, to_camel_case, to_pascal_case, to_snake_case};

use crate::pass::PassManager;

/// Creates a PassManager with the full TypeScript stack (types + schemas +
/// client + helpers + routes + registry).
pub fn full_stack() -> PassManager {
    let mut pm = PassManager::new();
    pm.add(TypesPass);
    pm.add(passes::SchemaPass);
    pm.add(passes::ClientPass);
    pm.add(passes::RetryHelperPass);
    pm.add(passes::ErrorHelperPass);
    pm.add(passes::AuthHelperPass);
    pm.add(passes::ExpressPass);
    pm.add(passes::RegistryPass);
    pm
}

/// Creates a PassManager with just the inferred TypeScript types.
pub fn types_only() -> PassManager {
    let mut pm = PassManager::new();
    pm.add(TypesPass);
    pm
}
