//! Code generation backends for tsmith.
//!
//! This crate provides a pass-based code generation architecture where:
//! 1. A base pass infers TypeScript interfaces for every configured endpoint
//! 2. Feature passes (client, retry helper, error helper, auth helper,
//!    Express routes, registry, JSON Schema) are independent modules that
//!    enhance the output
//! 3. Passes can be composed in any order via the PassManager
//!
//! Every pass that targets a shared output file goes through the
//! [`mutate::SourceFile`] mutator, so re-running the full pipeline converges
//! to a stable, non-duplicated file instead of appending twice.
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

use std::path::PathBuf;

use thiserror::Error;
use tsmith_model::{ClientConfig, WebhookConfig};

pub mod mutate;
pub mod pass;
pub mod retry;
pub mod typescript;

pub use pass::{GenerationContext, Pass, PassManager};

/// Errors that can occur during code generation.
#[derive(Error, Debug)]
pub enum CodegenError {
    #[error("no response sample available for endpoint: {0}")]
    MissingSample(String),

    #[error("inference failed: {0}")]
    Infer(#[from] tsmith_infer::InferError),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("{0}")]
    Custom(String),
}

/// One generation unit: everything derived from a single config file.
#[derive(Debug, Clone, Default)]
pub struct Project {
    /// Config file stem; drives generated file names (`<fileBase>.client.ts`).
    pub file_base: String,
    /// Endpoint-client config, when the source file was a client config.
    pub client: Option<ClientConfig>,
    /// Webhook config, when the source file was a webhook config.
    pub webhooks: Option<WebhookConfig>,
}

impl Project {
    /// Creates a project for an endpoint-client config.
    pub fn for_client(file_base: impl Into<String>, config: ClientConfig) -> Self {
        Self {
            file_base: file_base.into(),
            client: Some(config),
            webhooks: None,
        }
    }

    /// Creates a project for a webhook config.
    pub fn for_webhooks(file_base: impl Into<String>, config: WebhookConfig) -> Self {
        Self {
            file_base: file_base.into(),
            client: None,
            webhooks: Some(config),
        }
    }

    pub fn types_file(&self) -> String {
        format!("{}.types.ts", self.file_base)
    }

    pub fn client_file(&self) -> String {
        format!("{}.client.ts", self.file_base)
    }

    pub fn retry_helper_file(&self) -> String {
        format!("{}.requestWithRetry.ts", self.file_base)
    }

    pub fn error_helper_file(&self) -> String {
        format!("{}.errorHandler.ts", self.file_base)
    }

    pub fn auth_helper_file(&self) -> String {
        format!("{}.authHelper.ts", self.file_base)
    }

    pub fn schemas_file(&self) -> String {
        format!("{}.schemas.json", self.file_base)
    }

    pub fn webhooks_file(&self) -> String {
        format!("{}.webhooks.ts", self.file_base)
    }

    /// The module specifier other generated files import types from.
    pub fn types_module(&self) -> String {
        format!("./{}.types", self.file_base)
    }

    /// The file base uppercased for environment-variable names
    /// (`petstore` → `PETSTORE`).
    pub fn base_upper(&self) -> String {
        self.file_base
            .chars()
            .map(|c| {
                if c.is_alphanumeric() {
                    c.to_ascii_uppercase()
                } else {
                    '_'
                }
            })
            .collect()
    }
}

/// A generated file with its path and content.
#[derive(Debug, Clone)]
pub struct GeneratedFile {
    /// Relative path for the generated file.
    pub path: PathBuf,
    /// Content of the generated file.
    pub content: String,
}

impl GeneratedFile {
    /// Creates a new generated file.
    pub fn new(path: impl Into<PathBuf>, content: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            content: content.into(),
        }
    }
}

/// Result of code generation.
#[derive(Debug, Clone, Default)]
pub struct GeneratedFiles {
    /// The generated files.
    pub files: Vec<GeneratedFile>,
}

impl GeneratedFiles {
    /// Creates a new empty result.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a file to the result.
    pub fn add(&mut self, file: GeneratedFile) {
        self.files.push(file);
    }

    /// Looks up a file's content by path.
    pub fn get(&self, path: &str) -> Option<&str> {
        self.files
            .iter()
            .find(|f| f.path.to_str() == Some(path))
            .map(|f| f.content.as_str())
    }

    /// Writes all files to the given output directory.
    pub fn write_to(&self, output_dir: &std::path::Path) -> Result<(), std::io::Error> {
        for file in &self.files {
            validate_relative_path(&file.path)?;
            let path = output_dir.join(&file.path);
            if let Some(parent) = path.parent() {
                std::fs::create_dir_all(parent)?;
            }
            std::fs::write(&path, &file.content)?;
        }
        Ok(())
    }
}

fn validate_relative_path(path: &std::path::Path) -> Result<(), std::io::Error> {
    use std::path::Component;

    if path.components().any(|c| {
        matches!(
            c,
            Component::ParentDir | Component::RootDir | Component::Prefix(_)
        )
    }) {
        return Err(std::io::Error::new(
            std::io::ErrorKind::InvalidInput,
            format!("generated file path must be relative: {}", path.display()),
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_project_file_names() {
        let project = Project {
            file_base: "petstore".to_string(),
            ..Project::default()
        };
        assert_eq!(project.types_file(), "petstore.types.ts");
        assert_eq!(project.retry_helper_file(), "petstore.requestWithRetry.ts");
        assert_eq!(project.error_helper_file(), "petstore.errorHandler.ts");
        assert_eq!(project.auth_helper_file(), "petstore.authHelper.ts");
        assert_eq!(project.base_upper(), "PETSTORE");
    }

    #[test]
    fn test_base_upper_sanitizes() {
        let project = Project {
            file_base: "pet-store.v2".to_string(),
            ..Project::default()
        };
        assert_eq!(project.base_upper(), "PET_STORE_V2");
    }

    #[test]
    fn test_validate_relative_path() {
        assert!(validate_relative_path(std::path::Path::new("a/b.ts")).is_ok());
        assert!(validate_relative_path(std::path::Path::new("../b.ts")).is_err());
        assert!(validate_relative_path(std::path::Path::new("/etc/b.ts")).is_err());
    }

    #[test]
    fn test_write_to_rejects_escaping_paths() {
        let dir = tempfile::tempdir().unwrap();
        let mut files = GeneratedFiles::new();
        files.add(GeneratedFile::new("../escape.ts", "nope"));
        assert!(files.write_to(dir.path()).is_err());
    }
}
