//! Feature passes for TypeScript code generation.

pub mod auth_helper;
pub mod client;
pub mod error_helper;
pub mod express;
pub mod registry;
pub mod retry_helper;
pub mod schema;

pub use auth_helper::AuthHelperPass;
pub use client::ClientPass;
pub use error_helper::ErrorHelperPass;
pub use express::ExpressPass;
pub use registry::RegistryPass;
pub use retry_helper::RetryHelperPass;
pub use schema::SchemaPass;
