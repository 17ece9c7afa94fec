//! Named tool registry: holds tools with parameter schemas, categories,
//! and argument validators. Other components hold non-owning references
//! by name; only the registry owns schemas and usage stats.

mod registry;
mod schema;
mod tool;
mod validate;

pub use registry::{RegistryError, ToolRegistry};
pub use schema::{ParamConstraints, ParamSchema, ParamType, RiskClass, ToolSchema};
pub use tool::{Tool, ToolError};
pub use validate::{validate_arguments, FieldError, ValidationResult};
