//! Common types for the TypeScript generators
use thiserror::Error;

/// Errors that can occur while generating TypeScript
#[non_exhaustive]
#[derive(Error, Debug)]
pub enum GenError {
    /// A type mapping names a base type that does not exist
    #[error("Unknown base type '{0}' in type mapping")]
    UnknownBaseType(String),
    /// Failed to render a template
    #[error("Failed to render {0}")]
    TemplateError(String, #[source] tera::Error),
    /// Failed to serialize the ABI into the generated code
    #[error("Failed to serialize ABI of {0}")]
    AbiSerialization(String, #[source] serde_json::Error),
}

/// The standard [`Result`] type in the generators
pub type Result<T, E = GenError> = core::result::Result<T, E>;
