//! # Errors
//!
//! Hard failures of the compiler. Anything that can still produce inspectable
//! output (unconnected inputs, unknown block types) is handled in place with a
//! placeholder and never reaches this type.

use thiserror::Error;

/// Errors that abort a transpilation.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum JbgcError {
    #[error("Node instance '{0}' not found in project")]
    NodeNotFound(String),

    #[error("Port '{pin}' is not declared on node '{node}'")]
    PinNotFound { node: String, pin: String },

    #[error("Function '{function}' starts at node '{instance}', which does not exist")]
    FunctionStartNotFound { function: String, instance: String },

    #[error("No transpiler registered for target '{0}'")]
    UnknownTarget(String),

    #[error("Nesting depth exceeded the limit of {limit} while compiling node '{node}'")]
    RecursionLimit { limit: usize, node: String },

    #[error("Data dependency cycle detected at input '{port}' of node '{node}'")]
    DataCycle { node: String, port: String },

    #[error("Code generation failed: {0}")]
    CodeGeneration(String),

    #[error("Failed to parse project JSON: {0}")]
    Json(String),
}

impl From<serde_json::Error> for JbgcError {
    fn from(err: serde_json::Error) -> Self {
        JbgcError::Json(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, JbgcError>;
