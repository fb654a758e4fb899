//! Mapping from graph value types to Arduino C++ types.

use crate::graph::{DefinedVariable, ValueType};

/// Declared type of a global variable
pub fn variable_type(variable: &DefinedVariable) -> String {
    match variable.data_type {
        ValueType::Number => "float".to_string(),
        ValueType::String => "String".to_string(),
        ValueType::Boolean => "boolean".to_string(),
        ValueType::Array => {
            let element = variable.array_element_type.map(parameter_type).unwrap_or("auto");
            format!("std::vector<{}>", element)
        }
        ValueType::Execution | ValueType::Any => "void".to_string(),
    }
}

/// Type of a function parameter or return value
pub fn parameter_type(data_type: ValueType) -> &'static str {
    match data_type {
        ValueType::Number => "float",
        ValueType::String => "String",
        ValueType::Boolean => "bool",
        _ => "auto",
    }
}

pub fn return_type(data_type: Option<ValueType>) -> &'static str {
    data_type.map(parameter_type).unwrap_or("void")
}

/// Any array global needs `<vector>`
pub fn needs_vector_include(variables: &[DefinedVariable]) -> bool {
    variables.iter().any(|v| v.data_type == ValueType::Array)
}
