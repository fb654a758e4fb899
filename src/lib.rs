//! # Jino Block Graph Compiler (JBGC)
//!
//! Compiler for turning Jino visual block projects into Arduino sketches.
//!
//! A project is a graph of typed blocks: execution edges order the statements,
//! data edges carry values between blocks. JBGC provides:
//! - A serde model of the editor's saved project format
//! - A structural validator (execution cycles, sequences that never end)
//! - An Arduino `.ino` backend with natural and compressed output
//! - Editing helpers that keep function and variable tables in sync
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use jbgc::{compile_project, validate_project, Project, TranspileOptions};
//!
//! let project = Project::from_json(&std::fs::read_to_string("blink.json")?)?;
//!
//! for diagnostic in validate_project(&project) {
//!     eprintln!("warning: {}", diagnostic);
//! }
//!
//! match compile_project(&project, &TranspileOptions::default()) {
//!     Ok(sketch) => {
//!         std::fs::write("blink.ino", sketch)?;
//!     }
//!     Err(e) => eprintln!("Compilation failed: {}", e),
//! }
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```
//!
//! ## Architecture
//!
//! JBGC follows a multi-phase compilation pipeline:
//!
//! 1. **Validation** - Detect execution cycles and unterminated sequences (caller's choice)
//! 2. **Indexing** - Parse block configs and build connection lookups, checking integrity
//! 3. **Pin Analysis** - Collect statically known pins and their modes
//! 4. **Lowering** - Walk execution chains, resolving data inputs into expressions
//! 5. **Assembly** - Emit header, globals, functions, `setup()` and `loop()`

pub mod codegen;
pub mod compiler;
pub mod error;
pub mod graph;
pub mod validation;

// Re-export the main compilation API
pub use compiler::{
    compile_project,
    compile_project_for_target,
    compile_project_with_registry,
    validate_project,
    DEFAULT_TARGET,
};

pub use codegen::{ArduinoTranspiler, CodeStyle, TranspileOptions, Transpiler, TranspilerRegistry};
pub use error::{JbgcError, Result};

// Re-export graph model types
pub use graph::{
    Connection, ConnectionType, DefinedFunction, DefinedVariable, FunctionParameter, Node,
    NodePorts, Port, PortFlow, PortKind, Project, ValueType,
};

pub use validation::{check_connections, validate_project_structure};
