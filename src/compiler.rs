//! # Block Graph Compiler
//!
//! Main entry points for compiling Jino projects to target source code.

use crate::codegen::{TranspileOptions, TranspilerRegistry};
use crate::error::Result;
use crate::graph::Project;
use crate::validation::{check_connections, validate_project_structure};

/// Target used when none is named
pub const DEFAULT_TARGET: &str = ".ino";

/// Compile a project to an Arduino sketch
///
/// This is the main entry point for the compiler. It takes the block graph
/// saved by the editor and generates the equivalent `.ino` program.
///
/// Structural problems (execution cycles, sequences that never end) are not
/// checked here; run [`validate_project`] first and decide what to do with
/// its diagnostics.
///
/// # Arguments
///
/// * `project` - The project to compile
/// * `options` - Output style, header timestamp and nesting ceiling
///
/// # Returns
///
/// * `Ok(String)` - The generated program
/// * `Err(JbgcError)` - The project is inconsistent, or nests deeper than allowed
///
/// # Examples
///
/// ```rust,no_run
/// use jbgc::{compile_project, Project, TranspileOptions};
///
/// let project = Project::from_json(&std::fs::read_to_string("blink.json")?)?;
/// match compile_project(&project, &TranspileOptions::default()) {
///     Ok(code) => println!("Generated:\n{}", code),
///     Err(e) => eprintln!("Error: {}", e),
/// }
/// # Ok::<(), Box<dyn std::error::Error>>(())
/// ```
pub fn compile_project(project: &Project, options: &TranspileOptions) -> Result<String> {
    compile_project_for_target(project, DEFAULT_TARGET, options)
}

/// Compile a project for a named target using the built-in backends
pub fn compile_project_for_target(project: &Project, target: &str, options: &TranspileOptions) -> Result<String> {
    compile_project_with_registry(project, target, options, &TranspilerRegistry::with_defaults())
}

/// Compile a project with a caller-supplied set of backends
///
/// # Arguments
///
/// * `project` - The project to compile
/// * `target` - Target identifier, looked up in `registry`
/// * `options` - Output options
/// * `registry` - Available backends
pub fn compile_project_with_registry(
    project: &Project,
    target: &str,
    options: &TranspileOptions,
    registry: &TranspilerRegistry,
) -> Result<String> {
    tracing::info!("[JBGC] Starting compilation");
    tracing::info!(
        "[JBGC] Project: {} ({} blocks, {} connections)",
        project.project_name.as_deref().unwrap_or("<unnamed>"),
        project.nodes.len(),
        project.connections.len()
    );

    // Phase 1: Select backend
    tracing::info!("[JBGC] Phase 1: Selecting backend for '{}'...", target);
    let transpiler = registry.get(target)?;

    // Phase 2: Index, lower and assemble
    tracing::info!("[JBGC] Phase 2: Generating {} code ({} style)...", transpiler.target(), options.style);
    let code = transpiler.transpile(project, options)?;

    tracing::info!("[JBGC] Code generation complete ({} bytes)", code.len());
    tracing::info!("[JBGC] Compilation successful!");

    Ok(code)
}

/// Run every structural check on a project
///
/// Returns the structural diagnostics followed by the connection lint. An
/// empty list means the project is safe to compile.
pub fn validate_project(project: &Project) -> Vec<String> {
    tracing::info!("[VALIDATE] Validating '{}'", project.project_name.as_deref().unwrap_or("<unnamed>"));

    let mut diagnostics = validate_project_structure(project);
    diagnostics.extend(check_connections(project));

    tracing::info!("[VALIDATE] {} diagnostic(s)", diagnostics.len());
    diagnostics
}
