//! # Arduino Sketch Backend
//!
//! Assembles a complete `.ino` program: header, globals, user functions,
//! `setup()` with the pin-mode table, and `loop()`.

mod lowering;
mod pin_modes;
mod resolver;
mod types;

pub use lowering::SequenceLowerer;
pub use pin_modes::{PinMode, PinModeTable};
pub use resolver::ValueResolver;

use super::{compress, CodeStyle, TranspileOptions, Transpiler};
use crate::error::Result;
use crate::graph::{GraphIndex, PortKind, Project};

/// Transpiler for Arduino `.ino` sketches
#[derive(Debug, Default, Clone, Copy)]
pub struct ArduinoTranspiler;

impl Transpiler for ArduinoTranspiler {
    fn target(&self) -> &str {
        ".ino"
    }

    fn aliases(&self) -> &[&str] {
        &["ino", "arduino"]
    }

    fn transpile(&self, project: &Project, options: &TranspileOptions) -> Result<String> {
        let index = GraphIndex::build(project)?;
        let emitter = SketchEmitter::new(&index, options);
        let code = emitter.emit()?;

        Ok(match options.style {
            CodeStyle::Natural => code,
            CodeStyle::Compressed => compress(&code),
        })
    }
}

struct SketchEmitter<'i, 'a> {
    index: &'i GraphIndex<'a>,
    options: &'i TranspileOptions,
    lowerer: SequenceLowerer<'i, 'a>,
}

impl<'i, 'a> SketchEmitter<'i, 'a> {
    fn new(index: &'i GraphIndex<'a>, options: &'i TranspileOptions) -> Self {
        Self {
            index,
            options,
            lowerer: SequenceLowerer::new(index, options.max_depth),
        }
    }

    fn emit(&self) -> Result<String> {
        let mut code = String::new();

        self.emit_header(&mut code);
        self.emit_globals(&mut code);
        self.emit_functions(&mut code)?;

        let pin_modes = PinModeTable::collect(self.index)?;
        tracing::debug!("[LOWER] {} static pin(s)", pin_modes.iter().count());

        code.push_str("void setup() {\n");
        if !pin_modes.is_empty() {
            code.push_str("  // Pin initializations\n");
            for (pin, mode) in pin_modes.iter() {
                code.push_str(&format!("  pinMode({}, {});\n", pin, mode));
            }
            code.push('\n');
        }
        let setup = self.lower_entry("program_setup_start")?;
        push_body(&mut code, &setup, "  // No blocks in setup sequence.\n");
        code.push_str("}\n\n");

        code.push_str("void loop() {\n");
        let repeat = self.lower_entry("program_loop_start")?;
        push_body(&mut code, &repeat, "  // No blocks in loop sequence.\n");
        code.push_str("}\n");

        Ok(code)
    }

    fn emit_header(&self, code: &mut String) {
        let project = self.index.project();
        let name = project
            .project_name
            .as_deref()
            .filter(|name| !name.trim().is_empty())
            .unwrap_or("Untitled Project");

        code.push_str(&format!("// Project: {}\n", name));
        if let Some(exported) = self.options.exported_at.as_ref().or(project.last_saved.as_ref()) {
            code.push_str(&format!("// Exported on: {}\n", exported));
        }
        code.push_str(&format!("// Source version: {}\n", project.version));
        code.push_str(&format!("// Style: {}\n\n", self.options.style));
    }

    fn emit_globals(&self, code: &mut String) {
        let variables = &self.index.project().defined_variables;
        if types::needs_vector_include(variables) {
            code.push_str("#include <vector>\n\n");
        }
        if variables.is_empty() {
            return;
        }

        code.push_str("// Global Variables\n");
        for variable in variables {
            code.push_str(&format!("{} {};\n", types::variable_type(variable), variable.name));
        }
        code.push('\n');
    }

    fn emit_functions(&self, code: &mut String) -> Result<()> {
        let functions = &self.index.project().defined_functions;
        if functions.is_empty() {
            return Ok(());
        }

        code.push_str("// User-Defined Functions\n");
        for function in functions {
            let params: Vec<String> = function
                .parameters
                .iter()
                .map(|param| format!("{} {}", types::parameter_type(param.data_type), param.name))
                .collect();

            code.push_str(&format!(
                "{} {}({}) {{\n",
                types::return_type(function.return_type),
                function.name,
                params.join(", ")
            ));
            code.push_str(&self.lowerer.lower_from(&function.start_block_instance_id, "exec_out_body", 1)?);
            code.push_str("}\n\n");
        }
        Ok(())
    }

    /// Lower every execution output of the first start block of the given type
    fn lower_entry(&self, entry_type: &str) -> Result<String> {
        let Some(entry) = self.index.blocks_in_order().find(|block| block.type_id() == entry_type) else {
            return Ok(String::new());
        };

        let mut body = String::new();
        for port in entry.node.ports.execution_outs.iter().filter(|p| p.kind == PortKind::Execution) {
            body.push_str(&self.lowerer.lower_from(entry.instance_id(), &port.id, 1)?);
        }
        Ok(body)
    }
}

fn push_body(code: &mut String, body: &str, placeholder: &str) {
    if body.trim().is_empty() {
        code.push_str(placeholder);
    } else {
        code.push_str(body);
    }
}
