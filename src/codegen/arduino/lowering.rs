//! # Sequence Lowering
//!
//! Walks an execution chain and emits one Arduino statement (or block) per
//! node. Straight-line chains are followed iteratively; branches and loop
//! bodies recurse with one more level of indentation.

use super::resolver::ValueResolver;
use crate::error::{JbgcError, Result};
use crate::graph::{Block, BlockKind, GraphIndex, PortKind};
use std::collections::HashSet;

/// Where the walk goes once a block's own code is written
enum Next {
    /// Follow the block's execution outputs
    Advance,
    /// Continue at the named output (after a loop)
    After(&'static str),
    End,
}

pub struct SequenceLowerer<'i, 'a> {
    index: &'i GraphIndex<'a>,
    resolver: ValueResolver<'i, 'a>,
    max_depth: usize,
}

impl<'i, 'a> SequenceLowerer<'i, 'a> {
    pub fn new(index: &'i GraphIndex<'a>, max_depth: usize) -> Self {
        Self {
            index,
            resolver: ValueResolver::new(index, max_depth),
            max_depth,
        }
    }

    /// Lower the chain connected to an execution output
    pub fn lower_from(&self, node_id: &str, output_port: &str, level: usize) -> Result<String> {
        let start = self.index.next_execution_block(node_id, output_port);
        self.lower_at_depth(start, level, 0)
    }

    pub fn lower_sequence(&self, start: Option<&'i Block<'a>>, level: usize) -> Result<String> {
        self.lower_at_depth(start, level, 0)
    }

    fn lower_at_depth(&self, start: Option<&'i Block<'a>>, level: usize, depth: usize) -> Result<String> {
        let Some(start) = start else {
            return Ok(String::new());
        };
        if depth > self.max_depth {
            return Err(JbgcError::RecursionLimit {
                limit: self.max_depth,
                node: start.instance_id().to_string(),
            });
        }

        let indent = "  ".repeat(level);
        let mut code = String::new();
        let mut visited: HashSet<&'a str> = HashSet::new();
        let mut cursor = Some(start);

        while let Some(block) = cursor {
            visited.insert(block.instance_id());
            tracing::debug!("[LOWER] {} ({})", block.instance_id(), block.type_id());

            cursor = match self.lower_block(block, level, depth, &indent, &visited, &mut code)? {
                Next::End => None,
                Next::After(port) => self
                    .index
                    .next_execution_block(block.instance_id(), port)
                    .filter(|next| !visited.contains(next.instance_id())),
                Next::Advance => self.advance(block, level, depth, &visited, &mut code)?,
            };
        }

        Ok(code)
    }

    /// With one execution output the walk continues in place; with several,
    /// every unvisited continuation is lowered in turn and the walk stops.
    fn advance(
        &self,
        block: &Block<'a>,
        level: usize,
        depth: usize,
        visited: &HashSet<&'a str>,
        code: &mut String,
    ) -> Result<Option<&'i Block<'a>>> {
        let outputs: Vec<&str> = block
            .node
            .ports
            .execution_outs
            .iter()
            .filter(|port| port.kind == PortKind::Execution)
            .map(|port| port.id.as_str())
            .collect();

        let unvisited = |port: &str| {
            self.index
                .next_execution_block(block.instance_id(), port)
                .filter(|next| !visited.contains(next.instance_id()))
        };

        match outputs.as_slice() {
            [] => Ok(None),
            [single] => Ok(unvisited(*single)),
            many => {
                for port in many {
                    if let Some(next) = unvisited(*port) {
                        code.push_str(&self.lower_at_depth(Some(next), level, depth + 1)?);
                    }
                }
                Ok(None)
            }
        }
    }

    fn input(&self, block: &Block<'a>, port: &str, depth: usize) -> Result<String> {
        self.resolver.resolve_value(block.instance_id(), port, depth)
    }

    fn branch(&self, block: &Block<'a>, port: &str, level: usize, depth: usize) -> Result<String> {
        let start = self.index.next_execution_block(block.instance_id(), port);
        self.lower_at_depth(start, level, depth + 1)
    }

    fn lower_block(
        &self,
        block: &Block<'a>,
        level: usize,
        depth: usize,
        indent: &str,
        visited: &HashSet<&'a str>,
        code: &mut String,
    ) -> Result<Next> {
        let id = block.instance_id();

        match &block.kind {
            BlockKind::SetupEnd | BlockKind::LoopEnd | BlockKind::FunctionEnd => {
                code.push_str(&format!("{}// End of sequence marker: {}\n", indent, block.type_id()));
                return Ok(Next::End);
            }

            BlockKind::LedOn => {
                code.push_str(&format!("{}digitalWrite({}, HIGH);\n", indent, self.input(block, "pin", depth)?));
            }
            BlockKind::LedOff => {
                code.push_str(&format!("{}digitalWrite({}, LOW);\n", indent, self.input(block, "pin", depth)?));
            }
            BlockKind::SetPinState => {
                code.push_str(&format!(
                    "{}digitalWrite({}, {} ? HIGH : LOW);\n",
                    indent,
                    self.input(block, "pin", depth)?,
                    self.input(block, "state", depth)?
                ));
            }
            BlockKind::AnalogWrite => {
                code.push_str(&format!(
                    "{}analogWrite({}, {});\n",
                    indent,
                    self.input(block, "pin", depth)?,
                    self.input(block, "value", depth)?
                ));
            }
            BlockKind::Delay => {
                code.push_str(&format!("{}delay({});\n", indent, self.input(block, "duration", depth)?));
            }
            BlockKind::BuzzerPlay => {
                let pin = self.input(block, "pin", depth)?;
                code.push_str(&format!("{}tone({}, {});\n", indent, pin, self.input(block, "frequency", depth)?));
                code.push_str(&format!("{}delay({});\n", indent, self.input(block, "duration", depth)?));
                code.push_str(&format!("{}noTone({});\n", indent, pin));
            }
            BlockKind::SerialPrint => {
                code.push_str(&format!("{}Serial.print({});\n", indent, self.input(block, "value", depth)?));
            }
            BlockKind::SerialPrintln => {
                code.push_str(&format!("{}Serial.println({});\n", indent, self.input(block, "value", depth)?));
            }

            BlockKind::MillisDelay => {
                // Everything after the delay only runs once the interval has elapsed
                let timer = format!("__lastMillis_{}", sanitize(id));
                code.push_str(&format!("{}static unsigned long {} = 0;\n", indent, timer));
                code.push_str(&format!(
                    "{}if (millis() - {} >= {}) {{\n",
                    indent,
                    timer,
                    self.input(block, "duration", depth)?
                ));
                code.push_str(&format!("{}  {} = millis();\n", indent, timer));

                let mut inner = String::new();
                if let Some(next) = self.advance(block, level + 1, depth, visited, &mut inner)? {
                    inner.push_str(&self.lower_at_depth(Some(next), level + 1, depth + 1)?);
                }
                code.push_str(&inner);
                code.push_str(&format!("{}}}\n", indent));
                return Ok(Next::End);
            }

            BlockKind::VariableSet(config) => match config.configured_name() {
                Some(name) => {
                    code.push_str(&format!("{}{} = {};\n", indent, name, self.input(block, "value_in", depth)?));
                }
                None => unconfigured(code, indent, block),
            },
            BlockKind::VariableToggle(config) => match config.configured_name() {
                Some(name) => code.push_str(&format!("{}{} = !{};\n", indent, name, name)),
                None => unconfigured(code, indent, block),
            },
            BlockKind::VariableIncrement(config) => match config.configured_name() {
                Some(name) => code.push_str(&format!("{}{}++;\n", indent, name)),
                None => unconfigured(code, indent, block),
            },
            BlockKind::VariableDecrement(config) => match config.configured_name() {
                Some(name) => code.push_str(&format!("{}{}--;\n", indent, name)),
                None => unconfigured(code, indent, block),
            },

            BlockKind::Comment(config) => {
                let text = config.comment.replace(&['\r', '\n'][..], " ");
                code.push_str(&format!("{}// {}\n", indent, text));
            }

            BlockKind::If => {
                code.push_str(&format!("{}if ({}) {{\n", indent, self.input(block, "condition", depth)?));
                code.push_str(&self.branch(block, "exec_out_then", level + 1, depth)?);
                if self.index.next_execution_block(id, "exec_out_else").is_some() {
                    code.push_str(&format!("{}}} else {{\n", indent));
                    code.push_str(&self.branch(block, "exec_out_else", level + 1, depth)?);
                }
                code.push_str(&format!("{}}}\n", indent));
                return Ok(Next::End);
            }
            BlockKind::While => {
                code.push_str(&format!("{}while ({}) {{\n", indent, self.input(block, "condition", depth)?));
                code.push_str(&self.branch(block, "exec_out_loop", level + 1, depth)?);
                code.push_str(&format!("{}}}\n", indent));
                return Ok(Next::After("exec_out_end"));
            }
            BlockKind::LoopFixed => {
                let var = format!("i_{}", sanitize(id));
                code.push_str(&format!(
                    "{}for (int {var} = 0; {var} < {}; {var}++) {{\n",
                    indent,
                    self.input(block, "iterations", depth)?,
                    var = var
                ));
                code.push_str(&self.branch(block, "exec_out_loop", level + 1, depth)?);
                code.push_str(&format!("{}}}\n", indent));
                return Ok(Next::After("exec_out_end"));
            }
            BlockKind::ForLoop(config) => {
                match config.var_name.as_deref().filter(|name| !name.trim().is_empty()) {
                    Some(var) => {
                        code.push_str(&format!(
                            "{}for (int {var} = {}; {var} < {}; {var} += {}) {{\n",
                            indent,
                            config.from,
                            config.to,
                            config.step,
                            var = var
                        ));
                        code.push_str(&self.branch(block, "exec_out_body", level + 1, depth)?);
                        code.push_str(&format!("{}}}\n", indent));
                    }
                    None => unconfigured(code, indent, block),
                }
                return Ok(Next::After("exec_out_end"));
            }
            BlockKind::ForEach => {
                code.push_str(&format!(
                    "{}for (auto & element_{} : {}) {{\n",
                    indent,
                    sanitize(id),
                    self.input(block, "array_in", depth)?
                ));
                code.push_str(&self.branch(block, "exec_out_loop", level + 1, depth)?);
                code.push_str(&format!("{}}}\n", indent));
                return Ok(Next::After("exec_out_end"));
            }

            BlockKind::FunctionCall(config) => {
                match config.function_name.as_deref().filter(|name| !name.trim().is_empty()) {
                    Some(name) => code.push_str(&format!("{}{}({});\n", indent, name, config.args.join(", "))),
                    None => unconfigured(code, indent, block),
                }
            }
            BlockKind::CallFunction { function_id } => {
                let name = self
                    .index
                    .function(function_id)
                    .map(|function| function.name.clone())
                    .unwrap_or_else(|| format!("/* unknown_fn_{} */", function_id));
                let args = block
                    .node
                    .ports
                    .data_ins
                    .iter()
                    .map(|port| self.input(block, &port.id, depth))
                    .collect::<Result<Vec<_>>>()?;
                code.push_str(&format!("{}{}({});\n", indent, name, args.join(", ")));
            }
            BlockKind::Return(config) => {
                if self.index.data_source(id, "value").is_some() {
                    code.push_str(&format!("{}return {};\n", indent, self.input(block, "value", depth)?));
                } else if let Some(expression) = config.expression() {
                    code.push_str(&format!("{}return {};\n", indent, expression));
                } else {
                    code.push_str(&format!("{}return;\n", indent));
                }
            }

            BlockKind::Unknown(type_id) => {
                code.push_str(&format!("{}// Unhandled block: {} (ID: {})\n", indent, type_id, id));
            }

            // Entry markers and pure producers emit nothing on their own
            BlockKind::SetupStart
            | BlockKind::LoopStart
            | BlockKind::FunctionStart(_)
            | BlockKind::VariableGet(_)
            | BlockKind::ConstantNumber(_)
            | BlockKind::ConstantString(_)
            | BlockKind::ConstantBoolean(_)
            | BlockKind::ConstantArray(_)
            | BlockKind::MathOperation(_)
            | BlockKind::LogicOperation(_)
            | BlockKind::DigitalRead
            | BlockKind::AnalogRead
            | BlockKind::GetTime => {}
        }

        Ok(Next::Advance)
    }
}

fn unconfigured(code: &mut String, indent: &str, block: &Block<'_>) {
    code.push_str(&format!("{}// Unconfigured {} block\n", indent, block.type_id()));
}

/// Instance id made safe for use inside a C++ identifier
pub fn sanitize(instance_id: &str) -> String {
    instance_id
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() { c } else { '_' })
        .collect()
}
