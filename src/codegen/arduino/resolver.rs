//! # Value Resolver
//!
//! Turns the value flowing into a data input into an Arduino expression.
//! Expressions nest as deep as the data graph does; the chain of producers
//! currently being rendered is threaded through every call so a data cycle is
//! reported instead of recursing forever. Expression nesting counts against the
//! same depth budget as the statement nesting it sits in.

use crate::error::{JbgcError, Result};
use crate::graph::{Block, BlockKind, GraphIndex, Literal, LogicOperator, MathOperator, Node};
use regex::Regex;

lazy_static::lazy_static! {
    static ref OPERAND_PORT: Regex = Regex::new(r"^operand_(\d+)$").unwrap();
}

pub struct ValueResolver<'i, 'a> {
    index: &'i GraphIndex<'a>,
    max_depth: usize,
}

impl<'i, 'a> ValueResolver<'i, 'a> {
    pub fn new(index: &'i GraphIndex<'a>, max_depth: usize) -> Self {
        Self { index, max_depth }
    }

    /// Expression for the value feeding `port` on the consuming block.
    ///
    /// `depth` is the statement nesting the consumer is lowered at. Unwired
    /// inputs fall back to a literal of the same name in the block's config,
    /// then to a placeholder comment. Neither case is an error.
    pub fn resolve_value(&self, consumer: &str, port: &str, depth: usize) -> Result<String> {
        let block = self.index.block(consumer)?;
        let mut trail = Trail {
            depth,
            producers: vec![block.instance_id()],
        };
        self.resolve_input(block, port, &mut trail)
    }

    fn resolve_input(&self, consumer: &Block<'a>, port: &str, trail: &mut Trail<'a>) -> Result<String> {
        let Some(source) = self.index.data_source(consumer.instance_id(), port) else {
            return unconnected(consumer, port);
        };

        if trail.producers.contains(&source.node_id) {
            return Err(JbgcError::DataCycle {
                node: consumer.instance_id().to_string(),
                port: port.to_string(),
            });
        }
        if trail.nesting() > self.max_depth {
            return Err(JbgcError::RecursionLimit {
                limit: self.max_depth,
                node: source.node_id.to_string(),
            });
        }

        let producer = self.index.block(source.node_id)?;
        trail.producers.push(source.node_id);
        let rendered = self.render_producer(producer, source.port_id, trail);
        trail.producers.pop();
        rendered
    }

    fn render_producer(&self, producer: &Block<'a>, port: &str, trail: &mut Trail<'a>) -> Result<String> {
        match &producer.kind {
            BlockKind::VariableGet(config) => Ok(config
                .configured_name()
                .map(str::to_string)
                .unwrap_or_else(|| "/* unconfigured_variable_get */".to_string())),

            BlockKind::ConstantNumber(text) => Ok(text.clone()),
            BlockKind::ConstantString(text) => string_literal(text),
            BlockKind::ConstantBoolean(value) => Ok(value.to_string()),
            BlockKind::ConstantArray(items) => {
                let rendered = items.iter().map(render_literal).collect::<Result<Vec<_>>>()?;
                Ok(format!("{{{}}}", rendered.join(", ")))
            }

            BlockKind::MathOperation(config) => {
                let left = self.resolve_input(producer, "operand_a", trail)?;
                let right = self.resolve_input(producer, "operand_b", trail)?;
                let symbol = match config.operator {
                    MathOperator::Add => "+",
                    MathOperator::Subtract => "-",
                    MathOperator::Multiply => "*",
                    MathOperator::Divide => "/",
                };
                Ok(format!("({} {} {})", left, symbol, right))
            }

            BlockKind::LogicOperation(config) => {
                let operands = operand_ports(producer.node);
                if config.operator == LogicOperator::Not {
                    let port = operands.first().copied().unwrap_or("operand_1");
                    let operand = self.resolve_input(producer, port, trail)?;
                    return Ok(format!("(!{})", operand));
                }
                if operands.is_empty() {
                    return Ok("false".to_string());
                }
                let symbol = match config.operator {
                    LogicOperator::Or => " || ",
                    LogicOperator::Xor => " ^ ",
                    _ => " && ",
                };
                let rendered = operands
                    .iter()
                    .map(|port| self.resolve_input(producer, port, trail))
                    .collect::<Result<Vec<_>>>()?;
                Ok(format!("({})", rendered.join(symbol)))
            }

            BlockKind::DigitalRead => Ok(format!("digitalRead({})", self.resolve_input(producer, "pin", trail)?)),
            BlockKind::AnalogRead => Ok(format!("analogRead({})", self.resolve_input(producer, "pin", trail)?)),
            BlockKind::GetTime => Ok("millis()".to_string()),

            BlockKind::FunctionStart(config) => {
                let configured = config
                    .params
                    .iter()
                    .find(|param| param.id == port)
                    .map(|param| param.name.clone());
                let declared = || {
                    self.index
                        .function_starting_at(producer.instance_id())
                        .and_then(|function| function.parameters.iter().find(|param| param.id == port))
                        .map(|param| param.name.clone())
                };
                Ok(configured
                    .or_else(declared)
                    .filter(|name| !name.is_empty())
                    .unwrap_or_else(|| format!("/* unconfigured_function_param_{} */", port)))
            }

            _ => Ok(format!("/* val_from_{}.{} */", producer.type_id(), port)),
        }
    }
}

/// Producers being rendered, on top of the statement depth they started at
struct Trail<'a> {
    depth: usize,
    producers: Vec<&'a str>,
}

impl Trail<'_> {
    fn nesting(&self) -> usize {
        self.depth + self.producers.len()
    }
}

/// Value of an unwired input: same-named config literal, else a placeholder
fn unconnected(consumer: &Block<'_>, port: &str) -> Result<String> {
    match consumer.literal(port) {
        Some(literal) => render_literal(literal),
        None => Ok(format!("/* {}_unconnected_on_{} */", port, consumer.display_name())),
    }
}

pub(crate) fn render_literal(literal: &Literal) -> Result<String> {
    match literal {
        Literal::Number(text) => Ok(text.clone()),
        Literal::Text(text) => string_literal(text),
        Literal::Boolean(value) => Ok(value.to_string()),
    }
}

fn string_literal(text: &str) -> Result<String> {
    Ok(format!("String({})", serde_json::to_string(text)?))
}

/// Data inputs named `operand_<N>`, ordered by N
fn operand_ports(node: &Node) -> Vec<&str> {
    let mut operands: Vec<(u64, &str)> = node
        .ports
        .data_ins
        .iter()
        .filter_map(|port| {
            let captures = OPERAND_PORT.captures(&port.id)?;
            let position = captures.get(1)?.as_str().parse().ok()?;
            Some((position, port.id.as_str()))
        })
        .collect();
    operands.sort_by_key(|(position, _)| *position);
    operands.into_iter().map(|(_, id)| id).collect()
}
