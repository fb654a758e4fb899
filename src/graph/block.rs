//! # Block Kinds
//!
//! Typed view of a placed block. The editor stores a block's configuration as
//! an untyped JSON payload; it is interpreted once here, when the graph index is
//! built, instead of at every code generation call site.

use super::{FunctionParameter, Node, ValueType};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::Value;
use std::collections::HashMap;

/// Type-id prefix of the call blocks synthesized for user functions
pub const CALL_FUNCTION_PREFIX: &str = "call_func_";

/// A scalar literal baked into a block's configuration
#[derive(Debug, Clone, PartialEq)]
pub enum Literal {
    /// Numeric text, kept verbatim
    Number(String),
    Text(String),
    Boolean(bool),
}

impl Literal {
    pub fn from_json(value: &Value) -> Option<Self> {
        match value {
            Value::Number(n) => Some(Literal::Number(n.to_string())),
            Value::String(s) => Some(Literal::Text(s.clone())),
            Value::Bool(b) => Some(Literal::Boolean(*b)),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum MathOperator {
    #[default]
    Add,
    Subtract,
    Multiply,
    Divide,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum LogicOperator {
    #[default]
    And,
    Or,
    Not,
    Xor,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct MathConfig {
    pub operator: MathOperator,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct LogicConfig {
    pub operator: LogicOperator,
    pub num_inputs: Option<usize>,
}

impl LogicConfig {
    /// Operand count the block should expose: one for NOT, at least two otherwise
    pub fn operand_count(&self) -> usize {
        match self.operator {
            LogicOperator::Not => 1,
            _ => self.num_inputs.unwrap_or(2).max(2),
        }
    }
}

/// Config shared by every variable block
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct VariableConfig {
    pub name: Option<String>,
    pub is_new: bool,
    pub data_type: Option<ValueType>,
    pub array_element_type: Option<ValueType>,
}

impl VariableConfig {
    pub fn configured_name(&self) -> Option<&str> {
        self.name.as_deref().filter(|name| !name.trim().is_empty())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct FunctionDefinitionConfig {
    pub name: Option<String>,
    pub params: Vec<FunctionParameter>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ForLoopConfig {
    pub var_name: Option<String>,
    pub from: f64,
    pub to: f64,
    pub step: f64,
}

impl Default for ForLoopConfig {
    fn default() -> Self {
        Self {
            var_name: None,
            from: 0.0,
            to: 10.0,
            step: 1.0,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct FunctionCallConfig {
    pub function_name: Option<String>,
    pub args: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ReturnConfig {
    pub value: Option<Value>,
}

impl ReturnConfig {
    /// Configured return expression, taken verbatim
    pub fn expression(&self) -> Option<String> {
        match &self.value {
            None | Some(Value::Null) => None,
            Some(Value::String(s)) if s.trim().is_empty() => None,
            Some(Value::String(s)) => Some(s.clone()),
            Some(other) => Some(other.to_string()),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct CommentConfig {
    pub comment: String,
}

/// Every block type the compiler knows, with its parsed configuration
#[derive(Debug, Clone, PartialEq)]
pub enum BlockKind {
    SetupStart,
    SetupEnd,
    LoopStart,
    LoopEnd,
    FunctionStart(FunctionDefinitionConfig),
    FunctionEnd,

    LedOn,
    LedOff,
    SetPinState,
    AnalogWrite,
    Delay,
    MillisDelay,
    BuzzerPlay,
    SerialPrint,
    SerialPrintln,

    VariableSet(VariableConfig),
    VariableGet(VariableConfig),
    VariableToggle(VariableConfig),
    VariableIncrement(VariableConfig),
    VariableDecrement(VariableConfig),
    Comment(CommentConfig),

    If,
    While,
    LoopFixed,
    ForLoop(ForLoopConfig),
    ForEach,
    FunctionCall(FunctionCallConfig),
    Return(ReturnConfig),
    CallFunction { function_id: String },

    ConstantNumber(String),
    ConstantString(String),
    ConstantBoolean(bool),
    ConstantArray(Vec<Literal>),
    MathOperation(MathConfig),
    LogicOperation(LogicConfig),
    DigitalRead,
    AnalogRead,
    GetTime,

    /// Catalog-defined type this compiler has no lowering for
    Unknown(String),
}

impl BlockKind {
    pub fn from_node(node: &Node) -> Self {
        match node.id.as_str() {
            "program_setup_start" => BlockKind::SetupStart,
            "program_setup_end" => BlockKind::SetupEnd,
            "program_loop_start" => BlockKind::LoopStart,
            "program_loop_end" => BlockKind::LoopEnd,
            "function_definition_start" => BlockKind::FunctionStart(parse_config(node)),
            "function_definition_end" => BlockKind::FunctionEnd,
            "led_on" => BlockKind::LedOn,
            "led_off" => BlockKind::LedOff,
            "set_pin_state" => BlockKind::SetPinState,
            "analog_write" => BlockKind::AnalogWrite,
            "delay" => BlockKind::Delay,
            "millis_delay" => BlockKind::MillisDelay,
            "buzzer_play" => BlockKind::BuzzerPlay,
            "serial_print" => BlockKind::SerialPrint,
            "serial_println" => BlockKind::SerialPrintln,
            "variable_set" => BlockKind::VariableSet(parse_config(node)),
            "variable_get" => BlockKind::VariableGet(parse_config(node)),
            "variable_toggle" => BlockKind::VariableToggle(parse_config(node)),
            "variable_increment" => BlockKind::VariableIncrement(parse_config(node)),
            "variable_decrement" => BlockKind::VariableDecrement(parse_config(node)),
            "user_comment" => BlockKind::Comment(parse_config(node)),
            "if" => BlockKind::If,
            "while" => BlockKind::While,
            "loop_fixed" => BlockKind::LoopFixed,
            "for_loop" => BlockKind::ForLoop(parse_config(node)),
            "loop_array_foreach" => BlockKind::ForEach,
            "function_call" => BlockKind::FunctionCall(parse_config(node)),
            "return" => BlockKind::Return(parse_config(node)),
            "constant_number" => BlockKind::ConstantNumber(number_text(config_value(node))),
            "constant_string" => BlockKind::ConstantString(plain_text(config_value(node))),
            "constant_boolean" => BlockKind::ConstantBoolean(truthy(config_value(node))),
            "constant_array" => BlockKind::ConstantArray(array_items(config_value(node))),
            "math_operation" => BlockKind::MathOperation(parse_config(node)),
            "logic_operation" => BlockKind::LogicOperation(parse_config(node)),
            "button_read" | "sensor_digital_read" => BlockKind::DigitalRead,
            "sensor_read" => BlockKind::AnalogRead,
            "get_time" => BlockKind::GetTime,
            other => match other.strip_prefix(CALL_FUNCTION_PREFIX) {
                Some(function_id) => BlockKind::CallFunction {
                    function_id: function_id.to_string(),
                },
                None => BlockKind::Unknown(other.to_string()),
            },
        }
    }

    /// Blocks that end an init, repeat or function sequence
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            BlockKind::SetupEnd | BlockKind::LoopEnd | BlockKind::FunctionEnd
        )
    }
}

/// Deserialize a block's config into its typed form, falling back to defaults
fn parse_config<T: DeserializeOwned + Default>(node: &Node) -> T {
    match &node.config {
        None | Some(Value::Null) => T::default(),
        Some(value) => serde_json::from_value(value.clone()).unwrap_or_else(|e| {
            tracing::warn!(
                "[BLOCK] Malformed config on '{}' ({}): {}; using defaults",
                node.instance_id,
                node.id,
                e
            );
            T::default()
        }),
    }
}

fn config_value(node: &Node) -> Option<&Value> {
    node.config.as_ref().and_then(|config| config.get("value"))
}

fn number_text(value: Option<&Value>) -> String {
    match value {
        Some(Value::Number(n)) => n.to_string(),
        Some(Value::String(s)) if s.trim().parse::<f64>().is_ok() => s.trim().to_string(),
        _ => "0".to_string(),
    }
}

fn plain_text(value: Option<&Value>) -> String {
    match value {
        None | Some(Value::Null) => String::new(),
        Some(Value::String(s)) => s.clone(),
        Some(other) => other.to_string(),
    }
}

fn truthy(value: Option<&Value>) -> bool {
    match value {
        Some(Value::Bool(b)) => *b,
        Some(Value::String(s)) => s.eq_ignore_ascii_case("true"),
        Some(Value::Number(n)) => n.as_f64().map(|f| f != 0.0).unwrap_or(false),
        _ => false,
    }
}

fn array_items(value: Option<&Value>) -> Vec<Literal> {
    match value {
        Some(Value::Array(items)) => items.iter().filter_map(Literal::from_json).collect(),
        _ => Vec::new(),
    }
}

/// A node paired with its parsed kind and config literals
#[derive(Debug, Clone)]
pub struct Block<'a> {
    pub node: &'a Node,
    pub kind: BlockKind,
    literals: HashMap<String, Literal>,
}

impl<'a> Block<'a> {
    pub fn from_node(node: &'a Node) -> Self {
        let literals = match &node.config {
            Some(Value::Object(fields)) => fields
                .iter()
                .filter_map(|(key, value)| Literal::from_json(value).map(|lit| (key.clone(), lit)))
                .collect(),
            _ => HashMap::new(),
        };

        Self {
            node,
            kind: BlockKind::from_node(node),
            literals,
        }
    }

    pub fn instance_id(&self) -> &'a str {
        &self.node.instance_id
    }

    pub fn type_id(&self) -> &'a str {
        &self.node.id
    }

    pub fn display_name(&self) -> &'a str {
        self.node.display_name()
    }

    /// Literal stored in the config under a port's id, used when the port is unwired
    pub fn literal(&self, port_id: &str) -> Option<&Literal> {
        self.literals.get(port_id)
    }
}
