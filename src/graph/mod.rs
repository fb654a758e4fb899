//! # Graph Model
//!
//! The project value produced by the block editor: placed blocks with typed
//! ports, the connections between them, and the project-level function and
//! variable tables. Everything here deserializes straight from the editor's
//! saved JSON.

use serde::{Deserialize, Serialize};
use serde_json::Value;

pub mod block;
pub mod editing;
pub mod index;

pub use block::*;
pub use index::{GraphIndex, PortRef};

/// Version tag written by the current editor
pub const JINO_APP_VERSION: &str = "0.1.0";

/// Value types carried by ports, variables and function parameters.
///
/// Unknown type names deserialize as [`ValueType::Any`]. The localized catalog
/// names used by variable blocks are accepted as aliases.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ValueType {
    Execution,
    #[serde(alias = "Nombre")]
    Number,
    #[serde(alias = "Texte")]
    String,
    #[serde(alias = "Booléen", alias = "Booleen")]
    Boolean,
    #[serde(alias = "Tableau")]
    Array,
    #[default]
    #[serde(other)]
    Any,
}

impl ValueType {
    /// Check if a value of this type may flow into a port of `other`
    pub fn is_compatible_with(&self, other: &ValueType) -> bool {
        match (self, other) {
            (ValueType::Any, _) | (_, ValueType::Any) => true,
            (a, b) => a == b,
        }
    }
}

impl std::fmt::Display for ValueType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            ValueType::Execution => "execution",
            ValueType::Number => "number",
            ValueType::String => "string",
            ValueType::Boolean => "boolean",
            ValueType::Array => "array",
            ValueType::Any => "any",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PortKind {
    Execution,
    Data,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PortFlow {
    In,
    Out,
}

/// A typed connection point on a block
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Port {
    #[serde(alias = "portId")]
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default)]
    pub data_type: ValueType,
    pub kind: PortKind,
    pub flow: PortFlow,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub provides_data: Vec<Port>,
}

impl Port {
    pub fn new(id: &str, data_type: ValueType, kind: PortKind, flow: PortFlow) -> Self {
        Self {
            id: id.to_string(),
            name: None,
            data_type,
            kind,
            flow,
            color: None,
            provides_data: Vec::new(),
        }
    }

    pub fn execution_in(id: &str) -> Self {
        Self::new(id, ValueType::Execution, PortKind::Execution, PortFlow::In)
    }

    pub fn execution_out(id: &str) -> Self {
        Self::new(id, ValueType::Execution, PortKind::Execution, PortFlow::Out)
    }

    pub fn data_in(id: &str, data_type: ValueType) -> Self {
        Self::new(id, data_type, PortKind::Data, PortFlow::In)
    }

    pub fn data_out(id: &str, data_type: ValueType) -> Self {
        Self::new(id, data_type, PortKind::Data, PortFlow::Out)
    }

    pub fn with_name(mut self, name: &str) -> Self {
        self.name = Some(name.to_string());
        self
    }
}

/// The ports of a block, grouped by role
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", from = "RawPorts")]
pub struct NodePorts {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub execution_in: Option<Port>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub execution_outs: Vec<Port>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub data_ins: Vec<Port>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub data_outs: Vec<Port>,
}

impl NodePorts {
    /// Iterate over every declared port, execution ports first
    pub fn iter(&self) -> impl Iterator<Item = &Port> {
        self.execution_in
            .iter()
            .chain(self.execution_outs.iter())
            .chain(self.data_ins.iter())
            .chain(self.data_outs.iter())
    }

    pub fn find(&self, port_id: &str) -> Option<&Port> {
        self.iter().find(|port| port.id == port_id)
    }

    /// Sort a flat port list into role groups
    fn from_flat(ports: Vec<Port>) -> Self {
        let mut grouped = NodePorts::default();
        for port in ports {
            match (port.kind, port.flow) {
                (PortKind::Execution, PortFlow::In) => {
                    if grouped.execution_in.is_none() {
                        grouped.execution_in = Some(port);
                    }
                }
                (PortKind::Execution, PortFlow::Out) => grouped.execution_outs.push(port),
                (PortKind::Data, PortFlow::In) => grouped.data_ins.push(port),
                (PortKind::Data, PortFlow::Out) => grouped.data_outs.push(port),
            }
        }
        grouped
    }
}

/// Wire forms accepted for a block's ports: a flat list, or the grouped object
/// written by the editor (whose entries may omit `kind`/`flow`).
#[derive(Deserialize)]
#[serde(untagged)]
enum RawPorts {
    Flat(Vec<Port>),
    Grouped(RawGroupedPorts),
}

#[derive(Deserialize, Default)]
#[serde(default, rename_all = "camelCase")]
struct RawGroupedPorts {
    execution_in: Option<RawPort>,
    execution_out: Option<RawPort>,
    execution_outs: Vec<RawPort>,
    data_ins: Vec<RawPort>,
    data_outs: Vec<RawPort>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawPort {
    #[serde(alias = "portId")]
    id: String,
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    data_type: Option<ValueType>,
    #[serde(default)]
    kind: Option<PortKind>,
    #[serde(default)]
    flow: Option<PortFlow>,
    #[serde(default)]
    color: Option<String>,
    #[serde(default)]
    provides_data: Vec<Port>,
}

impl RawPort {
    fn into_port(self, kind: PortKind, flow: PortFlow) -> Port {
        let default_type = match kind {
            PortKind::Execution => ValueType::Execution,
            PortKind::Data => ValueType::Any,
        };
        Port {
            id: self.id,
            name: self.name,
            data_type: self.data_type.unwrap_or(default_type),
            kind: self.kind.unwrap_or(kind),
            flow: self.flow.unwrap_or(flow),
            color: self.color,
            provides_data: self.provides_data,
        }
    }
}

impl From<RawPorts> for NodePorts {
    fn from(raw: RawPorts) -> Self {
        match raw {
            RawPorts::Flat(ports) => NodePorts::from_flat(ports),
            RawPorts::Grouped(groups) => {
                let mut execution_outs: Vec<Port> = groups
                    .execution_outs
                    .into_iter()
                    .map(|p| p.into_port(PortKind::Execution, PortFlow::Out))
                    .collect();
                if execution_outs.is_empty() {
                    if let Some(single) = groups.execution_out {
                        execution_outs.push(single.into_port(PortKind::Execution, PortFlow::Out));
                    }
                }
                NodePorts {
                    execution_in: groups
                        .execution_in
                        .map(|p| p.into_port(PortKind::Execution, PortFlow::In)),
                    execution_outs,
                    data_ins: groups
                        .data_ins
                        .into_iter()
                        .map(|p| p.into_port(PortKind::Data, PortFlow::In))
                        .collect(),
                    data_outs: groups
                        .data_outs
                        .into_iter()
                        .map(|p| p.into_port(PortKind::Data, PortFlow::Out))
                        .collect(),
                }
            }
        }
    }
}

/// A block placed on the canvas
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Node {
    /// Block type identifier, shared by every placement of the same type
    pub id: String,
    /// Unique per placement
    pub instance_id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub top: f64,
    #[serde(default)]
    pub left: f64,
    #[serde(default)]
    pub ports: NodePorts,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub config: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub documentation: Option<String>,
}

impl Node {
    pub fn new(type_id: &str, instance_id: &str) -> Self {
        Self {
            id: type_id.to_string(),
            instance_id: instance_id.to_string(),
            name: type_id.to_string(),
            top: 0.0,
            left: 0.0,
            ports: NodePorts::default(),
            config: None,
            documentation: None,
        }
    }

    pub fn with_name(mut self, name: &str) -> Self {
        self.name = name.to_string();
        self
    }

    pub fn with_exec_in(mut self, port_id: &str) -> Self {
        self.ports.execution_in = Some(Port::execution_in(port_id));
        self
    }

    pub fn with_exec_out(mut self, port_id: &str) -> Self {
        self.ports.execution_outs.push(Port::execution_out(port_id));
        self
    }

    pub fn with_data_in(mut self, port_id: &str, data_type: ValueType) -> Self {
        self.ports.data_ins.push(Port::data_in(port_id, data_type));
        self
    }

    pub fn with_data_out(mut self, port_id: &str, data_type: ValueType) -> Self {
        self.ports.data_outs.push(Port::data_out(port_id, data_type));
        self
    }

    pub fn with_config(mut self, config: Value) -> Self {
        self.config = Some(config);
        self
    }

    /// Name shown to the user, falling back to the block type
    pub fn display_name(&self) -> &str {
        if self.name.is_empty() {
            &self.id
        } else {
            &self.name
        }
    }

    pub fn find_port(&self, port_id: &str) -> Option<&Port> {
        self.ports.find(port_id)
    }

    pub fn has_execution_port(&self, port_id: &str) -> bool {
        self.find_port(port_id)
            .map(|port| port.kind == PortKind::Execution)
            .unwrap_or(false)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConnectionType {
    Execution,
    Data,
}

/// A wire between an output port and an input port
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Connection {
    pub id: String,
    pub from_block_instance_id: String,
    pub from_port_id: String,
    pub to_block_instance_id: String,
    pub to_port_id: String,
    #[serde(rename = "type")]
    pub connection_type: ConnectionType,
}

impl Connection {
    pub fn new(
        id: &str,
        from_node: &str,
        from_port: &str,
        to_node: &str,
        to_port: &str,
        connection_type: ConnectionType,
    ) -> Self {
        Self {
            id: id.to_string(),
            from_block_instance_id: from_node.to_string(),
            from_port_id: from_port.to_string(),
            to_block_instance_id: to_node.to_string(),
            to_port_id: to_port.to_string(),
            connection_type,
        }
    }

    pub fn execution(id: &str, from_node: &str, from_port: &str, to_node: &str, to_port: &str) -> Self {
        Self::new(id, from_node, from_port, to_node, to_port, ConnectionType::Execution)
    }

    pub fn data(id: &str, from_node: &str, from_port: &str, to_node: &str, to_port: &str) -> Self {
        Self::new(id, from_node, from_port, to_node, to_port, ConnectionType::Data)
    }

    pub fn touches(&self, instance_id: &str) -> bool {
        self.from_block_instance_id == instance_id || self.to_block_instance_id == instance_id
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FunctionParameter {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub data_type: ValueType,
}

/// A user function, rooted at a `function_definition_start` block
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DefinedFunction {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub parameters: Vec<FunctionParameter>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub return_type: Option<ValueType>,
    pub start_block_instance_id: String,
}

/// A project-wide global variable
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DefinedVariable {
    pub name: String,
    #[serde(default)]
    pub data_type: ValueType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub array_element_type: Option<ValueType>,
}

impl DefinedVariable {
    pub fn new(name: &str, data_type: ValueType) -> Self {
        Self {
            name: name.to_string(),
            data_type,
            array_element_type: None,
        }
    }

    pub fn array_of(name: &str, element_type: ValueType) -> Self {
        Self {
            name: name.to_string(),
            data_type: ValueType::Array,
            array_element_type: Some(element_type),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct PanOffset {
    pub x: f64,
    pub y: f64,
}

/// Canvas view state; irrelevant to compilation
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UiState {
    pub zoom_level: f64,
    pub pan_offset: PanOffset,
}

/// A complete saved project
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Project {
    #[serde(rename = "jinoVersion", default = "default_version")]
    pub version: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub project_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_saved: Option<String>,
    #[serde(rename = "droppedComponents", default)]
    pub nodes: Vec<Node>,
    #[serde(default)]
    pub connections: Vec<Connection>,
    #[serde(default)]
    pub defined_functions: Vec<DefinedFunction>,
    #[serde(default)]
    pub defined_variables: Vec<DefinedVariable>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ui_state: Option<UiState>,
}

fn default_version() -> String {
    JINO_APP_VERSION.to_string()
}

impl Project {
    pub fn new(name: &str) -> Self {
        Self {
            version: default_version(),
            project_name: Some(name.to_string()),
            last_saved: None,
            nodes: Vec::new(),
            connections: Vec::new(),
            defined_functions: Vec::new(),
            defined_variables: Vec::new(),
            ui_state: None,
        }
    }

    pub fn from_json(json: &str) -> crate::Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn to_json_pretty(&self) -> crate::Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn add_node(&mut self, node: Node) {
        self.nodes.push(node);
    }

    pub fn add_connection(&mut self, connection: Connection) {
        self.connections.push(connection);
    }

    pub fn find_node(&self, instance_id: &str) -> Option<&Node> {
        self.nodes.iter().find(|node| node.instance_id == instance_id)
    }

    pub fn find_function(&self, function_id: &str) -> Option<&DefinedFunction> {
        self.defined_functions.iter().find(|f| f.id == function_id)
    }
}
