//! # Project Editing
//!
//! Keeps the project-level function and variable tables consistent with the
//! blocks that define them, as blocks are configured and removed.

use super::{
    BlockKind, DefinedFunction, DefinedVariable, FunctionDefinitionConfig, LogicConfig,
    LogicOperator, Node, Port, Project, ValueType, VariableConfig, CALL_FUNCTION_PREFIX,
};
use crate::error::{JbgcError, Result};
use serde_json::Value;

/// Name given to a function whose definition block has no name yet
pub const DEFAULT_FUNCTION_NAME: &str = "maFonction";

const VARIABLE_BLOCK_TYPES: [&str; 5] = [
    "variable_set",
    "variable_get",
    "variable_toggle",
    "variable_increment",
    "variable_decrement",
];

impl Project {
    /// Merge a config patch into a block and update everything derived from it.
    pub fn save_block_config(&mut self, instance_id: &str, patch: Value) -> Result<()> {
        let position = self
            .nodes
            .iter()
            .position(|node| node.instance_id == instance_id)
            .ok_or_else(|| JbgcError::NodeNotFound(instance_id.to_string()))?;

        let previous = self.nodes[position].config.clone();
        let merged = merge_config(previous.clone(), patch);
        self.nodes[position].config = Some(merged);

        match self.nodes[position].id.as_str() {
            "variable_set" => {
                let old_name = previous
                    .as_ref()
                    .and_then(|config| config.get("name"))
                    .and_then(Value::as_str)
                    .map(str::to_string);
                self.sync_variable_set(position, old_name);
            }
            "variable_get" => {
                if let BlockKind::VariableGet(config) = BlockKind::from_node(&self.nodes[position]) {
                    if let (Some(data_type), Some(port)) =
                        (config.data_type, self.nodes[position].ports.data_outs.first_mut())
                    {
                        port.data_type = data_type;
                    }
                }
            }
            "function_definition_start" => self.sync_function_definition(position),
            "logic_operation" => self.sync_logic_operands(position),
            _ => {}
        }

        Ok(())
    }

    /// Remove a block, its connections, and any definitions only it kept alive.
    pub fn remove_node(&mut self, instance_id: &str) -> Result<Node> {
        let position = self
            .nodes
            .iter()
            .position(|node| node.instance_id == instance_id)
            .ok_or_else(|| JbgcError::NodeNotFound(instance_id.to_string()))?;

        let removed = self.nodes.remove(position);
        self.connections.retain(|c| !c.touches(instance_id));

        match BlockKind::from_node(&removed) {
            BlockKind::FunctionStart(_) => {
                let function_ids: Vec<String> = self
                    .defined_functions
                    .iter()
                    .filter(|f| f.start_block_instance_id == instance_id)
                    .map(|f| f.id.clone())
                    .collect();
                self.defined_functions
                    .retain(|f| f.start_block_instance_id != instance_id);

                for function_id in function_ids {
                    let call_type = format!("{}{}", CALL_FUNCTION_PREFIX, function_id);
                    let callers: Vec<String> = self
                        .nodes
                        .iter()
                        .filter(|node| node.id == call_type)
                        .map(|node| node.instance_id.clone())
                        .collect();
                    for caller in callers {
                        tracing::debug!("[EDIT] Removing call block '{}' of deleted function", caller);
                        self.nodes.retain(|node| node.instance_id != caller);
                        self.connections.retain(|c| !c.touches(&caller));
                    }
                }
            }
            BlockKind::VariableSet(config)
            | BlockKind::VariableGet(config)
            | BlockKind::VariableToggle(config)
            | BlockKind::VariableIncrement(config)
            | BlockKind::VariableDecrement(config) => {
                if let Some(name) = config.configured_name() {
                    self.forget_variable_if_unused(name);
                }
            }
            _ => {}
        }

        Ok(removed)
    }

    /// Drop connections whose endpoints are no longer declared
    pub fn prune_dangling_connections(&mut self) {
        let nodes = &self.nodes;
        let declared = |node_id: &str, port_id: &str| {
            nodes
                .iter()
                .find(|node| node.instance_id == node_id)
                .map(|node| node.find_port(port_id).is_some())
                .unwrap_or(false)
        };
        self.connections.retain(|c| {
            declared(&c.from_block_instance_id, &c.from_port_id)
                && declared(&c.to_block_instance_id, &c.to_port_id)
        });
    }

    fn sync_variable_set(&mut self, position: usize, old_name: Option<String>) {
        let config: VariableConfig = match BlockKind::from_node(&self.nodes[position]) {
            BlockKind::VariableSet(config) => config,
            _ => return,
        };
        let (Some(name), Some(data_type)) = (config.configured_name(), config.data_type) else {
            return;
        };
        let name = name.to_string();

        let variable = DefinedVariable {
            name: name.clone(),
            data_type,
            array_element_type: config.array_element_type,
        };

        let existing = self.defined_variables.iter().position(|v| v.name == name);
        match existing {
            Some(index) => self.defined_variables[index] = variable,
            None if config.is_new => self.defined_variables.push(variable),
            None => {
                if let Some(old) = old_name.as_deref().filter(|old| *old != name) {
                    // Rename: the old entry goes, the new one takes its place
                    self.defined_variables.retain(|v| v.name != old);
                    self.defined_variables.push(variable);
                }
            }
        }

        if let Some(port) = self.nodes[position].ports.data_ins.first_mut() {
            port.data_type = data_type;
        }

        if let Some(old) = old_name.filter(|old| *old != name) {
            self.forget_variable_if_unused(&old);
        }
    }

    fn forget_variable_if_unused(&mut self, name: &str) {
        let still_used = self.nodes.iter().any(|node| {
            VARIABLE_BLOCK_TYPES.contains(&node.id.as_str())
                && node
                    .config
                    .as_ref()
                    .and_then(|config| config.get("name"))
                    .and_then(Value::as_str)
                    == Some(name)
        });
        if !still_used {
            tracing::debug!("[EDIT] Variable '{}' is no longer referenced", name);
            self.defined_variables.retain(|v| v.name != name);
        }
    }

    fn sync_function_definition(&mut self, position: usize) {
        let config: FunctionDefinitionConfig = match BlockKind::from_node(&self.nodes[position]) {
            BlockKind::FunctionStart(config) => config,
            _ => return,
        };
        let instance_id = self.nodes[position].instance_id.clone();

        self.nodes[position].ports.data_outs = config
            .params
            .iter()
            .map(|param| Port::data_out(&param.id, param.data_type).with_name(&param.name))
            .collect();

        let function_id = format!("func-{}", instance_id);
        let name = config
            .name
            .clone()
            .filter(|name| !name.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_FUNCTION_NAME.to_string());

        match self
            .defined_functions
            .iter_mut()
            .find(|f| f.start_block_instance_id == instance_id)
        {
            Some(function) => {
                function.name = name;
                function.parameters = config.params.clone();
            }
            None => self.defined_functions.push(DefinedFunction {
                id: function_id.clone(),
                name,
                parameters: config.params.clone(),
                return_type: None,
                start_block_instance_id: instance_id,
            }),
        }

        // Call blocks take one data input per parameter
        let call_type = format!("{}{}", CALL_FUNCTION_PREFIX, function_id);
        for node in self.nodes.iter_mut().filter(|node| node.id == call_type) {
            node.ports.data_ins = config
                .params
                .iter()
                .map(|param| Port::data_in(&param.id, param.data_type).with_name(&param.name))
                .collect();
        }
        self.prune_dangling_connections();
    }

    fn sync_logic_operands(&mut self, position: usize) {
        let config: LogicConfig = match BlockKind::from_node(&self.nodes[position]) {
            BlockKind::LogicOperation(config) => config,
            _ => return,
        };
        let count = config.operand_count();
        let is_not = config.operator == LogicOperator::Not;

        self.nodes[position].ports.data_ins = (1..=count)
            .map(|n| {
                let name = if is_not { "In".to_string() } else { format!("In {}", n) };
                Port::data_in(&format!("operand_{}", n), ValueType::Boolean).with_name(&name)
            })
            .collect();

        if config.num_inputs != Some(count) {
            if let Some(Value::Object(fields)) = self.nodes[position].config.as_mut() {
                fields.insert("numInputs".to_string(), Value::from(count));
            }
        }
        self.prune_dangling_connections();
    }
}

fn merge_config(previous: Option<Value>, patch: Value) -> Value {
    match (previous, patch) {
        (Some(Value::Object(mut base)), Value::Object(changes)) => {
            for (key, value) in changes {
                base.insert(key, value);
            }
            Value::Object(base)
        }
        (_, patch) => patch,
    }
}
