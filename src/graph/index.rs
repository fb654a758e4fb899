//! # Graph Index
//!
//! Lookup tables built once per transpilation so the resolver and lowerer never
//! scan the node or connection lists:
//! - instance id -> block
//! - (consumer node, data input) -> producing (node, port)
//! - (source node, execution output) -> target nodes
//!
//! Building the index also checks the project invariants. A connection or
//! function pointing at something that does not exist means the caller handed
//! over an inconsistent project, and is reported as an error.

use super::{Block, ConnectionType, DefinedFunction, Project};
use crate::error::{JbgcError, Result};
use std::collections::HashMap;

/// One end of a connection
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PortRef<'a> {
    pub node_id: &'a str,
    pub port_id: &'a str,
}

pub struct GraphIndex<'a> {
    project: &'a Project,
    blocks: HashMap<&'a str, Block<'a>>,
    /// node_id -> input_port -> producing port
    data_sources: HashMap<&'a str, HashMap<&'a str, PortRef<'a>>>,
    /// node_id -> output_port -> target node ids, in connection order
    exec_routes: HashMap<&'a str, HashMap<&'a str, Vec<&'a str>>>,
    functions: HashMap<&'a str, &'a DefinedFunction>,
}

impl<'a> GraphIndex<'a> {
    pub fn build(project: &'a Project) -> Result<Self> {
        let blocks: HashMap<&'a str, Block<'a>> = project
            .nodes
            .iter()
            .map(|node| (node.instance_id.as_str(), Block::from_node(node)))
            .collect();

        let mut data_sources: HashMap<&'a str, HashMap<&'a str, PortRef<'a>>> = HashMap::new();
        let mut exec_routes: HashMap<&'a str, HashMap<&'a str, Vec<&'a str>>> = HashMap::new();

        for connection in &project.connections {
            for (node_id, port_id) in [
                (&connection.from_block_instance_id, &connection.from_port_id),
                (&connection.to_block_instance_id, &connection.to_port_id),
            ] {
                let block = blocks
                    .get(node_id.as_str())
                    .ok_or_else(|| JbgcError::NodeNotFound(node_id.clone()))?;
                if block.node.find_port(port_id).is_none() {
                    return Err(JbgcError::PinNotFound {
                        node: node_id.clone(),
                        pin: port_id.clone(),
                    });
                }
            }

            match connection.connection_type {
                ConnectionType::Data => {
                    data_sources
                        .entry(connection.to_block_instance_id.as_str())
                        .or_default()
                        .entry(connection.to_port_id.as_str())
                        .or_insert(PortRef {
                            node_id: connection.from_block_instance_id.as_str(),
                            port_id: connection.from_port_id.as_str(),
                        });
                }
                ConnectionType::Execution => {
                    exec_routes
                        .entry(connection.from_block_instance_id.as_str())
                        .or_default()
                        .entry(connection.from_port_id.as_str())
                        .or_default()
                        .push(connection.to_block_instance_id.as_str());
                }
            }
        }

        let mut functions = HashMap::new();
        for function in &project.defined_functions {
            if !blocks.contains_key(function.start_block_instance_id.as_str()) {
                return Err(JbgcError::FunctionStartNotFound {
                    function: function.name.clone(),
                    instance: function.start_block_instance_id.clone(),
                });
            }
            functions.insert(function.id.as_str(), function);
        }

        tracing::debug!(
            "[ROUTING] Indexed {} blocks, {} data inputs, {} execution routes",
            blocks.len(),
            data_sources.values().map(HashMap::len).sum::<usize>(),
            exec_routes.values().map(HashMap::len).sum::<usize>()
        );

        Ok(Self {
            project,
            blocks,
            data_sources,
            exec_routes,
            functions,
        })
    }

    pub fn project(&self) -> &'a Project {
        self.project
    }

    pub fn get_block(&self, instance_id: &str) -> Option<&Block<'a>> {
        self.blocks.get(instance_id)
    }

    pub fn block(&self, instance_id: &str) -> Result<&Block<'a>> {
        self.get_block(instance_id)
            .ok_or_else(|| JbgcError::NodeNotFound(instance_id.to_string()))
    }

    /// Blocks in the order they were placed in the project
    pub fn blocks_in_order(&self) -> impl Iterator<Item = &Block<'a>> + '_ {
        self.project
            .nodes
            .iter()
            .filter_map(move |node| self.blocks.get(node.instance_id.as_str()))
    }

    /// The port wired into a data input, if any
    pub fn data_source(&self, node_id: &str, input_port: &str) -> Option<PortRef<'a>> {
        self.data_sources.get(node_id)?.get(input_port).copied()
    }

    /// Get all nodes connected to a specific execution output port.
    ///
    /// Returns an empty slice if nothing is connected.
    pub fn get_connected_nodes(&self, node_id: &str, output_port: &str) -> &[&'a str] {
        self.exec_routes
            .get(node_id)
            .and_then(|ports| ports.get(output_port))
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// The block an execution output continues to. Only the first connection
    /// of a port is followed.
    pub fn next_execution_block(&self, node_id: &str, output_port: &str) -> Option<&Block<'a>> {
        self.get_connected_nodes(node_id, output_port)
            .first()
            .and_then(|target| self.blocks.get(*target))
    }

    pub fn function(&self, function_id: &str) -> Option<&'a DefinedFunction> {
        self.functions.get(function_id).copied()
    }

    /// The function whose body starts at the given block
    pub fn function_starting_at(&self, instance_id: &str) -> Option<&'a DefinedFunction> {
        self.project
            .defined_functions
            .iter()
            .find(|f| f.start_block_instance_id == instance_id)
    }
}
