//! # Structural Validation
//!
//! Checks run on a project before it is transpiled. Findings are returned as
//! human-readable diagnostics; an empty list means the project is safe to
//! compile. Whether a non-empty list blocks compilation is up to the caller.

use crate::graph::{BlockKind, ConnectionType, Node, PortKind, Project};
use petgraph::algo::is_cyclic_directed;
use petgraph::graphmap::DiGraphMap;
use std::collections::{HashMap, HashSet};

const ENTRY_TYPES: [&str; 2] = ["program_setup_start", "program_loop_start"];
const TERMINAL_TYPES: [&str; 2] = ["program_setup_end", "program_loop_end"];

/// Detect execution cycles and entry sequences that never reach an end block.
pub fn validate_project_structure(project: &Project) -> Vec<String> {
    tracing::debug!("[VALIDATE] Checking structure of {} blocks", project.nodes.len());

    let nodes: HashMap<&str, &Node> = project
        .nodes
        .iter()
        .map(|node| (node.instance_id.as_str(), node))
        .collect();

    let flow = ExecutionFlow::build(project, &nodes);
    if is_cyclic_directed(&flow.graph) {
        tracing::debug!("[VALIDATE] Execution cycle found");
        return vec![
            "Execution loop detected between blocks. Fix the connections to avoid infinite loops."
                .to_string(),
        ];
    }

    let mut diagnostics = Vec::new();
    for entry in project.nodes.iter().filter(|n| ENTRY_TYPES.contains(&n.id.as_str())) {
        let mut visited = HashSet::new();
        if !flow.path_reaches_end(&nodes, &entry.instance_id, &mut visited) {
            tracing::debug!("[VALIDATE] Entry '{}' does not terminate", entry.instance_id);
            diagnostics.push(format!(
                "The path from start block ({}) never reaches an end block (setup end or loop end).",
                entry.display_name()
            ));
        }
    }
    diagnostics
}

/// Execution edges joining two declared execution ports
struct ExecutionFlow<'a> {
    graph: DiGraphMap<&'a str, ()>,
    /// node -> execution output -> first connected target
    first_targets: HashMap<&'a str, HashMap<&'a str, &'a str>>,
}

impl<'a> ExecutionFlow<'a> {
    fn build(project: &'a Project, nodes: &HashMap<&str, &'a Node>) -> Self {
        let is_exec = |node_id: &str, port_id: &str| {
            nodes
                .get(node_id)
                .map(|node| node.has_execution_port(port_id))
                .unwrap_or(false)
        };

        let mut graph = DiGraphMap::new();
        let mut first_targets: HashMap<&'a str, HashMap<&'a str, &'a str>> = HashMap::new();
        for c in &project.connections {
            if !is_exec(&c.from_block_instance_id, &c.from_port_id)
                || !is_exec(&c.to_block_instance_id, &c.to_port_id)
            {
                continue;
            }
            let from = c.from_block_instance_id.as_str();
            let to = c.to_block_instance_id.as_str();
            graph.add_edge(from, to, ());
            first_targets
                .entry(from)
                .or_default()
                .entry(c.from_port_id.as_str())
                .or_insert(to);
        }
        Self { graph, first_targets }
    }

    /// True when some execution path from `node_id` reaches a terminal block.
    /// The visited set is shared by every branch of one entry's search.
    fn path_reaches_end(
        &self,
        nodes: &HashMap<&str, &'a Node>,
        node_id: &'a str,
        visited: &mut HashSet<&'a str>,
    ) -> bool {
        if !visited.insert(node_id) {
            return false;
        }
        let Some(node) = nodes.get(node_id) else {
            return false;
        };
        if TERMINAL_TYPES.contains(&node.id.as_str()) {
            return true;
        }

        let Some(targets) = self.first_targets.get(node_id) else {
            return false;
        };
        node.ports
            .execution_outs
            .iter()
            .filter(|port| port.kind == PortKind::Execution)
            .filter_map(|port| targets.get(port.id.as_str()).copied())
            .any(|next| self.path_reaches_end(nodes, next, visited))
    }
}

/// Lint connections for problems the editor normally prevents.
pub fn check_connections(project: &Project) -> Vec<String> {
    let mut diagnostics = Vec::new();
    let mut fan_out: HashMap<(&str, &str), usize> = HashMap::new();
    let mut fan_out_order: Vec<(&str, &str)> = Vec::new();
    let nodes: HashMap<&str, &Node> = project
        .nodes
        .iter()
        .map(|node| (node.instance_id.as_str(), node))
        .collect();

    for c in &project.connections {
        let from_node = nodes.get(c.from_block_instance_id.as_str()).copied();
        let to_node = nodes.get(c.to_block_instance_id.as_str()).copied();
        let from_port = from_node.and_then(|n| n.find_port(&c.from_port_id));
        let to_port = to_node.and_then(|n| n.find_port(&c.to_port_id));

        let (Some(from_port), Some(to_port)) = (from_port, to_port) else {
            let (node, port) = if from_port.is_none() {
                (&c.from_block_instance_id, &c.from_port_id)
            } else {
                (&c.to_block_instance_id, &c.to_port_id)
            };
            diagnostics.push(format!(
                "Connection '{}' references missing port '{}' on block '{}'.",
                c.id, port, node
            ));
            continue;
        };

        match c.connection_type {
            ConnectionType::Execution => {
                if from_port.kind != PortKind::Execution || to_port.kind != PortKind::Execution {
                    diagnostics.push(format!(
                        "Execution connection '{}' joins non-execution ports '{}' and '{}'.",
                        c.id, c.from_port_id, c.to_port_id
                    ));
                    continue;
                }
                let key = (c.from_block_instance_id.as_str(), c.from_port_id.as_str());
                let count = fan_out.entry(key).or_insert(0);
                if *count == 0 {
                    fan_out_order.push(key);
                }
                *count += 1;
            }
            ConnectionType::Data => {
                if !from_port.data_type.is_compatible_with(&to_port.data_type) {
                    let consumer = to_node.map(Node::display_name).unwrap_or_default();
                    diagnostics.push(format!(
                        "Connection '{}' sends {} into {} input '{}' of block '{}'.",
                        c.id, from_port.data_type, to_port.data_type, c.to_port_id, consumer
                    ));
                }
            }
        }
    }

    for (node_id, port_id) in fan_out_order {
        let count = fan_out[&(node_id, port_id)];
        if count < 2 {
            continue;
        }
        let name = nodes
            .get(node_id)
            .map(|node| block_label(node))
            .unwrap_or_else(|| node_id.to_string());
        diagnostics.push(format!(
            "Execution output '{}' of block '{}' has {} connections; only the first is followed.",
            port_id, name, count
        ));
    }

    if !diagnostics.is_empty() {
        tracing::debug!("[VALIDATE] {} connection issue(s)", diagnostics.len());
    }
    diagnostics
}

fn block_label(node: &Node) -> String {
    match BlockKind::from_node(node) {
        BlockKind::Unknown(_) => format!("{} ({})", node.display_name(), node.id),
        _ => node.display_name().to_string(),
    }
}
