//! Common test utilities for building projects.
use jbgc::{Connection, Node, Project, ValueType};
use serde_json::json;

/// Fixed export time so generated headers are comparable
#[allow(dead_code)]
pub const EXPORTED_AT: &str = "2026-01-01T00:00:00Z";

/// Route library logs to the test harness. Safe to call from every test.
#[allow(dead_code)]
pub fn init_logging() {
    let _ = tracing_subscriber::fmt().with_test_writer().try_init();
}

#[allow(dead_code)]
pub fn setup_start(instance_id: &str) -> Node {
    Node::new("program_setup_start", instance_id)
        .with_name("Setup")
        .with_exec_out("exec_out")
}

#[allow(dead_code)]
pub fn setup_end(instance_id: &str) -> Node {
    Node::new("program_setup_end", instance_id).with_exec_in("exec_in")
}

#[allow(dead_code)]
pub fn loop_start(instance_id: &str) -> Node {
    Node::new("program_loop_start", instance_id)
        .with_name("Loop")
        .with_exec_out("exec_out")
}

#[allow(dead_code)]
pub fn loop_end(instance_id: &str) -> Node {
    Node::new("program_loop_end", instance_id).with_exec_in("exec_in")
}

/// A block with one execution input and one execution output
#[allow(dead_code)]
pub fn statement(type_id: &str, instance_id: &str) -> Node {
    Node::new(type_id, instance_id)
        .with_exec_in("exec_in")
        .with_exec_out("exec_out")
}

#[allow(dead_code)]
pub fn constant_number(instance_id: &str, value: i64) -> Node {
    Node::new("constant_number", instance_id)
        .with_config(json!({ "value": value }))
        .with_data_out("value", ValueType::Number)
}

#[allow(dead_code)]
pub fn constant_boolean(instance_id: &str, value: bool) -> Node {
    Node::new("constant_boolean", instance_id)
        .with_config(json!({ "value": value }))
        .with_data_out("value", ValueType::Boolean)
}

/// Chain blocks through their `exec_out` -> `exec_in` ports
#[allow(dead_code)]
pub fn link(project: &mut Project, ids: &[&str]) {
    for pair in ids.windows(2) {
        let id = format!("x-{}-{}", pair[0], pair[1]);
        project.add_connection(Connection::execution(&id, pair[0], "exec_out", pair[1], "exec_in"));
    }
}

#[allow(dead_code)]
pub fn wire(project: &mut Project, from: (&str, &str), to: (&str, &str)) {
    let id = format!("d-{}-{}-{}", from.0, to.0, to.1);
    project.add_connection(Connection::data(&id, from.0, from.1, to.0, to.1));
}

/// Setup that only reaches its end marker, and a loop that blinks pin 13
///
/// Loop: LED on -> delay 1000 -> LED off -> delay 1000 -> end.
/// Both LED blocks take their pin from the same constant.
#[allow(dead_code)]
pub fn create_blink_project() -> Project {
    let mut project = Project::new("Blink");
    project.add_node(setup_start("setup"));
    project.add_node(setup_end("setup-end"));
    project.add_node(loop_start("loop"));
    project.add_node(statement("led_on", "on").with_data_in("pin", ValueType::Number));
    project.add_node(
        statement("delay", "wait-1")
            .with_data_in("duration", ValueType::Number)
            .with_config(json!({ "duration": 1000 })),
    );
    project.add_node(statement("led_off", "off").with_data_in("pin", ValueType::Number));
    project.add_node(
        statement("delay", "wait-2")
            .with_data_in("duration", ValueType::Number)
            .with_config(json!({ "duration": 1000 })),
    );
    project.add_node(loop_end("loop-end"));
    project.add_node(constant_number("pin13", 13));

    link(&mut project, &["setup", "setup-end"]);
    link(&mut project, &["loop", "on", "wait-1", "off", "wait-2", "loop-end"]);
    wire(&mut project, ("pin13", "value"), ("on", "pin"));
    wire(&mut project, ("pin13", "value"), ("off", "pin"));
    project
}
