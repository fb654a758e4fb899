mod common;

use common::*;
use jbgc::graph::editing::DEFAULT_FUNCTION_NAME;
use jbgc::{compile_project, DefinedVariable, Node, Project, TranspileOptions, ValueType};
use serde_json::json;

/// Loop calls a user function whose body prints its parameter
fn create_function_project() -> Project {
    let mut project = Project::new("Greeter");
    project.add_node(loop_start("loop"));
    project.add_node(
        Node::new("function_definition_start", "fd")
            .with_name("Function")
            .with_exec_out("exec_out_body"),
    );
    project.add_node(statement("serial_println", "say").with_data_in("value", ValueType::Any));
    project.add_node(Node::new("function_definition_end", "fd-end").with_exec_in("exec_in"));
    project.add_node(statement("call_func_func-fd", "call"));
    project.add_node(
        Node::new("constant_string", "hello")
            .with_config(json!({ "value": "hi" }))
            .with_data_out("value", ValueType::String),
    );

    project.add_connection(jbgc::Connection::execution("body", "fd", "exec_out_body", "say", "exec_in"));
    link(&mut project, &["say", "fd-end"]);
    link(&mut project, &["loop", "call"]);
    project
}

#[test]
fn test_function_lifecycle() {
    init_logging();
    let mut project = create_function_project();

    // Define the function with one parameter
    project
        .save_block_config(
            "fd",
            json!({ "name": "greet", "params": [{ "id": "p-msg", "name": "msg", "dataType": "string" }] }),
        )
        .unwrap();
    assert_eq!(project.defined_functions.len(), 1);
    assert_eq!(project.defined_functions[0].id, "func-fd");

    wire(&mut project, ("fd", "p-msg"), ("say", "value"));
    wire(&mut project, ("hello", "value"), ("call", "p-msg"));

    let code = compile_project(&project, &TranspileOptions::default()).unwrap();
    assert!(
        code.contains(
            "// User-Defined Functions\nvoid greet(String msg) {\n  Serial.println(msg);\n  \
             // End of sequence marker: function_definition_end\n}\n\n"
        ),
        "{}",
        code
    );
    assert!(code.contains("void loop() {\n  greet(String(\"hi\"));\n}\n"), "{}", code);

    // Dropping the parameter removes its ports and the wires attached to them
    project.save_block_config("fd", json!({ "params": [] })).unwrap();
    assert_eq!(project.defined_functions[0].name, "greet");
    assert!(project.nodes.iter().all(|node| node.find_port("p-msg").is_none()));

    let code = compile_project(&project, &TranspileOptions::default()).unwrap();
    assert!(code.contains("void greet() {\n  Serial.println(/* value_unconnected_on_serial_println */);\n"));
    assert!(code.contains("  greet();\n"));

    // Deleting the definition takes the call blocks with it
    project.remove_node("fd").unwrap();
    assert!(project.defined_functions.is_empty());
    assert!(project.find_node("call").is_none());

    let code = compile_project(&project, &TranspileOptions::default()).unwrap();
    assert!(!code.contains("User-Defined Functions"));
    assert!(code.ends_with("void loop() {\n  // No blocks in loop sequence.\n}\n"), "{}", code);
}

#[test]
fn test_unnamed_function_gets_default_name() {
    let mut project = create_function_project();
    project.save_block_config("fd", json!({ "params": [] })).unwrap();

    let code = compile_project(&project, &TranspileOptions::default()).unwrap();
    assert!(code.contains(&format!("void {}() {{\n", DEFAULT_FUNCTION_NAME)));
    assert!(code.contains(&format!("  {}();\n", DEFAULT_FUNCTION_NAME)));
}

#[test]
fn test_configured_variable_becomes_global() {
    let mut project = Project::new("Counter");
    project.add_node(loop_start("loop"));
    project.add_node(statement("variable_set", "set").with_data_in("value_in", ValueType::Any));
    project.add_node(constant_number("one", 1));
    link(&mut project, &["loop", "set"]);
    wire(&mut project, ("one", "value"), ("set", "value_in"));

    project
        .save_block_config("set", json!({ "name": "count", "dataType": "Nombre", "isNew": true }))
        .unwrap();
    assert_eq!(project.defined_variables, vec![DefinedVariable::new("count", ValueType::Number)]);

    let code = compile_project(&project, &TranspileOptions::default()).unwrap();
    assert!(code.contains("// Global Variables\nfloat count;\n\n"), "{}", code);
    assert!(code.contains("void loop() {\n  count = 1;\n}\n"), "{}", code);

    project.remove_node("set").unwrap();
    assert!(project.defined_variables.is_empty());
    assert!(project.connections.is_empty());
}

#[test]
fn test_logic_operand_count_follows_config() {
    let mut project = Project::new("logic");
    project.add_node(
        Node::new("logic_operation", "l")
            .with_data_in("operand_1", ValueType::Boolean)
            .with_data_in("operand_2", ValueType::Boolean)
            .with_data_out("result", ValueType::Boolean),
    );
    project.add_node(constant_boolean("t", true));
    wire(&mut project, ("t", "value"), ("l", "operand_2"));

    project
        .save_block_config("l", json!({ "operator": "NOT" }))
        .unwrap();

    let ports: Vec<&str> = project.nodes[0].ports.data_ins.iter().map(|p| p.id.as_str()).collect();
    assert_eq!(ports, vec!["operand_1"]);
    assert!(project.connections.is_empty());
    assert_eq!(project.nodes[0].config.as_ref().unwrap()["numInputs"], json!(1));
}
