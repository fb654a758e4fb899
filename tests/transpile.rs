mod common;

use common::*;
use jbgc::codegen::{compress, DEFAULT_MAX_DEPTH};
use jbgc::{
    compile_project, compile_project_for_target, CodeStyle, DefinedFunction, DefinedVariable,
    FunctionParameter, JbgcError, Node, Project, TranspileOptions, ValueType,
};
use serde_json::json;

fn natural() -> TranspileOptions {
    TranspileOptions::default().with_exported_at(EXPORTED_AT)
}

#[test]
fn test_blink_end_to_end() {
    init_logging();
    let project = create_blink_project();
    let code = compile_project(&project, &natural()).unwrap();

    let expected = "\
// Project: Blink
// Exported on: 2026-01-01T00:00:00Z
// Source version: 0.1.0
// Style: natural

void setup() {
  // Pin initializations
  pinMode(13, OUTPUT);

  // End of sequence marker: program_setup_end
}

void loop() {
  digitalWrite(13, HIGH);
  delay(1000);
  digitalWrite(13, LOW);
  delay(1000);
  // End of sequence marker: program_loop_end
}
";
    assert_eq!(code, expected);
}

#[test]
fn test_compressed_output_is_compaction_of_natural() {
    init_logging();
    let project = create_blink_project();
    let natural_code = compile_project(&project, &natural()).unwrap();
    let compressed = compile_project(&project, &natural().with_style(CodeStyle::Compressed)).unwrap();

    assert_eq!(compressed, compress(&natural_code));
    assert_eq!(
        compressed,
        "void setup(){pinMode(13,OUTPUT);}void loop(){digitalWrite(13,HIGH);delay(1000);\
         digitalWrite(13,LOW);delay(1000);}"
    );
}

#[test]
fn test_output_is_deterministic() {
    let project = create_blink_project();
    let first = compile_project(&project, &TranspileOptions::default()).unwrap();
    let second = compile_project(&project, &TranspileOptions::default()).unwrap();
    assert_eq!(first, second);
    assert!(!first.contains("Exported on"), "no timestamp unless one is supplied");
}

#[test]
fn test_last_saved_used_for_export_time() {
    let mut project = create_blink_project();
    project.last_saved = Some("2025-12-24T10:00:00Z".to_string());
    let code = compile_project(&project, &TranspileOptions::default()).unwrap();
    assert!(code.contains("// Exported on: 2025-12-24T10:00:00Z\n"));
}

#[test]
fn test_constant_literal_reaches_statement() {
    let mut project = Project::new("literal");
    project.add_node(loop_start("loop"));
    project.add_node(statement("serial_print", "print").with_data_in("value", ValueType::Any));
    project.add_node(constant_number("n", 42));
    link(&mut project, &["loop", "print"]);
    wire(&mut project, ("n", "value"), ("print", "value"));

    let code = compile_project(&project, &TranspileOptions::default()).unwrap();
    assert!(code.contains("  Serial.print(42);\n"), "{}", code);
}

#[test]
fn test_logic_operations() {
    let mut project = Project::new("logic");
    project.add_node(loop_start("loop"));
    project.add_node(statement("serial_println", "and-out").with_data_in("value", ValueType::Any));
    project.add_node(statement("serial_println", "not-out").with_data_in("value", ValueType::Any));
    project.add_node(
        Node::new("logic_operation", "and")
            .with_config(json!({ "operator": "AND" }))
            .with_data_in("operand_1", ValueType::Boolean)
            .with_data_in("operand_2", ValueType::Boolean)
            .with_data_out("result", ValueType::Boolean),
    );
    project.add_node(
        Node::new("logic_operation", "not")
            .with_config(json!({ "operator": "NOT" }))
            .with_data_in("operand_1", ValueType::Boolean)
            .with_data_out("result", ValueType::Boolean),
    );
    project.add_node(constant_boolean("yes", true));
    project.add_node(constant_boolean("no", false));
    link(&mut project, &["loop", "and-out", "not-out"]);
    wire(&mut project, ("yes", "value"), ("and", "operand_1"));
    wire(&mut project, ("no", "value"), ("and", "operand_2"));
    wire(&mut project, ("and", "result"), ("and-out", "value"));
    wire(&mut project, ("yes", "value"), ("not", "operand_1"));
    wire(&mut project, ("not", "result"), ("not-out", "value"));

    let code = compile_project(&project, &TranspileOptions::default()).unwrap();
    assert!(code.contains("  Serial.println((true && false));\n"), "{}", code);
    assert!(code.contains("  Serial.println((!true));\n"), "{}", code);
}

#[test]
fn test_three_input_and() {
    let mut project = Project::new("logic");
    project.add_node(loop_start("loop"));
    project.add_node(statement("serial_println", "out").with_data_in("value", ValueType::Any));
    let mut and = Node::new("logic_operation", "and")
        .with_config(json!({ "operator": "AND", "numInputs": 3 }))
        .with_data_out("result", ValueType::Boolean);
    for port in ["operand_1", "operand_2", "operand_3"] {
        and = and.with_data_in(port, ValueType::Boolean);
    }
    project.add_node(and);
    project.add_node(constant_boolean("a", true));
    project.add_node(constant_boolean("b", false));
    project.add_node(constant_boolean("c", true));
    link(&mut project, &["loop", "out"]);
    wire(&mut project, ("a", "value"), ("and", "operand_1"));
    wire(&mut project, ("b", "value"), ("and", "operand_2"));
    wire(&mut project, ("c", "value"), ("and", "operand_3"));
    wire(&mut project, ("and", "result"), ("out", "value"));

    let code = compile_project(&project, &TranspileOptions::default()).unwrap();
    assert!(code.contains("  Serial.println((true && false && true));\n"), "{}", code);
}

#[test]
fn test_setup_only_project() {
    let mut project = Project::new("Setup only");
    project.add_node(setup_start("setup"));
    project.add_node(statement("led_on", "on").with_data_in("pin", ValueType::Number));
    project.add_node(setup_end("setup-end"));
    project.add_node(constant_number("pin", 13));
    project.add_node(loop_start("loop"));
    link(&mut project, &["setup", "on", "setup-end"]);
    wire(&mut project, ("pin", "value"), ("on", "pin"));

    let code = compile_project(&project, &TranspileOptions::default()).unwrap();
    assert!(code.contains("  digitalWrite(13, HIGH);\n"), "{}", code);
    assert!(code.ends_with("void loop() {\n  // No blocks in loop sequence.\n}\n"), "{}", code);

    let compressed = compile_project(&project, &TranspileOptions::default().with_style(CodeStyle::Compressed)).unwrap();
    assert_eq!(
        compressed,
        "void setup(){pinMode(13,OUTPUT);digitalWrite(13,HIGH);}void loop(){}"
    );
}

#[test]
fn test_unconnected_input_is_a_placeholder() {
    let mut project = Project::new("placeholder");
    project.add_node(loop_start("loop"));
    project.add_node(
        statement("led_on", "led")
            .with_name("LED")
            .with_data_in("pin", ValueType::Number),
    );
    link(&mut project, &["loop", "led"]);

    let code = compile_project(&project, &TranspileOptions::default()).unwrap();
    assert!(code.contains("  digitalWrite(/* pin_unconnected_on_LED */, HIGH);\n"), "{}", code);
    assert!(!code.contains("pinMode"), "a pin that is not static gets no pinMode");
}

#[test]
fn test_project_without_entries_still_compiles() {
    let project = Project::new("");
    let code = compile_project(&project, &TranspileOptions::default()).unwrap();
    assert!(code.starts_with("// Project: Untitled Project\n"));
    assert!(code.contains("void setup() {\n  // No blocks in setup sequence.\n}\n"));
    assert!(code.ends_with("void loop() {\n  // No blocks in loop sequence.\n}\n"));
}

#[test]
fn test_pin_conflict_prefers_output() {
    let mut project = Project::new("pins");
    project.add_node(Node::new("button_read", "btn").with_config(json!({ "pin": 4 })));
    project.add_node(Node::new("set_pin_state", "out").with_config(json!({ "pin": 4 })));

    project.add_node(Node::new("led_on", "on").with_config(json!({ "pin": 4 })));

    let code = compile_project(&project, &TranspileOptions::default()).unwrap();
    assert_eq!(code.matches("pinMode(").count(), 1, "{}", code);
    assert!(code.contains("  pinMode(4, OUTPUT);\n"));
}

#[test]
fn test_globals_and_user_functions() {
    let mut project = Project::new("functions");
    project.defined_variables = vec![
        DefinedVariable::new("count", ValueType::Number),
        DefinedVariable::array_of("readings", ValueType::Number),
    ];
    project.add_node(
        Node::new("function_definition_start", "fd")
            .with_exec_out("exec_out_body")
            .with_data_out("p-times", ValueType::Number),
    );
    project.add_node(statement("variable_set", "set").with_config(json!({ "name": "count" })));
    project.add_node(Node::new("function_definition_end", "fd-end").with_exec_in("exec_in"));
    project.defined_functions.push(DefinedFunction {
        id: "func-fd".to_string(),
        name: "remember".to_string(),
        parameters: vec![FunctionParameter {
            id: "p-times".to_string(),
            name: "times".to_string(),
            data_type: ValueType::Number,
        }],
        return_type: None,
        start_block_instance_id: "fd".to_string(),
    });
    project.add_node(loop_start("loop"));
    project.add_node(
        statement("call_func_func-fd", "call")
            .with_data_in("p-times", ValueType::Number)
            .with_config(json!({ "p-times": 3 })),
    );
    project.add_connection(jbgc::Connection::execution("x1", "fd", "exec_out_body", "set", "exec_in"));
    project.add_connection(jbgc::Connection::data("x2", "fd", "p-times", "set", "value_in"));
    link(&mut project, &["set", "fd-end"]);
    link(&mut project, &["loop", "call"]);
    project.nodes[1].ports.data_ins.push(jbgc::Port::data_in("value_in", ValueType::Number));

    let code = compile_project(&project, &TranspileOptions::default()).unwrap();
    let expected_fragment = "\
#include <vector>

// Global Variables
float count;
std::vector<float> readings;

// User-Defined Functions
void remember(float times) {
  count = times;
  // End of sequence marker: function_definition_end
}

void setup() {";
    assert!(code.contains(expected_fragment), "{}", code);
    assert!(code.contains("void loop() {\n  remember(3);\n}\n"), "{}", code);
}

#[test]
fn test_unknown_target_is_rejected() {
    let project = create_blink_project();
    assert_eq!(
        compile_project_for_target(&project, "python", &TranspileOptions::default()),
        Err(JbgcError::UnknownTarget("python".to_string()))
    );
    assert!(compile_project_for_target(&project, "arduino", &TranspileOptions::default()).is_ok());
}

#[test]
fn test_data_cycle_is_an_error() {
    let mut project = Project::new("cycle");
    project.add_node(loop_start("loop"));
    project.add_node(statement("delay", "wait").with_data_in("duration", ValueType::Number));
    project.add_node(
        Node::new("math_operation", "a")
            .with_data_in("operand_a", ValueType::Number)
            .with_data_in("operand_b", ValueType::Number)
            .with_data_out("result", ValueType::Number),
    );
    project.add_node(
        Node::new("math_operation", "b")
            .with_data_in("operand_a", ValueType::Number)
            .with_data_in("operand_b", ValueType::Number)
            .with_data_out("result", ValueType::Number),
    );
    link(&mut project, &["loop", "wait"]);
    wire(&mut project, ("a", "result"), ("wait", "duration"));
    wire(&mut project, ("b", "result"), ("a", "operand_a"));
    wire(&mut project, ("a", "result"), ("b", "operand_b"));

    assert_eq!(
        compile_project(&project, &TranspileOptions::default()),
        Err(JbgcError::DataCycle {
            node: "b".to_string(),
            port: "operand_b".to_string(),
        })
    );
}

#[test]
fn test_nesting_ceiling_is_reported() {
    let mut project = Project::new("deep");
    project.add_node(loop_start("loop"));
    let mut previous = ("loop".to_string(), "exec_out".to_string());
    for i in 0..10 {
        let id = format!("while-{}", i);
        project.add_node(
            Node::new("while", &id)
                .with_exec_in("exec_in")
                .with_exec_out("exec_out_loop")
                .with_exec_out("exec_out_end"),
        );
        project.add_connection(jbgc::Connection::execution(
            &format!("x{}", i),
            &previous.0,
            &previous.1,
            &id,
            "exec_in",
        ));
        previous = (id, "exec_out_loop".to_string());
    }

    let options = TranspileOptions::default().with_max_depth(4);
    assert!(matches!(
        compile_project(&project, &options),
        Err(JbgcError::RecursionLimit { limit: 4, .. })
    ));
    assert!(compile_project(&project, &TranspileOptions::default()).is_ok());
}

/// Loop body made of `count` ifs, each nested in the previous one's `then` branch
fn nested_ifs(count: usize) -> Project {
    let mut project = Project::new("nested");
    project.add_node(loop_start("loop"));
    let mut previous = ("loop".to_string(), "exec_out".to_string());
    for i in 0..count {
        let id = format!("if{}", i);
        project.add_node(
            Node::new("if", &id)
                .with_exec_in("exec_in")
                .with_exec_out("exec_out_then")
                .with_config(json!({ "condition": true })),
        );
        project.add_connection(jbgc::Connection::execution(
            &format!("x{}", i),
            &previous.0,
            &previous.1,
            &id,
            "exec_in",
        ));
        previous = (id, "exec_out_then".to_string());
    }
    project
}

#[test]
fn test_default_ceiling_reported_on_default_thread_stack() {
    // A spawned thread gets the standard 2 MiB stack
    let outcome = std::thread::spawn(|| {
        let options = TranspileOptions::default();
        let at_ceiling = compile_project(&nested_ifs(DEFAULT_MAX_DEPTH + 1), &options);
        let past_ceiling = compile_project(&nested_ifs(DEFAULT_MAX_DEPTH + 2), &options);
        let far_past = compile_project(&nested_ifs(DEFAULT_MAX_DEPTH * 4), &options);
        (at_ceiling, past_ceiling, far_past)
    })
    .join()
    .unwrap();

    let (at_ceiling, past_ceiling, far_past) = outcome;
    assert!(at_ceiling.is_ok());
    assert_eq!(
        past_ceiling,
        Err(JbgcError::RecursionLimit {
            limit: DEFAULT_MAX_DEPTH,
            node: format!("if{}", DEFAULT_MAX_DEPTH + 1),
        })
    );
    assert!(matches!(far_past, Err(JbgcError::RecursionLimit { .. })));
}

#[test]
fn test_dangling_connection_aborts() {
    let mut project = create_blink_project();
    wire(&mut project, ("ghost", "value"), ("on", "pin"));
    assert_eq!(
        compile_project(&project, &TranspileOptions::default()),
        Err(JbgcError::NodeNotFound("ghost".to_string()))
    );
}

#[test]
fn test_editor_fixture() {
    init_logging();
    let project = Project::from_json(include_str!("fixtures/button_led.json")).unwrap();
    assert_eq!(project.defined_variables[0].data_type, ValueType::Boolean);

    let code = compile_project(&project, &natural()).unwrap();
    assert!(code.contains("// Project: Button LED\n"), "{}", code);
    assert!(code.contains("boolean pressed;\n"), "{}", code);
    assert!(code.contains("  pinMode(2, INPUT);\n  pinMode(13, OUTPUT);\n"), "{}", code);
    assert!(
        code.contains(
            "void loop() {\n  pressed = digitalRead(2);\n  if (pressed) {\n    digitalWrite(13, HIGH);\n  } else {\n    digitalWrite(13, LOW);\n  }\n}\n"
        ),
        "{}",
        code
    );
}
