// crates/chainruntime/tests/registry_test.rs

mod common;

use chaincore::{transform_fn, ChainError, GraphError, Node, Value, ValueType};
use chainnodes::{AddNode, JsonParseNode};
use chainruntime::GraphRegistry;
use common::{number_node, parity_registry, ParityClassifier};
use std::sync::Arc;

fn names(nodes: Vec<&Node>) -> Vec<&str> {
    nodes.into_iter().map(Node::name).collect()
}

#[test]
fn test_connect_appends_in_creation_order() {
    let registry = parity_registry(ParityClassifier::new());

    assert_eq!(names(registry.successors("router").unwrap()), vec!["double", "sub3"]);
    assert_eq!(names(registry.successors("inc").unwrap()), vec!["router"]);
    assert!(registry.successors("sub3").unwrap().is_empty());
    assert_eq!(registry.edge_count(), 3);
    assert_eq!(registry.node_names(), vec!["inc", "router", "double", "sub3"]);
}

#[test]
fn test_connect_rejects_type_mismatch() {
    let mut registry = GraphRegistry::new();
    registry
        .register(Node::transform(
            "parse",
            ValueType::String,
            ValueType::Json,
            Arc::new(JsonParseNode),
        ))
        .unwrap();
    registry
        .register(number_node("inc", Arc::new(AddNode(1.0))))
        .unwrap();

    let err = registry.connect("parse", "inc").unwrap_err();
    assert!(matches!(
        err,
        ChainError::Graph(GraphError::TypeMismatch {
            output: ValueType::Json,
            input: ValueType::Number,
            ..
        })
    ));
    assert!(registry.successors("parse").unwrap().is_empty());

    // the other direction is also incompatible: number -> string
    assert!(registry.connect("inc", "parse").is_err());
    assert_eq!(registry.edge_count(), 0);
}

#[test]
fn test_connect_requires_registered_nodes() {
    let mut registry = GraphRegistry::new();
    registry
        .register(number_node("inc", Arc::new(AddNode(1.0))))
        .unwrap();

    let err = registry.connect("inc", "missing").unwrap_err();
    assert!(matches!(
        err,
        ChainError::Graph(GraphError::UnknownNode(ref name)) if name == "missing"
    ));
    let err = registry.connect("ghost", "inc").unwrap_err();
    assert!(matches!(err, ChainError::Graph(GraphError::UnknownNode(_))));
}

#[test]
fn test_duplicate_registration_rejected() {
    let mut registry = GraphRegistry::new();
    registry
        .register(number_node("inc", Arc::new(AddNode(1.0))))
        .unwrap();

    let err = registry
        .register(number_node("inc", Arc::new(AddNode(2.0))))
        .unwrap_err();
    assert!(matches!(
        err,
        ChainError::Graph(GraphError::DuplicateNode(ref name)) if name == "inc"
    ));
    assert_eq!(registry.len(), 1);
}

#[tokio::test]
async fn test_replace_keeps_edges() {
    let mut registry = GraphRegistry::new();
    registry
        .register(number_node("first", Arc::new(AddNode(1.0))))
        .unwrap();
    registry
        .register(number_node("second", Arc::new(AddNode(1.0))))
        .unwrap();
    registry.connect("first", "second").unwrap();

    registry
        .replace(number_node("second", Arc::new(AddNode(100.0))))
        .unwrap();

    assert_eq!(names(registry.successors("first").unwrap()), vec!["second"]);
    let run = registry.run(0i64).await.unwrap();
    assert_eq!(run.final_output(), &Value::Number(101.0));
}

#[test]
fn test_replace_checks_existing_edges() {
    let mut registry = GraphRegistry::new();
    registry
        .register(number_node("first", Arc::new(AddNode(1.0))))
        .unwrap();
    registry
        .register(number_node("second", Arc::new(AddNode(1.0))))
        .unwrap();
    registry.connect("first", "second").unwrap();

    let err = registry
        .replace(Node::transform(
            "second",
            ValueType::String,
            ValueType::Json,
            Arc::new(JsonParseNode),
        ))
        .unwrap_err();
    assert!(matches!(err, ChainError::Graph(GraphError::TypeMismatch { .. })));
    assert_eq!(registry.node("second").unwrap().input_type(), ValueType::Number);

    let err = registry
        .replace(number_node("unknown", transform_fn(|v| Ok(v))))
        .unwrap_err();
    assert!(matches!(err, ChainError::Graph(GraphError::UnknownNode(_))));
}

#[test]
fn test_router_needs_direction_and_classifier() {
    let mut registry = GraphRegistry::new();
    let err = registry
        .register(Node::router("router", ValueType::Number, "pick one"))
        .unwrap_err();
    assert!(matches!(err, ChainError::Configuration(_)));

    let mut registry = GraphRegistry::new().with_classifier(ParityClassifier::new());
    let err = registry
        .register(Node::router("router", ValueType::Number, "   "))
        .unwrap_err();
    assert!(matches!(err, ChainError::Configuration(_)));

    registry
        .register(Node::router("router", ValueType::Number, "pick one"))
        .unwrap();
    assert!(registry.node("router").unwrap().is_routing());
}

#[test]
fn test_entry_point_discovery() {
    let registry = parity_registry(ParityClassifier::new());
    assert_eq!(registry.entry_point().unwrap().name(), "inc");
    assert!(!registry.is_cyclic());

    let empty = GraphRegistry::new();
    assert!(matches!(
        empty.entry_point(),
        Err(ChainError::Graph(GraphError::NoEntryPoint))
    ));
}

#[test]
fn test_cycle_detection_is_diagnostic() {
    let mut registry = GraphRegistry::new();
    registry
        .register(number_node("a", Arc::new(AddNode(1.0))))
        .unwrap();
    registry
        .register(number_node("b", Arc::new(AddNode(1.0))))
        .unwrap();
    registry.connect("a", "b").unwrap();
    registry.connect("b", "a").unwrap();

    assert!(registry.is_cyclic());
    assert!(matches!(
        registry.entry_point(),
        Err(ChainError::Graph(GraphError::NoEntryPoint))
    ));
}
