// crates/chainruntime/tests/common/mod.rs

#![allow(dead_code)]

use async_trait::async_trait;
use chaincore::{transform_fn, Node, NodeError, RoutingError, Value, ValueType};
use chainnodes::{AddNode, MultiplyNode, SubtractNode};
use chainruntime::{ClassificationRequest, Classifier, GraphRegistry};
use serde_json::json;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

/// Picks `double` for even inputs and `sub3` for odd ones, reading the
/// number back out of the directive
pub struct ParityClassifier {
    pub requests: Mutex<Vec<ClassificationRequest>>,
}

impl ParityClassifier {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            requests: Mutex::new(Vec::new()),
        })
    }
}

#[async_trait]
impl Classifier for ParityClassifier {
    async fn classify(&self, request: &ClassificationRequest) -> Result<serde_json::Value, RoutingError> {
        self.requests.lock().unwrap().push(request.clone());

        let number: f64 = request
            .directive
            .split("Given the input: ")
            .nth(1)
            .and_then(|rest| rest.split(',').next())
            .and_then(|n| n.trim().parse().ok())
            .ok_or_else(|| RoutingError::InvalidResponse("no number in directive".into()))?;

        let (reason, name) = if number % 2.0 == 0.0 {
            (format!("{} is even", number), "double")
        } else {
            (format!("{} is odd", number), "sub3")
        };
        Ok(json!({ "reasoning_steps": [reason], "function_name": name }))
    }
}

/// Always answers with the same payload
pub struct ScriptedClassifier {
    answer: Result<serde_json::Value, RoutingError>,
    pub calls: AtomicUsize,
}

impl ScriptedClassifier {
    pub fn answering(answer: serde_json::Value) -> Arc<Self> {
        Arc::new(Self {
            answer: Ok(answer),
            calls: AtomicUsize::new(0),
        })
    }

    pub fn failing(error: RoutingError) -> Arc<Self> {
        Arc::new(Self {
            answer: Err(error),
            calls: AtomicUsize::new(0),
        })
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Classifier for ScriptedClassifier {
    async fn classify(&self, _request: &ClassificationRequest) -> Result<serde_json::Value, RoutingError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.answer.clone()
    }
}

/// Never answers
pub struct StalledClassifier;

#[async_trait]
impl Classifier for StalledClassifier {
    async fn classify(&self, _request: &ClassificationRequest) -> Result<serde_json::Value, RoutingError> {
        std::future::pending().await
    }
}

pub fn number_node(name: &str, transform: Arc<dyn chaincore::Transform>) -> Node {
    Node::transform(name, ValueType::Number, ValueType::Number, transform)
}

pub fn failing_node(name: &str, message: &'static str) -> Node {
    number_node(
        name,
        transform_fn(move |_| Err(NodeError::ExecutionFailed(message.to_string()))),
    )
}

/// `inc -> router -> {double, sub3}`
pub fn parity_registry(classifier: Arc<dyn Classifier>) -> GraphRegistry {
    let mut registry = GraphRegistry::new().with_classifier(classifier);
    registry
        .register(number_node("inc", Arc::new(AddNode(1.0))).with_description("Adds one"))
        .unwrap();
    registry
        .register(Node::router(
            "router",
            ValueType::Number,
            "If the number is even, pick double. If the number is odd, pick sub3.",
        ))
        .unwrap();
    registry
        .register(number_node("double", Arc::new(MultiplyNode(2.0))).with_description("Multiplies by two"))
        .unwrap();
    registry
        .register(number_node("sub3", Arc::new(SubtractNode(3.0))).with_description("Subtracts three"))
        .unwrap();

    registry.connect("inc", "router").unwrap();
    registry.connect("router", "double").unwrap();
    registry.connect("router", "sub3").unwrap();
    registry
}

pub fn steps_of(run: &chaincore::ExecutionResult) -> Vec<(String, Value, Value)> {
    run.steps()
        .iter()
        .map(|s| {
            (
                s.function_name().to_string(),
                s.input_value().clone(),
                s.output_value().clone(),
            )
        })
        .collect()
}
