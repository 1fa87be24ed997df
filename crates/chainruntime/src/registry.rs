use crate::callback::RunCallback;
use crate::classifier::Classifier;
use crate::config::RuntimeConfig;
use crate::executor::ChainExecutor;
use chaincore::{
    ChainError, EventBus, ExecutionEvent, ExecutionResult, GraphError, Node, Result, Value,
};
use petgraph::algo::is_cyclic_directed;
use petgraph::graph::{DiGraph, NodeIndex};
use petgraph::visit::EdgeRef;
use petgraph::Direction;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::broadcast;
use tokio_util::sync::CancellationToken;

/// Owner of the chain topology.
///
/// Nodes and edges are added during a build phase through `&mut self`;
/// runs only need `&self`, so a built registry can be shared freely.
/// Edge weights record the position of an edge in its source's edge list.
pub struct GraphRegistry {
    graph: DiGraph<Node, usize>,
    index: HashMap<String, NodeIndex>,
    callbacks: Vec<Arc<dyn RunCallback>>,
    classifier: Option<Arc<dyn Classifier>>,
    executor: ChainExecutor,
    event_bus: Arc<EventBus>,
    config: RuntimeConfig,
}

impl GraphRegistry {
    /// Create a registry with default settings and no classifier
    pub fn new() -> Self {
        Self::with_config(RuntimeConfig::default())
    }

    pub fn with_config(config: RuntimeConfig) -> Self {
        Self {
            graph: DiGraph::new(),
            index: HashMap::new(),
            callbacks: Vec::new(),
            classifier: None,
            executor: ChainExecutor::new(&config),
            event_bus: Arc::new(EventBus::new(config.event_buffer_size)),
            config,
        }
    }

    /// Attach the service consulted by routing nodes
    pub fn with_classifier(mut self, classifier: Arc<dyn Classifier>) -> Self {
        self.classifier = Some(classifier);
        self
    }

    pub fn set_classifier(&mut self, classifier: Arc<dyn Classifier>) {
        self.classifier = Some(classifier);
    }

    /// Register a new node. Names are unique; use [`replace`](Self::replace)
    /// to swap an existing one.
    pub fn register(&mut self, node: Node) -> Result<()> {
        if self.index.contains_key(node.name()) {
            return Err(GraphError::DuplicateNode(node.name().to_string()).into());
        }
        self.validate_node(&node)?;

        tracing::info!(
            node = %node.name(),
            routing = node.is_routing(),
            input_type = %node.input_type(),
            output_type = %node.output_type(),
            "Registered function"
        );
        let name = node.name().to_string();
        let idx = self.graph.add_node(node);
        self.index.insert(name, idx);
        Ok(())
    }

    /// Swap the node registered under `node.name()`, keeping its edges.
    ///
    /// The new declared types must still agree with every existing edge.
    pub fn replace(&mut self, node: Node) -> Result<()> {
        let idx = self.index_of(node.name())?;
        self.validate_node(&node)?;

        for edge in self.graph.edges_directed(idx, Direction::Incoming) {
            let output = if edge.source() == idx {
                node.output_type()
            } else {
                self.graph[edge.source()].output_type()
            };
            if output != node.input_type() {
                return Err(GraphError::TypeMismatch {
                    from: self.graph[edge.source()].name().to_string(),
                    to: node.name().to_string(),
                    output,
                    input: node.input_type(),
                }
                .into());
            }
        }
        for edge in self.graph.edges_directed(idx, Direction::Outgoing) {
            let input = if edge.target() == idx {
                node.input_type()
            } else {
                self.graph[edge.target()].input_type()
            };
            if node.output_type() != input {
                return Err(GraphError::TypeMismatch {
                    from: node.name().to_string(),
                    to: self.graph[edge.target()].name().to_string(),
                    output: node.output_type(),
                    input,
                }
                .into());
            }
        }

        tracing::info!(node = %node.name(), "Replaced function");
        self.graph[idx] = node;
        Ok(())
    }

    /// Append `target` to the edge list of `source`
    pub fn connect(&mut self, source: &str, target: &str) -> Result<()> {
        let from = self.index_of(source)?;
        let to = self.index_of(target)?;

        let output = self.graph[from].output_type();
        let input = self.graph[to].input_type();
        if output != input {
            return Err(GraphError::TypeMismatch {
                from: source.to_string(),
                to: target.to_string(),
                output,
                input,
            }
            .into());
        }

        let position = self.graph.edges_directed(from, Direction::Outgoing).count();
        self.graph.add_edge(from, to, position);
        tracing::info!("Created edge from '{}' to '{}'", source, target);
        Ok(())
    }

    /// Add an observer notified after every completed run
    pub fn add_callback(&mut self, callback: impl RunCallback + 'static) {
        self.callbacks.push(Arc::new(callback));
        tracing::info!(callbacks = self.callbacks.len(), "Added a new callback");
    }

    /// Walk the chain from its entry point with `initial_input`
    pub async fn run(&self, initial_input: impl Into<Value>) -> Result<ExecutionResult> {
        self.run_with_cancellation(initial_input, CancellationToken::new())
            .await
    }

    /// Same as [`run`](Self::run), stopping with `ChainError::Cancelled` once
    /// `cancel` fires
    pub async fn run_with_cancellation(
        &self,
        initial_input: impl Into<Value>,
        cancel: CancellationToken,
    ) -> Result<ExecutionResult> {
        self.executor
            .execute(self, initial_input.into(), cancel)
            .await
    }

    pub fn contains(&self, name: &str) -> bool {
        self.index.contains_key(name)
    }

    pub fn node(&self, name: &str) -> Option<&Node> {
        self.index.get(name).map(|idx| &self.graph[*idx])
    }

    /// Successors of `name`, in the order the edges were created
    pub fn successors(&self, name: &str) -> Result<Vec<&Node>> {
        let idx = self.index_of(name)?;
        Ok(self.successors_at(idx))
    }

    /// Registered names, in registration order
    pub fn node_names(&self) -> Vec<&str> {
        self.graph
            .node_indices()
            .map(|idx| self.graph[idx].name())
            .collect()
    }

    pub fn len(&self) -> usize {
        self.graph.node_count()
    }

    pub fn is_empty(&self) -> bool {
        self.graph.node_count() == 0
    }

    pub fn edge_count(&self) -> usize {
        self.graph.edge_count()
    }

    /// The unique node without incoming edges
    pub fn entry_point(&self) -> Result<&Node> {
        let idx = self.entry_index()?;
        Ok(&self.graph[idx])
    }

    /// Diagnostic only; cycles are allowed and bounded by the step limit
    pub fn is_cyclic(&self) -> bool {
        is_cyclic_directed(&self.graph)
    }

    pub fn subscribe_events(&self) -> broadcast::Receiver<ExecutionEvent> {
        self.event_bus.subscribe()
    }

    pub fn event_bus(&self) -> &Arc<EventBus> {
        &self.event_bus
    }

    pub fn config(&self) -> &RuntimeConfig {
        &self.config
    }

    pub(crate) fn classifier(&self) -> Option<&Arc<dyn Classifier>> {
        self.classifier.as_ref()
    }

    pub(crate) fn callbacks(&self) -> &[Arc<dyn RunCallback>] {
        &self.callbacks
    }

    pub(crate) fn node_at(&self, idx: NodeIndex) -> &Node {
        &self.graph[idx]
    }

    pub(crate) fn index_of(&self, name: &str) -> Result<NodeIndex> {
        self.index
            .get(name)
            .copied()
            .ok_or_else(|| GraphError::UnknownNode(name.to_string()).into())
    }

    pub(crate) fn successor_indices(&self, idx: NodeIndex) -> Vec<NodeIndex> {
        let mut edges: Vec<_> = self
            .graph
            .edges_directed(idx, Direction::Outgoing)
            .map(|edge| (*edge.weight(), edge.target()))
            .collect();
        edges.sort_by_key(|(position, _)| *position);
        edges.into_iter().map(|(_, target)| target).collect()
    }

    pub(crate) fn successors_at(&self, idx: NodeIndex) -> Vec<&Node> {
        self.successor_indices(idx)
            .into_iter()
            .map(|target| &self.graph[target])
            .collect()
    }

    pub(crate) fn entry_index(&self) -> std::result::Result<NodeIndex, GraphError> {
        let entries: Vec<NodeIndex> = self
            .graph
            .node_indices()
            .filter(|idx| {
                self.graph
                    .neighbors_directed(*idx, Direction::Incoming)
                    .next()
                    .is_none()
            })
            .collect();

        match entries.as_slice() {
            [] => Err(GraphError::NoEntryPoint),
            [entry] => Ok(*entry),
            many => Err(GraphError::AmbiguousEntryPoint(
                many.iter()
                    .map(|idx| self.graph[*idx].name().to_string())
                    .collect(),
            )),
        }
    }

    fn validate_node(&self, node: &Node) -> Result<()> {
        if let Some(spec) = node.routing() {
            if spec.direction.trim().is_empty() {
                return Err(ChainError::Configuration(format!(
                    "routing node '{}' needs direction text to guide the classifier",
                    node.name()
                )));
            }
            if self.classifier.is_none() {
                return Err(ChainError::Configuration(format!(
                    "routing node '{}' registered without a classifier",
                    node.name()
                )));
            }
        }
        Ok(())
    }
}

impl Default for GraphRegistry {
    fn default() -> Self {
        Self::new()
    }
}
