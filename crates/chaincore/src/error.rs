use crate::ValueType;
use thiserror::Error;

/// Boxed error returned by user-supplied hooks.
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

#[derive(Error, Debug)]
pub enum ChainError {
    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Graph error: {0}")]
    Graph(#[from] GraphError),

    #[error("Routing decision failed at '{node}': {source}")]
    Routing {
        node: String,
        #[source]
        source: RoutingError,
    },

    #[error("Node '{node}' failed: {source}")]
    Node {
        node: String,
        #[source]
        source: NodeError,
    },

    #[error("Callback #{index} failed: {source}")]
    Callback {
        index: usize,
        #[source]
        source: BoxError,
    },

    #[error("Run cancelled")]
    Cancelled,
}

impl ChainError {
    pub fn routing(node: impl Into<String>, source: RoutingError) -> Self {
        ChainError::Routing {
            node: node.into(),
            source,
        }
    }

    pub fn node(node: impl Into<String>, source: NodeError) -> Self {
        ChainError::Node {
            node: node.into(),
            source,
        }
    }
}

/// Errors raised by a wrapped transform
#[derive(Error, Debug, Clone)]
pub enum NodeError {
    #[error("Invalid input type: expected {expected}, got {actual}")]
    InvalidInputType {
        expected: ValueType,
        actual: ValueType,
    },

    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Execution failed: {0}")]
    ExecutionFailed(String),
}

/// Topology errors, raised while building or entering the graph
#[derive(Error, Debug, Clone, PartialEq)]
pub enum GraphError {
    #[error("Node not found: {0}")]
    UnknownNode(String),

    #[error("Node already registered: {0}")]
    DuplicateNode(String),

    #[error("Type mismatch: '{from}' outputs {output} but '{to}' expects {input}")]
    TypeMismatch {
        from: String,
        to: String,
        output: ValueType,
        input: ValueType,
    },

    #[error("No entry point found; the graph is empty or every node has an incoming edge (cycle)")]
    NoEntryPoint,

    #[error("Ambiguous entry point: {} nodes have no incoming edge ({})", .0.len(), .0.join(", "))]
    AmbiguousEntryPoint(Vec<String>),

    #[error("Node '{0}' has multiple outgoing edges; use a routing node to handle branching")]
    BranchingWithoutRouter(String),

    #[error("Step limit of {0} exceeded; the graph likely contains a cycle")]
    StepLimitExceeded(usize),
}

/// Failures of the dynamic routing protocol
#[derive(Error, Debug, Clone, PartialEq)]
pub enum RoutingError {
    #[error("routing node has no outgoing edges to choose from")]
    NoCandidates,

    #[error("classifier request failed: {0}")]
    Service(String),

    #[error("invalid classifier response: {0}")]
    InvalidResponse(String),

    #[error("classifier chose '{chosen}', which is not one of [{}]", .candidates.join(", "))]
    UnknownCandidate {
        chosen: String,
        candidates: Vec<String>,
    },

    #[error("classifier did not answer within {0}ms")]
    Timeout(u64),
}
