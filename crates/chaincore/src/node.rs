use crate::{NodeError, Value, ValueType};
use async_trait::async_trait;
use std::fmt;
use std::sync::Arc;

/// Core trait that every wrapped transformation implements
#[async_trait]
pub trait Transform: Send + Sync {
    /// Transform one input value into one output value
    async fn apply(&self, input: Value) -> Result<Value, NodeError>;
}

/// Adapter turning a synchronous closure into a [`Transform`]
pub struct FnTransform<F>(F);

#[async_trait]
impl<F> Transform for FnTransform<F>
where
    F: Fn(Value) -> Result<Value, NodeError> + Send + Sync,
{
    async fn apply(&self, input: Value) -> Result<Value, NodeError> {
        (self.0)(input)
    }
}

/// Wrap a closure as a shareable transform.
///
/// ```
/// use chaincore::{transform_fn, NodeError, Value};
///
/// let add_one = transform_fn(|v: Value| {
///     let n = v.as_f64().ok_or_else(|| NodeError::ExecutionFailed("not a number".into()))?;
///     Ok(Value::Number(n + 1.0))
/// });
/// # let _ = add_one;
/// ```
pub fn transform_fn<F>(f: F) -> Arc<dyn Transform>
where
    F: Fn(Value) -> Result<Value, NodeError> + Send + Sync + 'static,
{
    Arc::new(FnTransform(f))
}

/// Settings of a routing junction
#[derive(Debug, Clone, PartialEq)]
pub struct RoutingSpec {
    /// Node-specific direction text telling the classifier how to choose
    pub direction: String,
    /// Overrides the registry's default role text when set
    pub system_prompt: Option<String>,
}

/// What a node does when it is visited
#[derive(Clone)]
pub enum NodeKind {
    Transform(Arc<dyn Transform>),
    Routing(RoutingSpec),
}

impl fmt::Debug for NodeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NodeKind::Transform(_) => f.write_str("Transform(..)"),
            NodeKind::Routing(spec) => f.debug_tuple("Routing").field(spec).finish(),
        }
    }
}

/// A registered unit of work.
///
/// Outgoing edges are not stored here; the registry owns topology and hands
/// out successors in creation order.
#[derive(Debug, Clone)]
pub struct Node {
    name: String,
    input_type: ValueType,
    output_type: ValueType,
    description: Option<String>,
    kind: NodeKind,
}

impl Node {
    pub fn transform(
        name: impl Into<String>,
        input_type: ValueType,
        output_type: ValueType,
        transform: Arc<dyn Transform>,
    ) -> Self {
        Self {
            name: name.into(),
            input_type,
            output_type,
            description: None,
            kind: NodeKind::Transform(transform),
        }
    }

    /// A routing junction passes its input through, so input and output
    /// share one declared type.
    pub fn router(
        name: impl Into<String>,
        value_type: ValueType,
        direction: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            input_type: value_type,
            output_type: value_type,
            description: None,
            kind: NodeKind::Routing(RoutingSpec {
                direction: direction.into(),
                system_prompt: None,
            }),
        }
    }

    /// Description shown to a classifier when this node is a routing candidate
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Per-router role text. Has no effect on transform nodes.
    pub fn with_system_prompt(mut self, prompt: impl Into<String>) -> Self {
        if let NodeKind::Routing(spec) = &mut self.kind {
            spec.system_prompt = Some(prompt.into());
        }
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn input_type(&self) -> ValueType {
        self.input_type
    }

    pub fn output_type(&self) -> ValueType {
        self.output_type
    }

    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    pub fn kind(&self) -> &NodeKind {
        &self.kind
    }

    pub fn routing(&self) -> Option<&RoutingSpec> {
        match &self.kind {
            NodeKind::Routing(spec) => Some(spec),
            NodeKind::Transform(_) => None,
        }
    }

    pub fn is_routing(&self) -> bool {
        self.routing().is_some()
    }

    /// Run the node on one value. Routing nodes return their input unchanged.
    pub async fn execute(&self, input: Value) -> Result<Value, NodeError> {
        match &self.kind {
            NodeKind::Transform(transform) => {
                tracing::info!(node = %self.name, input = %input, "Executing node");
                transform.apply(input).await
            }
            NodeKind::Routing(_) => {
                tracing::info!(node = %self.name, "Router called, passing input through unchanged");
                Ok(input)
            }
        }
    }
}
