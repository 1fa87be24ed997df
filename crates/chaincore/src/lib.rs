//! Core abstractions for the function chain engine
//!
//! This crate provides the value model, the node model, the step trace and
//! the error taxonomy shared by the runtime and by transform libraries.

mod error;
mod events;
mod node;
mod trace;
mod value;

pub use error::{BoxError, ChainError, GraphError, NodeError, RoutingError};
pub use events::{EventBus, ExecutionEvent, ExecutionId};
pub use node::{transform_fn, FnTransform, Node, NodeKind, RoutingSpec, Transform};
pub use trace::{ExecutionResult, Step};
pub use value::{Value, ValueType};

/// Result type for chain operations
pub type Result<T> = std::result::Result<T, ChainError>;
