//! Function chain runtime
//!
//! This crate owns the graph registry, the traversal engine that walks a
//! chain from its entry point, and the routing protocol that lets a junction
//! ask an external classifier which successor runs next.

mod callback;
mod classifier;
mod config;
mod executor;
mod registry;
mod router;

pub use callback::RunCallback;
pub use classifier::{ClassificationRequest, Classifier, OpenAiClassifier};
pub use config::{ClassifierConfig, RuntimeConfig, DEFAULT_API_BASE, DEFAULT_MODEL, DEFAULT_SYSTEM_PROMPT};
pub use executor::ChainExecutor;
pub use registry::GraphRegistry;
pub use router::{FunctionChoice, RoutingNode};

pub use tokio_util::sync::CancellationToken;
