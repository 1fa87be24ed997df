use crate::registry::GraphRegistry;
use chaincore::{BoxError, ExecutionResult};

/// Observer invoked once after every successful run.
///
/// Callbacks run synchronously, in registration order. An error stops the
/// remaining callbacks and is returned from `run`.
pub trait RunCallback: Send + Sync {
    fn on_complete(&self, registry: &GraphRegistry, run: &ExecutionResult) -> Result<(), BoxError>;
}

impl<F> RunCallback for F
where
    F: Fn(&GraphRegistry, &ExecutionResult) -> Result<(), BoxError> + Send + Sync,
{
    fn on_complete(&self, registry: &GraphRegistry, run: &ExecutionResult) -> Result<(), BoxError> {
        self(registry, run)
    }
}
