use async_trait::async_trait;
use chaincore::{NodeError, Transform, Value};

/// Logs the value it receives and passes it on unchanged
pub struct DebugNode {
    label: String,
}

impl DebugNode {
    pub fn new(label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
        }
    }
}

#[async_trait]
impl Transform for DebugNode {
    async fn apply(&self, input: Value) -> Result<Value, NodeError> {
        tracing::info!(label = %self.label, value_type = %input.value_type(), "DEBUG: {}", input);
        Ok(input)
    }
}
