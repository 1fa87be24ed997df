use async_trait::async_trait;
use chaincore::{NodeError, Transform, Value, ValueType};

/// Parse a JSON string into `Value::Json`
pub struct JsonParseNode;

#[async_trait]
impl Transform for JsonParseNode {
    async fn apply(&self, input: Value) -> Result<Value, NodeError> {
        let text = input.as_str().ok_or_else(|| NodeError::InvalidInputType {
            expected: ValueType::String,
            actual: input.value_type(),
        })?;

        let parsed: serde_json::Value = serde_json::from_str(text)
            .map_err(|e| NodeError::ExecutionFailed(format!("JSON parse error: {}", e)))?;

        Ok(Value::Json(parsed))
    }
}

/// Render any value as a pretty JSON string
pub struct JsonStringifyNode;

#[async_trait]
impl Transform for JsonStringifyNode {
    async fn apply(&self, input: Value) -> Result<Value, NodeError> {
        let json_str = serde_json::to_string_pretty(&input.to_json())
            .map_err(|e| NodeError::ExecutionFailed(format!("JSON stringify error: {}", e)))?;

        Ok(Value::String(json_str))
    }
}
