use async_trait::async_trait;
use chaincore::{NodeError, Transform, Value, ValueType};

fn number(input: &Value) -> Result<f64, NodeError> {
    input.as_f64().ok_or_else(|| NodeError::InvalidInputType {
        expected: ValueType::Number,
        actual: input.value_type(),
    })
}

/// Adds a fixed operand
pub struct AddNode(pub f64);

#[async_trait]
impl Transform for AddNode {
    async fn apply(&self, input: Value) -> Result<Value, NodeError> {
        Ok(Value::Number(number(&input)? + self.0))
    }
}

/// Subtracts a fixed operand
pub struct SubtractNode(pub f64);

#[async_trait]
impl Transform for SubtractNode {
    async fn apply(&self, input: Value) -> Result<Value, NodeError> {
        Ok(Value::Number(number(&input)? - self.0))
    }
}

/// Multiplies by a fixed factor
pub struct MultiplyNode(pub f64);

#[async_trait]
impl Transform for MultiplyNode {
    async fn apply(&self, input: Value) -> Result<Value, NodeError> {
        Ok(Value::Number(number(&input)? * self.0))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_arithmetic() {
        assert_eq!(AddNode(1.0).apply(Value::Number(4.0)).await.unwrap(), Value::Number(5.0));
        assert_eq!(SubtractNode(3.0).apply(Value::Number(5.0)).await.unwrap(), Value::Number(2.0));
        assert_eq!(MultiplyNode(2.0).apply(Value::Number(6.0)).await.unwrap(), Value::Number(12.0));
    }

    #[tokio::test]
    async fn test_rejects_non_numbers() {
        let err = AddNode(1.0).apply(Value::from("4")).await.unwrap_err();
        assert!(matches!(
            err,
            NodeError::InvalidInputType {
                expected: ValueType::Number,
                actual: ValueType::String
            }
        ));
    }
}
