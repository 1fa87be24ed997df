use crate::{ExecutionId, Value};
use serde::{Deserialize, Serialize};

/// Record of one node visit
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Step {
    function_name: String,
    input_value: Value,
    output_value: Value,
}

impl Step {
    pub fn new(function_name: impl Into<String>, input_value: Value, output_value: Value) -> Self {
        Self {
            function_name: function_name.into(),
            input_value,
            output_value,
        }
    }

    pub fn function_name(&self) -> &str {
        &self.function_name
    }

    pub fn input_value(&self) -> &Value {
        &self.input_value
    }

    pub fn output_value(&self) -> &Value {
        &self.output_value
    }
}

/// Outcome of one run: the ordered trace and the value left by the terminal node
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExecutionResult {
    execution_id: ExecutionId,
    steps: Vec<Step>,
    final_output: Value,
}

impl ExecutionResult {
    pub fn new(execution_id: ExecutionId, steps: Vec<Step>, final_output: Value) -> Self {
        Self {
            execution_id,
            steps,
            final_output,
        }
    }

    pub fn execution_id(&self) -> ExecutionId {
        self.execution_id
    }

    pub fn steps(&self) -> &[Step] {
        &self.steps
    }

    pub fn final_output(&self) -> &Value {
        &self.final_output
    }

    /// Names of the visited nodes, in visitation order
    pub fn path(&self) -> Vec<&str> {
        self.steps.iter().map(Step::function_name).collect()
    }

    pub fn into_parts(self) -> (Vec<Step>, Value) {
        (self.steps, self.final_output)
    }
}
