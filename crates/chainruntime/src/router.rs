use crate::classifier::{ClassificationRequest, Classifier};
use chaincore::{Node, RoutingError, RoutingSpec, Value};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::fmt::Write;

const SCHEMA_NAME: &str = "function_choice";

/// Structured answer expected from the classifier
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FunctionChoice {
    pub reasoning_steps: Vec<String>,
    pub function_name: String,
}

impl FunctionChoice {
    /// JSON schema handed to the classifier to constrain its answer
    pub fn schema() -> serde_json::Value {
        json!({
            "type": "object",
            "properties": {
                "reasoning_steps": {
                    "type": "array",
                    "items": { "type": "string" }
                },
                "function_name": { "type": "string" }
            },
            "required": ["reasoning_steps", "function_name"],
            "additionalProperties": false
        })
    }
}

/// A routing junction together with its candidate successors
pub struct RoutingNode<'a> {
    node: &'a Node,
    spec: &'a RoutingSpec,
    candidates: Vec<&'a Node>,
}

impl<'a> RoutingNode<'a> {
    /// Returns `None` when `node` is a plain transform
    pub fn new(node: &'a Node, candidates: Vec<&'a Node>) -> Option<Self> {
        let spec = node.routing()?;
        Some(Self {
            node,
            spec,
            candidates,
        })
    }

    pub fn name(&self) -> &str {
        self.node.name()
    }

    pub fn candidates(&self) -> &[&'a Node] {
        &self.candidates
    }

    /// Build the classifier request for one input
    pub fn compose_request(&self, default_system_prompt: &str, input: &Value) -> ClassificationRequest {
        let mut directive = String::new();
        let _ = writeln!(directive, "{}", self.spec.direction);
        let _ = writeln!(
            directive,
            "Given the input: {}, decide which function to execute next.",
            input
        );
        directive.push_str("Available functions:\n");
        for (i, candidate) in self.candidates.iter().enumerate() {
            let _ = writeln!(
                directive,
                "{}. {}: {}",
                i + 1,
                candidate.name(),
                candidate.description().unwrap_or("No description provided.")
            );
        }
        directive.push_str(
            "Respond with a JSON object like {\"reasoning_steps\": [\"step1\", \"step2\"], \"function_name\": \"chosen_function\"}.",
        );

        ClassificationRequest {
            system_prompt: self
                .spec
                .system_prompt
                .clone()
                .unwrap_or_else(|| default_system_prompt.to_string()),
            directive,
            schema_name: SCHEMA_NAME.to_string(),
            schema: FunctionChoice::schema(),
        }
    }

    /// Ask the classifier which candidate runs next.
    ///
    /// The answer must decode exactly into [`FunctionChoice`] and name one of
    /// the candidates; there is no fallback.
    pub async fn decide_path(
        &self,
        classifier: &dyn Classifier,
        default_system_prompt: &str,
        input: &Value,
    ) -> Result<(&'a Node, FunctionChoice), RoutingError> {
        if self.candidates.is_empty() {
            return Err(RoutingError::NoCandidates);
        }

        let request = self.compose_request(default_system_prompt, input);
        tracing::debug!(
            router = %self.name(),
            system_prompt = %request.system_prompt,
            directive = %request.directive,
            "Sending routing request"
        );

        let raw = classifier.classify(&request).await?;
        let choice: FunctionChoice = serde_json::from_value(raw)
            .map_err(|e| RoutingError::InvalidResponse(e.to_string()))?;

        tracing::info!(
            router = %self.name(),
            chosen = %choice.function_name,
            reasoning = ?choice.reasoning_steps,
            "Router decided next function"
        );

        let next = self
            .candidates
            .iter()
            .copied()
            .find(|candidate| candidate.name() == choice.function_name)
            .ok_or_else(|| RoutingError::UnknownCandidate {
                chosen: choice.function_name.clone(),
                candidates: self.candidates.iter().map(|c| c.name().to_string()).collect(),
            })?;

        Ok((next, choice))
    }
}
