use crate::config::ClassifierConfig;
use async_trait::async_trait;
use chaincore::{ChainError, RoutingError};
use serde::Serialize;
use serde_json::{json, Value as JsonValue};

/// One routing question put to a classifier
#[derive(Debug, Clone, Serialize)]
pub struct ClassificationRequest {
    /// Role-establishing text
    pub system_prompt: String,
    /// Direction, input and candidate list
    pub directive: String,
    pub schema_name: String,
    /// JSON schema the answer must satisfy
    pub schema: JsonValue,
}

/// External service that answers routing questions with structured output.
///
/// Implementations return the raw structured answer; decoding and candidate
/// matching happen in the router.
#[async_trait]
pub trait Classifier: Send + Sync {
    async fn classify(&self, request: &ClassificationRequest) -> Result<JsonValue, RoutingError>;
}

/// Classifier backed by an OpenAI-compatible chat-completions endpoint
pub struct OpenAiClassifier {
    client: reqwest::Client,
    config: ClassifierConfig,
}

impl OpenAiClassifier {
    pub fn new(config: ClassifierConfig) -> Result<Self, ChainError> {
        if config.api_key.trim().is_empty() {
            return Err(ChainError::Configuration(
                "classifier requires a non-empty API key".to_string(),
            ));
        }
        Ok(Self {
            client: reqwest::Client::new(),
            config,
        })
    }

    pub fn from_env() -> Result<Self, ChainError> {
        Self::new(ClassifierConfig::from_env()?)
    }

    pub fn config(&self) -> &ClassifierConfig {
        &self.config
    }

    fn payload(&self, request: &ClassificationRequest) -> JsonValue {
        json!({
            "model": self.config.model,
            "messages": [
                { "role": "system", "content": request.system_prompt },
                { "role": "user", "content": request.directive },
            ],
            "response_format": {
                "type": "json_schema",
                "json_schema": {
                    "name": request.schema_name,
                    "strict": true,
                    "schema": request.schema,
                },
            },
            "temperature": self.config.temperature,
            "max_tokens": self.config.max_tokens,
            "n": 1,
        })
    }
}

#[async_trait]
impl Classifier for OpenAiClassifier {
    async fn classify(&self, request: &ClassificationRequest) -> Result<JsonValue, RoutingError> {
        let url = format!(
            "{}/chat/completions",
            self.config.api_base.trim_end_matches('/')
        );

        let response = self
            .client
            .post(url)
            .bearer_auth(&self.config.api_key)
            .json(&self.payload(request))
            .send()
            .await
            .map_err(|e| RoutingError::Service(format!("request failed: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_else(|_| "unknown".to_string());
            tracing::error!(%status, "Classifier request rejected");
            return Err(RoutingError::Service(format!("{}: {}", status, body)));
        }

        let body: JsonValue = response
            .json()
            .await
            .map_err(|e| RoutingError::InvalidResponse(format!("response is not JSON: {}", e)))?;

        parse_completion(&body)
    }
}

/// Pull the structured answer out of a chat-completions response body
fn parse_completion(body: &JsonValue) -> Result<JsonValue, RoutingError> {
    let message = body
        .get("choices")
        .and_then(|c| c.as_array())
        .and_then(|choices| choices.first())
        .and_then(|choice| choice.get("message"))
        .ok_or_else(|| RoutingError::InvalidResponse("response has no choices".to_string()))?;

    if let Some(refusal) = message.get("refusal").and_then(|r| r.as_str()) {
        return Err(RoutingError::InvalidResponse(format!(
            "model refused: {}",
            refusal
        )));
    }

    let content = message
        .get("content")
        .and_then(|c| c.as_str())
        .ok_or_else(|| RoutingError::InvalidResponse("message has no content".to_string()))?;

    serde_json::from_str(content)
        .map_err(|e| RoutingError::InvalidResponse(format!("content is not JSON: {}", e)))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request() -> ClassificationRequest {
        ClassificationRequest {
            system_prompt: "role".into(),
            directive: "pick".into(),
            schema_name: "function_choice".into(),
            schema: json!({"type": "object"}),
        }
    }

    #[test]
    fn test_empty_key_rejected() {
        let result = OpenAiClassifier::new(ClassifierConfig::default());
        assert!(matches!(result, Err(ChainError::Configuration(_))));
    }

    #[test]
    fn test_payload_requests_strict_schema() {
        let classifier = OpenAiClassifier::new(ClassifierConfig::new("sk-test")).unwrap();
        let payload = classifier.payload(&request());

        assert_eq!(payload["model"], "gpt-4o-mini");
        assert_eq!(payload["messages"][0]["role"], "system");
        assert_eq!(payload["messages"][1]["content"], "pick");
        assert_eq!(payload["response_format"]["type"], "json_schema");
        assert_eq!(payload["response_format"]["json_schema"]["strict"], true);
        assert_eq!(payload["response_format"]["json_schema"]["name"], "function_choice");
        assert_eq!(payload["max_tokens"], 5000);
    }

    #[test]
    fn test_parse_completion_content() {
        let body = json!({
            "choices": [{
                "message": {
                    "role": "assistant",
                    "content": "{\"reasoning_steps\":[\"5 is odd\"],\"function_name\":\"sub3\"}",
                    "refusal": null
                }
            }]
        });
        let parsed = parse_completion(&body).unwrap();
        assert_eq!(parsed["function_name"], "sub3");
    }

    #[test]
    fn test_parse_completion_failures() {
        assert!(matches!(
            parse_completion(&json!({"choices": []})),
            Err(RoutingError::InvalidResponse(_))
        ));
        assert!(matches!(
            parse_completion(&json!({"choices": [{"message": {"refusal": "no"}}]})),
            Err(RoutingError::InvalidResponse(_))
        ));
        assert!(matches!(
            parse_completion(&json!({"choices": [{"message": {"content": "not json"}}]})),
            Err(RoutingError::InvalidResponse(_))
        ));
    }
}
