/// The text-generation capability the analysis pipeline depends on.
///
/// The pipeline only needs `generate(prompt) -> text`. `choose` lets a backend constrain
/// its answer to a fixed set of values when it supports structured output; the default
/// falls back to free-text generation and leaves validation to the caller.
use async_trait::async_trait;
use serde::Deserialize;
use tracing::{debug, warn};

use crate::error::CommonError;
use crate::openai::{
    ChatCompletionRequest, ChatCompletionResponse, JsonSchemaFormat, Message, OpenAiClient,
    ResponseFormat,
};

#[async_trait]
pub trait TextGenerator: Send + Sync {
    async fn generate(&self, prompt: &str) -> Result<String, CommonError>;

    async fn choose(&self, prompt: &str, choices: &[String]) -> Result<String, CommonError> {
        let _ = choices;
        self.generate(prompt).await
    }
}

/// `TextGenerator` backed by an OpenAI-compatible chat completions endpoint.
pub struct ChatGenerator {
    client: OpenAiClient,
    model: String,
    structured_output: bool,
}

impl ChatGenerator {
    pub fn new(client: OpenAiClient, model: impl Into<String>) -> Self {
        Self {
            client,
            model: model.into(),
            structured_output: true,
        }
    }

    /// Disable `response_format` for hosts that reject JSON schemas.
    pub fn with_structured_output(mut self, enabled: bool) -> Self {
        self.structured_output = enabled;
        self
    }

    async fn complete(
        &self,
        prompt: &str,
        response_format: Option<ResponseFormat>,
    ) -> Result<String, CommonError> {
        let request = ChatCompletionRequest {
            model: self.model.clone(),
            messages: vec![Message::user(prompt)],
            temperature: None,
            max_tokens: None,
            response_format,
        };
        let response = self.client.chat_completions(request).await?;
        if let Some(usage) = &response.usage {
            debug!(
                model = %self.model,
                prompt_tokens = usage.prompt_tokens,
                completion_tokens = usage.completion_tokens,
                total_tokens = usage.total_tokens,
                "completion usage"
            );
        }
        completion_text(&response)
    }
}

/// Trimmed text of the first choice; blank or missing content is `EmptyCompletion`.
fn completion_text(response: &ChatCompletionResponse) -> Result<String, CommonError> {
    response
        .first_content()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .ok_or(CommonError::EmptyCompletion)
}

#[derive(Debug, Deserialize)]
struct Choice {
    choice: String,
}

/// JSON schema for an object with a single `choice` property restricted to `choices`.
pub fn choice_schema(choices: &[String]) -> serde_json::Value {
    serde_json::json!({
        "type": "object",
        "properties": {
            "choice": { "type": "string", "enum": choices }
        },
        "required": ["choice"],
        "additionalProperties": false
    })
}

#[async_trait]
impl TextGenerator for ChatGenerator {
    async fn generate(&self, prompt: &str) -> Result<String, CommonError> {
        self.complete(prompt, None).await
    }

    async fn choose(&self, prompt: &str, choices: &[String]) -> Result<String, CommonError> {
        if !self.structured_output || choices.is_empty() {
            return self.generate(prompt).await;
        }
        let format = ResponseFormat::JsonSchema {
            json_schema: JsonSchemaFormat {
                name: "choice".to_string(),
                schema: choice_schema(choices),
                strict: true,
            },
        };
        let raw = self.complete(prompt, Some(format)).await?;
        Ok(unwrap_choice(raw))
    }
}

/// Extract `choice` from a `{"choice": ...}` envelope. Anything else is returned as-is
/// for the caller to validate.
fn unwrap_choice(raw: String) -> String {
    match serde_json::from_str::<Choice>(&raw) {
        Ok(parsed) => parsed.choice,
        Err(e) => {
            warn!(error = %e, "structured choice was not valid JSON, using raw text");
            raw
        }
    }
}
