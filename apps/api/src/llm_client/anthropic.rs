//! Anthropic Messages API adapter.
//!
//! Anthropic has no constrained-JSON mode, so `json_mode` is honoured by
//! appending the shared JSON-only instruction to the system prompt.

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::classify::{self, FailureClass};
use super::prompts::JSON_ONLY_SYSTEM;
use super::{CallOptions, LlmBackend, LlmError, ProviderKind};
use crate::errors::AppError;

const ANTHROPIC_API_URL: &str = "https://api.anthropic.com/v1/messages";
const ANTHROPIC_VERSION: &str = "2023-06-01";

#[derive(Debug, Serialize)]
struct AnthropicRequest<'a> {
    model: &'a str,
    max_tokens: u32,
    temperature: f32,
    system: &'a str,
    messages: Vec<AnthropicMessage<'a>>,
}

#[derive(Debug, Serialize)]
struct AnthropicMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct AnthropicResponse {
    content: Vec<ContentBlock>,
    usage: Usage,
}

#[derive(Debug, Deserialize)]
struct ContentBlock {
    #[serde(rename = "type")]
    block_type: String,
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Usage {
    input_tokens: u32,
    output_tokens: u32,
}

impl AnthropicResponse {
    /// Extracts the text content from the first text block.
    fn text(&self) -> Option<&str> {
        self.content
            .iter()
            .find(|b| b.block_type == "text")
            .and_then(|b| b.text.as_deref())
    }
}

#[derive(Debug, Deserialize)]
struct AnthropicError {
    error: AnthropicErrorBody,
}

#[derive(Debug, Deserialize)]
struct AnthropicErrorBody {
    #[serde(rename = "type")]
    error_type: Option<String>,
    message: String,
}

pub struct AnthropicBackend {
    client: Client,
    api_key: String,
    model: String,
}

impl AnthropicBackend {
    pub fn new(client: Client, api_key: String, model: String) -> Self {
        Self {
            client,
            api_key,
            model,
        }
    }
}

#[async_trait]
impl LlmBackend for AnthropicBackend {
    fn provider(&self) -> ProviderKind {
        ProviderKind::Anthropic
    }

    fn model(&self) -> &str {
        &self.model
    }

    async fn submit(
        &self,
        system: &str,
        user: &str,
        options: &CallOptions,
    ) -> Result<String, LlmError> {
        let system = system_prompt(system, options.json_mode);
        let request_body = AnthropicRequest {
            model: &self.model,
            max_tokens: options.max_tokens,
            temperature: options.temperature,
            system: &system,
            messages: vec![AnthropicMessage {
                role: "user",
                content: user,
            }],
        };

        let response = self
            .client
            .post(ANTHROPIC_API_URL)
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", ANTHROPIC_VERSION)
            .header("content-type", "application/json")
            .json(&request_body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(parse_error(status.as_u16(), body));
        }

        let parsed: AnthropicResponse = serde_json::from_str(&response.text().await?)?;

        debug!(
            "Anthropic call succeeded: input_tokens={}, output_tokens={}",
            parsed.usage.input_tokens, parsed.usage.output_tokens
        );

        parsed
            .text()
            .filter(|t| !t.trim().is_empty())
            .map(str::to_string)
            .ok_or(LlmError::EmptyContent)
    }

    fn classify_failure(&self, err: LlmError) -> AppError {
        classify::classify(ProviderKind::Anthropic, &self.model, err, anthropic_code_class)
    }
}

fn system_prompt(system: &str, json_mode: bool) -> String {
    if json_mode {
        format!("{system}\n\n{JSON_ONLY_SYSTEM}")
    } else {
        system.to_string()
    }
}

fn parse_error(status: u16, body: String) -> LlmError {
    // Try to parse error message
    match serde_json::from_str::<AnthropicError>(&body) {
        Ok(e) => LlmError::Api {
            status,
            code: e.error.error_type,
            message: e.error.message,
        },
        Err(_) => LlmError::Api {
            status,
            code: None,
            message: body,
        },
    }
}

fn anthropic_code_class(code: &str) -> Option<FailureClass> {
    match code {
        "authentication_error" | "permission_error" => Some(FailureClass::Authentication),
        "rate_limit_error" => Some(FailureClass::RateLimited),
        "not_found_error" => Some(FailureClass::ModelUnavailable),
        _ => None,
    }
}
