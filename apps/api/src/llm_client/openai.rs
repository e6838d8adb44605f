//! OpenAI chat completions adapter.

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::classify::{self, FailureClass};
use super::{CallOptions, LlmBackend, LlmError, ProviderKind};
use crate::errors::AppError;

const OPENAI_API_URL: &str = "https://api.openai.com/v1/chat/completions";

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: [ChatMessage<'a>; 2],
    temperature: f32,
    max_tokens: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    response_format: Option<ResponseFormat>,
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Serialize)]
struct ResponseFormat {
    #[serde(rename = "type")]
    format_type: &'static str,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<Choice>,
    usage: Option<Usage>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChoiceMessage {
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Usage {
    prompt_tokens: u32,
    completion_tokens: u32,
}

#[derive(Debug, Deserialize)]
struct OpenAiError {
    error: OpenAiErrorBody,
}

#[derive(Debug, Deserialize)]
struct OpenAiErrorBody {
    message: String,
    #[serde(rename = "type")]
    error_type: Option<String>,
    code: Option<String>,
}

pub struct OpenAiBackend {
    client: Client,
    api_key: String,
    model: String,
}

impl OpenAiBackend {
    pub fn new(client: Client, api_key: String, model: String) -> Self {
        Self {
            client,
            api_key,
            model,
        }
    }
}

#[async_trait]
impl LlmBackend for OpenAiBackend {
    fn provider(&self) -> ProviderKind {
        ProviderKind::OpenAi
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
        let request_body = ChatRequest {
            model: &self.model,
            messages: [
                ChatMessage {
                    role: "system",
                    content: system,
                },
                ChatMessage {
                    role: "user",
                    content: user,
                },
            ],
            temperature: options.temperature,
            max_tokens: options.max_tokens,
            response_format: options.json_mode.then_some(ResponseFormat {
                format_type: "json_object",
            }),
        };

        let response = self
            .client
            .post(OPENAI_API_URL)
            .bearer_auth(&self.api_key)
            .json(&request_body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(parse_error(status.as_u16(), body));
        }

        let parsed: ChatResponse = serde_json::from_str(&response.text().await?)?;

        if let Some(usage) = &parsed.usage {
            debug!(
                "OpenAI call succeeded: prompt_tokens={}, completion_tokens={}",
                usage.prompt_tokens, usage.completion_tokens
            );
        }

        parsed
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .filter(|text| !text.trim().is_empty())
            .ok_or(LlmError::EmptyContent)
    }

    fn classify_failure(&self, err: LlmError) -> AppError {
        classify::classify(ProviderKind::OpenAi, &self.model, err, openai_code_class)
    }
}

fn parse_error(status: u16, body: String) -> LlmError {
    match serde_json::from_str::<OpenAiError>(&body) {
        Ok(e) => LlmError::Api {
            status,
            code: e.error.code.or(e.error.error_type),
            message: e.error.message,
        },
        Err(_) => LlmError::Api {
            status,
            code: None,
            message: body,
        },
    }
}

fn openai_code_class(code: &str) -> Option<FailureClass> {
    match code {
        "invalid_api_key" | "invalid_organization" | "authentication_error" => {
            Some(FailureClass::Authentication)
        }
        "insufficient_quota" | "rate_limit_exceeded" | "requests" | "tokens" => {
            Some(FailureClass::RateLimited)
        }
        "model_not_found" => Some(FailureClass::ModelUnavailable),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::ErrorKind;

    fn backend() -> OpenAiBackend {
        OpenAiBackend::new(Client::new(), "sk-test".into(), "gpt-4o-mini".into())
    }

    #[test]
    fn test_request_serializes_json_mode_and_temperature() {
        let body = ChatRequest {
            model: "gpt-4o-mini",
            messages: [
                ChatMessage {
                    role: "system",
                    content: "sys",
                },
                ChatMessage {
                    role: "user",
                    content: "usr",
                },
            ],
            temperature: 0.2,
            max_tokens: 128,
            response_format: Some(ResponseFormat {
                format_type: "json_object",
            }),
        };
        let value = serde_json::to_value(&body).unwrap();
        assert_eq!(value["response_format"]["type"], "json_object");
        assert_eq!(value["messages"][0]["role"], "system");
        assert_eq!(value["messages"][1]["content"], "usr");
        assert!((value["temperature"].as_f64().unwrap() - 0.2).abs() < 1e-6);
    }

    #[test]
    fn test_parse_error_reads_code_from_body() {
        let body = r#"{"error": {"message": "Incorrect API key provided: sk-***", "type": "invalid_request_error", "code": "invalid_api_key"}}"#;
        match parse_error(401, body.to_string()) {
            LlmError::Api {
                status,
                code,
                message,
            } => {
                assert_eq!(status, 401);
                assert_eq!(code.as_deref(), Some("invalid_api_key"));
                assert!(message.starts_with("Incorrect API key"));
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn test_parse_error_keeps_raw_body_when_not_json() {
        match parse_error(502, "<html>bad gateway</html>".to_string()) {
            LlmError::Api { code, message, .. } => {
                assert!(code.is_none());
                assert_eq!(message, "<html>bad gateway</html>");
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn test_insufficient_quota_is_rate_limited() {
        let body = r#"{"error": {"message": "You exceeded your current quota, please check your plan and billing details.", "type": "insufficient_quota", "code": "insufficient_quota"}}"#;
        let err = backend().classify_failure(parse_error(429, body.to_string()));
        match err {
            AppError::RateLimited { detail, .. } => {
                assert!(detail.contains("exceeded your current quota"))
            }
            other => panic!("expected RateLimited, got {other:?}"),
        }
    }

    #[test]
    fn test_model_not_found_is_model_unavailable() {
        let body = r#"{"error": {"message": "The model `gpt-9` does not exist or you do not have access to it.", "type": "invalid_request_error", "code": "model_not_found"}}"#;
        let err = backend().classify_failure(parse_error(404, body.to_string()));
        assert_eq!(err.kind(), ErrorKind::ModelUnavailable);
    }

    #[test]
    fn test_server_error_is_upstream() {
        let body = r#"{"error": {"message": "The server had an error while processing your request.", "type": "server_error", "code": null}}"#;
        let err = backend().classify_failure(parse_error(500, body.to_string()));
        assert_eq!(err.kind(), ErrorKind::UpstreamError);
    }

    #[test]
    fn test_response_envelope_extracts_first_choice() {
        let body = r#"{"choices": [{"message": {"role": "assistant", "content": "{\"a\":1}"}}], "usage": {"prompt_tokens": 10, "completion_tokens": 3}}"#;
        let parsed: ChatResponse = serde_json::from_str(body).unwrap();
        assert_eq!(parsed.choices[0].message.content.as_deref(), Some("{\"a\":1}"));
    }
}
