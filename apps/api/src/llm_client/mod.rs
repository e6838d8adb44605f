//! LLM Client: the single point of entry for every language-model call.
//!
//! ARCHITECTURAL RULE: stages never talk to a provider directly. They ask a
//! `BackendFactory` for a `LlmBackend`, call `submit`, and hand any failure to
//! `classify_failure` so provider-specific error shapes stop at this module.
use std::fmt;
use std::str::FromStr;

use async_trait::async_trait;
use reqwest::Client;
use thiserror::Error;
use tracing::debug;

use crate::config::LlmSettings;
use crate::errors::AppError;

pub mod anthropic;
pub mod classify;
pub mod gemini;
pub mod openai;
pub mod prompts;
#[cfg(test)]
pub mod testing;

pub use anthropic::AnthropicBackend;
pub use gemini::GeminiBackend;
pub use openai::OpenAiBackend;

const MAX_TOKENS: u32 = 4096;

/// Raw provider failure. Only ever seen inside adapters and `classify_failure`.
#[derive(Debug, Error)]
pub enum LlmError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("API error (status {status}): {message}")]
    Api {
        status: u16,
        /// Provider error code or type, e.g. `insufficient_quota`, `RESOURCE_EXHAUSTED`.
        code: Option<String>,
        message: String,
    },

    #[error("Unexpected response envelope: {0}")]
    Envelope(#[from] serde_json::Error),

    #[error("LLM returned empty content")]
    EmptyContent,
}

/// Per-call generation knobs.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CallOptions {
    pub temperature: f32,
    /// Ask for the provider's constrained-JSON output mode where it has one.
    pub json_mode: bool,
    pub max_tokens: u32,
}

impl CallOptions {
    pub fn json(temperature: f32) -> Self {
        Self {
            temperature,
            json_mode: true,
            max_tokens: MAX_TOKENS,
        }
    }
}

/// The interchangeable language-model providers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProviderKind {
    OpenAi,
    Gemini,
    Anthropic,
}

impl ProviderKind {
    /// Auto-selection order when `LLM_PROVIDER` is not pinned.
    pub const ALL: [ProviderKind; 3] = [
        ProviderKind::OpenAi,
        ProviderKind::Gemini,
        ProviderKind::Anthropic,
    ];

    pub fn credential_var(self) -> &'static str {
        match self {
            ProviderKind::OpenAi => "OPENAI_API_KEY",
            ProviderKind::Gemini => "GEMINI_API_KEY",
            ProviderKind::Anthropic => "ANTHROPIC_API_KEY",
        }
    }

    pub fn default_model(self) -> &'static str {
        self.known_models()[0]
    }

    /// Models known to be served by the provider, default first.
    pub fn known_models(self) -> &'static [&'static str] {
        match self {
            ProviderKind::OpenAi => &["gpt-4o-mini", "gpt-4o", "gpt-4-turbo", "gpt-3.5-turbo"],
            ProviderKind::Gemini => &[
                "gemini-1.5-flash",
                "gemini-1.5-pro",
                "gemini-2.0-flash",
                "gemini-pro",
            ],
            ProviderKind::Anthropic => &[
                "claude-sonnet-4-5",
                "claude-3-5-haiku-latest",
                "claude-3-5-sonnet-latest",
            ],
        }
    }

    /// Known models other than `current`, offered when `current` is unavailable.
    pub fn alternatives_to(self, current: &str) -> Vec<String> {
        self.known_models()
            .iter()
            .filter(|m| **m != current)
            .map(|m| m.to_string())
            .collect()
    }
}

impl fmt::Display for ProviderKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ProviderKind::OpenAi => "OpenAI",
            ProviderKind::Gemini => "Gemini",
            ProviderKind::Anthropic => "Anthropic",
        })
    }
}

impl FromStr for ProviderKind {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "openai" => Ok(ProviderKind::OpenAi),
            "gemini" | "google" => Ok(ProviderKind::Gemini),
            "anthropic" | "claude" => Ok(ProviderKind::Anthropic),
            other => Err(AppError::Configuration(format!(
                "Unknown LLM provider '{other}'. Expected one of: openai, gemini, anthropic"
            ))),
        }
    }
}

/// A language-model provider able to run one system + user exchange.
///
/// Implementations hold no mutable state; one instance is built per request.
#[async_trait]
pub trait LlmBackend: Send + Sync {
    fn provider(&self) -> ProviderKind;

    fn model(&self) -> &str;

    /// Sends the instruction pair and returns the raw textual payload.
    async fn submit(
        &self,
        system: &str,
        user: &str,
        options: &CallOptions,
    ) -> Result<String, LlmError>;

    /// Normalizes a provider failure into the shared error taxonomy.
    fn classify_failure(&self, err: LlmError) -> AppError;
}

/// Builds a backend for a single request.
///
/// Carried in `AppState` as `Arc<dyn BackendFactory>` so tests can swap in a
/// scripted provider.
pub trait BackendFactory: Send + Sync {
    fn create(&self) -> Result<Box<dyn LlmBackend>, AppError>;
}

/// Resolves the provider from settings plus whichever credential is present in
/// the process environment at call time.
pub struct EnvBackendFactory {
    settings: LlmSettings,
    http: Client,
}

impl EnvBackendFactory {
    pub fn new(settings: LlmSettings, http: Client) -> Self {
        Self { settings, http }
    }

    fn resolve<F>(&self, lookup: F) -> Result<(ProviderKind, String), AppError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let credential = |kind: ProviderKind| {
            lookup(kind.credential_var())
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };

        if let Some(kind) = self.settings.provider {
            return credential(kind).map(|key| (kind, key)).ok_or_else(|| {
                AppError::Configuration(format!(
                    "LLM_PROVIDER is set to {kind} but {} is not set. Add your {kind} API key to the environment or .env file.",
                    kind.credential_var()
                ))
            });
        }

        ProviderKind::ALL
            .into_iter()
            .find_map(|kind| credential(kind).map(|key| (kind, key)))
            .ok_or_else(|| {
                let vars: Vec<&str> = ProviderKind::ALL
                    .iter()
                    .map(|k| k.credential_var())
                    .collect();
                AppError::Configuration(format!(
                    "No LLM API key configured. Set one of {} in the environment or .env file.",
                    vars.join(", ")
                ))
            })
    }

    fn build(&self, kind: ProviderKind, api_key: String) -> Box<dyn LlmBackend> {
        let model = self
            .settings
            .model
            .clone()
            .unwrap_or_else(|| kind.default_model().to_string());
        let http = self.http.clone();

        match kind {
            ProviderKind::OpenAi => Box::new(OpenAiBackend::new(http, api_key, model)),
            ProviderKind::Gemini => Box::new(GeminiBackend::new(http, api_key, model)),
            ProviderKind::Anthropic => Box::new(AnthropicBackend::new(http, api_key, model)),
        }
    }
}

impl BackendFactory for EnvBackendFactory {
    fn create(&self) -> Result<Box<dyn LlmBackend>, AppError> {
        let (kind, api_key) = self.resolve(|var| std::env::var(var).ok())?;
        let backend = self.build(kind, api_key);
        debug!("Using {} backend (model: {})", kind, backend.model());
        Ok(backend)
    }
}

/// Strips ```json ... ``` or ``` ... ``` code fences from LLM output.
///
/// Any language tag on an opening fence is dropped. Stray, dangling, or doubled
/// fences are removed until none remain at either end, so the result is a fixed
/// point: applying this twice gives the same result as applying it once.
pub fn strip_json_fences(text: &str) -> &str {
    let mut current = text.trim();
    loop {
        let next = strip_outer_fence(current);
        if next.len() == current.len() {
            return current;
        }
        current = next;
    }
}

/// One pass: drop a leading fence (with its tag) and a trailing fence.
/// Input and output are both trimmed.
fn strip_outer_fence(text: &str) -> &str {
    let text = match text.strip_prefix("```") {
        Some(rest) => rest
            .trim_start_matches(|c: char| c.is_ascii_alphanumeric() || c == '-' || c == '_')
            .trim_start(),
        None => text,
    };
    text.strip_suffix("```").map(str::trim_end).unwrap_or(text)
}
