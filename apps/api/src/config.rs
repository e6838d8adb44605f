use std::time::Duration;

use anyhow::{Context, Result};

use crate::llm_client::ProviderKind;

const DEFAULT_PORT: u16 = 8080;
const DEFAULT_LLM_TIMEOUT_SECS: u64 = 60;
const DEFAULT_MAX_UPLOAD_BYTES: usize = 10 * 1024 * 1024;

/// Application configuration loaded from environment variables.
///
/// Provider credentials are not part of `Config`: they are looked up per request
/// by `EnvBackendFactory` so a missing key surfaces as a `ConfigurationError`
/// on the call that needs it instead of failing startup.
#[derive(Debug, Clone)]
pub struct Config {
    pub port: u16,
    pub rust_log: String,
    pub llm: LlmSettings,
    pub max_upload_bytes: usize,
}

/// Backend selection knobs shared by every request.
#[derive(Debug, Clone, Default)]
pub struct LlmSettings {
    /// Pinned provider. `None` means auto-select from whichever credential is set.
    pub provider: Option<ProviderKind>,
    /// Overrides the provider's default model.
    pub model: Option<String>,
    pub timeout: Duration,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing

        let provider = optional_env("LLM_PROVIDER")
            .map(|raw| {
                raw.parse::<ProviderKind>()
                    .with_context(|| format!("LLM_PROVIDER has unsupported value '{raw}'"))
            })
            .transpose()?;

        Ok(Config {
            port: parse_env("PORT", DEFAULT_PORT)?,
            rust_log: std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string()),
            llm: LlmSettings {
                provider,
                model: optional_env("LLM_MODEL"),
                timeout: Duration::from_secs(parse_env(
                    "LLM_TIMEOUT_SECS",
                    DEFAULT_LLM_TIMEOUT_SECS,
                )?),
            },
            max_upload_bytes: parse_env("MAX_UPLOAD_BYTES", DEFAULT_MAX_UPLOAD_BYTES)?,
        })
    }
}

fn optional_env(key: &str) -> Option<String> {
    std::env::var(key)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn parse_env<T>(key: &str, default: T) -> Result<T>
where
    T: std::str::FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match optional_env(key) {
        Some(raw) => raw
            .parse::<T>()
            .with_context(|| format!("Environment variable '{key}' has invalid value '{raw}'")),
        None => Ok(default),
    }
}
