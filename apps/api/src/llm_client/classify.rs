//! Failure classification shared by every adapter.
//!
//! Providers disagree on where they put the useful signal: OpenAI sets a
//! `code`, Gemini a gRPC-style `status`, Anthropic an error `type`, and some
//! failures only say what happened in the message text. Each adapter supplies
//! a table for its own codes; the HTTP status and message text are checked
//! here for everyone.

use super::{LlmError, ProviderKind};
use crate::errors::AppError;

/// Category of a provider failure before it becomes an `AppError`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureClass {
    Authentication,
    RateLimited,
    ModelUnavailable,
    Upstream,
}

const AUTH_MARKERS: &[&str] = &[
    "api key",
    "api_key",
    "apikey",
    "x-api-key",
    "unauthorized",
    "unauthenticated",
    "authentication",
    "credential",
    "permission denied",
];

const RATE_LIMIT_MARKERS: &[&str] = &[
    "quota",
    "rate limit",
    "rate_limit",
    "ratelimit",
    "too many requests",
    "resource_exhausted",
    "exceeded",
];

const MODEL_MISSING_MARKERS: &[&str] = &[
    "not found",
    "not_found",
    "does not exist",
    "not supported",
    "unsupported",
    "not available",
    "unavailable",
    "no longer available",
    "decommissioned",
];

/// Maps a provider-specific error code to a class, if the code is meaningful.
pub type CodeTable = fn(&str) -> Option<FailureClass>;

/// Classifies an HTTP status. 404 only counts as a missing model when the
/// message actually talks about a model.
pub fn class_from_status(status: u16, message: &str) -> Option<FailureClass> {
    match status {
        401 | 403 => Some(FailureClass::Authentication),
        429 => Some(FailureClass::RateLimited),
        404 if mentions_model(&message.to_lowercase()) => Some(FailureClass::ModelUnavailable),
        _ => None,
    }
}

/// Fallback classification from free text.
pub fn class_from_message(message: &str) -> FailureClass {
    let lower = message.to_lowercase();

    if AUTH_MARKERS.iter().any(|m| lower.contains(m)) {
        FailureClass::Authentication
    } else if RATE_LIMIT_MARKERS.iter().any(|m| lower.contains(m)) {
        FailureClass::RateLimited
    } else if mentions_model(&lower) && MODEL_MISSING_MARKERS.iter().any(|m| lower.contains(m)) {
        FailureClass::ModelUnavailable
    } else {
        FailureClass::Upstream
    }
}

fn mentions_model(lower: &str) -> bool {
    lower.contains("model")
}

/// Full classification of a raw adapter failure.
///
/// Order: provider code, then HTTP status, then message text.
pub fn classify(provider: ProviderKind, model: &str, err: LlmError, codes: CodeTable) -> AppError {
    match err {
        LlmError::Api {
            status,
            code,
            message,
        } => {
            let class = code
                .as_deref()
                .and_then(codes)
                .or_else(|| class_from_status(status, &message))
                .unwrap_or_else(|| class_from_message(&message));
            to_app_error(class, provider, model, Some(status), message)
        }
        LlmError::Http(e) if e.is_timeout() => AppError::Upstream {
            status: None,
            message: format!("{provider} request timed out: {e}"),
        },
        LlmError::Http(e) => {
            let status = e.status().map(|s| s.as_u16());
            let message = format!("{provider} request failed: {e}");
            match status.and_then(|s| class_from_status(s, &message)) {
                Some(class) => to_app_error(class, provider, model, status, message),
                None => AppError::Upstream { status, message },
            }
        }
        LlmError::Envelope(e) => AppError::Upstream {
            status: None,
            message: format!("{provider} returned an unexpected response body: {e}"),
        },
        LlmError::EmptyContent => AppError::MalformedResponse(format!(
            "{provider} returned no text content (the response may have been blocked or truncated)"
        )),
    }
}

/// Dresses a class up as the caller-facing error, adding remediation text.
pub fn to_app_error(
    class: FailureClass,
    provider: ProviderKind,
    model: &str,
    status: Option<u16>,
    message: String,
) -> AppError {
    match class {
        FailureClass::Authentication => AppError::Authentication(format!(
            "{provider} rejected the configured API key ({message}). \
             Check that {} holds a valid, active key for this account.",
            provider.credential_var()
        )),
        FailureClass::RateLimited => AppError::RateLimited {
            message: format!(
                "{provider} rate limit or quota exceeded. \
                 Wait a minute before trying again, or upgrade your {provider} plan or billing quota."
            ),
            detail: message,
        },
        FailureClass::ModelUnavailable => {
            let alternatives = provider.alternatives_to(model);
            AppError::ModelUnavailable {
                message: format!(
                    "Model '{model}' is not available for this {provider} account or region. \
                     Set LLM_MODEL to one of: {}.",
                    alternatives.join(", ")
                ),
                alternatives,
            }
        }
        FailureClass::Upstream => AppError::Upstream { status, message },
    }
}
