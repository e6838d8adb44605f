use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

/// Stable error categories surfaced to callers. Every `AppError` maps to exactly one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    InvalidInput,
    ConfigurationError,
    AuthenticationError,
    RateLimited,
    ModelUnavailable,
    MalformedResponse,
    SchemaViolation,
    UpstreamError,
    DocumentError,
    InternalError,
}

impl ErrorKind {
    pub fn code(self) -> &'static str {
        match self {
            ErrorKind::InvalidInput => "INVALID_INPUT",
            ErrorKind::ConfigurationError => "CONFIGURATION_ERROR",
            ErrorKind::AuthenticationError => "AUTHENTICATION_ERROR",
            ErrorKind::RateLimited => "RATE_LIMITED",
            ErrorKind::ModelUnavailable => "MODEL_UNAVAILABLE",
            ErrorKind::MalformedResponse => "MALFORMED_RESPONSE",
            ErrorKind::SchemaViolation => "SCHEMA_VIOLATION",
            ErrorKind::UpstreamError => "UPSTREAM_ERROR",
            ErrorKind::DocumentError => "DOCUMENT_ERROR",
            ErrorKind::InternalError => "INTERNAL_ERROR",
        }
    }

    fn status(self) -> StatusCode {
        match self {
            ErrorKind::InvalidInput => StatusCode::BAD_REQUEST,
            ErrorKind::DocumentError => StatusCode::UNPROCESSABLE_ENTITY,
            ErrorKind::RateLimited => StatusCode::TOO_MANY_REQUESTS,
            ErrorKind::ConfigurationError => StatusCode::SERVICE_UNAVAILABLE,
            ErrorKind::AuthenticationError
            | ErrorKind::ModelUnavailable
            | ErrorKind::MalformedResponse
            | ErrorKind::SchemaViolation
            | ErrorKind::UpstreamError => StatusCode::BAD_GATEWAY,
            ErrorKind::InternalError => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

/// Application-level error type.
/// Implements `IntoResponse` so Axum handlers can return `Result<T, AppError>`.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Authentication failed: {0}")]
    Authentication(String),

    #[error("Rate limited: {message}")]
    RateLimited { message: String, detail: String },

    #[error("Model unavailable: {message}")]
    ModelUnavailable {
        message: String,
        alternatives: Vec<String>,
    },

    #[error("Malformed model response: {0}")]
    MalformedResponse(String),

    #[error("Schema violation: {0}")]
    SchemaViolation(String),

    #[error("Upstream error{}: {message}", .status.map(|s| format!(" (status {s})")).unwrap_or_default())]
    Upstream { status: Option<u16>, message: String },

    #[error("Document error: {0}")]
    Document(String),

    #[error("Internal server error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl AppError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            AppError::InvalidInput(_) => ErrorKind::InvalidInput,
            AppError::Configuration(_) => ErrorKind::ConfigurationError,
            AppError::Authentication(_) => ErrorKind::AuthenticationError,
            AppError::RateLimited { .. } => ErrorKind::RateLimited,
            AppError::ModelUnavailable { .. } => ErrorKind::ModelUnavailable,
            AppError::MalformedResponse(_) => ErrorKind::MalformedResponse,
            AppError::SchemaViolation(_) => ErrorKind::SchemaViolation,
            AppError::Upstream { .. } => ErrorKind::UpstreamError,
            AppError::Document(_) => ErrorKind::DocumentError,
            AppError::Internal(_) => ErrorKind::InternalError,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let kind = self.kind();

        let mut error = json!({
            "code": kind.code(),
            "message": self.to_string(),
        });

        match &self {
            AppError::RateLimited { detail, .. } => {
                tracing::warn!("Provider rate limit: {detail}");
                error["detail"] = json!(detail);
            }
            AppError::ModelUnavailable { alternatives, .. } => {
                error["alternatives"] = json!(alternatives);
            }
            AppError::Upstream { status, message } => {
                tracing::error!("Upstream error (status {status:?}): {message}");
                error["detail"] = json!(message);
            }
            AppError::Configuration(msg) | AppError::Authentication(msg) => {
                tracing::error!("LLM backend misconfigured: {msg}");
            }
            AppError::MalformedResponse(msg) | AppError::SchemaViolation(msg) => {
                tracing::warn!("Model output rejected: {msg}");
            }
            AppError::Internal(e) => {
                tracing::error!("Internal error: {e:?}");
                error["message"] = json!("An internal server error occurred");
            }
            AppError::InvalidInput(_) | AppError::Document(_) => {}
        }

        (kind.status(), Json(json!({ "error": error }))).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_codes_are_screaming_snake() {
        let err = AppError::RateLimited {
            message: "slow down".to_string(),
            detail: "quota".to_string(),
        };
        assert_eq!(err.kind(), ErrorKind::RateLimited);
        assert_eq!(err.kind().code(), "RATE_LIMITED");
        assert_eq!(ErrorKind::SchemaViolation.code(), "SCHEMA_VIOLATION");
    }

    #[tokio::test]
    async fn test_envelope_code_comes_from_kind() {
        let response = AppError::ModelUnavailable {
            message: "gone".to_string(),
            alternatives: vec!["gpt-4o".to_string()],
        }
        .into_response();
        assert_eq!(response.status(), StatusCode::BAD_GATEWAY);

        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let value: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(value["error"]["code"], "MODEL_UNAVAILABLE");
        assert_eq!(value["error"]["alternatives"][0], "gpt-4o");
    }

    #[test]
    fn test_upstream_display_includes_status_when_known() {
        let err = AppError::Upstream {
            status: Some(503),
            message: "overloaded".to_string(),
        };
        assert_eq!(err.to_string(), "Upstream error (status 503): overloaded");

        let err = AppError::Upstream {
            status: None,
            message: "connection reset".to_string(),
        };
        assert_eq!(err.to_string(), "Upstream error: connection reset");
    }

    #[test]
    fn test_status_mapping() {
        assert_eq!(
            AppError::InvalidInput("x".into()).into_response().status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            AppError::Configuration("x".into()).into_response().status(),
            StatusCode::SERVICE_UNAVAILABLE
        );
        assert_eq!(
            AppError::SchemaViolation("x".into())
                .into_response()
                .status(),
            StatusCode::BAD_GATEWAY
        );
        assert_eq!(
            AppError::Document("x".into()).into_response().status(),
            StatusCode::UNPROCESSABLE_ENTITY
        );
    }
}
