//! Shared submit → decode → validate path for both stages.
//!
//! One backend per call, one submission, no retries. Provider failures are
//! classified by the adapter before they leave this module.

use std::time::Duration;

use serde_json::Value;
use tracing::{debug, warn};

use crate::analysis::models::ModelOutput;
use crate::errors::AppError;
use crate::llm_client::{strip_json_fences, BackendFactory, CallOptions};

const DEFAULT_STAGE_TIMEOUT: Duration = Duration::from_secs(60);

/// Per-call limits applied at the stage boundary.
#[derive(Debug, Clone, Copy)]
pub struct StageOptions {
    /// Upper bound on the provider round trip.
    pub timeout: Duration,
}

impl Default for StageOptions {
    fn default() -> Self {
        Self {
            timeout: DEFAULT_STAGE_TIMEOUT,
        }
    }
}

/// Builds a backend, submits once, and decodes the payload as `T`.
pub async fn invoke<T: ModelOutput>(
    factory: &dyn BackendFactory,
    system: &str,
    user: &str,
    call: CallOptions,
    stage: &StageOptions,
) -> Result<T, AppError> {
    let backend = factory.create()?;
    let provider = backend.provider();

    debug!(
        "Submitting {} request to {} (model: {}, temperature: {})",
        T::NAME,
        provider,
        backend.model(),
        call.temperature
    );

    let raw = match tokio::time::timeout(stage.timeout, backend.submit(system, user, &call)).await
    {
        Ok(Ok(raw)) => raw,
        Ok(Err(e)) => {
            warn!("{provider} call for {} failed: {e}", T::NAME);
            return Err(backend.classify_failure(e));
        }
        Err(_) => {
            warn!(
                "{provider} call for {} timed out after {}s",
                T::NAME,
                stage.timeout.as_secs()
            );
            return Err(AppError::Upstream {
                status: None,
                message: format!(
                    "{provider} did not respond within {} seconds",
                    stage.timeout.as_secs()
                ),
            });
        }
    };

    parse_model_output(&raw)
}

/// Strips code fences, decodes JSON, and checks it against `T`'s schema.
///
/// Undecodable text is a `MalformedResponse`; JSON of the wrong shape or
/// failing `validate` is a `SchemaViolation`.
pub fn parse_model_output<T: ModelOutput>(raw: &str) -> Result<T, AppError> {
    let candidate = strip_json_fences(raw);

    let value: Value = serde_json::from_str(candidate).map_err(|e| {
        AppError::MalformedResponse(format!("{} response is not valid JSON: {e}", T::NAME))
    })?;

    let record: T = serde_json::from_value(value).map_err(|e| {
        AppError::SchemaViolation(format!("{} does not match the expected schema: {e}", T::NAME))
    })?;

    record
        .validate()
        .map_err(|e| AppError::SchemaViolation(format!("{}: {e}", T::NAME)))?;

    Ok(record)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::models::{MatchAnalysis, StructuredResume};
    use crate::errors::ErrorKind;
    use crate::llm_client::testing::{Script, ScriptedFactory};

    const RESUME_JSON: &str = r#"{"skills": ["Rust"], "experience": [], "education": [], "contact": "a@b.c"}"#;

    #[test]
    fn test_fenced_and_bare_payloads_decode_equal() {
        let bare: StructuredResume = parse_model_output(RESUME_JSON).unwrap();
        let fenced: StructuredResume =
            parse_model_output(&format!("```json\n{RESUME_JSON}\n```")).unwrap();
        let plain_fence: StructuredResume =
            parse_model_output(&format!("```\n{RESUME_JSON}\n```")).unwrap();
        assert_eq!(bare, fenced);
        assert_eq!(bare, plain_fence);
    }

    #[test]
    fn test_prose_is_malformed_with_decode_reason() {
        let err = parse_model_output::<MatchAnalysis>("Sure! The candidate is a great fit.")
            .unwrap_err();
        match err {
            AppError::MalformedResponse(msg) => {
                assert!(msg.contains("not valid JSON"));
                assert!(msg.contains("expected value"));
            }
            other => panic!("expected MalformedResponse, got {other:?}"),
        }
    }

    #[test]
    fn test_empty_payload_is_malformed() {
        let err = parse_model_output::<StructuredResume>("```json\n```").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::MalformedResponse);
    }

    #[test]
    fn test_wrong_shape_is_schema_violation() {
        let err = parse_model_output::<StructuredResume>(r#"{"skills": {"a": 1}}"#).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::SchemaViolation);
    }

    #[test]
    fn test_out_of_range_percentage_is_schema_violation() {
        let raw = r#"{"matchPercentage": 140, "matchedSkills": [], "missingSkills": [], "suggestions": []}"#;
        match parse_model_output::<MatchAnalysis>(raw).unwrap_err() {
            AppError::SchemaViolation(msg) => assert!(msg.contains("140")),
            other => panic!("expected SchemaViolation, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_invoke_passes_call_options_through() {
        let factory = ScriptedFactory::replying(RESUME_JSON);
        let resume: StructuredResume = invoke(
            &factory,
            "sys",
            "usr",
            CallOptions::json(0.2),
            &StageOptions::default(),
        )
        .await
        .unwrap();
        assert_eq!(resume.skills, vec!["Rust"]);

        let calls = factory.calls();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].system, "sys");
        assert_eq!(calls[0].user, "usr");
        assert!(calls[0].options.json_mode);
    }

    #[tokio::test(start_paused = true)]
    async fn test_invoke_times_out_as_upstream_error() {
        let factory = ScriptedFactory::new(vec![Script::Hang]);
        let stage = StageOptions {
            timeout: Duration::from_secs(5),
        };
        let err = invoke::<StructuredResume>(&factory, "s", "u", CallOptions::json(0.2), &stage)
            .await
            .unwrap_err();
        match err {
            AppError::Upstream { status, message } => {
                assert!(status.is_none());
                assert!(message.contains("5 seconds"));
            }
            other => panic!("expected Upstream, got {other:?}"),
        }
    }
}
