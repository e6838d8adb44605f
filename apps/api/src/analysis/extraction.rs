//! Structured Extraction: raw resume text → `StructuredResume`.

use tracing::info;

use crate::analysis::models::StructuredResume;
use crate::analysis::pipeline::{invoke, StageOptions};
use crate::analysis::prompts::{resume_extraction_prompt, RESUME_EXTRACTION_SYSTEM};
use crate::errors::AppError;
use crate::llm_client::{BackendFactory, CallOptions};

/// Low randomness: extraction should be repeatable for the same text.
pub const EXTRACTION_TEMPERATURE: f32 = 0.2;

/// Extracts skills, experience, education, and contact details from resume text.
///
/// Empty text fails with `InvalidInput` before a backend is built; a missing
/// credential fails with `ConfigurationError` before any network call.
pub async fn extract_structured_resume(
    raw_text: &str,
    factory: &dyn BackendFactory,
    options: &StageOptions,
) -> Result<StructuredResume, AppError> {
    if raw_text.trim().is_empty() {
        return Err(AppError::InvalidInput(
            "Resume text is empty. Upload a resume that contains readable text.".to_string(),
        ));
    }

    let resume: StructuredResume = invoke(
        factory,
        RESUME_EXTRACTION_SYSTEM,
        &resume_extraction_prompt(raw_text),
        CallOptions::json(EXTRACTION_TEMPERATURE),
        options,
    )
    .await?;

    info!(
        "Resume extracted: {} skills, {} experience entries, {} education entries",
        resume.skills.len(),
        resume.experience.len(),
        resume.education.len()
    );

    Ok(resume)
}
