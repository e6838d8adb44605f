//! Match Analysis: resume text + job description → `MatchAnalysis`.

use tracing::info;

use crate::analysis::models::MatchAnalysis;
use crate::analysis::pipeline::{invoke, StageOptions};
use crate::analysis::prompts::{match_analysis_prompt, MATCH_ANALYSIS_SYSTEM};
use crate::errors::AppError;
use crate::llm_client::{BackendFactory, CallOptions};

pub const ANALYSIS_TEMPERATURE: f32 = 0.3;

/// Scores how well `resume_text` fits `job_description`.
///
/// The validated record is returned as-is; nothing is defaulted or clamped.
pub async fn analyze_match(
    resume_text: &str,
    job_description: &str,
    factory: &dyn BackendFactory,
    options: &StageOptions,
) -> Result<MatchAnalysis, AppError> {
    if resume_text.trim().is_empty() {
        return Err(AppError::InvalidInput(
            "Resume text is empty. Provide the resume content to analyze.".to_string(),
        ));
    }
    if job_description.trim().is_empty() {
        return Err(AppError::InvalidInput(
            "Job description is empty. Paste the job description to compare against.".to_string(),
        ));
    }

    let analysis: MatchAnalysis = invoke(
        factory,
        MATCH_ANALYSIS_SYSTEM,
        &match_analysis_prompt(resume_text, job_description),
        CallOptions::json(ANALYSIS_TEMPERATURE),
        options,
    )
    .await?;

    info!(
        "Match analysis complete: {}% ({} matched, {} missing, {} suggestions)",
        analysis.match_percentage,
        analysis.matched_skills.len(),
        analysis.missing_skills.len(),
        analysis.suggestions.len()
    );

    Ok(analysis)
}
