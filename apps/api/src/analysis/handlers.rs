//! Axum route handlers for the Analysis API.

use axum::{
    extract::{Multipart, State},
    Json,
};
use bytes::Bytes;
use serde::Deserialize;
use tracing::{info, info_span, Instrument};
use uuid::Uuid;

use crate::analysis::extraction::extract_structured_resume;
use crate::analysis::formatter::format_for_analysis;
use crate::analysis::matcher::analyze_match;
use crate::analysis::models::{MatchAnalysis, ModelOutput, StructuredResume};
use crate::document::extract_text;
use crate::errors::AppError;
use crate::state::AppState;

// ────────────────────────────────────────────────────────────────────────────
// Request types
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct MatchRequest {
    #[serde(default)]
    pub resume_text: String,
    #[serde(default)]
    pub job_description: String,
}

/// Multipart form fields accepted by the upload endpoints.
#[derive(Debug, Default)]
struct UploadForm {
    resume: Option<UploadedFile>,
    job_description: Option<String>,
}

#[derive(Debug)]
struct UploadedFile {
    bytes: Bytes,
    file_name: Option<String>,
    content_type: Option<String>,
}

// ────────────────────────────────────────────────────────────────────────────
// Handlers
// ────────────────────────────────────────────────────────────────────────────

/// POST /api/v1/analyze
///
/// Full pipeline: document text → structured resume → formatted text → match analysis.
/// Multipart fields: `resume` (file), `job_description` (text).
pub async fn handle_analyze(
    State(state): State<AppState>,
    multipart: Multipart,
) -> Result<Json<MatchAnalysis>, AppError> {
    let request_id = Uuid::new_v4();
    let analysis = run_analysis(&state, multipart)
        .instrument(info_span!("analyze", %request_id))
        .await?;
    Ok(Json(analysis))
}

/// POST /api/v1/resume/parse
///
/// Returns the structured resume extracted from an uploaded document.
/// Multipart field: `resume` (file).
pub async fn handle_parse_resume(
    State(state): State<AppState>,
    multipart: Multipart,
) -> Result<Json<StructuredResume>, AppError> {
    let request_id = Uuid::new_v4();
    let resume = run_parse(&state, multipart)
        .instrument(info_span!("parse_resume", %request_id))
        .await?;
    Ok(Json(resume))
}

/// POST /api/v1/match
///
/// Compares already-extracted resume text with a job description.
pub async fn handle_match(
    State(state): State<AppState>,
    Json(request): Json<MatchRequest>,
) -> Result<Json<MatchAnalysis>, AppError> {
    let request_id = Uuid::new_v4();
    let analysis = analyze_match(
        &request.resume_text,
        &request.job_description,
        state.backends.as_ref(),
        &state.stage_options(),
    )
    .instrument(info_span!("match", %request_id))
    .await?;
    Ok(Json(analysis))
}

// ────────────────────────────────────────────────────────────────────────────
// Orchestration
// ────────────────────────────────────────────────────────────────────────────

async fn run_analysis(state: &AppState, multipart: Multipart) -> Result<MatchAnalysis, AppError> {
    let form = read_upload_form(multipart).await?;

    // Checked before any extraction work so a bad request never reaches a provider.
    let job_description = form
        .job_description
        .filter(|jd| !jd.trim().is_empty())
        .ok_or_else(|| {
            AppError::InvalidInput("job_description is required and cannot be empty".to_string())
        })?;
    let file = form
        .resume
        .ok_or_else(|| AppError::InvalidInput("resume file is required".to_string()))?;

    let raw_text = extract_upload_text(file).await?;

    let options = state.stage_options();
    let resume = extract_structured_resume(&raw_text, state.backends.as_ref(), &options).await?;
    let resume_text = format_for_analysis(&resume);
    // The caller supplied readable text; an empty record is the model's failure.
    if resume_text.is_empty() {
        return Err(AppError::SchemaViolation(format!(
            "{}: extraction produced no skills, experience or education",
            StructuredResume::NAME
        )));
    }

    analyze_match(
        &resume_text,
        &job_description,
        state.backends.as_ref(),
        &options,
    )
    .await
}

async fn run_parse(state: &AppState, multipart: Multipart) -> Result<StructuredResume, AppError> {
    let file = read_upload_form(multipart)
        .await?
        .resume
        .ok_or_else(|| AppError::InvalidInput("resume file is required".to_string()))?;

    let raw_text = extract_upload_text(file).await?;

    extract_structured_resume(&raw_text, state.backends.as_ref(), &state.stage_options()).await
}

async fn extract_upload_text(file: UploadedFile) -> Result<String, AppError> {
    let text = extract_text(
        file.bytes,
        file.file_name.as_deref(),
        file.content_type.as_deref(),
    )
    .await?;
    info!(
        "Extracted {} characters of resume text from {}",
        text.len(),
        file.file_name.as_deref().unwrap_or("upload")
    );
    Ok(text)
}

async fn read_upload_form(mut multipart: Multipart) -> Result<UploadForm, AppError> {
    let mut form = UploadForm::default();

    while let Some(field) = multipart.next_field().await.map_err(multipart_error)? {
        let name = field.name().map(str::to_string);
        match name.as_deref() {
            Some("resume") => {
                let file_name = field.file_name().map(str::to_string);
                let content_type = field.content_type().map(str::to_string);
                let bytes = field.bytes().await.map_err(multipart_error)?;
                form.resume = Some(UploadedFile {
                    bytes,
                    file_name,
                    content_type,
                });
            }
            Some("job_description") => {
                form.job_description = Some(field.text().await.map_err(multipart_error)?);
            }
            _ => {}
        }
    }

    Ok(form)
}

fn multipart_error(e: axum::extract::multipart::MultipartError) -> AppError {
    AppError::InvalidInput(format!("Malformed multipart upload: {e}"))
}
