//! Document text extraction for uploaded resumes.
//!
//! PDF text goes through `pdf-extract` on a blocking thread; plain text and
//! markdown are decoded as UTF-8. A successful extraction never returns an
//! empty string.

use bytes::Bytes;
use tracing::debug;

use crate::errors::AppError;

const PDF_MAGIC: &[u8] = b"%PDF-";
const UTF8_BOM: char = '\u{feff}';

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum DocumentFormat {
    Pdf,
    PlainText,
}

/// Extracts plain text from an uploaded document.
///
/// `file_name` and `content_type` are hints; PDF content is also recognized
/// by its magic bytes.
pub async fn extract_text(
    bytes: Bytes,
    file_name: Option<&str>,
    content_type: Option<&str>,
) -> Result<String, AppError> {
    if bytes.is_empty() {
        return Err(AppError::Document("The uploaded file is empty.".to_string()));
    }

    let format = detect_format(&bytes, file_name, content_type).ok_or_else(|| {
        AppError::Document(format!(
            "Unsupported document format{}. Upload a PDF or plain-text resume.",
            file_name.map(|n| format!(" for '{n}'")).unwrap_or_default()
        ))
    })?;

    debug!("Extracting text from {:?} upload ({} bytes)", format, bytes.len());

    let text = match format {
        DocumentFormat::Pdf => extract_pdf_text(bytes).await?,
        DocumentFormat::PlainText => decode_plain_text(&bytes)?,
    };

    let text = text.trim();
    if text.is_empty() {
        return Err(AppError::Document(
            "No extractable text found in the document. Scanned or image-only files are not supported."
                .to_string(),
        ));
    }

    Ok(text.to_string())
}

fn detect_format(
    bytes: &[u8],
    file_name: Option<&str>,
    content_type: Option<&str>,
) -> Option<DocumentFormat> {
    if bytes.starts_with(PDF_MAGIC) {
        return Some(DocumentFormat::Pdf);
    }

    let extension = file_name
        .and_then(|n| n.rsplit_once('.'))
        .map(|(_, ext)| ext.to_ascii_lowercase());
    let mime = content_type
        .map(|c| c.split(';').next().unwrap_or(c).trim().to_ascii_lowercase());

    match (extension.as_deref(), mime.as_deref()) {
        (Some("pdf"), _) | (_, Some("application/pdf")) => Some(DocumentFormat::Pdf),
        (Some("txt" | "md" | "markdown" | "text"), _) => Some(DocumentFormat::PlainText),
        (_, Some(m)) if m.starts_with("text/") => Some(DocumentFormat::PlainText),
        _ => None,
    }
}

async fn extract_pdf_text(bytes: Bytes) -> Result<String, AppError> {
    tokio::task::spawn_blocking(move || pdf_extract::extract_text_from_mem(&bytes))
        .await
        .map_err(|e| AppError::Document(format!("The PDF could not be read: {e}")))?
        .map_err(|e| AppError::Document(format!("Failed to extract text from PDF: {e}")))
}

fn decode_plain_text(bytes: &[u8]) -> Result<String, AppError> {
    let text = std::str::from_utf8(bytes).map_err(|_| {
        AppError::Document("The text file is not valid UTF-8.".to_string())
    })?;
    Ok(text.trim_start_matches(UTF8_BOM).to_string())
}
