//! Résumé text extraction from uploaded files.

use tracing::{debug, warn};

use crate::errors::AppError;

/// Supported upload kinds, decided by file extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResumeFormat {
    Pdf,
    Text,
    Unsupported,
}

impl ResumeFormat {
    pub fn from_file_name(file_name: &str) -> Self {
        let lowered = file_name.to_lowercase();
        if lowered.ends_with(".pdf") {
            ResumeFormat::Pdf
        } else if lowered.ends_with(".txt") {
            ResumeFormat::Text
        } else {
            ResumeFormat::Unsupported
        }
    }
}

/// Returns the trimmed text of an uploaded résumé.
///
/// Unsupported formats and unreadable PDFs both yield an empty string; the caller
/// turns that into a validation error.
pub async fn extract_resume_text(file_name: &str, bytes: Vec<u8>) -> Result<String, AppError> {
    let text = match ResumeFormat::from_file_name(file_name) {
        ResumeFormat::Pdf => {
            let extracted =
                tokio::task::spawn_blocking(move || pdf_extract::extract_text_from_mem(&bytes))
                    .await
                    .map_err(|e| AppError::Internal(e.into()))?;
            match extracted {
                Ok(text) => text,
                Err(e) => {
                    warn!("PDF text extraction failed for '{file_name}': {e}");
                    String::new()
                }
            }
        }
        ResumeFormat::Text => decode_text(&bytes),
        ResumeFormat::Unsupported => {
            debug!("Unsupported résumé format: '{file_name}'");
            String::new()
        }
    };

    Ok(text.trim().to_string())
}

/// Decodes UTF-8, dropping invalid byte sequences.
fn decode_text(bytes: &[u8]) -> String {
    String::from_utf8_lossy(bytes)
        .chars()
        .filter(|&c| c != char::REPLACEMENT_CHARACTER)
        .collect()
}
