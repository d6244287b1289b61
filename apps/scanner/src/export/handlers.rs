//! Axum route handlers for the Export API.

use axum::{
    extract::{Path, State},
    http::header,
    response::{IntoResponse, Response},
};
use bytes::Bytes;
use tracing::info;
use uuid::Uuid;

use crate::errors::AppError;
use crate::export::pdf_writer::write_pdf;
use crate::export::report::{pdf_filename, report_lines};
use crate::state::AppState;

/// GET /api/v1/analyses/:id/export/pdf
///
/// Renders the stored analysis as a PDF attachment. Nothing is returned unless the
/// whole document was generated.
pub async fn handle_export_pdf(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Response, AppError> {
    let analysis = state.store.get(id).await?.ok_or(AppError::NoAnalysis)?;

    let lines = report_lines(&analysis);
    let pdf = write_pdf(&lines)?;
    let filename = pdf_filename(&analysis);
    info!(
        "Exported analysis {id} as {filename} ({} lines, {} bytes)",
        lines.len(),
        pdf.len()
    );

    Ok((
        [
            (header::CONTENT_TYPE, "application/pdf".to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{filename}\""),
            ),
        ],
        Bytes::from(pdf),
    )
        .into_response())
}
