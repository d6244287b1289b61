//! Axum route handlers for the Scan API.

use axum::{
    extract::{Multipart, Path, State},
    Json,
};
use serde::Serialize;
use tracing::info;
use uuid::Uuid;

use crate::errors::AppError;
use crate::llm_client::ProviderKind;
use crate::models::analysis::Analysis;
use crate::models::bulk::{BulkAnalysis, CandidateResult, FileFailure};
use crate::scan::bulk::{run_bulk_scan, MAX_BULK_FILES};
use crate::scan::extract::extract_resume_text;
use crate::scan::prompts::{build_scan_prompt, SCAN_SYSTEM};
use crate::state::AppState;

#[derive(Debug, Serialize)]
pub struct ScanResponse {
    pub analysis_id: Uuid,
    pub analysis: String,
    pub provider: ProviderKind,
}

#[derive(Debug, Serialize)]
pub struct BulkScanResponse {
    pub bulk_id: Uuid,
    pub timestamp: String,
    pub total_uploaded: usize,
    pub processed: usize,
    pub failed: usize,
    pub top_candidates: Vec<CandidateResult>,
    pub results: Vec<CandidateResult>,
    pub failures: Vec<FileFailure>,
}

impl From<&BulkAnalysis> for BulkScanResponse {
    fn from(bulk: &BulkAnalysis) -> Self {
        Self {
            bulk_id: bulk.id,
            timestamp: bulk.timestamp(),
            total_uploaded: bulk.total_uploaded,
            processed: bulk.results.len(),
            failed: bulk.failures.len(),
            top_candidates: bulk.top_candidates().to_vec(),
            results: bulk.results.clone(),
            failures: bulk.failures.clone(),
        }
    }
}

fn malformed(e: axum::extract::multipart::MultipartError) -> AppError {
    AppError::Validation(format!("Malformed upload: {e}"))
}

/// Upload fields collected from the multipart body.
#[derive(Debug, Default)]
struct ScanUpload {
    resume: Option<(String, Vec<u8>)>,
    job_description: String,
}

async fn read_upload(mut multipart: Multipart) -> Result<ScanUpload, AppError> {
    let mut upload = ScanUpload::default();

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(malformed)?
    {
        let name = field.name().map(str::to_owned);
        match name.as_deref() {
            Some("resume") => {
                let file_name = field.file_name().unwrap_or_default().to_string();
                let bytes = field.bytes().await.map_err(malformed)?;
                upload.resume = Some((file_name, bytes.to_vec()));
            }
            Some("job_description") => {
                upload.job_description = field.text().await.map_err(malformed)?.trim().to_string();
            }
            _ => {}
        }
    }

    Ok(upload)
}

/// Bulk upload: every `resumes` (or `resumes[]`) file part, in upload order.
#[derive(Debug, Default)]
struct BulkUpload {
    resumes: Vec<(String, Vec<u8>)>,
    job_description: String,
}

async fn read_bulk_upload(mut multipart: Multipart) -> Result<BulkUpload, AppError> {
    let mut upload = BulkUpload::default();

    while let Some(field) = multipart.next_field().await.map_err(malformed)? {
        let name = field.name().map(str::to_owned);
        match name.as_deref() {
            Some("resumes") | Some("resumes[]") => {
                let index = upload.resumes.len() + 1;
                let file_name = field
                    .file_name()
                    .filter(|n| !n.is_empty())
                    .map(str::to_owned)
                    .unwrap_or_else(|| format!("resume_{index}"));
                let bytes = field.bytes().await.map_err(malformed)?;
                upload.resumes.push((file_name, bytes.to_vec()));
            }
            Some("job_description") => {
                upload.job_description = field.text().await.map_err(malformed)?.trim().to_string();
            }
            _ => {}
        }
    }

    Ok(upload)
}

/// POST /api/v1/scan
///
/// Multipart `resume` (PDF or TXT) + `job_description`. Returns the model's analysis
/// and the id under which it was stored for export.
pub async fn handle_scan(
    State(state): State<AppState>,
    multipart: Multipart,
) -> Result<Json<ScanResponse>, AppError> {
    if !state.llm.has_providers() {
        return Err(AppError::NotConfigured);
    }

    let upload = read_upload(multipart).await?;
    let (file_name, bytes) = match upload.resume {
        Some(resume) if !upload.job_description.is_empty() => resume,
        _ => {
            return Err(AppError::Validation(
                "Resume file and job description are required.".to_string(),
            ))
        }
    };

    let resume_text = extract_resume_text(&file_name, bytes).await?;
    if resume_text.is_empty() {
        return Err(AppError::Validation(
            "Could not extract resume text. Use a readable PDF or TXT.".to_string(),
        ));
    }

    let prompt = build_scan_prompt(&resume_text, &upload.job_description);
    let completion = state.llm.analyze(&prompt, SCAN_SYSTEM).await?;

    let analysis = Analysis::new(
        file_name,
        resume_text,
        upload.job_description,
        completion.text,
        completion.provider,
    );
    state.store.put(&analysis).await?;
    info!(
        "Stored analysis {} from {} for '{}'",
        analysis.id, analysis.provider, analysis.resume_file_name
    );

    Ok(Json(ScanResponse {
        analysis_id: analysis.id,
        analysis: analysis.analysis,
        provider: analysis.provider,
    }))
}

/// GET /api/v1/analyses/:id
pub async fn handle_get_analysis(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<Analysis>, AppError> {
    let analysis = state
        .store
        .get(id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Analysis {id} not found")))?;
    Ok(Json(analysis))
}

/// POST /api/v1/bulk-scan
///
/// Multipart `resumes` (1 to 1000 PDF/TXT files) + `job_description`. Files are
/// scanned in turn; unreadable files and failed model calls are reported per file.
pub async fn handle_bulk_scan(
    State(state): State<AppState>,
    multipart: Multipart,
) -> Result<Json<BulkScanResponse>, AppError> {
    if !state.llm.has_providers() {
        return Err(AppError::NotConfigured);
    }

    let upload = read_bulk_upload(multipart).await?;
    if upload.job_description.is_empty() {
        return Err(AppError::Validation("Job description is required.".to_string()));
    }
    if upload.resumes.is_empty() {
        return Err(AppError::Validation("Please upload resume files.".to_string()));
    }
    if upload.resumes.len() > MAX_BULK_FILES {
        return Err(AppError::Validation(format!(
            "Company bulk mode supports 1 to {MAX_BULK_FILES} resumes per run."
        )));
    }

    let bulk = run_bulk_scan(&state.llm, upload.resumes, upload.job_description).await;
    state.store.put_bulk(&bulk).await?;
    info!(
        "Stored bulk run {} ({} ranked, {} failed)",
        bulk.id,
        bulk.results.len(),
        bulk.failures.len()
    );

    Ok(Json(BulkScanResponse::from(&bulk)))
}

/// GET /api/v1/bulk-analyses/:id
pub async fn handle_get_bulk_analysis(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<BulkScanResponse>, AppError> {
    let bulk = state
        .store
        .get_bulk(id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Bulk analysis {id} not found")))?;
    Ok(Json(BulkScanResponse::from(&bulk)))
}
