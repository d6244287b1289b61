use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::local_timestamp;
use crate::llm_client::ProviderKind;

/// How many of the ranked candidates are surfaced as the shortlist.
pub const TOP_CANDIDATES: usize = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CandidateStatus {
    Processed,
}

/// One résumé's structured verdict from a bulk run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CandidateResult {
    pub file_name: String,
    /// Always within 0..=100.
    pub match_score: u8,
    pub summary: String,
    pub strengths: Vec<String>,
    pub missing_keywords: Vec<String>,
    pub improvement_suggestions: Vec<String>,
    pub provider: ProviderKind,
    pub status: CandidateStatus,
}

/// A file that produced no result, with the reason.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FileFailure {
    pub file_name: String,
    pub error: String,
}

/// A completed bulk run. `results` is kept ranked by score, best first.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BulkAnalysis {
    pub id: Uuid,
    pub job_description: String,
    pub total_uploaded: usize,
    pub results: Vec<CandidateResult>,
    pub failures: Vec<FileFailure>,
    pub created_at: DateTime<Utc>,
}

impl BulkAnalysis {
    pub fn new(
        job_description: String,
        total_uploaded: usize,
        results: Vec<CandidateResult>,
        failures: Vec<FileFailure>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            job_description,
            total_uploaded,
            results,
            failures,
            created_at: Utc::now(),
        }
    }

    pub fn timestamp(&self) -> String {
        local_timestamp(&self.created_at)
    }

    pub fn top_candidates(&self) -> &[CandidateResult] {
        &self.results[..self.results.len().min(TOP_CANDIDATES)]
    }
}
