use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::local_timestamp;
use crate::llm_client::ProviderKind;

/// One completed scan: the inputs that went to the model and what came back.
///
/// Stored under `id` so that a later export refers to exactly this scan.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Analysis {
    pub id: Uuid,
    pub resume_file_name: String,
    pub resume_text: String,
    pub job_description: String,
    pub analysis: String,
    pub provider: ProviderKind,
    pub created_at: DateTime<Utc>,
}

impl Analysis {
    pub fn new(
        resume_file_name: String,
        resume_text: String,
        job_description: String,
        analysis: String,
        provider: ProviderKind,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            resume_file_name,
            resume_text,
            job_description,
            analysis,
            provider,
            created_at: Utc::now(),
        }
    }

    /// Local wall-clock time of the scan, as printed in reports.
    pub fn timestamp(&self) -> String {
        local_timestamp(&self.created_at)
    }
}
