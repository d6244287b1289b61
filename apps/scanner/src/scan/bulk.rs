//! Bulk scan: many résumés against one job description, ranked by match score.
//!
//! Each file goes through the same extractor and provider chain as a single scan,
//! but the model is asked for JSON and its answer is normalised into a
//! `CandidateResult`. A file that cannot be read or analysed is recorded as a
//! failure and the run carries on with the next one.

use serde_json::{Map, Value};
use tracing::{info, warn};

use crate::llm_client::{Completion, LlmClient};
use crate::models::bulk::{BulkAnalysis, CandidateResult, CandidateStatus, FileFailure};
use crate::scan::extract::extract_resume_text;
use crate::scan::prompts::{build_bulk_prompt, BULK_SYSTEM};

pub const MAX_BULK_FILES: usize = 1000;

pub const EXTRACTION_FAILED: &str = "Could not extract text (supported: PDF/TXT).";

/// Non-JSON answers are kept as a truncated summary.
const SUMMARY_FALLBACK_CHARS: usize = 500;

/// Parses `text` as a JSON object, falling back to the outermost `{...}` slice
/// when the model wrapped its JSON in prose or code fences. Empty objects and
/// non-object values count as unparseable.
pub fn safe_json_parse(text: &str) -> Option<Map<String, Value>> {
    let parsed = serde_json::from_str::<Value>(text).ok().or_else(|| {
        let start = text.find('{')?;
        let end = text.rfind('}')?;
        if end <= start {
            return None;
        }
        serde_json::from_str(&text[start..=end]).ok()
    })?;

    match parsed {
        Value::Object(map) if !map.is_empty() => Some(map),
        _ => None,
    }
}

/// Integer coercion of `match_score`, clamped to 0..=100. Anything that is not a
/// number or an integer string scores 0.
fn coerce_score(value: Option<&Value>) -> u8 {
    let score = match value {
        Some(Value::Number(n)) => n
            .as_i64()
            .or_else(|| n.as_f64().map(|f| f.trunc() as i64))
            .unwrap_or(0),
        Some(Value::String(s)) => s.trim().parse::<i64>().unwrap_or(0),
        Some(Value::Bool(b)) => i64::from(*b),
        _ => 0,
    };
    score.clamp(0, 100) as u8
}

fn string_list(value: Option<&Value>) -> Vec<String> {
    match value {
        Some(Value::Array(items)) => items
            .iter()
            .map(|item| match item {
                Value::String(s) => s.clone(),
                other => other.to_string(),
            })
            .collect(),
        _ => Vec::new(),
    }
}

fn summary_text(value: Option<&Value>) -> String {
    match value {
        None | Some(Value::Null) => String::new(),
        Some(Value::String(s)) => s.trim().to_string(),
        Some(other) => other.to_string(),
    }
}

/// Turns one model answer into a candidate record.
pub fn candidate_from_answer(file_name: String, completion: &Completion) -> CandidateResult {
    let answer = completion.text.as_str();
    match safe_json_parse(answer) {
        Some(fields) => CandidateResult {
            file_name,
            match_score: coerce_score(fields.get("match_score")),
            summary: summary_text(fields.get("summary")),
            strengths: string_list(fields.get("strengths")),
            missing_keywords: string_list(fields.get("missing_keywords")),
            improvement_suggestions: string_list(fields.get("improvement_suggestions")),
            provider: completion.provider,
            status: CandidateStatus::Processed,
        },
        None => CandidateResult {
            file_name,
            match_score: 0,
            summary: answer.chars().take(SUMMARY_FALLBACK_CHARS).collect(),
            strengths: Vec::new(),
            missing_keywords: Vec::new(),
            improvement_suggestions: Vec::new(),
            provider: completion.provider,
            status: CandidateStatus::Processed,
        },
    }
}

/// Best score first. Stable, so equal scores keep upload order.
pub fn rank_candidates(results: &mut [CandidateResult]) {
    results.sort_by(|a, b| b.match_score.cmp(&a.match_score));
}

async fn scan_file(
    llm: &LlmClient,
    file_name: &str,
    bytes: Vec<u8>,
    job_description: &str,
) -> Result<CandidateResult, String> {
    let resume_text = extract_resume_text(file_name, bytes)
        .await
        .map_err(|e| e.to_string())?;
    if resume_text.is_empty() {
        return Err(EXTRACTION_FAILED.to_string());
    }

    let prompt = build_bulk_prompt(&resume_text, job_description);
    let completion = llm
        .first_answer(&prompt, BULK_SYSTEM)
        .await
        .map_err(|e| e.to_string())?;
    Ok(candidate_from_answer(file_name.to_string(), &completion))
}

/// Scans `files` one after another and returns the ranked run.
pub async fn run_bulk_scan(
    llm: &LlmClient,
    files: Vec<(String, Vec<u8>)>,
    job_description: String,
) -> BulkAnalysis {
    let total_uploaded = files.len();
    let mut results = Vec::new();
    let mut failures = Vec::new();

    for (file_name, bytes) in files {
        match scan_file(llm, &file_name, bytes, &job_description).await {
            Ok(candidate) => results.push(candidate),
            Err(error) => {
                warn!("Bulk scan skipped '{file_name}': {error}");
                failures.push(FileFailure { file_name, error });
            }
        }
    }

    rank_candidates(&mut results);
    info!(
        "Bulk scan finished: {} uploaded, {} processed, {} failed",
        total_uploaded,
        results.len(),
        failures.len()
    );
    BulkAnalysis::new(job_description, total_uploaded, results, failures)
}
