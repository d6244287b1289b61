// Prompt text for the single-résumé and bulk scans.

pub const SCAN_SYSTEM: &str =
    "You are an AI resume coach and hiring expert. Provide human-like, actionable guidance.";

pub const SCAN_PROMPT_TEMPLATE: &str = "\
You are an AI resume coach and hiring expert. Provide human-like, actionable guidance.

Compare this resume with the job description and return:
1) Match score 0-100 (brief rationale)
2) Core strengths aligned to the role (bullets)
3) Matched keywords and related terms found in the resume (bullets)
4) Missing keywords (bullets)
5) Related terms/synonyms to consider (bullets)
6) Improvement suggestions (bullets)
7) Rewritten professional summary (3-4 lines)

Resume:
{resume_text}

Job Description:
{job_description}
";

pub fn build_scan_prompt(resume_text: &str, job_description: &str) -> String {
    SCAN_PROMPT_TEMPLATE
        .replace("{job_description}", job_description)
        .replace("{resume_text}", resume_text)
}

// ────────────────────────────────────────────────────────────────────────────
// Bulk scan
// ────────────────────────────────────────────────────────────────────────────

pub const BULK_SYSTEM: &str = "You are an ATS and recruiting assistant.";

pub const BULK_PROMPT_TEMPLATE: &str = "\
Compare this resume against the job description.
Return ONLY valid JSON with keys:
- match_score (integer 0-100)
- strengths (array of 3 short bullet strings)
- missing_keywords (array of up to 8 strings)
- improvement_suggestions (array of 3 short bullet strings)
- summary (2-3 lines)

Resume:
{resume_text}

Job Description:
{job_description}
";

pub fn build_bulk_prompt(resume_text: &str, job_description: &str) -> String {
    BULK_PROMPT_TEMPLATE
        .replace("{job_description}", job_description)
        .replace("{resume_text}", resume_text)
}
