//! Report line builder — flattens a stored analysis into the line sequence the PDF writer renders.

use crate::models::analysis::Analysis;

pub const REPORT_TITLE: &str = "AI Resume Scanner - Analysis Report";

const RESUME_HEADING: &str = "Resume Text";
const JD_HEADING: &str = "Job Description";
const ANALYSIS_HEADING: &str = "AI Analysis & Recommendations";

/// Title, timestamp, then the three text fields each under its own heading.
pub fn report_lines(analysis: &Analysis) -> Vec<String> {
    let mut lines = vec![
        REPORT_TITLE.to_string(),
        format!("Generated: {}", analysis.timestamp()),
    ];

    for (heading, body) in [
        (RESUME_HEADING, &analysis.resume_text),
        (JD_HEADING, &analysis.job_description),
        (ANALYSIS_HEADING, &analysis.analysis),
    ] {
        lines.push(String::new());
        lines.push(heading.to_string());
        lines.extend(split_field(body));
    }

    lines
}

/// Splits on `\n`, keeping empty lines and dropping a trailing `\r` from each.
fn split_field(text: &str) -> impl Iterator<Item = String> + '_ {
    text.split('\n')
        .map(|line| line.strip_suffix('\r').unwrap_or(line).to_string())
}

/// `resume_analysis_2026-03-07_09-05-01.pdf`
pub fn pdf_filename(analysis: &Analysis) -> String {
    let stamp = analysis.timestamp().replace(' ', "_").replace(':', "-");
    format!("resume_analysis_{stamp}.pdf")
}
