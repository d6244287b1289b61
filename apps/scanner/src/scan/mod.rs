// Scan flow: extract résumé text, ask the provider chain for an analysis, and keep
// the result under its own id for later export. Bulk runs reuse the same extractor
// and chain, one file at a time.
// PDF text extraction is CPU-bound and runs inside tokio::task::spawn_blocking.

pub mod bulk;
pub mod extract;
pub mod handlers;
pub mod prompts;
pub mod store;
