// Report export: a stored analysis becomes an ordered list of lines, which the
// minimal PDF writer paginates and serializes without any PDF library.

pub mod handlers;
pub mod pdf_writer;
pub mod report;
