//! Minimal PDF writer — turns an ordered list of report lines into a paginated PDF 1.4 file.
//!
//! No PDF library is involved: objects, the cross-reference table and the trailer are
//! emitted by hand. Text is drawn with the built-in Helvetica Type1 font, so every line
//! is encoded as Latin-1 and anything outside that range is replaced with `?`.
//!
//! Object layout (ids are allocated in this order):
//! ```text
//! 1            font resource (shared by every page)
//! 2            pages collection (reserved first, filled after all kids exist)
//! 3, 4         page 1 content stream, page 1 descriptor
//! 5, 6         page 2 content stream, page 2 descriptor
//! ...
//! last         catalog
//! ```

use std::fmt;
use std::io::Write;

use thiserror::Error;

// ────────────────────────────────────────────────────────────────────────────
// Layout
// ────────────────────────────────────────────────────────────────────────────

/// Fixed page geometry and text placement for generated reports.
#[derive(Debug, Clone, PartialEq)]
pub struct PageLayout {
    pub lines_per_page: usize,
    pub page_width: u32,
    pub page_height: u32,
    /// Horizontal position of every line, in points from the left edge.
    pub left_margin: u32,
    /// Baseline of the first line, in points from the bottom edge.
    pub top_baseline: i32,
    pub line_height: i32,
    pub font_size: u32,
    pub base_font: &'static str,
    /// Rendered when there are no lines at all.
    pub placeholder_title: &'static str,
}

/// US letter, Helvetica 11pt, 45 lines per page.
pub fn default_page_layout() -> PageLayout {
    PageLayout {
        lines_per_page: 45,
        page_width: 612,
        page_height: 792,
        left_margin: 40,
        top_baseline: 760,
        line_height: 15,
        font_size: 11,
        base_font: "Helvetica",
        placeholder_title: "AI Resume Scanner - Analysis Report",
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Errors
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum PdfError {
    #[error("I/O error while writing PDF: {0}")]
    Io(#[from] std::io::Error),

    #[error("object {0} was reserved but never written")]
    UnfilledObject(ObjectId),
}

// ────────────────────────────────────────────────────────────────────────────
// Object arena
// ────────────────────────────────────────────────────────────────────────────

/// Numeric id of an indirect object. Always ≥ 1; id 0 is the xref free-list head.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ObjectId(u32);

impl ObjectId {
    /// `<id> 0 R`
    fn reference(self) -> String {
        format!("{} 0 R", self.0)
    }
}

impl fmt::Display for ObjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Object bodies indexed by id. Slot `i` holds object `i + 1`.
///
/// A slot may be reserved before its body is known, which is how the pages
/// collection gets an id its children can point at before the kid list exists.
#[derive(Debug, Default)]
struct ObjectArena {
    slots: Vec<Option<Vec<u8>>>,
}

impl ObjectArena {
    fn reserve(&mut self) -> ObjectId {
        self.slots.push(None);
        ObjectId(self.slots.len() as u32)
    }

    fn insert(&mut self, body: Vec<u8>) -> ObjectId {
        self.slots.push(Some(body));
        ObjectId(self.slots.len() as u32)
    }

    fn fill(&mut self, id: ObjectId, body: Vec<u8>) {
        self.slots[id.0 as usize - 1] = Some(body);
    }

    fn max_id(&self) -> u32 {
        self.slots.len() as u32
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Text helpers
// ────────────────────────────────────────────────────────────────────────────

/// Escapes the three characters that are special inside a PDF literal string.
pub fn escape_pdf_text(line: &str) -> String {
    let mut out = String::with_capacity(line.len());
    for c in line.chars() {
        if matches!(c, '\\' | '(' | ')') {
            out.push('\\');
        }
        out.push(c);
    }
    out
}

/// Encodes text as Latin-1. Code points above U+00FF become `?`.
fn encode_latin1(text: &str) -> Vec<u8> {
    text.chars()
        .map(|c| u8::try_from(u32::from(c)).unwrap_or(b'?'))
        .collect()
}

/// Splits `lines` into consecutive pages of at most `lines_per_page` lines.
///
/// Total and order-preserving: no lines means no pages.
pub fn paginate<S: AsRef<str>>(lines: &[S], lines_per_page: usize) -> Vec<&[S]> {
    lines.chunks(lines_per_page.max(1)).collect()
}

/// Builds the text-drawing instructions for one page (without the stream wrapper).
pub fn page_content_stream<S: AsRef<str>>(lines: &[S], layout: &PageLayout) -> Vec<u8> {
    let mut ops = Vec::with_capacity(lines.len() + 3);
    ops.push("BT".to_string());
    ops.push(format!("/F1 {} Tf", layout.font_size));

    let mut y = layout.top_baseline;
    for line in lines {
        ops.push(format!(
            "1 0 0 1 {} {} Tm ({}) Tj",
            layout.left_margin,
            y,
            escape_pdf_text(line.as_ref())
        ));
        y -= layout.line_height;
    }
    ops.push("ET".to_string());

    encode_latin1(&ops.join("\n"))
}

// ────────────────────────────────────────────────────────────────────────────
// Document assembly
// ────────────────────────────────────────────────────────────────────────────

/// Renders `lines` as a PDF using the default report layout.
pub fn write_pdf<S: AsRef<str>>(lines: &[S]) -> Result<Vec<u8>, PdfError> {
    write_pdf_with_layout(lines, &default_page_layout())
}

pub fn write_pdf_with_layout<S: AsRef<str>>(
    lines: &[S],
    layout: &PageLayout,
) -> Result<Vec<u8>, PdfError> {
    let placeholder = [layout.placeholder_title];
    let page_streams: Vec<Vec<u8>> = {
        let pages = paginate(lines, layout.lines_per_page);
        if pages.is_empty() {
            vec![page_content_stream(&placeholder, layout)]
        } else {
            pages
                .into_iter()
                .map(|page| page_content_stream(page, layout))
                .collect()
        }
    };

    let mut arena = ObjectArena::default();

    let font_id = arena.insert(
        format!(
            "<< /Type /Font /Subtype /Type1 /BaseFont /{} >>",
            layout.base_font
        )
        .into_bytes(),
    );
    let pages_id = arena.reserve();

    let mut kids = Vec::with_capacity(page_streams.len());
    for stream in page_streams {
        let mut body = format!("<< /Length {} >>\nstream\n", stream.len()).into_bytes();
        body.extend_from_slice(&stream);
        body.extend_from_slice(b"\nendstream");
        let content_id = arena.insert(body);

        let page_id = arena.insert(
            format!(
                "<< /Type /Page /Parent {} /MediaBox [0 0 {} {}] /Resources << /Font << /F1 {} >> >> /Contents {} >>",
                pages_id.reference(),
                layout.page_width,
                layout.page_height,
                font_id.reference(),
                content_id.reference(),
            )
            .into_bytes(),
        );
        kids.push(page_id);
    }

    let kid_refs: Vec<String> = kids.iter().map(|id| id.reference()).collect();
    arena.fill(
        pages_id,
        format!(
            "<< /Type /Pages /Count {} /Kids [{}] >>",
            kids.len(),
            kid_refs.join(" ")
        )
        .into_bytes(),
    );

    let catalog_id = arena.insert(
        format!("<< /Type /Catalog /Pages {} >>", pages_id.reference()).into_bytes(),
    );

    serialize(&arena, catalog_id)
}

/// Writes header, objects, cross-reference table and trailer.
fn serialize(arena: &ObjectArena, root: ObjectId) -> Result<Vec<u8>, PdfError> {
    let mut out: Vec<u8> = Vec::new();
    out.write_all(b"%PDF-1.4\n")?;

    let mut offsets = Vec::with_capacity(arena.slots.len());
    for (index, slot) in arena.slots.iter().enumerate() {
        let id = ObjectId(index as u32 + 1);
        let body = slot.as_ref().ok_or(PdfError::UnfilledObject(id))?;

        offsets.push(out.len());
        writeln!(out, "{id} 0 obj")?;
        out.write_all(body)?;
        out.write_all(b"\nendobj\n")?;
    }

    let xref_start = out.len();
    let size = arena.max_id() + 1;
    write!(out, "xref\n0 {size}\n")?;
    out.write_all(b"0000000000 65535 f \n")?;
    for offset in &offsets {
        writeln!(out, "{offset:010} 00000 n ")?;
    }

    write!(
        out,
        "trailer\n<< /Size {size} /Root {} >>\nstartxref\n{xref_start}\n%%EOF",
        root.reference()
    )?;

    Ok(out)
}
