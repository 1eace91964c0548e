//! PDF export. Writes a settled `PageLayout` as a one-page A4 document.
//!
//! Text is drawn with the standard Type 1 fonts (WinAnsi encoded) so no font program
//! is embedded; the ◊ contact separator comes from the Symbol font. Output carries no
//! timestamps or random identifiers, so the same layout always yields the same bytes.

use bytes::Bytes;
use pdf_writer::types::{ActionType, AnnotationType};
use pdf_writer::{Content, Finish, Name, Pdf, Rect, Ref, Str, TextStr};
use tracing::debug;

use crate::layout::font_metrics::get_metrics;
use crate::layout::page::px_to_pt;
use crate::layout::{FontFace, GlyphSet, PageLayout, PlacedText};
use crate::models::Record;

const FONT_REGULAR: Name<'static> = Name(b"F1");
const FONT_BOLD: Name<'static> = Name(b"F2");
const FONT_ITALIC: Name<'static> = Name(b"F3");
const FONT_SYMBOL: Name<'static> = Name(b"F4");

/// Symbol font code for ◊ (lozenge).
const SYMBOL_LOZENGE: u8 = 0xE0;
/// Descent below the baseline used for link hit areas, in ems.
const LINK_DESCENT: f32 = 0.2;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ExportOptions {
    /// Quality multiplier recorded for downstream rasterizers.
    pub raster_scale: f32,
}

impl Default for ExportOptions {
    fn default() -> Self {
        ExportOptions { raster_scale: 2.0 }
    }
}

#[derive(Debug, Clone)]
pub struct ExportArtifact {
    pub filename: String,
    pub bytes: Bytes,
}

/// `{fullName}_resume.pdf`, or `resume_resume.pdf` when the name is blank.
pub fn export_filename(record: &Record) -> String {
    let name = record.personal_info.full_name.trim();
    let stem = if name.is_empty() { "resume" } else { name };
    let stem: String = stem
        .chars()
        .map(|c| match c {
            '/' | '\\' | '"' => '_',
            c if c.is_control() => '_',
            c => c,
        })
        .collect();
    format!("{stem}_resume.pdf")
}

/// Renders `layout` to PDF. `record` supplies the filename and document title.
pub fn export_pdf(layout: &PageLayout, record: &Record, options: &ExportOptions) -> ExportArtifact {
    let mut next_id = 1;
    let mut alloc = || {
        let id = Ref::new(next_id);
        next_id += 1;
        id
    };

    let catalog_id = alloc();
    let tree_id = alloc();
    let page_id = alloc();
    let content_id = alloc();
    let info_id = alloc();
    let font_ids = [alloc(), alloc(), alloc(), alloc()];

    let width_pt = layout.page.width_pt();
    let height_pt = layout.page.height_pt();

    let mut pdf = Pdf::new();
    pdf.catalog(catalog_id).pages(tree_id);
    pdf.pages(tree_id).kids([page_id]).count(1);

    let faces = [FontFace::Regular, FontFace::Bold, FontFace::Italic];
    for (id, face) in font_ids.iter().zip(faces) {
        pdf.type1_font(*id)
            .base_font(Name(layout.font.base_font(face).as_bytes()))
            .encoding_predefined(Name(b"WinAnsiEncoding"));
    }
    pdf.type1_font(font_ids[3]).base_font(Name(b"Symbol"));

    let links: Vec<(Rect, &str)> = layout
        .texts
        .iter()
        .filter_map(|t| t.href.as_deref().map(|href| (link_rect(layout, t, height_pt), href)))
        .collect();
    let link_ids: Vec<Ref> = links.iter().map(|_| alloc()).collect();

    {
        let mut page = pdf.page(page_id);
        page.media_box(Rect::new(0.0, 0.0, width_pt, height_pt));
        page.parent(tree_id);
        page.contents(content_id);
        let mut resources = page.resources();
        let mut fonts = resources.fonts();
        for (name, id) in [FONT_REGULAR, FONT_BOLD, FONT_ITALIC, FONT_SYMBOL]
            .into_iter()
            .zip(font_ids)
        {
            fonts.pair(name, id);
        }
        fonts.finish();
        resources.finish();
        if !link_ids.is_empty() {
            page.annotations(link_ids.iter().copied());
        }
        page.finish();
    }

    for ((rect, href), id) in links.iter().zip(&link_ids) {
        let mut annotation = pdf.annotation(*id);
        annotation.subtype(AnnotationType::Link).rect(*rect);
        annotation.insert(Name(b"Border")).array().items([0_i32, 0, 0]);
        annotation
            .action()
            .action_type(ActionType::Uri)
            .uri(Str(href.as_bytes()));
    }

    let content = page_content(layout, height_pt);
    pdf.stream(content_id, &content);

    let title = match record.personal_info.full_name.trim() {
        "" => "Resume".to_string(),
        name => format!("{name} Resume"),
    };
    let mut info = pdf.document_info(info_id);
    info.title(TextStr(&title));
    info.creator(TextStr(concat!(
        env!("CARGO_PKG_NAME"),
        " v",
        env!("CARGO_PKG_VERSION")
    )));
    info.pair(Name(b"FolioRasterScale"), options.raster_scale);
    info.finish();

    let bytes = pdf.finish();
    debug!(
        size = bytes.len(),
        texts = layout.texts.len(),
        links = link_ids.len(),
        scale = layout.scale,
        "PDF export written"
    );

    ExportArtifact {
        filename: export_filename(record),
        bytes: Bytes::from(bytes),
    }
}

fn page_content(layout: &PageLayout, height_pt: f32) -> Vec<u8> {
    let mut content = Content::new();

    for text in &layout.texts {
        let (font, encoded) = match text.glyphs {
            GlyphSet::Separator => (FONT_SYMBOL, vec![SYMBOL_LOZENGE]),
            GlyphSet::Text(face) => (face_font(face), encode_win_ansi(&text.text)),
        };
        let (r, g, b) = text.colour.unit_rgb();
        content.set_fill_rgb(r, g, b);
        content.begin_text();
        content.set_font(font, text.size_pt);
        content.next_line(px_to_pt(text.x), height_pt - px_to_pt(text.baseline));
        content.show(Str(&encoded));
        content.end_text();
    }

    if !layout.rules.is_empty() {
        content.set_stroke_rgb(0.0, 0.0, 0.0);
        for rule in &layout.rules {
            let y = height_pt - px_to_pt(rule.y);
            content.set_line_width(px_to_pt(rule.width));
            content.move_to(px_to_pt(rule.x1), y);
            content.line_to(px_to_pt(rule.x2), y);
            content.stroke();
        }
    }

    content.finish()
}

fn face_font(face: FontFace) -> Name<'static> {
    match face {
        FontFace::Regular => FONT_REGULAR,
        FontFace::Bold => FONT_BOLD,
        FontFace::Italic => FONT_ITALIC,
    }
}

fn link_rect(layout: &PageLayout, text: &PlacedText, height_pt: f32) -> Rect {
    let face = match text.glyphs {
        GlyphSet::Text(face) => face,
        GlyphSet::Separator => FontFace::Regular,
    };
    let width_pt = get_metrics(layout.font).measure_str(&text.text, face) * text.size_pt;
    let x = px_to_pt(text.x);
    let baseline = height_pt - px_to_pt(text.baseline);
    Rect::new(
        x,
        baseline - LINK_DESCENT * text.size_pt,
        x + width_pt,
        baseline + (1.0 - LINK_DESCENT) * text.size_pt,
    )
}

/// Encodes `text` in WinAnsiEncoding. Unmappable characters become `?`.
pub fn encode_win_ansi(text: &str) -> Vec<u8> {
    text.chars()
        .map(|c| match c {
            ' '..='~' => c as u8,
            '\u{a0}'..='\u{ff}' => c as u32 as u8,
            '€' => 0x80,
            '‚' => 0x82,
            '„' => 0x84,
            '…' => 0x85,
            '†' => 0x86,
            '‡' => 0x87,
            '‰' => 0x89,
            '‘' => 0x91,
            '’' => 0x92,
            '“' => 0x93,
            '”' => 0x94,
            '•' => 0x95,
            '–' => 0x96,
            '—' => 0x97,
            '™' => 0x99,
            _ => b'?',
        })
        .collect()
}

// ────────────────────────────────────────────────────────────────────────────
// Tests
// ────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layout::Renderer;

    fn contains(haystack: &[u8], needle: &[u8]) -> bool {
        haystack.windows(needle.len()).any(|w| w == needle)
    }

    fn jane() -> Record {
        let mut record = Record::template();
        record.personal_info.full_name = "Jane Doe".to_string();
        record.personal_info.email = "jane@example.com".to_string();
        record.personal_info.phone = "555-1234".to_string();
        record.professional_summary = "Engineer – distributed systems.".to_string();
        record
    }

    #[test]
    fn test_filename_defaults_when_name_blank() {
        assert_eq!(export_filename(&Record::template()), "resume_resume.pdf");
        assert_eq!(export_filename(&jane()), "Jane Doe_resume.pdf");

        let mut record = Record::template();
        record.personal_info.full_name = "a/b\"c".to_string();
        assert_eq!(export_filename(&record), "a_b_c_resume.pdf");
    }

    #[test]
    fn test_win_ansi_encoding() {
        assert_eq!(encode_win_ansi("A – B"), vec![b'A', b' ', 0x96, b' ', b'B']);
        assert_eq!(encode_win_ansi("café"), vec![b'c', b'a', b'f', 0xE9]);
        assert_eq!(encode_win_ansi("•"), vec![0x95]);
        assert_eq!(encode_win_ansi("日本"), b"??".to_vec());
    }

    #[test]
    fn test_pdf_structure() {
        let record = jane();
        let rendered = Renderer::default().render(&record);
        let artifact = export_pdf(&rendered.layout, &record, &ExportOptions::default());

        assert!(artifact.bytes.starts_with(b"%PDF-"));
        assert!(contains(&artifact.bytes, b"/Times-Roman"));
        assert!(contains(&artifact.bytes, b"/Times-Bold"));
        assert!(contains(&artifact.bytes, b"/Symbol"));
        assert!(contains(&artifact.bytes, b"/FolioRasterScale"));
        assert!(contains(&artifact.bytes, b"mailto:jane@example.com"));
        assert_eq!(artifact.filename, "Jane Doe_resume.pdf");
    }

    #[test]
    fn test_export_is_byte_identical_on_retry() {
        let record = jane();
        let rendered = Renderer::default().render(&record);
        let options = ExportOptions { raster_scale: 2.0 };
        let a = export_pdf(&rendered.layout, &record, &options);
        let b = export_pdf(&rendered.layout, &record, &options);
        assert_eq!(a.bytes, b.bytes);
    }

    #[test]
    fn test_placeholder_exports() {
        let record = Record::template();
        let rendered = Renderer::default().render(&record);
        let artifact = export_pdf(&rendered.layout, &record, &ExportOptions::default());
        assert!(artifact.bytes.starts_with(b"%PDF-"));
        assert!(!contains(&artifact.bytes, b"/Annots"));
        assert_eq!(artifact.filename, "resume_resume.pdf");
    }
}
