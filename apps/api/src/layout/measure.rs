//! Page measurement: positions every line of a composed document and reports the
//! resulting content height.
//!
//! # Architecture
//! - `Measure` is the seam the fit loop depends on: `(document, scale) -> height`.
//! - `MetricMeasurer` is the production implementation. It simulates the page with
//!   static font metrics and greedy word-wrap, producing a `PageLayout` that the
//!   exporter draws verbatim.
//!
//! Only body text follows `scale`; the name, contact line, section titles and the
//! skills block keep fixed sizes. Every element's height is non-increasing as the body
//! size shrinks, so measured height is monotone in scale.

use serde::{Deserialize, Serialize};

use crate::layout::compose::{ComposedDocument, ContactItem, EducationItem, ProjectItem, Section};
use crate::layout::font_metrics::{get_metrics, FontFace, FontFamily, FontMetricTable, SEPARATOR_WIDTH_EM};
use crate::layout::page::{pt_to_px, PageBox};
use crate::layout::render::{RenderTheme, SYMBOL_SEPARATOR};

/// Rendered height, in pixels, of `document` at body size `scale` (points).
pub trait Measure: Send + Sync {
    fn measure(&self, document: &ComposedDocument, scale: f32) -> f32;
}

// ────────────────────────────────────────────────────────────────────────────
// Layout output
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Colour {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Colour {
    pub const BLACK: Colour = Colour { r: 0, g: 0, b: 0 };
    pub const NAVY: Colour = Colour { r: 0, g: 51, b: 102 };
    pub const LINK: Colour = Colour { r: 0, g: 0, b: 238 };
    pub const MUTED: Colour = Colour { r: 148, g: 163, b: 184 };

    /// Parses `#rrggbb` (leading `#` optional).
    pub fn from_hex(hex: &str) -> Option<Colour> {
        let digits = hex.strip_prefix('#').unwrap_or(hex);
        if digits.len() != 6 || !digits.is_ascii() {
            return None;
        }
        let channel = |i: usize| u8::from_str_radix(&digits[i..i + 2], 16).ok();
        Some(Colour {
            r: channel(0)?,
            g: channel(2)?,
            b: channel(4)?,
        })
    }

    /// Components scaled to 0.0 – 1.0.
    pub fn unit_rgb(&self) -> (f32, f32, f32) {
        (
            f32::from(self.r) / 255.0,
            f32::from(self.g) / 255.0,
            f32::from(self.b) / 255.0,
        )
    }
}

/// Which font program a text run is drawn with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum GlyphSet {
    Text(FontFace),
    /// The ◊ separator from the Symbol font.
    Separator,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PlacedText {
    pub x: f32,
    pub baseline: f32,
    pub size_pt: f32,
    pub glyphs: GlyphSet,
    pub text: String,
    pub colour: Colour,
    pub href: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PlacedRule {
    pub x1: f32,
    pub x2: f32,
    pub y: f32,
    pub width: f32,
}

/// A fully positioned page. Coordinates are pixels from the page's top-left corner.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PageLayout {
    pub page: PageBox,
    pub font: FontFamily,
    pub scale: f32,
    /// Height from the page top to the bottom padding of the last element.
    pub content_height: f32,
    pub texts: Vec<PlacedText>,
    pub rules: Vec<PlacedRule>,
}

// ────────────────────────────────────────────────────────────────────────────
// Box model constants (px unless noted)
// ────────────────────────────────────────────────────────────────────────────

const PAD_TOP: f32 = 40.0;
const PAD_BOTTOM: f32 = 40.0;
const PAD_X: f32 = 45.0;
const LINE_HEIGHT: f32 = 1.3;
const SUMMARY_LINE_HEIGHT: f32 = 1.4;
/// Baseline position inside the em box.
const ASCENT: f32 = 0.8;

const NAME_PT: f32 = 24.0;
const NAME_GAP: f32 = 5.0;
const CONTACT_PT: f32 = 10.0;
const CONTACT_GAP_X: f32 = 8.0;
const CONTACT_GAP_Y: f32 = 6.0;
const HEADER_GAP: f32 = 15.0;

const TITLE_PT: f32 = 11.0;
const TITLE_MARGIN_TOP: f32 = 10.0;
const TITLE_RULE_PAD: f32 = 1.0;
const TITLE_RULE_WIDTH: f32 = 1.0;
const TITLE_MARGIN_BOTTOM: f32 = 5.0;
const SECTION_GAP: f32 = 12.0;

const EDUCATION_GAP: f32 = 4.0;
const DATE_GAP: f32 = 8.0;
const SKILLS_PT: f32 = 10.0;
const SKILL_GAP: f32 = 2.0;
const PROJECT_TITLE_GAP: f32 = 2.0;
const PROJECT_GAP: f32 = 8.0;
const LIST_INDENT: f32 = 20.0;
const BULLET_OFFSET: f32 = 8.0;
const ITEM_GAP: f32 = 2.0;

const PLACEHOLDER_HEIGHT: f32 = 400.0;
const PLACEHOLDER_TITLE_PT: f32 = 14.0;
const PLACEHOLDER_HINT_PT: f32 = 10.0;
const PLACEHOLDER_HINT_GAP: f32 = 8.0;

// ────────────────────────────────────────────────────────────────────────────
// Metric measurer
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone)]
pub struct MetricMeasurer {
    pub theme: RenderTheme,
    pub page: PageBox,
}

impl MetricMeasurer {
    pub fn new(theme: RenderTheme, page: PageBox) -> Self {
        MetricMeasurer { theme, page }
    }

    /// Positions every element of `document` with body text at `scale` points.
    pub fn layout(&self, document: &ComposedDocument, scale: f32) -> PageLayout {
        let mut writer = LayoutWriter {
            metrics: get_metrics(self.theme.font),
            left: PAD_X,
            width: self.page.width_px - 2.0 * PAD_X,
            y: PAD_TOP,
            texts: Vec::new(),
            rules: Vec::new(),
        };

        if document.is_placeholder() {
            writer.placeholder();
        } else {
            if let Some(header) = &document.header {
                writer.header(&header.name, &header.contacts, &self.theme);
            }
            for section in &document.sections {
                writer.section(section, scale);
            }
        }

        PageLayout {
            page: self.page,
            font: self.theme.font,
            scale,
            content_height: writer.y + PAD_BOTTOM,
            texts: writer.texts,
            rules: writer.rules,
        }
    }
}

impl Measure for MetricMeasurer {
    fn measure(&self, document: &ComposedDocument, scale: f32) -> f32 {
        self.layout(document, scale).content_height
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Layout writer
// ────────────────────────────────────────────────────────────────────────────

/// Cursor over the page content box. `y` is the top of the next line box.
struct LayoutWriter {
    metrics: &'static FontMetricTable,
    left: f32,
    width: f32,
    y: f32,
    texts: Vec<PlacedText>,
    rules: Vec<PlacedRule>,
}

/// One measured run on a line being assembled.
struct Run {
    text: String,
    glyphs: GlyphSet,
    width: f32,
    colour: Colour,
    href: Option<String>,
}

impl LayoutWriter {
    fn em_px(size_pt: f32) -> f32 {
        pt_to_px(size_pt)
    }

    fn text_width(&self, text: &str, face: FontFace, size_pt: f32) -> f32 {
        self.metrics.measure_str(text, face) * Self::em_px(size_pt)
    }

    fn baseline_in_box(&self, size_pt: f32, line_height: f32) -> f32 {
        let size_px = Self::em_px(size_pt);
        self.y + (size_px * line_height - size_px) / 2.0 + size_px * ASCENT
    }

    #[allow(clippy::too_many_arguments)]
    fn place(
        &mut self,
        x: f32,
        baseline: f32,
        size_pt: f32,
        glyphs: GlyphSet,
        text: String,
        colour: Colour,
        href: Option<String>,
    ) {
        self.texts.push(PlacedText {
            x,
            baseline,
            size_pt,
            glyphs,
            text,
            colour,
            href,
        });
    }

    /// Wraps `text` into `width` starting at `x` and advances past every line.
    #[allow(clippy::too_many_arguments)]
    fn paragraph(
        &mut self,
        text: &str,
        x: f32,
        width: f32,
        size_pt: f32,
        line_height: f32,
        face: FontFace,
        colour: Colour,
    ) {
        let width_em = width / Self::em_px(size_pt);
        for line in self.metrics.wrap(text, face, width_em) {
            let baseline = self.baseline_in_box(size_pt, line_height);
            self.place(x, baseline, size_pt, GlyphSet::Text(face), line, colour, None);
            self.y += Self::em_px(size_pt) * line_height;
        }
    }

    /// A bold inline label followed by wrapped regular text.
    fn labelled(&mut self, label: &str, value: &str, x: f32, width: f32, size_pt: f32) {
        let em = Self::em_px(size_pt);
        let label_text = format!("{label}: ");
        let label_w = self.text_width(&label_text, FontFace::Bold, size_pt);
        let lines = self.metrics.wrap_hanging(
            value,
            FontFace::Regular,
            (width - label_w).max(0.0) / em,
            width / em,
        );

        let baseline = self.baseline_in_box(size_pt, LINE_HEIGHT);
        self.place(
            x,
            baseline,
            size_pt,
            GlyphSet::Text(FontFace::Bold),
            label_text,
            Colour::BLACK,
            None,
        );
        if lines.is_empty() {
            self.y += em * LINE_HEIGHT;
        }
        for (i, line) in lines.into_iter().enumerate() {
            let baseline = self.baseline_in_box(size_pt, LINE_HEIGHT);
            let line_x = if i == 0 { x + label_w } else { x };
            self.place(
                line_x,
                baseline,
                size_pt,
                GlyphSet::Text(FontFace::Regular),
                line,
                Colour::BLACK,
                None,
            );
            self.y += em * LINE_HEIGHT;
        }
    }

    fn centered(&mut self, text: &str, size_pt: f32, face: FontFace, colour: Colour) {
        let width_em = self.width / Self::em_px(size_pt);
        for line in self.metrics.wrap(text, face, width_em) {
            let line_w = self.text_width(&line, face, size_pt);
            let x = self.left + (self.width - line_w) / 2.0;
            let baseline = self.baseline_in_box(size_pt, LINE_HEIGHT);
            self.place(x, baseline, size_pt, GlyphSet::Text(face), line, colour, None);
            self.y += Self::em_px(size_pt) * LINE_HEIGHT;
        }
    }

    fn placeholder(&mut self) {
        let block_top = self.y;
        let title_h = Self::em_px(PLACEHOLDER_TITLE_PT) * LINE_HEIGHT;
        let hint_h = Self::em_px(PLACEHOLDER_HINT_PT) * LINE_HEIGHT;
        self.y = block_top + (PLACEHOLDER_HEIGHT - title_h - PLACEHOLDER_HINT_GAP - hint_h) / 2.0;

        self.centered(
            "Start filling in the form",
            PLACEHOLDER_TITLE_PT,
            FontFace::Bold,
            Colour::MUTED,
        );
        self.y += PLACEHOLDER_HINT_GAP;
        self.centered(
            "Your resume preview will appear here",
            PLACEHOLDER_HINT_PT,
            FontFace::Regular,
            Colour::MUTED,
        );
        self.y = block_top + PLACEHOLDER_HEIGHT;
    }

    fn header(&mut self, name: &str, contacts: &[ContactItem], theme: &RenderTheme) {
        self.centered(&name.to_uppercase(), NAME_PT, FontFace::Bold, theme.accent);
        self.y += NAME_GAP;

        let separator = theme.separator.to_string();
        let (separator_glyphs, separator_width) = if theme.separator == SYMBOL_SEPARATOR {
            (
                GlyphSet::Separator,
                SEPARATOR_WIDTH_EM * Self::em_px(CONTACT_PT),
            )
        } else {
            (
                GlyphSet::Text(FontFace::Regular),
                self.text_width(&separator, FontFace::Regular, CONTACT_PT),
            )
        };

        let mut runs = Vec::with_capacity(contacts.len() * 2);
        for (i, contact) in contacts.iter().enumerate() {
            if i > 0 {
                runs.push(Run {
                    text: separator.clone(),
                    glyphs: separator_glyphs,
                    width: separator_width,
                    colour: Colour::BLACK,
                    href: None,
                });
            }
            runs.push(Run {
                width: self.text_width(&contact.text, FontFace::Regular, CONTACT_PT),
                text: contact.text.clone(),
                glyphs: GlyphSet::Text(FontFace::Regular),
                colour: if contact.href.is_some() {
                    Colour::LINK
                } else {
                    Colour::BLACK
                },
                href: contact.href.clone(),
            });
        }
        self.centered_rows(runs, CONTACT_PT);
        self.y += HEADER_GAP;
    }

    /// Flex-wrap of runs into centered rows.
    fn centered_rows(&mut self, runs: Vec<Run>, size_pt: f32) {
        let mut rows: Vec<Vec<Run>> = Vec::new();
        let mut row_width = 0.0_f32;
        for run in runs {
            let needed = match rows.last() {
                Some(row) if !row.is_empty() => row_width + CONTACT_GAP_X + run.width,
                _ => run.width,
            };
            if rows.is_empty() || (needed > self.width && !rows[rows.len() - 1].is_empty()) {
                row_width = run.width;
                rows.push(vec![run]);
            } else {
                row_width = needed;
                if let Some(row) = rows.last_mut() {
                    row.push(run);
                }
            }
        }

        let row_h = Self::em_px(size_pt) * LINE_HEIGHT;
        for (i, row) in rows.into_iter().enumerate() {
            if i > 0 {
                self.y += CONTACT_GAP_Y;
            }
            let total: f32 = row.iter().map(|r| r.width).sum::<f32>()
                + CONTACT_GAP_X * row.len().saturating_sub(1) as f32;
            let mut x = self.left + (self.width - total) / 2.0;
            let baseline = self.baseline_in_box(size_pt, LINE_HEIGHT);
            for run in row {
                let width = run.width;
                self.place(x, baseline, size_pt, run.glyphs, run.text, run.colour, run.href);
                x += width + CONTACT_GAP_X;
            }
            self.y += row_h;
        }
    }

    fn section_title(&mut self, title: &str) {
        self.y += TITLE_MARGIN_TOP;
        let baseline = self.baseline_in_box(TITLE_PT, LINE_HEIGHT);
        self.place(
            self.left,
            baseline,
            TITLE_PT,
            GlyphSet::Text(FontFace::Bold),
            title.to_uppercase(),
            Colour::BLACK,
            None,
        );
        self.y += Self::em_px(TITLE_PT) * LINE_HEIGHT + TITLE_RULE_PAD;
        self.rules.push(PlacedRule {
            x1: self.left,
            x2: self.left + self.width,
            y: self.y + TITLE_RULE_WIDTH / 2.0,
            width: TITLE_RULE_WIDTH,
        });
        self.y += TITLE_RULE_WIDTH + TITLE_MARGIN_BOTTOM;
    }

    fn section(&mut self, section: &Section, scale: f32) {
        self.section_title(section.title());
        match section {
            Section::Summary { text } => {
                self.paragraph(
                    text,
                    self.left,
                    self.width,
                    scale,
                    SUMMARY_LINE_HEIGHT,
                    FontFace::Regular,
                    Colour::BLACK,
                );
            }
            Section::Education { entries } => {
                for entry in entries {
                    self.education(entry, scale);
                }
            }
            Section::Skills { lines } => {
                for (i, line) in lines.iter().enumerate() {
                    if i > 0 {
                        self.y += SKILL_GAP;
                    }
                    self.labelled(line.label, &line.value, self.left, self.width, SKILLS_PT);
                }
            }
            Section::Projects { entries } => {
                for entry in entries {
                    self.project(entry, scale);
                }
            }
            Section::Achievements { items } => {
                for item in items {
                    self.bullet(item, scale, FontFace::Regular, Colour::BLACK, None);
                }
            }
        }
        self.y += SECTION_GAP;
    }

    fn education(&mut self, entry: &EducationItem, scale: f32) {
        let em = Self::em_px(scale);
        let date_w = entry
            .dates
            .as_deref()
            .map(|d| self.text_width(d, FontFace::Regular, scale))
            .unwrap_or(0.0);
        let heading_w = if entry.dates.is_some() {
            (self.width - date_w - DATE_GAP).max(0.0)
        } else {
            self.width
        };

        if let Some(dates) = &entry.dates {
            let baseline = self.baseline_in_box(scale, LINE_HEIGHT);
            self.place(
                self.left + self.width - date_w,
                baseline,
                scale,
                GlyphSet::Text(FontFace::Regular),
                dates.clone(),
                Colour::BLACK,
                None,
            );
        }
        let before = self.y;
        self.paragraph(
            &entry.heading,
            self.left,
            heading_w,
            scale,
            LINE_HEIGHT,
            FontFace::Bold,
            Colour::BLACK,
        );
        if self.y == before {
            self.y += em * LINE_HEIGHT;
        }
        if let Some(gpa) = &entry.gpa {
            self.paragraph(
                gpa,
                self.left,
                self.width,
                scale,
                LINE_HEIGHT,
                FontFace::Italic,
                Colour::BLACK,
            );
        }
        self.y += EDUCATION_GAP;
    }

    fn project(&mut self, entry: &ProjectItem, scale: f32) {
        self.paragraph(
            &entry.title,
            self.left,
            self.width,
            scale,
            LINE_HEIGHT,
            FontFace::Bold,
            Colour::BLACK,
        );
        self.y += PROJECT_TITLE_GAP;

        for bullet in &entry.bullets {
            self.bullet(bullet, scale, FontFace::Regular, Colour::BLACK, None);
        }
        if let Some(tech) = &entry.tech_stack {
            self.bullet(tech, scale, FontFace::Italic, Colour::BLACK, None);
        }
        for link in &entry.links {
            let text = format!("{}: {}", link.label, link.href);
            self.bullet(&text, scale, FontFace::Regular, Colour::LINK, Some(link.href.clone()));
        }
        self.y += PROJECT_GAP;
    }

    fn bullet(
        &mut self,
        text: &str,
        size_pt: f32,
        face: FontFace,
        colour: Colour,
        href: Option<String>,
    ) {
        let baseline = self.baseline_in_box(size_pt, LINE_HEIGHT);
        self.place(
            self.left + BULLET_OFFSET,
            baseline,
            size_pt,
            GlyphSet::Text(FontFace::Regular),
            "•".to_string(),
            Colour::BLACK,
            None,
        );

        let first = self.texts.len();
        self.paragraph(
            text,
            self.left + LIST_INDENT,
            self.width - LIST_INDENT,
            size_pt,
            LINE_HEIGHT,
            face,
            colour,
        );
        if let Some(href) = href {
            for placed in &mut self.texts[first..] {
                placed.href = Some(href.clone());
            }
        }
        self.y += ITEM_GAP;
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Tests
// ────────────────────────────────────────────────────────────────────────────
