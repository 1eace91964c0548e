//! Fit-to-page renderer: compose, fit, then lay out the page at the chosen scale.
//!
//! `Renderer::render` is CPU-bound; async callers run it inside
//! `tokio::task::spawn_blocking`.

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::layout::compose::{compose, ComposedDocument};
use crate::layout::fit::{fit_to_page, FitOptions, FitOptionsError, FitOutcome};
use crate::layout::font_metrics::FontFamily;
use crate::layout::measure::{Colour, MetricMeasurer, PageLayout};
use crate::layout::page::PageBox;
use crate::models::Record;

/// Contact separator drawn from the Symbol font.
pub const SYMBOL_SEPARATOR: char = '◊';

/// Presentation choices that never live on the Record.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RenderTheme {
    pub font: FontFamily,
    /// Colour of the name in the header.
    pub accent: Colour,
    pub separator: char,
}

impl Default for RenderTheme {
    fn default() -> Self {
        RenderTheme {
            font: FontFamily::Times,
            accent: Colour::NAVY,
            separator: SYMBOL_SEPARATOR,
        }
    }
}

/// A Record rendered onto one page.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RenderedPage {
    pub document: ComposedDocument,
    pub outcome: FitOutcome,
    pub layout: PageLayout,
}

#[derive(Debug, Clone)]
pub struct Renderer {
    measurer: MetricMeasurer,
    options: FitOptions,
}

impl Renderer {
    /// Fails when `options` cannot be honoured on `page`.
    pub fn new(theme: RenderTheme, page: PageBox, options: FitOptions) -> Result<Self, FitOptionsError> {
        options.validate(&page)?;
        Ok(Renderer {
            measurer: MetricMeasurer::new(theme, page),
            options,
        })
    }

    pub fn render(&self, record: &Record) -> RenderedPage {
        let document = compose(record);
        let outcome = fit_to_page(&document, &self.measurer, &self.measurer.page, &self.options);

        debug!(
            scale = outcome.scale,
            overflow = outcome.overflow,
            iterations = outcome.iterations,
            height = outcome.measured_height,
            "Page fit complete"
        );
        if outcome.overflow {
            warn!(
                height = outcome.measured_height,
                limit = self.options.height_limit(&self.measurer.page),
                "Content overflows the page at minimum scale"
            );
        }

        let layout = self.measurer.layout(&document, outcome.scale);
        RenderedPage {
            document,
            outcome,
            layout,
        }
    }
}

impl Default for Renderer {
    fn default() -> Self {
        Renderer {
            measurer: MetricMeasurer::new(RenderTheme::default(), PageBox::A4),
            options: FitOptions::default(),
        }
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Tests
// ────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ProjectEntry;

    #[test]
    fn test_rejects_invalid_options() {
        let options = FitOptions {
            min_scale: 12.0,
            ..FitOptions::default()
        };
        assert!(Renderer::new(RenderTheme::default(), PageBox::A4, options).is_err());
    }

    #[test]
    fn test_short_record_renders_at_max_scale() {
        let mut record = Record::template();
        record.personal_info.full_name = "Jane Doe".to_string();
        let page = Renderer::default().render(&record);
        assert_eq!(page.outcome.scale, 10.0);
        assert!(!page.outcome.overflow);
        assert_eq!(page.layout.scale, 10.0);
        assert_eq!(page.layout.content_height, page.outcome.measured_height);
    }

    #[test]
    fn test_overflowing_record_is_untouched() {
        let mut record = Record::template();
        record.personal_info.full_name = "Jane Doe".to_string();
        record.projects = (0..40)
            .map(|i| ProjectEntry {
                title: format!("Project {i}"),
                description: "One. Two. Three. Four. Five. Six. Seven. Eight.".to_string(),
                technologies: "Rust".to_string(),
                ..ProjectEntry::default()
            })
            .collect();
        let before = record.clone();

        let page = Renderer::default().render(&record);
        assert_eq!(page.outcome.scale, 7.0);
        assert!(page.outcome.overflow);
        assert_eq!(record, before);
        let Some(crate::layout::compose::Section::Projects { entries }) = page.document.sections.first() else {
            panic!("expected projects section");
        };
        assert_eq!(entries.len(), 40, "overflow never truncates content");
    }

    #[test]
    fn test_helvetica_theme_flows_into_layout() {
        let theme = RenderTheme {
            font: FontFamily::Helvetica,
            ..RenderTheme::default()
        };
        let renderer = Renderer::new(theme, PageBox::A4, FitOptions::default()).unwrap();
        let page = renderer.render(&Record::template());
        assert_eq!(page.layout.font, FontFamily::Helvetica);
        assert!(page.document.is_placeholder());
    }
}
