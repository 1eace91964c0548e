// Fit-to-page rendering: section composition, font-metric page simulation, auto-fit.
// Renderer::render is CPU-bound and must run inside tokio::task::spawn_blocking.

pub mod compose;
pub mod fit;
pub mod font_metrics;
pub mod measure;
pub mod page;
pub mod render;

// Re-export the public API consumed by other modules (session, export, handlers).
pub use compose::ComposedDocument;
pub use fit::{FitOptions, FitOutcome};
pub use font_metrics::{FontFace, FontFamily};
pub use measure::{Colour, GlyphSet, PageLayout, PlacedText};
pub use page::PageBox;
pub use render::{RenderTheme, RenderedPage, Renderer};
