//! Auto-fit. Picks the largest body size at which the page content fits on one page.
//!
//! # Rules
//! - Candidates run from `max_scale` down to `min_scale` in `step` decrements.
//! - Shrinking continues while the scale is above `min_scale` and the measured height
//!   exceeds `page height − margin_reserve`.
//! - If content still overflows at `min_scale` the loop stops; the caller is told via
//!   `FitOutcome::overflow` and content is never truncated.
//! - The result depends only on (content, options, measure); there is no hidden state.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::layout::compose::ComposedDocument;
use crate::layout::measure::Measure;
use crate::layout::page::PageBox;

/// Most shrink steps a single fit may take.
pub const MAX_FIT_STEPS: f32 = 1000.0;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FitOptions {
    pub max_scale: f32,
    pub min_scale: f32,
    pub step: f32,
    /// Pixels kept free at the bottom of the page.
    pub margin_reserve: f32,
}

impl Default for FitOptions {
    fn default() -> Self {
        FitOptions {
            max_scale: 10.0,
            min_scale: 7.0,
            step: 0.5,
            margin_reserve: 60.0,
        }
    }
}

#[derive(Debug, Error, PartialEq)]
pub enum FitOptionsError {
    #[error("fit step must be positive, got {0}")]
    NonPositiveStep(f32),
    #[error("minimum scale must be positive, got {0}")]
    NonPositiveMinScale(f32),
    #[error("maximum scale {max} is below minimum scale {min}")]
    InvertedRange { min: f32, max: f32 },
    #[error("scale range {min}..{max} at step {step} needs more than 1000 steps")]
    TooManySteps { min: f32, max: f32, step: f32 },
    #[error("margin reserve {reserve}px leaves no room on a {height}px page")]
    ReserveTooLarge { reserve: f32, height: f32 },
}

impl FitOptions {
    /// Rejects option sets the fit loop cannot honour.
    pub fn validate(&self, page: &PageBox) -> Result<(), FitOptionsError> {
        if !(self.step > 0.0) {
            return Err(FitOptionsError::NonPositiveStep(self.step));
        }
        if !(self.min_scale > 0.0) {
            return Err(FitOptionsError::NonPositiveMinScale(self.min_scale));
        }
        if self.max_scale < self.min_scale {
            return Err(FitOptionsError::InvertedRange {
                min: self.min_scale,
                max: self.max_scale,
            });
        }
        // Also rejects infinite and NaN bounds, which would never reach min_scale.
        if !((self.max_scale - self.min_scale) / self.step <= MAX_FIT_STEPS) {
            return Err(FitOptionsError::TooManySteps {
                min: self.min_scale,
                max: self.max_scale,
                step: self.step,
            });
        }
        if !(self.margin_reserve >= 0.0 && self.margin_reserve < page.height_px) {
            return Err(FitOptionsError::ReserveTooLarge {
                reserve: self.margin_reserve,
                height: page.height_px,
            });
        }
        Ok(())
    }

    /// Largest content height that still counts as fitting.
    pub fn height_limit(&self, page: &PageBox) -> f32 {
        page.height_px - self.margin_reserve
    }

    /// Candidate `k` of the descending sequence, clamped at `min_scale`.
    fn candidate(&self, k: u32) -> f32 {
        (self.max_scale - k as f32 * self.step).max(self.min_scale)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FitOutcome {
    pub scale: f32,
    /// Content exceeds the height limit even at the chosen scale.
    pub overflow: bool,
    pub measured_height: f32,
    /// Number of measurements taken.
    pub iterations: u32,
}

/// Shrinks body size from `max_scale` until the document fits or `min_scale` is reached.
///
/// Candidates are computed from the step index rather than by repeated subtraction,
/// so the sequence is exact for decimal steps.
pub fn fit_to_page(
    document: &ComposedDocument,
    measure: &dyn Measure,
    page: &PageBox,
    options: &FitOptions,
) -> FitOutcome {
    let limit = options.height_limit(page);
    let mut k = 0_u32;
    let mut scale = options.candidate(k);
    let mut height = measure.measure(document, scale);
    let mut iterations = 1;

    while scale > options.min_scale && height > limit {
        k += 1;
        scale = options.candidate(k);
        height = measure.measure(document, scale);
        iterations += 1;
    }

    FitOutcome {
        scale,
        overflow: height > limit,
        measured_height: height,
        iterations,
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Tests
// ────────────────────────────────────────────────────────────────────────────
