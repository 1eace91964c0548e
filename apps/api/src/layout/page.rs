//! Physical page box. All layout coordinates are CSS pixels at 96 dpi with the origin
//! at the top-left corner.

use serde::{Deserialize, Serialize};

/// Pixels per typographic point (96 dpi / 72 pt per inch).
pub const PX_PER_PT: f32 = 96.0 / 72.0;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageBox {
    pub width_px: f32,
    pub height_px: f32,
}

impl PageBox {
    /// A4, 210 × 297 mm.
    pub const A4: PageBox = PageBox {
        width_px: 794.0,
        height_px: 1122.0,
    };

    pub fn width_pt(&self) -> f32 {
        self.width_px / PX_PER_PT
    }

    pub fn height_pt(&self) -> f32 {
        self.height_px / PX_PER_PT
    }
}

impl Default for PageBox {
    fn default() -> Self {
        PageBox::A4
    }
}

pub fn pt_to_px(pt: f32) -> f32 {
    pt * PX_PER_PT
}

pub fn px_to_pt(px: f32) -> f32 {
    px / PX_PER_PT
}
