//! Print geometry: DPI, inch, pixel and point conversions.
//!
//! All physical sizes are stated in inches and converted on demand: to
//! pixels at [`DPI`] for raster stages, to PostScript points (72/in) for the
//! PDF stage. Pixel conversion truncates, so 7.5 in at 300 DPI is 2250 px.
//!
//! The layout is fixed: one letter page, a 3x3 grid of poker-size cards.

use serde::{Deserialize, Serialize};

/// Print resolution for every raster the pipeline writes.
pub const DPI: u32 = 300;

/// PostScript points per inch.
pub const POINTS_PER_INCH: f32 = 72.0;

/// Number of cards laid out in a single row on the source sheet.
pub const CARD_COUNT: u32 = 28;

pub const CARD_WIDTH_IN: f32 = 2.5;
pub const CARD_HEIGHT_IN: f32 = 3.5;

// Grid layout: 3x3 cards per collage
pub const GRID_COLS: u32 = 3;
pub const GRID_ROWS: u32 = 3;
pub const SLOTS_PER_COLLAGE: usize = (GRID_COLS * GRID_ROWS) as usize;

pub const COLLAGE_WIDTH_IN: f32 = 7.5;
pub const COLLAGE_HEIGHT_IN: f32 = 10.5;

// US letter
pub const PAGE_WIDTH_IN: f32 = 8.5;
pub const PAGE_HEIGHT_IN: f32 = 11.0;

pub const MARGIN_LEFT_IN: f32 = 0.5;
pub const MARGIN_RIGHT_IN: f32 = 0.5;
pub const MARGIN_TOP_IN: f32 = 0.25;
pub const MARGIN_BOTTOM_IN: f32 = 0.25;

/// Stroke width of the cut-guide lines, in points.
pub const CUT_LINE_WIDTH_PT: f32 = 0.5;

const METERS_PER_INCH: f64 = 0.0254;

/// Convert a physical length to whole pixels, truncating.
pub fn inches_to_px(inches: f32, dpi: u32) -> u32 {
    (inches * dpi as f32) as u32
}

pub fn inches_to_pt(inches: f32) -> f32 {
    inches * POINTS_PER_INCH
}

/// Target size of every card image, in pixels.
pub fn card_size_px() -> (u32, u32) {
    (
        inches_to_px(CARD_WIDTH_IN, DPI),
        inches_to_px(CARD_HEIGHT_IN, DPI),
    )
}

/// Canvas size of every collage image, in pixels.
pub fn collage_size_px() -> (u32, u32) {
    (
        inches_to_px(COLLAGE_WIDTH_IN, DPI),
        inches_to_px(COLLAGE_HEIGHT_IN, DPI),
    )
}

/// Size of one grid cell on the collage canvas, in pixels.
///
/// Derived from the canvas rather than the card so that a mismatch between
/// the two shows up as a size error instead of a silent overlap.
pub fn cell_size_px() -> (u32, u32) {
    let (w, h) = collage_size_px();
    (w / GRID_COLS, h / GRID_ROWS)
}

/// PNG stores density as pixels per metre; 300 DPI is 11811 px/m.
pub fn dpi_to_pixels_per_meter(dpi: u32) -> u32 {
    (dpi as f64 / METERS_PER_INCH).round() as u32
}

pub fn pixels_per_meter_to_dpi(ppm: u32) -> u32 {
    (ppm as f64 * METERS_PER_INCH).round() as u32
}

/// Page layout in PDF points, origin at the bottom-left corner, Y up.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PageGeometry {
    pub page_width: f32,
    pub page_height: f32,
    pub margin_left: f32,
    pub margin_bottom: f32,
    pub collage_width: f32,
    pub collage_height: f32,
    pub line_width: f32,
}

impl PageGeometry {
    /// Letter page, 0.5 in side margins, 0.25 in top/bottom margins.
    pub fn letter() -> Self {
        Self {
            page_width: inches_to_pt(PAGE_WIDTH_IN),
            page_height: inches_to_pt(PAGE_HEIGHT_IN),
            margin_left: inches_to_pt(MARGIN_LEFT_IN),
            margin_bottom: inches_to_pt(MARGIN_BOTTOM_IN),
            collage_width: inches_to_pt(COLLAGE_WIDTH_IN),
            collage_height: inches_to_pt(COLLAGE_HEIGHT_IN),
            line_width: CUT_LINE_WIDTH_PT,
        }
    }

    pub fn cell_width(&self) -> f32 {
        self.collage_width / GRID_COLS as f32
    }

    pub fn cell_height(&self) -> f32 {
        self.collage_height / GRID_ROWS as f32
    }
}

impl Default for PageGeometry {
    fn default() -> Self {
        Self::letter()
    }
}
