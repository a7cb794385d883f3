//! Card splitting: cut the source sheet into equal-width slices.
//!
//! The sheet holds every card side by side in a single row. Each slice is
//! `floor(sheet_width / card_count)` wide and the full sheet height. When the
//! width does not divide evenly, the rightmost `sheet_width % card_count`
//! columns are left out; they are never spread across the cards.
//!
//! Each slice is then resampled with Lanczos3 to the print size, whatever the
//! sheet's own resolution, so a low-res sheet is upscaled and a high-res one
//! downscaled without aliasing.

use crate::error::CardCollageError;
use crate::output::SheetSlicing;
use image::imageops::FilterType;
use image::DynamicImage;
use tracing::debug;

/// The axis-aligned slice of the sheet one card is cut from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CropRegion {
    /// 1-based card index.
    pub index: usize,
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

impl CropRegion {
    /// Exclusive right edge.
    pub fn right(&self) -> u32 {
        self.x + self.width
    }
}

/// Work out the per-card slice size for a sheet.
///
/// # Errors
/// [`CardCollageError::SheetTooNarrow`] when the sheet has fewer columns
/// than cards, since every card needs at least one column.
pub fn slice_sheet(
    sheet_width: u32,
    sheet_height: u32,
    card_count: u32,
) -> Result<SheetSlicing, CardCollageError> {
    if card_count == 0 || sheet_width < card_count {
        return Err(CardCollageError::SheetTooNarrow {
            width: sheet_width,
            cards: card_count,
        });
    }

    let card_width = sheet_width / card_count;
    let consumed_width = card_width * card_count;

    Ok(SheetSlicing {
        sheet_width,
        sheet_height,
        card_width,
        card_height: sheet_height,
        consumed_width,
        discarded_columns: sheet_width - consumed_width,
    })
}

/// Crop rectangles for every card, left to right.
pub fn crop_regions(slicing: &SheetSlicing) -> Vec<CropRegion> {
    let count = slicing.consumed_width / slicing.card_width;
    (0..count)
        .map(|i| CropRegion {
            index: i as usize + 1,
            x: i * slicing.card_width,
            y: 0,
            width: slicing.card_width,
            height: slicing.card_height,
        })
        .collect()
}

/// Crop one card out of the sheet and resample it to `target` pixels.
pub fn cut_card(sheet: &DynamicImage, region: &CropRegion, target: (u32, u32)) -> DynamicImage {
    debug!(
        "Card {:02}: crop [{}, {}, {}, {}] → {}x{}",
        region.index,
        region.x,
        region.y,
        region.right(),
        region.y + region.height,
        target.0,
        target.1
    );
    sheet
        .crop_imm(region.x, region.y, region.width, region.height)
        .resize_exact(target.0, target.1, FilterType::Lanczos3)
}
