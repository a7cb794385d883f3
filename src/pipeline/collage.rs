//! Collage composition: paste nine cards onto a white canvas in a 3x3 grid.
//!
//! Slots are filled row-major: list position `idx` lands in row `idx / 3`,
//! column `idx % 3`, at pixel offset `(col * cell_width, row * cell_height)`.
//! Cards are pasted unscaled, so each must already be exactly one cell.

use crate::error::CardCollageError;
use crate::geometry::{cell_size_px, collage_size_px, GRID_COLS};
use image::{Rgb, RgbImage};
use std::path::Path;
use tracing::debug;

const BACKGROUND: Rgb<u8> = Rgb([255, 255, 255]);

/// Where the card at one list position goes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Slot {
    /// 0-based list position.
    pub position: usize,
    pub row: u32,
    pub col: u32,
    pub x: u32,
    pub y: u32,
}

/// Grid placement for `count` list positions.
pub fn slots(count: usize) -> Vec<Slot> {
    let (cell_w, cell_h) = cell_size_px();
    (0..count)
        .map(|position| {
            let row = position as u32 / GRID_COLS;
            let col = position as u32 % GRID_COLS;
            Slot {
                position,
                row,
                col,
                x: col * cell_w,
                y: row * cell_h,
            }
        })
        .collect()
}

/// A blank collage canvas.
pub fn blank_canvas() -> RgbImage {
    let (w, h) = collage_size_px();
    RgbImage::from_pixel(w, h, BACKGROUND)
}

/// Paste `card` into `slot` on `canvas`.
///
/// `source` only names the card in the error when its size is wrong.
pub fn place_card(
    canvas: &mut RgbImage,
    card: &RgbImage,
    slot: &Slot,
    source: &Path,
) -> Result<(), CardCollageError> {
    let expected = cell_size_px();
    if card.dimensions() != expected {
        return Err(CardCollageError::CardSizeMismatch {
            path: source.to_path_buf(),
            expected,
            actual: card.dimensions(),
        });
    }

    image::imageops::replace(canvas, card, slot.x as i64, slot.y as i64);
    debug!(
        "Placed {} at ({}, {}) → +{}+{}",
        source.display(),
        slot.col,
        slot.row,
        slot.x,
        slot.y
    );
    Ok(())
}

/// Build a full collage from already-loaded cards, in slot order.
pub fn compose<'a, I>(cards: I) -> Result<RgbImage, CardCollageError>
where
    I: IntoIterator<Item = (&'a RgbImage, &'a Path)>,
{
    let mut canvas = blank_canvas();
    let cards: Vec<_> = cards.into_iter().collect();
    for (slot, (card, source)) in slots(cards.len()).iter().zip(cards) {
        place_card(&mut canvas, card, slot, source)?;
    }
    Ok(canvas)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn solid_card(shade: u8) -> RgbImage {
        let (w, h) = cell_size_px();
        RgbImage::from_pixel(w, h, Rgb([shade, shade, shade]))
    }

    #[test]
    fn slots_are_row_major() {
        let s = slots(9);
        let coords: Vec<(u32, u32)> = s.iter().map(|s| (s.row, s.col)).collect();
        assert_eq!(
            coords,
            vec![(0, 0), (0, 1), (0, 2), (1, 0), (1, 1), (1, 2), (2, 0), (2, 1), (2, 2)]
        );
    }

    #[test]
    fn slot_offsets_are_cell_multiples() {
        for slot in slots(9) {
            assert_eq!(slot.x % 750, 0);
            assert_eq!(slot.y % 1050, 0);
            assert_eq!(slot.x, slot.col * 750);
            assert_eq!(slot.y, slot.row * 1050);
        }
        let last = slots(9)[8];
        assert_eq!((last.x, last.y), (1500, 2100));
    }

    #[test]
    fn blank_canvas_is_white_and_full_size() {
        let canvas = blank_canvas();
        assert_eq!(canvas.dimensions(), (2250, 3150));
        assert_eq!(canvas.get_pixel(0, 0), &BACKGROUND);
        assert_eq!(canvas.get_pixel(2249, 3149), &BACKGROUND);
    }

    #[test]
    fn compose_places_each_card_in_its_cell() {
        let cards: Vec<RgbImage> = (0..9).map(|i| solid_card(i * 20)).collect();
        let path = Path::new("card.png");
        let canvas = compose(cards.iter().map(|c| (c, path))).unwrap();

        assert_eq!(canvas.dimensions(), (2250, 3150));
        for slot in slots(9) {
            let shade = slot.position as u8 * 20;
            let centre = canvas.get_pixel(slot.x + 375, slot.y + 525);
            assert_eq!(centre, &Rgb([shade, shade, shade]), "slot {}", slot.position);
        }
    }

    #[test]
    fn partial_collage_leaves_background() {
        let card = solid_card(0);
        let path = Path::new("card.png");
        let canvas = compose([(&card, path)]).unwrap();

        assert_eq!(canvas.get_pixel(10, 10), &Rgb([0, 0, 0]));
        assert_eq!(canvas.get_pixel(760, 10), &BACKGROUND);
    }

    #[test]
    fn wrong_size_card_is_rejected() {
        let small = RgbImage::new(700, 1000);
        let mut canvas = blank_canvas();
        let err = place_card(&mut canvas, &small, &slots(1)[0], Path::new("card_05.png"))
            .unwrap_err();
        match err {
            CardCollageError::CardSizeMismatch {
                expected, actual, ..
            } => {
                assert_eq!(expected, (750, 1050));
                assert_eq!(actual, (700, 1000));
            }
            other => panic!("unexpected error: {other}"),
        }
    }
}
