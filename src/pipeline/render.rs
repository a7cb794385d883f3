//! Page rendering: one collage per letter page, with cut-guide lines.
//!
//! The collage is embedded as a single image XObject and drawn into a fixed
//! 7.5x10.5 in box whose bottom-left corner sits on the left and bottom
//! margins. PDF user space has its origin at the bottom-left of the page with
//! Y pointing up, so "bottom margin" is a plain Y offset.
//!
//! Cut guides run edge to edge across the whole page, through the margins,
//! so they remain visible after the card area is trimmed:
//!
//! ```text
//!  x = 36   216   396   576          (points)
//!      │     │     │     │
//!  ────┼─────┼─────┼─────┼────  y = 774
//!      │     │     │     │
//!  ────┼─────┼─────┼─────┼────  y = 522
//!      │     │     │     │
//!  ────┼─────┼─────┼─────┼────  y = 270
//!      │     │     │     │
//!  ────┼─────┼─────┼─────┼────  y = 18
//!      │     │     │     │
//! ```

use crate::error::CardCollageError;
use crate::geometry::{PageGeometry, GRID_COLS, GRID_ROWS};
use flate2::write::ZlibEncoder;
use flate2::Compression;
use image::RgbImage;
use lopdf::content::{Content, Operation};
use lopdf::{dictionary, Document, Object, Stream};
use serde::{Deserialize, Serialize};
use std::io::Write;
use tracing::debug;

/// Resource name the collage image is registered under on every page.
pub const IMAGE_NAME: &str = "Collage";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Orientation {
    Vertical,
    Horizontal,
}

/// A straight cut guide, in points.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CutLine {
    pub orientation: Orientation,
    /// X of a vertical line, Y of a horizontal one.
    pub offset: f32,
    /// Start of the span along the other axis.
    pub from: f32,
    /// End of the span along the other axis.
    pub to: f32,
}

impl CutLine {
    /// `((x0, y0), (x1, y1))`.
    pub fn endpoints(&self) -> ((f32, f32), (f32, f32)) {
        match self.orientation {
            Orientation::Vertical => ((self.offset, self.from), (self.offset, self.to)),
            Orientation::Horizontal => ((self.from, self.offset), (self.to, self.offset)),
        }
    }
}

/// Grid boundaries of the collage box, each extended across the full page.
///
/// `GRID_COLS + 1` vertical lines followed by `GRID_ROWS + 1` horizontal
/// ones, each group in increasing order.
pub fn cut_lines(g: &PageGeometry) -> Vec<CutLine> {
    let vertical = (0..=GRID_COLS).map(|k| CutLine {
        orientation: Orientation::Vertical,
        offset: g.margin_left + k as f32 * g.cell_width(),
        from: 0.0,
        to: g.page_height,
    });
    let horizontal = (0..=GRID_ROWS).map(|k| CutLine {
        orientation: Orientation::Horizontal,
        offset: g.margin_bottom + k as f32 * g.cell_height(),
        from: 0.0,
        to: g.page_width,
    });
    vertical.chain(horizontal).collect()
}

/// Content-stream operators for one page: the collage, then the guides.
pub fn page_operations(g: &PageGeometry) -> Vec<Operation> {
    let mut ops = vec![
        Operation::new("q", vec![]),
        Operation::new(
            "cm",
            vec![
                g.collage_width.into(),
                0_i64.into(),
                0_i64.into(),
                g.collage_height.into(),
                g.margin_left.into(),
                g.margin_bottom.into(),
            ],
        ),
        Operation::new("Do", vec![Object::Name(IMAGE_NAME.as_bytes().to_vec())]),
        Operation::new("Q", vec![]),
        // Solid black hairline
        Operation::new("RG", vec![0_i64.into(), 0_i64.into(), 0_i64.into()]),
        Operation::new("w", vec![g.line_width.into()]),
    ];

    for line in cut_lines(g) {
        let ((x0, y0), (x1, y1)) = line.endpoints();
        debug!("{:?} cut line at {} pt", line.orientation, line.offset);
        ops.push(Operation::new("m", vec![x0.into(), y0.into()]));
        ops.push(Operation::new("l", vec![x1.into(), y1.into()]));
        ops.push(Operation::new("S", vec![]));
    }

    ops
}

/// Wrap raw RGB pixels as a Flate-compressed image XObject.
pub fn image_xobject(img: &RgbImage) -> Result<Stream, CardCollageError> {
    let to_err = |e: std::io::Error| CardCollageError::PdfBuild {
        detail: format!("Image compression failed: {e}"),
    };

    let mut encoder = ZlibEncoder::new(Vec::new(), Compression::default());
    encoder.write_all(img.as_raw()).map_err(to_err)?;
    let data = encoder.finish().map_err(to_err)?;

    let dict = dictionary! {
        "Type" => "XObject",
        "Subtype" => "Image",
        "Width" => img.width() as i64,
        "Height" => img.height() as i64,
        "ColorSpace" => "DeviceRGB",
        "BitsPerComponent" => 8_i64,
        "Filter" => "FlateDecode",
    };
    Ok(Stream::new(dict, data))
}

/// Build a single-page document showing `img` inside the collage box, with
/// cut guides on top.
pub fn page_document(img: &RgbImage, g: &PageGeometry) -> Result<Document, CardCollageError> {
    let mut doc = Document::with_version("1.5");
    let pages_id = doc.new_object_id();

    let image_id = doc.add_object(image_xobject(img)?);

    let content = Content {
        operations: page_operations(g),
    };
    let encoded = content.encode().map_err(|e| CardCollageError::PdfBuild {
        detail: format!("Content stream encoding failed: {e}"),
    })?;
    let content_id = doc.add_object(Stream::new(dictionary! {}, encoded));

    let page_id = doc.add_object(dictionary! {
        "Type" => "Page",
        "Parent" => pages_id,
        "MediaBox" => vec![0_i64.into(), 0_i64.into(), g.page_width.into(), g.page_height.into()],
        "Contents" => content_id,
        "Resources" => dictionary! {
            "XObject" => dictionary! {
                IMAGE_NAME => image_id,
            },
        },
    });

    doc.objects.insert(
        pages_id,
        Object::Dictionary(dictionary! {
            "Type" => "Pages",
            "Kids" => vec![page_id.into()],
            "Count" => 1_i64,
        }),
    );

    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    doc.trailer.set("Root", catalog_id);

    debug!(
        "Page document: {}x{} px image in {}x{} pt box at ({}, {})",
        img.width(),
        img.height(),
        g.collage_width,
        g.collage_height,
        g.margin_left,
        g.margin_bottom
    );
    Ok(doc)
}
