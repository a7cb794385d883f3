//! PNG encoding with a print-density tag.
//!
//! Card and collage images carry a `pHYs` chunk so that any viewer or print
//! dialog sizes them physically (750 px at 300 DPI is 2.5 in). `image`'s own
//! `save` never writes that chunk, so the raster is handed to the `png`
//! encoder directly.

use crate::error::CardCollageError;
use crate::geometry::{dpi_to_pixels_per_meter, pixels_per_meter_to_dpi};
use image::DynamicImage;
use std::fs::File;
use std::io::{BufReader, BufWriter, Read, Write};
use std::path::Path;
use tracing::debug;

/// Encode `img` as an 8-bit PNG tagged with `dpi` on both axes.
///
/// Images with an alpha channel are written as RGBA, everything else as RGB.
pub fn encode_png<W: Write>(writer: W, img: &DynamicImage, dpi: u32) -> Result<(), png::EncodingError> {
    let (color, data) = if img.color().has_alpha() {
        (png::ColorType::Rgba, img.to_rgba8().into_raw())
    } else {
        (png::ColorType::Rgb, img.to_rgb8().into_raw())
    };

    let ppm = dpi_to_pixels_per_meter(dpi);
    let mut encoder = png::Encoder::new(writer, img.width(), img.height());
    encoder.set_color(color);
    encoder.set_depth(png::BitDepth::Eight);
    encoder.set_pixel_dims(Some(png::PixelDimensions {
        xppu: ppm,
        yppu: ppm,
        unit: png::Unit::Meter,
    }));

    let mut png_writer = encoder.write_header()?;
    png_writer.write_image_data(&data)?;
    png_writer.finish()
}

/// Write `img` to `path` as a DPI-tagged PNG.
pub fn save_png(img: &DynamicImage, path: &Path, dpi: u32) -> Result<(), CardCollageError> {
    let to_err = |detail: String| CardCollageError::ImageEncode {
        path: path.to_path_buf(),
        detail,
    };

    let file = File::create(path).map_err(|e| to_err(e.to_string()))?;
    let mut out = BufWriter::new(file);
    encode_png(&mut out, img, dpi).map_err(|e| to_err(e.to_string()))?;
    out.flush().map_err(|e| to_err(e.to_string()))?;

    debug!(
        "Wrote {}x{} px @ {} DPI → {}",
        img.width(),
        img.height(),
        dpi,
        path.display()
    );
    Ok(())
}

/// Read the density tag of a PNG stream.
///
/// Returns `None` when the image has no `pHYs` chunk or its unit is not
/// metres (an aspect ratio only).
pub fn read_png_dpi<R: Read>(reader: R) -> Result<Option<u32>, png::DecodingError> {
    let reader = png::Decoder::new(reader).read_info()?;
    Ok(reader.info().pixel_dims.and_then(|dims| match dims.unit {
        png::Unit::Meter => Some(pixels_per_meter_to_dpi(dims.xppu)),
        png::Unit::Unspecified => None,
    }))
}

/// Read the density tag of a PNG file.
pub fn read_dpi(path: &Path) -> Result<Option<u32>, CardCollageError> {
    let file = File::open(path).map_err(|e| match e.kind() {
        std::io::ErrorKind::NotFound => CardCollageError::FileNotFound {
            path: path.to_path_buf(),
        },
        _ => CardCollageError::ImageDecode {
            path: path.to_path_buf(),
            source: image::ImageError::IoError(e),
        },
    })?;

    read_png_dpi(BufReader::new(file)).map_err(|e| CardCollageError::ImageDecode {
        path: path.to_path_buf(),
        source: image::ImageError::IoError(std::io::Error::new(
            std::io::ErrorKind::InvalidData,
            e.to_string(),
        )),
    })
}
