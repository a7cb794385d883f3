//! Error type for the card-collage library.
//!
//! Every stage is fail-fast: the first problem aborts the whole run and is
//! returned as a [`CardCollageError`]. Nothing is retried or recovered
//! locally, and outputs already written by earlier items stay on disk.
//!
//! Variants carry the offending path so the CLI can print a message that
//! points straight at the file to fix.

use std::path::PathBuf;
use thiserror::Error;

/// All fatal errors returned by the card-collage library.
#[derive(Debug, Error)]
pub enum CardCollageError {
    // ── Input errors ──────────────────────────────────────────────────────
    /// An input image or PDF was not found at the given path.
    #[error("Input file not found: '{path}'\nRun the earlier pipeline stages first, or check the path.")]
    FileNotFound { path: PathBuf },

    /// The file exists but could not be decoded as an image.
    #[error("Failed to decode image '{path}': {source}")]
    ImageDecode {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },

    /// A PDF exists but could not be parsed.
    #[error("Failed to load PDF '{path}': {detail}")]
    PdfLoad { path: PathBuf, detail: String },

    // ── Geometry errors ───────────────────────────────────────────────────
    /// The source sheet is too narrow to give every card at least one column.
    #[error("Source sheet is {width} px wide; at least {cards} px are needed to cut {cards} cards")]
    SheetTooNarrow { width: u32, cards: u32 },

    /// A card image does not match the collage cell size.
    #[error(
        "Card '{path}' is {}x{} px, expected {}x{} px\nRe-run the split stage to regenerate it.",
        .actual.0, .actual.1, .expected.0, .expected.1
    )]
    CardSizeMismatch {
        path: PathBuf,
        expected: (u32, u32),
        actual: (u32, u32),
    },

    // ── Output errors ─────────────────────────────────────────────────────
    /// An output directory could not be created.
    #[error("Failed to create directory '{path}': {source}")]
    CreateDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A PNG could not be encoded or written.
    #[error("Failed to write image '{path}': {detail}")]
    ImageEncode { path: PathBuf, detail: String },

    /// A PDF content stream or object could not be assembled.
    #[error("Failed to build PDF: {detail}")]
    PdfBuild { detail: String },

    /// A PDF could not be written to disk.
    #[error("Failed to write PDF '{path}': {detail}")]
    PdfWrite { path: PathBuf, detail: String },

    // ── Config errors ─────────────────────────────────────────────────────
    /// Builder validation failed.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

impl CardCollageError {
    /// Map an `image` open/decode failure, keeping "file missing" distinct
    /// from "file corrupt".
    pub(crate) fn image_open(path: impl Into<PathBuf>, source: image::ImageError) -> Self {
        let path = path.into();
        let missing = matches!(
            &source,
            image::ImageError::IoError(e) if e.kind() == std::io::ErrorKind::NotFound
        );
        if missing {
            CardCollageError::FileNotFound { path }
        } else {
            CardCollageError::ImageDecode { path, source }
        }
    }
}
