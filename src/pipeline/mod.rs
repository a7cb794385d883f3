//! Pipeline stages for turning a card sprite sheet into a printable PDF.
//!
//! Each submodule implements exactly one transformation step as pure
//! functions over in-memory images and documents; file I/O, directory
//! creation and progress reporting live in [`crate::run`].
//!
//! ## Data Flow
//!
//! ```text
//! split ──▶ collage ──▶ render ──▶ merge
//! (sheet)   (3x3 grid)  (PDF page)  (one PDF)
//! ```
//!
//! 1. [`split`]: cut the sheet into equal slices and resample each card
//! 2. [`collage`]: paste nine cards per white canvas, row-major
//! 3. [`render`]: place a collage on a letter page and stroke the cut guides
//! 4. [`merge`]: concatenate page documents without touching page content
//!
//! [`encode`] writes DPI-tagged PNGs for the first two stages and [`pdf`]
//! holds the `lopdf` helpers shared by the last two.

pub mod collage;
pub mod encode;
pub mod merge;
pub mod pdf;
pub mod render;
pub mod split;
