//! # card-collage
//!
//! Turn a horizontal sprite sheet of 28 playing cards into a print-ready,
//! multi-page PDF with cut guides.
//!
//! Every card is resampled to exactly 2.5x3.5 in at 300 DPI, nine cards are
//! tiled per 7.5x10.5 in collage, and each collage is placed on a US-letter
//! page with hairline cut guides that run through the margins, so a stack of
//! printed pages can be guillotined into cards.
//!
//! ## Pipeline Overview
//!
//! ```text
//! resources/cards.png
//!  │
//!  ├─ 1. Split    28 equal slices → output/individual_cards/card_NN.png
//!  ├─ 2. Collage  3x3 grids       → output/collages/collage_N.png
//!  ├─ 3. Render   letter pages    → output/pdfs/collage_N.pdf
//!  └─ 4. Merge    one document    → output/pdfs/all_collages.pdf
//! ```
//!
//! Each stage reads only the files the previous stage wrote, so stages can
//! be re-run individually.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use card_collage::{run_pipeline, PipelineConfig};
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = PipelineConfig::builder().root("my-deck").build()?;
//!     let report = run_pipeline(&config)?;
//!     if let Some(pdf) = report.merged_document() {
//!         println!("{}", pdf.display());
//!     }
//!     Ok(())
//! }
//! ```
//!
//! ## Feature Flags
//!
//! | Feature | Default | Description |
//! |---------|---------|-------------|
//! | `cli`   | on      | Enables the `card-collage` binary (clap + anyhow + tracing-subscriber + indicatif) |
//!
//! ```toml
//! card-collage = { version = "0.1", default-features = false }
//! ```

// ── Modules ──────────────────────────────────────────────────────────────

pub mod config;
pub mod error;
pub mod geometry;
pub mod output;
pub mod pipeline;
pub mod progress;
pub mod run;

// ── Re-exports ───────────────────────────────────────────────────────────

pub use config::{CollagePlan, PipelineConfig, PipelineConfigBuilder, PipelinePaths};
pub use error::CardCollageError;
pub use geometry::PageGeometry;
pub use output::{DocumentInfo, ImageInfo, PageInfo, PipelineReport, SheetSlicing, StageReport};
pub use progress::{NoopProgressCallback, PipelineProgressCallback, ProgressCallback, Stage};
pub use run::{
    build_collages, inspect_document, inspect_image, merge_pages, render_pages, run_pipeline,
    split_cards,
};
