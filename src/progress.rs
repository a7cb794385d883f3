//! Progress-callback trait for per-item pipeline events.
//!
//! Inject an [`Arc<dyn PipelineProgressCallback>`] via
//! [`crate::config::PipelineConfigBuilder::progress_callback`] to receive an
//! event for every card, collage and page as it is written.
//!
//! # Example
//!
//! ```rust
//! use card_collage::{PipelineConfig, PipelineProgressCallback, Stage};
//! use std::path::Path;
//! use std::sync::{Arc, atomic::{AtomicUsize, Ordering}};
//!
//! struct CountingCallback {
//!     written: AtomicUsize,
//! }
//!
//! impl PipelineProgressCallback for CountingCallback {
//!     fn on_item_complete(&self, stage: Stage, item: usize, total: usize, path: &Path) {
//!         self.written.fetch_add(1, Ordering::SeqCst);
//!         eprintln!("{stage}: {item}/{total} {}", path.display());
//!     }
//! }
//!
//! let counter = Arc::new(CountingCallback { written: AtomicUsize::new(0) });
//!
//! let config = PipelineConfig::builder()
//!     .progress_callback(counter as Arc<dyn PipelineProgressCallback>)
//!     .build()
//!     .unwrap();
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;
use std::sync::Arc;

/// The four pipeline stages, in the order they must run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Stage {
    /// Source sheet → individual cards.
    Split,
    /// Cards → 3x3 collages.
    Collage,
    /// Collages → single-page PDFs with cut lines.
    Render,
    /// Single-page PDFs → one multi-page PDF.
    Merge,
}

impl Stage {
    /// All stages in pipeline order.
    pub const ALL: [Stage; 4] = [Stage::Split, Stage::Collage, Stage::Render, Stage::Merge];

    pub fn name(&self) -> &'static str {
        match self {
            Stage::Split => "split",
            Stage::Collage => "collage",
            Stage::Render => "render",
            Stage::Merge => "merge",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Called by the pipeline as each stage writes its outputs.
///
/// All methods have default no-op implementations so callers only override
/// what they care about. The pipeline is single-threaded, but the trait is
/// `Send + Sync` so a callback can be shared with a UI thread.
pub trait PipelineProgressCallback: Send + Sync {
    /// Called once before a stage writes anything.
    ///
    /// # Arguments
    /// * `stage`: the stage starting
    /// * `total`: number of files the stage will write
    fn on_stage_start(&self, stage: Stage, total: usize) {
        let _ = (stage, total);
    }

    /// Called after each output file is written.
    ///
    /// # Arguments
    /// * `item`: 1-indexed position of the file within the stage
    /// * `total`: number of files the stage will write
    /// * `path`: the file just written
    fn on_item_complete(&self, stage: Stage, item: usize, total: usize, path: &Path) {
        let _ = (stage, item, total, path);
    }

    /// Called once after a stage has written all its files.
    fn on_stage_complete(&self, stage: Stage, written: usize) {
        let _ = (stage, written);
    }
}

/// A no-op implementation for callers that don't need progress events.
pub struct NoopProgressCallback;

impl PipelineProgressCallback for NoopProgressCallback {}

/// Convenience alias matching the type stored in [`crate::config::PipelineConfig`].
pub type ProgressCallback = Arc<dyn PipelineProgressCallback>;
