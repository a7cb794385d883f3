//! Configuration types for the card print pipeline.
//!
//! Every stage takes an immutable [`PipelineConfig`]: where the files live
//! ([`PipelinePaths`]), which cards go on which collage ([`CollagePlan`]),
//! and an optional progress callback. There is no process-wide state; two
//! configs rooted in different directories can run side by side.
//!
//! The print geometry itself (DPI, card and page sizes, margins) is fixed and
//! lives in [`crate::geometry`].

use crate::error::CardCollageError;
use crate::geometry::{CARD_COUNT, SLOTS_PER_COLLAGE};
use crate::progress::ProgressCallback;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};

/// Source sheet, relative to the pipeline root.
pub const SOURCE_SHEET: &str = "resources/cards.png";
/// Directory for the individual card images.
pub const CARDS_DIR: &str = "output/individual_cards";
/// Directory for the collage images.
pub const COLLAGES_DIR: &str = "output/collages";
/// Directory for the page documents and the merged document.
pub const PDFS_DIR: &str = "output/pdfs";
/// File name of the merged document inside [`PDFS_DIR`].
pub const MERGED_FILE: &str = "all_collages.pdf";

/// Configuration for a pipeline run.
///
/// Built via [`PipelineConfig::builder()`] or using
/// [`PipelineConfig::default()`].
///
/// # Example
/// ```rust
/// use card_collage::PipelineConfig;
///
/// let config = PipelineConfig::builder()
///     .root("/tmp/deck")
///     .build()
///     .unwrap();
/// assert!(config.paths.source_sheet().ends_with("resources/cards.png"));
/// ```
#[derive(Clone, Default)]
pub struct PipelineConfig {
    /// Where inputs are read from and outputs written to.
    pub paths: PipelinePaths,

    /// Card assignment for each collage. Default: [`CollagePlan::default`].
    pub plan: CollagePlan,

    /// Optional per-item progress events.
    pub progress_callback: Option<ProgressCallback>,
}

impl fmt::Debug for PipelineConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PipelineConfig")
            .field("paths", &self.paths)
            .field("plan", &self.plan)
            .field(
                "progress_callback",
                &self
                    .progress_callback
                    .as_ref()
                    .map(|_| "<dyn PipelineProgressCallback>"),
            )
            .finish()
    }
}

impl PipelineConfig {
    /// Create a new builder for `PipelineConfig`.
    pub fn builder() -> PipelineConfigBuilder {
        PipelineConfigBuilder {
            config: Self::default(),
        }
    }
}

/// Builder for [`PipelineConfig`].
#[derive(Debug)]
pub struct PipelineConfigBuilder {
    config: PipelineConfig,
}

impl PipelineConfigBuilder {
    /// Root directory the fixed relative paths are resolved against.
    pub fn root(mut self, root: impl Into<PathBuf>) -> Self {
        self.config.paths = PipelinePaths::new(root);
        self
    }

    pub fn collage_plan(mut self, plan: CollagePlan) -> Self {
        self.config.plan = plan;
        self
    }

    pub fn progress_callback(mut self, cb: ProgressCallback) -> Self {
        self.config.progress_callback = Some(cb);
        self
    }

    /// Build the configuration, validating the collage plan.
    pub fn build(self) -> Result<PipelineConfig, CardCollageError> {
        self.config.plan.validate(CARD_COUNT as usize)?;
        Ok(self.config)
    }
}

// ── Paths ────────────────────────────────────────────────────────────────

/// Resolves every file the pipeline touches from a single root directory.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PipelinePaths {
    root: PathBuf,
}

impl Default for PipelinePaths {
    fn default() -> Self {
        Self::new(".")
    }
}

impl PipelinePaths {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn source_sheet(&self) -> PathBuf {
        self.root.join(SOURCE_SHEET)
    }

    pub fn cards_dir(&self) -> PathBuf {
        self.root.join(CARDS_DIR)
    }

    pub fn collages_dir(&self) -> PathBuf {
        self.root.join(COLLAGES_DIR)
    }

    pub fn pdfs_dir(&self) -> PathBuf {
        self.root.join(PDFS_DIR)
    }

    /// `card_{index:02}.png`, with a 1-based index.
    pub fn card(&self, index: usize) -> PathBuf {
        self.cards_dir().join(format!("card_{index:02}.png"))
    }

    /// `collage_{n}.png`, with a 1-based collage number.
    pub fn collage(&self, n: usize) -> PathBuf {
        self.collages_dir().join(format!("collage_{n}.png"))
    }

    /// `collage_{n}.pdf`, the page document rendered from collage `n`.
    pub fn page(&self, n: usize) -> PathBuf {
        self.pdfs_dir().join(format!("collage_{n}.pdf"))
    }

    pub fn merged(&self) -> PathBuf {
        self.pdfs_dir().join(MERGED_FILE)
    }
}

// ── Collage plan ─────────────────────────────────────────────────────────

/// Which cards go on which collage.
///
/// One row per collage, each row listing exactly
/// [`SLOTS_PER_COLLAGE`] 1-based card indices in row-major slot order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CollagePlan {
    collages: Vec<Vec<usize>>,
}

impl Default for CollagePlan {
    /// Collage 1 is card 1 nine times; collages 2–4 hold cards 2–10, 11–19
    /// and 20–28.
    fn default() -> Self {
        Self {
            collages: vec![
                vec![1; SLOTS_PER_COLLAGE],
                (2..=10).collect(),
                (11..=19).collect(),
                (20..=28).collect(),
            ],
        }
    }
}

impl CollagePlan {
    /// Wrap an explicit table. Validation happens in
    /// [`PipelineConfigBuilder::build`].
    pub fn new(collages: Vec<Vec<usize>>) -> Self {
        Self { collages }
    }

    pub fn collages(&self) -> &[Vec<usize>] {
        &self.collages
    }

    pub fn len(&self) -> usize {
        self.collages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.collages.is_empty()
    }

    /// Check that every row fills the grid and names an existing card.
    pub fn validate(&self, card_count: usize) -> Result<(), CardCollageError> {
        if self.collages.is_empty() {
            return Err(CardCollageError::InvalidConfig(
                "Collage plan must contain at least one collage".into(),
            ));
        }
        for (i, row) in self.collages.iter().enumerate() {
            if row.len() != SLOTS_PER_COLLAGE {
                return Err(CardCollageError::InvalidConfig(format!(
                    "Collage {} lists {} cards, expected {}",
                    i + 1,
                    row.len(),
                    SLOTS_PER_COLLAGE
                )));
            }
            if let Some(&bad) = row.iter().find(|&&c| c < 1 || c > card_count) {
                return Err(CardCollageError::InvalidConfig(format!(
                    "Collage {} references card {}, valid cards are 1–{}",
                    i + 1,
                    bad,
                    card_count
                )));
            }
        }
        Ok(())
    }
}
