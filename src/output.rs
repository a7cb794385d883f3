//! Run reports and inspection results.

use crate::progress::Stage;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// How the source sheet was cut into cards.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SheetSlicing {
    pub sheet_width: u32,
    pub sheet_height: u32,
    /// `floor(sheet_width / card_count)`.
    pub card_width: u32,
    pub card_height: u32,
    /// Columns covered by the crops: `card_count * card_width`.
    pub consumed_width: u32,
    /// Rightmost columns no card covers.
    pub discarded_columns: u32,
}

/// What one stage wrote.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StageReport {
    pub stage: Stage,
    /// Files written, in order.
    pub outputs: Vec<PathBuf>,
    pub duration_ms: u64,
    /// Present for the split stage only.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub slicing: Option<SheetSlicing>,
}

/// Summary of a full pipeline run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineReport {
    /// One entry per stage, in pipeline order.
    pub stages: Vec<StageReport>,
    pub total_duration_ms: u64,
}

impl PipelineReport {
    /// The final merged document, if the merge stage ran.
    pub fn merged_document(&self) -> Option<&PathBuf> {
        self.stages
            .iter()
            .find(|s| s.stage == Stage::Merge)
            .and_then(|s| s.outputs.first())
    }
}

/// Pixel size and print density of a raster file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageInfo {
    pub width: u32,
    pub height: u32,
    /// From the PNG `pHYs` chunk; `None` when absent or not in metres.
    pub dpi: Option<u32>,
}

/// Page layout of a PDF file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DocumentInfo {
    pub page_count: usize,
    pub pages: Vec<PageInfo>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PageInfo {
    /// `[x0, y0, x1, y1]` in points.
    pub media_box: [f32; 4],
    /// Image XObjects referenced from the page resources.
    pub image_count: usize,
}
