//! Stage entry points: read inputs, write outputs, report progress.
//!
//! Each `fn` here corresponds to one pipeline stage and can be run on its
//! own, as long as the previous stage's files are already on disk.
//! [`run_pipeline`] runs all four in order. Every stage is fail-fast: the
//! first error aborts it, and files written before the error are left in
//! place.

use crate::config::PipelineConfig;
use crate::error::CardCollageError;
use crate::geometry::{card_size_px, PageGeometry, CARD_COUNT, DPI};
use crate::output::{DocumentInfo, ImageInfo, PipelineReport, StageReport};
use crate::pipeline::{collage, encode, merge, pdf, render, split};
use crate::progress::{PipelineProgressCallback, Stage};
use image::{DynamicImage, RgbImage};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::Instant;
use tracing::{debug, info, warn};

/// Run split → collage → render → merge.
///
/// # Errors
/// The first error from any stage; later stages do not run.
pub fn run_pipeline(config: &PipelineConfig) -> Result<PipelineReport, CardCollageError> {
    let total_start = Instant::now();
    info!("Starting pipeline in {}", config.paths.root().display());

    let stages = vec![
        split_cards(config)?,
        build_collages(config)?,
        render_pages(config)?,
        merge_pages(config)?,
    ];

    let report = PipelineReport {
        stages,
        total_duration_ms: total_start.elapsed().as_millis() as u64,
    };
    info!("Pipeline complete in {}ms", report.total_duration_ms);
    Ok(report)
}

/// Stage 1: cut the source sheet into `card_01.png` … `card_28.png`.
pub fn split_cards(config: &PipelineConfig) -> Result<StageReport, CardCollageError> {
    let start = Instant::now();
    let paths = &config.paths;

    // ── Step 1: Load the sheet ───────────────────────────────────────────
    let sheet_path = paths.source_sheet();
    let sheet = open_image(&sheet_path)?;
    info!("Original image size: {}x{} pixels", sheet.width(), sheet.height());

    // ── Step 2: Work out the slices ──────────────────────────────────────
    let slicing = split::slice_sheet(sheet.width(), sheet.height(), CARD_COUNT)?;
    let target = card_size_px();
    info!(
        "Source card size: {}x{} px, target {}x{} px at {} DPI",
        slicing.card_width, slicing.card_height, target.0, target.1, DPI
    );
    if slicing.discarded_columns > 0 {
        warn!(
            "Sheet width {} is not a multiple of {}; ignoring the rightmost {} column(s)",
            slicing.sheet_width, CARD_COUNT, slicing.discarded_columns
        );
    }

    // ── Step 3: Cut, resample and save each card ─────────────────────────
    ensure_dir(&paths.cards_dir())?;
    let regions = split::crop_regions(&slicing);
    let total = regions.len();
    notify(config, |cb| cb.on_stage_start(Stage::Split, total));

    let mut outputs = Vec::with_capacity(total);
    for region in &regions {
        let card = split::cut_card(&sheet, region, target);
        let path = paths.card(region.index);
        encode::save_png(&card, &path, DPI)?;
        info!("Saved: {}", path.display());
        notify(config, |cb| {
            cb.on_item_complete(Stage::Split, region.index, total, &path)
        });
        outputs.push(path);
    }

    notify(config, |cb| cb.on_stage_complete(Stage::Split, outputs.len()));
    info!(
        "Split {} cards into {}",
        outputs.len(),
        paths.cards_dir().display()
    );

    Ok(StageReport {
        stage: Stage::Split,
        outputs,
        duration_ms: start.elapsed().as_millis() as u64,
        slicing: Some(slicing),
    })
}

/// Stage 2: tile cards into `collage_1.png` … per the collage plan.
pub fn build_collages(config: &PipelineConfig) -> Result<StageReport, CardCollageError> {
    let start = Instant::now();
    let paths = &config.paths;
    let plan = config.plan.collages();
    let total = plan.len();

    ensure_dir(&paths.collages_dir())?;
    notify(config, |cb| cb.on_stage_start(Stage::Collage, total));

    let mut outputs = Vec::with_capacity(total);
    for (i, cards) in plan.iter().enumerate() {
        let n = i + 1;
        info!("Creating collage {}: cards {:?}", n, cards);

        // Repeated cards (collage 1 is one card nine times) load once.
        let mut loaded: HashMap<usize, (PathBuf, RgbImage)> = HashMap::new();
        for &index in cards {
            if !loaded.contains_key(&index) {
                let path = paths.card(index);
                let card = open_image(&path)?.to_rgb8();
                loaded.insert(index, (path, card));
            }
        }

        let canvas = collage::compose(cards.iter().map(|index| {
            let (path, card) = &loaded[index];
            (card, path.as_path())
        }))?;

        let path = paths.collage(n);
        encode::save_png(&DynamicImage::ImageRgb8(canvas), &path, DPI)?;
        info!("Saved: {}", path.display());
        notify(config, |cb| cb.on_item_complete(Stage::Collage, n, total, &path));
        outputs.push(path);
    }

    notify(config, |cb| cb.on_stage_complete(Stage::Collage, outputs.len()));
    info!(
        "Created {} collages in {}",
        outputs.len(),
        paths.collages_dir().display()
    );

    Ok(StageReport {
        stage: Stage::Collage,
        outputs,
        duration_ms: start.elapsed().as_millis() as u64,
        slicing: None,
    })
}

/// Stage 3: render every collage onto its own letter page.
pub fn render_pages(config: &PipelineConfig) -> Result<StageReport, CardCollageError> {
    let start = Instant::now();
    let paths = &config.paths;
    let total = config.plan.len();
    let geometry = PageGeometry::letter();

    info!(
        "Page {}x{} pt, collage {}x{} pt at ({}, {})",
        geometry.page_width,
        geometry.page_height,
        geometry.collage_width,
        geometry.collage_height,
        geometry.margin_left,
        geometry.margin_bottom
    );

    ensure_dir(&paths.pdfs_dir())?;
    notify(config, |cb| cb.on_stage_start(Stage::Render, total));

    let mut outputs = Vec::with_capacity(total);
    for n in 1..=total {
        let collage_path = paths.collage(n);
        let img = open_image(&collage_path)?.to_rgb8();

        let mut doc = render::page_document(&img, &geometry)?;
        let path = paths.page(n);
        pdf::save_document(&mut doc, &path)?;
        info!("Saved: {}", path.display());
        notify(config, |cb| cb.on_item_complete(Stage::Render, n, total, &path));
        outputs.push(path);
    }

    notify(config, |cb| cb.on_stage_complete(Stage::Render, outputs.len()));

    Ok(StageReport {
        stage: Stage::Render,
        outputs,
        duration_ms: start.elapsed().as_millis() as u64,
        slicing: None,
    })
}

/// Stage 4: concatenate the page documents into `all_collages.pdf`.
///
/// The merged file is written to a temporary sibling and renamed into
/// place, so a failed merge never leaves a truncated document behind.
pub fn merge_pages(config: &PipelineConfig) -> Result<StageReport, CardCollageError> {
    let start = Instant::now();
    let paths = &config.paths;
    let total = config.plan.len();

    notify(config, |cb| cb.on_stage_start(Stage::Merge, 1));

    let mut sources = Vec::with_capacity(total);
    for n in 1..=total {
        let path = paths.page(n);
        info!("Adding {}", path.display());
        sources.push(pdf::load_document(&path)?);
    }

    let mut merged = merge::merge_documents(sources)?;
    let page_count = merged.get_pages().len();

    let path = paths.merged();
    ensure_dir(&paths.pdfs_dir())?;
    save_atomic(&mut merged, &path)?;
    info!("Created {} ({} pages)", path.display(), page_count);

    notify(config, |cb| cb.on_item_complete(Stage::Merge, 1, 1, &path));
    notify(config, |cb| cb.on_stage_complete(Stage::Merge, 1));

    Ok(StageReport {
        stage: Stage::Merge,
        outputs: vec![path],
        duration_ms: start.elapsed().as_millis() as u64,
        slicing: None,
    })
}

/// Pixel size and DPI tag of an image file.
pub fn inspect_image(path: impl AsRef<Path>) -> Result<ImageInfo, CardCollageError> {
    let path = path.as_ref();
    let (width, height) =
        image::image_dimensions(path).map_err(|e| CardCollageError::image_open(path, e))?;

    let dpi = match image::ImageFormat::from_path(path) {
        Ok(image::ImageFormat::Png) => encode::read_dpi(path)?,
        _ => None,
    };

    Ok(ImageInfo { width, height, dpi })
}

/// Page count and page layout of a PDF file.
pub fn inspect_document(path: impl AsRef<Path>) -> Result<DocumentInfo, CardCollageError> {
    let doc = pdf::load_document(path.as_ref())?;
    Ok(pdf::describe_document(&doc))
}

// ── Internal helpers ─────────────────────────────────────────────────────

fn open_image(path: &Path) -> Result<DynamicImage, CardCollageError> {
    debug!("Loading {}", path.display());
    image::open(path).map_err(|e| CardCollageError::image_open(path, e))
}

fn ensure_dir(dir: &Path) -> Result<(), CardCollageError> {
    std::fs::create_dir_all(dir).map_err(|e| CardCollageError::CreateDir {
        path: dir.to_path_buf(),
        source: e,
    })
}

/// Atomic write: save to `<name>.tmp`, then rename over `path`.
fn save_atomic(doc: &mut lopdf::Document, path: &Path) -> Result<(), CardCollageError> {
    let tmp_path = path.with_extension("pdf.tmp");
    pdf::save_document(doc, &tmp_path)?;
    std::fs::rename(&tmp_path, path).map_err(|e| {
        let _ = std::fs::remove_file(&tmp_path);
        CardCollageError::PdfWrite {
            path: path.to_path_buf(),
            detail: e.to_string(),
        }
    })
}

fn notify(config: &PipelineConfig, event: impl FnOnce(&dyn PipelineProgressCallback)) {
    if let Some(ref cb) = config.progress_callback {
        event(cb.as_ref());
    }
}
