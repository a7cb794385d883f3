//! End-to-end tests for card-collage.
//!
//! Each test builds a synthetic sprite sheet inside a fresh temporary
//! directory and runs one or more stages against it. Every card column of
//! the sheet is painted a distinct flat colour, so a card can be recognised
//! wherever it ends up.
//!
//! Run with:
//!   cargo test --test pipeline -- --nocapture

use card_collage::{
    build_collages, inspect_document, inspect_image, merge_pages, render_pages, run_pipeline,
    split_cards, CardCollageError, CollagePlan, PipelineConfig, PipelineProgressCallback, Stage,
};
use image::{Rgb, RgbImage};
use lopdf::content::Content;
use lopdf::Document;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use tempfile::TempDir;

// ── Test helpers ─────────────────────────────────────────────────────────────

const SHEET_HEIGHT: u32 = 140;

/// Route library logs through the test harness; `RUST_LOG=debug` shows them.
fn init_logging() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

/// Flat colour of card `index` (1-based) on the synthetic sheet.
fn card_colour(index: u32) -> Rgb<u8> {
    Rgb([(index * 9) as u8, 255 - (index * 9) as u8, 64])
}

/// Write `resources/cards.png` under `root`: 28 flat 100 px columns, plus
/// `extra` trailing red columns.
fn write_sheet(root: &Path, extra: u32) {
    let width = 28 * 100 + extra;
    let sheet = RgbImage::from_fn(width, SHEET_HEIGHT, |x, _| {
        if x >= 2800 {
            Rgb([255, 0, 0])
        } else {
            card_colour(x / 100 + 1)
        }
    });
    let resources = root.join("resources");
    std::fs::create_dir_all(&resources).unwrap();
    sheet.save(resources.join("cards.png")).unwrap();
}

fn project(extra: u32) -> TempDir {
    let dir = tempfile::tempdir().unwrap();
    write_sheet(dir.path(), extra);
    dir
}

fn config(root: &Path) -> PipelineConfig {
    PipelineConfig::builder().root(root).build().unwrap()
}

/// One collage of cards 1..=9: enough for the PDF stages, much faster.
fn small_config(root: &Path) -> PipelineConfig {
    PipelineConfig::builder()
        .root(root)
        .collage_plan(CollagePlan::new(vec![(1..=9).collect()]))
        .build()
        .unwrap()
}

fn assert_close(actual: &Rgb<u8>, expected: Rgb<u8>, context: &str) {
    for (a, e) in actual.0.iter().zip(expected.0.iter()) {
        assert!(
            a.abs_diff(*e) <= 2,
            "[{context}] pixel {:?}, expected {:?}",
            actual.0,
            expected.0
        );
    }
}

/// Decompressed content stream and raw image bytes of every page.
fn page_payloads(doc: &Document) -> Vec<(Vec<u8>, Vec<u8>)> {
    doc.get_pages()
        .into_values()
        .map(|page_id| {
            let content = doc.get_page_content(page_id).unwrap();
            let page = doc.get_dictionary(page_id).unwrap();
            let resources = page.get(b"Resources").unwrap().as_dict().unwrap();
            let xobjects = resources.get(b"XObject").unwrap().as_dict().unwrap();
            let (_, image_ref) = xobjects.iter().next().unwrap();
            let image = doc
                .get_object(image_ref.as_reference().unwrap())
                .unwrap()
                .as_stream()
                .unwrap();
            (content, image.content.clone())
        })
        .collect()
}

fn file_name(path: &Path) -> String {
    path.file_name().unwrap().to_string_lossy().into_owned()
}

// ── Full run ─────────────────────────────────────────────────────────────────

#[test]
fn full_pipeline_on_2800_px_sheet() {
    init_logging();
    let dir = project(0);
    let config = config(dir.path());
    let report = run_pipeline(&config).unwrap();

    let stages: Vec<Stage> = report.stages.iter().map(|s| s.stage).collect();
    assert_eq!(stages, Stage::ALL.to_vec());

    // Split: 28 cards at 750x1050, 300 DPI, each its own colour.
    let split = &report.stages[0];
    let slicing = split.slicing.unwrap();
    assert_eq!(slicing.card_width, 100);
    assert_eq!(slicing.card_height, SHEET_HEIGHT);
    assert_eq!(slicing.discarded_columns, 0);
    assert_eq!(split.outputs.len(), 28);
    assert_eq!(file_name(&split.outputs[0]), "card_01.png");
    assert_eq!(file_name(&split.outputs[27]), "card_28.png");
    for (i, path) in split.outputs.iter().enumerate() {
        let info = inspect_image(path).unwrap();
        assert_eq!((info.width, info.height), (750, 1050), "{}", path.display());
        assert_eq!(info.dpi, Some(300));
        let card = image::open(path).unwrap().to_rgb8();
        assert_close(card.get_pixel(375, 525), card_colour(i as u32 + 1), &file_name(path));
    }

    // Collage: 4 canvases at 2250x3150, 300 DPI, row-major placement.
    let collages = &report.stages[1].outputs;
    assert_eq!(collages.len(), 4);
    for path in collages {
        let info = inspect_image(path).unwrap();
        assert_eq!((info.width, info.height), (2250, 3150));
        assert_eq!(info.dpi, Some(300));
    }
    let plan = CollagePlan::default();
    for (path, cards) in collages.iter().zip(plan.collages()) {
        let canvas = image::open(path).unwrap().to_rgb8();
        for (slot, &card) in cards.iter().enumerate() {
            let (row, col) = (slot as u32 / 3, slot as u32 % 3);
            let pixel = canvas.get_pixel(col * 750 + 375, row * 1050 + 525);
            assert_close(
                pixel,
                card_colour(card as u32),
                &format!("{} slot {slot}", file_name(path)),
            );
        }
    }

    // Render: 4 single letter pages, one image each, drawn into the 540x756 box.
    let pages = &report.stages[2].outputs;
    assert_eq!(pages.len(), 4);
    for path in pages {
        let info = inspect_document(path).unwrap();
        assert_eq!(info.page_count, 1);
        assert_eq!(info.pages[0].media_box, [0.0, 0.0, 612.0, 792.0]);
        assert_eq!(info.pages[0].image_count, 1);

        let doc = Document::load(path).unwrap();
        let page_id = *doc.get_pages().get(&1).unwrap();
        let content = Content::decode(&doc.get_page_content(page_id).unwrap()).unwrap();
        let cm = content
            .operations
            .iter()
            .find(|o| o.operator == "cm")
            .unwrap();
        let cm: Vec<f32> = cm.operands.iter().map(|o| o.as_float().unwrap()).collect();
        assert_eq!(cm, vec![540.0, 0.0, 0.0, 756.0, 36.0, 18.0]);
        let strokes = content
            .operations
            .iter()
            .filter(|o| o.operator == "S")
            .count();
        assert_eq!(strokes, 8);
    }

    // Merge: one 4-page document whose page k is page document k.
    let merged_path = report.merged_document().unwrap();
    assert_eq!(file_name(merged_path), "all_collages.pdf");
    let merged = Document::load(merged_path).unwrap();
    assert_eq!(merged.get_pages().len(), 4);

    let expected: Vec<_> = pages
        .iter()
        .flat_map(|p| page_payloads(&Document::load(p).unwrap()))
        .collect();
    assert_eq!(page_payloads(&merged), expected);

    let info = inspect_document(merged_path).unwrap();
    assert!(info.pages.iter().all(|p| p.image_count == 1));
    assert!(info
        .pages
        .iter()
        .all(|p| p.media_box == [0.0, 0.0, 612.0, 792.0]));
    assert!(
        !merged_path.with_extension("pdf.tmp").exists(),
        "temporary merge file left behind"
    );
}

// ── Sheet boundaries ─────────────────────────────────────────────────────────

#[test]
fn extra_sheet_column_is_ignored() {
    init_logging();
    let dir = project(1);
    let report = split_cards(&config(dir.path())).unwrap();

    let slicing = report.slicing.unwrap();
    assert_eq!(slicing.sheet_width, 2801);
    assert_eq!(slicing.card_width, 100);
    assert_eq!(slicing.consumed_width, 2800);
    assert_eq!(slicing.discarded_columns, 1);
    assert_eq!(report.outputs.len(), 28);

    // The red column past 2800 must not bleed into the last card.
    let last = image::open(&report.outputs[27]).unwrap().to_rgb8();
    for y in [0, 525, 1049] {
        assert_close(last.get_pixel(749, y), card_colour(28), "card_28 right edge");
    }
}

#[test]
fn sheet_narrower_than_card_count_fails() {
    let dir = tempfile::tempdir().unwrap();
    let resources = dir.path().join("resources");
    std::fs::create_dir_all(&resources).unwrap();
    RgbImage::from_pixel(27, 40, Rgb([1, 2, 3]))
        .save(resources.join("cards.png"))
        .unwrap();

    let err = split_cards(&config(dir.path())).unwrap_err();
    assert!(matches!(err, CardCollageError::SheetTooNarrow { width: 27, cards: 28 }));
}

// ── Failures ─────────────────────────────────────────────────────────────────

#[test]
fn missing_sheet_is_reported() {
    let dir = tempfile::tempdir().unwrap();
    let err = split_cards(&config(dir.path())).unwrap_err();
    match err {
        CardCollageError::FileNotFound { path } => {
            assert!(path.ends_with("resources/cards.png"), "{}", path.display())
        }
        other => panic!("expected FileNotFound, got {other:?}"),
    }
    assert!(!dir.path().join("output").exists());
}

#[test]
fn corrupt_sheet_is_a_decode_error() {
    let dir = tempfile::tempdir().unwrap();
    let resources = dir.path().join("resources");
    std::fs::create_dir_all(&resources).unwrap();
    std::fs::write(resources.join("cards.png"), b"definitely not a png").unwrap();

    let err = split_cards(&config(dir.path())).unwrap_err();
    assert!(matches!(err, CardCollageError::ImageDecode { .. }), "{err:?}");
}

#[test]
fn missing_card_aborts_collage_stage() {
    let dir = project(0);
    let config = config(dir.path());
    split_cards(&config).unwrap();
    std::fs::remove_file(config.paths.card(14)).unwrap();

    let err = build_collages(&config).unwrap_err();
    match err {
        CardCollageError::FileNotFound { path } => assert_eq!(file_name(&path), "card_14.png"),
        other => panic!("expected FileNotFound, got {other:?}"),
    }
    // Collages before the failing one are kept; the failing one is not written.
    assert!(config.paths.collage(1).exists());
    assert!(config.paths.collage(2).exists());
    assert!(!config.paths.collage(3).exists());
}

#[test]
fn resized_card_is_rejected() {
    let dir = project(0);
    let config = small_config(dir.path());
    split_cards(&config).unwrap();
    RgbImage::from_pixel(700, 1000, Rgb([0, 0, 0]))
        .save(config.paths.card(5))
        .unwrap();

    let err = build_collages(&config).unwrap_err();
    assert!(matches!(
        err,
        CardCollageError::CardSizeMismatch {
            expected: (750, 1050),
            actual: (700, 1000),
            ..
        }
    ));
}

#[test]
fn render_without_collages_fails() {
    let dir = tempfile::tempdir().unwrap();
    let err = render_pages(&config(dir.path())).unwrap_err();
    assert!(matches!(err, CardCollageError::FileNotFound { .. }));
}

#[test]
fn missing_page_aborts_merge_without_output() {
    let dir = project(0);
    let config = small_config(dir.path());
    split_cards(&config).unwrap();
    build_collages(&config).unwrap();
    render_pages(&config).unwrap();
    std::fs::remove_file(config.paths.page(1)).unwrap();

    let err = merge_pages(&config).unwrap_err();
    assert!(matches!(err, CardCollageError::FileNotFound { .. }));
    assert!(!config.paths.merged().exists());
}

// ── Stages run independently ─────────────────────────────────────────────────

#[test]
fn stages_can_be_rerun_individually() {
    let dir = project(0);
    let config = small_config(dir.path());
    split_cards(&config).unwrap();
    build_collages(&config).unwrap();
    render_pages(&config).unwrap();

    let first = merge_pages(&config).unwrap();
    let second = merge_pages(&config).unwrap();
    assert_eq!(first.outputs, second.outputs);
    assert_eq!(inspect_document(&second.outputs[0]).unwrap().page_count, 1);
}

// ── Progress reporting ───────────────────────────────────────────────────────

#[derive(Default)]
struct RecordingCallback {
    starts: Mutex<Vec<(Stage, usize)>>,
    items: Mutex<Vec<(Stage, usize, PathBuf)>>,
    completions: AtomicUsize,
}

impl PipelineProgressCallback for RecordingCallback {
    fn on_stage_start(&self, stage: Stage, total: usize) {
        self.starts.lock().unwrap().push((stage, total));
    }

    fn on_item_complete(&self, stage: Stage, item: usize, _total: usize, path: &Path) {
        assert!(path.exists(), "callback fired before {} was written", path.display());
        self.items
            .lock()
            .unwrap()
            .push((stage, item, path.to_path_buf()));
    }

    fn on_stage_complete(&self, _stage: Stage, _written: usize) {
        self.completions.fetch_add(1, Ordering::SeqCst);
    }
}

#[test]
fn progress_events_cover_every_output() {
    let dir = project(0);
    let recorder = Arc::new(RecordingCallback::default());
    let config = PipelineConfig::builder()
        .root(dir.path())
        .collage_plan(CollagePlan::new(vec![(1..=9).collect()]))
        .progress_callback(recorder.clone() as Arc<dyn PipelineProgressCallback>)
        .build()
        .unwrap();

    run_pipeline(&config).unwrap();

    let starts = recorder.starts.lock().unwrap().clone();
    assert_eq!(
        starts,
        vec![
            (Stage::Split, 28),
            (Stage::Collage, 1),
            (Stage::Render, 1),
            (Stage::Merge, 1)
        ]
    );

    let items = recorder.items.lock().unwrap();
    let count = |stage: Stage| items.iter().filter(|(s, _, _)| *s == stage).count();
    assert_eq!(count(Stage::Split), 28);
    assert_eq!(count(Stage::Collage), 1);
    assert_eq!(count(Stage::Render), 1);
    assert_eq!(count(Stage::Merge), 1);

    let split_items: Vec<usize> = items
        .iter()
        .filter(|(s, _, _)| *s == Stage::Split)
        .map(|(_, i, _)| *i)
        .collect();
    assert_eq!(split_items, (1..=28).collect::<Vec<_>>());
    assert_eq!(recorder.completions.load(Ordering::SeqCst), 4);
}

// ── Reports ──────────────────────────────────────────────────────────────────

#[test]
fn split_report_serialises_to_json() {
    let dir = project(0);
    let report = split_cards(&config(dir.path())).unwrap();
    let json = serde_json::to_value(&report).unwrap();
    assert_eq!(json["stage"], "split");
    assert_eq!(json["outputs"].as_array().unwrap().len(), 28);
    assert_eq!(json["slicing"]["card_width"], 100);
}
