//! CLI binary for card-collage.
//!
//! A thin shim over the library crate: one subcommand per pipeline stage,
//! `all` for the whole run and `inspect` for checking outputs.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use card_collage::{
    build_collages, inspect_document, inspect_image, merge_pages, render_pages, run_pipeline,
    split_cards, PipelineConfig, PipelineProgressCallback, PipelineReport, ProgressCallback, Stage,
    StageReport,
};
use indicatif::{ProgressBar, ProgressStyle};
use std::io;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};
use tracing_subscriber::EnvFilter;

// ── ANSI colour helpers (no extra deps) ──────────────────────────────────────

fn green(s: &str) -> String {
    format!("\x1b[32m{s}\x1b[0m")
}
fn dim(s: &str) -> String {
    format!("\x1b[2m{s}\x1b[0m")
}
fn bold(s: &str) -> String {
    format!("\x1b[1m{s}\x1b[0m")
}
fn cyan(s: &str) -> String {
    format!("\x1b[36m{s}\x1b[0m")
}

// ── CLI progress callback using indicatif ────────────────────────────────────

const TICKS: &[&str] = &["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏", "⠿"];

/// Terminal progress callback: one bar per stage, plus a log line for every
/// file written.
struct CliProgressCallback {
    bar: ProgressBar,
    /// Start of the running stage, for the per-stage summary line.
    stage_start: Mutex<Option<Instant>>,
}

impl CliProgressCallback {
    fn new() -> Arc<Self> {
        let bar = ProgressBar::new(0);
        let spinner_style = ProgressStyle::with_template("{spinner:.cyan} {prefix:.bold}  {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner())
            .tick_strings(TICKS);
        bar.set_style(spinner_style);
        bar.set_prefix("Preparing");
        bar.set_message("Loading images…");
        bar.enable_steady_tick(Duration::from_millis(80));

        Arc::new(Self {
            bar,
            stage_start: Mutex::new(None),
        })
    }

    fn activate_bar(&self, stage: Stage, total: usize) {
        let style = ProgressStyle::with_template(
            "{spinner:.cyan} {prefix:.bold}  [{bar:42.green/238}] {pos:>2}/{len}  ⏱ {elapsed_precise}",
        )
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("█▉▊▋▌▍▎▏  ")
        .tick_strings(TICKS);

        self.bar.reset();
        self.bar.set_length(total as u64);
        self.bar.set_style(style);
        self.bar.set_prefix(stage_label(stage));
    }
}

fn stage_label(stage: Stage) -> &'static str {
    match stage {
        Stage::Split => "Splitting",
        Stage::Collage => "Composing",
        Stage::Render => "Rendering",
        Stage::Merge => "Merging",
    }
}

impl PipelineProgressCallback for CliProgressCallback {
    fn on_stage_start(&self, stage: Stage, total: usize) {
        if let Ok(mut start) = self.stage_start.lock() {
            *start = Some(Instant::now());
        }
        self.activate_bar(stage, total);
        self.bar.println(format!(
            "{} {}",
            cyan("◆"),
            bold(&format!("{}: {total} item(s)", stage.name()))
        ));
    }

    fn on_item_complete(&self, _stage: Stage, item: usize, total: usize, path: &Path) {
        self.bar.println(format!(
            "  {} {:>2}/{:<2}  {}",
            green("✓"),
            item,
            total,
            dim(&path.display().to_string()),
        ));
        self.bar.inc(1);
    }

    fn on_stage_complete(&self, stage: Stage, written: usize) {
        let elapsed_ms = self
            .stage_start
            .lock()
            .ok()
            .and_then(|mut s| s.take())
            .map(|t| t.elapsed().as_millis())
            .unwrap_or(0);
        self.bar.println(format!(
            "{} {} {} file(s) {}",
            green("✔"),
            stage.name(),
            bold(&written.to_string()),
            dim(&format!("{:.1}s", elapsed_ms as f64 / 1000.0)),
        ));
        if stage == Stage::Merge {
            self.bar.finish_and_clear();
        }
    }
}

const AFTER_HELP: &str = r#"EXAMPLES:
  # Whole pipeline in the current directory
  card-collage all

  # One stage at a time
  card-collage split
  card-collage collage
  card-collage render
  card-collage merge

  # Run against another project directory, JSON report on stdout
  card-collage --root ~/decks/tarot --json all

  # Check a card's size and DPI tag, or a PDF's page layout
  card-collage inspect output/individual_cards/card_01.png
  card-collage inspect output/pdfs/all_collages.pdf

LAYOUT (relative to --root):
  resources/cards.png                  source sheet, 28 cards in one row
  output/individual_cards/card_NN.png  750x1050 px @ 300 DPI
  output/collages/collage_N.png        2250x3150 px @ 300 DPI, 3x3 cards
  output/pdfs/collage_N.pdf            US letter page with cut guides
  output/pdfs/all_collages.pdf         all pages merged

ENVIRONMENT VARIABLES:
  CARD_COLLAGE_ROOT  Default for --root
  RUST_LOG           Overrides the log filter chosen by -v / -q
"#;

/// Split a card sprite sheet into printable, cut-ready letter pages.
#[derive(Parser, Debug)]
#[command(
    name = "card-collage",
    version,
    about = "Split a card sprite sheet into printable, cut-ready letter pages",
    long_about = "Cut a horizontal sheet of 28 card illustrations into individual \
2.5x3.5 in cards at 300 DPI, tile them nine to a collage, place each collage on a \
US-letter page with cut guides, and merge the pages into one PDF.",
    arg_required_else_help = true,
    color = clap::ColorChoice::Auto,
    after_long_help = AFTER_HELP
)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Project directory the fixed input/output paths are resolved against.
    #[arg(long, global = true, env = "CARD_COLLAGE_ROOT", default_value = ".")]
    root: PathBuf,

    /// Output the stage report (or inspect result) as JSON on stdout.
    #[arg(long, global = true, env = "CARD_COLLAGE_JSON")]
    json: bool,

    /// Disable progress bar.
    #[arg(long, global = true, env = "CARD_COLLAGE_NO_PROGRESS")]
    no_progress: bool,

    /// Enable DEBUG-level tracing logs.
    #[arg(short, long, global = true, env = "CARD_COLLAGE_VERBOSE")]
    verbose: bool,

    /// Suppress all output except errors.
    #[arg(short, long, global = true, env = "CARD_COLLAGE_QUIET")]
    quiet: bool,
}

#[derive(Subcommand, Debug, Clone)]
enum Command {
    /// Cut resources/cards.png into 28 card images.
    Split,
    /// Tile the cards into four 3x3 collages.
    Collage,
    /// Render each collage onto a letter page with cut guides.
    Render,
    /// Merge the page PDFs into all_collages.pdf.
    Merge,
    /// Run split, collage, render and merge in order.
    All,
    /// Report pixel size and DPI of a PNG, or page layout of a PDF.
    Inspect {
        /// Image or PDF file to inspect.
        path: PathBuf,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // ── Logging setup ────────────────────────────────────────────────────
    // INFO-level library logs would interleave with the bar, so they are
    // suppressed while it is shown.
    let show_progress = !cli.quiet
        && !cli.no_progress
        && !cli.json
        && !matches!(cli.command, Command::Inspect { .. });
    let filter = if cli.verbose {
        "debug"
    } else if cli.quiet || show_progress {
        "error"
    } else {
        "info"
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .with_writer(io::stderr)
        .init();

    // ── Build config ─────────────────────────────────────────────────────
    let progress_cb: Option<ProgressCallback> = if show_progress {
        Some(CliProgressCallback::new() as Arc<dyn PipelineProgressCallback>)
    } else {
        None
    };
    let config = build_config(&cli, progress_cb)?;

    // ── Run ──────────────────────────────────────────────────────────────
    let report = match cli.command {
        Command::Split => single(split_cards(&config).context("Split failed")?),
        Command::Collage => single(build_collages(&config).context("Collage failed")?),
        Command::Render => single(render_pages(&config).context("Render failed")?),
        Command::Merge => single(merge_pages(&config).context("Merge failed")?),
        Command::All => run_pipeline(&config).context("Pipeline failed")?,
        Command::Inspect { ref path } => return inspect(path, cli.json),
    };

    if cli.json {
        println!(
            "{}",
            serde_json::to_string_pretty(&report).context("Failed to serialise report")?
        );
    } else if !cli.quiet {
        print_summary(&report);
    }

    Ok(())
}

/// Map CLI args to `PipelineConfig`.
fn build_config(cli: &Cli, progress: Option<ProgressCallback>) -> Result<PipelineConfig> {
    let mut builder = PipelineConfig::builder().root(&cli.root);
    if let Some(cb) = progress {
        builder = builder.progress_callback(cb);
    }
    builder.build().context("Invalid configuration")
}

fn single(stage: StageReport) -> PipelineReport {
    let total_duration_ms = stage.duration_ms;
    PipelineReport {
        stages: vec![stage],
        total_duration_ms,
    }
}

fn print_summary(report: &PipelineReport) {
    for stage in &report.stages {
        if let Some(slicing) = stage.slicing {
            if slicing.discarded_columns > 0 {
                eprintln!(
                    "{} sheet width {} px: rightmost {} px column(s) not used",
                    cyan("⚠"),
                    slicing.sheet_width,
                    slicing.discarded_columns
                );
            }
        }
        eprintln!(
            "{}  {:<8} {:>2} file(s)  {}ms",
            green("✔"),
            stage.stage.name(),
            stage.outputs.len(),
            stage.duration_ms,
        );
    }
    if let Some(pdf) = report.merged_document() {
        eprintln!("   →  {}", bold(&pdf.display().to_string()));
    }
}

fn inspect(path: &Path, json: bool) -> Result<()> {
    let is_pdf = path
        .extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case("pdf"));

    if is_pdf {
        let info = inspect_document(path)
            .with_context(|| format!("Failed to inspect {}", path.display()))?;
        if json {
            println!(
                "{}",
                serde_json::to_string_pretty(&info).context("Failed to serialise document info")?
            );
        } else {
            println!("File:         {}", path.display());
            println!("Pages:        {}", info.page_count);
            for (i, page) in info.pages.iter().enumerate() {
                let [x0, y0, x1, y1] = page.media_box;
                println!(
                    "  Page {:>3}:  MediaBox [{x0} {y0} {x1} {y1}]  images: {}",
                    i + 1,
                    page.image_count
                );
            }
        }
    } else {
        let info = inspect_image(path)
            .with_context(|| format!("Failed to inspect {}", path.display()))?;
        if json {
            println!(
                "{}",
                serde_json::to_string_pretty(&info).context("Failed to serialise image info")?
            );
        } else {
            println!("File:         {}", path.display());
            println!("Size:         {}x{} px", info.width, info.height);
            match info.dpi {
                Some(dpi) => println!("DPI:          {dpi}"),
                None => println!("DPI:          (not set)"),
            }
        }
    }
    Ok(())
}
