//! # CLI Module
//!
//! Command-line interface for repairing an InvokeAI catalog.
//!
//! ## Usage
//! ```bash
//! # Add catalog rows for images that exist on disk but not in the database
//! catalog-mender recover --db ~/invokeai/databases/invokeai.db --outputs ~/invokeai/outputs
//!
//! # See what would be recovered without writing anything
//! catalog-mender recover --db invokeai.db --outputs outputs --dry-run
//!
//! # Turn every image on a board into an asset
//! catalog-mender reclassify --db invokeai.db --board-name imports
//!
//! # And back again, as JSON for scripting
//! catalog-mender reclassify --db invokeai.db --board-name imports --target general --output json
//! ```
//!
//! Back up the database before running; the tool never does it for you.

use catalog_mender::core::catalog::{Catalog, Classification};
use catalog_mender::core::reclassify::{ReclassifyReport, Reclassifier};
use catalog_mender::core::reconcile::{ReconcileReport, Reconciler};
use catalog_mender::error::{ErrorKind, Result};
use catalog_mender::events::{
    Event, EventChannel, EventReceiver, ReclassifyEvent, RecoverEvent, ScanEvent,
};
use clap::{Parser, Subcommand, ValueEnum};
use console::{style, Term};
use indicatif::{ProgressBar, ProgressStyle};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::thread::{self, JoinHandle};

/// Folder below the outputs directory that holds full-size images
const IMAGES_DIR: &str = "images";

/// Catalog Mender - Repair an InvokeAI image catalog
#[derive(Parser, Debug)]
#[command(name = "catalog-mender")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Recover catalog rows for images missing from the database
    Recover {
        /// Path to invokeai.db
        #[arg(long)]
        db: PathBuf,

        /// InvokeAI outputs directory (the one containing `images/`)
        #[arg(long)]
        outputs: PathBuf,

        /// Report what would be recovered without writing
        #[arg(long)]
        dry_run: bool,

        /// Output format
        #[arg(short, long, default_value = "pretty")]
        output: OutputFormat,

        /// Verbose output
        #[arg(short, long)]
        verbose: bool,
    },

    /// Change the category of every image on a board
    Reclassify {
        /// Path to invokeai.db
        #[arg(long)]
        db: PathBuf,

        /// Board name, matched case-insensitively
        #[arg(long)]
        board_name: String,

        /// Classification to apply
        #[arg(short, long, default_value = "assets")]
        target: Target,

        /// Report what would change without writing
        #[arg(long)]
        dry_run: bool,

        /// Output format
        #[arg(short, long, default_value = "pretty")]
        output: OutputFormat,

        /// Verbose output
        #[arg(short, long)]
        verbose: bool,
    },
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum Target {
    /// Uploaded assets (user / external)
    Assets,
    /// Generated images (general / internal)
    General,
}

impl From<Target> for Classification {
    fn from(target: Target) -> Self {
        match target {
            Target::Assets => Classification::ASSET,
            Target::General => Classification::GENERAL,
        }
    }
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum OutputFormat {
    /// Human-readable output with colors
    Pretty,
    /// JSON output for scripting
    Json,
}

/// Run the CLI, mapping failures to an exit status
pub fn main() -> ExitCode {
    match run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(error) => {
            Term::stderr()
                .write_line(&format!("{} {}", style("error:").red().bold(), error))
                .ok();
            ExitCode::from(exit_code(error.kind()))
        }
    }
}

fn exit_code(kind: ErrorKind) -> u8 {
    match kind {
        ErrorKind::Other => 1,
        ErrorKind::PathNotFound => 2,
        ErrorKind::StoreUnreachable => 3,
        ErrorKind::GroupNotFound => 4,
        ErrorKind::ConstraintViolation => 5,
    }
}

/// Parse arguments and dispatch
pub fn run() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Recover {
            db,
            outputs,
            dry_run,
            output,
            verbose,
        } => run_recover(&db, &outputs, dry_run, output, verbose),
        Commands::Reclassify {
            db,
            board_name,
            target,
            dry_run,
            output,
            verbose,
        } => run_reclassify(&db, board_name, target.into(), dry_run, output, verbose),
    }
}

fn run_recover(
    db: &Path,
    outputs: &Path,
    dry_run: bool,
    output: OutputFormat,
    verbose: bool,
) -> Result<()> {
    catalog_mender::init_tracing(verbose);
    let term = Term::stderr();

    if matches!(output, OutputFormat::Pretty) {
        print_header(&term);
    }

    let mut catalog = Catalog::open(db)?;
    let reconciler = Reconciler::builder()
        .images_root(outputs.join(IMAGES_DIR))
        .dry_run(dry_run)
        .build()?;

    let (sender, receiver) = EventChannel::new();
    let progress = spawn_progress(receiver, output, verbose);

    let result = reconciler.run_with_events(&mut catalog, &sender);

    // Drop sender to signal event thread to finish
    drop(sender);
    progress.join().ok();

    let report = result?;
    match output {
        OutputFormat::Pretty => print_recover_pretty(&term, &report, verbose),
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&report)?),
    }

    Ok(())
}

fn run_reclassify(
    db: &Path,
    board_name: String,
    target: Classification,
    dry_run: bool,
    output: OutputFormat,
    verbose: bool,
) -> Result<()> {
    catalog_mender::init_tracing(verbose);
    let term = Term::stderr();

    if matches!(output, OutputFormat::Pretty) {
        print_header(&term);
    }

    let mut catalog = Catalog::open(db)?;
    let reclassifier = Reclassifier::new(board_name).target(target).dry_run(dry_run);

    let (sender, receiver) = EventChannel::new();
    let progress = spawn_progress(receiver, output, verbose);

    let result = reclassifier.run_with_events(&mut catalog, &sender);

    drop(sender);
    progress.join().ok();

    let report = result?;
    match output {
        OutputFormat::Pretty => print_reclassify_pretty(&term, &report, verbose),
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&report)?),
    }

    Ok(())
}

/// Render progress events on stderr until the sender is dropped
fn spawn_progress(receiver: EventReceiver, output: OutputFormat, verbose: bool) -> JoinHandle<()> {
    let progress = if matches!(output, OutputFormat::Pretty) {
        let pb = ProgressBar::new(0);
        if let Ok(bar_style) = ProgressStyle::default_bar()
            .template("{spinner:.green} [{bar:40.cyan/blue}] {pos}/{len} {msg}")
        {
            pb.set_style(bar_style.progress_chars("█▓░"));
        }
        Some(pb)
    } else {
        None
    };

    thread::spawn(move || {
        let Some(pb) = progress else {
            // Drain so senders never see a full channel
            for _ in receiver.iter() {}
            return;
        };

        for event in receiver.iter() {
            match event {
                Event::Scan(ScanEvent::Started { root }) => {
                    pb.set_message(format!("scanning {}", root.display()));
                }
                Event::Scan(ScanEvent::Skipped { path, message }) if verbose => {
                    pb.println(format!("  {} {} ({})", style("skipped").yellow(), path.display(), message));
                }
                Event::Recover(RecoverEvent::OrphansFound { total }) => {
                    pb.set_length(total as u64);
                    pb.set_message("recovering");
                }
                Event::Recover(RecoverEvent::BoardReady { board_name, created, .. }) if verbose => {
                    let verb = if created { "creating" } else { "reusing" };
                    pb.println(format!("  {} board {}", verb, style(board_name).cyan()));
                }
                Event::Recover(RecoverEvent::ImageRecovered { image_name, .. }) => {
                    pb.inc(1);
                    if verbose {
                        pb.set_message(image_name);
                    }
                }
                Event::Reclassify(ReclassifyEvent::BoardResolved { board_name, members, .. }) => {
                    pb.set_length(members as u64);
                    pb.set_message(format!("updating {}", board_name));
                }
                Event::Reclassify(ReclassifyEvent::Completed { updated, .. }) => {
                    pb.set_position(updated as u64);
                    pb.finish_and_clear();
                }
                Event::Recover(RecoverEvent::Completed { .. }) => {
                    pb.finish_and_clear();
                }
                _ => {}
            }
        }
        pb.finish_and_clear();
    })
}

fn print_header(term: &Term) {
    term.write_line(&format!(
        "{} {}",
        style("Catalog Mender").bold().cyan(),
        style(concat!("v", env!("CARGO_PKG_VERSION"))).dim()
    ))
    .ok();
    term.write_line("").ok();
}

fn print_recover_pretty(term: &Term, report: &ReconcileReport, verbose: bool) {
    term.write_line(&format!("{} Recovery Complete", style("✓").green().bold()))
        .ok();
    term.write_line("").ok();

    term.write_line(&format!(
        "  {} images scanned in {:.1}s",
        style(report.scanned).cyan(),
        report.duration_ms as f64 / 1000.0
    ))
    .ok();
    term.write_line(&format!(
        "  {} already in the catalog",
        style(report.already_cataloged).cyan()
    ))
    .ok();

    let Some(board) = &report.board else {
        term.write_line("").ok();
        term.write_line(&format!(
            "  {} Nothing to recover, the catalog matches the outputs folder.",
            style("✓").green()
        ))
        .ok();
        return;
    };

    term.write_line(&format!(
        "  {} recovered into {} ({})",
        style(report.recovered.len()).green(),
        style(&board.board_name).bold(),
        if report.board_created { "new board" } else { "existing board" }
    ))
    .ok();

    if report.metadata_unavailable > 0 {
        term.write_line(&format!(
            "  {} without readable metadata",
            style(report.metadata_unavailable).yellow()
        ))
        .ok();
    }

    if verbose {
        term.write_line("").ok();
        for image in &report.recovered {
            let marker = if image.metadata_recovered {
                style("●").green().to_string()
            } else {
                style("○").yellow().to_string()
            };
            term.write_line(&format!(
                "    {} {} {}",
                marker,
                image.image_name,
                style(format!("{}x{}", image.width, image.height)).dim()
            ))
            .ok();
        }
    }

    print_footer(term, report.dry_run);
}

fn print_reclassify_pretty(term: &Term, report: &ReclassifyReport, verbose: bool) {
    term.write_line(&format!("{} Reclassification Complete", style("✓").green().bold()))
        .ok();
    term.write_line("").ok();

    term.write_line(&format!(
        "  Board {} ({} images)",
        style(&report.board.board_name).bold(),
        style(report.members).cyan()
    ))
    .ok();
    term.write_line(&format!(
        "  {} set to {}",
        style(report.updated).green(),
        style(report.target).yellow()
    ))
    .ok();

    if !report.skipped.is_empty() {
        term.write_line(&format!(
            "  {} linked images have no catalog row",
            style(report.skipped.len()).yellow()
        ))
        .ok();
        if verbose {
            for name in &report.skipped {
                term.write_line(&format!("    {} {}", style("○").dim(), name)).ok();
            }
        }
    }

    print_footer(term, report.dry_run);
}

fn print_footer(term: &Term, dry_run: bool) {
    term.write_line("").ok();
    if dry_run {
        term.write_line(&format!(
            "{}",
            style("Dry run: the transaction was rolled back, nothing was written.").dim()
        ))
        .ok();
    }
}
