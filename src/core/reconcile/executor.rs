//! Reconciliation run implementation.

use crate::core::catalog::{
    BoardRecord, Catalog, CatalogTx, Classification, NameMatch, NewImage,
};
use crate::core::metadata::{extract_metadata, MetadataOutcome};
use crate::core::scanner::{ImageFile, OutputsScanner, ScanConfig};
use crate::error::{RepairError, Result};
use crate::events::{null_sender, Event, EventSender, RecoverEvent, ScanEvent};
use chrono::{DateTime, Local, NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::Instant;

/// Prefix of every recovery board name
pub const BOARD_NAME_PREFIX: &str = "Recovered ";

/// Name of the recovery board for `date`, e.g. `Recovered 21-11-25`
pub fn recovery_board_name(date: NaiveDate) -> String {
    format!("{}{}", BOARD_NAME_PREFIX, date.format("%d-%m-%y"))
}

/// One row inserted (or, on a dry run, that would be inserted)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecoveredImage {
    pub image_name: String,
    pub width: u32,
    pub height: u32,
    pub has_workflow: bool,
    /// Embedded metadata could be read
    pub metadata_recovered: bool,
    pub created_at: NaiveDateTime,
}

/// Result of a reconciliation run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReconcileReport {
    /// Folder that was scanned
    pub images_root: PathBuf,
    /// Image files found on disk
    pub scanned: usize,
    /// Files that already had a catalog row
    pub already_cataloged: usize,
    /// Orphans given a row, in name order
    pub recovered: Vec<RecoveredImage>,
    /// Board the orphans were linked to; `None` when nothing was missing
    pub board: Option<BoardRecord>,
    /// Whether the board was created by this run or reused
    pub board_created: bool,
    /// Recovered files whose metadata could not be read
    pub metadata_unavailable: usize,
    pub dry_run: bool,
    /// Duration in milliseconds
    pub duration_ms: u64,
}

impl ReconcileReport {
    /// Nothing was missing from the catalog
    pub fn is_noop(&self) -> bool {
        self.recovered.is_empty()
    }
}

/// Configuration for a reconciliation run
#[derive(Debug, Clone, Default)]
pub struct ReconcileConfig {
    /// The outputs `images/` folder
    pub images_root: PathBuf,
    /// Date used in the board name; today when unset
    pub date: Option<NaiveDate>,
    /// Roll back instead of committing
    pub dry_run: bool,
    /// Scanner configuration
    pub scan_config: ScanConfig,
}

/// Builder for reconciliation runs
#[derive(Default)]
pub struct ReconcilerBuilder {
    images_root: Option<PathBuf>,
    config: ReconcileConfig,
}

impl ReconcilerBuilder {
    /// Create a new builder
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the folder to scan
    pub fn images_root(mut self, root: impl Into<PathBuf>) -> Self {
        self.images_root = Some(root.into());
        self
    }

    /// Pin the date used for the recovery board name
    pub fn date(mut self, date: NaiveDate) -> Self {
        self.config.date = Some(date);
        self
    }

    /// Report what would change without committing it
    pub fn dry_run(mut self, dry_run: bool) -> Self {
        self.config.dry_run = dry_run;
        self
    }

    /// Set scanner configuration
    pub fn scan_config(mut self, config: ScanConfig) -> Self {
        self.config.scan_config = config;
        self
    }

    /// Build the reconciler
    pub fn build(self) -> Result<Reconciler> {
        let images_root = self
            .images_root
            .ok_or_else(|| RepairError::Config("images root is required".to_string()))?;

        Ok(Reconciler {
            config: ReconcileConfig {
                images_root,
                ..self.config
            },
        })
    }
}

/// Recovers catalog rows for image files the catalog has lost track of
pub struct Reconciler {
    config: ReconcileConfig,
}

impl Reconciler {
    /// Create a new reconciler builder
    pub fn builder() -> ReconcilerBuilder {
        ReconcilerBuilder::new()
    }

    /// The folder this reconciler scans
    pub fn images_root(&self) -> &Path {
        &self.config.images_root
    }

    /// Run without events
    pub fn run(&self, catalog: &mut Catalog) -> Result<ReconcileReport> {
        self.run_with_events(catalog, &null_sender())
    }

    /// Run with event reporting
    pub fn run_with_events(
        &self,
        catalog: &mut Catalog,
        events: &EventSender,
    ) -> Result<ReconcileReport> {
        let start_time = Instant::now();
        let root = &self.config.images_root;

        // Scan before locking the catalog
        let scanner = OutputsScanner::new(self.config.scan_config.clone());
        let on_disk: BTreeMap<String, ImageFile> = scanner
            .files_with_events(root, events)?
            .map(|file| (file.image_name.clone(), file))
            .collect();

        events.send(Event::Scan(ScanEvent::Completed {
            total_files: on_disk.len(),
        }));

        let tx = catalog.transaction()?;
        let known = tx.list_known_image_names()?;

        let orphans: Vec<&ImageFile> = on_disk
            .values()
            .filter(|file| !known.contains(&file.image_name))
            .collect();

        tracing::debug!(
            scanned = on_disk.len(),
            cataloged = known.len(),
            orphans = orphans.len(),
            "diffed outputs against catalog"
        );
        events.send(Event::Recover(RecoverEvent::OrphansFound {
            total: orphans.len(),
        }));

        let mut report = ReconcileReport {
            images_root: root.clone(),
            scanned: on_disk.len(),
            already_cataloged: on_disk.len() - orphans.len(),
            recovered: Vec::with_capacity(orphans.len()),
            board: None,
            board_created: false,
            metadata_unavailable: 0,
            dry_run: self.config.dry_run,
            duration_ms: 0,
        };

        if orphans.is_empty() {
            tx.rollback()?;
            tracing::info!(scanned = report.scanned, "catalog already matches outputs");
        } else {
            let date = self
                .config
                .date
                .unwrap_or_else(|| Local::now().date_naive());
            let (board, created) = resolve_board(&tx, &recovery_board_name(date))?;

            events.send(Event::Recover(RecoverEvent::BoardReady {
                board_id: board.board_id.clone(),
                board_name: board.board_name.clone(),
                created,
            }));

            for file in orphans {
                let outcome = extract_metadata(&file.path);
                let image = synthesize_row(file, &outcome);

                tx.insert_image(&image)?;
                tx.insert_membership(&board.board_id, &image.image_name)?;

                tracing::debug!(
                    image = %image.image_name,
                    metadata = outcome.is_recovered(),
                    "recovered image"
                );
                events.send(Event::Recover(RecoverEvent::ImageRecovered {
                    image_name: image.image_name.clone(),
                    metadata: outcome.is_recovered(),
                }));

                if !outcome.is_recovered() {
                    report.metadata_unavailable += 1;
                }
                report.recovered.push(RecoveredImage {
                    image_name: image.image_name,
                    width: image.width,
                    height: image.height,
                    has_workflow: image.has_workflow,
                    metadata_recovered: outcome.is_recovered(),
                    created_at: image.created_at,
                });
            }

            if self.config.dry_run {
                tx.rollback()?;
            } else {
                tx.commit()?;
            }

            tracing::info!(
                board = %board.board_name,
                recovered = report.recovered.len(),
                metadata_unavailable = report.metadata_unavailable,
                dry_run = self.config.dry_run,
                "reconciliation finished"
            );
            report.board = Some(board);
            report.board_created = created;
        }

        events.send(Event::Recover(RecoverEvent::Completed {
            recovered: report.recovered.len(),
            dry_run: self.config.dry_run,
        }));

        report.duration_ms = start_time.elapsed().as_millis() as u64;
        Ok(report)
    }
}

/// Reuse a board with exactly this name, or create it
fn resolve_board(tx: &CatalogTx<'_>, name: &str) -> Result<(BoardRecord, bool)> {
    match tx.find_board_by_name(name, NameMatch::Exact)? {
        Some(board) => {
            tracing::info!(
                board = %board.board_name,
                board_id = %board.board_id,
                "reusing existing recovery board"
            );
            Ok((board, false))
        }
        None => {
            let board = tx.create_board(name)?;
            tracing::info!(board = %board.board_name, board_id = %board.board_id, "created recovery board");
            Ok((board, true))
        }
    }
}

fn synthesize_row(file: &ImageFile, outcome: &MetadataOutcome) -> NewImage {
    let metadata = outcome.metadata();

    let created_at = metadata
        .and_then(|m| m.created_at)
        .or_else(|| modified_time(&file.path))
        .unwrap_or_else(|| Local::now().naive_local());

    NewImage {
        image_name: file.image_name.clone(),
        classification: Classification::GENERAL,
        is_intermediate: false,
        width: metadata.and_then(|m| m.width).unwrap_or(0),
        height: metadata.and_then(|m| m.height).unwrap_or(0),
        metadata: metadata.and_then(|m| m.metadata_raw.clone()),
        has_workflow: metadata.map(|m| m.has_workflow).unwrap_or(false),
        created_at,
        updated_at: created_at,
    }
}

fn modified_time(path: &Path) -> Option<NaiveDateTime> {
    let modified = std::fs::metadata(path).ok()?.modified().ok()?;
    Some(DateTime::<Local>::from(modified).naive_local())
}
