//! # Reclassify Module
//!
//! Moves every image on a board between the "generated" and "asset" views
//! of the gallery by rewriting `image_category` and `image_origin`.
//!
//! Boards are found by name, ignoring case. Board membership and
//! `is_intermediate` are never touched, so running twice changes nothing
//! the second time.

use crate::core::catalog::{BoardRecord, Catalog, Classification, NameMatch};
use crate::error::{RepairError, Result};
use crate::events::{null_sender, Event, EventSender, ReclassifyEvent};
use serde::{Deserialize, Serialize};

/// Result of a reclassification run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReclassifyReport {
    /// Board that was resolved
    pub board: BoardRecord,
    /// Classification written
    pub target: Classification,
    /// Images linked to the board
    pub members: usize,
    /// Rows rewritten
    pub updated: usize,
    /// Members with no `images` row
    pub skipped: Vec<String>,
    pub dry_run: bool,
}

/// Reclassifies the images of one board
#[derive(Debug, Clone)]
pub struct Reclassifier {
    board_name: String,
    target: Classification,
    dry_run: bool,
}

impl Reclassifier {
    /// Target the board called `board_name`, converting to assets by default
    pub fn new(board_name: impl Into<String>) -> Self {
        Self {
            board_name: board_name.into(),
            target: Classification::ASSET,
            dry_run: false,
        }
    }

    /// Set the classification to write
    pub fn target(mut self, target: Classification) -> Self {
        self.target = target;
        self
    }

    /// Report what would change without committing it
    pub fn dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    pub fn run(&self, catalog: &mut Catalog) -> Result<ReclassifyReport> {
        self.run_with_events(catalog, &null_sender())
    }

    pub fn run_with_events(
        &self,
        catalog: &mut Catalog,
        events: &EventSender,
    ) -> Result<ReclassifyReport> {
        let tx = catalog.transaction()?;

        // Dropping the transaction on this path releases the lock unchanged
        let board = tx
            .find_board_by_name(&self.board_name, NameMatch::CaseInsensitive)?
            .ok_or_else(|| RepairError::BoardNotFound {
                name: self.board_name.clone(),
            })?;

        let members = tx.list_members(&board.board_id)?;
        events.send(Event::Reclassify(ReclassifyEvent::BoardResolved {
            board_id: board.board_id.clone(),
            board_name: board.board_name.clone(),
            members: members.len(),
        }));

        let result = tx.bulk_update_category(&members, self.target)?;
        for name in &result.skipped {
            tracing::warn!(board = %board.board_name, image = %name, "board links an image with no catalog row");
        }

        if self.dry_run {
            tx.rollback()?;
        } else {
            tx.commit()?;
        }

        tracing::info!(
            board = %board.board_name,
            target = %self.target,
            members = members.len(),
            updated = result.updated,
            dry_run = self.dry_run,
            "reclassification finished"
        );
        events.send(Event::Reclassify(ReclassifyEvent::Completed {
            updated: result.updated,
            skipped: result.skipped.len(),
            dry_run: self.dry_run,
        }));

        Ok(ReclassifyReport {
            board,
            target: self.target,
            members: members.len(),
            updated: result.updated,
            skipped: result.skipped,
            dry_run: self.dry_run,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::test_support::{catalog_with, count, execute, image_row, memberships};
    use crate::error::ErrorKind;

    /// Board "Imports" holding a, b and c; d sits on no board
    fn imports_catalog() -> (tempfile::TempDir, Catalog) {
        let (dir, catalog) = catalog_with(&["a.png", "b.png", "c.png", "d.png"]);
        execute(
            &catalog,
            "INSERT INTO boards (board_id, board_name) VALUES ('board-1', 'Imports');
             INSERT INTO board_images (board_id, image_name) VALUES ('board-1', 'a.png');
             INSERT INTO board_images (board_id, image_name) VALUES ('board-1', 'b.png');
             INSERT INTO board_images (board_id, image_name) VALUES ('board-1', 'c.png');
             UPDATE images SET is_intermediate = 1 WHERE image_name = 'b.png';",
        );
        (dir, catalog)
    }

    #[test]
    fn lowercase_name_finds_board_and_converts_members() {
        let (_dir, mut catalog) = imports_catalog();

        let report = Reclassifier::new("imports").run(&mut catalog).unwrap();

        assert_eq!(report.board.board_name, "Imports");
        assert_eq!(report.members, 3);
        assert_eq!(report.updated, 3);
        assert!(report.skipped.is_empty());
        for name in ["a.png", "b.png", "c.png"] {
            let row = image_row(&catalog, name);
            assert_eq!((row.category.as_str(), row.origin.as_str()), ("user", "external"));
        }
        let untouched = image_row(&catalog, "d.png");
        assert_eq!((untouched.category.as_str(), untouched.origin.as_str()), ("general", "internal"));
    }

    #[test]
    fn membership_and_intermediate_flag_are_untouched() {
        let (_dir, mut catalog) = imports_catalog();
        let before = memberships(&catalog);

        Reclassifier::new("IMPORTS").run(&mut catalog).unwrap();

        assert_eq!(memberships(&catalog), before);
        assert!(image_row(&catalog, "b.png").is_intermediate);
        assert!(!image_row(&catalog, "a.png").is_intermediate);
    }

    #[test]
    fn second_run_changes_nothing() {
        let (_dir, mut catalog) = imports_catalog();
        let reclassifier = Reclassifier::new("Imports");

        reclassifier.run(&mut catalog).unwrap();
        let second = reclassifier.run(&mut catalog).unwrap();

        assert_eq!(second.updated, 3);
        assert_eq!(image_row(&catalog, "c.png").category, "user");
        assert_eq!(image_row(&catalog, "d.png").category, "general");
    }

    #[test]
    fn unknown_board_leaves_catalog_unchanged() {
        let (_dir, mut catalog) = imports_catalog();
        let before = std::fs::read(catalog.path()).unwrap();

        let err = Reclassifier::new("Exports").run(&mut catalog).unwrap_err();

        assert_eq!(err.kind(), ErrorKind::GroupNotFound);
        assert!(err.to_string().contains("Exports"));
        assert_eq!(std::fs::read(catalog.path()).unwrap(), before);
    }

    #[test]
    fn empty_board_is_a_noop() {
        let (_dir, mut catalog) = catalog_with(&["a.png"]);
        execute(
            &catalog,
            "INSERT INTO boards (board_id, board_name) VALUES ('board-9', 'Empty');",
        );

        let report = Reclassifier::new("empty").run(&mut catalog).unwrap();

        assert_eq!(report.members, 0);
        assert_eq!(report.updated, 0);
        assert_eq!(image_row(&catalog, "a.png").category, "general");
    }

    #[test]
    fn stale_member_is_skipped() {
        let (_dir, mut catalog) = imports_catalog();
        execute(
            &catalog,
            "PRAGMA foreign_keys = OFF;
             INSERT INTO board_images (board_id, image_name) VALUES ('board-1', 'gone.png');",
        );

        let report = Reclassifier::new("imports").run(&mut catalog).unwrap();

        assert_eq!(report.members, 4);
        assert_eq!(report.updated, 3);
        assert_eq!(report.skipped, vec!["gone.png"]);
        assert_eq!(count(&catalog, "images"), 4);
    }

    #[test]
    fn general_target_reverses_conversion() {
        let (_dir, mut catalog) = imports_catalog();
        Reclassifier::new("imports").run(&mut catalog).unwrap();

        let report = Reclassifier::new("imports")
            .target(Classification::GENERAL)
            .run(&mut catalog)
            .unwrap();

        assert_eq!(report.target, Classification::GENERAL);
        let row = image_row(&catalog, "a.png");
        assert_eq!((row.category.as_str(), row.origin.as_str()), ("general", "internal"));
    }

    #[test]
    fn dry_run_reports_without_writing() {
        let (_dir, mut catalog) = imports_catalog();

        let report = Reclassifier::new("imports")
            .dry_run(true)
            .run(&mut catalog)
            .unwrap();

        assert!(report.dry_run);
        assert_eq!(report.updated, 3);
        assert_eq!(image_row(&catalog, "a.png").category, "general");
    }
}
