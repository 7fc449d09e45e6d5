//! # Catalog Module
//!
//! Typed access to the InvokeAI catalog: `images`, `boards` and `board_images`.
//!
//! ## Transactions
//! Every read and write goes through a [`CatalogTx`] obtained from
//! [`Catalog::transaction`]. The transaction takes the write lock up front
//! (`BEGIN IMMEDIATE`) and rolls back when dropped without [`CatalogTx::commit`],
//! so an early return or a panic never leaves a half-written run behind.
//!
//! ## Example
//! ```rust,ignore
//! let mut catalog = Catalog::open(Path::new("invokeai.db"))?;
//! let tx = catalog.transaction()?;
//! let known = tx.list_known_image_names()?;
//! tx.commit()?;
//! ```

pub mod schema;
mod types;

pub use types::{
    BoardRecord, BulkUpdate, Classification, ImageCategory, ImageOrigin, NewImage,
};

use crate::error::CatalogError;
use rusqlite::{params, Connection, OpenFlags, Transaction, TransactionBehavior};
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use std::time::Duration;
use uuid::Uuid;

/// Timestamp layout written to `created_at` / `updated_at`
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S%.6f";

/// How board names are compared
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NameMatch {
    /// Byte-for-byte equality
    Exact,
    /// Unicode lowercase on both sides
    CaseInsensitive,
}

impl NameMatch {
    fn key(&self, name: &str) -> String {
        match self {
            NameMatch::Exact => name.to_string(),
            NameMatch::CaseInsensitive => name.to_lowercase(),
        }
    }
}

/// Options for opening a catalog
#[derive(Debug, Clone)]
pub struct CatalogOptions {
    /// How long to wait for another connection's lock
    pub busy_timeout: Duration,
}

impl Default for CatalogOptions {
    fn default() -> Self {
        Self {
            busy_timeout: Duration::from_secs(5),
        }
    }
}

/// An open catalog database
///
/// Owns the only connection used for a run; it is closed when dropped.
pub struct Catalog {
    conn: Connection,
    path: PathBuf,
}

impl Catalog {
    /// Open an existing catalog with default options
    pub fn open(path: &Path) -> Result<Self, CatalogError> {
        Self::open_with(path, CatalogOptions::default())
    }

    /// Open an existing catalog
    ///
    /// The file is never created: a missing path is `NotFound`, and a file
    /// that is not an InvokeAI database fails schema verification.
    pub fn open_with(path: &Path, options: CatalogOptions) -> Result<Self, CatalogError> {
        if !path.is_file() {
            return Err(CatalogError::NotFound {
                path: path.to_path_buf(),
            });
        }

        let unreachable = |e: rusqlite::Error| CatalogError::Unreachable {
            path: path.to_path_buf(),
            reason: e.to_string(),
        };

        let conn = Connection::open_with_flags(
            path,
            OpenFlags::SQLITE_OPEN_READ_WRITE | OpenFlags::SQLITE_OPEN_NO_MUTEX,
        )
        .map_err(unreachable)?;

        conn.busy_timeout(options.busy_timeout).map_err(unreachable)?;

        // Touch the header so "file is not a database" surfaces here
        conn.query_row("SELECT COUNT(*) FROM sqlite_master", [], |row| {
            row.get::<_, i64>(0)
        })
        .map_err(unreachable)?;

        conn.execute_batch("PRAGMA foreign_keys = ON;")
            .map_err(unreachable)?;

        schema::verify(&conn)?;

        tracing::debug!(path = %path.display(), "opened catalog");

        Ok(Self {
            conn,
            path: path.to_path_buf(),
        })
    }

    /// Path of the database file
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Begin the run's transaction
    pub fn transaction(&mut self) -> Result<CatalogTx<'_>, CatalogError> {
        let path = self.path.as_path();
        let tx = self
            .conn
            .transaction_with_behavior(TransactionBehavior::Immediate)
            .map_err(|e| locate(e, path))?;
        Ok(CatalogTx { tx, path })
    }
}

/// Convert a SQLite error, naming the catalog file when it was locked
fn locate(error: rusqlite::Error, path: &Path) -> CatalogError {
    match CatalogError::from(error) {
        CatalogError::Unreachable { reason, .. } => CatalogError::Unreachable {
            path: path.to_path_buf(),
            reason,
        },
        other => other,
    }
}

/// A scoped catalog transaction
///
/// Dropping it without calling [`CatalogTx::commit`] rolls everything back.
pub struct CatalogTx<'conn> {
    tx: Transaction<'conn>,
    path: &'conn Path,
}

impl CatalogTx<'_> {
    /// All `image_name` values in `images`
    pub fn list_known_image_names(&self) -> Result<BTreeSet<String>, CatalogError> {
        let mut stmt = self.tx.prepare("SELECT image_name FROM images")?;
        let names = stmt
            .query_map([], |row| row.get(0))?
            .collect::<Result<BTreeSet<String>, _>>()?;
        Ok(names)
    }

    /// Look a board up by name
    ///
    /// Board names are not unique; when several match, the one with the
    /// lowest `board_id` wins so repeated lookups agree.
    pub fn find_board_by_name(
        &self,
        name: &str,
        matching: NameMatch,
    ) -> Result<Option<BoardRecord>, CatalogError> {
        let wanted = matching.key(name);

        let mut stmt = self
            .tx
            .prepare("SELECT board_id, board_name, created_at FROM boards ORDER BY board_id ASC")?;
        let mut rows = stmt.query([])?;

        while let Some(row) = rows.next()? {
            let board_name: String = row.get(1)?;
            if matching.key(&board_name) == wanted {
                return Ok(Some(BoardRecord {
                    board_id: row.get(0)?,
                    board_name,
                    created_at: row.get(2)?,
                }));
            }
        }
        Ok(None)
    }

    /// Insert a new board with a generated UUID key
    ///
    /// Timestamps come from the table defaults, the same clock InvokeAI
    /// uses for boards it creates itself.
    pub fn create_board(&self, name: &str) -> Result<BoardRecord, CatalogError> {
        let board_id = Uuid::new_v4().to_string();

        self.tx.execute(
            "INSERT INTO boards (board_id, board_name) VALUES (?1, ?2)",
            params![board_id, name],
        )?;

        let created_at = self.tx.query_row(
            "SELECT created_at FROM boards WHERE board_id = ?1",
            [&board_id],
            |row| row.get(0),
        )?;

        Ok(BoardRecord {
            board_id,
            board_name: name.to_string(),
            created_at,
        })
    }

    /// Image names linked to a board, sorted
    pub fn list_members(&self, board_id: &str) -> Result<Vec<String>, CatalogError> {
        let mut stmt = self.tx.prepare(
            "SELECT image_name FROM board_images WHERE board_id = ?1 ORDER BY image_name ASC",
        )?;
        let members = stmt
            .query_map([board_id], |row| row.get(0))?
            .collect::<Result<Vec<String>, _>>()?;
        Ok(members)
    }

    /// Insert one image row; an existing `image_name` is a constraint violation
    pub fn insert_image(&self, image: &NewImage) -> Result<(), CatalogError> {
        self.tx.execute(
            "INSERT INTO images (
                image_name, image_origin, image_category, width, height,
                metadata, is_intermediate, created_at, updated_at, has_workflow
             ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)",
            params![
                image.image_name,
                image.classification.origin.as_str(),
                image.classification.category.as_str(),
                image.width as i64,
                image.height as i64,
                image.metadata,
                image.is_intermediate,
                image.created_at.format(TIMESTAMP_FORMAT).to_string(),
                image.updated_at.format(TIMESTAMP_FORMAT).to_string(),
                image.has_workflow,
            ],
        )?;
        Ok(())
    }

    /// Link an image to a board; a duplicate link is a constraint violation
    pub fn insert_membership(&self, board_id: &str, image_name: &str) -> Result<(), CatalogError> {
        self.tx.execute(
            "INSERT INTO board_images (board_id, image_name) VALUES (?1, ?2)",
            params![board_id, image_name],
        )?;
        Ok(())
    }

    /// Set category and origin on every listed image
    ///
    /// Names without a row are reported in `skipped` rather than failing;
    /// a membership can outlive the image it points at.
    pub fn bulk_update_category(
        &self,
        image_names: &[String],
        classification: Classification,
    ) -> Result<BulkUpdate, CatalogError> {
        let mut stmt = self.tx.prepare(
            "UPDATE images SET image_category = ?1, image_origin = ?2 WHERE image_name = ?3",
        )?;

        let mut result = BulkUpdate::default();
        for name in image_names {
            let changed = stmt.execute(params![
                classification.category.as_str(),
                classification.origin.as_str(),
                name,
            ])?;
            if changed == 0 {
                result.skipped.push(name.clone());
            } else {
                result.updated += changed;
            }
        }
        Ok(result)
    }

    /// Make the run's changes permanent
    pub fn commit(self) -> Result<(), CatalogError> {
        let path = self.path;
        self.tx.commit().map_err(|e| locate(e, path))
    }

    /// Discard the run's changes
    pub fn rollback(self) -> Result<(), CatalogError> {
        let path = self.path;
        self.tx.rollback().map_err(|e| locate(e, path))
    }
}
