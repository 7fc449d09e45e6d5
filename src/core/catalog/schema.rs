//! Catalog schema shape.
//!
//! The engines never create or migrate tables in an operator's catalog; they
//! only check that the columns they read and write are present.

use crate::error::CatalogError;
use rusqlite::Connection;

/// Columns the engines touch, per table
pub const REQUIRED_COLUMNS: &[(&str, &[&str])] = &[
    (
        "images",
        &[
            "image_name",
            "image_origin",
            "image_category",
            "width",
            "height",
            "metadata",
            "is_intermediate",
            "has_workflow",
            "created_at",
            "updated_at",
        ],
    ),
    ("boards", &["board_id", "board_name", "created_at"]),
    ("board_images", &["board_id", "image_name"]),
];

/// Check that every required table and column exists
pub fn verify(conn: &Connection) -> Result<(), CatalogError> {
    for (table, columns) in REQUIRED_COLUMNS {
        let mut stmt = conn.prepare("SELECT name FROM pragma_table_info(?1)")?;
        let present: Vec<String> = stmt
            .query_map([*table], |row| row.get(0))?
            .collect::<Result<_, _>>()?;

        if present.is_empty() {
            return Err(CatalogError::MissingTable {
                table: table.to_string(),
            });
        }

        if let Some(column) = columns.iter().find(|c| !present.iter().any(|p| p == *c)) {
            return Err(CatalogError::MissingColumn {
                table: table.to_string(),
                column: column.to_string(),
            });
        }
    }
    Ok(())
}

/// Create an empty catalog with the InvokeAI table layout
///
/// For scratch databases and fixtures; membership is keyed by
/// `(board_id, image_name)` with foreign keys to both tables.
pub fn create_tables(conn: &Connection) -> Result<(), CatalogError> {
    conn.execute_batch(
        "
        CREATE TABLE IF NOT EXISTS images (
            image_name      TEXT NOT NULL PRIMARY KEY,
            image_origin    TEXT NOT NULL,
            image_category  TEXT NOT NULL,
            width           INTEGER NOT NULL,
            height          INTEGER NOT NULL,
            session_id      TEXT,
            node_id         TEXT,
            metadata        TEXT,
            is_intermediate BOOLEAN DEFAULT FALSE,
            created_at      DATETIME NOT NULL DEFAULT(STRFTIME('%Y-%m-%d %H:%M:%f', 'NOW')),
            updated_at      DATETIME NOT NULL DEFAULT(STRFTIME('%Y-%m-%d %H:%M:%f', 'NOW')),
            deleted_at      DATETIME,
            starred         BOOLEAN DEFAULT FALSE,
            has_workflow    BOOLEAN DEFAULT FALSE
        );

        CREATE INDEX IF NOT EXISTS idx_images_image_category ON images(image_category);
        CREATE INDEX IF NOT EXISTS idx_images_image_origin ON images(image_origin);

        CREATE TABLE IF NOT EXISTS boards (
            board_id         TEXT NOT NULL PRIMARY KEY,
            board_name       TEXT NOT NULL,
            cover_image_name TEXT,
            created_at       DATETIME NOT NULL DEFAULT(STRFTIME('%Y-%m-%d %H:%M:%f', 'NOW')),
            updated_at       DATETIME NOT NULL DEFAULT(STRFTIME('%Y-%m-%d %H:%M:%f', 'NOW')),
            deleted_at       DATETIME,
            archived         BOOLEAN DEFAULT FALSE
        );

        CREATE TABLE IF NOT EXISTS board_images (
            board_id    TEXT NOT NULL,
            image_name  TEXT NOT NULL,
            created_at  DATETIME NOT NULL DEFAULT(STRFTIME('%Y-%m-%d %H:%M:%f', 'NOW')),
            PRIMARY KEY (board_id, image_name),
            FOREIGN KEY (board_id) REFERENCES boards (board_id) ON DELETE CASCADE,
            FOREIGN KEY (image_name) REFERENCES images (image_name) ON DELETE CASCADE
        );

        CREATE INDEX IF NOT EXISTS idx_board_images_board_id ON board_images(board_id);
        ",
    )?;
    Ok(())
}
