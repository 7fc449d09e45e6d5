//! Fixtures shared by the unit tests.

use crate::core::catalog::{schema, Catalog, Classification, NewImage};
use chrono::{NaiveDate, NaiveDateTime};
use rusqlite::Connection;
use std::fs::File;
use std::io::BufWriter;
use std::path::Path;
use tempfile::TempDir;

/// Write a small RGB PNG carrying the given `tEXt` chunks
pub fn write_png(path: &Path, width: u32, height: u32, text: &[(&str, &str)]) {
    let file = File::create(path).unwrap();
    let mut encoder = png::Encoder::new(BufWriter::new(file), width, height);
    encoder.set_color(png::ColorType::Rgb);
    encoder.set_depth(png::BitDepth::Eight);
    for (keyword, value) in text {
        encoder
            .add_text_chunk(keyword.to_string(), value.to_string())
            .unwrap();
    }
    let mut writer = encoder.write_header().unwrap();
    let data = vec![127u8; (width * height * 3) as usize];
    writer.write_image_data(&data).unwrap();
}

/// Write a PNG whose `tEXt` chunk carries `payload` verbatim
pub fn write_png_with_raw_text(path: &Path, width: u32, height: u32, payload: &[u8]) {
    let file = File::create(path).unwrap();
    let mut encoder = png::Encoder::new(BufWriter::new(file), width, height);
    encoder.set_color(png::ColorType::Rgb);
    encoder.set_depth(png::BitDepth::Eight);
    let mut writer = encoder.write_header().unwrap();
    writer.write_chunk(png::chunk::tEXt, payload).unwrap();
    let data = vec![127u8; (width * height * 3) as usize];
    writer.write_image_data(&data).unwrap();
}

/// Fixed timestamp used by [`new_image`]
pub fn fixed_time() -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2025, 11, 21)
        .unwrap()
        .and_hms_opt(10, 15, 30)
        .unwrap()
}

/// A `general` / `internal` row for `name`
pub fn new_image(name: &str) -> NewImage {
    NewImage {
        image_name: name.to_string(),
        classification: Classification::GENERAL,
        is_intermediate: false,
        width: 8,
        height: 8,
        metadata: None,
        has_workflow: false,
        created_at: fixed_time(),
        updated_at: fixed_time(),
    }
}

/// Fresh catalog file already holding rows for `images`
pub fn catalog_with(images: &[&str]) -> (TempDir, Catalog) {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("invokeai.db");
    {
        let conn = Connection::open(&path).unwrap();
        schema::create_tables(&conn).unwrap();
        for name in images {
            conn.execute(
                "INSERT INTO images (image_name, image_origin, image_category, width, height)
                 VALUES (?1, 'internal', 'general', 8, 8)",
                [name],
            )
            .unwrap();
        }
    }
    let catalog = Catalog::open(&path).unwrap();
    (dir, catalog)
}

/// Run fixture SQL on a side connection
pub fn execute(catalog: &Catalog, sql: &str) {
    Connection::open(catalog.path())
        .unwrap()
        .execute_batch(sql)
        .unwrap();
}

/// Selected columns of one `images` row
#[derive(Debug)]
pub struct ImageRow {
    pub category: String,
    pub origin: String,
    pub is_intermediate: bool,
    pub width: i64,
    pub height: i64,
    pub metadata: Option<String>,
    pub has_workflow: bool,
    pub created_at: String,
    pub updated_at: String,
}

pub fn image_row(catalog: &Catalog, name: &str) -> ImageRow {
    let conn = Connection::open(catalog.path()).unwrap();
    conn.query_row(
        "SELECT image_category, image_origin, is_intermediate, width, height,
                metadata, has_workflow, created_at, updated_at
         FROM images WHERE image_name = ?1",
        [name],
        |row| {
            Ok(ImageRow {
                category: row.get(0)?,
                origin: row.get(1)?,
                is_intermediate: row.get(2)?,
                width: row.get(3)?,
                height: row.get(4)?,
                metadata: row.get(5)?,
                has_workflow: row.get(6)?,
                created_at: row.get(7)?,
                updated_at: row.get(8)?,
            })
        },
    )
    .unwrap()
}

/// Number of rows in `table`
pub fn count(catalog: &Catalog, table: &str) -> i64 {
    Connection::open(catalog.path())
        .unwrap()
        .query_row(&format!("SELECT COUNT(*) FROM {}", table), [], |row| row.get(0))
        .unwrap()
}

/// `(board_name, image_name)` for every membership, sorted
pub fn memberships(catalog: &Catalog) -> Vec<(String, String)> {
    let conn = Connection::open(catalog.path()).unwrap();
    let mut stmt = conn
        .prepare(
            "SELECT b.board_name, bi.image_name
             FROM board_images bi JOIN boards b ON b.board_id = bi.board_id
             ORDER BY b.board_name, bi.image_name",
        )
        .unwrap();
    let rows = stmt
        .query_map([], |row| Ok((row.get(0)?, row.get(1)?)))
        .unwrap()
        .collect::<Result<Vec<_>, _>>()
        .unwrap();
    rows
}
