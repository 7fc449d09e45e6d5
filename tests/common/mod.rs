//! Fixtures shared by the integration tests.

#![allow(dead_code)]

use catalog_mender::core::catalog::schema;
use rusqlite::Connection;
use std::fs::{self, File};
use std::io::BufWriter;
use std::path::{Path, PathBuf};

/// Write a small RGB PNG with optional text chunks, creating parent folders
pub fn write_png(path: &Path, width: u32, height: u32, text: &[(&str, &str)]) {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).unwrap();
    }
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
    writer
        .write_image_data(&vec![0u8; (width * height * 3) as usize])
        .unwrap();
}

/// Create `invokeai.db` in `dir` holding `general` rows for `images`
pub fn create_catalog(dir: &Path, images: &[&str]) -> PathBuf {
    let path = dir.join("invokeai.db");
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
    path
}

/// Add a board and link `images` to it
pub fn add_board(db: &Path, board_id: &str, name: &str, images: &[&str]) {
    let conn = Connection::open(db).unwrap();
    conn.execute(
        "INSERT INTO boards (board_id, board_name) VALUES (?1, ?2)",
        [board_id, name],
    )
    .unwrap();
    for image in images {
        conn.execute(
            "INSERT INTO board_images (board_id, image_name) VALUES (?1, ?2)",
            [board_id, image],
        )
        .unwrap();
    }
}

pub fn count(db: &Path, table: &str) -> i64 {
    Connection::open(db)
        .unwrap()
        .query_row(&format!("SELECT COUNT(*) FROM {}", table), [], |row| row.get(0))
        .unwrap()
}

/// `(image_category, image_origin)` of one image
pub fn classification(db: &Path, image_name: &str) -> (String, String) {
    Connection::open(db)
        .unwrap()
        .query_row(
            "SELECT image_category, image_origin FROM images WHERE image_name = ?1",
            [image_name],
            |row| Ok((row.get(0)?, row.get(1)?)),
        )
        .unwrap()
}

/// Image names linked to the board called `board_name`
pub fn board_members(db: &Path, board_name: &str) -> Vec<String> {
    let conn = Connection::open(db).unwrap();
    let mut stmt = conn
        .prepare(
            "SELECT bi.image_name FROM board_images bi
             JOIN boards b ON b.board_id = bi.board_id
             WHERE b.board_name = ?1 ORDER BY bi.image_name",
        )
        .unwrap();
    let members = stmt
        .query_map([board_name], |row| row.get(0))
        .unwrap()
        .collect::<Result<Vec<String>, _>>()
        .unwrap();
    members
}
