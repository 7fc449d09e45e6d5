//! EXIF fallback for non-PNG images (JPEG, WebP).

use super::ImageMetadata;
use crate::error::MetadataError;
use chrono::NaiveDateTime;
use exif::{In, Reader, Tag, Value};
use std::fs::File;
use std::io::BufReader;
use std::path::Path;

/// Read capture time and pixel dimensions from an EXIF block
pub(super) fn read_exif(path: &Path) -> Result<ImageMetadata, MetadataError> {
    let file = File::open(path).map_err(|source| MetadataError::Open {
        path: path.to_path_buf(),
        source,
    })?;

    let mut bufreader = BufReader::new(&file);
    let exif_reader = Reader::new()
        .read_from_container(&mut bufreader)
        .map_err(|e| MetadataError::Decode {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

    let mut metadata = ImageMetadata::default();

    if let Some(field) = exif_reader.get_field(Tag::DateTimeOriginal, In::PRIMARY) {
        if let Value::Ascii(ref vec) = field.value {
            if let Some(s) = vec.first().and_then(|b| std::str::from_utf8(b).ok()) {
                // EXIF date format: "YYYY:MM:DD HH:MM:SS"
                metadata.created_at = NaiveDateTime::parse_from_str(s, "%Y:%m:%d %H:%M:%S").ok();
            }
        }
    }

    // Prefer actual pixel dimensions, then the image width/height tags
    metadata.width = exif_reader
        .get_field(Tag::PixelXDimension, In::PRIMARY)
        .or_else(|| exif_reader.get_field(Tag::ImageWidth, In::PRIMARY))
        .and_then(|field| get_u32_value(&field.value));
    metadata.height = exif_reader
        .get_field(Tag::PixelYDimension, In::PRIMARY)
        .or_else(|| exif_reader.get_field(Tag::ImageLength, In::PRIMARY))
        .and_then(|field| get_u32_value(&field.value));

    Ok(metadata)
}

/// Helper to extract u32 from various EXIF value types
fn get_u32_value(value: &Value) -> Option<u32> {
    match value {
        Value::Long(vec) => vec.first().copied(),
        Value::Short(vec) => vec.first().map(|v| *v as u32),
        _ => None,
    }
}
