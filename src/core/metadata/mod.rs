//! # Metadata Module
//!
//! Best-effort recovery of the metadata InvokeAI embeds in its images.
//!
//! ## Extracted Fields
//! - Pixel dimensions (PNG header, EXIF, or a decoder probe)
//! - Raw `invokeai_metadata` JSON (generation parameters), stored verbatim
//! - Whether a graph/workflow chunk is present
//! - Creation time (from the metadata JSON, or EXIF `DateTimeOriginal`)
//! - Model name
//!
//! Extraction never fails the caller: an unreadable or corrupt file yields
//! [`MetadataOutcome::Unavailable`] with the reason attached.

mod exif_tags;
mod png_text;

pub use png_text::{METADATA_KEY, WORKFLOW_KEYS};

use crate::core::scanner::ImageFormat;
use crate::error::MetadataError;
use chrono::{DateTime, NaiveDateTime};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// JSON keys checked, in order, for a creation timestamp
const CREATED_KEYS: &[&str] = &["created", "created_at", "timestamp", "time"];

/// Metadata recovered from one image
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ImageMetadata {
    /// Image width in pixels
    pub width: Option<u32>,
    /// Image height in pixels
    pub height: Option<u32>,
    /// Raw `invokeai_metadata` text, kept even when it is not valid JSON
    pub metadata_raw: Option<String>,
    /// A graph or workflow chunk is embedded
    pub has_workflow: bool,
    /// Creation time found inside the image
    pub created_at: Option<NaiveDateTime>,
    /// Model used for generation
    pub model: Option<String>,
}

/// Result of a metadata read
///
/// `Recovered` with an empty [`ImageMetadata`] means the file decoded but
/// carried nothing; `Unavailable` means it could not be read at all.
#[derive(Debug)]
pub enum MetadataOutcome {
    Recovered(ImageMetadata),
    Unavailable(MetadataError),
}

impl MetadataOutcome {
    pub fn is_recovered(&self) -> bool {
        matches!(self, MetadataOutcome::Recovered(_))
    }

    /// The recovered fields, if any
    pub fn metadata(&self) -> Option<&ImageMetadata> {
        match self {
            MetadataOutcome::Recovered(metadata) => Some(metadata),
            MetadataOutcome::Unavailable(_) => None,
        }
    }
}

/// Extract metadata from an image file
pub fn extract_metadata(path: &Path) -> MetadataOutcome {
    let result = match ImageFormat::from_path(path) {
        // A chunk the text reader rejects may not stop the image decoder
        ImageFormat::Png => png_text::read_png(path)
            .or_else(|error| probe_dimensions(path).ok_or(error)),
        ImageFormat::Jpeg | ImageFormat::WebP => match exif_tags::read_exif(path) {
            Ok(metadata) => Ok(with_probed_dimensions(path, metadata)),
            // No EXIF block is common; the decoder may still know the size
            Err(error) => probe_dimensions(path).ok_or(error),
        },
        ImageFormat::Unknown => probe_dimensions(path).ok_or_else(|| MetadataError::Decode {
            path: path.to_path_buf(),
            reason: "unrecognized image format".to_string(),
        }),
    };

    match result {
        Ok(metadata) => MetadataOutcome::Recovered(metadata),
        Err(error) => {
            tracing::debug!(path = %path.display(), "metadata unavailable: {}", error);
            MetadataOutcome::Unavailable(error)
        }
    }
}

fn probe_dimensions(path: &Path) -> Option<ImageMetadata> {
    let (width, height) = image::image_dimensions(path).ok()?;
    Some(ImageMetadata {
        width: Some(width),
        height: Some(height),
        ..Default::default()
    })
}

fn with_probed_dimensions(path: &Path, mut metadata: ImageMetadata) -> ImageMetadata {
    if metadata.width.is_none() || metadata.height.is_none() {
        if let Some(probed) = probe_dimensions(path) {
            metadata.width = probed.width;
            metadata.height = probed.height;
        }
    }
    metadata
}

/// Fill fields derived from an `invokeai_metadata` chunk
fn apply_invokeai_metadata(metadata: &mut ImageMetadata, raw: String) {
    if let Ok(serde_json::Value::Object(fields)) = serde_json::from_str::<serde_json::Value>(&raw) {
        metadata.created_at = CREATED_KEYS
            .iter()
            .filter_map(|key| fields.get(*key).and_then(|v| v.as_str()))
            .find_map(parse_timestamp);

        metadata.model = match fields.get("model") {
            Some(serde_json::Value::Object(model)) => {
                model.get("name").and_then(|v| v.as_str()).map(str::to_string)
            }
            Some(serde_json::Value::String(name)) => Some(name.clone()),
            _ => None,
        };
    }
    metadata.metadata_raw = Some(raw);
}

/// Parse the timestamp shapes InvokeAI and its plugins have written
fn parse_timestamp(value: &str) -> Option<NaiveDateTime> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(value) {
        return Some(dt.naive_local());
    }
    ["%Y-%m-%dT%H:%M:%S%.fZ", "%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%d %H:%M:%S"]
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(value, format).ok())
}
