//! PNG text chunk reader.
//!
//! InvokeAI stores generation parameters as `tEXt` / `iTXt` chunks written
//! before the image data, so only the header section is decoded.

use super::{apply_invokeai_metadata, ImageMetadata};
use crate::error::MetadataError;
use std::fs::File;
use std::io::BufReader;
use std::path::Path;

/// Chunk holding the generation parameters as JSON
pub const METADATA_KEY: &str = "invokeai_metadata";
/// Chunks whose presence means a workflow can be restored from the image
pub const WORKFLOW_KEYS: &[&str] = &["invokeai_graph", "invokeai_workflow"];

pub(super) fn read_png(path: &Path) -> Result<ImageMetadata, MetadataError> {
    let file = File::open(path).map_err(|source| MetadataError::Open {
        path: path.to_path_buf(),
        source,
    })?;

    let decoder = png::Decoder::new(BufReader::new(file));
    let reader = decoder.read_info().map_err(|e| MetadataError::Decode {
        path: path.to_path_buf(),
        reason: e.to_string(),
    })?;
    let info = reader.info();

    let mut chunks: Vec<(String, String)> = info
        .uncompressed_latin1_text
        .iter()
        .map(|chunk| (chunk.keyword.clone(), chunk.text.clone()))
        .collect();
    // A compressed chunk that fails to inflate is dropped, the rest still count
    chunks.extend(
        info.compressed_latin1_text
            .iter()
            .filter_map(|chunk| chunk.get_text().ok().map(|text| (chunk.keyword.clone(), text))),
    );
    chunks.extend(
        info.utf8_text
            .iter()
            .filter_map(|chunk| chunk.get_text().ok().map(|text| (chunk.keyword.clone(), text))),
    );

    let mut metadata = ImageMetadata {
        width: Some(info.width),
        height: Some(info.height),
        ..Default::default()
    };

    for (keyword, text) in chunks {
        if keyword == METADATA_KEY {
            apply_invokeai_metadata(&mut metadata, text);
        } else if WORKFLOW_KEYS.contains(&keyword.as_str()) {
            metadata.has_workflow = true;
        }
    }

    Ok(metadata)
}
