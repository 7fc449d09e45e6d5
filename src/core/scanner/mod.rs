//! # Scanner Module
//!
//! Enumerates image files below an outputs `images/` folder.
//!
//! The scan is lazy: [`OutputsScanner::files`] returns an iterator that walks
//! the tree as it is consumed. Calling `files` again starts a fresh walk.
//!
//! ## Layout
//! InvokeAI writes `outputs/images/<name>.png` and keeps derived thumbnails in
//! `outputs/images/thumbnails/`. Thumbnail folders are never entered.
//!
//! ## Example
//! ```rust,ignore
//! use catalog_mender::core::scanner::{OutputsScanner, ScanConfig};
//!
//! let scanner = OutputsScanner::new(ScanConfig::default());
//! for file in scanner.files(Path::new("/invokeai/outputs/images"))? {
//!     println!("{}", file.image_name);
//! }
//! ```

mod filter;
mod walker;

pub use filter::{ImageFilter, DEFAULT_EXTENSIONS};
pub use walker::{ImageFiles, OutputsScanner, ScanConfig};

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// An image file discovered on disk
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageFile {
    /// Path to the file
    pub path: PathBuf,
    /// Catalog key: path relative to the scan root, `/`-separated
    pub image_name: String,
}

/// Image formats the metadata extractor knows about
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ImageFormat {
    Png,
    Jpeg,
    WebP,
    Unknown,
}

impl ImageFormat {
    /// Detect format from file extension
    pub fn from_extension(ext: &str) -> Self {
        match ext.to_lowercase().as_str() {
            "png" => ImageFormat::Png,
            "jpg" | "jpeg" => ImageFormat::Jpeg,
            "webp" => ImageFormat::WebP,
            _ => ImageFormat::Unknown,
        }
    }

    /// Detect format from a path's extension
    pub fn from_path(path: &std::path::Path) -> Self {
        path.extension()
            .and_then(|e| e.to_str())
            .map(Self::from_extension)
            .unwrap_or(ImageFormat::Unknown)
    }
}
