//! # Core Module
//!
//! The UI-agnostic catalog repair engine.
//!
//! ## Modules
//! - `scanner` - Enumerates image files under the outputs folder
//! - `metadata` - Recovers metadata embedded in image files
//! - `catalog` - Typed, transactional access to the SQLite catalog
//! - `reconcile` - Inserts catalog rows for orphaned files
//! - `reclassify` - Bulk-changes the category of a board's images

pub mod catalog;
pub mod metadata;
pub mod reclassify;
pub mod reconcile;
pub mod scanner;

#[cfg(test)]
pub(crate) mod test_support;

// Re-export commonly used types
pub use catalog::{BoardRecord, Catalog, Classification};
pub use metadata::{ImageMetadata, MetadataOutcome};
pub use reclassify::{ReclassifyReport, Reclassifier};
pub use reconcile::{ReconcileReport, Reconciler};
pub use scanner::ImageFile;
