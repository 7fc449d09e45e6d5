//! # Error Module
//!
//! Error types for catalog repair runs.
//!
//! ## Design Principles
//! - **Never panic** on user data - return errors instead
//! - **Include context** - paths, board names, what went wrong
//! - **One kind per outcome** - every fatal error maps to an [`ErrorKind`]
//!   so callers can tell a missing path from a locked catalog

use std::path::PathBuf;
use thiserror::Error;

/// Top-level application error
#[derive(Error, Debug)]
pub enum RepairError {
    #[error("Scanning error: {0}")]
    Scan(#[from] ScanError),

    #[error("Catalog error: {0}")]
    Catalog(#[from] CatalogError),

    #[error("Board '{name}' not found (names are compared case-insensitively)")]
    BoardNotFound { name: String },

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Failed to render report: {0}")]
    Render(#[from] serde_json::Error),
}

impl RepairError {
    /// Classify this error for exit codes and reporting
    pub fn kind(&self) -> ErrorKind {
        match self {
            RepairError::Scan(ScanError::DirectoryNotFound { .. }) => ErrorKind::PathNotFound,
            RepairError::Scan(_) => ErrorKind::Other,
            RepairError::Catalog(e) => e.kind(),
            RepairError::BoardNotFound { .. } => ErrorKind::GroupNotFound,
            RepairError::Config(_) | RepairError::Render(_) => ErrorKind::Other,
        }
    }
}

/// Coarse classification of fatal failures
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Outputs root or catalog file missing
    PathNotFound,
    /// Catalog cannot be opened or locked
    StoreUnreachable,
    /// Board lookup failed
    GroupNotFound,
    /// Uniqueness or referential violation during a write
    ConstraintViolation,
    Other,
}

/// Errors that occur while walking the outputs folder
#[derive(Error, Debug)]
pub enum ScanError {
    #[error("Directory not found: {path}")]
    DirectoryNotFound { path: PathBuf },

    #[error("Permission denied accessing: {path}")]
    PermissionDenied { path: PathBuf },

    #[error("Failed to read directory {path}: {source}")]
    ReadDirectory {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Reasons embedded metadata could not be read.
///
/// These never abort a run; they end up in `MetadataOutcome::Unavailable`.
#[derive(Error, Debug)]
pub enum MetadataError {
    #[error("Failed to open image file {path}: {source}")]
    Open {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to decode image {path}: {reason}")]
    Decode { path: PathBuf, reason: String },
}

/// Errors raised by the catalog accessor
#[derive(Error, Debug)]
pub enum CatalogError {
    #[error("Catalog database not found: {path}")]
    NotFound { path: PathBuf },

    #[error("Cannot open catalog at {path}: {reason}")]
    Unreachable { path: PathBuf, reason: String },

    #[error("Catalog is missing table '{table}'. Is this an InvokeAI database?")]
    MissingTable { table: String },

    #[error("Catalog table '{table}' is missing column '{column}'")]
    MissingColumn { table: String, column: String },

    #[error("Constraint violation: {0}. The catalog was left unchanged.")]
    ConstraintViolation(String),

    #[error("Database query failed: {0}")]
    QueryFailed(String),
}

impl CatalogError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            CatalogError::NotFound { .. } => ErrorKind::PathNotFound,
            CatalogError::Unreachable { .. } => ErrorKind::StoreUnreachable,
            CatalogError::ConstraintViolation(_) => ErrorKind::ConstraintViolation,
            CatalogError::MissingTable { .. }
            | CatalogError::MissingColumn { .. }
            | CatalogError::QueryFailed(_) => ErrorKind::Other,
        }
    }
}

impl From<rusqlite::Error> for CatalogError {
    fn from(error: rusqlite::Error) -> Self {
        use rusqlite::ErrorCode;

        match error {
            rusqlite::Error::SqliteFailure(ref failure, ref message) => match failure.code {
                ErrorCode::ConstraintViolation => CatalogError::ConstraintViolation(
                    message.clone().unwrap_or_else(|| failure.to_string()),
                ),
                ErrorCode::DatabaseBusy | ErrorCode::DatabaseLocked => CatalogError::Unreachable {
                    path: PathBuf::new(),
                    reason: error.to_string(),
                },
                _ => CatalogError::QueryFailed(error.to_string()),
            },
            other => CatalogError::QueryFailed(other.to_string()),
        }
    }
}

/// Convenience Result type alias
pub type Result<T> = std::result::Result<T, RepairError>;
