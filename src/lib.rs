//! # Catalog Mender
//!
//! Repairs an InvokeAI image catalog after it drifts away from the files on disk.
//!
//! ## Core Philosophy
//! - **All or nothing** - every run is one transaction, a failure leaves the catalog untouched
//! - **Never touch the outputs** - image files are only read, never written or moved
//! - **Best-effort metadata** - a corrupt PNG still gets a catalog row
//!
//! ## Architecture
//! The library is split into a core engine (UI-agnostic) and presentation layers:
//! - `core` - scanner, metadata, catalog access, reconciliation and reclassification
//! - `events` - Event-driven progress reporting
//! - `error` - User-friendly error types
//! - `cli` - Command-line interface (binary only)

pub mod core;
pub mod error;
pub mod events;

// Re-export commonly used types at the crate root
pub use error::{ErrorKind, RepairError, Result};

use tracing_subscriber::EnvFilter;

/// Initialize tracing for the library
///
/// `RUST_LOG` takes precedence; otherwise `verbose` selects between
/// `debug` and `warn`. Output goes to stderr so JSON on stdout stays clean.
pub fn init_tracing(verbose: bool) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(if verbose { "debug" } else { "warn" }));

    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .finish();

    // A second call (e.g. from tests) keeps the first subscriber
    let _ = tracing::subscriber::set_global_default(subscriber);
}
