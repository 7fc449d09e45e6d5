//! # Reconcile Module
//!
//! Brings the catalog back in line with the outputs folder.
//!
//! ## Stages
//! 1. **Scan** - List every image file below the images root
//! 2. **Diff** - Subtract the names already present in `images`
//! 3. **Board** - Resolve today's `Recovered <dd-mm-yy>` board
//! 4. **Insert** - Add one row and one board link per orphan
//!
//! Stages 2-4 run inside a single catalog transaction. An empty diff writes
//! nothing, so running twice in a row is a no-op the second time.

mod executor;

pub use executor::{
    recovery_board_name, ReconcileConfig, ReconcileReport, RecoveredImage, Reconciler,
    ReconcilerBuilder, BOARD_NAME_PREFIX,
};
