//! Event type definitions for progress reporting.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// All events emitted by the repair engines
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Event {
    /// Outputs folder scanning
    Scan(ScanEvent),
    /// Orphan recovery
    Recover(RecoverEvent),
    /// Board reclassification
    Reclassify(ReclassifyEvent),
}

/// Events while walking the outputs folder
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum ScanEvent {
    /// Scanning has started
    Started { root: PathBuf },
    /// An entry was skipped (walk error, unreadable directory)
    Skipped { path: PathBuf, message: String },
    /// Scanning completed
    Completed { total_files: usize },
}

/// Events while recovering orphaned files
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum RecoverEvent {
    /// The on-disk / catalog diff is known
    OrphansFound { total: usize },
    /// The recovery board was created or reused
    BoardReady {
        board_id: String,
        board_name: String,
        created: bool,
    },
    /// One orphan was inserted and linked
    ImageRecovered {
        image_name: String,
        /// Whether embedded metadata could be read
        metadata: bool,
    },
    /// The run finished (committed, or rolled back for a dry run)
    Completed { recovered: usize, dry_run: bool },
}

/// Events while reclassifying a board
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum ReclassifyEvent {
    /// The board name resolved to a record
    BoardResolved {
        board_id: String,
        board_name: String,
        members: usize,
    },
    /// The batch update finished
    Completed {
        updated: usize,
        skipped: usize,
        dry_run: bool,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn events_are_serializable() {
        let event = Event::Recover(RecoverEvent::BoardReady {
            board_id: "b-1".to_string(),
            board_name: "Recovered 18-10-26".to_string(),
            created: true,
        });

        let json = serde_json::to_string(&event).unwrap();
        let deserialized: Event = serde_json::from_str(&json).unwrap();

        match deserialized {
            Event::Recover(RecoverEvent::BoardReady { board_name, created, .. }) => {
                assert_eq!(board_name, "Recovered 18-10-26");
                assert!(created);
            }
            _ => panic!("Wrong event type"),
        }
    }
}
