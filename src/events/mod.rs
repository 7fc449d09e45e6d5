//! # Events Module
//!
//! Event-driven progress reporting for repair runs.
//!
//! ## Design
//! The core engines emit events through channels, so the CLI (or any other
//! front end) can render progress while the engines stay single-threaded
//! and terminal-agnostic.
//!
//! ## Example
//! ```rust,ignore
//! let (sender, receiver) = EventChannel::new();
//!
//! std::thread::spawn(move || {
//!     for event in receiver.iter() {
//!         if let Event::Recover(RecoverEvent::ImageRecovered { image_name, .. }) = event {
//!             println!("recovered {}", image_name);
//!         }
//!     }
//! });
//!
//! reconciler.run_with_events(&mut catalog, &sender)?;
//! ```

mod channel;
mod types;

pub use channel::{null_sender, EventChannel, EventReceiver, EventSender};
pub use types::*;
