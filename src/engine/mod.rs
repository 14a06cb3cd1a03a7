//! Core engine: the fetch → classify → act → reschedule loop.

pub mod classifier;
pub mod monitor;

pub use classifier::{ReferencePrices, Thresholds};
pub use monitor::Monitor;
