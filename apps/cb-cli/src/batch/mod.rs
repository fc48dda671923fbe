//! Per-asset outcome tracking and progress reporting for bulk operations

pub mod progress;
pub mod result;

pub use progress::ImportProgress;
pub use result::{ApplyItem, ApplyOutcome, ApplyReport};
