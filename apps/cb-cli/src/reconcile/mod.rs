//! Applying local assets to a remote system
//!
//! - `orchestrator`: per-asset create/update with minimal deltas
//! - `libraries`: dependency postorder of code libraries
//! - `permissions`: role permission de-duplication and comparison

pub mod libraries;
pub mod orchestrator;
pub mod permissions;

pub use libraries::{library_order, postorder};
pub use orchestrator::{default_columns, needs_update, remote_only, Orchestrator, RunMode};
pub use permissions::{dedupe, dedupe_role, permissions_differ};
