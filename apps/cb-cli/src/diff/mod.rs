//! Reconciliation primitives
//!
//! - `set`: all-pairs Added/Removed partition with optional hooks
//! - `keyed`: one-to-one matching on a declared unique key
//! - `columns`: schema column diff with platform-owned column filters
//! - `fields`: top-level field comparison for whole-asset updates

pub mod columns;
pub mod fields;
pub mod keyed;
pub mod set;

pub use columns::{diff_columns, is_default_column, DefaultColumns};
pub use fields::{changed_fields, FieldChange};
pub use keyed::{diff_keyed, diff_keyed_by, Changed, FieldPolicy, Keyed, KeyedDiff};
pub use set::{diff, diff_by, Diff, Reconciler};
