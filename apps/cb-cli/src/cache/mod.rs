//! Local id-mapping caches (collection name → id, user email → id,
//! role name → id) kept under `.cb-cli/`.

pub mod ids;

pub use ids::{IdCache, IdCaches};
