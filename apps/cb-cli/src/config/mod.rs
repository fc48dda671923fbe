//! Project configuration: paths, tunables and the remotes registry

pub mod paths;
pub mod remotes;
pub mod settings;

pub use paths::{ConfigPaths, IdCacheKind};
pub use remotes::{validate_remote_name, Remote, Remotes};
pub use settings::{Config, RetrySettings};
