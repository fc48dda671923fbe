//! Data models shared across the CLI

pub mod asset;
pub mod kind;
pub mod role;
pub mod schema;
pub mod system;

pub use asset::{
    Adaptor, Asset, BucketSet, Collection, Deployment, Device, Edge, ExternalDatabase, FileStore,
    Library, Plugin, Portal, Secret, Service, SharedCache, Timer, Trigger, User, Webhook,
    SCHEMA_NAME,
};
pub use kind::AssetKind;
pub use role::{ItemInfo, PermissionEntry, Role, RolePermissions};
pub use schema::{Column, Index, IndexType, TableSchema};
pub use system::SystemMeta;
