//! Asset kinds and their static properties

use serde::{Deserialize, Serialize};
use std::fmt;

/// Type tag of a synchronizable asset.
///
/// Declaration order is the legacy pipeline order: referenced entities
/// (roles, schemas, code) come before the entities that reference them by
/// id. `Ord` follows declaration order, so sorting by kind yields the
/// order in which a bulk push processes them.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, clap::ValueEnum,
)]
#[serde(rename_all = "kebab-case")]
pub enum AssetKind {
    Role,
    UserSchema,
    User,
    SharedCache,
    Library,
    Service,
    Collection,
    Trigger,
    Timer,
    DeviceSchema,
    Device,
    EdgeSchema,
    Edge,
    Portal,
    Plugin,
    Adaptor,
    Deployment,
    Webhook,
    ExternalDatabase,
    BucketSet,
    Secret,
    FileStore,
}

impl AssetKind {
    /// Every kind, in pipeline order.
    pub const ALL: [AssetKind; 22] = [
        AssetKind::Role,
        AssetKind::UserSchema,
        AssetKind::User,
        AssetKind::SharedCache,
        AssetKind::Library,
        AssetKind::Service,
        AssetKind::Collection,
        AssetKind::Trigger,
        AssetKind::Timer,
        AssetKind::DeviceSchema,
        AssetKind::Device,
        AssetKind::EdgeSchema,
        AssetKind::Edge,
        AssetKind::Portal,
        AssetKind::Plugin,
        AssetKind::Adaptor,
        AssetKind::Deployment,
        AssetKind::Webhook,
        AssetKind::ExternalDatabase,
        AssetKind::BucketSet,
        AssetKind::Secret,
        AssetKind::FileStore,
    ];

    /// Top-level directory (relative to the project root) holding this kind.
    pub fn dir(&self) -> &'static str {
        match self {
            AssetKind::Service => "code/services",
            AssetKind::Library => "code/libraries",
            AssetKind::Collection => "data",
            AssetKind::User | AssetKind::UserSchema => "users",
            AssetKind::Role => "roles",
            AssetKind::Trigger => "triggers",
            AssetKind::Timer => "timers",
            AssetKind::Device | AssetKind::DeviceSchema => "devices",
            AssetKind::Edge | AssetKind::EdgeSchema => "edges",
            AssetKind::Portal => "portals",
            AssetKind::Plugin => "plugins",
            AssetKind::Adaptor => "adapters",
            AssetKind::Deployment => "deployments",
            AssetKind::Webhook => "webhooks",
            AssetKind::ExternalDatabase => "external-databases",
            AssetKind::BucketSet => "bucket-sets",
            AssetKind::Secret => "secrets",
            AssetKind::SharedCache => "shared-caches",
            AssetKind::FileStore => "file-stores",
        }
    }

    /// Key used for this kind in server-computed dry-run responses.
    pub fn wire_key(&self) -> &'static str {
        match self {
            AssetKind::Service => "services",
            AssetKind::Library => "libraries",
            AssetKind::Collection => "collections",
            AssetKind::User => "users",
            AssetKind::UserSchema => "userSchema",
            AssetKind::Role => "roles",
            AssetKind::Trigger => "triggers",
            AssetKind::Timer => "timers",
            AssetKind::Device => "devices",
            AssetKind::DeviceSchema => "deviceSchema",
            AssetKind::Edge => "edges",
            AssetKind::EdgeSchema => "edgeSchema",
            AssetKind::Portal => "portals",
            AssetKind::Plugin => "plugins",
            AssetKind::Adaptor => "adaptors",
            AssetKind::Deployment => "deployments",
            AssetKind::Webhook => "webhooks",
            AssetKind::ExternalDatabase => "externalDatabases",
            AssetKind::BucketSet => "bucketSets",
            AssetKind::Secret => "secrets",
            AssetKind::SharedCache => "sharedCaches",
            AssetKind::FileStore => "fileStores",
        }
    }

    /// Look a kind up by its dry-run wire key.
    pub fn from_wire_key(key: &str) -> Option<AssetKind> {
        AssetKind::ALL.into_iter().find(|k| k.wire_key() == key)
    }

    /// Section title used when rendering a plan.
    pub fn section_title(&self) -> &'static str {
        match self {
            AssetKind::Service => "Code Services",
            AssetKind::Library => "Code Libraries",
            AssetKind::Collection => "Collections",
            AssetKind::User => "Users",
            AssetKind::UserSchema => "User Schema",
            AssetKind::Role => "Roles",
            AssetKind::Trigger => "Triggers",
            AssetKind::Timer => "Timers",
            AssetKind::Device => "Devices",
            AssetKind::DeviceSchema => "Device Schema",
            AssetKind::Edge => "Edges",
            AssetKind::EdgeSchema => "Edge Schema",
            AssetKind::Portal => "Portals",
            AssetKind::Plugin => "Plugins",
            AssetKind::Adaptor => "Adaptors",
            AssetKind::Deployment => "Deployments",
            AssetKind::Webhook => "Webhooks",
            AssetKind::ExternalDatabase => "External Databases",
            AssetKind::BucketSet => "Bucket Sets",
            AssetKind::Secret => "Secrets",
            AssetKind::SharedCache => "Shared Caches",
            AssetKind::FileStore => "File Stores",
        }
    }

    /// Schema kinds are singletons: one per system, no name.
    pub fn is_schema(&self) -> bool {
        matches!(
            self,
            AssetKind::UserSchema | AssetKind::DeviceSchema | AssetKind::EdgeSchema
        )
    }

    /// Kinds the platform addresses by a generated id rather than by name.
    /// Their name→id mapping is kept in a local cache.
    pub fn is_id_addressed(&self) -> bool {
        matches!(
            self,
            AssetKind::Collection | AssetKind::User | AssetKind::Role
        )
    }

    /// Kinds a remote without unified upload support can still push.
    pub fn is_code(&self) -> bool {
        matches!(self, AssetKind::Service | AssetKind::Library)
    }
}

impl fmt::Display for AssetKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            AssetKind::Service => "service",
            AssetKind::Library => "library",
            AssetKind::Collection => "collection",
            AssetKind::User => "user",
            AssetKind::UserSchema => "user schema",
            AssetKind::Role => "role",
            AssetKind::Trigger => "trigger",
            AssetKind::Timer => "timer",
            AssetKind::Device => "device",
            AssetKind::DeviceSchema => "device schema",
            AssetKind::Edge => "edge",
            AssetKind::EdgeSchema => "edge schema",
            AssetKind::Portal => "portal",
            AssetKind::Plugin => "plugin",
            AssetKind::Adaptor => "adaptor",
            AssetKind::Deployment => "deployment",
            AssetKind::Webhook => "webhook",
            AssetKind::ExternalDatabase => "external database",
            AssetKind::BucketSet => "bucket set",
            AssetKind::Secret => "secret",
            AssetKind::SharedCache => "shared cache",
            AssetKind::FileStore => "file store",
        };
        write!(f, "{name}")
    }
}
