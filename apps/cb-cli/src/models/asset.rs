//! Typed assets
//!
//! Every synchronizable unit is one variant of [`Asset`], each carrying a
//! struct with the fields the reconciler reads typed. Fields the CLI does
//! not interpret are kept in a flattened `extra` map so a pull followed by
//! a push never drops platform data. Wire JSON is only produced or parsed
//! at the boundary ([`Asset::from_wire`], [`Asset::to_wire`]).

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::kind::AssetKind;
use super::role::Role;
use super::schema::{Column, Index, TableSchema};
use crate::error::{CliError, CliResult};

/// Name reported for singleton schema assets.
pub const SCHEMA_NAME: &str = "schema";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Service {
    pub name: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub code: String,
    /// Comma separated library names.
    #[serde(default)]
    pub dependencies: String,
    #[serde(default)]
    pub parameters: Vec<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Library {
    pub name: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub code: String,
    /// Comma separated library names.
    #[serde(default)]
    pub dependencies: String,
    #[serde(default)]
    pub description: String,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Library {
    /// Declared dependencies, trimmed, empty entries removed.
    pub fn dependency_names(&self) -> Vec<&str> {
        self.dependencies
            .split(',')
            .map(str::trim)
            .filter(|d| !d.is_empty())
            .collect()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Collection {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub collection_id: Option<String>,
    #[serde(default)]
    pub schema: Vec<Column>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub indexes: Vec<Index>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub items: Vec<Value>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    pub email: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_id: Option<String>,
    /// Role names from `users/roles/<email>.json`; `None` when no file exists.
    #[serde(skip)]
    pub roles: Option<Vec<String>>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Device {
    pub name: String,
    #[serde(rename = "type", default)]
    pub device_type: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub enabled: Option<bool>,
    /// Role names from `devices/roles/<name>.json`; `None` when no file exists.
    #[serde(skip)]
    pub roles: Option<Vec<String>>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Edge {
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Trigger {
    pub name: String,
    #[serde(default)]
    pub service_name: String,
    #[serde(default)]
    pub def_module: String,
    #[serde(default)]
    pub def_name: String,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Timer {
    pub name: String,
    #[serde(default)]
    pub service_name: String,
    #[serde(default)]
    pub frequency: i64,
    #[serde(default)]
    pub repeats: i64,
    #[serde(default)]
    pub start_time: String,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Portal {
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub config: Value,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Plugin {
    pub name: String,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Adaptor {
    pub name: String,
    #[serde(default)]
    pub architecture: String,
    #[serde(default)]
    pub description: String,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Deployment {
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Webhook {
    pub name: String,
    #[serde(default)]
    pub service_name: String,
    #[serde(default)]
    pub description: String,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExternalDatabase {
    pub name: String,
    #[serde(default)]
    pub dbtype: String,
    /// Connection credentials; `password` is never stored on disk.
    #[serde(default)]
    pub credentials: Map<String, Value>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BucketSet {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub platform_storage: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub edge_storage: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Secret {
    pub name: String,
    #[serde(default)]
    pub secret: Value,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SharedCache {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ttl: Option<i64>,
    #[serde(default)]
    pub description: String,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FileStore {
    pub name: String,
    #[serde(default)]
    pub storage_type: String,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// One synchronizable asset, tagged by kind.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Asset {
    Service(Service),
    Library(Library),
    Collection(Collection),
    User(User),
    UserSchema(TableSchema),
    Role(Role),
    Trigger(Trigger),
    Timer(Timer),
    Device(Device),
    DeviceSchema(TableSchema),
    Edge(Edge),
    EdgeSchema(TableSchema),
    Portal(Portal),
    Plugin(Plugin),
    Adaptor(Adaptor),
    Deployment(Deployment),
    Webhook(Webhook),
    ExternalDatabase(ExternalDatabase),
    BucketSet(BucketSet),
    Secret(Secret),
    SharedCache(SharedCache),
    FileStore(FileStore),
}

impl Asset {
    pub fn kind(&self) -> AssetKind {
        match self {
            Asset::Service(_) => AssetKind::Service,
            Asset::Library(_) => AssetKind::Library,
            Asset::Collection(_) => AssetKind::Collection,
            Asset::User(_) => AssetKind::User,
            Asset::UserSchema(_) => AssetKind::UserSchema,
            Asset::Role(_) => AssetKind::Role,
            Asset::Trigger(_) => AssetKind::Trigger,
            Asset::Timer(_) => AssetKind::Timer,
            Asset::Device(_) => AssetKind::Device,
            Asset::DeviceSchema(_) => AssetKind::DeviceSchema,
            Asset::Edge(_) => AssetKind::Edge,
            Asset::EdgeSchema(_) => AssetKind::EdgeSchema,
            Asset::Portal(_) => AssetKind::Portal,
            Asset::Plugin(_) => AssetKind::Plugin,
            Asset::Adaptor(_) => AssetKind::Adaptor,
            Asset::Deployment(_) => AssetKind::Deployment,
            Asset::Webhook(_) => AssetKind::Webhook,
            Asset::ExternalDatabase(_) => AssetKind::ExternalDatabase,
            Asset::BucketSet(_) => AssetKind::BucketSet,
            Asset::Secret(_) => AssetKind::Secret,
            Asset::SharedCache(_) => AssetKind::SharedCache,
            Asset::FileStore(_) => AssetKind::FileStore,
        }
    }

    /// Human name of the asset: email for users, `schema` for schemas.
    pub fn name(&self) -> &str {
        match self {
            Asset::Service(a) => &a.name,
            Asset::Library(a) => &a.name,
            Asset::Collection(a) => &a.name,
            Asset::User(a) => &a.email,
            Asset::UserSchema(_) | Asset::DeviceSchema(_) | Asset::EdgeSchema(_) => SCHEMA_NAME,
            Asset::Role(a) => &a.name,
            Asset::Trigger(a) => &a.name,
            Asset::Timer(a) => &a.name,
            Asset::Device(a) => &a.name,
            Asset::Edge(a) => &a.name,
            Asset::Portal(a) => &a.name,
            Asset::Plugin(a) => &a.name,
            Asset::Adaptor(a) => &a.name,
            Asset::Deployment(a) => &a.name,
            Asset::Webhook(a) => &a.name,
            Asset::ExternalDatabase(a) => &a.name,
            Asset::BucketSet(a) => &a.name,
            Asset::Secret(a) => &a.name,
            Asset::SharedCache(a) => &a.name,
            Asset::FileStore(a) => &a.name,
        }
    }

    /// Platform-assigned id, for kinds addressed by id.
    pub fn remote_id(&self) -> Option<&str> {
        match self {
            Asset::Collection(c) => c.collection_id.as_deref(),
            Asset::User(u) => u.user_id.as_deref(),
            Asset::Role(r) => r.id.as_deref(),
            _ => None,
        }
    }

    /// Parse wire JSON of the given kind.
    pub fn from_wire(kind: AssetKind, value: Value) -> CliResult<Asset> {
        let parsed = match kind {
            AssetKind::Service => serde_json::from_value(value).map(Asset::Service),
            AssetKind::Library => serde_json::from_value(value).map(Asset::Library),
            AssetKind::Collection => serde_json::from_value(value).map(Asset::Collection),
            AssetKind::User => serde_json::from_value(value).map(Asset::User),
            AssetKind::UserSchema => serde_json::from_value(value).map(Asset::UserSchema),
            AssetKind::Role => serde_json::from_value(value).map(Asset::Role),
            AssetKind::Trigger => serde_json::from_value(value).map(Asset::Trigger),
            AssetKind::Timer => serde_json::from_value(value).map(Asset::Timer),
            AssetKind::Device => serde_json::from_value(value).map(Asset::Device),
            AssetKind::DeviceSchema => serde_json::from_value(value).map(Asset::DeviceSchema),
            AssetKind::Edge => serde_json::from_value(value).map(Asset::Edge),
            AssetKind::EdgeSchema => serde_json::from_value(value).map(Asset::EdgeSchema),
            AssetKind::Portal => serde_json::from_value(value).map(Asset::Portal),
            AssetKind::Plugin => serde_json::from_value(value).map(Asset::Plugin),
            AssetKind::Adaptor => serde_json::from_value(value).map(Asset::Adaptor),
            AssetKind::Deployment => serde_json::from_value(value).map(Asset::Deployment),
            AssetKind::Webhook => serde_json::from_value(value).map(Asset::Webhook),
            AssetKind::ExternalDatabase => {
                serde_json::from_value(value).map(Asset::ExternalDatabase)
            }
            AssetKind::BucketSet => serde_json::from_value(value).map(Asset::BucketSet),
            AssetKind::Secret => serde_json::from_value(value).map(Asset::Secret),
            AssetKind::SharedCache => serde_json::from_value(value).map(Asset::SharedCache),
            AssetKind::FileStore => serde_json::from_value(value).map(Asset::FileStore),
        };

        parsed.map_err(|e| CliError::Validation(format!("Malformed {kind}: {e}")))
    }

    /// Serialize to wire JSON.
    pub fn to_wire(&self) -> CliResult<Value> {
        serde_json::to_value(self).map_err(Into::into)
    }

    /// Schema columns, for schema-bearing assets.
    pub fn columns(&self) -> Option<&[Column]> {
        match self {
            Asset::UserSchema(s) | Asset::DeviceSchema(s) | Asset::EdgeSchema(s) => {
                Some(&s.columns)
            }
            Asset::Collection(c) => Some(&c.schema),
            _ => None,
        }
    }
}
