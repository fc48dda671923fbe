//! Remote platform client
//!
//! [`AssetClient`] is the seam the plan builder and the reconciler talk to;
//! [`HttpClient`] implements it over the platform REST API.

pub mod client;
pub mod resources;
pub mod retry;

pub use client::{HttpClient, DEV_TOKEN_HEADER};
pub use retry::RetryPolicy;

use async_trait::async_trait;
use serde_json::Value;
use std::fmt;

use crate::error::CliResult;
use crate::models::{Asset, AssetKind, Column, Index};
use crate::plan::{DryRunResponse, UploadResponse};

/// Address of one remote asset.
///
/// Id-addressed kinds (collections, users, roles) are reached through
/// `id` when it is known, otherwise by name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssetRef {
    pub kind: AssetKind,
    pub name: String,
    pub id: Option<String>,
}

impl AssetRef {
    pub fn new(kind: AssetKind, name: impl Into<String>) -> Self {
        Self {
            kind,
            name: name.into(),
            id: None,
        }
    }

    pub fn with_id(mut self, id: Option<impl Into<String>>) -> Self {
        self.id = id.map(Into::into);
        self
    }

    pub fn of(asset: &Asset) -> Self {
        Self::new(asset.kind(), asset.name()).with_id(asset.remote_id())
    }

    /// Identifier used in request paths.
    pub fn ident(&self) -> &str {
        match &self.id {
            Some(id) if self.kind.is_id_addressed() => id,
            _ => &self.name,
        }
    }
}

impl fmt::Display for AssetRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} '{}'", self.kind, self.name)
    }
}

/// One method per (kind × operation) against a single remote system.
#[async_trait]
pub trait AssetClient: Send + Sync {
    /// Upload capability of the remote; 5 and above support the unified upload.
    async fn upload_version(&self) -> CliResult<u32>;

    async fn get(&self, target: &AssetRef) -> CliResult<Asset>;

    async fn list(&self, kind: AssetKind) -> CliResult<Vec<Asset>>;

    /// Create an asset. Returns the platform-assigned id, if any.
    async fn create(&self, asset: &Asset) -> CliResult<Option<String>>;

    async fn update(&self, target: &AssetRef, asset: &Asset) -> CliResult<()>;

    async fn delete(&self, target: &AssetRef) -> CliResult<()>;

    /// Columns of a collection or of a user/device/edge schema.
    async fn columns(&self, target: &AssetRef) -> CliResult<Vec<Column>>;

    async fn add_column(&self, target: &AssetRef, column: &Column) -> CliResult<()>;

    async fn drop_column(&self, target: &AssetRef, column: &str) -> CliResult<()>;

    async fn indexes(&self, collection: &AssetRef) -> CliResult<Vec<Index>>;

    async fn create_index(&self, collection: &AssetRef, index: &Index) -> CliResult<()>;

    async fn drop_index(&self, collection: &AssetRef, index: &Index) -> CliResult<()>;

    async fn update_user_roles(
        &self,
        user: &AssetRef,
        add: &[String],
        remove: &[String],
    ) -> CliResult<()>;

    async fn update_device_roles(
        &self,
        device: &AssetRef,
        add: &[String],
        remove: &[String],
    ) -> CliResult<()>;

    /// Insert one page of collection items.
    async fn insert_items(&self, collection: &AssetRef, items: &[Value]) -> CliResult<()>;

    async fn dry_run_upload(&self, archive: &[u8]) -> CliResult<DryRunResponse>;

    async fn upload(&self, archive: &[u8]) -> CliResult<UploadResponse>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ident_prefers_id_for_id_addressed_kinds() {
        let collection = AssetRef::new(AssetKind::Collection, "weather").with_id(Some("c-1"));
        assert_eq!(collection.ident(), "c-1");

        let unresolved = AssetRef::new(AssetKind::User, "a@b.com");
        assert_eq!(unresolved.ident(), "a@b.com");

        let service = AssetRef::new(AssetKind::Service, "hello").with_id(Some("ignored"));
        assert_eq!(service.ident(), "hello");
    }

    #[test]
    fn test_display() {
        let target = AssetRef::new(AssetKind::Role, "Administrator");
        assert_eq!(target.to_string(), "role 'Administrator'");
    }
}
