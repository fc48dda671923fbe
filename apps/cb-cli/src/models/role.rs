//! Roles and permission entries

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Identity of the item a permission applies to. The platform accepts
/// either the id or the name; collections are usually referenced by id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemInfo {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default)]
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PermissionEntry {
    #[serde(rename = "itemInfo")]
    pub item_info: ItemInfo,
    /// Bit mask of read/create/update/delete levels.
    pub permissions: u32,
}

impl PermissionEntry {
    pub fn named(name: impl Into<String>, permissions: u32) -> Self {
        Self {
            item_info: ItemInfo {
                id: None,
                name: name.into(),
            },
            permissions,
        }
    }

    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.item_info.id = Some(id.into());
        self
    }

    /// Matching key: the id when present, otherwise the name.
    pub fn identity(&self) -> &str {
        self.item_info
            .id
            .as_deref()
            .filter(|id| !id.is_empty())
            .unwrap_or(&self.item_info.name)
    }
}

/// Per-family permission lists of a role.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RolePermissions {
    #[serde(rename = "Collections", default)]
    pub collections: Vec<PermissionEntry>,
    #[serde(rename = "CodeServices", default)]
    pub services: Vec<PermissionEntry>,
    #[serde(rename = "Portals", default)]
    pub portals: Vec<PermissionEntry>,
    #[serde(rename = "Topics", default)]
    pub topics: Vec<PermissionEntry>,
    #[serde(rename = "ServiceCaches", default)]
    pub caches: Vec<PermissionEntry>,
    /// Scalar permission families (devices, users, edges ...).
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl RolePermissions {
    /// Mutable access to every list family, paired with its name.
    pub fn families_mut(&mut self) -> [(&'static str, &mut Vec<PermissionEntry>); 5] {
        [
            ("Collections", &mut self.collections),
            ("CodeServices", &mut self.services),
            ("Portals", &mut self.portals),
            ("Topics", &mut self.topics),
            ("ServiceCaches", &mut self.caches),
        ]
    }

    pub fn families(&self) -> [(&'static str, &Vec<PermissionEntry>); 5] {
        [
            ("Collections", &self.collections),
            ("CodeServices", &self.services),
            ("Portals", &self.portals),
            ("Topics", &self.topics),
            ("ServiceCaches", &self.caches),
        ]
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Role {
    #[serde(rename = "Name")]
    pub name: String,
    #[serde(rename = "ID", default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(rename = "Description", default)]
    pub description: String,
    #[serde(rename = "Permissions", default)]
    pub permissions: RolePermissions,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}
