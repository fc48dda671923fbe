//! Schema columns and indexes

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// One column of a user, device, edge or collection table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Column {
    #[serde(rename = "ColumnName")]
    pub name: String,
    #[serde(rename = "ColumnType")]
    pub column_type: String,
    #[serde(rename = "PK", default)]
    pub primary_key: bool,
    /// `Some(false)` marks a platform-owned column.
    #[serde(
        rename = "UserDefined",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub user_defined: Option<bool>,
}

impl Column {
    pub fn new(name: impl Into<String>, column_type: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            column_type: column_type.into(),
            primary_key: false,
            user_defined: None,
        }
    }

    pub fn primary_key(mut self) -> Self {
        self.primary_key = true;
        self
    }

    pub fn user_defined(mut self, user_defined: bool) -> Self {
        self.user_defined = Some(user_defined);
        self
    }

    /// True when the platform reports this column as reserved.
    pub fn is_reserved(&self) -> bool {
        self.user_defined == Some(false)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum IndexType {
    PrimaryKey,
    Unique,
    NonUnique,
}

impl std::fmt::Display for IndexType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            IndexType::PrimaryKey => write!(f, "primary key"),
            IndexType::Unique => write!(f, "unique"),
            IndexType::NonUnique => write!(f, "non-unique"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Index {
    #[serde(rename = "Name")]
    pub name: String,
    #[serde(rename = "IndexType")]
    pub index_type: IndexType,
}

impl Index {
    pub fn new(name: impl Into<String>, index_type: IndexType) -> Self {
        Self {
            name: name.into(),
            index_type,
        }
    }
}

/// Singleton schema file (`users/schema.json`, `devices/schema.json`,
/// `edges/schema.json`).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TableSchema {
    #[serde(default)]
    pub columns: Vec<Column>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl TableSchema {
    pub fn new(columns: Vec<Column>) -> Self {
        Self {
            columns,
            extra: Map::new(),
        }
    }
}
