//! Field-level change detection for assets without a structured diff

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Fields the platform fills in or rewrites on every save.
const SERVER_OWNED_FIELDS: &[&str] = &[
    "id",
    "ID",
    "user_id",
    "collection_id",
    "collectionID",
    "item_id",
    "system_key",
    "systemKey",
    "appID",
    "owner",
    "created_at",
    "updated_at",
    "creation_date",
    "last_updated",
    "last_modified",
    "current_version",
    "version",
];

/// Represents a single field-level change within an asset
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldChange {
    /// Top-level field name
    pub path: String,
    /// Remote value (None if the remote lacks the field)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub old_value: Option<Value>,
    /// Local value
    #[serde(skip_serializing_if = "Option::is_none")]
    pub new_value: Option<Value>,
}

impl FieldChange {
    pub fn new(path: impl Into<String>, old_value: Option<Value>, new_value: Option<Value>) -> Self {
        Self {
            path: path.into(),
            old_value,
            new_value,
        }
    }
}

pub fn is_server_owned(field: &str) -> bool {
    SERVER_OWNED_FIELDS.contains(&field)
}

/// Compare the top-level fields of a local asset against its remote copy.
///
/// Only fields present locally are compared, so partially written asset
/// files do not propose clearing remote fields. Non-object inputs are
/// compared whole under the empty path.
pub fn changed_fields(local: &Value, remote: &Value) -> Vec<FieldChange> {
    let (Some(local_fields), Some(remote_fields)) = (local.as_object(), remote.as_object()) else {
        if local == remote {
            return Vec::new();
        }
        return vec![FieldChange::new("", Some(remote.clone()), Some(local.clone()))];
    };

    local_fields
        .iter()
        .filter(|(key, _)| !is_server_owned(key))
        .filter_map(|(key, value)| match remote_fields.get(key) {
            Some(existing) if equivalent(value, existing) => None,
            existing => Some(FieldChange::new(key, existing.cloned(), Some(value.clone()))),
        })
        .collect()
}

/// Numbers compare by value so `60` and `60.0` match.
fn equivalent(local: &Value, remote: &Value) -> bool {
    match (local, remote) {
        (Value::Number(a), Value::Number(b)) => a.as_f64() == b.as_f64(),
        (a, b) => a == b,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn test_identical_assets_have_no_changes() {
        let value = json!({"name": "hello", "code": "function hello() {}"});
        assert!(changed_fields(&value, &value).is_empty());
    }

    #[test]
    fn test_changed_code_is_reported() {
        let local = json!({"name": "hello", "code": "v2"});
        let remote = json!({"name": "hello", "code": "v1"});
        let changes = changed_fields(&local, &remote);
        assert_eq!(changes, vec![FieldChange::new("code", Some(json!("v1")), Some(json!("v2")))]);
    }

    #[test]
    fn test_server_owned_fields_ignored() {
        let local = json!({"name": "t", "id": "local", "version": 1});
        let remote = json!({"name": "t", "id": "remote", "version": 7});
        assert!(changed_fields(&local, &remote).is_empty());
    }

    #[test]
    fn test_remote_only_fields_ignored() {
        let local = json!({"name": "t"});
        let remote = json!({"name": "t", "run_user": "admin"});
        assert!(changed_fields(&local, &remote).is_empty());
    }

    #[test]
    fn test_field_missing_remotely_is_a_change() {
        let local = json!({"name": "t", "description": "new"});
        let remote = json!({"name": "t"});
        let changes = changed_fields(&local, &remote);
        assert_eq!(changes.len(), 1);
        assert_eq!(changes[0].old_value, None);
    }

    #[test]
    fn test_integer_and_float_forms_match() {
        let local = json!({"frequency": 60});
        let remote = json!({"frequency": 60.0});
        assert!(changed_fields(&local, &remote).is_empty());
    }
}
