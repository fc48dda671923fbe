//! Schema column reconciliation
//!
//! User, device, edge and collection tables carry platform-owned columns
//! next to the user-defined ones. Only user-defined columns may be
//! proposed for creation or removal.

use std::collections::HashSet;

use super::keyed::FieldPolicy;
use super::set::{Diff, Reconciler};
use crate::error::CliResult;
use crate::models::Column;

/// Columns every collection gets from the platform.
pub const COLLECTION_DEFAULT_COLUMNS: &[&str] = &["item_id"];

/// Columns of the users table owned by the platform.
pub const USER_DEFAULT_COLUMNS: &[&str] = &[
    "user_id",
    "email",
    "creation_date",
    "password",
    "cb_service_account",
    "cb_token",
    "cb_ttl_override",
];

/// Columns of the devices table owned by the platform.
pub const DEVICE_DEFAULT_COLUMNS: &[&str] = &[
    "device_key",
    "name",
    "system_key",
    "type",
    "state",
    "description",
    "enabled",
    "allow_key_auth",
    "active_key",
    "keys",
    "allow_certificate_auth",
    "certificate",
    "created_date",
    "last_active_date",
    "salt",
    "has_keys",
    "cb_service_account",
    "cb_token",
    "cb_ttl_override",
];

pub fn is_default_column<S: AsRef<str>>(defaults: &[S], name: &str) -> bool {
    defaults.iter().any(|d| d.as_ref() == name)
}

/// How platform-owned columns are recognised.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DefaultColumns {
    /// A fixed list of names.
    Static(Vec<String>),
    /// Whatever the remote flags as `UserDefined=false`.
    Dynamic,
}

impl DefaultColumns {
    pub fn fixed(names: &[&str]) -> Self {
        DefaultColumns::Static(names.iter().map(|n| n.to_string()).collect())
    }
}

/// Diff local schema columns against the remote ones.
///
/// PK columns and columns flagged `UserDefined=false` are always left
/// out. A column whose type changed shows up in both lists; flags other
/// than the type are not compared.
pub fn diff_columns(
    local: &[Column],
    remote: &[Column],
    defaults: &DefaultColumns,
) -> CliResult<Diff<Column>> {
    let reserved: HashSet<&str> = remote
        .iter()
        .filter(|c| c.is_reserved())
        .map(|c| c.name.as_str())
        .collect();

    let excluded = |column: &Column| {
        column.primary_key
            || column.is_reserved()
            || match defaults {
                DefaultColumns::Static(names) => is_default_column(names, &column.name),
                DefaultColumns::Dynamic => reserved.contains(column.name.as_str()),
            }
    };

    let reconciler = Reconciler::new(|a: &Column, b: &Column| {
        a.column_type.eq_ignore_ascii_case(&b.column_type)
    })
    .with_drop(excluded);
    Ok(reconciler
        .diff_keyed(local, remote, FieldPolicy::Replace)?
        .into_diff())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn names(columns: &[Column]) -> Vec<&str> {
        columns.iter().map(|c| c.name.as_str()).collect()
    }

    #[test]
    fn test_is_default_column() {
        let empty: [&str; 0] = [];
        assert!(!is_default_column(&empty, "x"));
        assert!(is_default_column(&["a", "b"], "b"));
        assert!(!is_default_column(&["a", "b"], "c"));
    }

    #[test]
    fn test_dynamic_defaults_ignore_platform_columns() {
        let remote: Vec<Column> = (0..26)
            .map(|i| Column::new(format!("system_col_{i}"), "string").user_defined(false))
            .collect();
        let result = diff_columns(&[], &remote, &DefaultColumns::Dynamic).unwrap();
        assert!(result.added.is_empty());
        assert!(result.removed.is_empty());
    }

    #[test]
    fn test_dynamic_defaults_skip_local_copies_of_reserved_columns() {
        let local = vec![Column::new("edge_key", "string"), Column::new("site", "string")];
        let remote = vec![Column::new("edge_key", "string").user_defined(false)];
        let result = diff_columns(&local, &remote, &DefaultColumns::Dynamic).unwrap();
        assert_eq!(names(&result.added), vec!["site"]);
        assert!(result.removed.is_empty());
    }

    #[test]
    fn test_static_defaults_scenario() {
        let local = vec![
            Column::new("user_id", "string").primary_key(),
            Column::new("test", "string").user_defined(true),
            Column::new("test3", "string").user_defined(true),
        ];
        let remote = vec![
            Column::new("user_id", "string").primary_key(),
            Column::new("creation_date", "timestamp").user_defined(false),
            Column::new("test", "string").user_defined(true),
            Column::new("test2", "string").user_defined(true),
        ];
        let result = diff_columns(&local, &remote, &DefaultColumns::Static(Vec::new())).unwrap();
        assert_eq!(names(&result.removed), vec!["test2"]);
        assert_eq!(names(&result.added), vec!["test3"]);
    }

    #[test]
    fn test_static_list_excludes_named_columns() {
        let local = vec![Column::new("item_id", "string"), Column::new("temp", "float")];
        let result =
            diff_columns(&local, &[], &DefaultColumns::fixed(COLLECTION_DEFAULT_COLUMNS)).unwrap();
        assert_eq!(names(&result.added), vec!["temp"]);
    }

    #[test]
    fn test_type_change_is_drop_and_add() {
        let local = vec![Column::new("temp", "float")];
        let remote = vec![Column::new("temp", "int").user_defined(true)];
        let result = diff_columns(&local, &remote, &DefaultColumns::Dynamic).unwrap();
        assert_eq!(result.added[0].column_type, "float");
        assert_eq!(result.removed[0].column_type, "int");
    }

    #[test]
    fn test_user_defined_flag_alone_is_not_a_change() {
        let local = vec![Column::new("temp", "float")];
        let remote = vec![Column::new("temp", "FLOAT").user_defined(true)];
        let result = diff_columns(&local, &remote, &DefaultColumns::Dynamic).unwrap();
        assert!(result.is_empty());
    }

    #[test]
    fn test_both_filters_produce_same_shape() {
        let local = vec![Column::new("a", "int")];
        let remote = vec![
            Column::new("b", "int"),
            Column::new("creation_date", "timestamp").user_defined(false),
        ];
        let dynamic = diff_columns(&local, &remote, &DefaultColumns::Dynamic).unwrap();
        let fixed = diff_columns(&local, &remote, &DefaultColumns::fixed(&["creation_date"])).unwrap();
        assert_eq!(dynamic, fixed);
    }
}
