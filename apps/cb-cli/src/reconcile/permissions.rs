//! Role permission lists

use std::collections::HashSet;

use crate::diff::diff_by;
use crate::models::{PermissionEntry, Role};

/// Drop repeated entries, keeping the first occurrence.
///
/// Two entries are the same item when their ids match or, failing that,
/// their names match. The platform rejects role updates listing an item
/// twice.
pub fn dedupe(entries: &[PermissionEntry]) -> Vec<PermissionEntry> {
    let mut ids: HashSet<&str> = HashSet::new();
    let mut names: HashSet<&str> = HashSet::new();
    let mut kept = Vec::with_capacity(entries.len());

    for entry in entries {
        let id = entry.item_info.id.as_deref().filter(|id| !id.is_empty());
        let name = entry.item_info.name.as_str();
        let seen = id.is_some_and(|id| ids.contains(id)) || (!name.is_empty() && names.contains(name));
        if seen {
            tracing::debug!(item = entry.identity(), "Dropping duplicate permission entry");
            continue;
        }
        if let Some(id) = id {
            ids.insert(id);
        }
        if !name.is_empty() {
            names.insert(name);
        }
        kept.push(entry.clone());
    }
    kept
}

/// De-duplicate every permission family of a role in place.
pub fn dedupe_role(role: &mut Role) -> usize {
    let mut removed = 0;
    for (_, entries) in role.permissions.families_mut() {
        let deduped = dedupe(entries);
        removed += entries.len() - deduped.len();
        *entries = deduped;
    }
    removed
}

fn same_entry(local: &PermissionEntry, remote: &PermissionEntry) -> bool {
    let same_item = match (&local.item_info.id, &remote.item_info.id) {
        (Some(a), Some(b)) if !a.is_empty() && !b.is_empty() => a == b,
        _ => local.item_info.name == remote.item_info.name,
    };
    same_item && local.permissions == remote.permissions
}

/// True when the de-duplicated permissions of `local` differ from `remote`.
///
/// Scalar families are compared only when present locally.
pub fn permissions_differ(local: &Role, remote: &Role) -> bool {
    let lists_differ = local
        .permissions
        .families()
        .into_iter()
        .zip(remote.permissions.families())
        .any(|((family, local_entries), (_, remote_entries))| {
            let delta = diff_by(&dedupe(local_entries), &dedupe(remote_entries), same_entry);
            if !delta.is_empty() {
                tracing::debug!(
                    role = %local.name,
                    family,
                    added = delta.added.len(),
                    removed = delta.removed.len(),
                    "Permission family changed"
                );
            }
            !delta.is_empty()
        });

    lists_differ
        || local
            .permissions
            .extra
            .iter()
            .any(|(key, value)| remote.permissions.extra.get(key) != Some(value))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::RolePermissions;
    use serde_json::{json, Map};

    fn role(collections: Vec<PermissionEntry>) -> Role {
        Role {
            name: "Operator".into(),
            id: None,
            description: String::new(),
            permissions: RolePermissions {
                collections,
                ..Default::default()
            },
            extra: Map::new(),
        }
    }

    #[test]
    fn test_dedupe_keeps_first_and_order() {
        let entries = vec![
            PermissionEntry::named("weather", 1).with_id("c-1"),
            PermissionEntry::named("alerts", 3),
            PermissionEntry::named("weather-copy", 15).with_id("c-1"),
            PermissionEntry::named("alerts", 7),
        ];
        let kept = dedupe(&entries);
        assert_eq!(kept, vec![entries[0].clone(), entries[1].clone()]);
    }

    #[test]
    fn test_dedupe_matches_name_when_id_missing() {
        let entries = vec![
            PermissionEntry::named("weather", 1).with_id("c-1"),
            PermissionEntry::named("weather", 1),
        ];
        assert_eq!(dedupe(&entries).len(), 1);
    }

    #[test]
    fn test_dedupe_role_counts_removed() {
        let mut r = role(vec![
            PermissionEntry::named("a", 1),
            PermissionEntry::named("a", 1),
        ]);
        assert_eq!(dedupe_role(&mut r), 1);
        assert_eq!(r.permissions.collections.len(), 1);
    }

    #[test]
    fn test_duplicates_alone_are_not_a_change() {
        let local = role(vec![
            PermissionEntry::named("a", 1),
            PermissionEntry::named("a", 1),
        ]);
        let remote = role(vec![PermissionEntry::named("a", 1).with_id("c-1")]);
        assert!(!permissions_differ(&local, &remote));
    }

    #[test]
    fn test_level_change_is_a_change() {
        let local = role(vec![PermissionEntry::named("a", 3)]);
        let remote = role(vec![PermissionEntry::named("a", 1)]);
        assert!(permissions_differ(&local, &remote));
    }

    #[test]
    fn test_scalar_family_change() {
        let mut local = role(vec![]);
        local
            .permissions
            .extra
            .insert("UsersList".into(), json!({"permissions": 1}));
        let remote = role(vec![]);
        assert!(permissions_differ(&local, &remote));
    }
}
