//! Endpoint table of the platform REST API

use serde_json::Value;

use super::AssetRef;
use crate::models::AssetKind;

fn enc(segment: &str) -> String {
    urlencoding::encode(segment).into_owned()
}

/// Collection path of a kind. Schema kinds address their singleton here.
pub fn kind_path(kind: AssetKind, system_key: &str) -> String {
    let sk = enc(system_key);
    match kind {
        AssetKind::Service => format!("/api/v/3/code/{sk}/service"),
        AssetKind::Library => format!("/api/v/3/code/{sk}/library"),
        AssetKind::Collection => format!("/api/v/3/collectionmanagement/{sk}"),
        AssetKind::User => format!("/admin/user/{sk}"),
        AssetKind::UserSchema => format!("/admin/user/{sk}/columns"),
        AssetKind::Role => format!("/api/v/3/user/{sk}/roles"),
        AssetKind::Trigger => format!("/api/v/3/code/{sk}/trigger"),
        AssetKind::Timer => format!("/api/v/3/code/{sk}/timer"),
        AssetKind::Device => format!("/api/v/3/devices/{sk}"),
        AssetKind::DeviceSchema => format!("/api/v/3/devices/{sk}/columns"),
        AssetKind::Edge => format!("/admin/edges/{sk}"),
        AssetKind::EdgeSchema => format!("/api/v/3/edges/{sk}/columns"),
        AssetKind::Portal => format!("/api/v/2/portals/{sk}"),
        AssetKind::Plugin => format!("/api/v/2/plugins/{sk}"),
        AssetKind::Adaptor => format!("/api/v/3/adaptors/{sk}"),
        AssetKind::Deployment => format!("/admin/{sk}/deployments"),
        AssetKind::Webhook => format!("/api/v/4/webhook/{sk}"),
        AssetKind::ExternalDatabase => format!("/api/v/4/external-db/{sk}"),
        AssetKind::BucketSet => format!("/api/v/4/bucket_sets/{sk}"),
        AssetKind::Secret => format!("/api/v/4/secrets/{sk}"),
        AssetKind::SharedCache => format!("/api/v/4/shared_caches/{sk}"),
        AssetKind::FileStore => format!("/api/v/4/filestores/{sk}"),
    }
}

/// Path of one asset.
pub fn item_path(target: &AssetRef, system_key: &str) -> String {
    let base = kind_path(target.kind, system_key);
    if target.kind.is_schema() {
        base
    } else {
        format!("{base}/{}", enc(target.ident()))
    }
}

/// Column endpoint of a collection or schema.
pub fn columns_path(target: &AssetRef, system_key: &str) -> String {
    if target.kind.is_schema() {
        kind_path(target.kind, system_key)
    } else {
        format!("{}/columns", item_path(target, system_key))
    }
}

pub fn indexes_path(collection: &AssetRef, system_key: &str) -> String {
    format!("{}/index", item_path(collection, system_key))
}

pub fn roles_path(target: &AssetRef, system_key: &str) -> String {
    format!("{}/roles", item_path(target, system_key))
}

pub fn items_path(collection: &AssetRef) -> String {
    format!("/api/v/1/data/{}", enc(collection.ident()))
}

pub fn upload_version_path(system_key: &str) -> String {
    format!("/api/v/4/systems/{}/upload_version", enc(system_key))
}

pub fn upload_path(system_key: &str, dry_run: bool) -> String {
    format!(
        "/api/v/4/systems/{}/upload?dryRun={dry_run}",
        enc(system_key)
    )
}

/// Field holding the platform id of a created asset.
fn id_fields(kind: AssetKind) -> &'static [&'static str] {
    match kind {
        AssetKind::Collection => &["collection_id", "collectionID", "item_id"],
        AssetKind::User => &["user_id", "userID"],
        AssetKind::Role => &["role_id", "ID", "id"],
        _ => &[],
    }
}

/// Extract the platform id from a create response.
pub fn extract_id(kind: AssetKind, response: &Value) -> Option<String> {
    id_fields(kind)
        .iter()
        .find_map(|field| response.get(*field).and_then(Value::as_str))
        .map(str::to_string)
}

/// List endpoints answer either with an array or with `{"DATA": [...]}`.
pub fn unwrap_list(response: Value) -> Vec<Value> {
    match response {
        Value::Array(items) => items,
        Value::Object(mut map) => match map.remove("DATA") {
            Some(Value::Array(items)) => items,
            _ => Vec::new(),
        },
        _ => Vec::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_item_path_encodes_names() {
        let target = AssetRef::new(AssetKind::Service, "say hello");
        assert_eq!(
            item_path(&target, "abc"),
            "/api/v/3/code/abc/service/say%20hello"
        );
    }

    #[test]
    fn test_id_addressed_paths() {
        let user = AssetRef::new(AssetKind::User, "a@b.com").with_id(Some("u-1"));
        assert_eq!(item_path(&user, "sk"), "/admin/user/sk/u-1");
        assert_eq!(roles_path(&user, "sk"), "/admin/user/sk/u-1/roles");

        let collection = AssetRef::new(AssetKind::Collection, "weather").with_id(Some("c-1"));
        assert_eq!(
            columns_path(&collection, "sk"),
            "/api/v/3/collectionmanagement/sk/c-1/columns"
        );
        assert_eq!(items_path(&collection), "/api/v/1/data/c-1");
    }

    #[test]
    fn test_schema_paths_are_singletons() {
        let schema = AssetRef::new(AssetKind::EdgeSchema, "schema");
        assert_eq!(item_path(&schema, "sk"), "/api/v/3/edges/sk/columns");
        assert_eq!(columns_path(&schema, "sk"), "/api/v/3/edges/sk/columns");
    }

    #[test]
    fn test_extract_id() {
        assert_eq!(
            extract_id(AssetKind::Collection, &json!({"collectionID": "c-9"})),
            Some("c-9".to_string())
        );
        assert_eq!(extract_id(AssetKind::Service, &json!({"id": "x"})), None);
    }

    #[test]
    fn test_unwrap_list() {
        assert_eq!(unwrap_list(json!([1, 2])).len(), 2);
        assert_eq!(unwrap_list(json!({"DATA": [1], "TOTAL": 1})).len(), 1);
        assert!(unwrap_list(json!(null)).is_empty());
    }
}
