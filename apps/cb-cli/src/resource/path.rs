//! Relative path ↔ resource identity
//!
//! A pure mapping from a slash-delimited path relative to the project
//! root to the resource it holds. Nothing here touches the filesystem.

use std::fmt;

use crate::models::{AssetKind, SCHEMA_NAME};

pub const SYSTEM_FILE: &str = "system.json";
pub const LEGACY_USERS_FILE: &str = "users.json";
const SCHEMA_FILE: &str = "schema.json";

/// Which file of a code service or library directory.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CodeFile {
    /// `<name>.json` with the metadata.
    Meta,
    /// `<name>.js` with the source.
    Source,
    /// `<name>.js.map`.
    SourceMap,
}

/// Portal configuration sections stored as separate files.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PortalSection {
    Datasources,
    InternalResources,
    Widgets,
}

impl PortalSection {
    fn from_dir(dir: &str) -> Option<Self> {
        match dir {
            "datasources" => Some(PortalSection::Datasources),
            "internalResources" => Some(PortalSection::InternalResources),
            "widgets" => Some(PortalSection::Widgets),
            _ => None,
        }
    }
}

/// Typed identity of one file in the project tree.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ResourceId {
    SystemMeta,
    /// Flat `users.json` list written by older versions.
    LegacyUsers,
    Service { name: String, file: CodeFile },
    Library { name: String, file: CodeFile },
    Collection(String),
    UserSchema,
    User(String),
    UserRoles(String),
    DeviceSchema,
    Device(String),
    DeviceRoles(String),
    EdgeSchema,
    Edge(String),
    BucketSetMeta(String),
    BucketSetFile {
        bucket: String,
        box_name: String,
        relative_path: String,
    },
    Portal(String),
    PortalPart {
        portal: String,
        section: PortalSection,
        relative_path: String,
    },
    Role(String),
    Trigger(String),
    Timer(String),
    Plugin(String),
    Deployment(String),
    Secret(String),
    Webhook(String),
    ExternalDatabase(String),
    SharedCache(String),
    Adaptor(String),
    AdaptorFile { adaptor: String, file: String },
    FileStore(String),
    FileStoreFile { store: String, relative_path: String },
}

impl ResourceId {
    /// Kind of the asset this file belongs to; `None` for `system.json`.
    pub fn kind(&self) -> Option<AssetKind> {
        let kind = match self {
            ResourceId::SystemMeta => return None,
            ResourceId::LegacyUsers | ResourceId::User(_) | ResourceId::UserRoles(_) => {
                AssetKind::User
            }
            ResourceId::Service { .. } => AssetKind::Service,
            ResourceId::Library { .. } => AssetKind::Library,
            ResourceId::Collection(_) => AssetKind::Collection,
            ResourceId::UserSchema => AssetKind::UserSchema,
            ResourceId::DeviceSchema => AssetKind::DeviceSchema,
            ResourceId::Device(_) | ResourceId::DeviceRoles(_) => AssetKind::Device,
            ResourceId::EdgeSchema => AssetKind::EdgeSchema,
            ResourceId::Edge(_) => AssetKind::Edge,
            ResourceId::BucketSetMeta(_) | ResourceId::BucketSetFile { .. } => AssetKind::BucketSet,
            ResourceId::Portal(_) | ResourceId::PortalPart { .. } => AssetKind::Portal,
            ResourceId::Role(_) => AssetKind::Role,
            ResourceId::Trigger(_) => AssetKind::Trigger,
            ResourceId::Timer(_) => AssetKind::Timer,
            ResourceId::Plugin(_) => AssetKind::Plugin,
            ResourceId::Deployment(_) => AssetKind::Deployment,
            ResourceId::Secret(_) => AssetKind::Secret,
            ResourceId::Webhook(_) => AssetKind::Webhook,
            ResourceId::ExternalDatabase(_) => AssetKind::ExternalDatabase,
            ResourceId::SharedCache(_) => AssetKind::SharedCache,
            ResourceId::Adaptor(_) | ResourceId::AdaptorFile { .. } => AssetKind::Adaptor,
            ResourceId::FileStore(_) | ResourceId::FileStoreFile { .. } => AssetKind::FileStore,
        };
        Some(kind)
    }

    /// Name of the owning asset. Sub-resources report their owner.
    pub fn name(&self) -> &str {
        match self {
            ResourceId::SystemMeta => "system",
            ResourceId::LegacyUsers => "users",
            ResourceId::UserSchema | ResourceId::DeviceSchema | ResourceId::EdgeSchema => {
                SCHEMA_NAME
            }
            ResourceId::Service { name, .. } | ResourceId::Library { name, .. } => name,
            ResourceId::BucketSetFile { bucket, .. } => bucket,
            ResourceId::PortalPart { portal, .. } => portal,
            ResourceId::AdaptorFile { adaptor, .. } => adaptor,
            ResourceId::FileStoreFile { store, .. } => store,
            ResourceId::Collection(n)
            | ResourceId::User(n)
            | ResourceId::UserRoles(n)
            | ResourceId::Device(n)
            | ResourceId::DeviceRoles(n)
            | ResourceId::Edge(n)
            | ResourceId::BucketSetMeta(n)
            | ResourceId::Portal(n)
            | ResourceId::Role(n)
            | ResourceId::Trigger(n)
            | ResourceId::Timer(n)
            | ResourceId::Plugin(n)
            | ResourceId::Deployment(n)
            | ResourceId::Secret(n)
            | ResourceId::Webhook(n)
            | ResourceId::ExternalDatabase(n)
            | ResourceId::SharedCache(n)
            | ResourceId::Adaptor(n)
            | ResourceId::FileStore(n) => n,
        }
    }

    /// True for the one file that defines the asset itself (as opposed to
    /// attached files, role assignments or code sources).
    pub fn is_definition(&self) -> bool {
        match self {
            ResourceId::Service { file, .. } | ResourceId::Library { file, .. } => {
                *file == CodeFile::Meta
            }
            ResourceId::SystemMeta
            | ResourceId::UserRoles(_)
            | ResourceId::DeviceRoles(_)
            | ResourceId::BucketSetFile { .. }
            | ResourceId::PortalPart { .. }
            | ResourceId::AdaptorFile { .. }
            | ResourceId::FileStoreFile { .. } => false,
            _ => true,
        }
    }
}

impl fmt::Display for ResourceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.kind() {
            Some(kind) => write!(f, "{kind} '{}'", self.name()),
            None => write!(f, "system metadata"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Classification {
    Resource(ResourceId),
    Unrecognized,
}

impl Classification {
    pub fn resource(self) -> Option<ResourceId> {
        match self {
            Classification::Resource(id) => Some(id),
            Classification::Unrecognized => None,
        }
    }
}

/// Directories for kinds laid out as flat `<dir>/<name>.json`.
const FLAT_KINDS: &[(&str, fn(String) -> ResourceId)] = &[
    ("data", ResourceId::Collection),
    ("roles", ResourceId::Role),
    ("triggers", ResourceId::Trigger),
    ("timers", ResourceId::Timer),
    ("plugins", ResourceId::Plugin),
    ("deployments", ResourceId::Deployment),
    ("secrets", ResourceId::Secret),
    ("webhooks", ResourceId::Webhook),
    ("external-databases", ResourceId::ExternalDatabase),
    ("shared-caches", ResourceId::SharedCache),
    ("bucket-sets", ResourceId::BucketSetMeta),
    ("file-stores", ResourceId::FileStore),
];

fn json_stem(file: &str) -> Option<&str> {
    file.strip_suffix(".json").filter(|stem| !stem.is_empty())
}

fn code_file(dir_name: &str, file: &str, allow_map: bool) -> Option<CodeFile> {
    let (stem, kind) = if let Some(stem) = file.strip_suffix(".js.map") {
        if !allow_map {
            return None;
        }
        (stem, CodeFile::SourceMap)
    } else if let Some(stem) = file.strip_suffix(".js") {
        (stem, CodeFile::Source)
    } else if let Some(stem) = file.strip_suffix(".json") {
        (stem, CodeFile::Meta)
    } else {
        return None;
    };
    (stem == dir_name).then_some(kind)
}

/// Classify a path relative to the project root.
pub fn classify(relative: &str) -> Classification {
    let segments: Vec<&str> = relative
        .split('/')
        .filter(|s| !s.is_empty() && *s != ".")
        .collect();
    match classify_segments(&segments) {
        Some(id) => Classification::Resource(id),
        None => Classification::Unrecognized,
    }
}

/// Hidden names are skipped, except inside the stored-file trees where
/// everything below the bucket box or store is user content.
fn is_hidden(segments: &[&str]) -> bool {
    let fixed = match segments.first() {
        Some(&"bucket-set-files") => 3,
        Some(&"file-stores-files") => 2,
        _ => segments.len(),
    };
    segments.iter().take(fixed).any(|s| s.starts_with('.')) || segments.contains(&"..")
}

fn classify_segments(segments: &[&str]) -> Option<ResourceId> {
    if is_hidden(segments) {
        return None;
    }

    let flat = |ctor: fn(String) -> ResourceId, rest: &[&str]| match rest {
        [file] => json_stem(file).map(|name| ctor(name.to_string())),
        _ => None,
    };

    match segments {
        [file] if *file == SYSTEM_FILE => Some(ResourceId::SystemMeta),
        [file] if *file == LEGACY_USERS_FILE => Some(ResourceId::LegacyUsers),

        ["code", "services", dir, file] => code_file(dir, file, true).map(|file| {
            ResourceId::Service {
                name: dir.to_string(),
                file,
            }
        }),
        ["code", "libraries", dir, file] => code_file(dir, file, false).map(|file| {
            ResourceId::Library {
                name: dir.to_string(),
                file,
            }
        }),

        ["users", file] if *file == SCHEMA_FILE => Some(ResourceId::UserSchema),
        ["users", "roles", file] => json_stem(file).map(|n| ResourceId::UserRoles(n.to_string())),
        ["users", file] => json_stem(file).map(|n| ResourceId::User(n.to_string())),

        ["devices", file] if *file == SCHEMA_FILE => Some(ResourceId::DeviceSchema),
        ["devices", "roles", file] => {
            json_stem(file).map(|n| ResourceId::DeviceRoles(n.to_string()))
        }
        ["devices", file] => json_stem(file).map(|n| ResourceId::Device(n.to_string())),

        ["edges", file] if *file == SCHEMA_FILE => Some(ResourceId::EdgeSchema),
        ["edges", file] => json_stem(file).map(|n| ResourceId::Edge(n.to_string())),

        ["bucket-set-files", bucket, box_name, rest @ ..] if !rest.is_empty() => {
            Some(ResourceId::BucketSetFile {
                bucket: bucket.to_string(),
                box_name: box_name.to_string(),
                relative_path: rest.join("/"),
            })
        }

        ["portals", dir, file] => json_stem(file)
            .filter(|stem| stem == dir)
            .map(|n| ResourceId::Portal(n.to_string())),
        ["portals", dir, "config", section, rest @ ..] if !rest.is_empty() => {
            PortalSection::from_dir(section).map(|section| ResourceId::PortalPart {
                portal: dir.to_string(),
                section,
                relative_path: rest.join("/"),
            })
        }

        ["adapters", dir, file] => json_stem(file)
            .filter(|stem| stem == dir)
            .map(|n| ResourceId::Adaptor(n.to_string())),
        ["adapters", dir, "files", file] => Some(ResourceId::AdaptorFile {
            adaptor: dir.to_string(),
            file: file.to_string(),
        }),

        ["file-stores-files", store, rest @ ..] if !rest.is_empty() => {
            Some(ResourceId::FileStoreFile {
                store: store.to_string(),
                relative_path: rest.join("/"),
            })
        }

        [dir, rest @ ..] => FLAT_KINDS
            .iter()
            .find(|(name, _)| name == dir)
            .and_then(|(_, ctor)| flat(*ctor, rest)),

        [] => None,
    }
}

/// Whether the walker should enter a directory (relative to the root).
///
/// Only directories that can contain a classifiable file are entered.
pub fn should_descend(relative_dir: &str) -> bool {
    let segments: Vec<&str> = relative_dir
        .split('/')
        .filter(|s| !s.is_empty() && *s != ".")
        .collect();

    if is_hidden(&segments) {
        return false;
    }

    match segments.as_slice() {
        [] => true,
        ["code"] => true,
        ["code", "services" | "libraries"] => true,
        ["code", "services" | "libraries", _] => true,
        ["users" | "devices"] => true,
        ["users" | "devices", "roles"] => true,
        ["edges"] => true,
        ["portals", ..] => match segments.as_slice() {
            ["portals"] | ["portals", _] | ["portals", _, "config"] => true,
            ["portals", _, "config", section, ..] => PortalSection::from_dir(section).is_some(),
            _ => false,
        },
        ["adapters"] | ["adapters", _] | ["adapters", _, "files"] => true,
        ["bucket-set-files", ..] | ["file-stores-files", ..] => true,
        [dir] => FLAT_KINDS.iter().any(|(name, _)| name == dir),
        _ => false,
    }
}

/// Relative path of the file defining an asset, used when writing pulled
/// assets back to disk.
pub fn asset_path(kind: AssetKind, name: &str) -> String {
    match kind {
        AssetKind::Service | AssetKind::Library => {
            format!("{}/{name}/{name}.json", kind.dir())
        }
        AssetKind::UserSchema | AssetKind::DeviceSchema | AssetKind::EdgeSchema => {
            format!("{}/{SCHEMA_FILE}", kind.dir())
        }
        AssetKind::Portal | AssetKind::Adaptor => format!("{}/{name}/{name}.json", kind.dir()),
        _ => format!("{}/{name}.json", kind.dir()),
    }
}

/// Relative path of the source file of a code service or library.
pub fn code_path(kind: AssetKind, name: &str) -> Option<String> {
    kind.is_code()
        .then(|| format!("{}/{name}/{name}.js", kind.dir()))
}

/// Relative path of a user's or device's role assignment file.
pub fn roles_path(kind: AssetKind, name: &str) -> Option<String> {
    match kind {
        AssetKind::User | AssetKind::Device => {
            Some(format!("{}/roles/{name}.json", kind.dir()))
        }
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn resource(path: &str) -> ResourceId {
        classify(path)
            .resource()
            .unwrap_or_else(|| panic!("{path} was not recognized"))
    }

    #[test]
    fn test_service_source() {
        assert_eq!(
            resource("code/services/foo/foo.js"),
            ResourceId::Service {
                name: "foo".into(),
                file: CodeFile::Source
            }
        );
        assert_eq!(resource("code/services/foo/foo.js").name(), "foo");
    }

    #[test]
    fn test_service_meta_and_map() {
        assert!(matches!(
            resource("code/services/foo/foo.json"),
            ResourceId::Service { file: CodeFile::Meta, .. }
        ));
        assert!(matches!(
            resource("code/services/foo/foo.js.map"),
            ResourceId::Service { file: CodeFile::SourceMap, .. }
        ));
    }

    #[test]
    fn test_service_name_mismatch_rejected() {
        assert_eq!(classify("code/services/foo/bar.js"), Classification::Unrecognized);
    }

    #[test]
    fn test_library_no_source_map() {
        assert!(matches!(
            resource("code/libraries/utils/utils.js"),
            ResourceId::Library { file: CodeFile::Source, .. }
        ));
        assert_eq!(
            classify("code/libraries/utils/utils.js.map"),
            Classification::Unrecognized
        );
    }

    #[test]
    fn test_bucket_set_file_greedy_suffix() {
        assert_eq!(
            resource("bucket-set-files/my bucket/box/myfile/with/a/long/path.bin"),
            ResourceId::BucketSetFile {
                bucket: "my bucket".into(),
                box_name: "box".into(),
                relative_path: "myfile/with/a/long/path.bin".into(),
            }
        );
    }

    #[test]
    fn test_user_triad() {
        assert_eq!(resource("users/schema.json"), ResourceId::UserSchema);
        assert_eq!(
            resource("users/alice@example.com.json"),
            ResourceId::User("alice@example.com".into())
        );
        assert_eq!(
            resource("users/roles/alice@example.com.json"),
            ResourceId::UserRoles("alice@example.com".into())
        );
    }

    #[test]
    fn test_device_triad_and_edges() {
        assert_eq!(resource("devices/schema.json"), ResourceId::DeviceSchema);
        assert_eq!(resource("devices/sensor-1.json"), ResourceId::Device("sensor-1".into()));
        assert_eq!(
            resource("devices/roles/sensor-1.json"),
            ResourceId::DeviceRoles("sensor-1".into())
        );
        assert_eq!(resource("edges/schema.json"), ResourceId::EdgeSchema);
        assert_eq!(resource("edges/gw.json"), ResourceId::Edge("gw".into()));
        assert_eq!(classify("edges/roles/gw.json"), Classification::Unrecognized);
    }

    #[test]
    fn test_flat_kinds() {
        assert_eq!(resource("data/weather.json"), ResourceId::Collection("weather".into()));
        assert_eq!(resource("roles/Administrator.json"), ResourceId::Role("Administrator".into()));
        assert_eq!(
            resource("external-databases/pg.json"),
            ResourceId::ExternalDatabase("pg".into())
        );
        assert_eq!(resource("shared-caches/c.json"), ResourceId::SharedCache("c".into()));
        assert_eq!(resource("bucket-sets/media.json"), ResourceId::BucketSetMeta("media".into()));
        assert_eq!(classify("data/weather.txt"), Classification::Unrecognized);
        assert_eq!(classify("data/nested/weather.json"), Classification::Unrecognized);
    }

    #[test]
    fn test_portal_and_parts() {
        assert_eq!(resource("portals/ops/ops.json"), ResourceId::Portal("ops".into()));
        assert_eq!(
            resource("portals/ops/config/widgets/w1/meta.json"),
            ResourceId::PortalPart {
                portal: "ops".into(),
                section: PortalSection::Widgets,
                relative_path: "w1/meta.json".into(),
            }
        );
        assert_eq!(
            classify("portals/ops/config/unknown/x.json"),
            Classification::Unrecognized
        );
    }

    #[test]
    fn test_adaptor_two_segment_variant() {
        assert_eq!(resource("adapters/modbus/modbus.json"), ResourceId::Adaptor("modbus".into()));
        assert_eq!(
            resource("adapters/modbus/files/driver.bin"),
            ResourceId::AdaptorFile {
                adaptor: "modbus".into(),
                file: "driver.bin".into()
            }
        );
    }

    #[test]
    fn test_file_store_files() {
        assert_eq!(resource("file-stores/assets.json"), ResourceId::FileStore("assets".into()));
        let id = resource("file-stores-files/assets/img/logo.png");
        assert_eq!(id.kind(), Some(AssetKind::FileStore));
        assert_eq!(id.name(), "assets");
    }

    #[test]
    fn test_system_files() {
        assert_eq!(resource("system.json"), ResourceId::SystemMeta);
        assert_eq!(resource("users.json"), ResourceId::LegacyUsers);
        assert_eq!(ResourceId::SystemMeta.kind(), None);
    }

    #[test]
    fn test_hidden_and_unknown_paths() {
        assert_eq!(classify(".git/config"), Classification::Unrecognized);
        assert_eq!(classify(".cb-cli/remotes.json"), Classification::Unrecognized);
        assert_eq!(classify("node_modules/x/x.json"), Classification::Unrecognized);
        assert_eq!(classify(""), Classification::Unrecognized);
    }

    #[test]
    fn test_dot_files_inside_stored_file_trees() {
        assert_eq!(
            resource("bucket-set-files/assets/box/.well-known/x"),
            ResourceId::BucketSetFile {
                bucket: "assets".into(),
                box_name: "box".into(),
                relative_path: ".well-known/x".into(),
            }
        );
        assert_eq!(
            resource("file-stores-files/media/.keep"),
            ResourceId::FileStoreFile {
                store: "media".into(),
                relative_path: ".keep".into(),
            }
        );
        assert!(should_descend("bucket-set-files/assets/box/.well-known"));

        assert_eq!(classify("bucket-set-files/.hidden/box/x"), Classification::Unrecognized);
        assert_eq!(classify("file-stores-files/media/../x"), Classification::Unrecognized);
        assert_eq!(classify("roles/.Operator.json"), Classification::Unrecognized);
        assert!(!should_descend("file-stores-files/.cache"));
    }

    #[test]
    fn test_should_descend() {
        assert!(should_descend(""));
        assert!(should_descend("code/services/foo"));
        assert!(should_descend("bucket-set-files/b/box/deep/er"));
        assert!(should_descend("portals/ops/config/widgets/w1"));
        assert!(!should_descend(".git"));
        assert!(!should_descend("node_modules"));
        assert!(!should_descend("data/nested"));
        assert!(!should_descend("code/services/foo/lib"));
        assert!(!should_descend("portals/ops/config/unknown"));
    }

    #[test]
    fn test_asset_path_is_inverse_of_classify() {
        for kind in AssetKind::ALL {
            let name = if kind.is_schema() { SCHEMA_NAME } else { "sample" };
            let path = asset_path(kind, name);
            let id = resource(&path);
            assert_eq!(id.kind(), Some(kind), "{path}");
            assert_eq!(id.name(), name, "{path}");
            assert!(id.is_definition(), "{path}");
        }
    }

    #[test]
    fn test_code_and_roles_paths() {
        assert_eq!(
            code_path(AssetKind::Service, "foo").as_deref(),
            Some("code/services/foo/foo.js")
        );
        assert_eq!(code_path(AssetKind::Collection, "foo"), None);
        assert_eq!(
            roles_path(AssetKind::User, "a@b.c").as_deref(),
            Some("users/roles/a@b.c.json")
        );
    }
}
