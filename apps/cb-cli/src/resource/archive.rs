//! Push archive construction

use std::fs;
use std::io::{Cursor, Write};
use std::path::PathBuf;

use serde_json::Value;
use zip::write::SimpleFileOptions;
use zip::ZipWriter;

use super::path::ResourceId;
use super::selection::{Inclusion, SelectionPolicy};
use super::walker::{AssetWalker, WalkedFile};
use crate::error::{CliError, CliResult};
use crate::interactive::Prompter;

/// A finished archive and the entry paths it holds.
#[derive(Debug, Clone)]
pub struct Archive {
    pub bytes: Vec<u8>,
    pub entries: Vec<String>,
}

impl Archive {
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Packs the selected part of a project tree into a ZIP archive whose
/// entry paths mirror the on-disk relative paths.
pub struct ArchiveBuilder<'a> {
    root: PathBuf,
    policy: &'a SelectionPolicy,
    prompter: &'a dyn Prompter,
}

impl<'a> ArchiveBuilder<'a> {
    pub fn new(
        root: impl Into<PathBuf>,
        policy: &'a SelectionPolicy,
        prompter: &'a dyn Prompter,
    ) -> Self {
        Self {
            root: root.into(),
            policy,
            prompter,
        }
    }

    pub fn build(&self) -> CliResult<Archive> {
        let mut zip = ZipWriter::new(Cursor::new(Vec::new()));
        let options =
            SimpleFileOptions::default().compression_method(zip::CompressionMethod::Deflated);
        let mut entries = Vec::new();

        AssetWalker::new(&self.root).walk(|file| {
            let inclusion = self.policy.decide(file.resource);
            if inclusion == Inclusion::Exclude {
                return Ok(());
            }

            let contents = self.entry_contents(&file, inclusion)?;
            zip.start_file(file.relative, options)?;
            zip.write_all(&contents)?;
            entries.push(file.relative.to_string());
            Ok(())
        })?;

        let bytes = zip.finish()?.into_inner();
        tracing::debug!(entries = entries.len(), bytes = bytes.len(), "Built push archive");
        Ok(Archive { bytes, entries })
    }

    fn entry_contents(&self, file: &WalkedFile<'_>, inclusion: Inclusion) -> CliResult<Vec<u8>> {
        let raw = fs::read(file.path)?;

        match (file.resource, inclusion) {
            (ResourceId::Collection(_), Inclusion::SchemaOnly) => {
                let mut value = parse_object(&raw, file.relative)?;
                if let Some(object) = value.as_object_mut() {
                    object.remove("items");
                }
                Ok(serde_json::to_vec_pretty(&value)?)
            }
            (ResourceId::ExternalDatabase(name), _) => {
                let mut value = parse_object(&raw, file.relative)?;
                let password = self
                    .prompter
                    .secret(&format!("Password for external database '{name}'"))?;
                inject_password(&mut value, password);
                Ok(serde_json::to_vec_pretty(&value)?)
            }
            _ => Ok(raw),
        }
    }
}

fn parse_object(raw: &[u8], relative: &str) -> CliResult<Value> {
    let value: Value = serde_json::from_slice(raw)
        .map_err(|e| CliError::Validation(format!("{relative}: {e}")))?;
    if !value.is_object() {
        return Err(CliError::Validation(format!(
            "{relative}: expected a JSON object"
        )));
    }
    Ok(value)
}

fn inject_password(value: &mut Value, password: String) {
    let Some(object) = value.as_object_mut() else {
        return;
    };
    let credentials = object
        .entry("credentials")
        .or_insert_with(|| Value::Object(Default::default()));
    if !credentials.is_object() {
        *credentials = Value::Object(Default::default());
    }
    if let Some(credentials) = credentials.as_object_mut() {
        credentials.insert("password".to_string(), Value::String(password));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::AssetKind;
    use serde_json::json;
    use std::io::Read;
    use std::path::Path;
    use tempfile::TempDir;
    use zip::ZipArchive;

    struct FixedSecret(&'static str);

    impl Prompter for FixedSecret {
        fn confirm(&self, _prompt: &str, default: bool) -> CliResult<bool> {
            Ok(default)
        }

        fn secret(&self, _prompt: &str) -> CliResult<String> {
            Ok(self.0.to_string())
        }
    }

    fn write(root: &Path, relative: &str, value: &Value) {
        let path = root.join(relative);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, serde_json::to_vec(value).unwrap()).unwrap();
    }

    fn read_entry(bytes: &[u8], name: &str) -> Value {
        let mut archive = ZipArchive::new(Cursor::new(bytes)).unwrap();
        let mut file = archive.by_name(name).unwrap();
        let mut contents = String::new();
        file.read_to_string(&mut contents).unwrap();
        serde_json::from_str(&contents).unwrap()
    }

    #[test]
    fn test_entries_mirror_relative_paths() {
        let dir = TempDir::new().unwrap();
        write(dir.path(), "system.json", &json!({"name": "demo"}));
        write(dir.path(), "roles/admin.json", &json!({"Name": "admin"}));
        write(dir.path(), "triggers/t1.json", &json!({"name": "t1"}));

        let policy = SelectionPolicy::new().with_all(AssetKind::Role);
        let archive = ArchiveBuilder::new(dir.path(), &policy, &FixedSecret(""))
            .build()
            .unwrap();
        assert_eq!(archive.entries, vec!["roles/admin.json", "system.json"]);
    }

    #[test]
    fn test_schema_only_collection_strips_items() {
        let dir = TempDir::new().unwrap();
        write(
            dir.path(),
            "data/weather.json",
            &json!({"name": "weather", "schema": [], "items": [{"temp": 1}]}),
        );

        let policy = SelectionPolicy::new().with_collection_schema("weather");
        let archive = ArchiveBuilder::new(dir.path(), &policy, &FixedSecret(""))
            .build()
            .unwrap();
        let entry = read_entry(&archive.bytes, "data/weather.json");
        assert!(entry.get("items").is_none());
        assert_eq!(entry["name"], "weather");
    }

    #[test]
    fn test_external_database_password_injected() {
        let dir = TempDir::new().unwrap();
        write(
            dir.path(),
            "external-databases/pg.json",
            &json!({"name": "pg", "dbtype": "postgres", "credentials": {"user": "app"}}),
        );

        let policy = SelectionPolicy::new().with_all(AssetKind::ExternalDatabase);
        let archive = ArchiveBuilder::new(dir.path(), &policy, &FixedSecret("hunter2"))
            .build()
            .unwrap();
        let entry = read_entry(&archive.bytes, "external-databases/pg.json");
        assert_eq!(entry["credentials"]["password"], "hunter2");
        assert_eq!(entry["credentials"]["user"], "app");

        let on_disk: Value =
            serde_json::from_slice(&fs::read(dir.path().join("external-databases/pg.json")).unwrap())
                .unwrap();
        assert!(on_disk["credentials"].get("password").is_none());
    }
}
