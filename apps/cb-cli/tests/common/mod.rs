//! Common test utilities for cb-cli integration tests.
//!
//! [`FakeClient`] is an in-memory remote system that records every call;
//! [`ScriptedPrompter`] answers confirmations from a fixed script.

#![allow(dead_code)]

use async_trait::async_trait;
use serde_json::{Map, Value};
use std::cell::RefCell;
use std::collections::{HashMap, HashSet, VecDeque};
use std::fs;
use std::path::Path;
use std::sync::Mutex;

use cb_cli::api::{AssetClient, AssetRef};
use cb_cli::error::{CliError, CliResult};
use cb_cli::interactive::Prompter;
use cb_cli::models::{
    Asset, AssetKind, Collection, Column, Index, Library, Role, RolePermissions, Service,
    TableSchema, User,
};
use cb_cli::plan::{DryRunResponse, UploadResponse};

#[derive(Default)]
pub struct FakeState {
    pub assets: Vec<Asset>,
    /// Collection columns by collection name
    pub columns: HashMap<String, Vec<Column>>,
    pub indexes: HashMap<String, Vec<Index>>,
    pub upload_version: u32,
    pub dry_run: Value,
    pub upload: Value,
    /// Asset names whose create or update fails
    pub failing: HashSet<String>,
    /// Transient failures to return before inserts succeed
    pub insert_failures: usize,
    pub inserted: Vec<Vec<Value>>,
    pub calls: Vec<String>,
    next_id: usize,
}

/// In-memory remote system.
#[derive(Default)]
pub struct FakeClient {
    pub state: Mutex<FakeState>,
}

impl FakeClient {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_upload_version(self, version: u32) -> Self {
        self.state.lock().unwrap().upload_version = version;
        self
    }

    pub fn with_asset(self, asset: Asset) -> Self {
        self.state.lock().unwrap().assets.push(asset);
        self
    }

    pub fn with_collection_columns(self, collection: &str, columns: Vec<Column>) -> Self {
        self.state
            .lock()
            .unwrap()
            .columns
            .insert(collection.to_string(), columns);
        self
    }

    pub fn with_indexes(self, collection: &str, indexes: Vec<Index>) -> Self {
        self.state
            .lock()
            .unwrap()
            .indexes
            .insert(collection.to_string(), indexes);
        self
    }

    pub fn with_dry_run(self, response: Value) -> Self {
        self.state.lock().unwrap().dry_run = response;
        self
    }

    pub fn failing(self, name: &str) -> Self {
        self.state.lock().unwrap().failing.insert(name.to_string());
        self
    }

    pub fn calls(&self) -> Vec<String> {
        self.state.lock().unwrap().calls.clone()
    }

    /// Calls that change the remote system.
    pub fn mutations(&self) -> Vec<String> {
        self.calls()
            .into_iter()
            .filter(|c| {
                !(c.starts_with("get ")
                    || c.starts_with("list ")
                    || c.starts_with("columns ")
                    || c.starts_with("indexes ")
                    || c.starts_with("upload_version")
                    || c.starts_with("dry_run"))
            })
            .collect()
    }

    pub fn find(&self, kind: AssetKind, name: &str) -> Option<Asset> {
        self.state
            .lock()
            .unwrap()
            .assets
            .iter()
            .find(|a| a.kind() == kind && a.name() == name)
            .cloned()
    }

    fn record(&self, call: String) {
        self.state.lock().unwrap().calls.push(call);
    }
}

fn not_found(target: &AssetRef) -> CliError {
    CliError::NotFound(target.to_string())
}

fn set_schema_columns(asset: &mut Asset, f: impl FnOnce(&mut Vec<Column>)) {
    if let Asset::UserSchema(s) | Asset::DeviceSchema(s) | Asset::EdgeSchema(s) = asset {
        f(&mut s.columns);
    }
}

#[async_trait]
impl AssetClient for FakeClient {
    async fn upload_version(&self) -> CliResult<u32> {
        self.record("upload_version".into());
        Ok(self.state.lock().unwrap().upload_version)
    }

    async fn get(&self, target: &AssetRef) -> CliResult<Asset> {
        self.record(format!("get {} {}", target.kind, target.name));
        self.find(target.kind, &target.name)
            .ok_or_else(|| CliError::remote("get", target.to_string(), not_found(target)))
    }

    async fn list(&self, kind: AssetKind) -> CliResult<Vec<Asset>> {
        self.record(format!("list {kind}"));
        Ok(self
            .state
            .lock()
            .unwrap()
            .assets
            .iter()
            .filter(|a| a.kind() == kind)
            .map(|a| match a {
                // Lists carry no role membership.
                Asset::User(user) => Asset::User(User {
                    roles: None,
                    ..user.clone()
                }),
                other => other.clone(),
            })
            .collect())
    }

    async fn create(&self, asset: &Asset) -> CliResult<Option<String>> {
        let kind = asset.kind();
        self.record(format!("create {kind} {}", asset.name()));
        let mut state = self.state.lock().unwrap();
        if state.failing.contains(asset.name()) {
            return Err(CliError::Api {
                status: 500,
                message: format!("cannot create {}", asset.name()),
            });
        }

        state.next_id += 1;
        let id = kind.is_id_addressed().then(|| format!("id-{}", state.next_id));
        let mut stored = asset.clone();
        match &mut stored {
            Asset::Collection(c) => {
                c.collection_id = id.clone();
                c.items.clear();
            }
            Asset::User(u) => {
                u.user_id = id.clone();
                u.roles = Some(Vec::new());
            }
            Asset::Device(d) => d.roles = Some(Vec::new()),
            Asset::Role(r) => r.id = id.clone(),
            _ => {}
        }
        state.assets.push(stored);
        Ok(id)
    }

    async fn update(&self, target: &AssetRef, asset: &Asset) -> CliResult<()> {
        self.record(format!("update {} {}", target.kind, target.name));
        let mut state = self.state.lock().unwrap();
        if state.failing.contains(&target.name) {
            return Err(CliError::Api {
                status: 500,
                message: format!("cannot update {}", target.name),
            });
        }
        let Some(existing) = state
            .assets
            .iter_mut()
            .find(|a| a.kind() == target.kind && a.name() == target.name)
        else {
            return Err(not_found(target));
        };
        let mut updated = asset.clone();
        // Role membership only changes through the roles endpoint.
        match (&mut updated, &*existing) {
            (Asset::User(new), Asset::User(old)) => new.roles = old.roles.clone(),
            (Asset::Device(new), Asset::Device(old)) => new.roles = old.roles.clone(),
            _ => {}
        }
        *existing = updated;
        Ok(())
    }

    async fn delete(&self, target: &AssetRef) -> CliResult<()> {
        self.record(format!("delete {} {}", target.kind, target.name));
        let mut state = self.state.lock().unwrap();
        let before = state.assets.len();
        state
            .assets
            .retain(|a| !(a.kind() == target.kind && a.name() == target.name));
        if state.assets.len() == before {
            return Err(not_found(target));
        }
        Ok(())
    }

    async fn columns(&self, target: &AssetRef) -> CliResult<Vec<Column>> {
        self.record(format!("columns {} {}", target.kind, target.name));
        if target.kind.is_schema() {
            return Ok(self
                .find(target.kind, &target.name)
                .and_then(|a| a.columns().map(<[Column]>::to_vec))
                .unwrap_or_default());
        }
        Ok(self
            .state
            .lock()
            .unwrap()
            .columns
            .get(&target.name)
            .cloned()
            .unwrap_or_default())
    }

    async fn add_column(&self, target: &AssetRef, column: &Column) -> CliResult<()> {
        self.record(format!("add_column {} {}.{}", target.kind, target.name, column.name));
        let mut state = self.state.lock().unwrap();
        if target.kind.is_schema() {
            if let Some(asset) = state.assets.iter_mut().find(|a| a.kind() == target.kind) {
                set_schema_columns(asset, |columns| columns.push(column.clone()));
            }
        } else {
            state
                .columns
                .entry(target.name.clone())
                .or_default()
                .push(column.clone());
        }
        Ok(())
    }

    async fn drop_column(&self, target: &AssetRef, column: &str) -> CliResult<()> {
        self.record(format!("drop_column {} {}.{column}", target.kind, target.name));
        let mut state = self.state.lock().unwrap();
        if target.kind.is_schema() {
            if let Some(asset) = state.assets.iter_mut().find(|a| a.kind() == target.kind) {
                set_schema_columns(asset, |columns| columns.retain(|c| c.name != column));
            }
        } else if let Some(columns) = state.columns.get_mut(&target.name) {
            columns.retain(|c| c.name != column);
        }
        Ok(())
    }

    async fn indexes(&self, collection: &AssetRef) -> CliResult<Vec<Index>> {
        self.record(format!("indexes {}", collection.name));
        Ok(self
            .state
            .lock()
            .unwrap()
            .indexes
            .get(&collection.name)
            .cloned()
            .unwrap_or_default())
    }

    async fn create_index(&self, collection: &AssetRef, index: &Index) -> CliResult<()> {
        self.record(format!("create_index {}.{}", collection.name, index.name));
        self.state
            .lock()
            .unwrap()
            .indexes
            .entry(collection.name.clone())
            .or_default()
            .push(index.clone());
        Ok(())
    }

    async fn drop_index(&self, collection: &AssetRef, index: &Index) -> CliResult<()> {
        self.record(format!("drop_index {}.{}", collection.name, index.name));
        if let Some(indexes) = self.state.lock().unwrap().indexes.get_mut(&collection.name) {
            indexes.retain(|i| i != index);
        }
        Ok(())
    }

    async fn update_user_roles(
        &self,
        user: &AssetRef,
        add: &[String],
        remove: &[String],
    ) -> CliResult<()> {
        self.record(format!(
            "user_roles {} +[{}] -[{}]",
            user.name,
            add.join(","),
            remove.join(",")
        ));
        let mut state = self.state.lock().unwrap();
        for asset in state.assets.iter_mut() {
            if let Asset::User(u) = asset {
                if u.email == user.name {
                    let roles = u.roles.get_or_insert_with(Vec::new);
                    roles.retain(|r| !remove.contains(r));
                    roles.extend(add.iter().cloned());
                }
            }
        }
        Ok(())
    }

    async fn update_device_roles(
        &self,
        device: &AssetRef,
        add: &[String],
        remove: &[String],
    ) -> CliResult<()> {
        self.record(format!(
            "device_roles {} +[{}] -[{}]",
            device.name,
            add.join(","),
            remove.join(",")
        ));
        Ok(())
    }

    async fn insert_items(&self, collection: &AssetRef, items: &[Value]) -> CliResult<()> {
        self.record(format!("insert {} {}", collection.ident(), items.len()));
        let mut state = self.state.lock().unwrap();
        if state.insert_failures > 0 {
            state.insert_failures -= 1;
            return Err(CliError::Network("connection reset".into()));
        }
        state.inserted.push(items.to_vec());
        Ok(())
    }

    async fn dry_run_upload(&self, archive: &[u8]) -> CliResult<DryRunResponse> {
        self.record(format!("dry_run {}", !archive.is_empty()));
        let response = self.state.lock().unwrap().dry_run.clone();
        if response.is_null() {
            return Ok(DryRunResponse::default());
        }
        Ok(serde_json::from_value(response)?)
    }

    async fn upload(&self, _archive: &[u8]) -> CliResult<UploadResponse> {
        self.record("upload".into());
        let response = self.state.lock().unwrap().upload.clone();
        if response.is_null() {
            return Ok(UploadResponse::default());
        }
        Ok(serde_json::from_value(response)?)
    }
}

/// Answers confirmations from a script and remembers the questions.
#[derive(Default)]
pub struct ScriptedPrompter {
    answers: RefCell<VecDeque<bool>>,
    pub asked: RefCell<Vec<String>>,
}

impl ScriptedPrompter {
    pub fn answering(answers: &[bool]) -> Self {
        Self {
            answers: RefCell::new(answers.iter().copied().collect()),
            asked: RefCell::new(Vec::new()),
        }
    }

    pub fn questions(&self) -> Vec<String> {
        self.asked.borrow().clone()
    }
}

impl Prompter for ScriptedPrompter {
    fn confirm(&self, prompt: &str, _default: bool) -> CliResult<bool> {
        self.asked.borrow_mut().push(prompt.to_string());
        self.answers
            .borrow_mut()
            .pop_front()
            .ok_or_else(|| CliError::InputError(format!("unexpected prompt: {prompt}")))
    }

    fn secret(&self, _prompt: &str) -> CliResult<String> {
        Ok("s3cret".into())
    }
}

// ============================================================================
// Fixtures
// ============================================================================

pub fn write(root: &Path, relative: &str, contents: &str) {
    let path = root.join(relative);
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(path, contents).unwrap();
}

pub fn service(name: &str, code: &str) -> Asset {
    Asset::Service(Service {
        name: name.into(),
        code: code.into(),
        dependencies: String::new(),
        parameters: Vec::new(),
        extra: Map::new(),
    })
}

pub fn library(name: &str, dependencies: &str) -> Asset {
    Asset::Library(Library {
        name: name.into(),
        code: format!("var {name} = {{}};"),
        dependencies: dependencies.into(),
        description: String::new(),
        extra: Map::new(),
    })
}

pub fn collection(name: &str, columns: Vec<Column>, indexes: Vec<Index>) -> Asset {
    Asset::Collection(Collection {
        name: name.into(),
        collection_id: None,
        schema: columns,
        indexes,
        items: Vec::new(),
        extra: Map::new(),
    })
}

pub fn user(email: &str, roles: Option<&[&str]>) -> Asset {
    Asset::User(User {
        email: email.into(),
        user_id: None,
        roles: roles.map(|r| r.iter().map(|s| s.to_string()).collect()),
        extra: Map::new(),
    })
}

pub fn role(name: &str, description: &str) -> Asset {
    Asset::Role(Role {
        name: name.into(),
        id: None,
        description: description.into(),
        permissions: RolePermissions::default(),
        extra: Map::new(),
    })
}

pub fn user_schema(columns: Vec<Column>) -> Asset {
    Asset::UserSchema(TableSchema::new(columns))
}
