//! Pull command - write remote assets into the local tree

use clap::Args;
use serde::Serialize;
use std::fs;

use super::selection::SelectionArgs;
use crate::api::{AssetClient, AssetRef};
use crate::cache::IdCaches;
use crate::config::ConfigPaths;
use crate::error::CliResult;
use crate::models::Asset;
use crate::output::{print_success, print_warning};
use crate::resource::path::{code_path, roles_path};
use crate::resource::{asset_path, SelectionPolicy};
use crate::session::{Session, SessionOptions};

/// Download remote assets into the local tree
#[derive(Args, Debug)]
pub struct PullArgs {
    #[command(flatten)]
    pub selection: SelectionArgs,
}

/// Execute the pull command
pub async fn execute(args: PullArgs, options: &SessionOptions) -> CliResult<()> {
    let policy = args.selection.to_policy()?;
    let session = Session::open(options)?;
    let mut caches = session.caches();

    let summary = pull_assets(&session.client, &session.paths, &policy, &mut caches).await?;
    for missing in &summary.missing {
        print_warning(&format!("{missing} does not exist on remote '{}'", session.remote_name));
    }
    print_success(&format!(
        "Pulled {} asset(s) from '{}' ({} file(s) written)",
        summary.assets,
        session.remote_name,
        summary.files.len()
    ));
    Ok(())
}

#[derive(Debug, Default, Serialize)]
pub struct PullSummary {
    pub assets: usize,
    /// Relative paths written
    pub files: Vec<String>,
    /// Explicitly named assets the remote does not have
    pub missing: Vec<String>,
}

/// Fetch every selected remote asset and write it at its local path.
pub async fn pull_assets(
    client: &dyn AssetClient,
    paths: &ConfigPaths,
    policy: &SelectionPolicy,
    caches: &mut IdCaches,
) -> CliResult<PullSummary> {
    let mut summary = PullSummary::default();

    for kind in policy.selected_kinds() {
        let listed = client.list(kind).await?;
        tracing::debug!(%kind, remote = listed.len(), "Pulling kind");

        for name in policy.names(kind) {
            if !listed.iter().any(|a| a.name() == name) {
                summary.missing.push(AssetRef::new(kind, name).to_string());
            }
        }

        for remote in listed.iter().filter(|a| kind.is_schema() || policy.includes(kind, a.name())) {
            let asset = complete(client, remote).await?;
            summary.files.extend(write_asset(paths, &asset)?);
            summary.assets += 1;

            if let Some(id) = asset.remote_id() {
                caches.record(kind, asset.name(), id)?;
            }
        }
    }
    Ok(summary)
}

/// Lists are summaries; fetch what a local file needs.
async fn complete(client: &dyn AssetClient, listed: &Asset) -> CliResult<Asset> {
    let kind = listed.kind();
    if kind.is_schema() {
        return Ok(listed.clone());
    }

    let target = AssetRef::of(listed);
    let mut asset = client.get(&target).await?;
    if let Asset::Collection(collection) = &mut asset {
        let target = AssetRef::of(listed).with_id(collection.collection_id.clone().or(target.id));
        collection.schema = client.columns(&target).await?;
        collection.indexes = client.indexes(&target).await?;
    }
    Ok(asset)
}

fn write_json(paths: &ConfigPaths, relative: &str, value: &impl Serialize) -> CliResult<String> {
    let path = paths.resolve(relative);
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    fs::write(&path, serde_json::to_string_pretty(value)? + "\n")?;
    Ok(relative.to_string())
}

/// Write one asset in the on-disk layout, splitting out code and role
/// membership. Returns the relative paths written.
pub fn write_asset(paths: &ConfigPaths, asset: &Asset) -> CliResult<Vec<String>> {
    let kind = asset.kind();
    let name = asset.name().to_string();
    let mut written = Vec::new();
    let mut definition = asset.clone();

    let code = match &mut definition {
        Asset::Service(service) => Some(std::mem::take(&mut service.code)),
        Asset::Library(library) => Some(std::mem::take(&mut library.code)),
        _ => None,
    };
    if let (Some(code), Some(relative)) = (code, code_path(kind, &name)) {
        let path = paths.resolve(&relative);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&path, code)?;
        written.push(relative);
    }

    let roles = match &mut definition {
        Asset::User(user) => user.roles.take(),
        Asset::Device(device) => device.roles.take(),
        _ => None,
    };
    if let (Some(roles), Some(relative)) = (roles, roles_path(kind, &name)) {
        written.push(write_json(paths, &relative, &roles)?);
    }

    written.push(write_json(paths, &asset_path(kind, &name), &definition.to_wire()?)?);
    tracing::debug!(%kind, name = %name, files = written.len(), "Wrote asset");
    Ok(written)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{AssetKind, Library, Service, User};
    use crate::resource::LocalBundle;
    use serde_json::Map;
    use tempfile::TempDir;

    #[test]
    fn test_write_service_splits_code() {
        let dir = TempDir::new().unwrap();
        let paths = ConfigPaths::at(dir.path());
        let service = Asset::Service(Service {
            name: "hello".into(),
            code: "function hello(req, resp) { resp.success('hi') }".into(),
            dependencies: "utils".into(),
            parameters: vec![],
            extra: Map::new(),
        });

        let written = write_asset(&paths, &service).unwrap();
        assert_eq!(
            written,
            vec!["code/services/hello/hello.js", "code/services/hello/hello.json"]
        );
        let meta = fs::read_to_string(dir.path().join("code/services/hello/hello.json")).unwrap();
        assert!(!meta.contains("resp.success"));
    }

    #[test]
    fn test_written_assets_load_back() {
        let dir = TempDir::new().unwrap();
        let paths = ConfigPaths::at(dir.path());
        let library = Asset::Library(Library {
            name: "utils".into(),
            code: "var x = 1;".into(),
            dependencies: String::new(),
            description: "helpers".into(),
            extra: Map::new(),
        });
        let user = Asset::User(User {
            email: "ops@example.com".into(),
            user_id: Some("u-1".into()),
            roles: Some(vec!["Authenticated".into(), "Operator".into()]),
            extra: Map::new(),
        });
        write_asset(&paths, &library).unwrap();
        write_asset(&paths, &user).unwrap();

        let bundle = LocalBundle::load(dir.path(), &SelectionPolicy::everything()).unwrap();
        assert!(bundle.errors().is_empty(), "{:?}", bundle.errors());
        assert_eq!(bundle.get(AssetKind::Library, "utils"), Some(&library));
        assert_eq!(bundle.get(AssetKind::User, "ops@example.com"), Some(&user));
    }
}
