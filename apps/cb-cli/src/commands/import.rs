//! Import command - upload collection items page by page

use clap::Args;
use serde_json::Value;
use std::fs;
use std::io::IsTerminal;

use crate::api::{AssetClient, AssetRef, RetryPolicy};
use crate::batch::ImportProgress;
use crate::cache::IdCaches;
use crate::config::ConfigPaths;
use crate::error::{CliError, CliResult};
use crate::models::{Asset, AssetKind};
use crate::output::print_success;
use crate::resource::asset_path;
use crate::session::{Session, SessionOptions};

/// Upload the items of a local collection
#[derive(Args, Debug)]
pub struct ImportArgs {
    /// Collection name (data/<name>.json)
    #[arg(long)]
    pub collection: String,

    /// Items per request (defaults to the configured page size)
    #[arg(long)]
    pub page_size: Option<usize>,
}

/// Execute the import command
pub async fn execute(args: ImportArgs, options: &SessionOptions) -> CliResult<()> {
    let session = Session::open(options)?;
    let page_size = args.page_size.unwrap_or(session.config.import_page_size);
    let items = read_items(&session.paths, &args.collection)?;
    let mut caches = session.caches();
    let target = resolve_collection(&session.client, &mut caches, &args.collection).await?;

    let progress = ImportProgress::new(
        items.len() as u64,
        &args.collection,
        std::io::stderr().is_terminal(),
    );
    let result = import_items(
        &session.client,
        &session.retry_policy(),
        &target,
        &items,
        page_size,
        &progress,
    )
    .await;

    match result {
        Ok(count) => {
            progress.finish_and_clear();
            print_success(&format!(
                "Imported {count} item(s) into collection '{}'",
                args.collection
            ));
            Ok(())
        }
        Err(e) => {
            progress.finish_with_message(&format!(
                "Stopped after {} item(s)",
                progress.position()
            ));
            Err(e)
        }
    }
}

/// Items of `data/<collection>.json`.
pub fn read_items(paths: &ConfigPaths, collection: &str) -> CliResult<Vec<Value>> {
    let relative = asset_path(AssetKind::Collection, collection);
    let path = paths.resolve(&relative);
    if !path.exists() {
        return Err(CliError::Validation(format!("{relative} not found")));
    }
    let value: Value = serde_json::from_slice(&fs::read(&path)?)
        .map_err(|e| CliError::Validation(format!("{relative}: {e}")))?;
    match Asset::from_wire(AssetKind::Collection, value)? {
        Asset::Collection(collection) => Ok(collection.items),
        _ => Err(CliError::Validation(format!("{relative} is not a collection"))),
    }
}

/// Address the remote collection by id, resolving and caching it if needed.
pub async fn resolve_collection(
    client: &dyn AssetClient,
    caches: &mut IdCaches,
    name: &str,
) -> CliResult<AssetRef> {
    if let Some(id) = caches.id_of(AssetKind::Collection, name) {
        return Ok(AssetRef::new(AssetKind::Collection, name).with_id(Some(id)));
    }
    let remote = client
        .get(&AssetRef::new(AssetKind::Collection, name))
        .await
        .map_err(|e| {
            if e.is_not_found() {
                CliError::NotFound(format!(
                    "collection '{name}' on the remote; push it before importing items"
                ))
            } else {
                e
            }
        })?;
    let target = AssetRef::of(&remote);
    if let Some(id) = &target.id {
        caches.record(AssetKind::Collection, name, id)?;
    }
    Ok(target)
}

/// Insert `items` in pages of `page_size`, retrying transient failures of
/// each page. Returns the number of items inserted.
pub async fn import_items(
    client: &dyn AssetClient,
    retry: &RetryPolicy,
    target: &AssetRef,
    items: &[Value],
    page_size: usize,
    progress: &ImportProgress,
) -> CliResult<usize> {
    if page_size == 0 {
        return Err(CliError::Validation("page size must be at least 1".into()));
    }

    let mut inserted = 0;
    for (page, chunk) in items.chunks(page_size).enumerate() {
        retry
            .execute(&format!("insert page {}", page + 1), || {
                client.insert_items(target, chunk)
            })
            .await?;
        inserted += chunk.len();
        progress.advance(chunk.len() as u64);
        tracing::debug!(collection = %target.name, page = page + 1, inserted, "Page imported");
    }
    Ok(inserted)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tempfile::TempDir;

    #[test]
    fn test_read_items() {
        let dir = TempDir::new().unwrap();
        let paths = ConfigPaths::at(dir.path());
        fs::create_dir_all(dir.path().join("data")).unwrap();
        fs::write(
            dir.path().join("data/weather.json"),
            json!({
                "name": "weather",
                "schema": [{"ColumnName": "temp", "ColumnType": "float"}],
                "items": [{"temp": 1.5}, {"temp": 2.5}]
            })
            .to_string(),
        )
        .unwrap();

        let items = read_items(&paths, "weather").unwrap();
        assert_eq!(items.len(), 2);
        assert!(matches!(
            read_items(&paths, "missing"),
            Err(CliError::Validation(_))
        ));
    }
}
