//! HTTP client for the platform REST API

use async_trait::async_trait;
use reqwest::{header::CONTENT_TYPE, Client, Method, RequestBuilder, Response, StatusCode};
use serde::de::DeserializeOwned;
use serde_json::{json, Value};
use std::time::{Duration, Instant};

use super::resources::{
    columns_path, extract_id, indexes_path, item_path, items_path, kind_path, roles_path,
    unwrap_list, upload_path, upload_version_path,
};
use super::{AssetClient, AssetRef};
use crate::config::{Config, Remote};
use crate::error::{CliError, CliResult};
use crate::logging::Redactor;
use crate::models::{Asset, AssetKind, Collection, Column, Index, TableSchema};
use crate::plan::{DryRunResponse, UploadResponse};

/// Header carrying the developer token
pub const DEV_TOKEN_HEADER: &str = "ClearBlade-DevToken";

/// API client bound to one remote system
pub struct HttpClient {
    client: Client,
    platform_url: String,
    system_key: String,
    token: String,
    redactor: Redactor,
}

impl HttpClient {
    /// Create a client for `remote`, with the timeout from `config`
    pub fn new(remote: &Remote, config: &Config) -> CliResult<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| CliError::Network(format!("Failed to create HTTP client: {e}")))?;

        Ok(Self {
            client,
            platform_url: remote.platform_url.trim_end_matches('/').to_string(),
            system_key: remote.system_key.clone(),
            token: remote.token.clone(),
            redactor: Redactor::new(),
        })
    }

    pub fn system_key(&self) -> &str {
        &self.system_key
    }

    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        let url = format!("{}{}", self.platform_url, path);
        self.client
            .request(method, url)
            .header(DEV_TOKEN_HEADER, &self.token)
    }

    /// Send a request and map non-success statuses to errors.
    async fn send(&self, builder: RequestBuilder, what: &str) -> CliResult<Response> {
        let request = builder.build()?;
        let (method, url) = (request.method().clone(), request.url().clone());
        if let Some(body) = request.body().and_then(|b| b.as_bytes()) {
            if tracing::enabled!(tracing::Level::TRACE) && body.len() < 64 * 1024 {
                let text = String::from_utf8_lossy(body);
                tracing::trace!(%method, %url, body = %self.redactor.redact(&text), "Request body");
            }
        }

        let started = Instant::now();
        let response = self.client.execute(request).await?;
        tracing::debug!(
            %method,
            %url,
            status = response.status().as_u16(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "HTTP request"
        );

        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let body = response.text().await.unwrap_or_default();
        tracing::trace!(status = status.as_u16(), body = %self.redactor.redact(&body), "Error body");
        Err(match status {
            StatusCode::NOT_FOUND => CliError::NotFound(what.to_string()),
            StatusCode::CONFLICT => CliError::Conflict(format!("{what}: {body}")),
            StatusCode::BAD_REQUEST => CliError::Validation(format!("{what}: {body}")),
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
                CliError::AuthenticationFailed(format!("{what}: {body}"))
            }
            _ => CliError::Api {
                status: status.as_u16(),
                message: body,
            },
        })
    }

    async fn read_json<T: DeserializeOwned>(&self, response: Response) -> CliResult<T> {
        let text = response.text().await?;
        tracing::trace!(body = %self.redactor.redact(&text), "Response body");
        let text = if text.trim().is_empty() { "null" } else { &text };
        serde_json::from_str(text).map_err(|e| CliError::Server(format!("Unexpected response: {e}")))
    }

    async fn get_json<T: DeserializeOwned>(&self, path: &str, what: &str) -> CliResult<T> {
        let response = self.send(self.request(Method::GET, path), what).await?;
        self.read_json(response).await
    }

    async fn send_json(&self, method: Method, path: &str, body: &Value, what: &str) -> CliResult<Value> {
        let response = self.send(self.request(method, path).json(body), what).await?;
        self.read_json(response).await
    }

    async fn delete_path(&self, path: &str, what: &str) -> CliResult<()> {
        self.send(self.request(Method::DELETE, path), what).await?;
        Ok(())
    }

    async fn upload_archive<T: DeserializeOwned>(&self, archive: &[u8], dry_run: bool) -> CliResult<T> {
        let builder = self
            .request(Method::POST, &upload_path(&self.system_key, dry_run))
            .header(CONTENT_TYPE, "application/zip")
            .body(archive.to_vec());
        let response = self.send(builder, "system upload").await?;
        self.read_json(response).await
    }

    async fn role_names(&self, target: &AssetRef) -> CliResult<Vec<String>> {
        let value: Value = self
            .get_json(&roles_path(target, &self.system_key), &target.to_string())
            .await?;
        Ok(unwrap_list(value)
            .into_iter()
            .filter_map(|role| match role {
                Value::String(name) => Some(name),
                Value::Object(map) => map
                    .get("Name")
                    .or_else(|| map.get("name"))
                    .and_then(Value::as_str)
                    .map(str::to_string),
                _ => None,
            })
            .collect())
    }

    async fn fetch(&self, target: &AssetRef) -> CliResult<Asset> {
        if target.kind.is_schema() {
            let columns: Vec<Column> = self
                .get_json(&kind_path(target.kind, &self.system_key), &target.to_string())
                .await?;
            let schema = TableSchema::new(columns);
            return Ok(match target.kind {
                AssetKind::UserSchema => Asset::UserSchema(schema),
                AssetKind::DeviceSchema => Asset::DeviceSchema(schema),
                _ => Asset::EdgeSchema(schema),
            });
        }

        // Without a cached id, id-addressed kinds are found by name.
        if target.kind.is_id_addressed() && target.id.is_none() {
            return self
                .list(target.kind)
                .await?
                .into_iter()
                .find(|asset| asset.name() == target.name)
                .ok_or_else(|| CliError::NotFound(target.to_string()));
        }

        let value: Value = self
            .get_json(&item_path(target, &self.system_key), &target.to_string())
            .await?;
        let mut asset = Asset::from_wire(target.kind, value)?;
        match &mut asset {
            Asset::User(user) => {
                user.user_id = user.user_id.take().or_else(|| target.id.clone());
                user.roles = Some(self.role_names(target).await?);
            }
            Asset::Device(device) => device.roles = Some(self.role_names(target).await?),
            Asset::Collection(Collection { collection_id, .. }) => {
                *collection_id = collection_id.take().or_else(|| target.id.clone());
            }
            _ => {}
        }
        Ok(asset)
    }
}

#[async_trait]
impl AssetClient for HttpClient {
    async fn upload_version(&self) -> CliResult<u32> {
        let result: CliResult<Value> = self
            .get_json(&upload_version_path(&self.system_key), "upload version")
            .await;
        match result {
            Ok(value) => Ok(value
                .get("upload_version")
                .and_then(Value::as_u64)
                .map_or(0, |v| v as u32)),
            // Remotes predating the endpoint answer 404.
            Err(e) if e.is_not_found() => Ok(0),
            Err(e) => Err(CliError::remote("fetch", "upload version", e)),
        }
    }

    async fn get(&self, target: &AssetRef) -> CliResult<Asset> {
        self.fetch(target)
            .await
            .map_err(|e| CliError::remote("get", target.to_string(), e))
    }

    async fn list(&self, kind: AssetKind) -> CliResult<Vec<Asset>> {
        if kind.is_schema() {
            return match self.fetch(&AssetRef::new(kind, crate::models::SCHEMA_NAME)).await {
                Ok(schema) => Ok(vec![schema]),
                Err(e) if e.is_not_found() => Ok(Vec::new()),
                Err(e) => Err(CliError::remote("list", kind.to_string(), e)),
            };
        }

        let value: Value = self
            .get_json(&kind_path(kind, &self.system_key), kind.section_title())
            .await
            .map_err(|e| CliError::remote("list", kind.to_string(), e))?;
        unwrap_list(value)
            .into_iter()
            .map(|item| Asset::from_wire(kind, item))
            .collect()
    }

    async fn create(&self, asset: &Asset) -> CliResult<Option<String>> {
        let target = AssetRef::of(asset);
        let body = asset.to_wire()?;
        let response = self
            .send_json(
                Method::POST,
                &kind_path(asset.kind(), &self.system_key),
                &body,
                &target.to_string(),
            )
            .await
            .map_err(|e| CliError::remote("create", target.to_string(), e))?;
        Ok(extract_id(asset.kind(), &response))
    }

    async fn update(&self, target: &AssetRef, asset: &Asset) -> CliResult<()> {
        let body = asset.to_wire()?;
        self.send_json(
            Method::PUT,
            &item_path(target, &self.system_key),
            &body,
            &target.to_string(),
        )
        .await
        .map_err(|e| CliError::remote("update", target.to_string(), e))?;
        Ok(())
    }

    async fn delete(&self, target: &AssetRef) -> CliResult<()> {
        self.delete_path(&item_path(target, &self.system_key), &target.to_string())
            .await
            .map_err(|e| CliError::remote("delete", target.to_string(), e))
    }

    async fn columns(&self, target: &AssetRef) -> CliResult<Vec<Column>> {
        self.get_json(&columns_path(target, &self.system_key), &target.to_string())
            .await
            .map_err(|e| CliError::remote("list columns", target.to_string(), e))
    }

    async fn add_column(&self, target: &AssetRef, column: &Column) -> CliResult<()> {
        let body = serde_json::to_value(column)?;
        self.send_json(
            Method::POST,
            &columns_path(target, &self.system_key),
            &body,
            &target.to_string(),
        )
        .await
        .map_err(|e| CliError::remote(format!("add column {}", column.name), target.to_string(), e))?;
        Ok(())
    }

    async fn drop_column(&self, target: &AssetRef, column: &str) -> CliResult<()> {
        let path = format!(
            "{}?column={}",
            columns_path(target, &self.system_key),
            urlencoding::encode(column)
        );
        self.delete_path(&path, &target.to_string())
            .await
            .map_err(|e| CliError::remote(format!("drop column {column}"), target.to_string(), e))
    }

    async fn indexes(&self, collection: &AssetRef) -> CliResult<Vec<Index>> {
        let value: Value = self
            .get_json(&indexes_path(collection, &self.system_key), &collection.to_string())
            .await
            .map_err(|e| CliError::remote("list indexes", collection.to_string(), e))?;
        unwrap_list(value)
            .into_iter()
            .map(|index| serde_json::from_value(index).map_err(CliError::from))
            .collect()
    }

    async fn create_index(&self, collection: &AssetRef, index: &Index) -> CliResult<()> {
        let body = serde_json::to_value(index)?;
        self.send_json(
            Method::POST,
            &indexes_path(collection, &self.system_key),
            &body,
            &collection.to_string(),
        )
        .await
        .map_err(|e| CliError::remote(format!("create index {}", index.name), collection.to_string(), e))?;
        Ok(())
    }

    async fn drop_index(&self, collection: &AssetRef, index: &Index) -> CliResult<()> {
        let path = format!(
            "{}?name={}",
            indexes_path(collection, &self.system_key),
            urlencoding::encode(&index.name)
        );
        self.delete_path(&path, &collection.to_string())
            .await
            .map_err(|e| CliError::remote(format!("drop index {}", index.name), collection.to_string(), e))
    }

    async fn update_user_roles(
        &self,
        user: &AssetRef,
        add: &[String],
        remove: &[String],
    ) -> CliResult<()> {
        let body = json!({ "add": add, "delete": remove });
        self.send_json(Method::PUT, &roles_path(user, &self.system_key), &body, &user.to_string())
            .await
            .map_err(|e| CliError::remote("update roles", user.to_string(), e))?;
        Ok(())
    }

    async fn update_device_roles(
        &self,
        device: &AssetRef,
        add: &[String],
        remove: &[String],
    ) -> CliResult<()> {
        let body = json!({ "add": add, "delete": remove });
        self.send_json(Method::PUT, &roles_path(device, &self.system_key), &body, &device.to_string())
            .await
            .map_err(|e| CliError::remote("update roles", device.to_string(), e))?;
        Ok(())
    }

    async fn insert_items(&self, collection: &AssetRef, items: &[Value]) -> CliResult<()> {
        let body = Value::Array(items.to_vec());
        self.send_json(Method::POST, &items_path(collection), &body, &collection.to_string())
            .await
            .map_err(|e| CliError::remote("insert items", collection.to_string(), e))?;
        Ok(())
    }

    async fn dry_run_upload(&self, archive: &[u8]) -> CliResult<DryRunResponse> {
        self.upload_archive(archive, true)
            .await
            .map_err(|e| CliError::remote("dry run", "system upload", e))
    }

    async fn upload(&self, archive: &[u8]) -> CliResult<UploadResponse> {
        self.upload_archive(archive, false)
            .await
            .map_err(|e| CliError::remote("upload", "system upload", e))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn remote(url: &str) -> Remote {
        Remote {
            platform_url: url.to_string(),
            messaging_url: String::new(),
            system_key: "sk".to_string(),
            system_secret: "secret".to_string(),
            token: "tok".to_string(),
        }
    }

    #[test]
    fn test_client_creation_trims_url() {
        let client = HttpClient::new(&remote("https://platform.example/"), &Config::default()).unwrap();
        assert_eq!(client.platform_url, "https://platform.example");
        assert_eq!(client.system_key(), "sk");
    }
}
