//! HTTP object-store client for image assets.
//!
//! Speaks a small REST surface: multipart `POST /upload` returning the
//! public URL plus storage key, and `DELETE /assets/{key}`.

use std::path::Path;

use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use serde::Deserialize;
use url::Url;

use crate::application::objectstore::{ObjectStore, ObjectStoreError, StoredAsset};
use crate::config::ObjectStoreSettings;

pub struct HttpObjectStore {
    http: reqwest::Client,
    base_url: Url,
    api_key: Option<String>,
}

#[derive(Debug, Deserialize)]
struct UploadResponse {
    url: String,
    key: String,
}

impl HttpObjectStore {
    pub fn new(settings: &ObjectStoreSettings) -> Result<Self, ObjectStoreError> {
        let base_url = Url::parse(&settings.base_url)
            .map_err(|err| ObjectStoreError::Upload(format!("invalid base url: {err}")))?;
        Ok(Self {
            http: reqwest::Client::new(),
            base_url,
            api_key: settings.api_key.clone(),
        })
    }

    fn endpoint(&self, path: &str) -> Result<Url, ObjectStoreError> {
        self.base_url
            .join(path)
            .map_err(|err| ObjectStoreError::Upload(format!("invalid endpoint `{path}`: {err}")))
    }

    fn authorize(&self, request: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match &self.api_key {
            Some(key) => request.bearer_auth(key),
            None => request,
        }
    }
}

#[async_trait]
impl ObjectStore for HttpObjectStore {
    async fn upload(
        &self,
        local_path: &Path,
        folder: &str,
    ) -> Result<StoredAsset, ObjectStoreError> {
        let bytes = tokio::fs::read(local_path).await?;
        let file_name = local_path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| "upload".to_string());

        let form = Form::new()
            .part("file", Part::bytes(bytes).file_name(file_name))
            .text("folder", folder.to_string());

        let response = self
            .authorize(self.http.post(self.endpoint("upload")?))
            .multipart(form)
            .send()
            .await
            .map_err(|err| ObjectStoreError::Upload(err.to_string()))?;

        if !response.status().is_success() {
            return Err(ObjectStoreError::Upload(format!(
                "upload rejected with status {}",
                response.status()
            )));
        }

        let body: UploadResponse = response
            .json()
            .await
            .map_err(|err| ObjectStoreError::Upload(err.to_string()))?;

        Ok(StoredAsset {
            url: body.url,
            key: body.key,
        })
    }

    async fn delete(&self, key: &str) -> Result<(), ObjectStoreError> {
        let endpoint = self
            .endpoint(&format!("assets/{key}"))
            .map_err(|err| ObjectStoreError::Delete(err.to_string()))?;

        let response = self
            .authorize(self.http.delete(endpoint))
            .send()
            .await
            .map_err(|err| ObjectStoreError::Delete(err.to_string()))?;

        if !response.status().is_success() {
            return Err(ObjectStoreError::Delete(format!(
                "delete rejected with status {}",
                response.status()
            )));
        }
        Ok(())
    }
}
