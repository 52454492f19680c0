//! Backend port and its HTTP implementation.
//!
//! The [`Backend`] trait is the only way controllers talk to the document
//! service. [`HttpBackend`] implements it over REST with reqwest; tests
//! substitute an in-memory fake.
//!
//! # Endpoints
//!
//! | Method | Path | Request |
//! |--------|------|---------|
//! | `GET`  | `/files/` | |
//! | `GET`  | `/groups/` | |
//! | `POST` | `/upload/` | multipart field `file` |
//! | `POST` | `/ask/` | JSON [`AskRequest`] |
//! | `POST` | `/delete/?filename=` | |
//! | `POST` | `/rename/?old_name=&new_name=` | |
//! | `POST` | `/group/?filename=&group=` | |
//! | `GET`  | `/content/?filename=` | |
//! | `POST` | `/test_deepseek_key/` | form field `key` |
//! | `POST` | `/set_deepseek_key/` | form field `key` |
//!
//! # Response Contract
//!
//! The backend sends `{"error": "..."}` bodies with 4xx/5xx statuses, so the
//! body is decoded regardless of status. An `error` field becomes
//! [`ClientError::Application`]; a body that is not JSON, or a connection
//! failure, becomes [`ClientError::Transport`]; a JSON body missing the
//! expected payload becomes [`ClientError::Rejected`].

use std::path::Path;
use std::time::Duration;

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::config::BackendConfig;
use crate::error::{ClientError, ClientResult};
use crate::models::{
    AskAnswer, AskRequest, ContentBody, DocumentRecord, FilesBody, GroupsBody, StatusBody,
    UploadOutcome,
};

/// A file picked for upload: its name and raw bytes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileUpload {
    pub name: String,
    pub bytes: Vec<u8>,
}

impl FileUpload {
    pub fn new(name: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            name: name.into(),
            bytes,
        }
    }

    /// Read a local file; the upload name is the path's final component.
    pub async fn from_path(path: &Path) -> std::io::Result<Self> {
        let bytes = tokio::fs::read(path).await?;
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());
        Ok(Self { name, bytes })
    }
}

/// Operations offered by the document service.
///
/// Each method issues exactly one request. Nothing retries.
#[async_trait]
pub trait Backend: Send + Sync {
    async fn list_files(&self) -> ClientResult<Vec<DocumentRecord>>;

    /// Group names in backend order, without the "all" sentinel.
    async fn list_groups(&self) -> ClientResult<Vec<String>>;

    async fn upload(&self, file: FileUpload) -> ClientResult<UploadOutcome>;

    async fn ask(&self, request: &AskRequest) -> ClientResult<AskAnswer>;

    async fn delete(&self, filename: &str) -> ClientResult<()>;

    async fn rename(&self, old_name: &str, new_name: &str) -> ClientResult<()>;

    async fn set_group(&self, filename: &str, group: &str) -> ClientResult<()>;

    /// Extracted text of a stored document.
    async fn fetch_content(&self, filename: &str) -> ClientResult<String>;

    async fn test_key(&self, key: &str) -> ClientResult<()>;

    async fn save_key(&self, key: &str) -> ClientResult<()>;
}

/// [`Backend`] over HTTP.
pub struct HttpBackend {
    client: reqwest::Client,
    base_url: String,
}

impl HttpBackend {
    /// Build a client for `config.base_url`.
    ///
    /// No timeout is applied unless `request_timeout_secs` is set; a hung
    /// request then waits indefinitely.
    pub fn new(config: &BackendConfig) -> anyhow::Result<Self> {
        let mut builder = reqwest::Client::builder();
        if let Some(secs) = config.request_timeout_secs {
            builder = builder.timeout(Duration::from_secs(secs));
        }
        Ok(Self {
            client: builder.build()?,
            base_url: config.base_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    async fn send<T: DeserializeOwned>(&self, request: reqwest::RequestBuilder) -> ClientResult<T> {
        let response = request.send().await?;
        decode(response).await
    }

    async fn send_status(&self, request: reqwest::RequestBuilder) -> ClientResult<()> {
        let body: StatusBody = self.send(request).await?;
        if body.success {
            Ok(())
        } else {
            Err(ClientError::Rejected)
        }
    }
}

async fn decode<T: DeserializeOwned>(response: reqwest::Response) -> ClientResult<T> {
    let status = response.status();
    let value: Value = response
        .json()
        .await
        .map_err(|e| ClientError::Transport(format!("HTTP {}: {}", status, e)))?;

    if let Some(err) = value.get("error").filter(|v| !v.is_null()) {
        let message = match err {
            Value::String(s) => s.clone(),
            other => other.to_string(),
        };
        tracing::debug!(%status, %message, "backend reported an error");
        return Err(ClientError::Application(message));
    }

    serde_json::from_value(value).map_err(|e| {
        tracing::debug!(%status, error = %e, "unexpected response shape");
        ClientError::Rejected
    })
}

#[async_trait]
impl Backend for HttpBackend {
    async fn list_files(&self) -> ClientResult<Vec<DocumentRecord>> {
        tracing::debug!("GET /files/");
        let body: FilesBody = self.send(self.client.get(self.url("/files/"))).await?;
        Ok(body.files)
    }

    async fn list_groups(&self) -> ClientResult<Vec<String>> {
        tracing::debug!("GET /groups/");
        let body: GroupsBody = self.send(self.client.get(self.url("/groups/"))).await?;
        Ok(body.groups.into_iter().map(|(name, _)| name).collect())
    }

    async fn upload(&self, file: FileUpload) -> ClientResult<UploadOutcome> {
        tracing::debug!(name = %file.name, bytes = file.bytes.len(), "POST /upload/");
        let part = reqwest::multipart::Part::bytes(file.bytes).file_name(file.name);
        let form = reqwest::multipart::Form::new().part("file", part);
        self.send(self.client.post(self.url("/upload/")).multipart(form))
            .await
    }

    async fn ask(&self, request: &AskRequest) -> ClientResult<AskAnswer> {
        tracing::debug!(group = ?request.group, "POST /ask/");
        let answer: AskAnswer = self
            .send(self.client.post(self.url("/ask/")).json(request))
            .await?;
        if answer.answer.is_empty() {
            return Err(ClientError::Rejected);
        }
        Ok(answer)
    }

    async fn delete(&self, filename: &str) -> ClientResult<()> {
        tracing::debug!(%filename, "POST /delete/");
        self.send_status(
            self.client
                .post(self.url("/delete/"))
                .query(&[("filename", filename)]),
        )
        .await
    }

    async fn rename(&self, old_name: &str, new_name: &str) -> ClientResult<()> {
        tracing::debug!(%old_name, %new_name, "POST /rename/");
        self.send_status(
            self.client
                .post(self.url("/rename/"))
                .query(&[("old_name", old_name), ("new_name", new_name)]),
        )
        .await
    }

    async fn set_group(&self, filename: &str, group: &str) -> ClientResult<()> {
        tracing::debug!(%filename, %group, "POST /group/");
        self.send_status(
            self.client
                .post(self.url("/group/"))
                .query(&[("filename", filename), ("group", group)]),
        )
        .await
    }

    async fn fetch_content(&self, filename: &str) -> ClientResult<String> {
        tracing::debug!(%filename, "GET /content/");
        let body: ContentBody = self
            .send(
                self.client
                    .get(self.url("/content/"))
                    .query(&[("filename", filename)]),
            )
            .await?;
        Ok(body.text)
    }

    async fn test_key(&self, key: &str) -> ClientResult<()> {
        tracing::debug!("POST /test_deepseek_key/");
        self.send_status(
            self.client
                .post(self.url("/test_deepseek_key/"))
                .form(&[("key", key)]),
        )
        .await
    }

    async fn save_key(&self, key: &str) -> ClientResult<()> {
        tracing::debug!("POST /set_deepseek_key/");
        self.send_status(
            self.client
                .post(self.url("/set_deepseek_key/"))
                .form(&[("key", key)]),
        )
        .await
    }
}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_url_joins_without_double_slash() {
        let backend = HttpBackend::new(&BackendConfig {
            base_url: "http://localhost:8004/".to_string(),
            request_timeout_secs: None,
        })
        .unwrap();
        assert_eq!(backend.base_url(), "http://localhost:8004");
        assert_eq!(backend.url("/files/"), "http://localhost:8004/files/");
    }

    #[tokio::test]
    async fn test_file_upload_from_path_uses_file_name() {
        let tmp = tempfile::TempDir::new().unwrap();
        let path = tmp.path().join("report.pdf");
        std::fs::write(&path, b"%PDF-1.4").unwrap();
        let upload = FileUpload::from_path(&path).await.unwrap();
        assert_eq!(upload.name, "report.pdf");
        assert_eq!(upload.bytes, b"%PDF-1.4");
    }

    #[tokio::test]
    async fn test_unreachable_backend_is_transport_error() {
        // Port 9 (discard) on localhost is expected to refuse connections.
        let backend = HttpBackend::new(&BackendConfig {
            base_url: "http://127.0.0.1:9".to_string(),
            request_timeout_secs: Some(5),
        })
        .unwrap();
        let err = backend.list_files().await.unwrap_err();
        assert!(err.is_transport());
    }
}
