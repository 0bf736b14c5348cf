// # -----------------------------
// # crates/api/src/lib.rs
// # -----------------------------
// HTTP client for the assistant backend. Transport failures and
// error-carrying response bodies map onto the two surfaced failure
// classes; validation skips never reach this layer.

use async_trait::async_trait;
use codepal_common::{
    ChatRequest, ChatResponse, ConfirmRequest, ConfirmResponse, DriveEntry, FileEntry, FileListing,
    FileReadResponse, FileWriteRequest, FileWriteResponse, McpTool,
};
use reqwest::Client;

#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// The request could not complete (connect, timeout, malformed body).
    #[error("connection failed: {0}")]
    Network(#[from] reqwest::Error),
    /// The backend answered with an error field.
    #[error("{0}")]
    Server(String),
}

pub type ApiResult<T> = Result<T, ApiError>;

/// Everything the controllers need from the backend. Object-safe so tests
/// can substitute a fake.
#[async_trait]
pub trait BackendApi: Send + Sync {
    async fn chat(&self, req: ChatRequest) -> ApiResult<ChatResponse>;
    async fn confirm(&self, req: ConfirmRequest) -> ApiResult<ConfirmResponse>;
    async fn read_file(&self, path: &str) -> ApiResult<FileContent>;
    async fn write_file(&self, path: &str, content: &str) -> ApiResult<()>;
    async fn list_files(&self, path: Option<&str>) -> ApiResult<DirListing>;
    async fn list_drives(&self) -> ApiResult<Vec<DriveEntry>>;
    async fn mcp_tools(&self) -> ApiResult<Vec<McpTool>>;
}

/// A successfully read file; the wire shape's error arm is folded into
/// `ApiError::Server` before callers see it.
#[derive(Debug, Clone)]
pub struct FileContent {
    pub content: String,
    pub filename: String,
}

#[derive(Debug, Clone, Default)]
pub struct DirListing {
    pub current_path: String,
    pub parent_path: Option<String>,
    pub items: Vec<FileEntry>,
}

pub struct HttpApi {
    base_url: String,
    http: Client,
}

impl HttpApi {
    pub fn new(base_url: impl Into<String>) -> Self {
        let mut base_url = base_url.into();
        while base_url.ends_with('/') {
            base_url.pop();
        }
        Self {
            base_url,
            http: Client::new(),
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }
}

#[async_trait]
impl BackendApi for HttpApi {
    async fn chat(&self, req: ChatRequest) -> ApiResult<ChatResponse> {
        tracing::debug!("POST /api/chat ({} chars)", req.message.len());
        let resp: ChatResponse = self
            .http
            .post(self.url("/api/chat"))
            .json(&req)
            .send()
            .await?
            .json()
            .await?;
        Ok(resp)
    }

    async fn confirm(&self, req: ConfirmRequest) -> ApiResult<ConfirmResponse> {
        tracing::debug!("POST /api/confirm action={:?}", req.action);
        let resp: ConfirmResponse = self
            .http
            .post(self.url("/api/confirm"))
            .json(&req)
            .send()
            .await?
            .json()
            .await?;
        Ok(resp)
    }

    async fn read_file(&self, path: &str) -> ApiResult<FileContent> {
        let resp: FileReadResponse = self
            .http
            .get(self.url("/api/file/read"))
            .query(&[("path", path)])
            .send()
            .await?
            .json()
            .await?;
        if let Some(err) = resp.error {
            return Err(ApiError::Server(err));
        }
        Ok(FileContent {
            content: resp.content.unwrap_or_default(),
            filename: resp
                .filename
                .unwrap_or_else(|| path.rsplit(['/', '\\']).next().unwrap_or(path).to_string()),
        })
    }

    async fn write_file(&self, path: &str, content: &str) -> ApiResult<()> {
        let req = FileWriteRequest {
            path: path.to_string(),
            content: content.to_string(),
        };
        let resp: FileWriteResponse = self
            .http
            .post(self.url("/api/file/write"))
            .json(&req)
            .send()
            .await?
            .json()
            .await?;
        match resp.error {
            Some(err) => Err(ApiError::Server(err)),
            None => Ok(()),
        }
    }

    async fn list_files(&self, path: Option<&str>) -> ApiResult<DirListing> {
        let mut builder = self.http.get(self.url("/api/files"));
        if let Some(p) = path {
            builder = builder.query(&[("path", p)]);
        }
        let resp: FileListing = builder.send().await?.json().await?;
        if let Some(err) = resp.error {
            return Err(ApiError::Server(err));
        }
        Ok(DirListing {
            current_path: resp.current_path,
            parent_path: resp.parent_path,
            items: resp.items,
        })
    }

    async fn list_drives(&self) -> ApiResult<Vec<DriveEntry>> {
        let resp: codepal_common::DrivesResponse = self
            .http
            .get(self.url("/api/drives"))
            .send()
            .await?
            .json()
            .await?;
        Ok(resp.drives)
    }

    async fn mcp_tools(&self) -> ApiResult<Vec<McpTool>> {
        let resp: codepal_common::McpToolsResponse = self
            .http
            .get(self.url("/api/mcp/tools"))
            .send()
            .await?
            .json()
            .await?;
        Ok(resp.tools)
    }
}
