use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use reqwest::{Client, Response};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::path::Path;
use std::time::Duration;
use tracing::debug;

use super::types::{FilterBody, NavigateBody};
use super::{
    AcceptRequest, ApplyResponse, BackendError, DiffResponse, KindFilter, NavDirection,
    RenderResponse, ReviewBackend, StatsResponse,
};

const REQUEST_TIMEOUT: Duration = Duration::from_secs(120);

/// `ReviewBackend` over HTTP.
pub struct HttpBackend {
    client: Client,
    base_url: String,
}

impl HttpBackend {
    pub fn new(base_url: &str) -> Result<Self, BackendError> {
        let client = Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|source| BackendError::Transport {
                endpoint: "client",
                source,
            })?;
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, endpoint: &str) -> String {
        format!("{}{}", self.base_url, endpoint)
    }

    async fn post_json<B: Serialize + ?Sized>(
        &self,
        endpoint: &'static str,
        body: &B,
    ) -> Result<Response, BackendError> {
        debug!(endpoint, "POST");
        let resp = self
            .client
            .post(self.url(endpoint))
            .json(body)
            .send()
            .await
            .map_err(|source| BackendError::Transport { endpoint, source })?;
        check_status(endpoint, resp).await
    }

    async fn post_empty(&self, endpoint: &'static str) -> Result<Response, BackendError> {
        debug!(endpoint, "POST");
        let resp = self
            .client
            .post(self.url(endpoint))
            .send()
            .await
            .map_err(|source| BackendError::Transport { endpoint, source })?;
        check_status(endpoint, resp).await
    }

    async fn get(
        &self,
        endpoint: &'static str,
        query: &[(&str, &str)],
    ) -> Result<Response, BackendError> {
        debug!(endpoint, ?query, "GET");
        let resp = self
            .client
            .get(self.url(endpoint))
            .query(query)
            .send()
            .await
            .map_err(|source| BackendError::Transport { endpoint, source })?;
        check_status(endpoint, resp).await
    }
}

async fn check_status(endpoint: &'static str, resp: Response) -> Result<Response, BackendError> {
    let status = resp.status();
    if status.is_success() {
        return Ok(resp);
    }
    let body = resp.text().await.unwrap_or_default();
    Err(BackendError::Status {
        endpoint,
        status: status.as_u16(),
        body,
    })
}

async fn decode<T: DeserializeOwned>(endpoint: &'static str, resp: Response) -> Result<T, BackendError> {
    resp.json::<T>()
        .await
        .map_err(|source| BackendError::Decode { endpoint, source })
}

async fn file_part(path: &Path) -> Result<Part, BackendError> {
    let bytes = tokio::fs::read(path)
        .await
        .map_err(|source| BackendError::ReadFile {
            path: path.to_path_buf(),
            source,
        })?;
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_else(|| "document.xml".to_string());
    Ok(Part::bytes(bytes).file_name(name))
}

#[async_trait]
impl ReviewBackend for HttpBackend {
    async fn render(&self, kind: KindFilter) -> Result<RenderResponse, BackendError> {
        let resp = self.get("/render", &[("type", kind.as_param())]).await?;
        decode("/render", resp).await
    }

    async fn diff(
        &self,
        original: &Path,
        modified: &Path,
        only: KindFilter,
    ) -> Result<DiffResponse, BackendError> {
        let form = Form::new()
            .part("original", file_part(original).await?)
            .part("modified", file_part(modified).await?)
            .text("only", only.as_param());

        debug!(endpoint = "/diff", %only, "POST multipart");
        let resp = self
            .client
            .post(self.url("/diff"))
            .multipart(form)
            .send()
            .await
            .map_err(|source| BackendError::Transport {
                endpoint: "/diff",
                source,
            })?;
        let resp = check_status("/diff", resp).await?;
        decode("/diff", resp).await
    }

    async fn set_filter(&self, only: KindFilter) -> Result<(), BackendError> {
        self.post_json("/set_filter", &FilterBody { only }).await?;
        Ok(())
    }

    async fn navigate(&self, dir: NavDirection) -> Result<(), BackendError> {
        self.post_json("/navigate", &NavigateBody { dir }).await?;
        Ok(())
    }

    async fn accept(&self, body: &AcceptRequest) -> Result<(), BackendError> {
        self.post_json("/accept", body).await?;
        Ok(())
    }

    async fn reject(&self) -> Result<(), BackendError> {
        self.post_json("/reject", &serde_json::json!({})).await?;
        Ok(())
    }

    async fn apply(&self) -> Result<ApplyResponse, BackendError> {
        let resp = self.post_json("/apply", &serde_json::json!({})).await?;
        decode("/apply", resp).await
    }

    async fn recompute(&self) -> Result<(), BackendError> {
        self.post_empty("/recompute").await?;
        Ok(())
    }

    async fn stats(&self) -> Result<StatsResponse, BackendError> {
        let resp = self.get("/stats", &[]).await?;
        decode("/stats", resp).await
    }

    fn resolve_url(&self, reference: &str) -> String {
        if reference.starts_with("http://") || reference.starts_with("https://") {
            reference.to_string()
        } else if reference.starts_with('/') {
            self.url(reference)
        } else {
            format!("{}/{}", self.base_url, reference)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_base_url_trailing_slash_trimmed() {
        let backend = HttpBackend::new("http://127.0.0.1:5000/").unwrap();
        assert_eq!(backend.base_url(), "http://127.0.0.1:5000");
        assert_eq!(backend.url("/render"), "http://127.0.0.1:5000/render");
    }

    #[test]
    fn test_resolve_download_reference() {
        let backend = HttpBackend::new("http://localhost:5000").unwrap();
        assert_eq!(
            backend.resolve_url("/download/left"),
            "http://localhost:5000/download/left"
        );
        assert_eq!(
            backend.resolve_url("download/right"),
            "http://localhost:5000/download/right"
        );
        assert_eq!(
            backend.resolve_url("https://files.example/out.xml"),
            "https://files.example/out.xml"
        );
    }

    #[tokio::test]
    async fn test_file_part_reports_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("nope.xml");
        let err = file_part(&missing).await.unwrap_err();
        assert!(matches!(err, BackendError::ReadFile { .. }));
    }
}
