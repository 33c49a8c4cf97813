mod error;
mod http;
pub mod types;

use async_trait::async_trait;
use std::path::Path;

pub use error::BackendError;
pub use http::HttpBackend;
pub use types::{
    AcceptKind, AcceptRequest, ApplyResponse, DiffResponse, DupSide, IssueKind, KindFilter,
    MergeDirection, NavDirection, RenderKind, RenderResponse, StatsResponse,
};

/// Request/response contracts of the proofing server.
///
/// Position arithmetic, wraparound, diffing and merging are all owned by the
/// server; the client only forwards what the reviewer asked for.
#[async_trait]
pub trait ReviewBackend: Send + Sync {
    /// `GET /render?type=<kind>`
    async fn render(&self, kind: KindFilter) -> Result<RenderResponse, BackendError>;

    /// `POST /diff` (multipart upload of both documents)
    async fn diff(
        &self,
        original: &Path,
        modified: &Path,
        only: KindFilter,
    ) -> Result<DiffResponse, BackendError>;

    /// `POST /set_filter`: recompute the issue index over already-parsed trees.
    async fn set_filter(&self, only: KindFilter) -> Result<(), BackendError>;

    async fn navigate(&self, dir: NavDirection) -> Result<(), BackendError>;

    async fn accept(&self, body: &AcceptRequest) -> Result<(), BackendError>;

    async fn reject(&self) -> Result<(), BackendError>;

    async fn apply(&self) -> Result<ApplyResponse, BackendError>;

    async fn recompute(&self) -> Result<(), BackendError>;

    async fn stats(&self) -> Result<StatsResponse, BackendError>;

    /// Turn a server-relative download reference into an openable URL.
    fn resolve_url(&self, reference: &str) -> String;
}
