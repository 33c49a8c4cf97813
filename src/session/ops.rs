use smallvec::SmallVec;
use std::path::PathBuf;
use tracing::{debug, info, warn};

use crate::backend::{
    AcceptRequest, BackendError, KindFilter, NavDirection, RenderResponse, ReviewBackend,
    StatsResponse,
};

/// Snapshot of everything an operation needs, taken when it was requested.
#[derive(Debug, Clone, PartialEq)]
pub enum OpRequest {
    Load {
        render: KindFilter,
    },
    Diff {
        original: PathBuf,
        modified: PathBuf,
        kind: Option<KindFilter>,
        render: KindFilter,
    },
    SetFilter {
        only: KindFilter,
        render: KindFilter,
    },
    Navigate {
        dir: NavDirection,
        render: KindFilter,
    },
    Accept {
        body: AcceptRequest,
        render: KindFilter,
    },
    Reject {
        render: KindFilter,
    },
    Apply {
        render: KindFilter,
    },
}

impl OpRequest {
    pub fn name(&self) -> &'static str {
        match self {
            OpRequest::Load { .. } => "load",
            OpRequest::Diff { .. } => "diff",
            OpRequest::SetFilter { .. } => "set_filter",
            OpRequest::Navigate { .. } => "navigate",
            OpRequest::Accept { .. } => "accept",
            OpRequest::Reject { .. } => "reject",
            OpRequest::Apply { .. } => "apply",
        }
    }
}

/// What the panes should show after an operation.
#[derive(Debug, Clone)]
pub enum ViewUpdate {
    /// The "no issues" display state.
    Cleared,
    Issue(Box<RenderResponse>),
}

/// A comparison finished against the selected files.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DiffCompleted {
    /// Kind the selector gets pinned to.
    pub pinned: Option<KindFilter>,
}

/// Effects of one operation, applied by the session when it is not stale.
#[derive(Debug, Default)]
pub struct Outcome {
    pub alerts: Vec<String>,
    /// Resolved download URLs to hand to the system opener.
    pub downloads: SmallVec<[String; 2]>,
    pub diff: Option<DiffCompleted>,
    pub view: Option<ViewUpdate>,
    pub stats: Option<StatsResponse>,
}

/// Run a prepared operation to completion. Backend calls are awaited in order.
pub async fn execute(backend: &dyn ReviewBackend, request: OpRequest) -> Outcome {
    debug!(op = request.name(), "operation started");
    let mut out = Outcome::default();

    match request {
        OpRequest::Load { render } => load_current(backend, render, &mut out).await,
        OpRequest::Diff {
            original,
            modified,
            kind,
            render,
        } => {
            let only = kind.unwrap_or(KindFilter::All);
            let info = match backend.diff(&original, &modified, only).await {
                Ok(info) => info,
                Err(e) => {
                    warn!(error = %e, "compare failed");
                    out.alerts
                        .push(format!("Compare failed: {}", e.user_message()));
                    return out;
                }
            };
            debug!(count = info.count, by_kind = ?info.by_kind, "compare finished");

            refresh_stats(backend, &mut out).await;
            if info.count == 0 {
                out.alerts
                    .push(format!("No {} issues found.", KindFilter::pretty(kind)));
                out.diff = Some(DiffCompleted { pinned: None });
                out.view = Some(ViewUpdate::Cleared);
                return out;
            }
            out.diff = Some(DiffCompleted {
                pinned: Some(kind.unwrap_or(KindFilter::All)),
            });
            load_current(backend, render, &mut out).await;
        }
        OpRequest::SetFilter { only, render } => {
            if tolerate(backend.set_filter(only).await, "Filter", &mut out) {
                load_current(backend, render, &mut out).await;
            }
        }
        OpRequest::Navigate { dir, render } => {
            if tolerate(backend.navigate(dir).await, "Navigate", &mut out) {
                load_current(backend, render, &mut out).await;
            }
        }
        OpRequest::Accept { body, render } => {
            if tolerate(backend.accept(&body).await, "Accept", &mut out) {
                recompute(backend, &mut out).await;
                load_current(backend, render, &mut out).await;
            }
        }
        OpRequest::Reject { render } => {
            if tolerate(backend.reject().await, "Reject", &mut out)
                && tolerate(
                    backend.navigate(NavDirection::NextWrap).await,
                    "Navigate",
                    &mut out,
                )
            {
                load_current(backend, render, &mut out).await;
            }
        }
        OpRequest::Apply { render } => {
            let data = match backend.apply().await {
                Ok(data) => data,
                Err(e) => {
                    warn!(error = %e, "apply failed");
                    out.alerts.push("Apply failed".to_string());
                    return out;
                }
            };
            let downloads: SmallVec<[String; 2]> =
                data.downloads().map(|r| backend.resolve_url(r)).collect();
            if downloads.is_empty() {
                out.alerts.push("No output produced.".to_string());
                return out;
            }
            if data.nothing_new() {
                info!("nothing new to apply, downloading current buffers");
            }
            out.downloads = downloads;
            recompute(backend, &mut out).await;
            load_current(backend, render, &mut out).await;
        }
    }

    out
}

async fn load_current(backend: &dyn ReviewBackend, render: KindFilter, out: &mut Outcome) {
    match backend.render(render).await {
        Ok(data) => {
            debug!(
                count = data.count,
                pos = data.pos,
                issue_kind = ?data.issue_kind,
                "render"
            );
            out.view = Some(if data.count == 0 {
                ViewUpdate::Cleared
            } else {
                ViewUpdate::Issue(Box::new(data))
            });
        }
        Err(e) => {
            warn!(error = %e, "render failed");
            out.alerts
                .push(format!("Render failed: {}", e.user_message()));
        }
    }
}

/// Best effort: failures are logged and swallowed.
async fn recompute(backend: &dyn ReviewBackend, out: &mut Outcome) {
    if let Err(e) = backend.recompute().await {
        warn!(error = %e, "recompute failed");
    }
    refresh_stats(backend, out).await;
}

async fn refresh_stats(backend: &dyn ReviewBackend, out: &mut Outcome) {
    match backend.stats().await {
        Ok(stats) => out.stats = Some(stats),
        Err(e) => warn!(error = %e, "stats unavailable"),
    }
}

/// Rejected requests are logged and the flow carries on; a request that never
/// got an answer stops it with an alert.
fn tolerate(result: Result<(), BackendError>, action: &str, out: &mut Outcome) -> bool {
    match result {
        Ok(()) => true,
        Err(e) if e.is_status() => {
            warn!(error = %e, "{} rejected by server", action);
            true
        }
        Err(e) => {
            out.alerts
                .push(format!("{} failed: {}", action, e.user_message()));
            false
        }
    }
}
