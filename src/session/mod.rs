mod ops;


use serde_json::Value;
use smallvec::SmallVec;
use std::fmt;
use std::path::PathBuf;
use tracing::debug;

pub use ops::{execute, OpRequest, Outcome, ViewUpdate};

use crate::backend::{
    AcceptRequest, DupSide, IssueKind, KindFilter, MergeDirection, NavDirection, RenderKind,
    RenderResponse, StatsResponse,
};
use crate::pane::Side;

/// Kind rendered when the selector is empty.
pub const DEFAULT_RENDER_KIND: KindFilter = KindFilter::Only(IssueKind::Gibberish);

/// The "pos/count" label.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PositionIndicator {
    /// Files changed since the last comparison.
    Unknown,
    At { pos: usize, count: usize },
}

impl fmt::Display for PositionIndicator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PositionIndicator::Unknown => f.write_str("—/—"),
            PositionIndicator::At { pos, count } => write!(f, "{}/{}", pos, count),
        }
    }
}

/// Result of asking the session to start an operation.
#[derive(Debug)]
pub enum Prepared {
    Skip,
    /// Resolved without contacting the server.
    Done(Applied),
    /// Run `request` and pass its outcome back with `seq`.
    Run { seq: u64, request: OpRequest },
}

/// What the App has to do after an outcome was applied.
#[derive(Debug, Default)]
pub struct Applied {
    /// False when a newer operation or a file selection made the outcome stale.
    pub fresh: bool,
    pub view: Option<ViewUpdate>,
    pub alerts: Vec<String>,
    pub downloads: SmallVec<[String; 2]>,
}

/// Review state for the active issue and the selected files.
#[derive(Debug)]
pub struct ReviewSession {
    position: usize,
    count: usize,
    indicator: PositionIndicator,
    issue_kind: IssueKind,
    render_kind: RenderKind,
    merge_direction: MergeDirection,
    steps: Option<Value>,
    steps_right: Option<Value>,
    attr: Option<Value>,
    dup_side: Option<DupSide>,
    has_diff: bool,
    selected_kind: Option<KindFilter>,
    original: Option<PathBuf>,
    modified: Option<PathBuf>,
    stats: Option<StatsResponse>,
    next_seq: u64,
    applied_seq: u64,
    invalidated_before: u64,
}

impl Default for ReviewSession {
    fn default() -> Self {
        Self::new()
    }
}

impl ReviewSession {
    pub fn new() -> Self {
        Self {
            position: 0,
            count: 0,
            indicator: PositionIndicator::At { pos: 0, count: 0 },
            issue_kind: IssueKind::Gibberish,
            render_kind: RenderKind::Text,
            merge_direction: MergeDirection::RightToLeft,
            steps: None,
            steps_right: None,
            attr: None,
            dup_side: None,
            has_diff: false,
            selected_kind: None,
            original: None,
            modified: None,
            stats: None,
            next_seq: 1,
            applied_seq: 0,
            invalidated_before: 0,
        }
    }

    pub fn position(&self) -> usize {
        self.position
    }

    pub fn count(&self) -> usize {
        self.count
    }

    pub fn indicator(&self) -> PositionIndicator {
        self.indicator
    }

    pub fn issue_kind(&self) -> IssueKind {
        self.issue_kind
    }

    pub fn render_kind(&self) -> RenderKind {
        self.render_kind
    }

    pub fn merge_direction(&self) -> MergeDirection {
        self.merge_direction
    }

    pub fn steps(&self) -> Option<&Value> {
        self.steps.as_ref()
    }

    pub fn dup_side(&self) -> Option<DupSide> {
        self.dup_side
    }

    pub fn has_diff(&self) -> bool {
        self.has_diff
    }

    pub fn selected_kind(&self) -> Option<KindFilter> {
        self.selected_kind
    }

    pub fn file(&self, side: Side) -> Option<&PathBuf> {
        match side {
            Side::Left => self.original.as_ref(),
            Side::Right => self.modified.as_ref(),
        }
    }

    pub fn stats(&self) -> Option<&StatsResponse> {
        self.stats.as_ref()
    }

    fn render_filter(&self) -> KindFilter {
        self.selected_kind.unwrap_or(DEFAULT_RENDER_KIND)
    }

    fn stamp(&mut self) -> u64 {
        let seq = self.next_seq;
        self.next_seq += 1;
        seq
    }

    fn run(&mut self, request: OpRequest) -> Prepared {
        let seq = self.stamp();
        debug!(seq, op = request.name(), "operation prepared");
        Prepared::Run { seq, request }
    }

    /// Every operation requested so far becomes stale.
    fn invalidate(&mut self) {
        self.invalidated_before = self.next_seq;
    }

    /// Panes empty, position `0/0`, no steps, default kinds.
    pub fn reset(&mut self) {
        self.position = 0;
        self.count = 0;
        self.indicator = PositionIndicator::At { pos: 0, count: 0 };
        self.steps = None;
        self.steps_right = None;
        self.attr = None;
        self.dup_side = None;
        self.render_kind = RenderKind::Text;
        self.issue_kind = IssueKind::Gibberish;
        self.merge_direction = MergeDirection::RightToLeft;
    }

    /// A local file was chosen for one side.
    pub fn select_file(&mut self, side: Side, path: PathBuf) {
        match side {
            Side::Left => self.original = Some(path),
            Side::Right => self.modified = Some(path),
        }
        self.has_diff = false;
        self.indicator = PositionIndicator::Unknown;
        self.invalidate();
    }

    pub fn load_current(&mut self) -> Prepared {
        let render = self.render_filter();
        self.run(OpRequest::Load { render })
    }

    pub fn run_diff(&mut self, kind: Option<KindFilter>) -> Prepared {
        let (Some(original), Some(modified)) = (self.original.clone(), self.modified.clone())
        else {
            return Prepared::Done(Applied {
                fresh: true,
                alerts: vec!["Please choose both files first.".to_string()],
                ..Default::default()
            });
        };
        let render = kind.unwrap_or(KindFilter::All);
        self.run(OpRequest::Diff {
            original,
            modified,
            kind,
            render,
        })
    }

    pub fn on_kind_change(&mut self, kind: Option<KindFilter>) -> Prepared {
        self.selected_kind = kind;
        let Some(only) = kind else {
            self.invalidate();
            self.reset();
            return Prepared::Done(Applied {
                fresh: true,
                view: Some(ViewUpdate::Cleared),
                ..Default::default()
            });
        };
        if !self.has_diff {
            return self.run_diff(Some(only));
        }
        self.run(OpRequest::SetFilter { only, render: only })
    }

    pub fn navigate(&mut self, dir: NavDirection) -> Prepared {
        let render = self.render_filter();
        self.run(OpRequest::Navigate { dir, render })
    }

    /// Nothing is sent while no issue is loaded.
    pub fn accept(&mut self) -> Prepared {
        let Some(steps) = self.steps.clone() else {
            return Prepared::Skip;
        };
        let body = AcceptRequest {
            steps,
            steps_right: self.steps_right.clone(),
            kind: self.issue_kind.accept_kind(),
            attr: self.attr.clone(),
            direction: self.merge_direction,
        };
        let render = self.render_filter();
        self.run(OpRequest::Accept { body, render })
    }

    pub fn reject(&mut self) -> Prepared {
        let render = self.render_filter();
        self.run(OpRequest::Reject { render })
    }

    pub fn apply(&mut self) -> Prepared {
        let render = self.render_filter();
        self.run(OpRequest::Apply { render })
    }

    fn is_fresh(&self, seq: u64) -> bool {
        seq > self.applied_seq && seq >= self.invalidated_before
    }

    /// Fold a finished operation into the session.
    ///
    /// Stale outcomes still report their alerts and downloads, but leave the
    /// panes alone. A comparison that finished for the current files still
    /// counts even when a newer operation was applied first.
    pub fn apply_outcome(&mut self, seq: u64, outcome: Outcome) -> Applied {
        let Outcome {
            alerts,
            downloads,
            diff,
            view,
            stats,
        } = outcome;

        if !self.is_fresh(seq) {
            if diff.is_some() && seq >= self.invalidated_before {
                self.has_diff = true;
            }
            debug!(
                seq,
                applied = self.applied_seq,
                invalidated_before = self.invalidated_before,
                "stale outcome discarded"
            );
            return Applied {
                fresh: false,
                view: None,
                alerts,
                downloads,
            };
        }
        self.applied_seq = seq;

        if let Some(stats) = stats {
            self.stats = Some(stats);
        }
        if let Some(done) = diff {
            self.has_diff = true;
            if let Some(kind) = done.pinned {
                self.selected_kind = Some(kind);
            }
        }
        match &view {
            Some(ViewUpdate::Cleared) => self.reset(),
            Some(ViewUpdate::Issue(data)) => self.show_issue(data),
            None => {}
        }

        Applied {
            fresh: true,
            view,
            alerts,
            downloads,
        }
    }

    fn show_issue(&mut self, data: &RenderResponse) {
        self.position = data.pos;
        self.count = data.count;
        self.indicator = PositionIndicator::At {
            pos: data.pos,
            count: data.count,
        };
        self.steps = data.steps.clone();
        self.steps_right = data.steps_right.clone();
        self.render_kind = data.kind.unwrap_or_default();
        self.issue_kind = data.issue_kind.unwrap_or(IssueKind::Gibberish);
        self.attr = data.attr.clone();
        self.dup_side = data.dup_side;
        self.merge_direction = MergeDirection::RightToLeft;
    }
}
