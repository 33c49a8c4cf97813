use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::fmt;

/// Semantic category of a detected difference.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IssueKind {
    Duplicate,
    Gibberish,
    Footnote,
}

impl IssueKind {
    pub const ALL: [IssueKind; 3] = [IssueKind::Duplicate, IssueKind::Gibberish, IssueKind::Footnote];

    pub fn as_str(&self) -> &'static str {
        match self {
            IssueKind::Duplicate => "duplicate",
            IssueKind::Gibberish => "gibberish",
            IssueKind::Footnote => "footnote",
        }
    }

    /// Kind sent on accept. Footnote issues travel as attribute conflicts.
    pub fn accept_kind(&self) -> AcceptKind {
        match self {
            IssueKind::Duplicate => AcceptKind::Duplicate,
            IssueKind::Gibberish => AcceptKind::Gibberish,
            IssueKind::Footnote => AcceptKind::Attr,
        }
    }
}

impl fmt::Display for IssueKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Value of the kind selector: a single kind or every kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum KindFilter {
    All,
    Only(IssueKind),
}

impl KindFilter {
    pub fn as_param(&self) -> &'static str {
        match self {
            KindFilter::All => "all",
            KindFilter::Only(kind) => kind.as_str(),
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "all" => Some(KindFilter::All),
            "duplicate" => Some(KindFilter::Only(IssueKind::Duplicate)),
            "gibberish" => Some(KindFilter::Only(IssueKind::Gibberish)),
            "footnote" => Some(KindFilter::Only(IssueKind::Footnote)),
            _ => None,
        }
    }

    /// Label used in user-facing messages ("No footnote attrs issues found.").
    pub fn pretty(kind: Option<KindFilter>) -> &'static str {
        match kind {
            Some(KindFilter::Only(IssueKind::Footnote)) => "footnote attrs",
            Some(KindFilter::Only(IssueKind::Duplicate)) => "duplicate",
            Some(KindFilter::Only(IssueKind::Gibberish)) => "gibberish",
            Some(KindFilter::All) | None => "any",
        }
    }
}

impl fmt::Display for KindFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_param())
    }
}

/// Structural shape of an issue's payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RenderKind {
    #[default]
    Text,
    Attr,
}

/// Kind field of the accept request body.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum AcceptKind {
    Duplicate,
    Gibberish,
    Attr,
}

/// Direction in which an accepted change is copied.
///
/// The modified (right) document is authoritative, so right-to-left is the
/// only direction the client ever sends.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MergeDirection {
    #[default]
    RightToLeft,
}

impl MergeDirection {
    pub fn label(&self) -> &'static str {
        match self {
            MergeDirection::RightToLeft => "Right → Left",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum NavDirection {
    Next,
    Prev,
    /// Used after a reject so that "last + 1" wraps to the first issue.
    NextWrap,
}

/// Which side of a duplicate carries the surplus content.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DupSide {
    Left,
    Right,
    None,
}

/// `GET /render` response.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct RenderResponse {
    pub count: usize,
    pub pos: usize,
    pub left: Option<String>,
    pub right: Option<String>,
    pub steps: Option<Value>,
    pub steps_right: Option<Value>,
    pub kind: Option<RenderKind>,
    pub issue_kind: Option<IssueKind>,
    pub attr: Option<Value>,
    pub dup_side: Option<DupSide>,
}

/// `POST /diff` response.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct DiffResponse {
    pub count: usize,
    #[serde(rename = "byKind")]
    pub by_kind: BTreeMap<String, usize>,
}

/// `GET /stats` response.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct StatsResponse {
    pub total: usize,
    #[serde(rename = "byKind")]
    pub by_kind: BTreeMap<String, usize>,
}

impl StatsResponse {
    pub fn count_of(&self, kind: IssueKind) -> usize {
        self.by_kind.get(kind.as_str()).copied().unwrap_or(0)
    }
}

/// `POST /apply` response.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ApplyResponse {
    pub applied_left: usize,
    pub applied_right: usize,
    pub note: Option<String>,
    pub download_left: Option<String>,
    pub download_right: Option<String>,
}

pub const NOTE_ALREADY_APPLIED_ONLY: &str = "already_applied_only";

impl ApplyResponse {
    /// Download references that are present and non-empty, left first.
    pub fn downloads(&self) -> impl Iterator<Item = &str> {
        [self.download_left.as_deref(), self.download_right.as_deref()]
            .into_iter()
            .flatten()
            .filter(|r| !r.is_empty())
    }

    pub fn nothing_new(&self) -> bool {
        self.applied_left == 0
            && self.applied_right == 0
            && self.note.as_deref() == Some(NOTE_ALREADY_APPLIED_ONLY)
    }
}

/// `POST /accept` request body. Steps are forwarded verbatim.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AcceptRequest {
    pub steps: Value,
    pub steps_right: Option<Value>,
    pub kind: AcceptKind,
    pub attr: Option<Value>,
    pub direction: MergeDirection,
}

#[derive(Debug, Serialize)]
pub(crate) struct FilterBody {
    pub only: KindFilter,
}

#[derive(Debug, Serialize)]
pub(crate) struct NavigateBody {
    pub dir: NavDirection,
}

impl Serialize for KindFilter {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_param())
    }
}
