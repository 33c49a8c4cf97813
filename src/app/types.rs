use ratatui::layout::Rect;
use std::path::PathBuf;

use crate::pane::Side;

/// フォーカス対象（Tab で循環）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Focus {
    #[default]
    LeftPane,
    Divider,
    RightPane,
}

impl Focus {
    pub fn next(self) -> Self {
        match self {
            Focus::LeftPane => Focus::Divider,
            Focus::Divider => Focus::RightPane,
            Focus::RightPane => Focus::LeftPane,
        }
    }

    pub fn prev(self) -> Self {
        match self {
            Focus::LeftPane => Focus::RightPane,
            Focus::Divider => Focus::LeftPane,
            Focus::RightPane => Focus::Divider,
        }
    }

    pub fn pane(self) -> Option<Side> {
        match self {
            Focus::LeftPane => Some(Side::Left),
            Focus::RightPane => Some(Side::Right),
            Focus::Divider => None,
        }
    }
}

/// ファイルパス入力中の状態
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathPrompt {
    pub side: Side,
    pub input: String,
}

impl PathPrompt {
    pub fn new(side: Side, current: Option<&PathBuf>) -> Self {
        Self {
            side,
            input: current
                .map(|p| p.display().to_string())
                .unwrap_or_default(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusKind {
    Info,
    Alert,
}

/// ステータス行のメッセージ（次の操作まで表示）
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusMessage {
    pub text: String,
    pub kind: StatusKind,
}

/// Areas from the last render pass, used to route mouse events.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ScreenLayout {
    /// Row holding both panes and the divider.
    pub panes: Rect,
    pub left: Rect,
    pub divider: Rect,
    pub right: Rect,
}

impl ScreenLayout {
    pub fn pane_at(&self, column: u16, row: u16) -> Option<Side> {
        if contains(self.left, column, row) {
            Some(Side::Left)
        } else if contains(self.right, column, row) {
            Some(Side::Right)
        } else {
            None
        }
    }

    pub fn on_divider(&self, column: u16, row: u16) -> bool {
        contains(self.divider, column, row)
    }
}

fn contains(area: Rect, column: u16, row: u16) -> bool {
    column >= area.x
        && column < area.x.saturating_add(area.width)
        && row >= area.y
        && row < area.y.saturating_add(area.height)
}
