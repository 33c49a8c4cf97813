use anyhow::Result;
use crossterm::event::{
    self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers, MouseButton, MouseEvent,
    MouseEventKind,
};
use std::time::Duration;

use crate::backend::{IssueKind, KindFilter, NavDirection};
use crate::pane::Side;
use crate::splitter::SplitterKey;
use crate::ui::DIVIDER_WIDTH;

use super::types::*;
use super::App;

const IDLE_POLL: Duration = Duration::from_millis(100);
const WHEEL_ROWS: f64 = 3.0;

impl App {
    pub(crate) async fn handle_input(&mut self) -> Result<()> {
        // アニメーション中はフレーム間隔でポーリング
        let timeout = if self.is_animating() {
            self.config.ui.frame_interval()
        } else {
            IDLE_POLL
        };
        if event::poll(timeout)? {
            match event::read()? {
                Event::Key(key) => {
                    // Kitty keyboard protocol では Release/Repeat も届くため Press のみ処理
                    if key.kind == KeyEventKind::Press {
                        self.handle_key(key);
                    }
                }
                Event::Mouse(mouse) => self.handle_mouse(mouse),
                _ => {}
            }
        }
        Ok(())
    }

    pub(crate) fn handle_key(&mut self, key: KeyEvent) {
        if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c') {
            self.should_quit = true;
            return;
        }
        if self.prompt.is_some() {
            self.handle_prompt_input(key);
            return;
        }

        // ステータスは次の操作まで表示
        self.status = None;

        if self.focus == Focus::Divider {
            let step = match key.code {
                KeyCode::Left => Some(SplitterKey::Left),
                KeyCode::Right => Some(SplitterKey::Right),
                _ => None,
            };
            if let Some(step) = step {
                self.splitter.key(step);
                return;
            }
        }

        match key.code {
            KeyCode::Char('q') => self.should_quit = true,
            KeyCode::Tab => self.focus = self.focus.next(),
            KeyCode::BackTab => self.focus = self.focus.prev(),
            KeyCode::Esc => {}

            KeyCode::Char('o') => self.open_prompt(Side::Left),
            KeyCode::Char('m') => self.open_prompt(Side::Right),
            KeyCode::Char('d') => self.run_diff(),
            KeyCode::Char('1') => self.change_kind(Some(KindFilter::Only(IssueKind::Duplicate))),
            KeyCode::Char('2') => self.change_kind(Some(KindFilter::Only(IssueKind::Gibberish))),
            KeyCode::Char('3') => self.change_kind(Some(KindFilter::Only(IssueKind::Footnote))),
            KeyCode::Char('4') => self.change_kind(Some(KindFilter::All)),
            KeyCode::Char('0') => self.change_kind(None),

            KeyCode::Char('n') => {
                let prepared = self.session.navigate(NavDirection::Next);
                self.dispatch(prepared);
            }
            KeyCode::Char('p') => {
                let prepared = self.session.navigate(NavDirection::Prev);
                self.dispatch(prepared);
            }
            KeyCode::Char('a') => {
                let prepared = self.session.accept();
                self.dispatch(prepared);
            }
            KeyCode::Char('r') => {
                let prepared = self.session.reject();
                self.dispatch(prepared);
            }
            KeyCode::Char('A') => {
                let prepared = self.session.apply();
                self.dispatch(prepared);
            }
            KeyCode::Char('R') => {
                let prepared = self.session.load_current();
                self.dispatch(prepared);
            }
            KeyCode::Char('c') => self.recenter(),

            KeyCode::Char('j') | KeyCode::Down => self.scroll_focused(1.0),
            KeyCode::Char('k') | KeyCode::Up => self.scroll_focused(-1.0),
            KeyCode::PageDown => {
                let page = self.focused_page();
                self.scroll_focused(page);
            }
            KeyCode::PageUp => {
                let page = self.focused_page();
                self.scroll_focused(-page);
            }
            _ => {}
        }
    }

    fn focused_side(&self) -> Side {
        self.focus.pane().unwrap_or(Side::Left)
    }

    fn focused_page(&self) -> f64 {
        let area = match self.focused_side() {
            Side::Left => self.layout.left,
            Side::Right => self.layout.right,
        };
        // 枠線の分を除く
        f64::from(area.height.saturating_sub(2).max(1))
    }

    fn scroll_focused(&mut self, delta: f64) {
        let side = self.focused_side();
        self.panes[side.index()].scroll_by(delta);
    }

    pub(crate) fn handle_mouse(&mut self, mouse: MouseEvent) {
        let (column, row) = (mouse.column, mouse.row);
        match mouse.kind {
            MouseEventKind::Down(MouseButton::Left) => {
                if self.layout.on_divider(column, row) {
                    self.focus = Focus::Divider;
                    self.splitter
                        .pointer_down(f64::from(column), f64::from(self.layout.left.width));
                } else if let Some(side) = self.layout.pane_at(column, row) {
                    self.focus = match side {
                        Side::Left => Focus::LeftPane,
                        Side::Right => Focus::RightPane,
                    };
                }
            }
            MouseEventKind::Drag(MouseButton::Left) => {
                let usable = self.layout.panes.width.saturating_sub(DIVIDER_WIDTH);
                self.splitter
                    .pointer_move(f64::from(column), f64::from(usable));
            }
            MouseEventKind::Up(MouseButton::Left) => {
                self.splitter.pointer_up();
            }
            MouseEventKind::ScrollDown => {
                if let Some(side) = self.layout.pane_at(column, row) {
                    self.panes[side.index()].scroll_by(WHEEL_ROWS);
                }
            }
            MouseEventKind::ScrollUp => {
                if let Some(side) = self.layout.pane_at(column, row) {
                    self.panes[side.index()].scroll_by(-WHEEL_ROWS);
                }
            }
            _ => {}
        }
    }
}
