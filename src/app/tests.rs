use super::*;
use async_trait::async_trait;
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers, MouseButton, MouseEvent, MouseEventKind};
use ratatui::layout::Rect;
use serde_json::json;
use std::io::Write;
use std::path::Path;
use std::time::Duration;

use crate::backend::{
    AcceptRequest, ApplyResponse, BackendError, DiffResponse, IssueKind, NavDirection,
    RenderResponse, StatsResponse,
};
use crate::pane::PaneSource;
use crate::session::PositionIndicator;
use crate::ui::DIVIDER_WIDTH;

/// Server with three gibberish issues that accepts everything.
struct StubBackend;

#[async_trait]
impl ReviewBackend for StubBackend {
    async fn render(&self, _kind: KindFilter) -> Result<RenderResponse, BackendError> {
        let mut left = String::new();
        let mut right = String::new();
        for i in 0..40 {
            if i == 30 {
                left.push_str("<p>old <span id=\"focusAnchor\">qwzx</span></p>");
                right.push_str("<p>new <span class=\"editNewInline\">text</span></p>");
            } else {
                left.push_str(&format!("<p>line {}</p>", i));
                right.push_str(&format!("<p>line {}</p>", i));
            }
        }
        Ok(RenderResponse {
            count: 3,
            pos: 1,
            left: Some(left),
            right: Some(right),
            steps: Some(json!([1, 2])),
            issue_kind: Some(IssueKind::Gibberish),
            ..Default::default()
        })
    }

    async fn diff(
        &self,
        _original: &Path,
        _modified: &Path,
        _only: KindFilter,
    ) -> Result<DiffResponse, BackendError> {
        Ok(DiffResponse {
            count: 3,
            ..Default::default()
        })
    }

    async fn set_filter(&self, _only: KindFilter) -> Result<(), BackendError> {
        Ok(())
    }

    async fn navigate(&self, _dir: NavDirection) -> Result<(), BackendError> {
        Ok(())
    }

    async fn accept(&self, _body: &AcceptRequest) -> Result<(), BackendError> {
        Ok(())
    }

    async fn reject(&self) -> Result<(), BackendError> {
        Ok(())
    }

    async fn apply(&self) -> Result<ApplyResponse, BackendError> {
        Ok(ApplyResponse {
            download_right: Some("/download/right.xml".to_string()),
            ..Default::default()
        })
    }

    async fn recompute(&self) -> Result<(), BackendError> {
        Ok(())
    }

    async fn stats(&self) -> Result<StatsResponse, BackendError> {
        Ok(StatsResponse {
            total: 3,
            ..Default::default()
        })
    }

    fn resolve_url(&self, reference: &str) -> String {
        format!("http://proof.test{}", reference)
    }
}

fn no_open(_url: &str) -> std::io::Result<()> {
    Ok(())
}

fn failing_open(_url: &str) -> std::io::Result<()> {
    Err(std::io::Error::other("no browser"))
}

fn test_app() -> App {
    let mut config = Config::default();
    config.ui.smooth_scroll = false;
    let mut app = App::new(config, Arc::new(StubBackend));
    app.set_opener(no_open);
    app
}

fn key(code: KeyCode) -> KeyEvent {
    KeyEvent::new(code, KeyModifiers::NONE)
}

fn type_text(app: &mut App, text: &str) {
    for c in text.chars() {
        app.handle_key(key(KeyCode::Char(c)));
    }
}

/// Wait until every spawned operation has reported back.
async fn settle(app: &mut App) {
    for _ in 0..200 {
        app.poll_operations();
        if !app.is_busy() {
            return;
        }
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
    panic!("operations did not finish");
}

fn measure_panes(app: &mut App) {
    for pane in &mut app.panes {
        pane.measure(Rect::new(0, 4, 30, 10));
    }
}

#[test]
fn test_tab_cycles_focus() {
    let mut app = test_app();
    assert_eq!(app.focus, Focus::LeftPane);
    app.handle_key(key(KeyCode::Tab));
    assert_eq!(app.focus, Focus::Divider);
    app.handle_key(key(KeyCode::Tab));
    assert_eq!(app.focus, Focus::RightPane);
    app.handle_key(key(KeyCode::Tab));
    assert_eq!(app.focus, Focus::LeftPane);
    app.handle_key(key(KeyCode::BackTab));
    assert_eq!(app.focus, Focus::RightPane);
}

#[test]
fn test_arrow_keys_move_focused_divider() {
    let mut app = test_app();
    app.handle_key(key(KeyCode::Right));
    assert_eq!(app.splitter.left_percent(), 50.0);

    app.focus = Focus::Divider;
    app.handle_key(key(KeyCode::Right));
    assert_eq!(app.splitter.left_percent(), 52.0);
    app.handle_key(key(KeyCode::Left));
    app.handle_key(key(KeyCode::Left));
    assert_eq!(app.splitter.aria_value_now(), 48);
}

#[test]
fn test_quit_keys() {
    let mut app = test_app();
    app.handle_key(key(KeyCode::Char('q')));
    assert!(app.should_quit);

    let mut app = test_app();
    app.prompt = Some(PathPrompt::new(Side::Left, None));
    app.handle_key(KeyEvent::new(KeyCode::Char('c'), KeyModifiers::CONTROL));
    assert!(app.should_quit);
}

#[test]
fn test_accept_without_issue_does_nothing() {
    let mut app = test_app();
    app.handle_key(key(KeyCode::Char('a')));
    assert!(!app.is_busy());
    assert!(app.status.is_none());
}

#[test]
fn test_compare_without_files_alerts() {
    let mut app = test_app();
    app.handle_key(key(KeyCode::Char('d')));
    assert!(!app.is_busy());
    assert_eq!(
        app.status,
        Some(StatusMessage {
            text: "Please choose both files first.".to_string(),
            kind: StatusKind::Alert,
        })
    );

    // cleared by the next action
    app.handle_key(key(KeyCode::Tab));
    assert!(app.status.is_none());
}

#[test]
fn test_empty_kind_clears_panes() {
    let mut app = test_app();
    app.panes[0].show_preview("text");
    app.handle_key(key(KeyCode::Char('0')));
    assert_eq!(app.pane(Side::Left).source(), PaneSource::Empty);
    assert_eq!(app.session.indicator().to_string(), "0/0");
}

#[tokio::test]
async fn test_prompt_selects_file_and_previews() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    file.write_all(b"<root>original</root>").unwrap();
    let path = file.path().display().to_string();

    let mut app = test_app();
    app.handle_key(key(KeyCode::Char('o')));
    assert!(app.prompt.is_some());
    type_text(&mut app, &path);
    app.handle_key(key(KeyCode::Enter));

    assert!(app.prompt.is_none());
    assert_eq!(app.session.file(Side::Left), Some(&PathBuf::from(&path)));
    assert!(!app.session.has_diff());
    assert_eq!(app.session.indicator(), PositionIndicator::Unknown);

    for _ in 0..200 {
        app.poll_previews();
        if app.pane(Side::Left).source() == PaneSource::Preview {
            break;
        }
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
    assert_eq!(app.pane(Side::Left).source(), PaneSource::Preview);
    assert_eq!(
        app.pane(Side::Left).document().line_text(0),
        "<root>original</root>"
    );
}

#[test]
fn test_prompt_editing_and_cancel() {
    let mut app = test_app();
    app.handle_key(key(KeyCode::Char('m')));
    type_text(&mut app, "abc");
    app.handle_key(key(KeyCode::Backspace));
    assert_eq!(app.prompt.as_ref().map(|p| p.input.as_str()), Some("ab"));

    // keys go to the prompt, not to the review actions
    assert!(!app.should_quit);
    app.handle_key(key(KeyCode::Esc));
    assert!(app.prompt.is_none());
    assert!(app.session.file(Side::Right).is_none());

    app.handle_key(key(KeyCode::Char('m')));
    app.handle_key(key(KeyCode::Enter));
    assert!(app.session.file(Side::Right).is_none());
}

#[tokio::test]
async fn test_reload_shows_issue_and_centers_both_panes() {
    let mut app = test_app();
    app.handle_key(key(KeyCode::Char('R')));
    assert!(app.is_busy());
    settle(&mut app).await;

    assert_eq!(app.session.indicator().to_string(), "1/3");
    assert_eq!(app.pane(Side::Left).source(), PaneSource::Issue);
    assert_eq!(app.pane(Side::Right).source(), PaneSource::Issue);
    assert!(app.panes.iter().all(|p| p.is_centering()));
    assert_eq!(app.pane(Side::Left).anchor_tabindex(), Some(-1));

    for _ in 0..10 {
        measure_panes(&mut app);
        app.step_frame(Instant::now());
    }
    for pane in &app.panes {
        assert!(!pane.is_centering());
        assert!(pane.is_anchor_focused());
        let rows = pane.anchor_rows().unwrap();
        let first = pane.first_visible_row();
        assert!(rows.start >= first && rows.start < first + 10);
    }
}

#[tokio::test]
async fn test_wheel_scroll_cancels_centering() {
    let mut app = test_app();
    app.layout = ScreenLayout {
        panes: Rect::new(0, 3, 61, 12),
        left: Rect::new(0, 3, 30, 12),
        divider: Rect::new(30, 3, 1, 12),
        right: Rect::new(31, 3, 30, 12),
    };
    app.handle_key(key(KeyCode::Char('R')));
    settle(&mut app).await;
    measure_panes(&mut app);

    app.handle_mouse(MouseEvent {
        kind: MouseEventKind::ScrollDown,
        column: 40,
        row: 5,
        modifiers: KeyModifiers::NONE,
    });
    app.step_frame(Instant::now());

    assert!(!app.pane(Side::Right).is_centering());
    assert!(app.pane(Side::Right).is_anchor_focused());
    assert!(app.pane(Side::Left).is_centering());
}

#[test]
fn test_divider_drag() {
    let mut app = test_app();
    app.layout = ScreenLayout {
        panes: Rect::new(0, 3, 101, 12),
        left: Rect::new(0, 3, 50, 12),
        divider: Rect::new(50, 3, 1, 12),
        right: Rect::new(51, 3, 50, 12),
    };
    let mouse = |kind, column| MouseEvent {
        kind,
        column,
        row: 6,
        modifiers: KeyModifiers::NONE,
    };

    app.handle_mouse(mouse(MouseEventKind::Down(MouseButton::Left), 50));
    assert!(app.splitter.is_dragging());
    assert_eq!(app.focus, Focus::Divider);

    // the divider column is not part of the split
    app.handle_mouse(mouse(MouseEventKind::Drag(MouseButton::Left), 51));
    assert!((app.splitter.left_percent() - 51.0).abs() < 1e-9);
    assert_eq!(app.splitter.split_width(101, DIVIDER_WIDTH), (51, 49));

    app.handle_mouse(mouse(MouseEventKind::Drag(MouseButton::Left), 70));
    assert!((app.splitter.left_percent() - 70.0).abs() < 1e-9);

    app.handle_mouse(mouse(MouseEventKind::Up(MouseButton::Left), 70));
    assert!(!app.splitter.is_dragging());
}

#[tokio::test]
async fn test_apply_opens_download() {
    let mut app = test_app();
    app.handle_key(key(KeyCode::Char('A')));
    settle(&mut app).await;

    assert_eq!(
        app.status,
        Some(StatusMessage {
            text: "Opened 1 download".to_string(),
            kind: StatusKind::Info,
        })
    );
    assert_eq!(app.session.indicator().to_string(), "1/3");
}

#[tokio::test]
async fn test_open_failure_is_alerted() {
    let mut app = test_app();
    app.set_opener(failing_open);
    app.handle_key(key(KeyCode::Char('A')));
    settle(&mut app).await;

    let status = app.status.clone().unwrap();
    assert_eq!(status.kind, StatusKind::Alert);
    assert!(status.text.contains("http://proof.test/download/right.xml"));
}

#[tokio::test]
async fn test_kind_key_runs_initial_compare() {
    let mut app = test_app();
    app.session
        .select_file(Side::Left, PathBuf::from("original.xml"));
    app.session
        .select_file(Side::Right, PathBuf::from("modified.xml"));

    app.handle_key(key(KeyCode::Char('1')));
    settle(&mut app).await;

    assert!(app.session.has_diff());
    assert_eq!(
        app.session.selected_kind(),
        Some(KindFilter::Only(IssueKind::Duplicate))
    );
    assert_eq!(app.session.stats().map(|s| s.total), Some(3));
}
