use ratatui::{
    layout::Rect,
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph},
    Frame,
};

use crate::app::{App, Focus};
use crate::pane::{Mark, Pane, PaneSource, Side};

fn mark_style(mark: Mark) -> Style {
    match mark {
        Mark::Plain => Style::default(),
        Mark::Inserted => Style::default().fg(Color::Green),
        Mark::Deleted => Style::default()
            .fg(Color::Red)
            .add_modifier(Modifier::CROSSED_OUT),
        Mark::Focus => Style::default()
            .fg(Color::Yellow)
            .add_modifier(Modifier::BOLD),
    }
}

pub fn render_panes(frame: &mut Frame, app: &mut App) {
    let layout = app.layout;
    let focus = app.focus;
    for (side, area) in [(Side::Left, layout.left), (Side::Right, layout.right)] {
        let focused = focus.pane() == Some(side);
        let path = app
            .session
            .file(side)
            .and_then(|p| p.file_name())
            .map(|n| n.to_string_lossy().into_owned());
        render_pane(frame, area, &mut app.panes[side.index()], focused, path);
    }
    render_divider(frame, layout.divider, app);
}

fn render_pane(frame: &mut Frame, area: Rect, pane: &mut Pane, focused: bool, path: Option<String>) {
    let mut title = format!(" {} ", pane.side().label());
    if let Some(path) = path {
        title.push_str(&format!("· {} ", path));
    }
    if pane.source() == PaneSource::Preview {
        title.push_str("(preview) ");
    }
    let border = if focused {
        Style::default().fg(Color::Cyan)
    } else {
        Style::default().fg(Color::DarkGray)
    };
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(border)
        .title(title);
    let inner = block.inner(area);
    frame.render_widget(block, area);

    // 描画領域が確定したここでレイアウトを計測
    pane.measure(inner);

    let first = pane.first_visible_row();
    let anchor_rows = pane.anchor_rows().filter(|_| pane.is_anchor_focused());
    let lines: Vec<Line> = pane
        .visible_rows()
        .iter()
        .enumerate()
        .map(|(i, row)| {
            let spans: Vec<Span> = row
                .iter()
                .map(|seg| Span::styled(seg.text.as_str(), mark_style(seg.mark)))
                .collect();
            let line = Line::from(spans);
            match &anchor_rows {
                Some(rows) if rows.contains(&(first + i)) => {
                    line.style(Style::default().bg(Color::Rgb(40, 40, 60)))
                }
                _ => line,
            }
        })
        .collect();

    frame.render_widget(Paragraph::new(lines), inner);
}

fn render_divider(frame: &mut Frame, area: Rect, app: &App) {
    let style = if app.splitter.is_dragging() {
        Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD)
    } else if app.focus == Focus::Divider {
        Style::default().fg(Color::Yellow)
    } else {
        Style::default().fg(Color::DarkGray)
    };
    let lines: Vec<Line> = (0..area.height)
        .map(|_| Line::from(Span::styled("┃", style)))
        .collect();
    frame.render_widget(Paragraph::new(lines), area);
}
