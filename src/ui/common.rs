use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph},
    Frame,
};
use std::path::Path;

use crate::app::{App, PathPrompt, StatusKind};
use crate::backend::{DupSide, IssueKind, KindFilter, RenderKind};
use crate::pane::Side;

const HINTS: &str = "o/m:files d:compare 1-4,0:kind n/p:nav a:accept r:reject A:apply c:center q:quit";

fn file_label(path: Option<&Path>) -> String {
    path.and_then(|p| p.file_name())
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "(none)".to_string())
}

fn kind_label(kind: Option<KindFilter>) -> &'static str {
    match kind {
        None => "(none)",
        Some(filter) => filter.as_param(),
    }
}

pub fn render_header(frame: &mut Frame, area: Rect, app: &App) {
    let session = &app.session;
    let mut spans = vec![
        Span::styled("Original: ", Style::default().fg(Color::DarkGray)),
        Span::raw(file_label(session.file(Side::Left).map(|p| p.as_path()))),
        Span::raw("  "),
        Span::styled("Modified: ", Style::default().fg(Color::DarkGray)),
        Span::raw(file_label(session.file(Side::Right).map(|p| p.as_path()))),
        Span::raw("  "),
        Span::styled("Kind: ", Style::default().fg(Color::DarkGray)),
        Span::styled(
            kind_label(session.selected_kind()),
            Style::default().fg(Color::Cyan),
        ),
        Span::raw("  "),
        Span::styled(
            format!("Accept ({})", session.merge_direction().label()),
            Style::default().fg(Color::Green),
        ),
    ];

    if let Some(stats) = session.stats() {
        let counts: Vec<String> = IssueKind::ALL
            .iter()
            .map(|k| format!("{} {}", k, stats.count_of(*k)))
            .collect();
        spans.push(Span::raw("  "));
        spans.push(Span::styled(
            format!("[{} total: {}]", stats.total, counts.join(", ")),
            Style::default().fg(Color::DarkGray),
        ));
    }

    let header = Paragraph::new(Line::from(spans))
        .block(Block::default().borders(Borders::ALL).title("xproof"));
    frame.render_widget(header, area);
}

pub fn render_status_line(frame: &mut Frame, area: Rect, app: &App) {
    let chunks = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Min(0), Constraint::Length(40)])
        .split(area);

    let left = match &app.status {
        Some(status) => {
            let style = match status.kind {
                StatusKind::Alert => Style::default().fg(Color::Red).add_modifier(Modifier::BOLD),
                StatusKind::Info => Style::default().fg(Color::Green),
            };
            Paragraph::new(Span::styled(format!(" {}", status.text), style))
        }
        None => Paragraph::new(Span::styled(
            format!(" {}", HINTS),
            Style::default().fg(Color::DarkGray),
        )),
    };
    frame.render_widget(left, chunks[0]);

    let session = &app.session;
    let mut spans = Vec::new();
    if app.is_busy() {
        spans.push(Span::styled(
            format!("{} ", app.spinner_char()),
            Style::default().fg(Color::Yellow),
        ));
    }
    if app.focus == crate::app::Focus::Divider || app.splitter.is_dragging() {
        spans.push(Span::styled(
            format!("split {}% ", app.splitter.aria_value_now()),
            Style::default().fg(Color::Yellow),
        ));
    }
    if let Some(side) = session.dup_side() {
        let text = match side {
            DupSide::Left => "dup: left ",
            DupSide::Right => "dup: right ",
            DupSide::None => "",
        };
        if !text.is_empty() {
            spans.push(Span::styled(text, Style::default().fg(Color::Magenta)));
        }
    }
    if session.count() > 0 {
        let label = match session.render_kind() {
            RenderKind::Attr => format!("{} (attr) ", session.issue_kind()),
            RenderKind::Text => format!("{} ", session.issue_kind()),
        };
        spans.push(Span::styled(label, Style::default().fg(Color::Cyan)));
    }
    spans.push(Span::styled(
        format!("{} ", session.indicator()),
        Style::default().add_modifier(Modifier::BOLD),
    ));

    let right = Paragraph::new(Line::from(spans)).alignment(ratatui::layout::Alignment::Right);
    frame.render_widget(right, chunks[1]);
}

pub fn render_prompt(frame: &mut Frame, area: Rect, prompt: &PathPrompt) {
    let title = format!("{} file (Enter: open, Esc: cancel)", prompt.side.label());
    let input = Paragraph::new(Line::from(vec![
        Span::raw(prompt.input.as_str()),
        Span::styled("█", Style::default().fg(Color::Yellow)),
    ]))
    .block(Block::default().borders(Borders::ALL).title(title));
    frame.render_widget(input, area);
}
