mod common;
mod panes;

use anyhow::{Context, Result};
use crossterm::{
    event::{DisableMouseCapture, EnableMouseCapture},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{
    backend::CrosstermBackend,
    layout::{Constraint, Direction, Layout, Rect},
    Frame, Terminal,
};
use std::io::{self, Stdout};

use crate::app::{App, ScreenLayout};

pub type Tui = Terminal<CrosstermBackend<Stdout>>;

/// Width of the strip between the panes.
pub const DIVIDER_WIDTH: u16 = 1;

pub fn setup_terminal() -> Result<Tui> {
    enable_raw_mode().context("Failed to enable raw mode")?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)
        .context("Failed to enter alternate screen")?;
    Terminal::new(CrosstermBackend::new(stdout)).context("Failed to create terminal")
}

pub fn restore_terminal(terminal: &mut Tui) -> Result<()> {
    disable_raw_mode().context("Failed to disable raw mode")?;
    execute!(
        terminal.backend_mut(),
        LeaveAlternateScreen,
        DisableMouseCapture
    )
    .context("Failed to leave alternate screen")?;
    terminal.show_cursor().context("Failed to show cursor")?;
    Ok(())
}

pub fn render(frame: &mut Frame, app: &mut App) {
    let mut constraints = vec![
        Constraint::Length(3), // Header
        Constraint::Min(0),    // Panes
        Constraint::Length(1), // Status line
    ];
    if app.prompt.is_some() {
        constraints.push(Constraint::Length(3)); // Path prompt
    }

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints(constraints)
        .split(frame.area());

    common::render_header(frame, chunks[0], app);

    app.layout = split_panes(app, chunks[1]);
    panes::render_panes(frame, app);

    common::render_status_line(frame, chunks[2], app);
    if let Some(prompt) = &app.prompt {
        common::render_prompt(frame, chunks[3], prompt);
    }
}

fn split_panes(app: &App, area: Rect) -> ScreenLayout {
    let (left_width, right_width) = app.splitter.split_width(area.width, DIVIDER_WIDTH);
    let chunks = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Length(left_width),
            Constraint::Length(DIVIDER_WIDTH),
            Constraint::Length(right_width),
        ])
        .split(area);
    ScreenLayout {
        panes: area,
        left: chunks[0],
        divider: chunks[1],
        right: chunks[2],
    }
}
