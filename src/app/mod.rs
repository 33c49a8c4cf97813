use anyhow::Result;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::mpsc;
use tracing::{debug, warn};

use crate::backend::{KindFilter, ReviewBackend};
use crate::config::Config;
use crate::pane::{Pane, Side};
use crate::preview::PreviewLoader;
use crate::scroll::CenteringOptions;
use crate::session::{self, Applied, Outcome, Prepared, ReviewSession, ViewUpdate};
use crate::splitter::Splitter;
use crate::ui;

mod types;
pub use types::*;

mod input;
mod input_text;
mod polling;
#[cfg(test)]
mod tests;

const SPINNER_FRAMES: &[&str] = &["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"];

/// 操作完了の通知（シーケンス番号付き）
type OpResult = (u64, Outcome);

/// Hands a resolved download URL to the system.
pub type Opener = fn(&str) -> std::io::Result<()>;

fn open_in_system(url: &str) -> std::io::Result<()> {
    open::that_detached(url)
}

pub struct App {
    pub config: Config,
    pub session: ReviewSession,
    pub panes: [Pane; 2],
    pub splitter: Splitter,
    pub preview: PreviewLoader,
    pub focus: Focus,
    pub prompt: Option<PathPrompt>,
    pub status: Option<StatusMessage>,
    pub layout: ScreenLayout,
    pub should_quit: bool,
    pub spinner_frame: usize,
    backend: Arc<dyn ReviewBackend>,
    centering: CenteringOptions,
    in_flight: usize,
    op_sender: mpsc::UnboundedSender<OpResult>,
    op_receiver: mpsc::UnboundedReceiver<OpResult>,
    opener: Opener,
}

impl App {
    pub fn new(config: Config, backend: Arc<dyn ReviewBackend>) -> Self {
        let (op_sender, op_receiver) = mpsc::unbounded_channel();
        let smooth = config.ui.smooth_scroll;
        Self {
            session: ReviewSession::new(),
            panes: [Pane::new(Side::Left, smooth), Pane::new(Side::Right, smooth)],
            splitter: Splitter::new(
                config.splitter.initial_left_percent,
                config.splitter.key_step,
            ),
            preview: PreviewLoader::new(),
            focus: Focus::default(),
            prompt: None,
            status: None,
            layout: ScreenLayout::default(),
            should_quit: false,
            spinner_frame: 0,
            backend,
            centering: config.centering.options(),
            in_flight: 0,
            op_sender,
            op_receiver,
            opener: open_in_system,
            config,
        }
    }

    pub fn set_opener(&mut self, opener: Opener) {
        self.opener = opener;
    }

    pub async fn run(&mut self) -> Result<()> {
        let mut terminal = ui::setup_terminal()?;
        let result = self.event_loop(&mut terminal).await;
        ui::restore_terminal(&mut terminal)?;
        result
    }

    async fn event_loop(&mut self, terminal: &mut ui::Tui) -> Result<()> {
        while !self.should_quit {
            self.spinner_frame = self.spinner_frame.wrapping_add(1);
            self.poll_operations();
            self.poll_previews();
            terminal.draw(|frame| ui::render(frame, self))?;
            // 描画（レイアウト確定）の後にセンタリングを1ステップ進める
            self.step_frame(Instant::now());
            self.handle_input().await?;
        }
        Ok(())
    }

    pub fn spinner_char(&self) -> &str {
        SPINNER_FRAMES[self.spinner_frame % SPINNER_FRAMES.len()]
    }

    pub fn is_busy(&self) -> bool {
        self.in_flight > 0
    }

    /// Something moves on its own and wants frame-rate redraws.
    pub fn is_animating(&self) -> bool {
        self.panes.iter().any(|p| p.is_animating())
    }

    pub fn pane(&self, side: Side) -> &Pane {
        &self.panes[side.index()]
    }

    pub fn step_frame(&mut self, now: Instant) {
        for pane in &mut self.panes {
            if let Some(status) = pane.on_frame(now) {
                if status.is_finished() {
                    debug!(side = ?pane.side(), ?status, "centering finished");
                }
            }
        }
    }

    pub fn alert(&mut self, text: impl Into<String>) {
        let text = text.into();
        // 複数のアラートは連結して表示
        let text = match self.status.take() {
            Some(prev) if prev.kind == StatusKind::Alert => format!("{}; {}", prev.text, text),
            _ => text,
        };
        self.status = Some(StatusMessage {
            text,
            kind: StatusKind::Alert,
        });
    }

    pub fn info(&mut self, text: impl Into<String>) {
        self.status = Some(StatusMessage {
            text: text.into(),
            kind: StatusKind::Info,
        });
    }

    /// Start a session operation: run it on the runtime, or apply it directly
    /// when it needed no request.
    pub(crate) fn dispatch(&mut self, prepared: Prepared) {
        match prepared {
            Prepared::Skip => {}
            Prepared::Done(applied) => self.handle_applied(applied),
            Prepared::Run { seq, request } => {
                let backend = Arc::clone(&self.backend);
                let tx = self.op_sender.clone();
                self.in_flight += 1;
                tokio::spawn(async move {
                    let outcome = session::execute(backend.as_ref(), request).await;
                    let _ = tx.send((seq, outcome));
                });
            }
        }
    }

    pub(crate) fn handle_applied(&mut self, applied: Applied) {
        for text in applied.alerts {
            self.alert(text);
        }
        if !applied.downloads.is_empty() {
            self.open_downloads(&applied.downloads);
        }

        match applied.view {
            Some(ViewUpdate::Issue(data)) => {
                self.preview.supersede();
                self.panes[Side::Left.index()].show_issue(data.left.as_deref().unwrap_or(""));
                self.panes[Side::Right.index()].show_issue(data.right.as_deref().unwrap_or(""));
                // 各ペインで独立にセンタリング
                for pane in &mut self.panes {
                    pane.start_centering(&self.centering);
                }
            }
            Some(ViewUpdate::Cleared) => {
                self.preview.supersede();
                for pane in &mut self.panes {
                    pane.clear();
                }
            }
            None => {}
        }
    }

    fn open_downloads(&mut self, urls: &[String]) {
        let mut opened = 0;
        for url in urls {
            match (self.opener)(url) {
                Ok(()) => opened += 1,
                Err(e) => {
                    warn!(url = %url, error = %e, "failed to open download");
                    self.alert(format!("Could not open {}: {}", url, e));
                }
            }
        }
        if opened > 0 && self.status.is_none() {
            let noun = if opened == 1 { "download" } else { "downloads" };
            self.info(format!("Opened {} {}", opened, noun));
        }
    }

    pub fn select_file(&mut self, side: Side, path: PathBuf) {
        debug!(?side, path = %path.display(), "file selected");
        self.session.select_file(side, path.clone());
        self.preview.request(side, path);
    }

    pub fn change_kind(&mut self, kind: Option<KindFilter>) {
        let prepared = self.session.on_kind_change(kind);
        self.dispatch(prepared);
    }

    pub fn run_diff(&mut self) {
        let prepared = self.session.run_diff(self.session.selected_kind());
        self.dispatch(prepared);
    }

    pub fn recenter(&mut self) {
        for pane in &mut self.panes {
            pane.start_centering(&self.centering);
        }
    }
}
