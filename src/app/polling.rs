use tokio::sync::mpsc;
use tracing::debug;

use crate::preview::PreviewEvent;

use super::App;

impl App {
    /// バックグラウンド操作の完了をポーリング
    pub(crate) fn poll_operations(&mut self) {
        loop {
            match self.op_receiver.try_recv() {
                Ok((seq, outcome)) => {
                    self.in_flight = self.in_flight.saturating_sub(1);
                    let applied = self.session.apply_outcome(seq, outcome);
                    if !applied.fresh {
                        debug!(seq, "outcome arrived after a newer action");
                    }
                    self.handle_applied(applied);
                }
                Err(mpsc::error::TryRecvError::Empty) => break,
                // App が sender を保持しているため通常は到達しない
                Err(mpsc::error::TryRecvError::Disconnected) => break,
            }
        }
    }

    /// ローカルファイルのプレビュー読み込み完了をポーリング
    pub(crate) fn poll_previews(&mut self) {
        for event in self.preview.poll() {
            match event {
                PreviewEvent::Loaded(buffer) => {
                    debug!(side = ?buffer.side, path = %buffer.path.display(), "preview loaded");
                    self.panes[buffer.side.index()].show_preview(&buffer.text);
                }
                PreviewEvent::Failed { message, .. } => self.alert(message),
            }
        }
    }
}
