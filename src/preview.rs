use std::path::{Path, PathBuf};
use tokio::sync::mpsc;
use tracing::debug;

use crate::pane::Side;

/// Raw text of a locally chosen file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PreviewBuffer {
    pub side: Side,
    pub path: PathBuf,
    pub text: String,
}

#[derive(Debug)]
pub enum PreviewEvent {
    Loaded(PreviewBuffer),
    Failed {
        side: Side,
        path: PathBuf,
        message: String,
    },
}

struct PreviewMessage {
    generation: u64,
    side: Side,
    path: PathBuf,
    result: std::io::Result<String>,
}

/// Reads chosen files in the background and hands back the text for display.
///
/// Every request bumps the side's generation; reads that finish after a newer
/// request (or after the previews were superseded) are dropped.
pub struct PreviewLoader {
    generations: [u64; 2],
    buffers: [Option<PreviewBuffer>; 2],
    tx: mpsc::UnboundedSender<PreviewMessage>,
    rx: mpsc::UnboundedReceiver<PreviewMessage>,
}

impl Default for PreviewLoader {
    fn default() -> Self {
        Self::new()
    }
}

impl PreviewLoader {
    pub fn new() -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        Self {
            generations: [0; 2],
            buffers: [None, None],
            tx,
            rx,
        }
    }

    pub fn buffer(&self, side: Side) -> Option<&PreviewBuffer> {
        self.buffers[side.index()].as_ref()
    }

    /// Start reading `path` for `side`. Must be called inside a tokio runtime.
    pub fn request(&mut self, side: Side, path: PathBuf) {
        let slot = side.index();
        self.generations[slot] += 1;
        let generation = self.generations[slot];
        let tx = self.tx.clone();

        tokio::spawn(async move {
            let result = read_text(&path).await;
            let _ = tx.send(PreviewMessage {
                generation,
                side,
                path,
                result,
            });
        });
    }

    /// Drop the shown previews; a server-rendered issue replaced them.
    pub fn supersede(&mut self) {
        for g in &mut self.generations {
            *g += 1;
        }
        self.buffers = [None, None];
    }

    /// Completed reads that are still current.
    pub fn poll(&mut self) -> Vec<PreviewEvent> {
        let mut events = Vec::new();
        while let Ok(msg) = self.rx.try_recv() {
            if let Some(event) = self.accept(msg) {
                events.push(event);
            }
        }
        events
    }

    fn accept(&mut self, msg: PreviewMessage) -> Option<PreviewEvent> {
        let slot = msg.side.index();
        if msg.generation != self.generations[slot] {
            debug!(side = ?msg.side, path = %msg.path.display(), "stale preview dropped");
            return None;
        }
        match msg.result {
            Ok(text) => {
                let buffer = PreviewBuffer {
                    side: msg.side,
                    path: msg.path,
                    text,
                };
                self.buffers[slot] = Some(buffer.clone());
                Some(PreviewEvent::Loaded(buffer))
            }
            Err(e) => Some(PreviewEvent::Failed {
                side: msg.side,
                message: format!("Could not read {}: {}", msg.path.display(), e),
                path: msg.path,
            }),
        }
    }

    #[cfg(test)]
    async fn next_event(&mut self) -> Option<PreviewEvent> {
        loop {
            let msg = self.rx.recv().await?;
            if let Some(event) = self.accept(msg) {
                return Some(event);
            }
        }
    }
}

/// File contents as text; invalid UTF-8 is replaced rather than rejected.
pub async fn read_text(path: &Path) -> std::io::Result<String> {
    let bytes = tokio::fs::read(path).await?;
    Ok(String::from_utf8_lossy(&bytes).into_owned())
}
