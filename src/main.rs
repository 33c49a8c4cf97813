use anyhow::{Context, Result};
use clap::Parser;
use std::fs::{self, File};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};
use xdg::BaseDirectories;

mod app;
mod backend;
mod config;
mod pane;
mod preview;
mod scroll;
mod session;
mod splitter;
mod ui;

use backend::{HttpBackend, KindFilter};
use pane::Side;

#[derive(Parser, Debug)]
#[command(name = "xproof")]
#[command(about = "Terminal client for reviewing XML proofing issues side by side")]
#[command(version)]
struct Args {
    /// Base URL of the proofing server (default from config, http://127.0.0.1:5000)
    #[arg(long)]
    server: Option<String>,

    /// Original document
    #[arg(long)]
    original: Option<PathBuf>,

    /// Modified document
    #[arg(long)]
    modified: Option<PathBuf>,

    /// Issue kind to compare for: duplicate, gibberish, footnote or all
    #[arg(long, value_parser = parse_kind)]
    kind: Option<KindFilter>,

    /// Log file (default: $XDG_STATE_HOME/xmlproof/xproof.log)
    #[arg(long)]
    log_file: Option<PathBuf>,
}

fn parse_kind(value: &str) -> Result<KindFilter, String> {
    KindFilter::parse(value).ok_or_else(|| {
        format!(
            "unknown kind '{}' (expected duplicate, gibberish, footnote or all)",
            value
        )
    })
}

fn default_log_path() -> PathBuf {
    BaseDirectories::with_prefix(config::APP_NAME)
        .map(|dirs| dirs.get_state_home())
        .unwrap_or_else(|_| PathBuf::from(".cache").join(config::APP_NAME))
        .join("xproof.log")
}

/// The terminal belongs to the TUI, so logs go to a file.
fn init_tracing(path: &Path) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create log directory: {}", parent.display()))?;
    }
    let file = File::options()
        .create(true)
        .append(true)
        .open(path)
        .with_context(|| format!("Failed to open log file: {}", path.display()))?;

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::fmt::layer()
                .with_ansi(false)
                .with_writer(Mutex::new(file)),
        )
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .try_init()
        .context("Failed to initialize logging")?;
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    let log_path = args.log_file.clone().unwrap_or_else(default_log_path);
    init_tracing(&log_path)?;

    let config = config::Config::load()?;
    let server = args.server.clone().unwrap_or_else(|| config.server.clone());
    let backend = HttpBackend::new(&server)
        .with_context(|| format!("Failed to create client for {}", server))?;
    info!(server = backend.base_url(), "starting");

    let mut app = app::App::new(config, Arc::new(backend));

    if let Some(path) = args.original {
        app.select_file(Side::Left, path);
    }
    if let Some(path) = args.modified {
        app.select_file(Side::Right, path);
    }
    // 両ファイル指定時は起動直後に比較を実行
    match args.kind {
        Some(kind) => app.change_kind(Some(kind)),
        None if app.session.file(Side::Left).is_some()
            && app.session.file(Side::Right).is_some() =>
        {
            app.run_diff()
        }
        None => {}
    }

    app.run().await
}
