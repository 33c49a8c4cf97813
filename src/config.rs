use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use xdg::BaseDirectories;

use crate::scroll::{CenteringOptions, ConvergenceOptions};

pub const APP_NAME: &str = "xmlproof";
pub const DEFAULT_SERVER: &str = "http://127.0.0.1:5000";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Base URL of the proofing server.
    pub server: String,
    pub centering: CenteringConfig,
    pub splitter: SplitterConfig,
    pub ui: UiConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CenteringConfig {
    pub max_attempts: u32,
    /// Rows the anchor may sit off-center before another attempt is made.
    pub tolerance: f64,
    pub defer_frames: u32,
    pub smooth_restore_ms: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SplitterConfig {
    pub initial_left_percent: f64,
    pub key_step: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct UiConfig {
    pub frame_ms: u64,
    pub smooth_scroll: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            server: DEFAULT_SERVER.to_owned(),
            centering: CenteringConfig::default(),
            splitter: SplitterConfig::default(),
            ui: UiConfig::default(),
        }
    }
}

impl Default for CenteringConfig {
    fn default() -> Self {
        Self {
            max_attempts: 6,
            tolerance: 6.0,
            defer_frames: 2,
            smooth_restore_ms: 60,
        }
    }
}

impl Default for SplitterConfig {
    fn default() -> Self {
        Self {
            initial_left_percent: 50.0,
            key_step: 2.0,
        }
    }
}

impl Default for UiConfig {
    fn default() -> Self {
        Self {
            frame_ms: 16,
            smooth_scroll: true,
        }
    }
}

impl CenteringConfig {
    pub fn options(&self) -> CenteringOptions {
        CenteringOptions {
            convergence: ConvergenceOptions {
                // at least one attempt, otherwise the anchor never gets focus
                max_attempts: self.max_attempts.max(1),
                tolerance: self.tolerance.max(0.0),
                defer_frames: self.defer_frames,
            },
            smooth_restore: Duration::from_millis(self.smooth_restore_ms),
        }
    }
}

impl UiConfig {
    pub fn frame_interval(&self) -> Duration {
        Duration::from_millis(self.frame_ms.max(1))
    }
}

impl Config {
    /// Load `$XDG_CONFIG_HOME/xmlproof/config.toml`, falling back to defaults
    /// when the file does not exist.
    pub fn load() -> Result<Self> {
        match Self::config_path() {
            Some(path) if path.exists() => Self::load_from(&path),
            _ => Ok(Self::default()),
        }
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))
    }

    pub fn config_path() -> Option<PathBuf> {
        BaseDirectories::with_prefix(APP_NAME)
            .map(|dirs| dirs.get_config_home().join("config.toml"))
            .ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;
    use std::env;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.server, "http://127.0.0.1:5000");
        assert_eq!(config.centering.max_attempts, 6);
        assert_eq!(config.centering.tolerance, 6.0);
        assert_eq!(config.centering.defer_frames, 2);
        assert_eq!(config.centering.smooth_restore_ms, 60);
        assert_eq!(config.splitter.initial_left_percent, 50.0);
        assert_eq!(config.splitter.key_step, 2.0);
        assert!(config.ui.smooth_scroll);
    }

    #[test]
    fn test_partial_file_keeps_defaults() {
        let config: Config = toml::from_str(
            r#"
server = "http://proof.local:8080"

[centering]
tolerance = 1.5
"#,
        )
        .unwrap();
        assert_eq!(config.server, "http://proof.local:8080");
        assert_eq!(config.centering.tolerance, 1.5);
        assert_eq!(config.centering.max_attempts, 6);
        assert_eq!(config.splitter, SplitterConfig::default());
    }

    #[test]
    fn test_centering_options() {
        let centering = CenteringConfig {
            max_attempts: 0,
            tolerance: -3.0,
            defer_frames: 2,
            smooth_restore_ms: 60,
        };
        let opts = centering.options();
        assert_eq!(opts.convergence.max_attempts, 1);
        assert_eq!(opts.convergence.tolerance, 0.0);
        assert_eq!(opts.smooth_restore, Duration::from_millis(60));
    }

    #[test]
    fn test_invalid_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(&path, "server = [").unwrap();
        let err = Config::load_from(&path).unwrap_err();
        assert!(err.to_string().contains("Failed to parse config file"));
    }

    #[test]
    #[serial]
    fn test_load_reads_xdg_config_home() {
        let orig = env::var("XDG_CONFIG_HOME").ok();
        let dir = tempfile::tempdir().unwrap();
        let app_dir = dir.path().join(APP_NAME);
        fs::create_dir_all(&app_dir).unwrap();
        fs::write(
            app_dir.join("config.toml"),
            "[splitter]\ninitial_left_percent = 35.0\n",
        )
        .unwrap();
        env::set_var("XDG_CONFIG_HOME", dir.path());

        let config = Config::load().unwrap();
        assert_eq!(config.splitter.initial_left_percent, 35.0);
        assert_eq!(config.server, DEFAULT_SERVER);

        match orig {
            Some(v) => env::set_var("XDG_CONFIG_HOME", v),
            None => env::remove_var("XDG_CONFIG_HOME"),
        }
    }

    #[test]
    #[serial]
    fn test_load_without_file_uses_defaults() {
        let orig = env::var("XDG_CONFIG_HOME").ok();
        let dir = tempfile::tempdir().unwrap();
        env::set_var("XDG_CONFIG_HOME", dir.path());

        assert_eq!(Config::load().unwrap(), Config::default());

        match orig {
            Some(v) => env::set_var("XDG_CONFIG_HOME", v),
            None => env::remove_var("XDG_CONFIG_HOME"),
        }
    }
}
