//! Configuration for the sync client.
//!
//! Configuration is loaded in order of precedence:
//! 1. Environment variables (highest priority)
//! 2. Config file (~/.config/healthsync/config.toml)
//! 3. Built-in defaults (lowest priority)

use serde::Deserialize;
use std::path::PathBuf;
use std::time::Duration;

mod logging;
mod serialization;


pub use logging::{LogRotation, LoggingConfig};

/// Version info
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Namespace prefix for every key this client persists.
pub const STORAGE_PREFIX: &str = "health";

/// Default tick period for the sync engine.
pub const DEFAULT_REMOTE_LOOP_WAIT: Duration = Duration::from_secs(5);

/// Default pull overlap window, in seconds.
pub const DEFAULT_PULL_OVERLAP_SECONDS: i64 = 30;

/// Application configuration.
#[derive(Debug, Clone)]
pub struct Config {
    /// Remote API base URL. `None` means "not configured".
    pub api_url: Option<String>,

    /// Remote API auth token, sent as `x-api-key`. `None` means "not
    /// configured".
    pub api_token: Option<String>,

    /// Directory holding the SQLite-backed local store.
    pub storage_dir: PathBuf,

    /// Sync engine tick period.
    pub remote_loop_wait: Duration,

    /// Pull overlap window, in seconds.
    pub pull_overlap_seconds: i64,

    /// Logging configuration.
    pub logging: LoggingConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_url: None,
            api_token: None,
            storage_dir: default_storage_dir(),
            remote_loop_wait: DEFAULT_REMOTE_LOOP_WAIT,
            pull_overlap_seconds: DEFAULT_PULL_OVERLAP_SECONDS,
            logging: LoggingConfig::default(),
        }
    }
}

fn default_storage_dir() -> PathBuf {
    dirs::data_local_dir()
        .map(|p| p.join("healthsync"))
        .unwrap_or_else(|| PathBuf::from("./data"))
}

// ─────────────────────────────────────────────────────────────────────────────
// File Configuration (deserialization layer)
// ─────────────────────────────────────────────────────────────────────────────

/// Config file structure (subset of `Config` that makes sense to persist).
#[derive(Debug, Deserialize, Default)]
pub(crate) struct FileConfig {
    pub api_url: Option<String>,
    pub api_token: Option<String>,
    pub storage_dir: Option<String>,
    pub remote_loop_wait_secs: Option<u64>,
    pub pull_overlap_seconds: Option<i64>,

    /// Optional `[logging]` section.
    pub logging: Option<logging::FileLogging>,
}

// ─────────────────────────────────────────────────────────────────────────────
// Configuration Loading
// ─────────────────────────────────────────────────────────────────────────────

impl Config {
    /// Get the config file path: `~/.config/healthsync/config.toml`.
    /// Uses Unix-style `~/.config` on all platforms for consistency.
    pub fn config_path() -> Option<PathBuf> {
        dirs::home_dir().map(|p| p.join(".config").join("healthsync").join("config.toml"))
    }

    /// Create config file with defaults if it doesn't exist. Called during
    /// startup to help users discover configuration options.
    pub fn ensure_config_exists() {
        let Some(path) = Self::config_path() else {
            return;
        };

        if path.exists() {
            return;
        }

        if let Some(parent) = path.parent() {
            if std::fs::create_dir_all(parent).is_err() {
                return; // Silently fail - config is optional
            }
        }

        let template = Self::default().to_toml();
        let _ = std::fs::write(&path, template);
    }

    /// Load file config if it exists.
    ///
    /// # Panics
    /// If config file exists but cannot be parsed. This is intentional - a
    /// broken config should fail fast with a clear error, not silently fall
    /// back to defaults while the user debugs the wrong thing.
    fn load_file_config() -> FileConfig {
        let Some(path) = Self::config_path() else {
            return FileConfig::default();
        };

        match std::fs::read_to_string(&path) {
            Ok(contents) => match toml::from_str(&contents) {
                Ok(config) => config,
                Err(source) => {
                    eprintln!("config error: failed to parse {}: {}", path.display(), source);
                    eprintln!("to reset, delete the file and restart healthsync.");
                    std::process::exit(1);
                }
            },
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => FileConfig::default(),
            Err(e) => {
                eprintln!("config error: cannot read {}: {}", path.display(), e);
                std::process::exit(1);
            }
        }
    }

    /// Load configuration: env vars > config file > defaults.
    pub fn from_env() -> Self {
        let file = Self::load_file_config();

        let api_url = std::env::var("HEALTHSYNC_API_URL").ok().or(file.api_url);
        let api_token = std::env::var("HEALTHSYNC_API_TOKEN").ok().or(file.api_token);

        let storage_dir = std::env::var("HEALTHSYNC_STORAGE_DIR")
            .ok()
            .or(file.storage_dir)
            .map(PathBuf::from)
            .unwrap_or_else(default_storage_dir);

        let remote_loop_wait = std::env::var("HEALTHSYNC_LOOP_WAIT_SECS")
            .ok()
            .and_then(|v| v.parse().ok())
            .or(file.remote_loop_wait_secs)
            .map(Duration::from_secs)
            .unwrap_or(DEFAULT_REMOTE_LOOP_WAIT);

        let pull_overlap_seconds = std::env::var("HEALTHSYNC_PULL_OVERLAP_SECONDS")
            .ok()
            .and_then(|v| v.parse().ok())
            .or(file.pull_overlap_seconds)
            .unwrap_or(DEFAULT_PULL_OVERLAP_SECONDS);

        let logging = LoggingConfig::from_file(file.logging);

        Self {
            api_url,
            api_token,
            storage_dir,
            remote_loop_wait,
            pull_overlap_seconds,
            logging,
        }
    }

    /// `true` when both `api_url` and `api_token` are configured.
    pub fn is_configured(&self) -> bool {
        self.api_url.is_some() && self.api_token.is_some()
    }
}
