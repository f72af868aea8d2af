//! Config serialization to TOML
//!
//! Single source of truth for config file format.

use super::Config;

impl Config {
    /// Serialize config to TOML string.
    pub fn to_toml(&self) -> String {
        format!(
            r#"# healthsync configuration

# Remote API base URL. Leave commented out to run fully offline.
# api_url = "{api_url}"

# Remote API auth token, sent as the `x-api-key` header.
# api_token = "{api_token}"

# Directory holding the SQLite-backed local store.
storage_dir = "{storage_dir}"

# Sync engine tick period, in seconds.
remote_loop_wait_secs = {loop_wait}

# Pull overlap window, in seconds (tolerates clock skew between devices).
pull_overlap_seconds = {overlap}

[logging]
level = "{log_level}"
# File logging (in addition to stdout)
file_enabled = {log_file_enabled}
file_dir = "{log_file_dir}"
file_rotation = "{log_file_rotation}"  # hourly, daily, never
file_prefix = "{log_file_prefix}"
"#,
            api_url = self.api_url.clone().unwrap_or_default(),
            api_token = self.api_token.clone().unwrap_or_default(),
            storage_dir = self.storage_dir.display(),
            loop_wait = self.remote_loop_wait.as_secs(),
            overlap = self.pull_overlap_seconds,
            log_level = self.logging.level,
            log_file_enabled = self.logging.file_enabled,
            log_file_dir = self.logging.file_dir.display(),
            log_file_rotation = self.logging.file_rotation.as_str(),
            log_file_prefix = self.logging.file_prefix,
        )
    }
}
