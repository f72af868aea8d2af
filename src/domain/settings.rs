//! Settings: remote endpoint, auth token, last-pull anchor.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Settings {
    pub api_url: Option<String>,
    pub api_token: Option<String>,
    pub last_pulled_at: Option<DateTime<Utc>>,
}

impl Settings {
    pub fn is_configured(&self) -> bool {
        self.api_url.is_some() && self.api_token.is_some()
    }
}
