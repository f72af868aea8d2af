//! SettingsStore: single-slot wrapper around `Settings`.

use super::events::SettingsEvent;
use super::Settings;
use chrono::{DateTime, Utc};
use tokio::sync::broadcast;

const EVENT_CHANNEL_CAPACITY: usize = 256;

pub struct SettingsStore {
    settings: Settings,
    events_tx: broadcast::Sender<SettingsEvent>,
}

impl SettingsStore {
    pub fn new(initial: Settings) -> Self {
        let (events_tx, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
        Self { settings: initial, events_tx }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<SettingsEvent> {
        self.events_tx.subscribe()
    }

    fn emit(&self, event: SettingsEvent) {
        let _ = self.events_tx.send(event);
    }

    pub fn get(&self) -> &Settings {
        &self.settings
    }

    pub fn set_api_credentials(&mut self, api_url: String, api_token: String) {
        self.settings.api_url = Some(api_url);
        self.settings.api_token = Some(api_token);
        self.emit(SettingsEvent::Updated);
    }

    /// Records the anchor the next sync pull should start from.
    pub fn set_last_pulled_at(&mut self, at: DateTime<Utc>) {
        self.settings.last_pulled_at = Some(at);
        self.emit(SettingsEvent::Updated);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn set_api_credentials_marks_configured() {
        let mut store = SettingsStore::new(Settings::default());
        assert!(!store.get().is_configured());
        store.set_api_credentials("https://example.com".to_string(), "tok".to_string());
        assert!(store.get().is_configured());
    }

    #[test]
    fn set_last_pulled_at_updates_anchor() {
        let mut store = SettingsStore::new(Settings::default());
        assert!(store.get().last_pulled_at.is_none());
        let now = Utc::now();
        store.set_last_pulled_at(now);
        assert_eq!(store.get().last_pulled_at, Some(now));
    }
}
