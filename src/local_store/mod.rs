//! LocalStore: a typed namespace over a durable key-value primitive.
//!
//! `KeyValueStore` is the trait boundary, and [`SqliteKeyValueStore`] is the
//! one concrete adapter this crate ships, pooled with `r2d2`.

mod sqlite;

pub use sqlite::SqliteKeyValueStore;

use crate::config::STORAGE_PREFIX;
use crate::domain::{ChangeToPush, Metric, Settings, Symptom};
use crate::error::StorageError;
use chrono::{DateTime, Utc};

/// Raw get/set/delete over string keys. LocalStore layers the five typed
/// slots on top; nothing above this trait knows the storage engine exists.
pub trait KeyValueStore: Send + Sync {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError>;
    fn set(&self, key: &str, value: &str) -> Result<(), StorageError>;
    fn delete(&self, key: &str) -> Result<(), StorageError>;
}

fn slot_key(slot: &str) -> String {
    format!("{STORAGE_PREFIX}__{slot}")
}

/// The five durable slots this client persists.
pub struct LocalStore {
    kv: Box<dyn KeyValueStore>,
}

impl LocalStore {
    pub fn new(kv: Box<dyn KeyValueStore>) -> Self {
        Self { kv }
    }

    fn read_slot<T: serde::de::DeserializeOwned>(
        &self,
        slot: &'static str,
    ) -> Result<Option<T>, StorageError> {
        match self.kv.get(&slot_key(slot))? {
            Some(raw) => {
                let value = serde_json::from_str(&raw)
                    .map_err(|source| StorageError::MalformedSlot { slot, source })?;
                Ok(Some(value))
            }
            None => Ok(None),
        }
    }

    fn write_slot<T: serde::Serialize>(
        &self,
        slot: &'static str,
        value: &T,
    ) -> Result<(), StorageError> {
        let raw = serde_json::to_string(value).expect("in-memory types always serialize");
        self.kv.set(&slot_key(slot), &raw)
    }

    pub fn load_settings(&self) -> Result<Settings, StorageError> {
        Ok(self.read_slot("settings")?.unwrap_or_default())
    }

    pub fn save_settings(&self, settings: &Settings) -> Result<(), StorageError> {
        self.write_slot("settings", settings)
    }

    pub fn load_symptoms(&self) -> Result<Vec<Symptom>, StorageError> {
        Ok(self.read_slot("symptoms")?.unwrap_or_default())
    }

    pub fn save_symptoms(&self, symptoms: &[Symptom]) -> Result<(), StorageError> {
        self.write_slot("symptoms", &symptoms)
    }

    pub fn load_history(&self) -> Result<Vec<Metric>, StorageError> {
        Ok(self.read_slot("history")?.unwrap_or_default())
    }

    pub fn save_history(&self, metrics: &[Metric]) -> Result<(), StorageError> {
        self.write_slot("history", &metrics)
    }

    pub fn load_changes_to_push(&self) -> Result<Vec<ChangeToPush>, StorageError> {
        Ok(self.read_slot("changesToPush")?.unwrap_or_default())
    }

    pub fn save_changes_to_push(&self, changes: &[ChangeToPush]) -> Result<(), StorageError> {
        self.write_slot("changesToPush", &changes)
    }

    pub fn load_last_pull_date(&self) -> Result<Option<DateTime<Utc>>, StorageError> {
        self.read_slot("lastPullDate")
    }

    pub fn save_last_pull_date(&self, at: DateTime<Utc>) -> Result<(), StorageError> {
        self.write_slot("lastPullDate", &at)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::sync::Mutex;

    #[derive(Default)]
    struct InMemoryKv(Mutex<HashMap<String, String>>);

    impl KeyValueStore for InMemoryKv {
        fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
            Ok(self.0.lock().unwrap().get(key).cloned())
        }
        fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
            self.0.lock().unwrap().insert(key.to_string(), value.to_string());
            Ok(())
        }
        fn delete(&self, key: &str) -> Result<(), StorageError> {
            self.0.lock().unwrap().remove(key);
            Ok(())
        }
    }

    fn store() -> LocalStore {
        LocalStore::new(Box::new(InMemoryKv::default()))
    }

    #[test]
    fn missing_slots_default_to_empty() {
        let store = store();
        assert_eq!(store.load_symptoms().unwrap(), Vec::new());
        assert_eq!(store.load_history().unwrap(), Vec::new());
        assert_eq!(store.load_changes_to_push().unwrap(), Vec::new());
        assert_eq!(store.load_last_pull_date().unwrap(), None);
        assert_eq!(store.load_settings().unwrap(), Settings::default());
    }

    #[test]
    fn symptoms_round_trip() {
        let store = store();
        let symptoms = vec![Symptom::new("sym_1".into(), "headache".into(), vec![], Utc::now())];
        store.save_symptoms(&symptoms).unwrap();
        assert_eq!(store.load_symptoms().unwrap(), symptoms);
    }

    #[test]
    fn last_pull_date_round_trips_as_iso8601() {
        let store = store();
        let now = Utc::now();
        store.save_last_pull_date(now).unwrap();
        assert_eq!(store.load_last_pull_date().unwrap(), Some(now));
    }

    #[test]
    fn settings_round_trip() {
        let store = store();
        let settings = Settings {
            api_url: Some("https://example.com".into()),
            api_token: Some("tok".into()),
            last_pulled_at: Some(Utc::now()),
        };
        store.save_settings(&settings).unwrap();
        assert_eq!(store.load_settings().unwrap(), settings);
    }
}
