//! SymptomStore: keyed map of symptoms plus the autocomplete index.
//! Exclusively owns the symptom map and its autocomplete index.

use super::autocomplete::Autocompleter;
use super::events::SymptomEvent;
use super::ids::generate_symptom_id;
use super::Symptom;
use crate::error::DomainError;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use tokio::sync::broadcast;

const EVENT_CHANNEL_CAPACITY: usize = 256;

pub struct SymptomStore {
    items: HashMap<String, Symptom>,
    index: Autocompleter,
    initialized: bool,
    events_tx: broadcast::Sender<SymptomEvent>,
}

impl SymptomStore {
    pub fn new() -> Self {
        let (events_tx, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
        Self { items: HashMap::new(), index: Autocompleter::new(), initialized: false, events_tx }
    }

    /// Subscribes to this store's change events: a typed broadcast channel
    /// per store with bounded fan-out by subscription - every subscriber
    /// gets its own ordered view.
    pub fn subscribe(&self) -> broadcast::Receiver<SymptomEvent> {
        self.events_tx.subscribe()
    }

    fn emit(&self, event: SymptomEvent) {
        // No receivers is a legitimate state (nobody has subscribed yet);
        // broadcast::Sender::send only errors when there are zero
        // receivers, which we don't treat as a failure.
        let _ = self.events_tx.send(event);
    }

    /// Loads an initial batch of symptoms (on startup, from the local
    /// store). A second call fails - `initialize` is idempotent-guarded,
    /// not idempotent.
    pub fn initialize(&mut self, items: Vec<Symptom>) -> Result<(), DomainError> {
        if self.initialized {
            return Err(DomainError::InitializationFailed);
        }
        for item in items {
            self.index.add_item(&item.id, &item.tokens());
            self.items.insert(item.id.clone(), item);
        }
        self.initialized = true;
        self.emit(SymptomEvent::Initialized);
        Ok(())
    }

    /// Adds a brand-new symptom, generating a unique id.
    pub fn add(&mut self, name: String, other_names: Vec<String>, now: DateTime<Utc>) -> Symptom {
        let id = generate_symptom_id(|candidate| self.items.contains_key(candidate));
        let symptom = Symptom::new(id.clone(), name, other_names, now);
        self.index.add_item(&symptom.id, &symptom.tokens());
        self.items.insert(id.clone(), symptom.clone());
        self.emit(SymptomEvent::Added { id });
        symptom
    }

    /// Updates an existing symptom's name/other_names, bumping
    /// `last_modified` to `now`.
    pub fn update(
        &mut self,
        id: &str,
        name: String,
        other_names: Vec<String>,
        now: DateTime<Utc>,
    ) -> Result<Symptom, DomainError> {
        let Some(existing) = self.items.get_mut(id) else {
            return Err(DomainError::FailedToUpdate { reason: format!("no symptom with id {id}") });
        };
        self.index.remove_item(id);
        existing.name = name;
        existing.other_names = other_names;
        existing.last_modified = now;
        let updated = existing.clone();
        self.index.add_item(id, &updated.tokens());
        self.emit(SymptomEvent::Updated { id: id.to_string() });
        Ok(updated)
    }

    /// Deletes a symptom. A missing id is a no-op (logged), not an error -
    /// deletion is idempotent.
    pub fn delete(&mut self, id: &str) {
        if self.items.remove(id).is_some() {
            self.index.remove_item(id);
            self.emit(SymptomEvent::Deleted { id: id.to_string() });
        } else {
            tracing::debug!(id, "delete on missing symptom id, no-op");
        }
    }

    pub fn get(&self, id: &str) -> Option<&Symptom> {
        self.items.get(id)
    }

    /// All symptoms, sorted alphabetically by lowercase name.
    pub fn get_all(&self) -> Vec<Symptom> {
        let mut all: Vec<Symptom> = self.items.values().cloned().collect();
        all.sort_by_key(|s| s.name.to_lowercase());
        all
    }

    /// Prefix-AND search over symptom names/other_names.
    pub fn search(&self, query: &str) -> Vec<Symptom> {
        let ids = self.index.search(query);
        let mut matches: Vec<Symptom> =
            ids.into_iter().filter_map(|id| self.items.get(&id).cloned()).collect();
        matches.sort_by_key(|s| s.name.to_lowercase());
        matches
    }

    /// Merges pulled symptoms into the store without re-entering the change
    /// queue. Last-write-wins per entity: a pulled symptom replaces the
    /// local one iff its `last_modified` is >= the local one's.
    pub fn add_pulled_data(&mut self, pulled: Vec<Symptom>) {
        if pulled.is_empty() {
            return;
        }
        for symptom in pulled {
            let accept = match self.items.get(&symptom.id) {
                Some(local) => symptom.last_modified >= local.last_modified,
                None => true,
            };
            if !accept {
                continue;
            }
            self.index.remove_item(&symptom.id);
            self.index.add_item(&symptom.id, &symptom.tokens());
            self.items.insert(symptom.id.clone(), symptom);
        }
        self.emit(SymptomEvent::AddedFromExternalSource);
    }
}

impl Default for SymptomStore {
    fn default() -> Self {
        Self::new()
    }
}
