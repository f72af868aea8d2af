//! MetricStore: keyed map of metrics plus a day-bucket index.

use super::events::MetricEvent;
use super::ids::generate_metric_id;
use super::{Intensity, Metric};
use crate::error::DomainError;
use chrono::{DateTime, NaiveDate, Utc};
use std::collections::{HashMap, HashSet};
use tokio::sync::broadcast;

const EVENT_CHANNEL_CAPACITY: usize = 256;

pub struct MetricStore {
    items: HashMap<String, Metric>,
    /// day -> metric ids recorded that day (I5: always consistent with
    /// membership in `items`).
    by_day: HashMap<NaiveDate, HashSet<String>>,
    initialized: bool,
    events_tx: broadcast::Sender<MetricEvent>,
}

impl MetricStore {
    pub fn new() -> Self {
        let (events_tx, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
        Self { items: HashMap::new(), by_day: HashMap::new(), initialized: false, events_tx }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<MetricEvent> {
        self.events_tx.subscribe()
    }

    fn emit(&self, event: MetricEvent) {
        let _ = self.events_tx.send(event);
    }

    fn index_day(&mut self, metric: &Metric) {
        self.by_day.entry(metric.date.date_naive()).or_default().insert(metric.id.clone());
    }

    fn unindex_day(&mut self, metric: &Metric) {
        if let Some(ids) = self.by_day.get_mut(&metric.date.date_naive()) {
            ids.remove(&metric.id);
            if ids.is_empty() {
                self.by_day.remove(&metric.date.date_naive());
            }
        }
    }

    pub fn initialize(&mut self, items: Vec<Metric>) -> Result<(), DomainError> {
        if self.initialized {
            return Err(DomainError::InitializationFailed);
        }
        for item in items {
            self.index_day(&item);
            self.items.insert(item.id.clone(), item);
        }
        self.initialized = true;
        self.emit(MetricEvent::Initialized);
        Ok(())
    }

    /// Records a new metric observation, generating a unique id.
    #[allow(clippy::too_many_arguments)]
    pub fn add(
        &mut self,
        symptom_id: String,
        intensity: Intensity,
        date: DateTime<Utc>,
        notes: String,
        now: DateTime<Utc>,
    ) -> Metric {
        let id = generate_metric_id(|candidate| self.items.contains_key(candidate));
        let metric = Metric::new(id.clone(), symptom_id, intensity, date, notes, now);
        self.index_day(&metric);
        self.items.insert(id.clone(), metric.clone());
        self.emit(MetricEvent::Added { id });
        metric
    }

    /// Updates an existing metric. `numeric_intensity`, when given, rewrites
    /// the notes prefix and recomputes the categorical intensity bucket;
    /// otherwise `intensity` is set directly.
    pub fn update(
        &mut self,
        id: &str,
        date: DateTime<Utc>,
        notes: String,
        intensity: Intensity,
        numeric_intensity: Option<u8>,
        now: DateTime<Utc>,
    ) -> Result<Metric, DomainError> {
        let Some(existing) = self.items.get_mut(id) else {
            return Err(DomainError::FailedToUpdate { reason: format!("no metric with id {id}") });
        };
        let old = existing.clone();
        existing.date = date;
        existing.notes = notes;
        existing.intensity = intensity;
        existing.last_modified = now;
        if let Some(n) = numeric_intensity {
            existing.set_numeric_intensity(n, now);
        }
        let updated = existing.clone();
        self.unindex_day(&old);
        self.index_day(&updated);
        self.emit(MetricEvent::Updated { id: id.to_string() });
        Ok(updated)
    }

    /// Deletes a metric. A missing id is a no-op (logged), not an error.
    pub fn delete(&mut self, id: &str) {
        if let Some(removed) = self.items.remove(id) {
            self.unindex_day(&removed);
            self.emit(MetricEvent::Deleted { id: id.to_string() });
        } else {
            tracing::debug!(id, "delete on missing metric id, no-op");
        }
    }

    pub fn get(&self, id: &str) -> Option<&Metric> {
        self.items.get(id)
    }

    /// All metrics, newest first.
    pub fn get_all(&self) -> Vec<Metric> {
        let mut all: Vec<Metric> = self.items.values().cloned().collect();
        all.sort_by_key(|m| std::cmp::Reverse(m.date));
        all
    }

    /// All metrics recorded in the last `n` days (inclusive of today),
    /// newest first.
    pub fn get_metrics_of_last_n_days(&self, n: u32, today: NaiveDate) -> Vec<Metric> {
        let earliest = today - chrono::Duration::days(n.saturating_sub(1) as i64);
        let mut matches: Vec<Metric> = self
            .items
            .values()
            .filter(|m| {
                let day = m.date.date_naive();
                day >= earliest && day <= today
            })
            .cloned()
            .collect();
        matches.sort_by_key(|m| std::cmp::Reverse(m.date));
        matches
    }

    /// One suggestion per symptom, newest metric first, for a "log again?"
    /// quick-entry list.
    pub fn suggestions(&self, today: NaiveDate) -> Vec<super::MetricSuggestion> {
        super::enrich_and_squash(&self.get_all(), today)
    }

    /// Whether any recorded metric still references `symptom_id` - used to
    /// gate symptom deletion so history never references a deleted symptom
    /// (an edge case worth a dedicated check rather than an implicit one).
    pub fn is_symptom_used_in_history(&self, symptom_id: &str) -> bool {
        self.items.values().any(|m| m.symptom_id == symptom_id)
    }

    /// Merges pulled metrics into the store without re-entering the change
    /// queue. Last-write-wins per entity, same as SymptomStore.
    pub fn add_pulled_data(&mut self, pulled: Vec<Metric>) {
        if pulled.is_empty() {
            return;
        }
        for metric in pulled {
            let accept = match self.items.get(&metric.id) {
                Some(local) => metric.last_modified >= local.last_modified,
                None => true,
            };
            if !accept {
                continue;
            }
            if let Some(old) = self.items.get(&metric.id).cloned() {
                self.unindex_day(&old);
            }
            self.index_day(&metric);
            self.items.insert(metric.id.clone(), metric);
        }
        self.emit(MetricEvent::AddedFromExternalSource);
    }
}

impl Default for MetricStore {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[test]
    fn second_initialize_fails() {
        let mut store = MetricStore::new();
        assert!(store.initialize(vec![]).is_ok());
        assert_eq!(store.initialize(vec![]), Err(DomainError::InitializationFailed));
    }

    #[test]
    fn add_generates_unique_id() {
        let mut store = MetricStore::new();
        let m = store.add("sym_1".to_string(), Intensity::Low, Utc::now(), String::new(), Utc::now());
        assert!(m.id.starts_with("met_"));
        assert_eq!(store.get(&m.id), Some(&m));
    }

    #[test]
    fn update_missing_id_fails() {
        let mut store = MetricStore::new();
        let err = store
            .update("met_missing", Utc::now(), String::new(), Intensity::Low, None, Utc::now())
            .unwrap_err();
        assert!(matches!(err, DomainError::FailedToUpdate { .. }));
    }

    #[test]
    fn delete_missing_id_is_a_no_op() {
        let mut store = MetricStore::new();
        store.delete("met_missing");
    }

    #[test]
    fn get_all_orders_newest_first() {
        let mut store = MetricStore::new();
        let t0 = Utc::now();
        let oldest = store.add("sym_1".to_string(), Intensity::Low, t0 - Duration::days(2), String::new(), t0);
        let newest = store.add("sym_1".to_string(), Intensity::Low, t0, String::new(), t0);
        let middle =
            store.add("sym_1".to_string(), Intensity::Low, t0 - Duration::days(1), String::new(), t0);

        let ids: Vec<String> = store.get_all().into_iter().map(|m| m.id).collect();
        assert_eq!(ids, vec![newest.id, middle.id, oldest.id]);
    }

    #[test]
    fn get_metrics_of_last_n_days_filters_by_window() {
        let mut store = MetricStore::new();
        let today = Utc::now();
        let five_days_ago = today - Duration::days(5);
        let ten_days_ago = today - Duration::days(10);

        let recent = store.add("sym_1".to_string(), Intensity::Low, today, String::new(), today);
        store.add("sym_1".to_string(), Intensity::Low, five_days_ago, String::new(), today);
        store.add("sym_1".to_string(), Intensity::Low, ten_days_ago, String::new(), today);

        let last_3 = store.get_metrics_of_last_n_days(3, today.date_naive());
        assert_eq!(last_3.len(), 1);
        assert_eq!(last_3[0].id, recent.id);

        let last_7 = store.get_metrics_of_last_n_days(7, today.date_naive());
        assert_eq!(last_7.len(), 2);
    }

    #[test]
    fn day_index_stays_consistent_across_update_and_delete() {
        let mut store = MetricStore::new();
        let t0 = Utc::now();
        let m = store.add("sym_1".to_string(), Intensity::Low, t0, String::new(), t0);
        assert_eq!(store.get_metrics_of_last_n_days(1, t0.date_naive()).len(), 1);

        let t1 = t0 + Duration::days(2);
        store.update(&m.id, t1, String::new(), Intensity::Medium, None, t1).unwrap();
        assert!(store.get_metrics_of_last_n_days(1, t0.date_naive()).is_empty());
        assert_eq!(store.get_metrics_of_last_n_days(1, t1.date_naive()).len(), 1);

        store.delete(&m.id);
        assert!(store.get_metrics_of_last_n_days(1, t1.date_naive()).is_empty());
    }

    #[test]
    fn is_symptom_used_in_history_reflects_current_metrics() {
        let mut store = MetricStore::new();
        assert!(!store.is_symptom_used_in_history("sym_1"));
        let m = store.add("sym_1".to_string(), Intensity::Low, Utc::now(), String::new(), Utc::now());
        assert!(store.is_symptom_used_in_history("sym_1"));
        store.delete(&m.id);
        assert!(!store.is_symptom_used_in_history("sym_1"));
    }

    #[test]
    fn suggestions_squash_to_one_entry_per_symptom() {
        let mut store = MetricStore::new();
        let today = Utc::now();
        let yesterday = today - Duration::days(1);
        let newest = store.add("sym_1".to_string(), Intensity::Low, today, String::new(), today);
        store.add("sym_1".to_string(), Intensity::Low, yesterday, String::new(), today);
        store.add("sym_2".to_string(), Intensity::High, yesterday, String::new(), today);

        let suggestions = store.suggestions(today.date_naive());
        assert_eq!(suggestions.len(), 2);
        let sym1 = suggestions.iter().find(|s| s.symptom_id == "sym_1").unwrap();
        assert_eq!(sym1.most_recent.id, newest.id);
        assert!(sym1.recorded_today && sym1.recorded_in_past);
        let sym2 = suggestions.iter().find(|s| s.symptom_id == "sym_2").unwrap();
        assert!(!sym2.recorded_today && sym2.recorded_in_past);
    }

    #[test]
    fn pulled_data_does_not_overwrite_newer_local_edit() {
        let mut store = MetricStore::new();
        let t0 = Utc::now();
        let m = store.add("sym_1".to_string(), Intensity::Low, t0, "orig".to_string(), t0);
        let t1 = t0 + Duration::seconds(10);
        store.update(&m.id, t0, "edited".to_string(), Intensity::Medium, None, t1).unwrap();

        let mut stale_pull = m.clone();
        stale_pull.notes = "stale".to_string();
        stale_pull.last_modified = t0;
        store.add_pulled_data(vec![stale_pull]);

        assert_eq!(store.get(&m.id).unwrap().notes, "edited");
    }
}
