//! ChangeQueue: the persisted mapping `entityId -> ChangeToPush`. Holds at
//! most one pending change per entity; enqueuing merges with any existing
//! entry via `domain::change::merge`.

use crate::domain::{merge, ChangeToPush};
use indexmap::IndexMap;

/// Ordered (insertion order matters - changes are processed in insertion
/// order per tick) map from entity id to its one pending change.
#[derive(Default)]
pub struct ChangeQueue {
    pending: IndexMap<String, ChangeToPush>,
}

impl ChangeQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Rehydrates the queue from a persisted snapshot (on restart).
    pub fn from_snapshot(changes: Vec<ChangeToPush>) -> Self {
        let mut pending = IndexMap::new();
        for change in changes {
            pending.insert(change.entity_id().to_string(), change);
        }
        Self { pending }
    }

    pub fn snapshot(&self) -> Vec<ChangeToPush> {
        self.pending.values().cloned().collect()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    pub fn len(&self) -> usize {
        self.pending.len()
    }

    /// Enqueues `change`, merging with any existing pending change for the
    /// same entity. A merge that cancels to `None` removes the entry.
    pub fn enqueue(&mut self, change: ChangeToPush) {
        let id = change.entity_id().to_string();
        match self.pending.shift_remove(&id) {
            Some(existing) => {
                if let Some(merged) = merge(existing, change) {
                    self.pending.insert(id, merged);
                }
            }
            None => {
                self.pending.insert(id, change);
            }
        }
    }

    /// Removes the pending change for `entity_id` (after a successful push,
    /// or a 404-on-delete treated as success).
    pub fn dequeue(&mut self, entity_id: &str) {
        self.pending.shift_remove(entity_id);
    }

    /// Drops the queued change for `entity_id` without attempting to push
    /// it (reconciling with fresher pulled data).
    pub fn discard(&mut self, entity_id: &str) {
        self.pending.shift_remove(entity_id);
    }

    pub fn get(&self, entity_id: &str) -> Option<&ChangeToPush> {
        self.pending.get(entity_id)
    }

    /// Iterates pending changes in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = &ChangeToPush> {
        self.pending.values()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{Intensity, Metric, Symptom};
    use chrono::{Duration, Utc};

    fn symptom_at(id: &str, t: chrono::DateTime<Utc>) -> Symptom {
        Symptom::new(id.to_string(), "headache".to_string(), vec![], t)
    }

    fn metric_at(id: &str, t: chrono::DateTime<Utc>) -> Metric {
        Metric::new(id.to_string(), "sym_1".to_string(), Intensity::Low, t, String::new(), t)
    }

    #[test]
    fn enqueue_keeps_at_most_one_entry_per_entity() {
        let mut queue = ChangeQueue::new();
        let t0 = Utc::now();
        queue.enqueue(ChangeToPush::AddSymptom { symptom: symptom_at("sym_1", t0) });
        let t1 = t0 + Duration::seconds(5);
        queue.enqueue(ChangeToPush::UpdateSymptom { symptom: symptom_at("sym_1", t1) });
        assert_eq!(queue.len(), 1);
    }

    #[test]
    fn enqueue_merges_per_change_table() {
        let mut queue = ChangeQueue::new();
        let t0 = Utc::now();
        let t1 = t0 + Duration::seconds(5);
        queue.enqueue(ChangeToPush::AddSymptom { symptom: symptom_at("sym_1", t0) });
        queue.enqueue(ChangeToPush::DeleteSymptom {
            id: "sym_1".to_string(),
            deletion_date: t1,
        });
        assert!(queue.get("sym_1").is_none());
        assert!(queue.is_empty());
    }

    #[test]
    fn dequeue_removes_entry() {
        let mut queue = ChangeQueue::new();
        queue.enqueue(ChangeToPush::AddMetric { metric: metric_at("met_1", Utc::now()) });
        queue.dequeue("met_1");
        assert!(queue.is_empty());
    }

    #[test]
    fn snapshot_round_trips_through_from_snapshot() {
        let mut queue = ChangeQueue::new();
        queue.enqueue(ChangeToPush::AddSymptom { symptom: symptom_at("sym_1", Utc::now()) });
        queue.enqueue(ChangeToPush::AddMetric { metric: metric_at("met_1", Utc::now()) });
        let snapshot = queue.snapshot();
        let rehydrated = ChangeQueue::from_snapshot(snapshot);
        assert_eq!(rehydrated.len(), 2);
    }

    #[test]
    fn unrelated_entities_do_not_interfere() {
        let mut queue = ChangeQueue::new();
        queue.enqueue(ChangeToPush::AddSymptom { symptom: symptom_at("sym_1", Utc::now()) });
        queue.enqueue(ChangeToPush::AddSymptom { symptom: symptom_at("sym_2", Utc::now()) });
        assert_eq!(queue.len(), 2);
    }
}
