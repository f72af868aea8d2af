//! Coordinator: wires domain-store change events to LocalStore persistence
//! and ChangeQueue enqueues.
//!
//! Domain stores never reference the sync engine; the coordinator is the
//! only thing that reads their change streams, so the dependency graph
//! stays acyclic.

use crate::domain::{
    ChangeToPush, MetricEvent, MetricStore, SettingsEvent, SettingsStore, SymptomEvent,
    SymptomStore,
};
use crate::local_store::LocalStore;
use crate::sync::queue::ChangeQueue;
use crate::sync::{StatusPublisher, SyncStatus};
use chrono::Utc;
use std::sync::{Arc, Mutex};

pub type SharedSymptomStore = Arc<Mutex<SymptomStore>>;
pub type SharedMetricStore = Arc<Mutex<MetricStore>>;
pub type SharedSettingsStore = Arc<Mutex<SettingsStore>>;
pub type SharedChangeQueue = Arc<Mutex<ChangeQueue>>;

pub struct Coordinator {
    symptoms: SharedSymptomStore,
    metrics: SharedMetricStore,
    settings: SharedSettingsStore,
    queue: SharedChangeQueue,
    local: Arc<LocalStore>,
    status: Arc<StatusPublisher>,
}

impl Coordinator {
    pub fn new(
        symptoms: SharedSymptomStore,
        metrics: SharedMetricStore,
        settings: SharedSettingsStore,
        queue: SharedChangeQueue,
        local: Arc<LocalStore>,
        status: Arc<StatusPublisher>,
    ) -> Self {
        Self { symptoms, metrics, settings, queue, local, status }
    }

    /// Reads all five LocalStore slots once and loads them into the
    /// in-memory stores.
    pub fn load_from_local_store(&self) -> Result<(), crate::error::StorageError> {
        let symptoms = self.local.load_symptoms()?;
        let history = self.local.load_history()?;
        let settings = self.local.load_settings()?;
        let changes = self.local.load_changes_to_push()?;

        self.symptoms.lock().unwrap().initialize(symptoms).expect("first and only initialize");
        self.metrics.lock().unwrap().initialize(history).expect("first and only initialize");
        *self.settings.lock().unwrap() = SettingsStore::new(settings);
        *self.queue.lock().unwrap() = ChangeQueue::from_snapshot(changes);
        Ok(())
    }

    /// Drives one symptom-store event through to persistence/enqueue.
    /// Called by whatever drains `SymptomStore::subscribe()`.
    pub fn handle_symptom_event(&self, event: SymptomEvent) {
        self.persist_symptoms();
        let now = Utc::now();
        match event {
            SymptomEvent::Added { id } | SymptomEvent::Updated { id } => {
                let symptoms = self.symptoms.lock().unwrap();
                if let Some(symptom) = symptoms.get(&id) {
                    let change = if matches!(event, SymptomEvent::Added { .. }) {
                        ChangeToPush::AddSymptom { symptom: symptom.clone() }
                    } else {
                        ChangeToPush::UpdateSymptom { symptom: symptom.clone() }
                    };
                    drop(symptoms);
                    self.enqueue(change);
                }
            }
            SymptomEvent::Deleted { id } => {
                self.enqueue(ChangeToPush::DeleteSymptom { id, deletion_date: now });
            }
            // Pulled data and the initial load are persisted above, but
            // never re-enter the push queue.
            SymptomEvent::Initialized | SymptomEvent::AddedFromExternalSource => {}
        }
    }

    pub fn handle_metric_event(&self, event: MetricEvent) {
        self.persist_metrics();
        let now = Utc::now();
        match event {
            MetricEvent::Added { id } | MetricEvent::Updated { id } => {
                let metrics = self.metrics.lock().unwrap();
                if let Some(metric) = metrics.get(&id) {
                    if self.symptoms.lock().unwrap().get(&metric.symptom_id).is_none() {
                        // Orphan metrics are tolerated, not rejected or healed - just
                        // flagged so it's visible in the logs.
                        tracing::warn!(
                            metric_id = %metric.id,
                            symptom_id = %metric.symptom_id,
                            "metric references a symptom id that no longer exists"
                        );
                    }
                    let change = if matches!(event, MetricEvent::Added { .. }) {
                        ChangeToPush::AddMetric { metric: metric.clone() }
                    } else {
                        ChangeToPush::UpdateMetric { metric: metric.clone() }
                    };
                    drop(metrics);
                    self.enqueue(change);
                }
            }
            MetricEvent::Deleted { id } => {
                self.enqueue(ChangeToPush::DeleteMetric { id, deletion_date: now });
            }
            MetricEvent::Initialized | MetricEvent::AddedFromExternalSource => {}
        }
    }

    pub fn handle_settings_event(&self, _event: SettingsEvent) {
        let settings = self.settings.lock().unwrap().get().clone();
        let _ = self.local.save_settings(&settings);
    }

    fn enqueue(&self, change: ChangeToPush) {
        let mut queue = self.queue.lock().unwrap();
        queue.enqueue(change);
        let _ = self.local.save_changes_to_push(&queue.snapshot());
        drop(queue);
        self.status.publish(SyncStatus::WaitingToSync);
    }

    fn persist_symptoms(&self) {
        let all = self.symptoms.lock().unwrap().get_all();
        let _ = self.local.save_symptoms(&all);
    }

    fn persist_metrics(&self) {
        let all = self.metrics.lock().unwrap().get_all();
        let _ = self.local.save_history(&all);
    }
}
