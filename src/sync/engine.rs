//! SyncEngine: the tick-driven sync process.

use super::status::{StatusPublisher, SyncStatus};
use crate::coordinator::{SharedChangeQueue, SharedMetricStore, SharedSettingsStore, SharedSymptomStore};
use crate::domain::{ChangeCategory, ChangeToPush};
use crate::local_store::LocalStore;
use crate::remote::RemoteApi;
use chrono::{DateTime, Duration, Utc};
use std::sync::Arc;

pub struct SyncEngineConfig {
    pub remote_loop_wait: std::time::Duration,
    pub pull_overlap_seconds: i64,
}

pub struct SyncEngine {
    symptoms: SharedSymptomStore,
    metrics: SharedMetricStore,
    settings: SharedSettingsStore,
    queue: SharedChangeQueue,
    local: Arc<LocalStore>,
    remote: Arc<dyn RemoteApi>,
    status: Arc<StatusPublisher>,
    config: SyncEngineConfig,
}

/// True when `url` points at loopback - bypasses the "offline" connectivity
/// check.
fn is_localhost_url(url: &str) -> bool {
    url.contains("localhost") || url.contains("127.0.0.1") || url.contains("[::1]")
}

impl SyncEngine {
    pub fn new(
        symptoms: SharedSymptomStore,
        metrics: SharedMetricStore,
        settings: SharedSettingsStore,
        queue: SharedChangeQueue,
        local: Arc<LocalStore>,
        remote: Arc<dyn RemoteApi>,
        status: Arc<StatusPublisher>,
        config: SyncEngineConfig,
    ) -> Self {
        Self { symptoms, metrics, settings, queue, local, remote, status, config }
    }

    pub fn subscribe_status(&self) -> tokio::sync::watch::Receiver<SyncStatus> {
        self.status.subscribe()
    }

    /// Arms a repeating tick at `REMOTE_LOOP_WAIT` and runs forever. Ticks
    /// are never re-entrant: this loop awaits each tick to completion
    /// before the next `interval.tick()` fires.
    pub async fn sync_continuously(&self) {
        let mut interval = tokio::time::interval(self.config.remote_loop_wait);
        loop {
            interval.tick().await;
            self.tick().await;
        }
    }

    /// Runs exactly one sync process: classify connectivity, pull, reconcile
    /// pulled data against the pending push queue and domain state, push
    /// queued changes, then republish status.
    pub async fn tick(&self) {
        let (api_url, api_token) = {
            let settings = self.settings.lock().unwrap();
            (settings.get().api_url.clone(), settings.get().api_token.clone())
        };

        // Step 1: classify connection status.
        let queue_empty = self.queue.lock().unwrap().is_empty();
        let Some((_url, _token)) = api_url.clone().zip(api_token.clone()) else {
            self.status.publish(if queue_empty {
                SyncStatus::Offline
            } else {
                SyncStatus::OfflinePendingPush
            });
            return;
        };
        let url = api_url.unwrap();

        if !is_localhost_url(&url) && !self.device_online().await {
            self.status.publish(if queue_empty {
                SyncStatus::Offline
            } else {
                SyncStatus::OfflinePendingPush
            });
            return;
        }

        self.status.publish(SyncStatus::Pulling);

        // Step 2: pull.
        let last_pulled_at = self.local.load_last_pull_date().ok().flatten();
        let since = last_pulled_at
            .map(|t| t - Duration::seconds(self.config.pull_overlap_seconds))
            .unwrap_or_else(|| DateTime::<Utc>::from_timestamp(0, 0).expect("epoch is valid"));
        let current_pull_date = Utc::now();

        let pulled = match self.remote.read_all(since).await {
            Ok(pulled) => pulled,
            Err(_) => {
                self.status.publish(SyncStatus::OnlineButSyncFailed);
                return;
            }
        };
        let _ = self.local.save_last_pull_date(current_pull_date);
        self.settings.lock().unwrap().set_last_pulled_at(current_pull_date);

        // Step 3: reconcile pulled with queue.
        let mut pass_through_symptoms = Vec::new();
        let mut pass_through_metrics = Vec::new();
        {
            let mut queue = self.queue.lock().unwrap();
            for symptom in pulled.symptoms {
                match queue.get(&symptom.id) {
                    Some(queued) if queued.ordering_date() > symptom.last_modified => {}
                    Some(_) => {
                        queue.discard(&symptom.id);
                        pass_through_symptoms.push(symptom);
                    }
                    None => pass_through_symptoms.push(symptom),
                }
            }
            for metric in pulled.metrics {
                match queue.get(&metric.id) {
                    Some(queued) if queued.ordering_date() > metric.last_modified => {}
                    Some(_) => {
                        queue.discard(&metric.id);
                        pass_through_metrics.push(metric);
                    }
                    None => pass_through_metrics.push(metric),
                }
            }
            let _ = self.local.save_changes_to_push(&queue.snapshot());
        }

        // Reconcile pulled with domain, then apply (last-write-wins is
        // inside `add_pulled_data`); no re-enqueue happens for these.
        if !pass_through_symptoms.is_empty() {
            self.symptoms.lock().unwrap().add_pulled_data(pass_through_symptoms);
            let all = self.symptoms.lock().unwrap().get_all();
            let _ = self.local.save_symptoms(&all);
        }
        if !pass_through_metrics.is_empty() {
            self.metrics.lock().unwrap().add_pulled_data(pass_through_metrics);
            let all = self.metrics.lock().unwrap().get_all();
            let _ = self.local.save_history(&all);
        }

        // Step 5: push.
        self.status.publish(SyncStatus::Pushing);
        let pending: Vec<ChangeToPush> = self.queue.lock().unwrap().iter().cloned().collect();
        let mut any_failed = false;
        for change in pending {
            let result = self.push_one(&change).await;
            match result {
                Ok(()) => {
                    self.queue.lock().unwrap().dequeue(change.entity_id());
                }
                Err(e) if e.is_missing_entity() && change.category() == ChangeCategory::Delete => {
                    self.queue.lock().unwrap().dequeue(change.entity_id());
                }
                Err(_) => {
                    any_failed = true;
                }
            }
        }
        let _ = self.local.save_changes_to_push(&self.queue.lock().unwrap().snapshot());

        // Step 6: final status.
        if any_failed {
            self.status.publish(SyncStatus::OnlineButSyncFailed);
        } else {
            self.status.publish(SyncStatus::OnlineAndSynced);
        }
    }

    async fn push_one(&self, change: &ChangeToPush) -> Result<(), crate::error::RemoteError> {
        match change {
            ChangeToPush::AddSymptom { symptom } => {
                self.remote.create_symptom(symptom).await?;
            }
            ChangeToPush::UpdateSymptom { symptom } => {
                self.remote.update_symptom(symptom).await?;
            }
            ChangeToPush::DeleteSymptom { id, .. } => {
                self.remote.delete_symptom(id).await?;
            }
            ChangeToPush::AddMetric { metric } => {
                self.remote.create_metric(metric).await?;
            }
            ChangeToPush::UpdateMetric { metric } => {
                self.remote.update_metric(metric).await?;
            }
            ChangeToPush::DeleteMetric { id, .. } => {
                self.remote.delete_metric(id).await?;
            }
        }
        Ok(())
    }

    /// There's no OS-level connectivity signal to read here; a cheap
    /// `/health` probe stands in for it, alongside the localhost bypass.
    async fn device_online(&self) -> bool {
        self.remote.health().await.is_ok()
    }

    /// `pushAll`: bulk user-initiated push that bypasses the queue and
    /// never touches `lastPulledAt`.
    pub async fn push_all(&self) -> Result<crate::remote::PushAllOutcomes, crate::error::RemoteError> {
        let symptoms = self.symptoms.lock().unwrap().get_all();
        let metrics = self.metrics.lock().unwrap().get_all();
        self.remote.push_all(&symptoms, &metrics).await
    }
}
