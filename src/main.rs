// healthsync - offline-first symptom and metric tracker
//
// Records symptoms and metrics locally and bidirectionally syncs them with
// a remote server.
//
// Architecture:
// - Domain stores (SymptomStore, MetricStore, SettingsStore): in-memory
//   state, each broadcasting change events.
// - Coordinator: drains those change events, persists full snapshots to the
//   local store, and enqueues pending pushes.
// - SyncEngine: ticks on a timer, pulling/reconciling/pushing against the
//   remote server.

mod cli;

use anyhow::{Context, Result};
use healthsync::config::Config;
use healthsync::coordinator::{
    Coordinator, SharedChangeQueue, SharedMetricStore, SharedSettingsStore, SharedSymptomStore,
};
use healthsync::domain::{MetricStore, SettingsStore, SymptomStore};
use healthsync::local_store::{LocalStore, SqliteKeyValueStore};
use healthsync::remote::{HttpRemoteClient, RemoteApi};
use healthsync::logging;
use healthsync::sync::{ChangeQueue, StatusPublisher, SyncEngine, SyncEngineConfig, SyncStatus};
use std::sync::{Arc, Mutex};

/// Drains a store's broadcast channel on its own task, handing every event
/// to the coordinator. Domain stores never reference the sync engine or the
/// coordinator directly - this loop is the only thing that reads their
/// event streams.
fn spawn_event_drain<E: Clone + Send + 'static>(
    mut rx: tokio::sync::broadcast::Receiver<E>,
    coordinator: Arc<Coordinator>,
    handle: impl Fn(&Coordinator, E) + Send + 'static,
) {
    tokio::spawn(async move {
        loop {
            match rx.recv().await {
                Ok(event) => handle(&coordinator, event),
                Err(tokio::sync::broadcast::error::RecvError::Lagged(skipped)) => {
                    tracing::warn!(skipped, "event drain lagged, some events were dropped");
                }
                Err(tokio::sync::broadcast::error::RecvError::Closed) => break,
            }
        }
    });
}

#[tokio::main]
async fn main() -> Result<()> {
    if cli::handle_cli() {
        return Ok(());
    }

    Config::ensure_config_exists();
    let config = Config::from_env();

    let _log_guard = logging::init(&config.logging);

    tracing::info!(
        storage_dir = %config.storage_dir.display(),
        configured = config.is_configured(),
        "starting healthsync"
    );

    let db_path = config.storage_dir.join("healthsync.db");
    let kv = SqliteKeyValueStore::new(&db_path)
        .with_context(|| format!("failed to open local store at {}", db_path.display()))?;
    let local = Arc::new(LocalStore::new(Box::new(kv)));

    let symptoms: SharedSymptomStore = Arc::new(Mutex::new(SymptomStore::new()));
    let metrics: SharedMetricStore = Arc::new(Mutex::new(MetricStore::new()));
    let settings: SharedSettingsStore = Arc::new(Mutex::new(SettingsStore::new(Default::default())));
    let queue: SharedChangeQueue = Arc::new(Mutex::new(ChangeQueue::new()));
    let status = Arc::new(StatusPublisher::new(SyncStatus::Offline));

    let coordinator = Arc::new(Coordinator::new(
        symptoms.clone(),
        metrics.clone(),
        settings.clone(),
        queue.clone(),
        local.clone(),
        status.clone(),
    ));
    coordinator.load_from_local_store().context("failed to load local store on startup")?;

    let symptom_rx = symptoms.lock().unwrap().subscribe();
    let metric_rx = metrics.lock().unwrap().subscribe();
    let settings_rx = settings.lock().unwrap().subscribe();

    spawn_event_drain(symptom_rx, coordinator.clone(), |c, event| c.handle_symptom_event(event));
    spawn_event_drain(metric_rx, coordinator.clone(), |c, event| c.handle_metric_event(event));
    spawn_event_drain(settings_rx, coordinator.clone(), |c, event| c.handle_settings_event(event));

    let loaded_settings = settings.lock().unwrap().get().clone();
    let remote: Arc<dyn RemoteApi> = match (&loaded_settings.api_url, &loaded_settings.api_token) {
        (Some(url), Some(token)) => Arc::new(HttpRemoteClient::new(url.clone(), token.clone())),
        _ => Arc::new(HttpRemoteClient::new(String::new(), String::new())),
    };

    let engine = SyncEngine::new(
        symptoms,
        metrics,
        settings,
        queue,
        local,
        remote,
        status,
        SyncEngineConfig {
            remote_loop_wait: config.remote_loop_wait,
            pull_overlap_seconds: config.pull_overlap_seconds,
        },
    );

    tracing::info!("entering sync loop, tick every {:?}", config.remote_loop_wait);
    engine.sync_continuously().await;

    Ok(())
}
