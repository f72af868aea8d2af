//! End-to-end sync scenarios, exercising the coordinator and sync engine
//! together against a real SQLite-backed local store and the in-memory
//! `FakeRemote` test double.

use chrono::Utc;
use healthsync::coordinator::Coordinator;
use healthsync::domain::{
    ChangeToPush, Intensity, MetricEvent, MetricStore, Settings, SettingsStore, Symptom,
    SymptomEvent, SymptomStore,
};
use healthsync::local_store::{LocalStore, SqliteKeyValueStore};
use healthsync::remote::fake::FakeRemote;
use healthsync::sync::{ChangeQueue, StatusPublisher, SyncEngine, SyncEngineConfig, SyncStatus};
use std::sync::{Arc, Mutex};

fn configured_settings() -> Settings {
    Settings {
        api_url: Some("http://localhost:9999".to_string()),
        api_token: Some("tok".to_string()),
        last_pulled_at: None,
    }
}

struct Harness {
    coordinator: Arc<Coordinator>,
    engine: SyncEngine,
    symptoms: Arc<Mutex<SymptomStore>>,
    metrics: Arc<Mutex<MetricStore>>,
    queue: Arc<Mutex<ChangeQueue>>,
    local: Arc<LocalStore>,
}

fn harness(settings: Settings, remote: Arc<FakeRemote>, dir: &std::path::Path) -> Harness {
    let kv = SqliteKeyValueStore::new(dir.join("healthsync.db")).unwrap();
    let local = Arc::new(LocalStore::new(Box::new(kv)));

    let symptoms = Arc::new(Mutex::new(SymptomStore::new()));
    let metrics = Arc::new(Mutex::new(MetricStore::new()));
    let settings_store = Arc::new(Mutex::new(SettingsStore::new(settings)));
    let queue = Arc::new(Mutex::new(ChangeQueue::new()));

    let status = Arc::new(StatusPublisher::new(SyncStatus::Offline));
    let coordinator = Arc::new(Coordinator::new(
        symptoms.clone(),
        metrics.clone(),
        settings_store.clone(),
        queue.clone(),
        local.clone(),
        status.clone(),
    ));
    coordinator.load_from_local_store().unwrap();

    let engine = SyncEngine::new(
        symptoms.clone(),
        metrics.clone(),
        settings_store,
        queue.clone(),
        local.clone(),
        remote,
        status,
        SyncEngineConfig { remote_loop_wait: std::time::Duration::from_secs(5), pull_overlap_seconds: 30 },
    );

    Harness { coordinator, engine, symptoms, metrics, queue, local }
}

#[tokio::test]
async fn unconfigured_client_never_calls_the_network() {
    let dir = tempfile::tempdir().unwrap();
    let h = harness(Settings::default(), Arc::new(FakeRemote::new()), dir.path());

    let symptom = h.symptoms.lock().unwrap().add("Headache".to_string(), vec![], Utc::now());
    h.coordinator.handle_symptom_event(SymptomEvent::Added { id: symptom.id.clone() });

    h.engine.tick().await;
    assert_eq!(h.queue.lock().unwrap().len(), 1, "the change stays queued, not dropped");
}

#[tokio::test]
async fn add_then_delete_before_sync_never_touches_the_network() {
    let dir = tempfile::tempdir().unwrap();
    let remote = Arc::new(FakeRemote::new());
    let h = harness(configured_settings(), remote.clone(), dir.path());

    let symptom = h.symptoms.lock().unwrap().add("Headache".to_string(), vec![], Utc::now());
    h.coordinator.handle_symptom_event(SymptomEvent::Added { id: symptom.id.clone() });
    h.symptoms.lock().unwrap().delete(&symptom.id);
    h.coordinator.handle_symptom_event(SymptomEvent::Deleted { id: symptom.id.clone() });

    assert!(h.queue.lock().unwrap().is_empty(), "add+delete before sync must cancel out");

    h.engine.tick().await;
    assert!(remote.symptoms.lock().unwrap().is_empty(), "no create call for a symptom that never synced");
}

#[tokio::test]
async fn queue_holds_at_most_one_entry_per_entity_across_repeated_edits() {
    let dir = tempfile::tempdir().unwrap();
    let h = harness(Settings::default(), Arc::new(FakeRemote::new()), dir.path());

    let symptom = h.symptoms.lock().unwrap().add("Headache".to_string(), vec![], Utc::now());
    h.coordinator.handle_symptom_event(SymptomEvent::Added { id: symptom.id.clone() });
    for _ in 0..5 {
        h.symptoms
            .lock()
            .unwrap()
            .update(&symptom.id, "Migraine".to_string(), vec![], Utc::now())
            .unwrap();
        h.coordinator.handle_symptom_event(SymptomEvent::Updated { id: symptom.id.clone() });
    }

    assert_eq!(h.queue.lock().unwrap().len(), 1);
    assert!(matches!(
        h.queue.lock().unwrap().get(&symptom.id),
        Some(ChangeToPush::AddSymptom { .. })
    ));
}

#[tokio::test]
async fn pulled_data_never_reenters_the_push_queue() {
    let dir = tempfile::tempdir().unwrap();
    let remote = Arc::new(FakeRemote::new());
    let pulled = Symptom::new("sym_remote".to_string(), "nausea".to_string(), vec![], Utc::now());
    remote.symptoms.lock().unwrap().insert(pulled.id.clone(), pulled.clone());

    let h = harness(configured_settings(), remote, dir.path());
    h.engine.tick().await;

    assert_eq!(h.symptoms.lock().unwrap().get(&pulled.id), Some(&pulled));
    assert!(h.queue.lock().unwrap().is_empty(), "a pull must never produce a push");
    assert_eq!(h.local.load_symptoms().unwrap(), vec![pulled], "pull still persists locally");
}

#[tokio::test]
async fn last_write_wins_converges_regardless_of_pull_order() {
    let dir = tempfile::tempdir().unwrap();
    let t0 = Utc::now();
    let t1 = t0 + chrono::Duration::seconds(30);

    let remote = Arc::new(FakeRemote::new());
    let mut newer = Symptom::new("sym_a".to_string(), "migraine".to_string(), vec![], t1);
    newer.last_modified = t1;
    remote.symptoms.lock().unwrap().insert(newer.id.clone(), newer.clone());

    let h = harness(configured_settings(), remote, dir.path());
    let mut older = Symptom::new("sym_a".to_string(), "headache".to_string(), vec![], t0);
    older.last_modified = t0;
    h.symptoms.lock().unwrap().add_pulled_data(vec![older]);

    h.engine.tick().await;

    assert_eq!(h.symptoms.lock().unwrap().get("sym_a").unwrap().name, "migraine");
}

#[tokio::test]
async fn deleting_a_metric_the_server_already_forgot_still_converges() {
    let dir = tempfile::tempdir().unwrap();
    let h = harness(configured_settings(), Arc::new(FakeRemote::new()), dir.path());

    h.metrics.lock().unwrap().initialize(vec![]).ok();
    let ghost_id = "met_ghost".to_string();
    h.queue
        .lock()
        .unwrap()
        .enqueue(ChangeToPush::DeleteMetric { id: ghost_id.clone(), deletion_date: Utc::now() });

    h.engine.tick().await;

    assert!(h.queue.lock().unwrap().get(&ghost_id).is_none());
    assert_eq!(h.local.load_changes_to_push().unwrap(), Vec::new());
}

#[tokio::test]
async fn full_round_trip_add_sync_then_restart_loads_from_local_store() {
    let dir = tempfile::tempdir().unwrap();
    let remote = Arc::new(FakeRemote::new());

    {
        let h = harness(configured_settings(), remote.clone(), dir.path());
        let symptom = h.symptoms.lock().unwrap().add("Headache".to_string(), vec![], Utc::now());
        h.coordinator.handle_symptom_event(SymptomEvent::Added { id: symptom.id.clone() });
        h.engine.tick().await;
        assert!(remote.symptoms.lock().unwrap().contains_key(&symptom.id));
        assert!(h.queue.lock().unwrap().is_empty());
    }

    // Simulate a process restart: a fresh Coordinator reading the same
    // on-disk store must see the symptom that was persisted before exit.
    let kv = SqliteKeyValueStore::new(dir.path().join("healthsync.db")).unwrap();
    let local = Arc::new(LocalStore::new(Box::new(kv)));
    let symptoms = Arc::new(Mutex::new(SymptomStore::new()));
    let coordinator = Coordinator::new(
        symptoms.clone(),
        Arc::new(Mutex::new(MetricStore::new())),
        Arc::new(Mutex::new(SettingsStore::new(Settings::default()))),
        Arc::new(Mutex::new(ChangeQueue::new())),
        local,
        Arc::new(StatusPublisher::new(SyncStatus::Offline)),
    );
    coordinator.load_from_local_store().unwrap();

    assert_eq!(symptoms.lock().unwrap().get_all().len(), 1);
}

#[tokio::test]
async fn metric_lifecycle_through_coordinator_and_engine() {
    let dir = tempfile::tempdir().unwrap();
    let remote = Arc::new(FakeRemote::new());
    let h = harness(configured_settings(), remote.clone(), dir.path());

    let symptom = h.symptoms.lock().unwrap().add("Headache".to_string(), vec![], Utc::now());
    h.coordinator.handle_symptom_event(SymptomEvent::Added { id: symptom.id.clone() });

    let metric = h.metrics.lock().unwrap().add(
        symptom.id.clone(),
        Intensity::High,
        Utc::now(),
        "after lunch".to_string(),
        Utc::now(),
    );
    h.coordinator.handle_metric_event(MetricEvent::Added { id: metric.id.clone() });

    h.engine.tick().await;

    assert!(remote.symptoms.lock().unwrap().contains_key(&symptom.id));
    assert!(remote.metrics.lock().unwrap().contains_key(&metric.id));
    assert!(h.queue.lock().unwrap().is_empty());

    h.metrics.lock().unwrap().delete(&metric.id);
    h.coordinator.handle_metric_event(MetricEvent::Deleted { id: metric.id.clone() });
    h.engine.tick().await;

    assert!(!remote.metrics.lock().unwrap().contains_key(&metric.id));
    assert!(h.queue.lock().unwrap().is_empty());
}
