//! Integration tests for the full collect → evaluate → alert → persist pipeline

use std::sync::Arc;
use std::time::Duration;

use pretty_assertions::assert_eq;
use vigil::collector::{CPU_USAGE, MEMORY_USAGE, SimulatedResourceCollector};
use vigil::engine::EngineState;
use vigil::storage::memory::MemoryStorage;

use crate::helpers::*;

#[tokio::test]
async fn test_simulated_metrics_flow_to_storage() {
    let storage = Arc::new(MemoryStorage::new());
    let mut engine = create_test_engine(&[], 10);
    engine.register_collector(SimulatedResourceCollector::with_host("test-host"));
    engine.register_storage(storage.clone());

    let summary = engine.run_once().await;

    assert_eq!(summary.collected, 2);
    let names: Vec<String> = storage.metrics().into_iter().map(|m| m.name).collect();
    assert_eq!(names, vec![CPU_USAGE.to_string(), MEMORY_USAGE.to_string()]);
}

#[tokio::test]
async fn test_threshold_below_simulated_range_always_alerts() {
    // simulated cpu is at least 10 and memory at least 40
    let log = CallLog::default();
    let mut engine = create_test_engine(&[(CPU_USAGE, 5.0), (MEMORY_USAGE, 30.0)], 10);
    engine.register_collector(SimulatedResourceCollector::with_host("test-host"));
    engine.register_alerter(RecordingChannel::new("console", &log));

    let summary = engine.run_once().await;

    assert_eq!(summary.alerts, 2);
    let alerts = calls(&log);
    assert!(alerts[0].starts_with("[CRITICAL] cpu_usage is high: "));
    assert!(alerts[0].ends_with("(Threshold: 5.0)"));
    assert!(alerts[1].starts_with("[CRITICAL] memory_usage is high: "));
    assert!(alerts[1].ends_with("(Threshold: 30.0)"));
}

#[tokio::test]
async fn test_threshold_above_simulated_range_never_alerts() {
    let log = CallLog::default();
    let mut engine = create_test_engine(&[(CPU_USAGE, 90.0), (MEMORY_USAGE, 85.0)], 10);
    engine.register_collector(SimulatedResourceCollector::with_host("test-host"));
    engine.register_alerter(RecordingChannel::new("console", &log));

    for _ in 0..20 {
        assert_eq!(engine.run_once().await.alerts, 0);
    }
    assert!(calls(&log).is_empty());
}

#[tokio::test]
async fn test_storage_fan_out_follows_registration_order() {
    let log = CallLog::default();
    let mut engine = create_test_engine(&[], 10);
    engine.register_collector(ScriptedCollector::new(&[("requests", 3.0)]));
    engine.register_storage(RecordingStorage::new("A", &log));
    engine.register_storage(RecordingStorage::new("B", &log));

    engine.run_once().await;

    assert_eq!(calls(&log), vec!["A.save(requests)", "B.save(requests)"]);
}

#[tokio::test]
async fn test_every_cycle_persists_again() {
    let storage = Arc::new(MemoryStorage::new());
    let mut engine = create_test_engine(&[], 10);
    engine.register_collector(ScriptedCollector::new(&[("a", 1.0), ("b", 2.0)]));
    engine.register_storage(storage.clone());

    for _ in 0..3 {
        engine.run_once().await;
    }

    assert_eq!(storage.len(), 6);
}

#[tokio::test]
async fn test_loop_runs_until_shutdown() {
    let storage = Arc::new(MemoryStorage::new());
    let mut engine = create_test_engine(&[], 10);
    engine.register_collector(ScriptedCollector::new(&[("a", 1.0)]));
    engine.register_storage(storage.clone());

    assert_eq!(engine.state(), EngineState::Idle);
    engine
        .run_until(tokio::time::sleep(Duration::from_millis(60)))
        .await;

    assert_eq!(engine.state(), EngineState::Stopped);
    assert!(storage.len() >= 2, "got {} cycles", storage.len());
}
