//! Failure tests for the engine
//!
//! These tests verify that failures stay where they happen:
//! - A failing collector does not stop the others
//! - An unreachable alert channel does not stop the others
//! - Metrics are persisted even when alerting fails

use std::sync::Arc;

use pretty_assertions::assert_eq;
use vigil::alerts::WebhookAlertChannel;
use vigil::config::Webhook;
use vigil::storage::memory::MemoryStorage;
use wiremock::matchers::method;
use wiremock::{Mock, MockServer, ResponseTemplate};

use crate::helpers::*;

#[tokio::test]
async fn test_second_collector_runs_after_first_fails() {
    let storage = Arc::new(MemoryStorage::new());
    let mut engine = create_test_engine(&[], 10);
    engine.register_collector(BrokenCollector);
    engine.register_collector(ScriptedCollector::new(&[("survivor", 42.0)]));
    engine.register_storage(storage.clone());

    let summary = engine.run_once().await;

    assert_eq!(summary.failed_collectors, 1);
    let saved = storage.metrics();
    assert_eq!(saved.len(), 1);
    assert_eq!(saved[0].name, "survivor");
    assert_eq!(saved[0].value, 42.0);
}

#[tokio::test]
async fn test_failing_collector_every_cycle_keeps_loop_alive() {
    let storage = Arc::new(MemoryStorage::new());
    let mut engine = create_test_engine(&[], 10);
    engine.register_collector(BrokenCollector);
    engine.register_storage(storage.clone());

    for _ in 0..3 {
        assert_eq!(engine.run_once().await.failed_collectors, 1);
    }
    assert!(storage.is_empty());
}

#[tokio::test]
async fn test_unreachable_webhook_does_not_block_other_channels() {
    let log = CallLog::default();
    let storage = Arc::new(MemoryStorage::new());
    let mut engine = create_test_engine(&[("cpu_usage", 50.0)], 10);
    engine.register_collector(ScriptedCollector::new(&[("cpu_usage", 75.0)]));
    engine.register_alerter(WebhookAlertChannel::new(Webhook {
        url: "http://127.0.0.1:9/alerts".to_string(),
    }));
    engine.register_alerter(RecordingChannel::new("after", &log));
    engine.register_storage(storage.clone());

    let summary = engine.run_once().await;

    assert_eq!(summary.alerts, 1);
    assert_eq!(summary.failed_alerts, 1);
    assert_eq!(
        calls(&log),
        vec!["[CRITICAL] cpu_usage is high: 75.00 (Threshold: 50.0)"]
    );
    assert_eq!(storage.len(), 1);
}

#[tokio::test]
async fn test_webhook_receives_each_breach() {
    let mock_server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200))
        .expect(2)
        .mount(&mock_server)
        .await;

    let mut engine = create_test_engine(&[("cpu_usage", 50.0), ("memory_usage", 50.0)], 10);
    engine.register_collector(ScriptedCollector::new(&[
        ("cpu_usage", 60.0),
        ("memory_usage", 50.0),
        ("memory_usage", 51.0),
    ]));
    engine.register_alerter(WebhookAlertChannel::new(Webhook {
        url: mock_server.uri(),
    }));

    let summary = engine.run_once().await;
    assert_eq!(summary.alerts, 2);
    assert_eq!(summary.failed_alerts, 0);
}
