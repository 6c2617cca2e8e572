//! Helper functions and recording fakes for integration tests

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use anyhow::{Result, bail};
use async_trait::async_trait;
use vigil::{
    Metric,
    alerts::{AlertChannel, Severity},
    collector::Collector,
    config::{Alert, CollectorConfig, ResolvedConfig, StorageConfig},
    engine::MonitoringEngine,
    storage::Storage,
};

/// Shared, ordered record of every call the fakes receive
pub type CallLog = Arc<Mutex<Vec<String>>>;

pub fn calls(log: &CallLog) -> Vec<String> {
    log.lock().unwrap().clone()
}

pub fn create_test_config(thresholds: &[(&str, f64)], interval_ms: u64) -> ResolvedConfig {
    ResolvedConfig {
        thresholds: thresholds
            .iter()
            .map(|(name, value)| (name.to_string(), *value))
            .collect::<HashMap<_, _>>(),
        interval: Duration::from_millis(interval_ms),
        collectors: vec![CollectorConfig::Simulated],
        alerts: vec![Alert::Console],
        storage: StorageConfig::None,
    }
}

pub fn create_test_engine(thresholds: &[(&str, f64)], interval_ms: u64) -> MonitoringEngine {
    MonitoringEngine::with_resolved(create_test_config(thresholds, interval_ms)).unwrap()
}

/// Returns the same metrics on every call
pub struct ScriptedCollector {
    pub metrics: Vec<(String, f64)>,
}

impl ScriptedCollector {
    pub fn new(metrics: &[(&str, f64)]) -> Self {
        Self {
            metrics: metrics.iter().map(|(n, v)| (n.to_string(), *v)).collect(),
        }
    }
}

#[async_trait]
impl Collector for ScriptedCollector {
    fn name(&self) -> &str {
        "scripted"
    }

    async fn collect(&self) -> Result<Vec<Metric>> {
        Ok(self
            .metrics
            .iter()
            .map(|(name, value)| Metric::new(name, *value).with_tag("env", "test"))
            .collect())
    }
}

pub struct BrokenCollector;

#[async_trait]
impl Collector for BrokenCollector {
    fn name(&self) -> &str {
        "broken"
    }

    async fn collect(&self) -> Result<Vec<Metric>> {
        bail!("collector exploded")
    }
}

pub struct RecordingChannel {
    pub name: String,
    pub log: CallLog,
}

impl RecordingChannel {
    pub fn new(name: &str, log: &CallLog) -> Self {
        Self {
            name: name.to_string(),
            log: log.clone(),
        }
    }
}

#[async_trait]
impl AlertChannel for RecordingChannel {
    fn name(&self) -> &str {
        &self.name
    }

    async fn send_alert(&self, message: &str, severity: Severity) -> Result<()> {
        self.log
            .lock()
            .unwrap()
            .push(format!("{} {}", severity.prefix(), message));
        Ok(())
    }
}

pub struct RecordingStorage {
    pub name: String,
    pub log: CallLog,
}

impl RecordingStorage {
    pub fn new(name: &str, log: &CallLog) -> Self {
        Self {
            name: name.to_string(),
            log: log.clone(),
        }
    }
}

#[async_trait]
impl Storage for RecordingStorage {
    fn name(&self) -> &str {
        &self.name
    }

    async fn save(&self, metric: &Metric) {
        self.log
            .lock()
            .unwrap()
            .push(format!("{}.save({})", self.name, metric.name));
    }
}
