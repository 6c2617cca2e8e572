pub mod alerts;
pub mod collector;
pub mod config;
pub mod discord;
pub mod engine;
pub mod storage;
pub mod util;

use std::collections::HashMap;
use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Free-form labels attached to a metric (e.g. `host=localhost`)
pub type Tags = HashMap<String, String>;

/// Classification of a metric.
///
/// Nothing in the pipeline branches on this yet, it is carried through to storage
/// and serialization so consumers can tell gauges from counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MetricType {
    #[default]
    Gauge,
    Counter,
}

impl fmt::Display for MetricType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MetricType::Gauge => write!(f, "gauge"),
            MetricType::Counter => write!(f, "counter"),
        }
    }
}

/// A single named measurement taken by a collector.
///
/// The timestamp is the collection time, not the time it gets persisted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Metric {
    pub name: String,
    pub value: f64,
    pub timestamp: DateTime<Utc>,
    #[serde(default)]
    pub tags: Tags,
    #[serde(default)]
    pub metric_type: MetricType,
}

impl Metric {
    /// Create a gauge stamped with the current time and no tags
    pub fn new(name: impl ToString, value: f64) -> Self {
        Self {
            name: name.to_string(),
            value,
            timestamp: Utc::now(),
            tags: Tags::new(),
            metric_type: MetricType::Gauge,
        }
    }

    pub fn with_tag(mut self, key: impl ToString, value: impl ToString) -> Self {
        self.tags.insert(key.to_string(), value.to_string());
        self
    }

    pub fn with_tags(mut self, tags: Tags) -> Self {
        self.tags.extend(tags);
        self
    }

    pub fn with_type(mut self, metric_type: MetricType) -> Self {
        self.metric_type = metric_type;
        self
    }

    pub fn with_timestamp(mut self, timestamp: DateTime<Utc>) -> Self {
        self.timestamp = timestamp;
        self
    }

    /// Collection time as fractional seconds since the Unix epoch
    pub fn epoch_seconds(&self) -> f64 {
        self.timestamp.timestamp_micros() as f64 / 1_000_000.0
    }
}
