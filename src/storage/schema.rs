//! Database schema and metric row definitions
//!
//! One row per metric reading:
//!
//! | column    | type    | content                               |
//! |-----------|---------|---------------------------------------|
//! | id        | INTEGER | autoincrement surrogate key           |
//! | timestamp | REAL    | collection time, seconds since epoch  |
//! | name      | TEXT    | metric name                           |
//! | value     | REAL    | metric value                          |
//! | tags      | TEXT    | tags as a JSON object                 |
//!
//! The table is created with `IF NOT EXISTS`; there is no schema versioning.

use serde::{Deserialize, Serialize};

use super::error::StorageResult;
use crate::{Metric, Tags};

pub const CREATE_METRICS_TABLE: &str = r#"
CREATE TABLE IF NOT EXISTS metrics (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    timestamp REAL,
    name TEXT,
    value REAL,
    tags TEXT
)
"#;

pub const INSERT_METRIC: &str =
    "INSERT INTO metrics (timestamp, name, value, tags) VALUES (?, ?, ?, ?)";

/// A metric flattened into the column layout of the `metrics` table
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricRow {
    /// Seconds since the Unix epoch at collection time
    pub timestamp: f64,
    pub name: String,
    pub value: f64,
    /// Tags serialized as a JSON object
    pub tags: String,
}

impl MetricRow {
    pub fn from_metric(metric: &Metric) -> StorageResult<Self> {
        Ok(Self {
            timestamp: metric.epoch_seconds(),
            name: metric.name.clone(),
            value: metric.value,
            tags: serde_json::to_string(&metric.tags)?,
        })
    }

    /// Decode the `tags` column back into a map
    pub fn tags(&self) -> StorageResult<Tags> {
        Ok(serde_json::from_str(&self.tags)?)
    }
}
