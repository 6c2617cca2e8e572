//! In-memory storage backend (no persistence)
//!
//! Keeps every saved metric in a vector. Useful for tests and for running the
//! engine without a database file. All data is lost on exit.

use std::sync::RwLock;

use async_trait::async_trait;
use tracing::{error, trace};

use super::backend::Storage;
use crate::Metric;

#[derive(Debug, Default)]
pub struct MemoryStorage {
    metrics: RwLock<Vec<Metric>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Copy of everything saved so far, in save order
    pub fn metrics(&self) -> Vec<Metric> {
        self.metrics
            .read()
            .map(|metrics| metrics.clone())
            .unwrap_or_default()
    }

    pub fn len(&self) -> usize {
        self.metrics.read().map(|metrics| metrics.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl Storage for MemoryStorage {
    fn name(&self) -> &str {
        "memory"
    }

    async fn save(&self, metric: &Metric) {
        match self.metrics.write() {
            Ok(mut metrics) => {
                metrics.push(metric.clone());
                trace!("in-memory storage now holds {} metrics", metrics.len());
            }
            Err(e) => error!("in-memory storage poisoned: {e}"),
        }
    }
}
