//! Metric collectors
//!
//! A collector produces a batch of [`Metric`]s each time the engine asks for one.
//! The engine calls collectors one after another in registration order and treats a
//! returned error as a failure of that collector only.
//!
//! ## Collectors
//!
//! - **SimulatedResourceCollector**: random CPU/memory readings, useful for demos and tests
//! - **SystemResourceCollector**: real CPU/memory readings of the local host via `sysinfo`

use anyhow::{Result, bail};
use async_trait::async_trait;
use rand::Rng;
use sysinfo::System;
use tokio::sync::Mutex;
use tracing::{instrument, trace};

use crate::{Metric, MetricType};

pub const CPU_USAGE: &str = "cpu_usage";
pub const MEMORY_USAGE: &str = "memory_usage";

/// Something that can be asked for metrics on demand
///
/// Implementations must be `Send + Sync` so the engine can hold them as trait
/// objects. The order of the returned metrics is preserved through evaluation
/// and persistence.
#[async_trait]
pub trait Collector: Send + Sync {
    /// Short name used in logs
    fn name(&self) -> &str;

    async fn collect(&self) -> Result<Vec<Metric>>;
}

/// Produces random CPU and memory readings for a fixed host tag
#[derive(Debug, Clone)]
pub struct SimulatedResourceCollector {
    host: String,
}

impl SimulatedResourceCollector {
    pub fn new() -> Self {
        Self::with_host(crate::util::get_host_tag())
    }

    pub fn with_host(host: impl ToString) -> Self {
        Self {
            host: host.to_string(),
        }
    }

    fn sample(&self) -> (f64, f64) {
        let mut rng = rand::rng();
        (rng.random_range(10.0..90.0), rng.random_range(40.0..85.0))
    }
}

impl Default for SimulatedResourceCollector {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Collector for SimulatedResourceCollector {
    fn name(&self) -> &str {
        "simulated_resources"
    }

    async fn collect(&self) -> Result<Vec<Metric>> {
        let (cpu, memory) = self.sample();
        trace!("simulated cpu={cpu:.2} memory={memory:.2}");

        Ok(vec![
            Metric::new(CPU_USAGE, cpu).with_tag("host", &self.host),
            Metric::new(MEMORY_USAGE, memory).with_tag("host", &self.host),
        ])
    }
}

/// Samples CPU and memory usage of the machine the process runs on
pub struct SystemResourceCollector {
    system: Mutex<System>,
    host: String,
}

impl SystemResourceCollector {
    pub fn new() -> Self {
        Self {
            system: Mutex::new(System::new()),
            host: System::host_name().unwrap_or_else(|| String::from("unknown")),
        }
    }
}

impl Default for SystemResourceCollector {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Collector for SystemResourceCollector {
    fn name(&self) -> &str {
        "system_resources"
    }

    #[instrument(skip(self), fields(host = %self.host))]
    async fn collect(&self) -> Result<Vec<Metric>> {
        let mut sys = self.system.lock().await;

        // cpu usage is a delta between two refreshes
        sys.refresh_cpu_usage();
        tokio::time::sleep(sysinfo::MINIMUM_CPU_UPDATE_INTERVAL).await;
        sys.refresh_cpu_usage();
        sys.refresh_memory();

        let total_memory = sys.total_memory();
        if total_memory == 0 {
            bail!("host reported no memory");
        }

        let cpu = f64::from(sys.global_cpu_usage());
        let memory = sys.used_memory() as f64 / total_memory as f64 * 100.0;
        trace!("sampled cpu={cpu:.2} memory={memory:.2}");

        Ok(vec![
            Metric::new(CPU_USAGE, cpu)
                .with_tag("host", &self.host)
                .with_type(MetricType::Gauge),
            Metric::new(MEMORY_USAGE, memory)
                .with_tag("host", &self.host)
                .with_type(MetricType::Gauge),
        ])
    }
}
