//! MonitoringEngine - the collect → evaluate → alert → persist loop
//!
//! ## Cycle
//!
//! ```text
//! for collector in collectors:             (registration order)
//!     metrics = collector.collect()        (error → log, next collector)
//!     for metric in metrics:               (collector order)
//!         evaluate(metric)                 (value > threshold → alert every channel)
//!         for storage in storage_backends: (registration order)
//!             storage.save(metric)
//! ```
//!
//! Everything inside a cycle is awaited one call at a time; the engine never
//! spawns work for a cycle. A slow collector, channel or backend therefore
//! delays the whole cycle, as no call has a timeout.
//!
//! ## Lifecycle
//!
//! `Idle` until [`MonitoringEngine::start`] (or [`MonitoringEngine::run_until`]) is
//! called, `Running` while cycles repeat, `Stopped` once the shutdown signal was
//! observed or [`MonitoringEngine::stop`] was called. A cycle in flight always
//! completes; either shutdown path then cuts the following sleep short, so the
//! loop ends without waiting out the interval.

use std::future::Future;
use std::time::Duration;

use tokio::sync::{oneshot, watch};
use tokio::task::JoinHandle;
use tracing::{debug, error, info, instrument, warn};

use crate::Metric;
use crate::alerts::{AlertChannel, Severity, threshold_message};
use crate::collector::Collector;
use crate::config::{Config, ConfigError, ResolvedConfig};
use crate::storage::Storage;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EngineState {
    Idle,
    Running,
    Stopped,
}

/// What happened during one [`MonitoringEngine::run_once`]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CycleSummary {
    /// Metrics returned by all collectors
    pub collected: usize,

    /// Threshold breaches (each one fanned out to every channel)
    pub alerts: usize,

    /// Collectors whose `collect` returned an error
    pub failed_collectors: usize,

    /// Individual channel deliveries that returned an error
    pub failed_alerts: usize,
}

pub struct MonitoringEngine {
    config: ResolvedConfig,
    collectors: Vec<Box<dyn Collector>>,
    alert_channels: Vec<Box<dyn AlertChannel>>,
    storage_backends: Vec<Box<dyn Storage>>,
    state: watch::Sender<EngineState>,
}

impl MonitoringEngine {
    /// Create an engine with empty registries.
    ///
    /// Fails if the configuration lacks `thresholds` or `interval`, or holds values
    /// that cannot be used.
    pub fn new(config: Config) -> Result<Self, ConfigError> {
        Self::with_resolved(config.resolve()?)
    }

    /// Create an engine from an already resolved configuration.
    ///
    /// The fields of [`ResolvedConfig`] are public, so the values are checked
    /// again here; a zero interval or a non-finite threshold is rejected.
    pub fn with_resolved(config: ResolvedConfig) -> Result<Self, ConfigError> {
        config.validate()?;

        Ok(Self {
            config,
            collectors: Vec::new(),
            alert_channels: Vec::new(),
            storage_backends: Vec::new(),
            state: watch::Sender::new(EngineState::Idle),
        })
    }

    pub fn config(&self) -> &ResolvedConfig {
        &self.config
    }

    pub fn interval(&self) -> Duration {
        self.config.interval
    }

    pub fn register_collector(&mut self, collector: impl Collector + 'static) {
        self.register_boxed_collector(Box::new(collector));
    }

    pub fn register_boxed_collector(&mut self, collector: Box<dyn Collector>) {
        debug!("registered collector {}", collector.name());
        self.collectors.push(collector);
    }

    pub fn register_alerter(&mut self, channel: impl AlertChannel + 'static) {
        self.register_boxed_alerter(Box::new(channel));
    }

    pub fn register_boxed_alerter(&mut self, channel: Box<dyn AlertChannel>) {
        debug!("registered alert channel {}", channel.name());
        self.alert_channels.push(channel);
    }

    pub fn register_storage(&mut self, storage: impl Storage + 'static) {
        self.register_boxed_storage(Box::new(storage));
    }

    pub fn register_boxed_storage(&mut self, storage: Box<dyn Storage>) {
        debug!("registered storage backend {}", storage.name());
        self.storage_backends.push(storage);
    }

    pub fn state(&self) -> EngineState {
        *self.state.borrow()
    }

    pub fn is_running(&self) -> bool {
        self.state() == EngineState::Running
    }

    /// Leave the `Running` state. Calling it in any other state does nothing.
    ///
    /// A running loop wakes from its sleep immediately; a cycle in flight is
    /// finished first.
    pub fn stop(&self) {
        self.state.send_if_modified(|state| {
            if *state == EngineState::Running {
                *state = EngineState::Stopped;
                true
            } else {
                false
            }
        });
    }

    /// Run one full cycle over all registered collectors
    #[instrument(skip(self))]
    pub async fn run_once(&self) -> CycleSummary {
        info!("Starting collection cycle...");
        let mut summary = CycleSummary::default();

        for collector in &self.collectors {
            let metrics = match collector.collect().await {
                Ok(metrics) => metrics,
                Err(e) => {
                    error!("Error collecting metrics from {}: {e:#}", collector.name());
                    summary.failed_collectors += 1;
                    continue;
                }
            };

            summary.collected += metrics.len();

            for metric in &metrics {
                if let Some(failed) = self.evaluate(metric).await {
                    summary.alerts += 1;
                    summary.failed_alerts += failed;
                }
                self.persist(metric).await;
            }
        }

        debug!("cycle finished: {summary:?}");
        summary
    }

    /// Check `metric` against its threshold and alert on a breach.
    ///
    /// Returns the number of failed deliveries if an alert was triggered.
    async fn evaluate(&self, metric: &Metric) -> Option<usize> {
        match self.config.threshold(&metric.name) {
            Some(threshold) if metric.value > threshold => {
                let message = threshold_message(metric, threshold);
                Some(self.trigger_alert(&message, Severity::Critical).await)
            }
            _ => {
                debug!("Metric {} is normal: {:.2}", metric.name, metric.value);
                None
            }
        }
    }

    /// Deliver `message` to every channel in registration order.
    ///
    /// A failing channel is logged and skipped, it does not stop the fan-out.
    async fn trigger_alert(&self, message: &str, severity: Severity) -> usize {
        warn!("{severity} alert: {message}");
        let mut failed = 0;

        for channel in &self.alert_channels {
            if let Err(e) = channel.send_alert(message, severity).await {
                error!("Error sending alert via {}: {e:#}", channel.name());
                failed += 1;
            }
        }

        failed
    }

    async fn persist(&self, metric: &Metric) {
        for storage in &self.storage_backends {
            storage.save(metric).await;
        }
    }

    /// Run cycles until Ctrl+C is received or [`Self::stop`] is called
    pub async fn start(&self) {
        let (listener, interrupted) = spawn_interrupt_listener();

        self.run_until(async move {
            if interrupted.await.is_err() {
                std::future::pending::<()>().await;
            }
        })
        .await;

        listener.abort();
    }

    /// Run cycles until `shutdown` resolves or [`Self::stop`] is called.
    ///
    /// Both are observed once the current cycle has finished.
    pub async fn run_until<F>(&self, shutdown: F)
    where
        F: Future<Output = ()>,
    {
        self.state.send_replace(EngineState::Running);
        let mut state_rx = self.state.subscribe();
        info!(
            "Monitoring started ({} collectors, {} alert channels, {} storage backends, interval {:?})",
            self.collectors.len(),
            self.alert_channels.len(),
            self.storage_backends.len(),
            self.config.interval
        );

        tokio::pin!(shutdown);

        while self.is_running() {
            self.run_once().await;

            tokio::select! {
                biased;

                _ = &mut shutdown => {
                    info!("interrupt received, stopping");
                    self.stop();
                }

                _ = state_rx.wait_for(|state| *state != EngineState::Running) => {}

                _ = tokio::time::sleep(self.config.interval) => {}
            }
        }

        info!("Monitoring stopped.");
    }
}

/// Listen for Ctrl+C on its own task so an interrupt during a cycle is seen once
/// the cycle ends. The task is not tied to the engine and must be aborted by the
/// caller.
fn spawn_interrupt_listener() -> (JoinHandle<()>, oneshot::Receiver<()>) {
    let (tx, rx) = oneshot::channel();

    let listener = tokio::spawn(async move {
        match tokio::signal::ctrl_c().await {
            Ok(()) => {
                let _ = tx.send(());
            }
            Err(e) => error!("unable to listen for Ctrl+C: {e}"),
        }
    });

    (listener, rx)
}
