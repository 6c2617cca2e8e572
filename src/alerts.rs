use std::fmt;

use anyhow::{Context, Result, bail};
use async_trait::async_trait;
use chrono::Utc;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::{info, instrument};

use crate::Metric;
use crate::config::{Alert, Webhook};
use crate::discord::DiscordAlertChannel;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Info,
    Critical,
}

impl Severity {
    /// Tag printed in front of a console alert
    pub fn prefix(&self) -> &'static str {
        match self {
            Severity::Info => "[INFO]",
            Severity::Critical => "[CRITICAL]",
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Severity::Info => write!(f, "info"),
            Severity::Critical => write!(f, "critical"),
        }
    }
}

/// A sink for alert notifications
///
/// Errors are reported back to the engine, which logs them and moves on to the
/// next channel.
#[async_trait]
pub trait AlertChannel: Send + Sync {
    /// Short name used in logs
    fn name(&self) -> &str;

    async fn send_alert(&self, message: &str, severity: Severity) -> Result<()>;
}

/// Message sent when `metric` is above `threshold`.
///
/// Thresholds keep a trailing `.0` when integral (`80.0`, not `80`), so a
/// threshold written as `90` in the config file renders as `90.0`.
pub fn threshold_message(metric: &Metric, threshold: f64) -> String {
    format!(
        "{} is high: {:.2} (Threshold: {:?})",
        metric.name, metric.value, threshold
    )
}

/// Prints alerts to stdout
#[derive(Debug, Clone, Default)]
pub struct ConsoleAlertChannel;

impl ConsoleAlertChannel {
    pub fn new() -> Self {
        Self
    }

    pub fn format_line(message: &str, severity: Severity) -> String {
        format!("{} ALERT: {}", severity.prefix(), message)
    }
}

#[async_trait]
impl AlertChannel for ConsoleAlertChannel {
    fn name(&self) -> &str {
        "console"
    }

    async fn send_alert(&self, message: &str, severity: Severity) -> Result<()> {
        println!("{}", Self::format_line(message, severity));
        Ok(())
    }
}

/// Posts alerts as JSON to an arbitrary HTTP endpoint
#[derive(Debug, Clone)]
pub struct WebhookAlertChannel {
    client: Client,
    webhook: Webhook,
}

impl WebhookAlertChannel {
    pub fn new(webhook: Webhook) -> Self {
        Self {
            client: Client::new(),
            webhook,
        }
    }
}

#[async_trait]
impl AlertChannel for WebhookAlertChannel {
    fn name(&self) -> &str {
        "webhook"
    }

    #[instrument(skip(self, message))]
    async fn send_alert(&self, message: &str, severity: Severity) -> Result<()> {
        let payload = json!({
            "message": message,
            "severity": severity,
            "timestamp": Utc::now().to_rfc3339()
        });

        let response = self
            .client
            .post(&self.webhook.url)
            .json(&payload)
            .send()
            .await
            .context("failed to send webhook alert")?;

        if !response.status().is_success() {
            bail!("webhook alert failed with status: {}", response.status());
        }

        info!("Successfully sent webhook alert");
        Ok(())
    }
}

/// Build the channel described by one `alerts` entry of the configuration
pub fn channel_from_config(alert: &Alert) -> Box<dyn AlertChannel> {
    match alert {
        Alert::Console => Box::new(ConsoleAlertChannel::new()),
        Alert::Webhook(webhook) => Box::new(WebhookAlertChannel::new(webhook.clone())),
        Alert::Discord(discord) => Box::new(DiscordAlertChannel::new(discord.clone())),
    }
}
