use anyhow::{Context, Result, bail};
use async_trait::async_trait;
use chrono::Utc;
use reqwest::Client;
use serde::Serialize;
use tracing::{error, info, instrument};

use crate::alerts::{AlertChannel, Severity};
use crate::config::Discord;

const COLOR_CRITICAL: u32 = 15158332; // Red
const COLOR_INFO: u32 = 5793266; // Light blue

#[derive(Debug, Clone, Serialize)]
pub struct Message {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub embeds: Vec<Embed>,
}

#[derive(Debug, Clone, Serialize)]
pub struct Embed {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub color: Option<u32>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub fields: Vec<EmbedField>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct EmbedField {
    pub name: String,
    pub value: String,
    pub inline: bool,
}

#[derive(Default)]
pub struct MessageBuilder {
    content: Option<String>,
    embeds: Vec<Embed>,
}

impl MessageBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn content(mut self, content: impl ToString) -> Self {
        self.content = Some(content.to_string());
        self
    }

    pub fn add_embed(mut self, embed: Embed) -> Self {
        self.embeds.push(embed);
        self
    }

    pub fn build(self) -> Message {
        Message {
            content: self.content,
            embeds: self.embeds,
        }
    }
}

/// Posts alerts to a Discord webhook as a single embed
#[derive(Debug, Clone)]
pub struct DiscordAlertChannel {
    client: Client,
    discord: Discord,
}

impl DiscordAlertChannel {
    pub fn new(discord: Discord) -> Self {
        Self {
            client: Client::new(),
            discord,
        }
    }

    pub fn build_embed(message: &str, severity: Severity) -> Embed {
        let (title, color) = match severity {
            Severity::Critical => ("🔥 Critical Alert", COLOR_CRITICAL),
            Severity::Info => ("ℹ️ Info", COLOR_INFO),
        };

        Embed {
            title: Some(title.to_string()),
            description: Some(message.to_string()),
            color: Some(color),
            fields: vec![EmbedField {
                name: "Severity".to_string(),
                value: severity.to_string(),
                inline: true,
            }],
            timestamp: Some(Utc::now().to_rfc3339()),
        }
    }

    pub fn build_message(&self, message: &str, severity: Severity) -> Message {
        let mut builder = MessageBuilder::new().add_embed(Self::build_embed(message, severity));
        if let Some(user_id) = &self.discord.user_id {
            builder = builder.content(format!("{} <@{user_id}>", severity.prefix()));
        }
        builder.build()
    }
}

#[async_trait]
impl AlertChannel for DiscordAlertChannel {
    fn name(&self) -> &str {
        "discord"
    }

    #[instrument(skip(self, message))]
    async fn send_alert(&self, message: &str, severity: Severity) -> Result<()> {
        let payload = self.build_message(message, severity);

        let response = self
            .client
            .post(&self.discord.url)
            .json(&payload)
            .send()
            .await
            .context("failed to send Discord message")?;

        let status = response.status();
        if !status.is_success() {
            if let Ok(error_text) = response.text().await {
                error!("Discord API error response: {}", error_text);
            }
            bail!("Discord message failed with status: {status}");
        }

        info!("Successfully sent Discord message");
        Ok(())
    }
}
