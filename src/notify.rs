use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::{Client, StatusCode, Url};
use serde::Serialize;
use tracing::{error, info};

use crate::config::Config;
use crate::http::{self, HttpFailure};

/// Result of a single delivery attempt
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NotifyOutcome {
    Delivered,
    Failed(HttpFailure),
}

impl NotifyOutcome {
    pub fn is_delivered(&self) -> bool {
        matches!(self, NotifyOutcome::Delivered)
    }
}

/// Destination for round reports
///
/// Delivery problems come back as [`NotifyOutcome::Failed`]; an `Err` means
/// the notifier could not even attempt delivery.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn send(&self, content: &str) -> Result<NotifyOutcome>;
}

/// Text message body accepted by WeCom/DingTalk-style webhooks
#[derive(Debug, Serialize, PartialEq, Eq)]
pub struct WebhookPayload<'a> {
    pub msgtype: &'static str,
    pub text: TextContent<'a>,
}

#[derive(Debug, Serialize, PartialEq, Eq)]
pub struct TextContent<'a> {
    pub content: &'a str,
}

impl<'a> WebhookPayload<'a> {
    pub fn text(content: &'a str) -> Self {
        Self {
            msgtype: "text",
            text: TextContent { content },
        }
    }
}

/// Posts reports to a webhook URL, optionally through a proxy
#[derive(Clone)]
pub struct WebhookNotifier {
    http: Client,
    url: String,
}

impl WebhookNotifier {
    pub fn new(config: &Config) -> Result<Self> {
        let http = http::webhook_client(config.webhook_proxy(), config.webhook_timeout()?)?;

        Ok(Self {
            http,
            url: config.webhook.url.clone(),
        })
    }
}

#[async_trait]
impl Notifier for WebhookNotifier {
    async fn send(&self, content: &str) -> Result<NotifyOutcome> {
        let url = Url::parse(&self.url)
            .with_context(|| format!("Invalid webhook url: {}", self.url))?;

        // json() sets Content-Type: application/json
        let result = self
            .http
            .post(url)
            .json(&WebhookPayload::text(content))
            .send()
            .await;

        let outcome = match result {
            Ok(response) if response.status() == StatusCode::OK => NotifyOutcome::Delivered,
            Ok(response) => NotifyOutcome::Failed(HttpFailure::from_status(response.status())),
            Err(e) => NotifyOutcome::Failed(HttpFailure::from_transport(&e)),
        };

        match &outcome {
            NotifyOutcome::Delivered => info!("Notification delivered"),
            NotifyOutcome::Failed(failure) => error!("Failed to deliver notification: {}", failure),
        }

        Ok(outcome)
    }
}
