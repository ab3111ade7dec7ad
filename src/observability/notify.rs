//! Webhook notifications for broadcast outcomes.
//!
//! Posts `{"text": ...}` bodies, the shape Slack and Discord-compatible
//! incoming webhooks accept. Delivery failures are logged and dropped.

use std::time::Duration;

use serde_json::json;

/// Sends outcome messages to a webhook.
#[derive(Debug, Clone)]
pub struct WebhookNotifier {
    http: reqwest::Client,
    url: url::Url,
    timeout_duration: Duration,
}

impl WebhookNotifier {
    /// Create a notifier; fails only on an unparsable URL.
    pub fn new(url: &str, timeout_secs: u64) -> Result<Self, url::ParseError> {
        Ok(Self {
            http: reqwest::Client::new(),
            url: url.parse()?,
            timeout_duration: Duration::from_secs(timeout_secs),
        })
    }

    /// Deliver one message. Never fails the caller.
    pub async fn notify(&self, text: &str) {
        let request = self
            .http
            .post(self.url.clone())
            .timeout(self.timeout_duration)
            .json(&json!({ "text": text }));

        match request.send().await.and_then(|r| r.error_for_status()) {
            Ok(_) => tracing::debug!("Webhook notification delivered"),
            Err(e) => tracing::warn!(error = %e, "Webhook notification failed"),
        }
    }
}
