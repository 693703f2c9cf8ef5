//! Live notifier adapters.

use reqwest::Client;

use crate::ports::notifier::{CompatibilityEvent, Notifier, NotifyFuture};

/// Posts compatibility events as JSON to an issue-tracker webhook.
pub struct WebhookNotifier {
    client: Client,
    url: String,
}

impl WebhookNotifier {
    /// Creates a notifier that posts to `url`.
    #[must_use]
    pub fn new(url: impl Into<String>) -> Self {
        Self { client: Client::new(), url: url.into() }
    }
}

impl Notifier for WebhookNotifier {
    fn notify<'a>(&'a self, event: &'a CompatibilityEvent) -> NotifyFuture<'a> {
        Box::pin(async move {
            let response = self.client.post(&self.url).json(event).send().await.map_err(
                |e| -> Box<dyn std::error::Error + Send + Sync> {
                    format!("webhook request failed: {e}").into()
                },
            )?;
            let status = response.status();
            if !status.is_success() {
                let body = response.text().await.unwrap_or_default();
                return Err(format!("webhook rejected event ({}): {body}", status.as_u16()).into());
            }
            tracing::info!(revision = %event.revision, "compatibility event delivered");
            Ok(())
        })
    }
}

/// Fallback used when no webhook is configured: the event only goes to the log.
pub struct LogNotifier;

impl Notifier for LogNotifier {
    fn notify<'a>(&'a self, event: &'a CompatibilityEvent) -> NotifyFuture<'a> {
        Box::pin(async move {
            tracing::warn!(
                revision = %event.revision,
                failed = ?event.failed_units,
                "upstream drift detected; no webhook configured"
            );
            Ok(())
        })
    }
}
