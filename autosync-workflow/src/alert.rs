//! Outbound alert notifications.
//!
//! Alerts are best-effort: the workflow reports what happened but never
//! fails because a notification did not go out. Implementations return a
//! typed error; [`notify_best_effort`] is the call site that downgrades a
//! failure to a warning.

use anyhow::{Context, Result};
use async_trait::async_trait;

/// Outbound notification channel.
#[async_trait]
pub trait Notifier: Send + Sync {
    /// Deliver one alert message.
    async fn send_alert(&self, message: &str) -> Result<()>;
}

/// Posts alerts as JSON to a configured webhook endpoint (a voice/call
/// gateway, a chat hook, anything that accepts `{"message": ...}`).
pub struct WebhookNotifier {
    endpoint: String,
    client: reqwest::Client,
}

impl WebhookNotifier {
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
            client: reqwest::Client::new(),
        }
    }
}

#[async_trait]
impl Notifier for WebhookNotifier {
    async fn send_alert(&self, message: &str) -> Result<()> {
        let payload = serde_json::json!({ "message": message });
        let response = self
            .client
            .post(&self.endpoint)
            .json(&payload)
            .send()
            .await
            .with_context(|| format!("posting alert to {}", self.endpoint))?;

        response
            .error_for_status()
            .with_context(|| format!("alert endpoint {} rejected the message", self.endpoint))?;

        tracing::info!("Alert delivered to {}", self.endpoint);
        Ok(())
    }
}

/// Notifier that only logs; used when no outbound channel is configured.
#[derive(Debug, Default)]
pub struct NullNotifier;

#[async_trait]
impl Notifier for NullNotifier {
    async fn send_alert(&self, message: &str) -> Result<()> {
        tracing::info!("Alert (no outbound channel configured): {message}");
        Ok(())
    }
}

/// Send an alert, logging instead of propagating a failure. Returns whether
/// delivery succeeded.
pub async fn notify_best_effort(notifier: &dyn Notifier, message: &str) -> bool {
    match notifier.send_alert(message).await {
        Ok(()) => true,
        Err(e) => {
            tracing::warn!("Alert delivery failed: {e:#}");
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct FailingNotifier;

    #[async_trait]
    impl Notifier for FailingNotifier {
        async fn send_alert(&self, _message: &str) -> Result<()> {
            anyhow::bail!("gateway unreachable")
        }
    }

    #[tokio::test]
    async fn test_best_effort_swallows_failures() {
        assert!(!notify_best_effort(&FailingNotifier, "engine on fire").await);
        assert!(notify_best_effort(&NullNotifier, "engine fine").await);
    }
}
