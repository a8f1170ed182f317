use async_trait::async_trait;
use reqwest::Client;
use serde::Serialize;
use std::time::Duration;

use crate::constants::NOTIFIER_TIMEOUT_SECONDS;
use crate::models::NotificationKind;

/// Fire-and-forget notification delivery. Failures are logged and swallowed;
/// they never become part of the mutation's success contract.
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn send(&self, recipient: i32, kind: NotificationKind, message: &str, link: &str);
}

#[derive(Debug, Serialize, Clone)]
pub struct NotificationPayload {
    pub recipient_id: i32,
    pub kind: NotificationKind,
    pub message: String,
    pub link: String,
}

/// Posts notifications to a webhook endpoint. Delivery runs on a detached
/// task so the relationship mutation's response never waits on it. With no
/// endpoint configured, notifications are logged and dropped.
#[derive(Debug, Clone)]
pub struct WebhookNotifier {
    client: Client,
    endpoint: Option<String>,
}

impl WebhookNotifier {
    pub fn new(endpoint: Option<String>) -> Result<Self, reqwest::Error> {
        let client = Client::builder()
            .timeout(Duration::from_secs(NOTIFIER_TIMEOUT_SECONDS))
            .build()?;
        Ok(Self { client, endpoint })
    }
}

#[async_trait]
impl Notifier for WebhookNotifier {
    async fn send(&self, recipient: i32, kind: NotificationKind, message: &str, link: &str) {
        let payload = NotificationPayload {
            recipient_id: recipient,
            kind,
            message: message.to_string(),
            link: link.to_string(),
        };

        let Some(endpoint) = self.endpoint.clone() else {
            tracing::debug!(
                recipient,
                kind = kind.as_str(),
                "no notifier endpoint configured, dropping notification"
            );
            return;
        };

        let client = self.client.clone();
        tokio::spawn(async move {
            match client.post(&endpoint).json(&payload).send().await {
                Ok(response) if !response.status().is_success() => {
                    tracing::warn!(
                        recipient = payload.recipient_id,
                        status = %response.status(),
                        "notifier endpoint rejected notification"
                    );
                }
                Ok(_) => {}
                Err(err) => {
                    tracing::warn!(
                        recipient = payload.recipient_id,
                        error = %err,
                        "failed to deliver notification"
                    );
                }
            }
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_webhook_notifier_builds_with_and_without_endpoint() {
        assert!(WebhookNotifier::new(Some("http://localhost:9/notify".to_string())).is_ok());
        assert!(WebhookNotifier::new(None).is_ok());
    }
}

#[cfg(test)]
pub use recording::RecordingNotifier;

#[cfg(test)]
mod recording {
    use super::*;
    use std::sync::{Arc, Mutex};

    #[derive(Debug, Clone, PartialEq)]
    pub struct SentNotification {
        pub recipient: i32,
        pub kind: NotificationKind,
        pub message: String,
        pub link: String,
    }

    /// Captures notifications in memory for assertions.
    #[derive(Debug, Clone, Default)]
    pub struct RecordingNotifier {
        sent: Arc<Mutex<Vec<SentNotification>>>,
    }

    impl RecordingNotifier {
        pub fn sent(&self) -> Vec<SentNotification> {
            self.sent.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl Notifier for RecordingNotifier {
        async fn send(&self, recipient: i32, kind: NotificationKind, message: &str, link: &str) {
            self.sent.lock().unwrap().push(SentNotification {
                recipient,
                kind,
                message: message.to_string(),
                link: link.to_string(),
            });
        }
    }
}
