//! Out-of-band deployment notifications.
//!
//! Every browser session shares one channel; completions for other users'
//! operations arrive on it too, so consumers filter by originating user.

use futures::stream::{BoxStream, StreamExt};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::sync::broadcast;
use tokio_stream::wrappers::errors::BroadcastStreamRecvError;
use tokio_stream::wrappers::BroadcastStream;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeploymentStatus {
    Succeeded,
    Failed,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeploymentNotification {
    pub originating_user_id: String,
    pub status: DeploymentStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    /// Backend job this completes, when the publisher includes it.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub job_id: Option<String>,
}

impl DeploymentNotification {
    pub fn succeeded(user_id: impl Into<String>, message: Option<String>) -> Self {
        Self {
            originating_user_id: user_id.into(),
            status: DeploymentStatus::Succeeded,
            message,
            job_id: None,
        }
    }

    pub fn failed(user_id: impl Into<String>, message: Option<String>) -> Self {
        Self {
            originating_user_id: user_id.into(),
            status: DeploymentStatus::Failed,
            message,
            job_id: None,
        }
    }

    pub fn with_job(mut self, job_id: impl Into<String>) -> Self {
        self.job_id = Some(job_id.into());
        self
    }
}

/// Errors on the channel itself. Logged, never shown to the user.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ChannelError {
    #[error("notification subscriber lagged, {0} messages dropped")]
    Lagged(u64),
    #[error("notification channel error: {0}")]
    Transport(String),
}

pub type NotificationStream = BoxStream<'static, Result<DeploymentNotification, ChannelError>>;

/// A subscribable source of deployment notifications.
pub trait NotificationChannel: Send + Sync {
    fn subscribe(&self) -> NotificationStream;
}

// ---------------------------------------------------------------------------
// DeploymentEvents
// ---------------------------------------------------------------------------

/// In-process broadcast hub.
#[derive(Debug, Clone)]
pub struct DeploymentEvents {
    tx: broadcast::Sender<DeploymentNotification>,
}

impl Default for DeploymentEvents {
    fn default() -> Self {
        Self::new(64)
    }
}

impl DeploymentEvents {
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity);
        Self { tx }
    }

    /// Publish to every current subscriber. Returns how many received it.
    pub fn publish(&self, notification: DeploymentNotification) -> usize {
        self.tx.send(notification).unwrap_or(0)
    }

    pub fn subscriber_count(&self) -> usize {
        self.tx.receiver_count()
    }
}

impl NotificationChannel for DeploymentEvents {
    fn subscribe(&self) -> NotificationStream {
        BroadcastStream::new(self.tx.subscribe())
            .map(|msg| msg.map_err(|BroadcastStreamRecvError::Lagged(n)| ChannelError::Lagged(n)))
            .boxed()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn subscribers_receive_published_notifications() {
        let events = DeploymentEvents::default();
        let mut stream = events.subscribe();
        assert_eq!(events.subscriber_count(), 1);

        events.publish(DeploymentNotification::succeeded("005A", Some("done".into())));
        let got = stream.next().await.unwrap().unwrap();
        assert_eq!(got.status, DeploymentStatus::Succeeded);
        assert_eq!(got.message.as_deref(), Some("done"));
    }

    #[tokio::test]
    async fn lag_surfaces_as_channel_error() {
        let events = DeploymentEvents::new(1);
        let mut stream = events.subscribe();
        events.publish(DeploymentNotification::failed("005A", None));
        events.publish(DeploymentNotification::failed("005A", None));
        assert!(matches!(
            stream.next().await,
            Some(Err(ChannelError::Lagged(1)))
        ));
        assert!(stream.next().await.unwrap().is_ok());
    }

    #[test]
    fn publish_without_subscribers_is_harmless() {
        let events = DeploymentEvents::default();
        assert_eq!(events.publish(DeploymentNotification::failed("x", None)), 0);
    }

    #[test]
    fn wire_shape() {
        let json = r#"{"originatingUserId":"005A","status":"failed","message":"boom"}"#;
        let n: DeploymentNotification = serde_json::from_str(json).unwrap();
        assert_eq!(n.status, DeploymentStatus::Failed);
        assert_eq!(n.job_id, None);
    }
}
