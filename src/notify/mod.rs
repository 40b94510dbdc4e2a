use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::sync::Mutex;
use tokio::time::Duration;
use uuid::Uuid;

use crate::events::{UiEvent, UiSink};

const AUTO_DISMISS_MS: u64 = 5000;

#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub enum Severity {
    Info,
    Success,
    Error,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Notification {
    pub id: Uuid,
    pub message: String,
    pub severity: Severity,
    pub created_at: DateTime<Utc>,
}

/// Transient user messages. Each push renders immediately and schedules its
/// own auto-dismissal; manual and automatic dismissal race without harm
/// because dismissal of an already-removed notification is a no-op.
pub struct Notifier {
    sink: Arc<dyn UiSink>,
    active: Arc<Mutex<HashMap<Uuid, Notification>>>,
}

impl Notifier {
    pub fn new(sink: Arc<dyn UiSink>) -> Self {
        Self {
            sink,
            active: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    pub async fn push(&self, message: impl Into<String>, severity: Severity) -> Uuid {
        let notification = Notification {
            id: Uuid::new_v4(),
            message: message.into(),
            severity,
            created_at: Utc::now(),
        };
        let id = notification.id;

        self.active.lock().await.insert(id, notification.clone());
        self.sink.emit(UiEvent::NotificationPosted(notification));

        let this = self.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(AUTO_DISMISS_MS)).await;
            this.dismiss(id).await;
        });

        id
    }

    pub async fn info(&self, message: impl Into<String>) -> Uuid {
        self.push(message, Severity::Info).await
    }

    pub async fn success(&self, message: impl Into<String>) -> Uuid {
        self.push(message, Severity::Success).await
    }

    pub async fn error(&self, message: impl Into<String>) -> Uuid {
        self.push(message, Severity::Error).await
    }

    /// Idempotent: dismissing an unknown or already-dismissed id does
    /// nothing and emits nothing.
    pub async fn dismiss(&self, id: Uuid) {
        let removed = self.active.lock().await.remove(&id);
        if removed.is_some() {
            self.sink.emit(UiEvent::NotificationDismissed { id });
        }
    }

    pub async fn active(&self) -> Vec<Notification> {
        self.active.lock().await.values().cloned().collect()
    }
}

impl Clone for Notifier {
    fn clone(&self) -> Self {
        Self {
            sink: Arc::clone(&self.sink),
            active: Arc::clone(&self.active),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::MemorySink;

    fn notifier() -> (Notifier, Arc<MemorySink>) {
        let sink = Arc::new(MemorySink::new());
        (Notifier::new(sink.clone()), sink)
    }

    #[tokio::test]
    async fn push_renders_immediately() {
        let (notifier, sink) = notifier();
        let id = notifier.success("Detection started successfully!").await;

        assert_eq!(notifier.active().await.len(), 1);
        let events = sink.events();
        assert!(matches!(
            &events[0],
            UiEvent::NotificationPosted(n) if n.id == id && n.severity == Severity::Success
        ));
    }

    #[tokio::test]
    async fn dismiss_is_idempotent() {
        let (notifier, sink) = notifier();
        let id = notifier.info("Detection stopped").await;

        notifier.dismiss(id).await;
        notifier.dismiss(id).await;
        notifier.dismiss(Uuid::new_v4()).await;

        let dismissed: Vec<_> = sink
            .events()
            .into_iter()
            .filter(|e| matches!(e, UiEvent::NotificationDismissed { .. }))
            .collect();
        assert_eq!(dismissed.len(), 1);
        assert!(notifier.active().await.is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn auto_dismissal_fires_after_delay() {
        let (notifier, sink) = notifier();
        let id = notifier.error("Error starting detection").await;

        // Paused clock: this sleep auto-advances past the dismissal timer
        // and lets the spawned task run first.
        tokio::time::sleep(Duration::from_millis(AUTO_DISMISS_MS + 50)).await;
        tokio::task::yield_now().await;

        assert!(notifier.active().await.is_empty());
        assert!(sink
            .events()
            .iter()
            .any(|e| matches!(e, UiEvent::NotificationDismissed { id: d } if *d == id)));
    }

    #[tokio::test]
    async fn identical_messages_are_not_deduplicated() {
        let (notifier, _sink) = notifier();
        notifier.info("same").await;
        notifier.info("same").await;
        assert_eq!(notifier.active().await.len(), 2);
    }
}
