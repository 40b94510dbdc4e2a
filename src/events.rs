use serde::Serialize;
use uuid::Uuid;

use crate::notify::Notification;
use crate::session::SessionMode;
use crate::stats::StatsSnapshot;

/// Which of the three mutually exclusive display slots the feed area shows.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
#[serde(tag = "slot", rename_all = "camelCase")]
pub enum FeedSource {
    Placeholder,
    #[serde(rename_all = "camelCase")]
    Live { url: String },
    #[serde(rename_all = "camelCase")]
    UploadPreview { image: String },
}

#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ControlsChanged {
    pub start_enabled: bool,
    pub stop_enabled: bool,
    pub upload_enabled: bool,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct StatusUpdate {
    /// "Live" for polled snapshots, "Image Analysis" for upload results.
    pub source: String,
    pub is_detecting: bool,
    /// Backend label, rendered literally even when unrecognized.
    pub state: String,
    pub confidence: f64,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct UploadShown {
    pub state: String,
    pub confidence: f64,
    pub is_drowsy: bool,
}

/// Everything the display layer can be told. Payloads are camelCase to match
/// the frontend's conventions; event names are kebab-case.
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(untagged)]
pub enum UiEvent {
    SessionStateChanged { mode: SessionMode },
    ControlsChanged(ControlsChanged),
    StatusUpdate(StatusUpdate),
    StatsUpdate(StatsSnapshot),
    SessionClock { elapsed: String },
    FeedChanged(FeedSource),
    NotificationPosted(Notification),
    NotificationDismissed { id: Uuid },
    AlertModal { visible: bool },
    ViewportFlash { active: bool },
    UploadResult(UploadShown),
}

impl UiEvent {
    pub fn name(&self) -> &'static str {
        match self {
            UiEvent::SessionStateChanged { .. } => "session-state-changed",
            UiEvent::ControlsChanged(_) => "controls-changed",
            UiEvent::StatusUpdate(_) => "status-update",
            UiEvent::StatsUpdate(_) => "stats-update",
            UiEvent::SessionClock { .. } => "session-clock",
            UiEvent::FeedChanged(_) => "feed-changed",
            UiEvent::NotificationPosted(_) => "notification-posted",
            UiEvent::NotificationDismissed { .. } => "notification-dismissed",
            UiEvent::AlertModal { .. } => "alert-modal",
            UiEvent::ViewportFlash { .. } => "viewport-flash",
            UiEvent::UploadResult(_) => "upload-result",
        }
    }
}

/// Output seam to whatever renders the dashboard. The Tauri shell forwards
/// each event to the webview; tests collect them.
pub trait UiSink: Send + Sync {
    fn emit(&self, event: UiEvent);
}

/// Sink for headless runs and unit tests: remembers everything it saw.
#[derive(Default)]
pub struct MemorySink {
    events: std::sync::Mutex<Vec<UiEvent>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<UiEvent> {
        self.events.lock().expect("sink poisoned").clone()
    }
}

impl UiSink for MemorySink {
    fn emit(&self, event: UiEvent) {
        self.events.lock().expect("sink poisoned").push(event);
    }
}

#[cfg(feature = "tauri")]
mod tauri_sink {
    use tauri::Emitter;

    use super::{UiEvent, UiSink};

    /// Forwards controller events to the webview over the Tauri event bus.
    pub struct AppHandleSink {
        handle: tauri::AppHandle,
    }

    impl AppHandleSink {
        pub fn new(handle: tauri::AppHandle) -> Self {
            Self { handle }
        }
    }

    impl UiSink for AppHandleSink {
        fn emit(&self, event: UiEvent) {
            let name = event.name();
            if let Err(err) = self.handle.emit(name, &event) {
                log::warn!("failed to emit {name}: {err}");
            }
        }
    }
}

#[cfg(feature = "tauri")]
pub use tauri_sink::AppHandleSink;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn feed_payloads_use_camel_case() {
        let live = serde_json::to_value(FeedSource::Live {
            url: "http://localhost:5000/video_feed".into(),
        })
        .unwrap();
        assert_eq!(live["slot"], "live");
        assert_eq!(live["url"], "http://localhost:5000/video_feed");

        let preview = serde_json::to_value(FeedSource::UploadPreview {
            image: "data:image/jpeg;base64,abc".into(),
        })
        .unwrap();
        assert_eq!(preview["slot"], "uploadPreview");
    }

    #[test]
    fn event_names_are_stable() {
        let event = UiEvent::ControlsChanged(ControlsChanged {
            start_enabled: true,
            stop_enabled: false,
            upload_enabled: true,
        });
        assert_eq!(event.name(), "controls-changed");

        let payload = serde_json::to_value(&event).unwrap();
        assert_eq!(payload["startEnabled"], true);
        assert_eq!(payload["stopEnabled"], false);
    }
}
