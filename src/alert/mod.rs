use std::sync::Arc;

use tokio::sync::Mutex;
use tokio::time::Duration;

use crate::audio::AudioEngineHandle;
use crate::events::{UiEvent, UiSink};

const FLASH_REVERT_MS: u64 = 2000;

/// Drives the attention-grabbing side of a drowsiness event: modal, tone,
/// and a full-viewport flash that auto-reverts. The modal toggles
/// independently of the session; closing it never touches detection.
pub struct Alerter {
    sink: Arc<dyn UiSink>,
    audio: AudioEngineHandle,
    modal_visible: Arc<Mutex<bool>>,
}

impl Alerter {
    pub fn new(sink: Arc<dyn UiSink>, audio: AudioEngineHandle) -> Self {
        Self {
            sink,
            audio,
            modal_visible: Arc::new(Mutex::new(false)),
        }
    }

    pub async fn trigger(&self) {
        {
            let mut visible = self.modal_visible.lock().await;
            *visible = true;
        }
        self.sink.emit(UiEvent::AlertModal { visible: true });

        // Missing audio capability must not block the visual alert.
        if let Err(err) = self.audio.play_alert() {
            log::debug!("skipping alert tone: {err}");
        }

        self.sink.emit(UiEvent::ViewportFlash { active: true });
        let sink = Arc::clone(&self.sink);
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(FLASH_REVERT_MS)).await;
            sink.emit(UiEvent::ViewportFlash { active: false });
        });
    }

    pub async fn dismiss(&self) {
        let mut visible = self.modal_visible.lock().await;
        if *visible {
            *visible = false;
            self.sink.emit(UiEvent::AlertModal { visible: false });
        }
    }

    pub async fn modal_visible(&self) -> bool {
        *self.modal_visible.lock().await
    }
}

impl Clone for Alerter {
    fn clone(&self) -> Self {
        Self {
            sink: Arc::clone(&self.sink),
            audio: self.audio.clone(),
            modal_visible: Arc::clone(&self.modal_visible),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::MemorySink;

    fn alerter() -> (Alerter, Arc<MemorySink>) {
        let sink = Arc::new(MemorySink::new());
        (
            Alerter::new(sink.clone(), AudioEngineHandle::new()),
            sink,
        )
    }

    #[tokio::test(start_paused = true)]
    async fn trigger_shows_modal_and_reverts_flash() {
        let (alerter, sink) = alerter();
        alerter.trigger().await;
        assert!(alerter.modal_visible().await);

        let events = sink.events();
        assert!(events.contains(&UiEvent::AlertModal { visible: true }));
        assert!(events.contains(&UiEvent::ViewportFlash { active: true }));
        assert!(!events.contains(&UiEvent::ViewportFlash { active: false }));

        tokio::time::sleep(Duration::from_millis(FLASH_REVERT_MS + 50)).await;
        tokio::task::yield_now().await;
        assert!(sink
            .events()
            .contains(&UiEvent::ViewportFlash { active: false }));
        // Flash reverting does not hide the modal.
        assert!(alerter.modal_visible().await);
    }

    #[tokio::test]
    async fn dismiss_is_idempotent() {
        let (alerter, sink) = alerter();
        alerter.trigger().await;
        alerter.dismiss().await;
        alerter.dismiss().await;

        let hidden: Vec<_> = sink
            .events()
            .into_iter()
            .filter(|e| matches!(e, UiEvent::AlertModal { visible: false }))
            .collect();
        assert_eq!(hidden.len(), 1);
        assert!(!alerter.modal_visible().await);
    }
}
