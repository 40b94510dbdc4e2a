use std::sync::Arc;

use chrono::Utc;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tokio::time::Instant;

use crate::alert::Alerter;
use crate::audio::AudioEngineHandle;
use crate::backend::{
    BackendError, BackendResult, CameraPreview, DetectorClient, StartAck, StatusSnapshot,
    DROWSY_LABEL,
};
use crate::events::{ControlsChanged, FeedSource, StatusUpdate, UiEvent, UiSink, UploadShown};
use crate::notify::Notifier;
use crate::stats::SessionStats;

use super::clock::spawn_clock;
use super::poller::PollerHandle;
use super::state::{SessionMode, SessionState};

const LIVE_SOURCE: &str = "Live";
const UPLOAD_SOURCE: &str = "Image Analysis";

#[derive(Default)]
struct Busy {
    command: bool,
    upload: bool,
}

/// Orchestrates the monitoring session: remote start/stop, the status
/// poller, the perpetual clock, metric aggregation, and the alert path.
/// All session mutation funnels through here; the display layer only ever
/// sees events.
#[derive(Clone)]
pub struct SessionController {
    state: Arc<Mutex<SessionState>>,
    stats: SessionStats,
    backend: Arc<dyn DetectorClient>,
    sink: Arc<dyn UiSink>,
    notifier: Notifier,
    alerter: Alerter,
    poller: Arc<Mutex<PollerHandle>>,
    clock: Arc<Mutex<Option<JoinHandle<()>>>>,
}

impl SessionController {
    pub fn new(backend: Arc<dyn DetectorClient>, sink: Arc<dyn UiSink>) -> Self {
        let state = Arc::new(Mutex::new(SessionState::new()));
        let audio = AudioEngineHandle::new();

        // One clock task for the process lifetime. It reads the session
        // anchor each cycle, so start/stop never create or destroy timers.
        let clock = spawn_clock(Arc::clone(&state), Arc::clone(&sink));

        Self {
            state,
            stats: SessionStats::new(),
            backend,
            sink: Arc::clone(&sink),
            notifier: Notifier::new(Arc::clone(&sink)),
            alerter: Alerter::new(sink, audio),
            poller: Arc::new(Mutex::new(PollerHandle::new())),
            clock: Arc::new(Mutex::new(Some(clock))),
        }
    }

    pub(crate) fn backend(&self) -> &Arc<dyn DetectorClient> {
        &self.backend
    }

    pub fn notifier(&self) -> &Notifier {
        &self.notifier
    }

    pub fn alerter(&self) -> &Alerter {
        &self.alerter
    }

    pub fn stats(&self) -> &SessionStats {
        &self.stats
    }

    pub async fn current_state(&self) -> SessionState {
        self.state.lock().await.clone()
    }

    /// Start a session. Idempotent from the backend's point of view: an
    /// "already running" ack still puts this client into Running. Every
    /// exit path re-emits control state so a failed call can never leave
    /// the start control stuck busy.
    pub async fn start_session(&self, camera_index: u32) -> SessionState {
        self.set_command_busy(true).await;

        match self.backend.start_detection(camera_index).await {
            Ok(ack) => {
                if ack == StartAck::AlreadyRunning {
                    log::info!("backend reports detection already running");
                }

                let epoch = {
                    let mut state = self.state.lock().await;
                    state.begin(Utc::now(), Instant::now())
                };
                self.stats.reset().await;

                self.sink.emit(UiEvent::SessionStateChanged {
                    mode: SessionMode::Running,
                });
                self.sink.emit(UiEvent::StatsUpdate(self.stats.snapshot().await));
                self.sink.emit(UiEvent::FeedChanged(FeedSource::Live {
                    url: self.backend.live_feed_url(),
                }));

                self.poller.lock().await.start(self.clone(), epoch);

                self.notifier.success("Detection started successfully!").await;
                log::info!("session started (epoch {epoch})");
            }
            Err(err) => {
                log::error!("failed to start detection: {err}");
                // A response that parsed but wasn't a success ack reads
                // differently from not reaching the backend at all.
                let message = match err {
                    BackendError::UnexpectedResponse(_) => "Failed to start detection",
                    BackendError::Transport(_) => "Error starting detection",
                };
                self.notifier.error(message).await;
            }
        }

        self.set_command_busy(false).await;
        self.current_state().await
    }

    /// Stop the session. On failure the mode is left unchanged and the stop
    /// control stays enabled so the user can retry.
    pub async fn stop_session(&self) -> SessionState {
        self.set_command_busy(true).await;

        match self.backend.stop_detection().await {
            Ok(()) => {
                {
                    let mut state = self.state.lock().await;
                    state.finish();
                }

                // In-flight status fetches finish in the background; their
                // results carry a dead epoch and are discarded on delivery.
                self.poller.lock().await.stop();

                self.sink.emit(UiEvent::SessionStateChanged {
                    mode: SessionMode::Idle,
                });
                self.sink.emit(UiEvent::FeedChanged(FeedSource::Placeholder));

                self.notifier.info("Detection stopped").await;
                log::info!("session stopped");
            }
            Err(err) => {
                log::error!("failed to stop detection: {err}");
                self.notifier.error("Error stopping detection").await;
            }
        }

        self.set_command_busy(false).await;
        self.current_state().await
    }

    /// React to one polled snapshot. Stale deliveries (mode changed or the
    /// session restarted since the fetch was issued) are dropped whole;
    /// otherwise the display update, aggregation, and alert check happen as
    /// one synchronous sequence.
    pub async fn apply_snapshot(&self, epoch: u64, snapshot: StatusSnapshot) {
        // The session lock is held for the whole reaction. A stop that
        // lands mid-application would otherwise slip in between the
        // staleness check and the stats/alert updates, leaving a
        // half-applied snapshot: a result is applied whole or dropped
        // whole, never partially.
        let state = self.state.lock().await;
        if !state.accepts(epoch) {
            log::debug!(
                "discarding stale status snapshot (epoch {epoch}, current {})",
                state.epoch
            );
            return;
        }

        self.sink.emit(UiEvent::StatusUpdate(StatusUpdate {
            source: LIVE_SOURCE.to_string(),
            is_detecting: snapshot.is_detecting,
            state: snapshot.status.clone(),
            confidence: snapshot.confidence,
        }));

        self.stats
            .record_reading(snapshot.is_detecting, snapshot.confidence)
            .await;

        let drowsy = snapshot.is_detecting && snapshot.status == DROWSY_LABEL;
        if drowsy {
            self.stats.register_drowsiness_event().await;
        }

        self.sink.emit(UiEvent::StatsUpdate(self.stats.snapshot().await));

        if drowsy {
            self.alerter.trigger().await;
        }
    }

    /// One-shot image analysis, independent of the session. A drowsy result
    /// increments the shared counter and fires the full alert path even
    /// with no session running.
    pub async fn analyze_image(&self, bytes: Vec<u8>, file_name: String) {
        self.set_upload_busy(true).await;

        match self.backend.upload_image(bytes, file_name).await {
            Ok(outcome) if outcome.success => {
                if let Some(image) = &outcome.processed_image {
                    self.sink.emit(UiEvent::FeedChanged(FeedSource::UploadPreview {
                        image: image.clone(),
                    }));
                }

                self.sink.emit(UiEvent::StatusUpdate(StatusUpdate {
                    source: UPLOAD_SOURCE.to_string(),
                    is_detecting: false,
                    state: outcome.status.clone(),
                    confidence: outcome.confidence,
                }));
                self.sink.emit(UiEvent::UploadResult(UploadShown {
                    state: outcome.status.clone(),
                    confidence: outcome.confidence,
                    is_drowsy: outcome.is_drowsy,
                }));

                if outcome.is_drowsy {
                    self.stats.register_drowsiness_event().await;
                    self.sink.emit(UiEvent::StatsUpdate(self.stats.snapshot().await));
                    self.alerter.trigger().await;
                }

                self.notifier.success("Image processed successfully!").await;
            }
            Ok(outcome) => {
                let message = outcome
                    .error
                    .unwrap_or_else(|| "Error processing image".to_string());
                self.notifier.error(message).await;
            }
            Err(err) => {
                log::error!("failed to upload image: {err}");
                self.notifier.error("Error uploading image").await;
            }
        }

        self.set_upload_busy(false).await;
    }

    /// Single-frame preview for camera selection. No session state changes.
    pub async fn preview_camera(&self, camera_index: u32) -> BackendResult<CameraPreview> {
        match self.backend.camera_preview(camera_index).await {
            Ok(preview) => Ok(preview),
            Err(err) => {
                log::warn!("camera preview failed: {err}");
                self.notifier
                    .error(format!("Could not preview camera {camera_index}"))
                    .await;
                Err(err)
            }
        }
    }

    /// Hide the alert modal. Closing it does not stop the session.
    pub async fn close_alert(&self) {
        self.alerter.dismiss().await;
    }

    pub async fn dismiss_notification(&self, id: uuid::Uuid) {
        self.notifier.dismiss(id).await;
    }

    async fn set_command_busy(&self, busy: bool) {
        self.emit_controls(Busy {
            command: busy,
            upload: false,
        })
        .await;
    }

    async fn set_upload_busy(&self, busy: bool) {
        self.emit_controls(Busy {
            command: false,
            upload: busy,
        })
        .await;
    }

    async fn emit_controls(&self, busy: Busy) {
        let mode = self.state.lock().await.mode;
        self.sink.emit(UiEvent::ControlsChanged(ControlsChanged {
            start_enabled: mode == SessionMode::Idle && !busy.command,
            stop_enabled: mode == SessionMode::Running && !busy.command,
            upload_enabled: !busy.upload,
        }));
    }

    /// Abort the perpetual clock. Only used on shutdown.
    pub async fn shutdown(&self) {
        if let Some(clock) = self.clock.lock().await.take() {
            clock.abort();
        }
        self.poller.lock().await.stop();
    }
}
