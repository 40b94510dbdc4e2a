mod http;

pub use http::HttpDetectorClient;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Status label the backend uses for an alert-worthy observation. Every
/// other label is informational and rendered literally.
pub const DROWSY_LABEL: &str = "Drowsy";

#[derive(Debug, Error)]
pub enum BackendError {
    #[error("transport failure: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("unexpected response from backend: {0}")]
    UnexpectedResponse(String),
}

pub type BackendResult<T> = Result<T, BackendError>;

/// Acknowledgement of a start command. The backend treats a start while
/// already running as success, so both variants put the session in Running.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StartAck {
    Started,
    AlreadyRunning,
}

/// One polled observation of the detector. Created fresh each tick,
/// consumed synchronously, then discarded.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct StatusSnapshot {
    pub is_detecting: bool,
    /// Open-world label ("Alert", "Drowsy", "Stopped", ...). Unrecognized
    /// labels must flow through to the display without special handling.
    pub status: String,
    pub confidence: f64,
}

/// Result of a one-shot image analysis, independent of any session.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct UploadOutcome {
    pub success: bool,
    #[serde(default)]
    pub processed_image: Option<String>,
    #[serde(default)]
    pub confidence: f64,
    #[serde(default)]
    pub status: String,
    #[serde(default)]
    pub is_drowsy: bool,
    #[serde(default)]
    pub error: Option<String>,
}

/// Single-frame preview from a camera, used for camera selection before a
/// session is started.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct CameraPreview {
    pub preview_image: String,
    pub camera_index: u32,
}

/// The four logical operations of the remote detection backend, plus the
/// camera preview used when picking a device. The transport is an
/// implementation detail behind this seam.
#[async_trait]
pub trait DetectorClient: Send + Sync {
    async fn start_detection(&self, camera_index: u32) -> BackendResult<StartAck>;

    async fn stop_detection(&self) -> BackendResult<()>;

    async fn status(&self) -> BackendResult<StatusSnapshot>;

    async fn upload_image(&self, bytes: Vec<u8>, file_name: String) -> BackendResult<UploadOutcome>;

    async fn camera_preview(&self, camera_index: u32) -> BackendResult<CameraPreview>;

    /// Streamable resource the display layer should point at while a
    /// session is running.
    fn live_feed_url(&self) -> String;
}
