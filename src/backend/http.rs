use std::time::Duration;

use async_trait::async_trait;
use reqwest::multipart;
use serde::Deserialize;

use super::{
    BackendError, BackendResult, CameraPreview, DetectorClient, StartAck, StatusSnapshot,
    UploadOutcome,
};

const REQUEST_TIMEOUT_SECS: u64 = 10;

#[derive(Debug, Deserialize)]
struct StartResponse {
    status: String,
    #[serde(default)]
    #[allow(dead_code)]
    message: Option<String>,
}

#[derive(Debug, Deserialize)]
struct StopResponse {
    status: String,
}

/// HTTP implementation of the detector backend. The service speaks plain
/// JSON over five routes; the upload route takes a multipart form with an
/// `image` field.
pub struct HttpDetectorClient {
    base_url: String,
    http: reqwest::Client,
}

impl HttpDetectorClient {
    pub fn new(base_url: impl Into<String>) -> Self {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()
            .unwrap_or_else(|_| reqwest::Client::new());

        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            http,
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }
}

#[async_trait]
impl DetectorClient for HttpDetectorClient {
    async fn start_detection(&self, camera_index: u32) -> BackendResult<StartAck> {
        let response = self
            .http
            .post(self.url("/start_detection"))
            .query(&[("camera", camera_index)])
            .send()
            .await?;

        let ack: StartResponse = response.json().await?;
        match ack.status.as_str() {
            "started" => Ok(StartAck::Started),
            "already_running" => Ok(StartAck::AlreadyRunning),
            other => Err(BackendError::UnexpectedResponse(format!(
                "start_detection returned status {other:?}"
            ))),
        }
    }

    async fn stop_detection(&self) -> BackendResult<()> {
        let response = self.http.post(self.url("/stop_detection")).send().await?;

        let ack: StopResponse = response.json().await?;
        if ack.status == "stopped" {
            Ok(())
        } else {
            Err(BackendError::UnexpectedResponse(format!(
                "stop_detection returned status {:?}",
                ack.status
            )))
        }
    }

    async fn status(&self) -> BackendResult<StatusSnapshot> {
        let response = self.http.get(self.url("/get_status")).send().await?;
        Ok(response.json().await?)
    }

    async fn upload_image(&self, bytes: Vec<u8>, file_name: String) -> BackendResult<UploadOutcome> {
        let part = multipart::Part::bytes(bytes).file_name(file_name);
        let form = multipart::Form::new().part("image", part);

        let response = self
            .http
            .post(self.url("/upload_image"))
            .multipart(form)
            .send()
            .await?;

        Ok(response.json().await?)
    }

    async fn camera_preview(&self, camera_index: u32) -> BackendResult<CameraPreview> {
        let response = self
            .http
            .get(self.url("/camera_preview"))
            .query(&[("camera", camera_index)])
            .send()
            .await?;

        Ok(response.json().await?)
    }

    fn live_feed_url(&self) -> String {
        self.url("/video_feed")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn base_url_trailing_slash_is_normalized() {
        let client = HttpDetectorClient::new("http://127.0.0.1:5000/");
        assert_eq!(client.url("/get_status"), "http://127.0.0.1:5000/get_status");
        assert_eq!(client.live_feed_url(), "http://127.0.0.1:5000/video_feed");
    }

    #[test]
    fn status_snapshot_decodes_backend_shape() {
        let snapshot: StatusSnapshot = serde_json::from_str(
            r#"{"is_detecting": true, "status": "Alert", "confidence": 0.87}"#,
        )
        .unwrap();
        assert!(snapshot.is_detecting);
        assert_eq!(snapshot.status, "Alert");
        assert!((snapshot.confidence - 0.87).abs() < f64::EPSILON);
    }

    #[test]
    fn upload_outcome_tolerates_error_shape() {
        // Failure responses from the backend carry only an error string.
        let outcome: UploadOutcome =
            serde_json::from_str(r#"{"success": false, "error": "No image uploaded"}"#).unwrap();
        assert!(!outcome.success);
        assert_eq!(outcome.error.as_deref(), Some("No image uploaded"));
        assert_eq!(outcome.confidence, 0.0);
        assert!(!outcome.is_drowsy);
    }
}
