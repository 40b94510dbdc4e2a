use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::time::Instant;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub enum SessionMode {
    Idle,
    Running,
}

impl Default for SessionMode {
    fn default() -> Self {
        SessionMode::Idle
    }
}

/// The one logical monitoring session. Mutated only by the controller;
/// everything else observes through events.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionState {
    pub mode: SessionMode,
    pub started_at: Option<DateTime<Utc>>,
    /// Bumped on every mode transition. A poll result minted under an older
    /// epoch is stale and must be discarded on delivery.
    pub epoch: u64,
    #[serde(skip)]
    pub running_anchor: Option<Instant>,
}

impl Default for SessionState {
    fn default() -> Self {
        Self {
            mode: SessionMode::Idle,
            started_at: None,
            epoch: 0,
            running_anchor: None,
        }
    }
}

impl SessionState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Invariant: `started_at` and `running_anchor` are present iff Running.
    pub fn begin(&mut self, started_at: DateTime<Utc>, now: Instant) -> u64 {
        self.mode = SessionMode::Running;
        self.started_at = Some(started_at);
        self.running_anchor = Some(now);
        self.epoch += 1;
        self.epoch
    }

    pub fn finish(&mut self) {
        self.mode = SessionMode::Idle;
        self.started_at = None;
        self.running_anchor = None;
        self.epoch += 1;
    }

    pub fn is_running(&self) -> bool {
        self.mode == SessionMode::Running
    }

    /// Seconds since the session entered Running, `None` while idle.
    pub fn elapsed_secs(&self) -> Option<u64> {
        self.running_anchor.map(|anchor| anchor.elapsed().as_secs())
    }

    /// Whether a result minted under `epoch` may still be applied.
    pub fn accepts(&self, epoch: u64) -> bool {
        self.is_running() && self.epoch == epoch
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn started_at_present_iff_running() {
        let mut state = SessionState::new();
        assert_eq!(state.mode, SessionMode::Idle);
        assert!(state.started_at.is_none());

        let epoch = state.begin(Utc::now(), Instant::now());
        assert!(state.is_running());
        assert!(state.started_at.is_some());
        assert!(state.running_anchor.is_some());
        assert!(state.accepts(epoch));

        state.finish();
        assert_eq!(state.mode, SessionMode::Idle);
        assert!(state.started_at.is_none());
        assert!(state.running_anchor.is_none());
    }

    #[test]
    fn stale_epoch_is_rejected_after_restart() {
        let mut state = SessionState::new();
        let first = state.begin(Utc::now(), Instant::now());
        state.finish();
        assert!(!state.accepts(first));

        let second = state.begin(Utc::now(), Instant::now());
        assert!(state.accepts(second));
        assert!(!state.accepts(first));
    }
}
