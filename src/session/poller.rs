use tokio::task::JoinHandle;
use tokio::time::{self, Duration, Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;

use super::controller::SessionController;

const POLL_INTERVAL_MS: u64 = 1000;
const POLL_TIMEOUT_SECS: u64 = 5;

/// Recurring status fetch for one session epoch. A failed or slow tick is
/// logged and the cadence continues; results are delivered with the epoch
/// they were minted under so the controller can drop anything stale.
pub async fn status_loop(controller: SessionController, epoch: u64, cancel_token: CancellationToken) {
    // First fetch lands one full interval after start, not immediately.
    let period = Duration::from_millis(POLL_INTERVAL_MS);
    let mut ticker = time::interval_at(Instant::now() + period, period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            _ = ticker.tick() => {
                let fetch = controller.backend().status();
                match time::timeout(Duration::from_secs(POLL_TIMEOUT_SECS), fetch).await {
                    Ok(Ok(snapshot)) => controller.apply_snapshot(epoch, snapshot).await,
                    Ok(Err(err)) => log::warn!("status poll failed (epoch {epoch}): {err}"),
                    Err(_) => log::warn!("status poll timeout (> {POLL_TIMEOUT_SECS}s, epoch {epoch})"),
                }
            }
            _ = cancel_token.cancelled() => {
                log::info!("status polling shutting down (epoch {epoch})");
                break;
            }
        }
    }
}

/// Owns the polling task for the active session.
pub struct PollerHandle {
    handle: Option<JoinHandle<()>>,
    cancel_token: Option<CancellationToken>,
}

impl PollerHandle {
    pub fn new() -> Self {
        Self {
            handle: None,
            cancel_token: None,
        }
    }

    pub fn start(&mut self, controller: SessionController, epoch: u64) {
        // A leftover loop from a previous session polls for a dead epoch;
        // cancel it before spawning the replacement.
        self.cancel();

        let cancel_token = CancellationToken::new();
        let token_clone = cancel_token.clone();

        let handle = tokio::spawn(status_loop(controller, epoch, token_clone));

        self.handle = Some(handle);
        self.cancel_token = Some(cancel_token);
    }

    fn cancel(&mut self) {
        if let Some(token) = self.cancel_token.take() {
            token.cancel();
        }
    }

    /// Cancel the recurring fetch. An in-flight request is left to finish
    /// in the background; its result carries a stale epoch and is dropped
    /// by the controller on delivery.
    pub fn stop(&mut self) {
        self.cancel();
        self.handle.take();
    }

    pub fn is_active(&self) -> bool {
        self.handle.is_some()
    }
}

impl Default for PollerHandle {
    fn default() -> Self {
        Self::new()
    }
}
