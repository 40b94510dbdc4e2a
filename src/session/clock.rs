use std::sync::Arc;

use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tokio::time::{self, Duration, MissedTickBehavior};

use crate::events::{UiEvent, UiSink};

use super::state::SessionState;

const CLOCK_TICK_MS: u64 = 1000;

/// `MM:SS`, zero-padded, minutes unbounded (90 minutes shows as `90:00`).
pub fn format_elapsed(total_secs: u64) -> String {
    format!("{:02}:{:02}", total_secs / 60, total_secs % 60)
}

/// Spawn the perpetual session clock. One task lives for the whole process
/// and checks for a session anchor each cycle; start/stop only changes what
/// the tick reads, never the timer itself, so rapid start/stop cannot leak
/// or duplicate tickers.
pub fn spawn_clock(state: Arc<Mutex<SessionState>>, sink: Arc<dyn UiSink>) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = time::interval(Duration::from_millis(CLOCK_TICK_MS));
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            ticker.tick().await;

            let elapsed = {
                let state = state.lock().await;
                state.elapsed_secs()
            };

            let display = match elapsed {
                Some(secs) => format_elapsed(secs),
                None => format_elapsed(0),
            };

            sink.emit(UiEvent::SessionClock { elapsed: display });
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::MemorySink;
    use chrono::Utc;
    use tokio::time::Instant;

    #[test]
    fn elapsed_formats_with_unbounded_minutes() {
        assert_eq!(format_elapsed(0), "00:00");
        assert_eq!(format_elapsed(9), "00:09");
        assert_eq!(format_elapsed(65), "01:05");
        assert_eq!(format_elapsed(3600), "60:00");
        assert_eq!(format_elapsed(6154), "102:34");
    }

    #[tokio::test(start_paused = true)]
    async fn clock_shows_zero_while_idle_and_elapsed_while_running() {
        let state = Arc::new(Mutex::new(SessionState::new()));
        let sink = Arc::new(MemorySink::new());
        let handle = spawn_clock(state.clone(), sink.clone());

        tokio::time::sleep(Duration::from_millis(1100)).await;
        tokio::task::yield_now().await;
        assert!(sink
            .events()
            .contains(&UiEvent::SessionClock { elapsed: "00:00".into() }));

        state.lock().await.begin(Utc::now(), Instant::now());
        tokio::time::sleep(Duration::from_millis(2100)).await;
        tokio::task::yield_now().await;

        let ticks: Vec<_> = sink
            .events()
            .into_iter()
            .filter_map(|e| match e {
                UiEvent::SessionClock { elapsed } => Some(elapsed),
                _ => None,
            })
            .collect();
        assert!(ticks.iter().any(|t| t != "00:00"));

        // Stopping flips the display back to zero on the next cycle; the
        // ticker itself keeps running.
        state.lock().await.finish();
        tokio::time::sleep(Duration::from_millis(1100)).await;
        tokio::task::yield_now().await;
        assert_eq!(
            sink.events()
                .iter()
                .rev()
                .find_map(|e| match e {
                    UiEvent::SessionClock { elapsed } => Some(elapsed.clone()),
                    _ => None,
                }),
            Some("00:00".to_string())
        );

        handle.abort();
    }
}
