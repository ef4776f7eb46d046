//! Periodic refresh ticker and board-request supersession tokens.

use std::time::Duration;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::debug;

use super::controller::SessionEvent;

/// Default period between automatic board refreshes.
pub const DEFAULT_REFRESH_PERIOD: Duration = Duration::from_secs(5 * 60);

/// Owns refresh timing identity: the most-recent-request token used to
/// decide whether a board completion may still be applied.
///
/// The scheduler holds no board state. Requests are single-flight in effect:
/// issuing a new token supersedes every earlier one, and a superseded
/// completion must be discarded rather than applied.
#[derive(Debug, Default)]
pub struct RefreshScheduler {
    latest: u64,
}

impl RefreshScheduler {
    /// Create a scheduler with no requests issued yet.
    pub fn new() -> Self {
        Self::default()
    }

    /// Issue a new board-request token, superseding all earlier ones.
    pub fn issue(&mut self) -> u64 {
        self.latest += 1;
        self.latest
    }

    /// Whether a completion carrying `seq` is still the latest request.
    pub fn is_current(&self, seq: u64) -> bool {
        seq == self.latest
    }
}

/// Spawn the fixed-period ticker that drives automatic refresh.
///
/// The first immediate interval tick is skipped: startup triggers its own
/// refresh explicitly. The task ends when the receiving side is dropped.
pub fn spawn_ticker(period: Duration, events: mpsc::Sender<SessionEvent>) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(period);
        interval.tick().await;
        loop {
            interval.tick().await;
            debug!("refresh tick");
            if events.send(SessionEvent::RefreshDue).await.is_err() {
                break;
            }
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tokens_increase_and_supersede() {
        let mut scheduler = RefreshScheduler::new();
        let first = scheduler.issue();
        let second = scheduler.issue();

        assert!(second > first);
        assert!(!scheduler.is_current(first));
        assert!(scheduler.is_current(second));
    }

    #[test]
    fn nothing_is_current_before_first_issue() {
        let scheduler = RefreshScheduler::new();
        assert!(!scheduler.is_current(1));
    }

    #[tokio::test]
    async fn ticker_fires_after_each_period() {
        let (tx, mut rx) = mpsc::channel(4);
        let handle = spawn_ticker(Duration::from_millis(10), tx);

        let event = tokio::time::timeout(Duration::from_secs(1), rx.recv())
            .await
            .expect("ticker did not fire")
            .expect("channel closed");
        assert!(matches!(event, SessionEvent::RefreshDue));

        handle.abort();
    }

    #[tokio::test]
    async fn ticker_stops_when_receiver_dropped() {
        let (tx, rx) = mpsc::channel(1);
        let handle = spawn_ticker(Duration::from_millis(5), tx);
        drop(rx);

        tokio::time::timeout(Duration::from_secs(1), handle)
            .await
            .expect("ticker task did not end")
            .expect("ticker task panicked");
    }
}
