use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error};

/// Interval between duration ticks
pub const TIMER_PERIOD: Duration = Duration::from_secs(1);

/// Session duration timer
///
/// Adds one second to `elapsed` per tick. It is the only writer of the
/// session duration and runs until cancelled.
pub(crate) struct SessionTimer {
    cancel: CancellationToken,
    task: JoinHandle<()>,
}

impl SessionTimer {
    pub fn start(elapsed: Arc<AtomicU64>, cancel: CancellationToken) -> Self {
        let token = cancel.clone();
        // First tick one period after start, not immediately
        let first_tick = Instant::now() + TIMER_PERIOD;

        let task = tokio::spawn(async move {
            let mut ticker = interval_at(first_tick, TIMER_PERIOD);

            loop {
                tokio::select! {
                    biased;
                    () = token.cancelled() => break,
                    _ = ticker.tick() => {
                        let seconds = elapsed.fetch_add(1, Ordering::SeqCst) + 1;
                        debug!("Session timer: {}s", seconds);
                    }
                }
            }

            debug!("Session timer stopped");
        });

        Self { cancel, task }
    }

    /// Cancel the timer and wait for its task to exit
    pub async fn stop(self) {
        self.cancel.cancel();
        if let Err(e) = self.task.await {
            error!("Session timer task panicked: {}", e);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn tick(n: u32) {
        for _ in 0..n {
            tokio::time::advance(TIMER_PERIOD).await;
            tokio::task::yield_now().await;
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_timer_counts_seconds() {
        let elapsed = Arc::new(AtomicU64::new(0));
        let timer = SessionTimer::start(Arc::clone(&elapsed), CancellationToken::new());

        // Nothing before the first full period
        tokio::time::advance(Duration::from_millis(500)).await;
        tokio::task::yield_now().await;
        assert_eq!(elapsed.load(Ordering::SeqCst), 0);

        tick(3).await;
        assert_eq!(elapsed.load(Ordering::SeqCst), 3);

        timer.stop().await;
        tick(5).await;
        assert_eq!(elapsed.load(Ordering::SeqCst), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_parent_cancellation_stops_timer() {
        let scope = CancellationToken::new();
        let elapsed = Arc::new(AtomicU64::new(0));
        let _timer = SessionTimer::start(Arc::clone(&elapsed), scope.child_token());

        tick(2).await;
        scope.cancel();
        tokio::task::yield_now().await;
        tick(4).await;

        assert_eq!(elapsed.load(Ordering::SeqCst), 2);
    }
}
