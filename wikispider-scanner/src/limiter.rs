use crate::error::{Result, SpiderError};
use std::time::Duration;
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

/// Global throttle shared by every download worker.
///
/// A background ticker hands out one permit per interval, and only to a
/// worker that is already waiting: idle intervals produce nothing, so two
/// grants are always at least one interval apart. A zero delay never blocks.
pub struct RateLimiter {
    requests: Option<mpsc::Sender<oneshot::Sender<()>>>,
    ticker: Option<JoinHandle<()>>,
}

impl RateLimiter {
    pub fn new(delay: Duration) -> Self {
        if delay.is_zero() {
            return Self::unthrottled();
        }

        let (tx, mut rx) = mpsc::channel::<oneshot::Sender<()>>(1);
        let ticker = tokio::spawn(async move {
            let mut interval = tokio::time::interval(delay);
            interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
            while let Some(waiter) = rx.recv().await {
                interval.tick().await;
                // a waiter that gave up forfeits the permit
                let _ = waiter.send(());
            }
        });

        Self {
            requests: Some(tx),
            ticker: Some(ticker),
        }
    }

    pub fn from_millis(delay_ms: u64) -> Self {
        Self::new(Duration::from_millis(delay_ms))
    }

    pub fn unthrottled() -> Self {
        Self {
            requests: None,
            ticker: None,
        }
    }

    pub fn is_throttled(&self) -> bool {
        self.requests.is_some()
    }

    /// Wait for the next permit. Order among waiting workers is unspecified.
    pub async fn acquire(&self) -> Result<()> {
        let Some(requests) = &self.requests else {
            return Ok(());
        };

        let (permit_tx, permit_rx) = oneshot::channel();
        requests
            .send(permit_tx)
            .await
            .map_err(|_| SpiderError::LimiterClosed)?;
        permit_rx.await.map_err(|_| SpiderError::LimiterClosed)
    }
}

impl Drop for RateLimiter {
    fn drop(&mut self) {
        if let Some(ticker) = self.ticker.take() {
            ticker.abort();
        }
    }
}
