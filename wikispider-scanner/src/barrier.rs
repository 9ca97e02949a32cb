use std::sync::atomic::{AtomicUsize, Ordering};
use tokio::sync::Notify;

/// Count of fetch tasks submitted but not yet finished.
///
/// The orchestrator adds before submitting; a worker calls `done` only after
/// its article is inside the relay, so a drained counter means every
/// finished article is already queued ahead of the next boundary marker.
#[derive(Debug, Default)]
pub struct PendingCounter {
    count: AtomicUsize,
    drained: Notify,
}

impl PendingCounter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&self, n: usize) {
        self.count.fetch_add(n, Ordering::AcqRel);
    }

    pub fn done(&self) {
        let previous = self.count.fetch_sub(1, Ordering::AcqRel);
        assert!(previous > 0, "pending counter decremented below zero");
        if previous == 1 {
            self.drained.notify_waiters();
        }
    }

    pub fn pending(&self) -> usize {
        self.count.load(Ordering::Acquire)
    }

    /// Block until the count reaches zero.
    pub async fn wait(&self) {
        loop {
            let notified = self.drained.notified();
            tokio::pin!(notified);
            // register before checking so a concurrent `done` is not missed
            notified.as_mut().enable();

            if self.pending() == 0 {
                return;
            }
            notified.await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::time::Duration;

    #[tokio::test]
    async fn test_wait_returns_immediately_when_empty() {
        let counter = PendingCounter::new();
        counter.wait().await;
        assert_eq!(counter.pending(), 0);
    }

    #[tokio::test]
    async fn test_wait_blocks_until_drained() {
        let counter = Arc::new(PendingCounter::new());
        counter.add(3);

        let workers: Vec<_> = (0..3)
            .map(|i| {
                let counter = counter.clone();
                tokio::spawn(async move {
                    tokio::time::sleep(Duration::from_millis(10 * (i + 1))).await;
                    counter.done();
                })
            })
            .collect();

        counter.wait().await;
        assert_eq!(counter.pending(), 0);

        for worker in workers {
            worker.await.unwrap();
        }
    }

    #[tokio::test]
    async fn test_counter_can_be_reused_across_generations() {
        let counter = Arc::new(PendingCounter::new());

        for generation in 1..=3 {
            counter.add(generation);
            for _ in 0..generation {
                let counter = counter.clone();
                tokio::spawn(async move { counter.done() });
            }
            counter.wait().await;
            assert_eq!(counter.pending(), 0);
        }
    }

    #[test]
    #[should_panic(expected = "below zero")]
    fn test_done_without_add_panics() {
        PendingCounter::new().done();
    }
}
