//! An order-preserving channel with unbounded capacity, built from two
//! single-slot tokio channels and a task that owns the backlog.

use crate::error::{Result, SpiderError};
use std::collections::VecDeque;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

pub fn unbounded<T: Send + 'static>() -> (RelaySender<T>, RelayReceiver<T>) {
    let (accept_tx, mut accept_rx) = mpsc::channel::<T>(1);
    let (deliver_tx, deliver_rx) = mpsc::channel::<T>(1);

    let task = tokio::spawn(async move {
        let mut backlog: VecDeque<T> = VecDeque::with_capacity(64);

        loop {
            if backlog.is_empty() {
                match accept_rx.recv().await {
                    Some(item) => backlog.push_back(item),
                    None => break,
                }
            }

            tokio::select! {
                permit = deliver_tx.reserve() => {
                    let Ok(permit) = permit else { break };
                    if let Some(item) = backlog.pop_front() {
                        permit.send(item);
                    }
                }
                item = accept_rx.recv() => match item {
                    Some(item) => backlog.push_back(item),
                    None => {
                        // producers are gone, flush what is left
                        while let Some(item) = backlog.pop_front() {
                            if deliver_tx.send(item).await.is_err() {
                                break;
                            }
                        }
                        break;
                    }
                },
            }
        }
    });

    (
        RelaySender { accept: accept_tx },
        RelayReceiver {
            deliver: deliver_rx,
            task,
        },
    )
}

#[derive(Debug)]
pub struct RelaySender<T> {
    accept: mpsc::Sender<T>,
}

impl<T> Clone for RelaySender<T> {
    fn clone(&self) -> Self {
        Self {
            accept: self.accept.clone(),
        }
    }
}

impl<T> RelaySender<T> {
    /// Hand an item to the relay. Returns once the relay has taken it, which
    /// never depends on how far behind the receiver is.
    pub async fn send(&self, item: T) -> Result<()> {
        self.accept
            .send(item)
            .await
            .map_err(|_| SpiderError::RelayClosed)
    }
}

#[derive(Debug)]
pub struct RelayReceiver<T> {
    deliver: mpsc::Receiver<T>,
    task: JoinHandle<()>,
}

impl<T> RelayReceiver<T> {
    pub async fn recv(&mut self) -> Option<T> {
        self.deliver.recv().await
    }
}

impl<T> Drop for RelayReceiver<T> {
    fn drop(&mut self) {
        self.task.abort();
    }
}
