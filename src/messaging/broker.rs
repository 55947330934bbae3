//! Broker abstraction and the in-process broker.
//!
//! # Responsibilities
//! - `Publish(queue, bytes)` and `Subscribe(queue) → stream of bytes`
//! - Retain messages published while a queue has no subscriber
//! - Fan out to every live subscriber of a queue

use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use dashmap::DashMap;
use thiserror::Error;
use tokio::sync::mpsc;

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum BrokerError {
    #[error("broker unavailable")]
    Unavailable,

    #[error("queue '{0}' is full")]
    QueueFull(String),

    #[error("queue '{0}' closed")]
    Closed(String),
}

#[async_trait]
pub trait Broker: Send + Sync {
    async fn publish(&self, queue: &str, payload: Vec<u8>) -> Result<(), BrokerError>;

    async fn subscribe(&self, queue: &str) -> Result<Subscription, BrokerError>;
}

/// A live subscription. `next` returns `None` once the broker drops it.
pub struct Subscription {
    rx: mpsc::Receiver<Vec<u8>>,
}

impl Subscription {
    pub fn new(rx: mpsc::Receiver<Vec<u8>>) -> Self {
        Self { rx }
    }

    pub async fn next(&mut self) -> Option<Vec<u8>> {
        self.rx.recv().await
    }
}

#[derive(Default)]
struct QueueState {
    subscribers: Vec<mpsc::Sender<Vec<u8>>>,
    backlog: VecDeque<Vec<u8>>,
}

/// Named durable queues held in process memory.
pub struct MemoryBroker {
    queues: DashMap<String, QueueState>,
    capacity: usize,
    available: AtomicBool,
}

impl MemoryBroker {
    pub fn new(capacity: usize) -> Self {
        Self {
            queues: DashMap::new(),
            capacity: capacity.max(1),
            available: AtomicBool::new(true),
        }
    }

    /// Take the broker offline (dropping every subscription) or bring it back.
    pub fn set_available(&self, available: bool) {
        self.available.store(available, Ordering::SeqCst);
        if !available {
            for mut queue in self.queues.iter_mut() {
                queue.subscribers.clear();
            }
            tracing::warn!("Broker went offline");
        } else {
            tracing::info!("Broker back online");
        }
    }

    /// Drop every subscription of `queue`, as a connection loss would.
    pub fn disconnect(&self, queue: &str) {
        if let Some(mut state) = self.queues.get_mut(queue) {
            state.subscribers.clear();
        }
    }

    /// Messages waiting for a subscriber.
    pub fn backlog_len(&self, queue: &str) -> usize {
        self.queues.get(queue).map(|q| q.backlog.len()).unwrap_or(0)
    }

    pub fn subscriber_count(&self, queue: &str) -> usize {
        self.queues
            .get(queue)
            .map(|q| q.subscribers.iter().filter(|s| !s.is_closed()).count())
            .unwrap_or(0)
    }

    fn ensure_available(&self) -> Result<(), BrokerError> {
        if self.available.load(Ordering::SeqCst) {
            Ok(())
        } else {
            Err(BrokerError::Unavailable)
        }
    }
}

#[async_trait]
impl Broker for MemoryBroker {
    async fn publish(&self, queue: &str, payload: Vec<u8>) -> Result<(), BrokerError> {
        self.ensure_available()?;

        let mut state = self.queues.entry(queue.to_string()).or_default();
        state.subscribers.retain(|s| !s.is_closed());

        if state.subscribers.is_empty() {
            if state.backlog.len() >= self.capacity {
                return Err(BrokerError::QueueFull(queue.to_string()));
            }
            state.backlog.push_back(payload);
            return Ok(());
        }

        let mut delivered = 0;
        for subscriber in &state.subscribers {
            match subscriber.try_send(payload.clone()) {
                Ok(()) => delivered += 1,
                Err(mpsc::error::TrySendError::Full(_)) => {
                    tracing::warn!(queue, "Subscriber lagging, message not delivered to it");
                }
                Err(mpsc::error::TrySendError::Closed(_)) => {}
            }
        }

        if delivered == 0 {
            return Err(BrokerError::QueueFull(queue.to_string()));
        }
        Ok(())
    }

    async fn subscribe(&self, queue: &str) -> Result<Subscription, BrokerError> {
        self.ensure_available()?;

        let (tx, rx) = mpsc::channel(self.capacity);
        let mut state = self.queues.entry(queue.to_string()).or_default();
        while let Some(payload) = state.backlog.pop_front() {
            if let Err(e) = tx.try_send(payload) {
                // Only reachable if the backlog outgrew the channel; keep the rest.
                state.backlog.push_front(e.into_inner());
                break;
            }
        }
        state.subscribers.push(tx);

        tracing::debug!(queue, "Subscribed");
        Ok(Subscription::new(rx))
    }
}
