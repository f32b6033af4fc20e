// src/crawl/backpressure.rs
// =============================================================================
// Publishing onto a bounded channel without ever blocking the publisher.
//
// Why this exists:
// - The worker pool is fixed, but each page can yield many new links
// - If every worker waits to push links into a full result channel, no
//   worker is free to take the tasks that would drain it, and the
//   scheduler can end up waiting on them too: a deadlock
//
// Publisher::publish first tries a plain non-blocking send. If the channel
// is full, the payload is handed off and the caller moves on:
// - Backpressure::Spawn: a short-lived task does the blocking send
// - Backpressure::Relay: the payload goes through an unbounded relay queue
//   that a single background task drains into the channel
//
// Either way every payload is delivered exactly once. Payloads that go
// straight in keep their order; handed-off payloads may arrive later.
// =============================================================================

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use clap::ValueEnum;
use serde::Serialize;
use tokio::sync::mpsc::{self, error::TrySendError};
use tracing::{debug, warn};

use super::relay::{relay_channel, RelaySender};

// Which hand-off to use when a channel is full
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Backpressure {
    /// Spawn a helper task per blocked send
    #[default]
    Spawn,
    /// Queue blocked sends in an unbounded relay
    Relay,
}

// Counts payloads that found the channel full. Holding one does not keep
// the channel open, so it can outlive every Publisher.
#[derive(Debug, Clone, Default)]
pub struct Handoffs(Arc<AtomicUsize>);

impl Handoffs {
    pub fn get(&self) -> usize {
        self.0.load(Ordering::Relaxed)
    }

    fn record(&self) {
        self.0.fetch_add(1, Ordering::Relaxed);
    }
}

// A never-blocking handle onto one bounded channel
pub struct Publisher<T> {
    channel: mpsc::Sender<T>,
    relay: Option<RelaySender<T>>,
    handoffs: Handoffs,
}

impl<T> Clone for Publisher<T> {
    fn clone(&self) -> Self {
        Self {
            channel: self.channel.clone(),
            relay: self.relay.clone(),
            handoffs: self.handoffs.clone(),
        }
    }
}

impl<T: Send + 'static> Publisher<T> {
    // Wraps `channel`. With Backpressure::Relay this also spawns the relay
    // queue and the task that drains it into `channel`; both exit once every
    // clone of this publisher is dropped and the relay is empty.
    pub fn new(strategy: Backpressure, channel: mpsc::Sender<T>, relay_capacity: usize) -> Self {
        let relay = match strategy {
            Backpressure::Spawn => None,
            Backpressure::Relay => {
                let (relay_tx, mut relay_rx) = relay_channel(relay_capacity);
                let out = channel.clone();
                tokio::spawn(async move {
                    while let Some(item) = relay_rx.recv().await {
                        if out.send(item).await.is_err() {
                            warn!("relay target channel closed, dropping payload");
                            break;
                        }
                    }
                });
                Some(relay_tx)
            }
        };

        Self {
            channel,
            relay,
            handoffs: Handoffs::default(),
        }
    }

    pub async fn publish(&self, payload: T) {
        let payload = match self.channel.try_send(payload) {
            Ok(()) => return,
            Err(TrySendError::Full(payload)) => payload,
            Err(TrySendError::Closed(_)) => {
                // Unreachable while the counting protocol holds.
                warn!("publish on a closed channel, payload dropped");
                return;
            }
        };

        self.handoffs.record();
        match &self.relay {
            None => {
                let channel = self.channel.clone();
                tokio::spawn(async move {
                    if channel.send(payload).await.is_err() {
                        warn!("channel closed before helper could deliver");
                    }
                });
            }
            Some(relay) => {
                if relay.send(payload).await.is_err() {
                    warn!("relay closed, payload dropped");
                }
            }
        }
        debug!("channel full, payload handed off");
    }

    // How many payloads found the channel full, across all clones
    pub fn handoffs(&self) -> usize {
        self.handoffs.get()
    }

    // A handle on the same count that does not hold the channel open
    pub fn handoff_counter(&self) -> Handoffs {
        self.handoffs.clone()
    }
}
