// src/crawl/relay.rs
// =============================================================================
// An unbounded relay queue: a channel whose send side never waits on the
// receive side, no matter how much is buffered.
//
// How it works:
// 1. Senders hand items to a small hand-off channel (capacity 1)
// 2. A single pump task owns a growable VecDeque and loops on select!:
//    - accept a new item from the senders, push it to the back
//    - offer the front item to the receiver, when it has room
// 3. When every sender is dropped and the buffer is empty, the pump drops
//    its output, so the receiver sees None after the last item
//
// The pump always accepts input, so a send waits at most for the pump's
// next loop turn, never for the consumer.
//
// Rust concepts:
// - Generics: the queue works for any T that can cross tasks (Send)
// - tokio::select!: wait on whichever branch is ready first
// - Permits: reserve() a slot before popping so nothing is ever lost
// =============================================================================

use std::collections::VecDeque;

use tokio::sync::mpsc;
use tracing::trace;

// The send half. Cheap to clone; the queue closes when all clones drop.
#[derive(Debug)]
pub struct RelaySender<T> {
    tx: mpsc::Sender<T>,
}

impl<T> Clone for RelaySender<T> {
    fn clone(&self) -> Self {
        Self {
            tx: self.tx.clone(),
        }
    }
}

impl<T> RelaySender<T> {
    // Fails only when the receive side has been dropped
    pub async fn send(&self, item: T) -> Result<(), mpsc::error::SendError<T>> {
        self.tx.send(item).await
    }
}

// The receive half. Yields items in send order, then None once closed.
#[derive(Debug)]
pub struct RelayReceiver<T> {
    rx: mpsc::Receiver<T>,
}

impl<T> RelayReceiver<T> {
    pub async fn recv(&mut self) -> Option<T> {
        self.rx.recv().await
    }
}

// Creates a relay queue and spawns its pump on the current tokio runtime
//
// Parameters:
//   capacity: initial size of the internal buffer (it grows past this freely)
pub fn relay_channel<T: Send + 'static>(capacity: usize) -> (RelaySender<T>, RelayReceiver<T>) {
    let (in_tx, in_rx) = mpsc::channel(1);
    let (out_tx, out_rx) = mpsc::channel(1);

    tokio::spawn(pump(in_rx, out_tx, VecDeque::with_capacity(capacity)));

    (RelaySender { tx: in_tx }, RelayReceiver { rx: out_rx })
}

async fn pump<T>(mut input: mpsc::Receiver<T>, output: mpsc::Sender<T>, mut buffer: VecDeque<T>) {
    let mut input_open = true;

    loop {
        if !input_open && buffer.is_empty() {
            break;
        }

        tokio::select! {
            permit = output.reserve(), if !buffer.is_empty() => {
                let Ok(permit) = permit else {
                    // Receiver is gone; whatever is buffered can't be delivered.
                    trace!(dropped = buffer.len(), "relay receiver closed");
                    return;
                };
                if let Some(item) = buffer.pop_front() {
                    permit.send(item);
                }
            }
            item = input.recv(), if input_open => {
                match item {
                    Some(item) => buffer.push_back(item),
                    None => input_open = false,
                }
            }
        }
    }

    // Dropping `output` here closes the receive side, exactly once.
    trace!("relay drained and closed");
}

// -----------------------------------------------------------------------------
// BEGINNER NOTES:
//
// 1. Why not just use mpsc::unbounded_channel?
//    - It would work, but the buffer would be hidden inside tokio
//    - Owning the VecDeque lets us size it up front and see what's queued
//
// 2. What does `if !buffer.is_empty()` do inside select!?
//    - It's a precondition: the branch is skipped when false
//    - With an empty buffer there is nothing to offer the receiver
//
// 3. Why reserve() and then send through the permit?
//    - reserve() waits for room without giving up the item
//    - If select! picks the other branch, the item is still in the buffer
// -----------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;
    use tokio::time::timeout;

    #[tokio::test]
    async fn test_sends_do_not_wait_for_receiver() {
        let (tx, mut rx) = relay_channel::<usize>(0);

        // Nobody is receiving yet, so every send must land in the buffer.
        let sends = async {
            for i in 0..1_000 {
                tx.send(i).await.unwrap();
            }
        };
        timeout(Duration::from_secs(5), sends)
            .await
            .expect("sends blocked on an idle receiver");
        drop(tx);

        let mut received = Vec::new();
        while let Some(i) = rx.recv().await {
            received.push(i);
        }
        assert_eq!(received, (0..1_000).collect::<Vec<_>>());
    }

    #[tokio::test]
    async fn test_receiver_closes_after_last_item() {
        let (tx, mut rx) = relay_channel::<&str>(4);
        tx.send("first").await.unwrap();
        tx.send("second").await.unwrap();
        drop(tx);

        assert_eq!(rx.recv().await, Some("first"));
        assert_eq!(rx.recv().await, Some("second"));
        assert_eq!(rx.recv().await, None);
        assert_eq!(rx.recv().await, None);
    }

    #[tokio::test]
    async fn test_many_senders_every_item_exactly_once() {
        const SENDERS: usize = 50;
        const PER_SENDER: usize = 100;

        let (tx, mut rx) = relay_channel::<(usize, usize)>(0);

        let mut handles = Vec::new();
        for s in 0..SENDERS {
            let tx = tx.clone();
            handles.push(tokio::spawn(async move {
                for n in 0..PER_SENDER {
                    tx.send((s, n)).await.unwrap();
                }
            }));
        }
        drop(tx);
        for handle in handles {
            handle.await.unwrap();
        }

        let mut next = vec![0usize; SENDERS];
        let mut total = 0;
        while let Some((s, n)) = rx.recv().await {
            // Each sender's items arrive in the order it sent them.
            assert_eq!(n, next[s]);
            next[s] += 1;
            total += 1;
        }
        assert_eq!(total, SENDERS * PER_SENDER);
        assert!(next.iter().all(|&n| n == PER_SENDER));
    }

    #[tokio::test]
    async fn test_send_fails_once_receiver_dropped() {
        let (tx, rx) = relay_channel::<u8>(0);
        drop(rx);

        // The pump notices on its first offer; after that sends are refused.
        tx.send(1).await.unwrap();
        let mut refused = false;
        for _ in 0..100 {
            if tx.send(2).await.is_err() {
                refused = true;
                break;
            }
            tokio::task::yield_now().await;
        }
        assert!(refused);
    }
}
