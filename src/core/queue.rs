//! Bounded single-producer / single-consumer queues
//!
//! Inbound link bytes and keystrokes are produced on their own threads and
//! drained by the foreground loop, which is the only owner of the terminal
//! state. Neither end can be cloned, so each queue has exactly one writer
//! and one reader.

use std::sync::mpsc::{self, Receiver, SyncSender, TryRecvError, TrySendError};

/// Capacity of the inbound byte queue.
pub const RX_CAPACITY: usize = 254;
/// Capacity of the keystroke queue.
pub const KEY_CAPACITY: usize = 32;

/// Why a push did not happen. Carries the rejected item back.
#[derive(Debug, PartialEq, Eq)]
pub enum PushError<T> {
    /// Queue is at capacity.
    Full(T),
    /// Consumer has been dropped.
    Disconnected(T),
}

/// Writing end of a queue.
#[derive(Debug)]
pub struct Producer<T> {
    tx: SyncSender<T>,
}

/// Reading end of a queue.
#[derive(Debug)]
pub struct Consumer<T> {
    rx: Receiver<T>,
    disconnected: bool,
}

/// Create a queue holding at most `capacity` items.
pub fn bounded<T>(capacity: usize) -> (Producer<T>, Consumer<T>) {
    let (tx, rx) = mpsc::sync_channel(capacity.max(1));
    (
        Producer { tx },
        Consumer {
            rx,
            disconnected: false,
        },
    )
}

impl<T> Producer<T> {
    /// Push, waiting for room. Fails only when the consumer is gone.
    pub fn push(&self, item: T) -> Result<(), PushError<T>> {
        self.tx.send(item).map_err(|err| PushError::Disconnected(err.0))
    }

    /// Push without waiting.
    pub fn try_push(&self, item: T) -> Result<(), PushError<T>> {
        self.tx.try_send(item).map_err(|err| match err {
            TrySendError::Full(item) => PushError::Full(item),
            TrySendError::Disconnected(item) => PushError::Disconnected(item),
        })
    }
}

impl<T> Consumer<T> {
    /// Next item if one is ready.
    pub fn try_pop(&mut self) -> Option<T> {
        match self.rx.try_recv() {
            Ok(item) => Some(item),
            Err(TryRecvError::Empty) => None,
            Err(TryRecvError::Disconnected) => {
                self.disconnected = true;
                None
            }
        }
    }

    /// Every item ready right now, in arrival order.
    pub fn drain(&mut self) -> Drain<'_, T> {
        Drain { consumer: self }
    }

    /// True once the producer is gone and the queue has been emptied.
    pub fn is_disconnected(&self) -> bool {
        self.disconnected
    }
}

/// Iterator returned by [`Consumer::drain`].
pub struct Drain<'a, T> {
    consumer: &'a mut Consumer<T>,
}

impl<T> Iterator for Drain<'_, T> {
    type Item = T;

    fn next(&mut self) -> Option<T> {
        self.consumer.try_pop()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;

    #[test]
    fn test_fifo_order() {
        let (tx, mut rx) = bounded(4);
        for b in b"abc" {
            tx.try_push(*b).unwrap();
        }
        assert_eq!(rx.drain().collect::<Vec<_>>(), b"abc".to_vec());
        assert_eq!(rx.try_pop(), None);
        assert!(!rx.is_disconnected());
    }

    #[test]
    fn test_full_queue_rejects() {
        let (tx, mut rx) = bounded(2);
        tx.try_push(1u8).unwrap();
        tx.try_push(2u8).unwrap();
        assert_eq!(tx.try_push(3u8), Err(PushError::Full(3)));
        assert_eq!(rx.try_pop(), Some(1));
        tx.try_push(3u8).unwrap();
        assert_eq!(rx.drain().collect::<Vec<_>>(), vec![2, 3]);
    }

    #[test]
    fn test_disconnect_is_seen_after_drain() {
        let (tx, mut rx) = bounded(4);
        tx.push(7u8).unwrap();
        drop(tx);
        assert_eq!(rx.try_pop(), Some(7));
        assert!(!rx.is_disconnected());
        assert_eq!(rx.try_pop(), None);
        assert!(rx.is_disconnected());
    }

    #[test]
    fn test_push_after_consumer_dropped() {
        let (tx, rx) = bounded(4);
        drop(rx);
        assert_eq!(tx.push(1u8), Err(PushError::Disconnected(1)));
        assert_eq!(tx.try_push(2u8), Err(PushError::Disconnected(2)));
    }

    #[test]
    fn test_cross_thread_order_preserved() {
        let (tx, mut rx) = bounded(RX_CAPACITY);
        let producer = thread::spawn(move || {
            for i in 0..2000u32 {
                tx.push(i).unwrap();
            }
        });

        let mut received = Vec::new();
        while received.len() < 2000 {
            received.extend(rx.drain());
            thread::yield_now();
        }
        producer.join().unwrap();
        assert!(received.iter().copied().eq(0..2000u32));
    }
}
