//! Bounded FIFO hand-off between the accept loop and the worker pool.
use std::{
    num::NonZeroUsize,
    sync::{
        Mutex, PoisonError,
        mpsc::{self, Receiver, SyncSender, TrySendError},
    },
};

use thiserror::Error;

#[derive(Debug, Error)]
#[error("connection queue is closed")]
pub struct QueueClosed;

/// Blocking queue holding at most `capacity` pending items.
///
/// Producers block in [`push`](ConnectionQueue::push) while the queue is full and consumers block
/// in [`pop`](ConnectionQueue::pop) while it is empty. Items leave in the order they entered.
#[derive(Debug)]
pub struct ConnectionQueue<T> {
    sender: SyncSender<T>,
    receiver: Mutex<Receiver<T>>,
    capacity: usize,
}

impl<T> ConnectionQueue<T> {
    pub fn new(capacity: NonZeroUsize) -> Self {
        let (sender, receiver) = mpsc::sync_channel(capacity.get());

        Self {
            sender,
            receiver: Mutex::new(receiver),
            capacity: capacity.get(),
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Append `item`, waiting for free space if needed.
    pub fn push(&self, item: T) -> Result<(), QueueClosed> {
        self.sender.send(item).map_err(|_| QueueClosed)
    }

    /// Append `item` without waiting. The item is handed back when the queue is full.
    pub fn try_push(&self, item: T) -> Result<(), T> {
        self.sender.try_send(item).map_err(|e| match e {
            TrySendError::Full(item) | TrySendError::Disconnected(item) => item,
        })
    }

    /// Remove the oldest item, waiting until one is available.
    ///
    /// Only one consumer waits on the channel at a time; the others queue up on the lock.
    pub fn pop(&self) -> Option<T> {
        let receiver = self.receiver.lock().unwrap_or_else(PoisonError::into_inner);
        receiver.recv().ok()
    }
}

#[cfg(test)]
mod tests {
    use std::{
        sync::{
            Arc,
            atomic::{AtomicIsize, AtomicUsize, Ordering},
        },
        thread,
        time::Duration,
    };

    use super::*;

    fn queue<T>(capacity: usize) -> ConnectionQueue<T> {
        ConnectionQueue::new(NonZeroUsize::new(capacity).unwrap())
    }

    #[test]
    fn queue_is_fifo() {
        let q = queue(3);
        q.push(1).unwrap();
        q.push(2).unwrap();
        q.push(3).unwrap();

        assert_eq!(q.pop(), Some(1));
        assert_eq!(q.pop(), Some(2));
        assert_eq!(q.pop(), Some(3));
    }

    #[test]
    fn queue_rejects_past_capacity() {
        let q = queue(2);
        q.push("a").unwrap();
        q.push("b").unwrap();

        assert_eq!(q.try_push("c"), Err("c"));
        assert_eq!(q.pop(), Some("a"));
        assert_eq!(q.try_push("c"), Ok(()));
        assert_eq!(q.try_push("d"), Err("d"));
    }

    #[test]
    fn push_blocks_until_pop() {
        let q = Arc::new(queue(1));
        q.push(0).unwrap();

        let producer = {
            let q = Arc::clone(&q);
            thread::spawn(move || q.push(1).unwrap())
        };

        thread::sleep(Duration::from_millis(50));
        assert!(!producer.is_finished());

        assert_eq!(q.pop(), Some(0));
        producer.join().unwrap();
        assert_eq!(q.pop(), Some(1));
    }

    #[test]
    fn pop_blocks_until_push() {
        let q = Arc::new(queue::<u32>(1));

        let consumer = {
            let q = Arc::clone(&q);
            thread::spawn(move || q.pop())
        };

        thread::sleep(Duration::from_millis(50));
        assert!(!consumer.is_finished());

        q.push(7).unwrap();
        assert_eq!(consumer.join().unwrap(), Some(7));
    }

    #[test]
    fn concurrent_producers_keep_per_producer_order() {
        const PRODUCERS: usize = 4;
        const ITEMS: usize = 500;

        let q = Arc::new(queue(3));
        let producers = (0..PRODUCERS)
            .map(|p| {
                let q = Arc::clone(&q);
                thread::spawn(move || {
                    for i in 0..ITEMS {
                        q.push((p, i)).unwrap();
                    }
                })
            })
            .collect::<Vec<_>>();

        let mut last = [None::<usize>; PRODUCERS];
        for _ in 0..PRODUCERS * ITEMS {
            let (p, i) = q.pop().unwrap();
            if let Some(prev) = last[p] {
                assert_eq!(i, prev + 1, "producer {p} items out of order");
            }
            last[p] = Some(i);
        }

        for producer in producers {
            producer.join().unwrap();
        }
        assert!(last.iter().all(|l| *l == Some(ITEMS - 1)));
        assert_eq!(q.try_push((0, 0)), Ok(()));
    }

    #[test]
    fn blocked_producers_hold_queue_at_capacity() {
        const CAPACITY: usize = 5;
        const PRODUCERS: usize = 4;
        const ITEMS: usize = 3;

        let q = Arc::new(queue(CAPACITY));
        let pushed = Arc::new(AtomicUsize::new(0));
        let producers = (0..PRODUCERS)
            .map(|_| {
                let (q, pushed) = (Arc::clone(&q), Arc::clone(&pushed));
                thread::spawn(move || {
                    for i in 0..ITEMS {
                        q.push(i).unwrap();
                        pushed.fetch_add(1, Ordering::SeqCst);
                    }
                })
            })
            .collect::<Vec<_>>();

        while pushed.load(Ordering::SeqCst) < CAPACITY {
            thread::sleep(Duration::from_millis(5));
        }
        thread::sleep(Duration::from_millis(50));
        assert_eq!(pushed.load(Ordering::SeqCst), CAPACITY);
        assert_eq!(q.try_push(usize::MAX), Err(usize::MAX));

        for _ in 0..PRODUCERS * ITEMS {
            assert!(q.pop().is_some());
        }
        for producer in producers {
            producer.join().unwrap();
        }
        assert_eq!(pushed.load(Ordering::SeqCst), PRODUCERS * ITEMS);
    }

    #[test]
    fn interleaved_traffic_stays_within_capacity() {
        const CAPACITY: usize = 3;
        const PRODUCERS: usize = 4;
        const CONSUMERS: usize = 3;
        const ITEMS: usize = 300;

        let q = Arc::new(queue(CAPACITY));
        // Pushes that returned minus pops that returned.
        let held = Arc::new(AtomicIsize::new(0));
        let peak = Arc::new(AtomicIsize::new(0));

        let producers = (0..PRODUCERS)
            .map(|_| {
                let (q, held, peak) = (Arc::clone(&q), Arc::clone(&held), Arc::clone(&peak));
                thread::spawn(move || {
                    for i in 0..ITEMS {
                        q.push(i).unwrap();
                        let now = held.fetch_add(1, Ordering::SeqCst) + 1;
                        peak.fetch_max(now, Ordering::SeqCst);
                    }
                })
            })
            .collect::<Vec<_>>();
        let consumers = (0..CONSUMERS)
            .map(|_| {
                let (q, held) = (Arc::clone(&q), Arc::clone(&held));
                thread::spawn(move || {
                    for _ in 0..PRODUCERS * ITEMS / CONSUMERS {
                        q.pop().unwrap();
                        held.fetch_sub(1, Ordering::SeqCst);
                    }
                })
            })
            .collect::<Vec<_>>();

        for handle in producers.into_iter().chain(consumers) {
            handle.join().unwrap();
        }

        // Each consumer may have taken one item it has not yet accounted for.
        let bound = (CAPACITY + CONSUMERS) as isize;
        assert!(peak.load(Ordering::SeqCst) <= bound);
        assert_eq!(held.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn concurrent_consumers_never_duplicate() {
        const ITEMS: usize = 1000;

        let q = Arc::new(queue(4));
        let consumers = (0..4)
            .map(|_| {
                let q = Arc::clone(&q);
                thread::spawn(move || {
                    let mut seen = Vec::new();
                    while let Some(item) = q.pop() {
                        if item == usize::MAX {
                            break;
                        }
                        seen.push(item);
                    }
                    seen
                })
            })
            .collect::<Vec<_>>();

        for i in 0..ITEMS {
            q.push(i).unwrap();
        }
        for _ in 0..4 {
            q.push(usize::MAX).unwrap();
        }

        let mut all = consumers
            .into_iter()
            .flat_map(|c| c.join().unwrap())
            .collect::<Vec<_>>();
        all.sort_unstable();
        assert_eq!(all, (0..ITEMS).collect::<Vec<_>>());
    }
}
