//! Ordered completion tracker.
//!
//! Tracks a set of in-flight indices and exposes the largest `T` such that
//! every index `<= T` has been reported done — even though indices don't
//! necessarily finish in the order they began. `Oracle` uses one instance
//! to track begin timestamps (so it knows when no in-flight reader can
//! still see an old committed write) and one to track commit timestamps
//! (so a new reader's `beginTimestamp()` can wait until every commit up to
//! its snapshot is visible).
//!
//! Per the "coroutines become explicit tasks plus channels" design
//! decision, state lives entirely inside one background thread; `begin`,
//! `finish`, `done_till`, and `wait_for` are just messages sent to it, so
//! callers never race each other on the pending-index heap.

use crossbeam::channel::{self, Sender};
use std::cmp::Reverse;
use std::collections::{BinaryHeap, HashMap};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::thread::JoinHandle;

enum Message {
    Begin(u64),
    Finish(u64),
    WaitFor(u64, Sender<()>),
}

pub struct WaterMark {
    sender: Sender<Message>,
    done_till: Arc<AtomicU64>,
    worker: Option<JoinHandle<()>>,
}

impl WaterMark {
    pub fn new() -> Self {
        let (sender, receiver) = channel::unbounded::<Message>();
        let done_till = Arc::new(AtomicU64::new(0));
        let worker_done_till = Arc::clone(&done_till);

        let worker = std::thread::spawn(move || {
            let mut pending: HashMap<u64, i64> = HashMap::new();
            let mut heap: BinaryHeap<Reverse<u64>> = BinaryHeap::new();
            let mut waiters: Vec<(u64, Sender<()>)> = Vec::new();

            for message in receiver {
                match message {
                    Message::Begin(index) => {
                        let count = pending.entry(index).or_insert(0);
                        if *count == 0 {
                            heap.push(Reverse(index));
                        }
                        *count += 1;
                    }
                    Message::Finish(index) => {
                        let count = pending.entry(index).or_insert(0);
                        *count -= 1;
                    }
                    Message::WaitFor(index, reply) => {
                        if worker_done_till.load(Ordering::Acquire) >= index {
                            let _ = reply.send(());
                        } else {
                            waiters.push((index, reply));
                        }
                        continue;
                    }
                }

                let mut advanced_to = None;
                while let Some(Reverse(smallest)) = heap.peek().copied() {
                    let count = pending.get(&smallest).copied().unwrap_or(0);
                    if count > 0 {
                        break;
                    }
                    heap.pop();
                    pending.remove(&smallest);
                    advanced_to = Some(smallest);
                }
                if let Some(new_done_till) = advanced_to {
                    worker_done_till.store(new_done_till, Ordering::Release);
                    waiters.retain(|(index, reply)| {
                        if new_done_till >= *index {
                            let _ = reply.send(());
                            false
                        } else {
                            true
                        }
                    });
                }
            }
        });

        Self {
            sender,
            done_till,
            worker: Some(worker),
        }
    }

    /// Marks `index` as having begun. Safe to call with the same index more
    /// than once (e.g. two readers opening the same snapshot); each call
    /// must be matched by a `finish(index)`.
    pub fn begin(&self, index: u64) {
        let _ = self.sender.send(Message::Begin(index));
    }

    /// Marks one outstanding `begin(index)` as complete.
    pub fn finish(&self, index: u64) {
        let _ = self.sender.send(Message::Finish(index));
    }

    /// The largest `T` such that every index `<= T` has fully finished.
    pub fn done_till(&self) -> u64 {
        self.done_till.load(Ordering::Acquire)
    }

    /// Blocks the calling thread until `done_till() >= index`.
    pub fn wait_for(&self, index: u64) {
        if self.done_till() >= index {
            return;
        }
        let (reply_tx, reply_rx) = channel::bounded(1);
        if self.sender.send(Message::WaitFor(index, reply_tx)).is_err() {
            return;
        }
        let _ = reply_rx.recv();
    }
}

impl Default for WaterMark {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for WaterMark {
    fn drop(&mut self) {
        // Dropping `sender` closes the channel, ending the worker's `for`
        // loop; join so the thread doesn't outlive its watermark.
        if let Some(worker) = self.worker.take() {
            let _ = worker.join();
        }
    }
}
