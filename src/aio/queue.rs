//! Completion queue
//!
//! Transfers happen at submission; only the notification is deferred. A
//! single worker thread holds pending completions in a min-heap keyed by due
//! time and fires each one exactly once.

use std::cmp::{Ordering as CmpOrdering, Reverse};
use std::collections::BinaryHeap;
use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use crossbeam::channel::{unbounded, Receiver, RecvTimeoutError, SendError, Sender};
use tracing::{debug, trace, warn};

use crate::device::{Device, Interrupt};
use crate::error::{Result, ScullError};

use super::{Completion, IoRequest, RequestToken, Submission, Synchronicity};

type Notify = Box<dyn FnOnce(Completion) + Send + 'static>;

/// A finished transfer waiting for its notification
struct PendingCompletion {
    token: RequestToken,
    result: Result<usize>,
    due: Instant,
    notify: Notify,
}

impl PartialEq for PendingCompletion {
    fn eq(&self, other: &Self) -> bool {
        self.due == other.due && self.token == other.token
    }
}

impl Eq for PendingCompletion {}

impl PartialOrd for PendingCompletion {
    fn partial_cmp(&self, other: &Self) -> Option<CmpOrdering> {
        Some(self.cmp(other))
    }
}

impl Ord for PendingCompletion {
    fn cmp(&self, other: &Self) -> CmpOrdering {
        (self.due, self.token).cmp(&(other.due, other.token))
    }
}

/// Counters shared with the worker
#[derive(Default)]
struct QueueStats {
    pending: AtomicUsize,
    delivered: AtomicU64,
}

/// Defers completion notifications of asynchronous requests
///
/// Dropping the queue stops accepting work, then waits for every pending
/// completion to be delivered at its due time. There is no cancellation.
pub struct CompletionQueue {
    /// `None` only while dropping
    tx: Option<Sender<PendingCompletion>>,

    /// Delay between submission and notification
    delay: Duration,

    next_token: AtomicU64,

    stats: Arc<QueueStats>,

    worker: Option<JoinHandle<()>>,
}

impl CompletionQueue {
    /// Start a queue whose notifications fire `delay` after submission
    pub fn new(delay: Duration) -> Result<Self> {
        let (tx, rx) = unbounded();
        let stats = Arc::new(QueueStats::default());

        let worker_stats = Arc::clone(&stats);
        let worker = thread::Builder::new()
            .name("scull-aio".to_string())
            .spawn(move || Self::worker_loop(rx, worker_stats))
            .map_err(|e| {
                warn!(error = %e, "failed to spawn completion worker");
                ScullError::OutOfMemory
            })?;

        debug!(delay_ms = delay.as_millis() as u64, "completion queue started");
        Ok(Self {
            tx: Some(tx),
            delay,
            next_token: AtomicU64::new(1),
            stats,
            worker: Some(worker),
        })
    }

    /// Perform `request` against `device` and report its result
    ///
    /// Synchronous requests get `Completed`. Asynchronous ones get `Queued`
    /// and `notify` runs once on the worker thread after the delay; if the
    /// completion cannot be queued the result comes back as `Completed` and
    /// `notify` is dropped unused.
    pub fn submit<F>(
        &self,
        device: &Device,
        request: IoRequest<'_>,
        interrupt: &Interrupt,
        notify: F,
    ) -> Submission
    where
        F: FnOnce(Completion) + Send + 'static,
    {
        let mode = request.mode;
        let is_write = request.buffer.is_write();
        let result = request.perform(device, interrupt);

        if mode == Synchronicity::Synchronous {
            return Submission::Completed(result);
        }

        let Some(tx) = self.tx.as_ref() else {
            return Submission::Completed(result);
        };

        let token = RequestToken(self.next_token.fetch_add(1, Ordering::Relaxed));
        let pending = PendingCompletion {
            token,
            result,
            due: Instant::now() + self.delay,
            notify: Box::new(notify),
        };

        self.stats.pending.fetch_add(1, Ordering::AcqRel);
        match tx.send(pending) {
            Ok(()) => {
                trace!(token = token.id(), is_write, "completion queued");
                Submission::Queued(token)
            }
            Err(SendError(pending)) => {
                self.stats.pending.fetch_sub(1, Ordering::AcqRel);
                warn!(token = token.id(), "completion worker gone, completing inline");
                Submission::Completed(pending.result)
            }
        }
    }

    /// Completions queued but not yet delivered
    pub fn pending(&self) -> usize {
        self.stats.pending.load(Ordering::Acquire)
    }

    /// Completions delivered so far
    pub fn delivered(&self) -> u64 {
        self.stats.delivered.load(Ordering::Acquire)
    }

    pub fn delay(&self) -> Duration {
        self.delay
    }

    /// Stop accepting work and wait for outstanding notifications
    pub fn shutdown(self) {
        drop(self);
    }

    fn worker_loop(rx: Receiver<PendingCompletion>, stats: Arc<QueueStats>) {
        let mut heap: BinaryHeap<Reverse<PendingCompletion>> = BinaryHeap::new();
        let mut accepting = true;

        while accepting || !heap.is_empty() {
            let next_due = heap.peek().map(|Reverse(p)| p.due);
            let received = match (accepting, next_due) {
                (true, None) => rx.recv().map_err(|_| RecvTimeoutError::Disconnected),
                (true, Some(due)) => rx.recv_timeout(due.saturating_duration_since(Instant::now())),
                (false, Some(due)) => {
                    thread::sleep(due.saturating_duration_since(Instant::now()));
                    Err(RecvTimeoutError::Timeout)
                }
                (false, None) => break,
            };

            match received {
                Ok(pending) => heap.push(Reverse(pending)),
                Err(RecvTimeoutError::Timeout) => {}
                Err(RecvTimeoutError::Disconnected) => accepting = false,
            }

            let now = Instant::now();
            while heap.peek().is_some_and(|Reverse(p)| p.due <= now) {
                if let Some(Reverse(pending)) = heap.pop() {
                    Self::deliver(pending, &stats);
                }
            }
        }

        debug!(
            delivered = stats.delivered.load(Ordering::Acquire),
            "completion worker stopped"
        );
    }

    fn deliver(pending: PendingCompletion, stats: &QueueStats) {
        let PendingCompletion {
            token,
            result,
            notify,
            ..
        } = pending;

        stats.pending.fetch_sub(1, Ordering::AcqRel);
        stats.delivered.fetch_add(1, Ordering::AcqRel);
        trace!(token = token.id(), "delivering completion");

        let outcome = panic::catch_unwind(AssertUnwindSafe(|| notify(Completion { token, result })));
        if outcome.is_err() {
            warn!(token = token.id(), "completion callback panicked");
        }
    }
}

impl Drop for CompletionQueue {
    fn drop(&mut self) {
        self.tx.take();
        if let Some(worker) = self.worker.take() {
            if worker.join().is_err() {
                warn!("completion worker panicked");
            }
        }
    }
}
