//! Paced request queue
//!
//! A single worker task pulls submitted futures off an unbounded FIFO and
//! runs them one at a time. Consecutive dispatches start at least
//! `min_interval` apart, however many callers submit concurrently. Each task
//! runs on its own Tokio task so a panic is reported to its caller and the
//! worker moves on to the next item.
//!
//! An optional gate is consulted as each item comes up. When it returns a
//! value, the item is answered with it at once: no pacing wait, no dispatch,
//! and the next item's spacing still counts from the last real dispatch.

use crate::error::{ShipgenError, ShipgenResult};
use std::future::Future;
use std::pin::Pin;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tracing::{debug, error};

type Task<T> = Pin<Box<dyn Future<Output = T> + Send + 'static>>;

/// Answers an item without running it, or `None` to dispatch normally
type Gate<T> = Arc<dyn Fn() -> Option<T> + Send + Sync>;

/// A deferred unit of work plus the channel its result goes back on
struct QueueItem<T> {
    task: Task<T>,
    reply: oneshot::Sender<ShipgenResult<T>>,
    enqueued_at: Instant,
}

/// FIFO queue with a single worker and minimum dispatch spacing
pub struct PacedQueue<T> {
    sender: mpsc::UnboundedSender<QueueItem<T>>,
    pending: Arc<AtomicUsize>,
    min_interval: Duration,
    worker: JoinHandle<()>,
}

impl<T: Send + 'static> PacedQueue<T> {
    /// Start the worker. Must be called inside a Tokio runtime.
    pub fn new(min_interval: Duration) -> Self {
        Self::start(min_interval, None)
    }

    /// Start the worker with a gate checked before each dispatch
    pub fn with_gate<G>(min_interval: Duration, gate: G) -> Self
    where
        G: Fn() -> Option<T> + Send + Sync + 'static,
    {
        Self::start(min_interval, Some(Arc::new(gate)))
    }

    fn start(min_interval: Duration, gate: Option<Gate<T>>) -> Self {
        let (sender, receiver) = mpsc::unbounded_channel();
        let pending = Arc::new(AtomicUsize::new(0));
        let worker = tokio::spawn(run_worker(receiver, min_interval, pending.clone(), gate));

        Self {
            sender,
            pending,
            min_interval,
            worker,
        }
    }

    /// Enqueue `task` and wait for its output.
    ///
    /// Fails only if the worker is gone or the task panicked.
    pub async fn submit<F>(&self, task: F) -> ShipgenResult<T>
    where
        F: Future<Output = T> + Send + 'static,
    {
        let (reply, result) = oneshot::channel();
        let item = QueueItem {
            task: Box::pin(task),
            reply,
            enqueued_at: Instant::now(),
        };

        self.pending.fetch_add(1, Ordering::SeqCst);
        if self.sender.send(item).is_err() {
            self.pending.fetch_sub(1, Ordering::SeqCst);
            return Err(ShipgenError::QueueClosed);
        }

        result.await.map_err(|_| ShipgenError::QueueClosed)?
    }

    /// Items submitted but not yet finished
    pub fn pending(&self) -> usize {
        self.pending.load(Ordering::SeqCst)
    }

    pub fn min_interval(&self) -> Duration {
        self.min_interval
    }

    /// Stop accepting work, let queued items finish, and wait for the worker
    pub async fn shutdown(self) {
        let Self { sender, worker, .. } = self;
        drop(sender);
        if let Err(e) = worker.await {
            error!("Queue worker ended abnormally: {}", e);
        }
    }
}

async fn run_worker<T: Send + 'static>(
    mut receiver: mpsc::UnboundedReceiver<QueueItem<T>>,
    min_interval: Duration,
    pending: Arc<AtomicUsize>,
    gate: Option<Gate<T>>,
) {
    let mut last_dispatch: Option<Instant> = None;

    while let Some(item) = receiver.recv().await {
        if let Some(value) = gate.as_ref().and_then(|gate| gate()) {
            debug!("Gate answered a queued request without dispatching it");
            pending.fetch_sub(1, Ordering::SeqCst);
            if item.reply.send(Ok(value)).is_err() {
                debug!("Caller dropped before its result was delivered");
            }
            continue;
        }

        if let Some(last) = last_dispatch {
            let ready_at = last + min_interval;
            if Instant::now() < ready_at {
                debug!(
                    "Pacing: waiting {:?} before next dispatch",
                    ready_at - Instant::now()
                );
                tokio::time::sleep_until(ready_at).await;
            }
        }

        let dispatched_at = Instant::now();
        last_dispatch = Some(dispatched_at);
        debug!(
            "Dispatching queued request after {:?} in queue",
            dispatched_at - item.enqueued_at
        );

        let outcome = match tokio::spawn(item.task).await {
            Ok(value) => Ok(value),
            Err(e) => {
                error!("Queued request failed: {}", e);
                Err(ShipgenError::Internal(format!("queued request failed: {}", e)))
            }
        };

        pending.fetch_sub(1, Ordering::SeqCst);
        if item.reply.send(outcome).is_err() {
            debug!("Caller dropped before its result was delivered");
        }
    }

    debug!("Queue worker stopped");
}
