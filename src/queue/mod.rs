//! Sequential fetch queue
//!
//! Serializes fetch-like operations so at most one is in flight at a time.
//! Operations run in submission order; a failure settles only its own
//! handle and never stalls the queue. `abort_all` cancels the in-flight
//! operation cooperatively and rejects everything still pending.

use std::collections::VecDeque;
use std::future::Future;
use std::pin::Pin;
use std::sync::{Arc, Mutex};
use std::task::{Context, Poll};

use futures::future::BoxFuture;
use tokio::sync::oneshot;
use tokio_util::sync::CancellationToken;

use crate::utils::error::{NavError, Result};

/// A unit of work owned by the queue from enqueue until settlement.
///
/// The operation receives a fresh cancellation token when it starts; it is
/// expected to check the token voluntarily at its suspension points.
pub type QueuedOp<T> =
    Box<dyn FnOnce(CancellationToken) -> BoxFuture<'static, Result<T>> + Send + 'static>;

/// Settlement handle returned by [`SequentialFetchQueue::enqueue`].
///
/// Resolves with the operation's result once the queue has run it, or with
/// [`NavError::Cancelled`] when the operation is discarded by
/// [`SequentialFetchQueue::abort_all`] or orphaned by runtime shutdown
/// before it runs. Dropping the queue value alone does not cancel
/// anything: the worker owns the shared state and runs what is already
/// queued to normal settlement.
pub struct QueueHandle<T> {
    rx: oneshot::Receiver<Result<T>>,
}

impl<T> Future for QueueHandle<T> {
    type Output = Result<T>;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        Pin::new(&mut self.rx).poll(cx).map(|settled| match settled {
            Ok(result) => result,
            // Sender dropped without settling: treat as cancellation
            Err(_) => Err(NavError::Cancelled),
        })
    }
}

struct PendingOp<T> {
    op: QueuedOp<T>,
    done: oneshot::Sender<Result<T>>,
}

struct QueueState<T> {
    /// FIFO of not-yet-started operations
    pending: VecDeque<PendingOp<T>>,
    /// Whether the drain worker is running
    in_flight: bool,
    /// Cancellation token of the operation currently executing
    active: Option<CancellationToken>,
}

/// Queue guaranteeing one-at-a-time, in-order execution of async operations.
///
/// `enqueue` may be called from many call sites at once (e.g. a burst of
/// hover events); all submissions are accepted and ordered by arrival.
pub struct SequentialFetchQueue<T> {
    state: Arc<Mutex<QueueState<T>>>,
}

impl<T: Send + 'static> SequentialFetchQueue<T> {
    /// Create an empty queue
    pub fn new() -> Self {
        Self {
            state: Arc::new(Mutex::new(QueueState {
                pending: VecDeque::new(),
                in_flight: false,
                active: None,
            })),
        }
    }

    /// Append an operation to the tail of the queue.
    ///
    /// Never rejects synchronously. Starts the drain worker if none is
    /// running. Must be called within a tokio runtime.
    pub fn enqueue(&self, op: QueuedOp<T>) -> QueueHandle<T> {
        let (done, rx) = oneshot::channel();
        {
            let mut state = self.state.lock().unwrap();
            state.pending.push_back(PendingOp { op, done });
        }
        self.drain();
        QueueHandle { rx }
    }

    /// Cancel the in-flight operation (if any) and reject everything still
    /// pending with [`NavError::Cancelled`]. A no-op on an empty queue.
    ///
    /// Cancellation is cooperative: the in-flight operation keeps running
    /// until it observes its token, and the worker moves on only once it
    /// settles.
    pub fn abort_all(&self) {
        let discarded: Vec<PendingOp<T>> = {
            let mut state = self.state.lock().unwrap();
            if let Some(token) = state.active.take() {
                token.cancel();
            }
            state.pending.drain(..).collect()
        };
        for pending in discarded {
            let _ = pending.done.send(Err(NavError::Cancelled));
        }
    }

    /// Number of operations waiting to start (excludes the in-flight one)
    pub fn pending_len(&self) -> usize {
        self.state.lock().unwrap().pending.len()
    }

    /// True when nothing is pending or in flight
    pub fn is_idle(&self) -> bool {
        let state = self.state.lock().unwrap();
        state.pending.is_empty() && !state.in_flight
    }

    /// Spawn the drain worker unless one is already running.
    fn drain(&self) {
        {
            let mut state = self.state.lock().unwrap();
            if state.in_flight || state.pending.is_empty() {
                return;
            }
            state.in_flight = true;
        }

        let state = Arc::clone(&self.state);
        tokio::spawn(async move {
            loop {
                let next = {
                    let mut state = state.lock().unwrap();
                    match state.pending.pop_front() {
                        Some(pending) => {
                            let token = CancellationToken::new();
                            state.active = Some(token.clone());
                            Some((pending, token))
                        }
                        None => {
                            state.in_flight = false;
                            None
                        }
                    }
                };
                let Some((PendingOp { op, done }, token)) = next else {
                    break;
                };

                let result = op(token).await;

                state.lock().unwrap().active = None;
                // Caller may have dropped its handle; that's fine
                let _ = done.send(result);
            }
        });
    }
}

impl<T: Send + 'static> Default for SequentialFetchQueue<T> {
    fn default() -> Self {
        Self::new()
    }
}
