//! Per-component serialized task queue
//!
//! Every render and update of a component is a step on its queue. One worker
//! task drains the queue in FIFO order and awaits each step to completion
//! before starting the next, so a component never has two steps in flight.
//! A failed or panicking step resolves its own ticket with an error and the
//! worker moves on to the next step.

use crate::error::{UiError, UiResult};
use futures::FutureExt;
use parking_lot::Mutex;
use std::future::Future;
use std::panic::AssertUnwindSafe;
use std::pin::Pin;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::task::{Context, Poll};
use tokio::sync::{mpsc, oneshot};
use tracing::{debug, error};

type Job = Pin<Box<dyn Future<Output = ()> + Send + 'static>>;

/// FIFO of asynchronous steps executed by a single worker
pub struct TaskQueue {
    label: String,
    sender: Mutex<Option<mpsc::UnboundedSender<Job>>>,
    pending: Arc<AtomicUsize>,
}

impl TaskQueue {
    pub fn new(label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            sender: Mutex::new(None),
            pending: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    /// Steps enqueued and not yet finished
    pub fn pending(&self) -> usize {
        self.pending.load(Ordering::SeqCst)
    }

    /// Append a step; it starts once every earlier step has settled
    ///
    /// The step is queued immediately, whether or not the ticket is awaited.
    pub fn enqueue<F>(&self, work: F) -> QueueTicket
    where
        F: Future<Output = UiResult<()>> + Send + 'static,
    {
        let (result_tx, result_rx) = oneshot::channel();
        let pending = self.pending.clone();
        let label = self.label.clone();

        let job: Job = Box::pin(async move {
            let result = match AssertUnwindSafe(work).catch_unwind().await {
                Ok(result) => result,
                Err(_) => {
                    error!("Queued step panicked in {}", label);
                    Err(UiError::TaskPanicked(label))
                }
            };
            pending.fetch_sub(1, Ordering::SeqCst);
            let _ = result_tx.send(result);
        });

        self.pending.fetch_add(1, Ordering::SeqCst);
        let mut sender = self.sender.lock();
        let sender = sender.get_or_insert_with(|| self.spawn_worker());
        if sender.send(job).is_err() {
            self.pending.fetch_sub(1, Ordering::SeqCst);
            debug!("Task queue {} has no worker", self.label);
        }

        QueueTicket {
            label: self.label.clone(),
            receiver: result_rx,
        }
    }

    fn spawn_worker(&self) -> mpsc::UnboundedSender<Job> {
        let (tx, mut rx) = mpsc::unbounded_channel::<Job>();
        let label = self.label.clone();
        tokio::spawn(async move {
            while let Some(job) = rx.recv().await {
                job.await;
            }
            debug!("Task queue worker {} stopped", label);
        });
        tx
    }
}

impl std::fmt::Debug for TaskQueue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TaskQueue")
            .field("label", &self.label)
            .field("pending", &self.pending())
            .finish()
    }
}

/// Completion of one queued step
#[must_use = "the step runs regardless; await the ticket to observe its result"]
pub struct QueueTicket {
    label: String,
    receiver: oneshot::Receiver<UiResult<()>>,
}

impl Future for QueueTicket {
    type Output = UiResult<()>;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        match Pin::new(&mut self.receiver).poll(cx) {
            Poll::Ready(Ok(result)) => Poll::Ready(result),
            Poll::Ready(Err(_)) => Poll::Ready(Err(UiError::QueueClosed(self.label.clone()))),
            Poll::Pending => Poll::Pending,
        }
    }
}
