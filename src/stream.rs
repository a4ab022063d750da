//! Multicast value streams
//!
//! A [`Stream`] carries JSON values from one producer (a service operation, a
//! DOM event, a timeline, the runtime log) to any number of subscribers.
//! Every subscriber runs on its own tokio task, so a slow target never blocks
//! the producer. Streams created with [`Stream::with_replay`] hand their latest
//! value to late subscribers, which is what service results need: the
//! response may arrive before the binding has finished subscribing.

use parking_lot::Mutex;
use serde_json::Value;
use std::sync::{Arc, Weak};
use std::time::Duration;
use tokio::sync::broadcast::{self, error::RecvError};
use tokio::task::{AbortHandle, JoinHandle};
use tokio::time::Instant;
use tracing::{debug, warn};

struct StreamInner {
    name: String,
    capacity: usize,
    replay: bool,
    values: broadcast::Sender<Value>,
    errors: broadcast::Sender<String>,
    latest: Mutex<Option<Value>>,
    // Task feeding a derived stream; it dies with the last handle.
    feed: Mutex<Option<AbortHandle>>,
}

impl Drop for StreamInner {
    fn drop(&mut self) {
        if let Some(feed) = self.feed.get_mut().take() {
            feed.abort();
        }
    }
}

/// Cloneable handle on a multicast stream of JSON values
#[derive(Clone)]
pub struct Stream {
    inner: Arc<StreamInner>,
}

impl std::fmt::Debug for Stream {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Stream")
            .field("name", &self.inner.name)
            .field("replay", &self.inner.replay)
            .field("subscribers", &self.subscriber_count())
            .finish()
    }
}

impl Stream {
    /// Create a stream that only delivers values pushed after subscription
    pub fn new(name: impl Into<String>, capacity: usize) -> Self {
        Self::build(name.into(), capacity, false)
    }

    /// Create a stream that replays its latest value to new subscribers
    pub fn with_replay(name: impl Into<String>, capacity: usize) -> Self {
        Self::build(name.into(), capacity, true)
    }

    fn build(name: String, capacity: usize, replay: bool) -> Self {
        let capacity = capacity.max(1);
        let (values, _) = broadcast::channel(capacity);
        let (errors, _) = broadcast::channel(capacity);
        Self {
            inner: Arc::new(StreamInner {
                name,
                capacity,
                replay,
                values,
                errors,
                latest: Mutex::new(None),
                feed: Mutex::new(None),
            }),
        }
    }

    fn downgrade(&self) -> Weak<StreamInner> {
        Arc::downgrade(&self.inner)
    }

    pub fn name(&self) -> &str {
        &self.inner.name
    }

    /// Whether two handles point at the same stream
    pub fn same_stream(&self, other: &Stream) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }

    /// Number of live value subscribers
    pub fn subscriber_count(&self) -> usize {
        self.inner.values.receiver_count()
    }

    /// Latest pushed value (replaying streams only)
    pub fn latest(&self) -> Option<Value> {
        self.inner.latest.lock().clone()
    }

    /// Push a value to every subscriber
    pub fn push(&self, value: Value) {
        let mut latest = self.inner.latest.lock();
        if self.inner.replay {
            *latest = Some(value.clone());
        }
        // No receiver is not an error: nobody is listening yet.
        let _ = self.inner.values.send(value);
    }

    /// Push an error message on the error channel
    pub fn push_error(&self, message: impl Into<String>) {
        let _ = self.inner.errors.send(message.into());
    }

    /// Subscribe a callback to every value
    pub fn subscribe<F>(&self, callback: F) -> Subscription
    where
        F: Fn(Value) + Send + Sync + 'static,
    {
        let (receiver, replayed) = {
            let latest = self.inner.latest.lock();
            (self.inner.values.subscribe(), latest.clone())
        };
        let name = self.inner.name.clone();

        let handle = tokio::spawn(async move {
            if let Some(value) = replayed {
                callback(value);
            }
            forward(receiver, name, callback).await;
        });

        Subscription::new(handle)
    }

    /// Subscribe a callback to the error channel
    pub fn on_error<F>(&self, callback: F) -> Subscription
    where
        F: Fn(String) + Send + Sync + 'static,
    {
        let receiver = self.inner.errors.subscribe();
        let name = format!("{}:errors", self.inner.name);
        Subscription::new(tokio::spawn(forward(receiver, name, callback)))
    }

    /// Derived stream emitting a value once the source has been quiet for `window`
    pub fn debounce(&self, window: Duration) -> Stream {
        let output = Self::build(
            format!("{}:debounce", self.inner.name),
            self.inner.capacity,
            self.inner.replay,
        );
        let target = output.downgrade();
        let mut receiver = self.inner.values.subscribe();

        let feed = tokio::spawn(async move {
            let mut pending: Option<Value> = None;
            loop {
                tokio::select! {
                    received = receiver.recv() => match received {
                        Ok(value) => pending = Some(value),
                        Err(RecvError::Lagged(skipped)) => {
                            debug!("Debounce skipped {} values", skipped);
                        }
                        Err(RecvError::Closed) => break,
                    },
                    _ = tokio::time::sleep(window), if pending.is_some() => {
                        let Some(stream) = target.upgrade() else { break };
                        if let Some(value) = pending.take() {
                            Stream { inner: stream }.push(value);
                        }
                    }
                }
            }

            if let (Some(value), Some(stream)) = (pending, target.upgrade()) {
                Stream { inner: stream }.push(value);
            }
        });
        *output.inner.feed.lock() = Some(feed.abort_handle());

        output
    }

    /// Derived stream emitting the first value at once and dropping any value
    /// that arrives within `window` of the last emitted one
    pub fn debounce_immediate(&self, window: Duration) -> Stream {
        let output = Self::build(
            format!("{}:debounce_immediate", self.inner.name),
            self.inner.capacity,
            self.inner.replay,
        );
        let target = output.downgrade();
        let mut receiver = self.inner.values.subscribe();

        let feed = tokio::spawn(async move {
            let mut last_emit: Option<Instant> = None;
            loop {
                match receiver.recv().await {
                    Ok(value) => {
                        let now = Instant::now();
                        if last_emit.is_some_and(|at| now.duration_since(at) < window) {
                            continue;
                        }
                        let Some(stream) = target.upgrade() else { break };
                        last_emit = Some(now);
                        Stream { inner: stream }.push(value);
                    }
                    Err(RecvError::Lagged(_)) => continue,
                    Err(RecvError::Closed) => break,
                }
            }
        });
        *output.inner.feed.lock() = Some(feed.abort_handle());

        output
    }
}

async fn forward<T, F>(mut receiver: broadcast::Receiver<T>, name: String, callback: F)
where
    T: Clone,
    F: Fn(T),
{
    loop {
        match receiver.recv().await {
            Ok(value) => callback(value),
            Err(RecvError::Lagged(skipped)) => {
                warn!("Subscriber of stream {} lagged, {} values skipped", name, skipped);
            }
            Err(RecvError::Closed) => break,
        }
    }
}

/// Live subscription on a [`Stream`]
///
/// Dropping the subscription unsubscribes it.
#[derive(Debug)]
pub struct Subscription {
    handle: Option<JoinHandle<()>>,
}

impl Subscription {
    fn new(handle: JoinHandle<()>) -> Self {
        Self {
            handle: Some(handle),
        }
    }

    /// Stop delivering values; calling it twice is a no-op
    pub fn unsubscribe(&mut self) {
        if let Some(handle) = self.handle.take() {
            handle.abort();
        }
    }

    pub fn is_active(&self) -> bool {
        self.handle.as_ref().is_some_and(|h| !h.is_finished())
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.unsubscribe();
    }
}
