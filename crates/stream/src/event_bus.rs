// Topic-keyed event bus for internal fan-out

use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{debug, warn};

/// Default per-subscriber channel capacity.
pub const DEFAULT_SUBSCRIBER_BUFFER: usize = 256;

/// Publish/subscribe bus keyed by topic name.
///
/// Each subscriber is backed by its own bounded channel. Publishing performs
/// a non-blocking send to every subscriber registered at the start of the
/// call, in registration order; a full or closed channel is skipped, so one
/// slow consumer never stalls delivery to the rest.
///
/// Cheap to clone; clones share the same subscriber state.
pub struct EventBus<T> {
    inner: Arc<BusInner<T>>,
}

struct BusInner<T> {
    topics: RwLock<HashMap<String, Vec<SubscriberSlot<T>>>>,
    next_id: AtomicU64,
    buffer: usize,
}

struct SubscriberSlot<T> {
    id: u64,
    tx: mpsc::Sender<T>,
}

/// Identifies one subscriber registration on one topic.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubscriptionHandle {
    topic: String,
    id: u64,
}

impl SubscriptionHandle {
    pub fn topic(&self) -> &str {
        &self.topic
    }
}

impl<T> Clone for EventBus<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<T> Default for EventBus<T> {
    fn default() -> Self {
        Self::new(DEFAULT_SUBSCRIBER_BUFFER)
    }
}

impl<T> EventBus<T> {
    /// Create a bus whose subscriptions buffer up to `buffer` undelivered
    /// events each.
    pub fn new(buffer: usize) -> Self {
        Self {
            inner: Arc::new(BusInner {
                topics: RwLock::new(HashMap::new()),
                next_id: AtomicU64::new(1),
                buffer,
            }),
        }
    }

    /// Register a new subscriber on `topic`. Never fails; subscribers are
    /// delivered to in registration order.
    ///
    /// The returned [`Subscription`] unsubscribes itself when dropped, so
    /// tying it to a client connection's lifetime is enough to guarantee
    /// cleanup.
    pub fn subscribe(&self, topic: &str) -> Subscription<T> {
        let (tx, rx) = mpsc::channel(self.inner.buffer);
        let id = self.inner.next_id.fetch_add(1, Ordering::Relaxed);
        self.inner
            .topics
            .write()
            .entry(topic.to_string())
            .or_default()
            .push(SubscriberSlot { id, tx });
        debug!(topic, id, "subscriber registered");

        Subscription {
            bus: self.clone(),
            handle: SubscriptionHandle {
                topic: topic.to_string(),
                id,
            },
            rx,
            active: true,
        }
    }

    /// Remove the subscriber identified by `handle` from its topic.
    ///
    /// No-op if it was already removed. Safe to call while a `publish` on
    /// the same topic is in flight: removal waits for the in-flight delivery
    /// pass, so the subscriber may still see that event but nothing after.
    pub fn unsubscribe(&self, handle: &SubscriptionHandle) {
        let mut topics = self.inner.topics.write();
        if let Some(subs) = topics.get_mut(&handle.topic) {
            subs.retain(|s| s.id != handle.id);
            if subs.is_empty() {
                topics.remove(&handle.topic);
            }
            debug!(topic = %handle.topic, id = handle.id, "subscriber removed");
        }
    }

    /// Drop every subscription on every topic. Test isolation only.
    pub fn reset(&self) {
        self.inner.topics.write().clear();
    }

    /// Number of active subscribers on `topic`.
    pub fn subscriber_count(&self, topic: &str) -> usize {
        self.inner
            .topics
            .read()
            .get(topic)
            .map_or(0, Vec::len)
    }
}

impl<T: Clone> EventBus<T> {
    /// Deliver `payload` to every subscriber currently registered on
    /// `topic`, in registration order.
    ///
    /// Non-blocking: each delivery is a `try_send`. A subscriber whose
    /// buffer is full loses this event (logged); a closed subscriber is
    /// skipped silently. The publisher observes no delivery results.
    pub fn publish(&self, topic: &str, payload: T) {
        let topics = self.inner.topics.read();
        let Some(subs) = topics.get(topic) else {
            // No subscribers connected; expected and fine.
            debug!(topic, "event published with no subscribers");
            return;
        };

        for slot in subs {
            match slot.tx.try_send(payload.clone()) {
                Ok(()) => {}
                Err(mpsc::error::TrySendError::Full(_)) => {
                    warn!(topic, id = slot.id, "subscriber buffer full, dropping event");
                }
                Err(mpsc::error::TrySendError::Closed(_)) => {
                    debug!(topic, id = slot.id, "subscriber channel closed");
                }
            }
        }
    }
}

/// A live registration on one topic, with its receiving end.
///
/// Unsubscribes from the bus when dropped.
pub struct Subscription<T> {
    bus: EventBus<T>,
    handle: SubscriptionHandle,
    rx: mpsc::Receiver<T>,
    active: bool,
}

impl<T> Subscription<T> {
    /// Receive the next event. Returns `None` once the subscription has been
    /// removed from the bus (e.g. after `reset`) and the buffer is drained.
    pub async fn recv(&mut self) -> Option<T> {
        self.rx.recv().await
    }

    /// Non-blocking receive of an already-buffered event.
    pub fn try_recv(&mut self) -> Result<T, mpsc::error::TryRecvError> {
        self.rx.try_recv()
    }

    pub fn handle(&self) -> &SubscriptionHandle {
        &self.handle
    }

    /// Remove this subscription from the bus immediately.
    pub fn unsubscribe(mut self) {
        self.detach();
    }

    fn detach(&mut self) {
        if self.active {
            self.active = false;
            self.bus.unsubscribe(&self.handle);
        }
    }
}

impl<T> Drop for Subscription<T> {
    fn drop(&mut self) {
        self.detach();
    }
}
