//! # Event Publisher
//!
//! The engine hands over notifications only once a call has committed, as
//! one ordered batch. The bus fans each batch out to every subscriber and
//! keeps per-topic counts of what it released.

use crate::events::{EventFilter, EventTopic, GraphEvent};
use crate::subscriber::{EventStream, Subscription};
use crate::DEFAULT_CHANNEL_CAPACITY;
use parking_lot::Mutex;
use std::collections::HashMap;
use tokio::sync::broadcast;
use tracing::{debug, trace};

/// Sink for committed notifications.
///
/// Publishing never blocks, so the engine can release a batch while it
/// still holds its execution gate.
pub trait EventPublisher: Send + Sync {
    /// Publish one notification and return how many subscribers got it.
    fn publish(&self, event: GraphEvent) -> usize;

    /// Publish the notifications of one committed call, in emission order.
    ///
    /// Returns the number of notifications published.
    fn publish_committed(&self, events: Vec<GraphEvent>) -> usize {
        let count = events.len();
        for event in events {
            self.publish(event);
        }
        count
    }
}

/// Broadcast bus keeping every notification in memory until each
/// subscriber has read it or lagged past it.
pub struct InMemoryEventBus {
    sender: broadcast::Sender<GraphEvent>,
    released: Mutex<HashMap<EventTopic, u64>>,
    capacity: usize,
}

impl InMemoryEventBus {
    /// Bus with [`DEFAULT_CHANNEL_CAPACITY`].
    #[must_use]
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_CHANNEL_CAPACITY)
    }

    /// Bus buffering at most `capacity` unread notifications per subscriber.
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity.max(1));
        Self {
            sender,
            released: Mutex::new(HashMap::new()),
            capacity: capacity.max(1),
        }
    }

    /// Pull-style subscription. Sees notifications published after this call.
    #[must_use]
    pub fn subscribe(&self, filter: EventFilter) -> Subscription {
        debug!(topics = ?filter.topics, "Subscribed");
        Subscription::new(self.sender.subscribe(), filter)
    }

    /// Push-style subscription for stream combinators.
    #[must_use]
    pub fn event_stream(&self, filter: EventFilter) -> EventStream {
        debug!(topics = ?filter.topics, "Stream subscribed");
        EventStream::new(self.sender.subscribe(), filter)
    }

    /// Live subscribers and streams.
    #[must_use]
    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }

    /// Per-subscriber buffer size.
    #[must_use]
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Notifications released on `topic`. [`EventTopic::All`] counts every
    /// topic.
    #[must_use]
    pub fn published_on(&self, topic: EventTopic) -> u64 {
        let released = self.released.lock();
        match topic {
            EventTopic::All => released.values().sum(),
            topic => released.get(&topic).copied().unwrap_or(0),
        }
    }

    /// Notifications released since start-up.
    #[must_use]
    pub fn events_published(&self) -> u64 {
        self.published_on(EventTopic::All)
    }
}

impl Default for InMemoryEventBus {
    fn default() -> Self {
        Self::new()
    }
}

impl EventPublisher for InMemoryEventBus {
    fn publish(&self, event: GraphEvent) -> usize {
        let topic = event.topic();
        *self.released.lock().entry(topic).or_insert(0) += 1;

        // A send with no receivers is fine: notifications are not commands.
        let receivers = self.sender.send(event).unwrap_or(0);
        trace!(?topic, receivers, "Notification released");
        receivers
    }

    fn publish_committed(&self, events: Vec<GraphEvent>) -> usize {
        let count = events.len();
        for event in events {
            self.publish(event);
        }
        debug!(count, subscribers = self.subscriber_count(), "Committed batch released");
        count
    }
}
