//! # Event Subscriber
//!
//! Readers of relationship history. A subscriber that falls more than the
//! bus capacity behind loses the oldest notifications; every loss is logged
//! and counted in [`Subscription::missed`] so indexers can tell that their
//! history has a hole and resynchronize from the engine's read surface.

use crate::events::{EventFilter, GraphEvent};
use std::pin::Pin;
use std::task::{Context, Poll};
use thiserror::Error;
use tokio::sync::broadcast;
use tokio_stream::wrappers::errors::BroadcastStreamRecvError;
use tokio_stream::wrappers::BroadcastStream;
use tokio_stream::Stream;
use tracing::warn;

/// Errors from subscription operations.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SubscriptionError {
    /// The bus was dropped and everything buffered has been read.
    #[error("event bus closed")]
    Closed,
}

fn record_lag(missed: &mut u64, count: u64) {
    *missed += count;
    warn!(lost = count, total_lost = *missed, "Subscriber lagged, notifications lost");
}

/// Pull-style subscription.
pub struct Subscription {
    receiver: broadcast::Receiver<GraphEvent>,
    filter: EventFilter,
    missed: u64,
}

impl Subscription {
    pub(crate) fn new(receiver: broadcast::Receiver<GraphEvent>, filter: EventFilter) -> Self {
        Self {
            receiver,
            filter,
            missed: 0,
        }
    }

    /// Wait for the next matching notification.
    ///
    /// Returns `None` once the bus has been dropped and drained.
    pub async fn recv(&mut self) -> Option<GraphEvent> {
        loop {
            match self.receiver.recv().await {
                Ok(event) if self.filter.matches(&event) => return Some(event),
                Ok(_) => {}
                Err(broadcast::error::RecvError::Lagged(count)) => {
                    record_lag(&mut self.missed, count);
                }
                Err(broadcast::error::RecvError::Closed) => return None,
            }
        }
    }

    /// Next matching notification if one is buffered, `Ok(None)` otherwise.
    pub fn try_recv(&mut self) -> Result<Option<GraphEvent>, SubscriptionError> {
        loop {
            match self.receiver.try_recv() {
                Ok(event) if self.filter.matches(&event) => return Ok(Some(event)),
                Ok(_) => {}
                Err(broadcast::error::TryRecvError::Lagged(count)) => {
                    record_lag(&mut self.missed, count);
                }
                Err(broadcast::error::TryRecvError::Empty) => return Ok(None),
                Err(broadcast::error::TryRecvError::Closed) => {
                    return Err(SubscriptionError::Closed)
                }
            }
        }
    }

    /// Every matching notification currently buffered, oldest first.
    ///
    /// Lag is skipped over (and counted), so this reads up to the newest
    /// retained notification.
    pub fn drain(&mut self) -> Vec<GraphEvent> {
        let mut out = Vec::new();
        while let Ok(Some(event)) = self.try_recv() {
            out.push(event);
        }
        out
    }

    /// Notifications lost to lag so far, of any topic.
    #[must_use]
    pub fn missed(&self) -> u64 {
        self.missed
    }

    /// The filter this subscription was created with.
    #[must_use]
    pub fn filter(&self) -> &EventFilter {
        &self.filter
    }
}

/// Push-style subscription implementing [`Stream`].
pub struct EventStream {
    inner: BroadcastStream<GraphEvent>,
    filter: EventFilter,
    missed: u64,
}

impl EventStream {
    pub(crate) fn new(receiver: broadcast::Receiver<GraphEvent>, filter: EventFilter) -> Self {
        Self {
            inner: BroadcastStream::new(receiver),
            filter,
            missed: 0,
        }
    }

    /// Notifications lost to lag so far.
    #[must_use]
    pub fn missed(&self) -> u64 {
        self.missed
    }

    /// The filter this stream was created with.
    #[must_use]
    pub fn filter(&self) -> &EventFilter {
        &self.filter
    }
}

impl Stream for EventStream {
    type Item = GraphEvent;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        let this = &mut *self;
        loop {
            match Pin::new(&mut this.inner).poll_next(cx) {
                Poll::Ready(Some(Ok(event))) if this.filter.matches(&event) => {
                    return Poll::Ready(Some(event))
                }
                Poll::Ready(Some(Ok(_))) => {}
                Poll::Ready(Some(Err(BroadcastStreamRecvError::Lagged(count)))) => {
                    record_lag(&mut this.missed, count);
                }
                Poll::Ready(None) => return Poll::Ready(None),
                Poll::Pending => return Poll::Pending,
            }
        }
    }
}
