//! Tokio broadcast event bus for cache change notifications.

use crate::cache::CacheEvent;
use crate::models::CollectionKey;
use tokio::sync::broadcast;

/// Default number of buffered events per subscriber.
pub const DEFAULT_EVENT_BUS_CAPACITY: usize = 256;

/// Fan-out of cache changes to views that re-render on change.
#[derive(Clone, Debug)]
pub struct EventBus {
    sender: broadcast::Sender<CacheEvent>,
}

/// Receiver that yields only events for one collection.
#[derive(Debug)]
pub struct KeyedReceiver {
    receiver: broadcast::Receiver<CacheEvent>,
    key: CollectionKey,
}

impl EventBus {
    /// Creates a new event bus with the given buffer capacity.
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        let (sender, _receiver) = broadcast::channel(capacity.max(1));
        Self { sender }
    }

    /// Publishes an event to all subscribers (best effort).
    pub fn publish(&self, event: CacheEvent) {
        metrics::counter!("cache_events_published_total").increment(1);
        if self.sender.send(event).is_err() {
            // No live receivers; nothing is listening for re-renders.
            metrics::counter!("cache_events_dropped_total").increment(1);
        }
    }

    /// Subscribes to every cache change.
    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<CacheEvent> {
        self.sender.subscribe()
    }

    /// Subscribes to changes of a single collection.
    #[must_use]
    pub fn subscribe_key(&self, key: CollectionKey) -> KeyedReceiver {
        KeyedReceiver {
            receiver: self.sender.subscribe(),
            key,
        }
    }

    /// Returns the number of live subscribers.
    #[must_use]
    pub fn receiver_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(DEFAULT_EVENT_BUS_CAPACITY)
    }
}

impl KeyedReceiver {
    /// Receives the next event for this collection.
    pub async fn recv(&mut self) -> Result<CacheEvent, broadcast::error::RecvError> {
        loop {
            match self.receiver.recv().await {
                Ok(event) if event.key == self.key => return Ok(event),
                Ok(_) => {},
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    metrics::counter!("cache_events_lagged_total").increment(skipped);
                },
                Err(err) => return Err(err),
            }
        }
    }

    /// Returns the next buffered event for this collection without waiting.
    pub fn try_recv(&mut self) -> Option<CacheEvent> {
        loop {
            match self.receiver.try_recv() {
                Ok(event) if event.key == self.key => return Some(event),
                Ok(_) => {},
                Err(broadcast::error::TryRecvError::Lagged(skipped)) => {
                    metrics::counter!("cache_events_lagged_total").increment(skipped);
                },
                Err(_) => return None,
            }
        }
    }
}
