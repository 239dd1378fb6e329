//! Fan-out of accepted events to in-process subscribers.

use std::collections::HashSet;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use parking_lot::RwLock;

use crate::event::{Event, EventKind};

/// Identifies a subscription for [`CaptureBus::unsubscribe`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionToken(u64);

type Handler = Arc<dyn Fn(&Event) + Send + Sync>;

struct Subscriber {
    token: SubscriptionToken,
    /// `None` means every kind.
    kinds: Option<HashSet<EventKind>>,
    handler: Handler,
}

/// Delivers events to subscribers filtered by kind.
///
/// Handlers run synchronously on the publishing task, outside the bus lock,
/// so a handler may subscribe or unsubscribe.
#[derive(Default)]
pub struct CaptureBus {
    next: AtomicU64,
    subscribers: RwLock<Vec<Subscriber>>,
}

impl CaptureBus {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `handler` for the given kinds; an empty filter means all kinds.
    pub fn subscribe<I, F>(&self, kinds: I, handler: F) -> SubscriptionToken
    where
        I: IntoIterator<Item = EventKind>,
        F: Fn(&Event) + Send + Sync + 'static,
    {
        let kinds: HashSet<EventKind> = kinds.into_iter().collect();
        let token = SubscriptionToken(self.next.fetch_add(1, Ordering::Relaxed));
        self.subscribers.write().push(Subscriber {
            token,
            kinds: (!kinds.is_empty()).then_some(kinds),
            handler: Arc::new(handler),
        });
        token
    }

    /// Remove a subscription. Returns whether it existed.
    pub fn unsubscribe(&self, token: SubscriptionToken) -> bool {
        let mut subscribers = self.subscribers.write();
        let before = subscribers.len();
        subscribers.retain(|s| s.token != token);
        subscribers.len() != before
    }

    /// Deliver `event` to every matching subscriber; returns how many.
    pub fn publish(&self, event: &Event) -> usize {
        let kind = event.kind();
        let handlers: Vec<Handler> = self
            .subscribers
            .read()
            .iter()
            .filter(|s| s.kinds.as_ref().is_none_or(|k| k.contains(&kind)))
            .map(|s| Arc::clone(&s.handler))
            .collect();

        for handler in &handlers {
            handler(event);
        }
        handlers.len()
    }

    pub fn subscriber_count(&self) -> usize {
        self.subscribers.read().len()
    }
}
