//! Synchronous fan-out from a publisher to a fixed, ordered subscriber list.

use tracing::trace;

/// Subscribers are registered explicitly and receive every publish in
/// registration order, before `publish` returns.
#[derive(Debug, Clone)]
pub struct NotificationBus<S> {
    subscribers: Vec<S>,
}

impl<S> Default for NotificationBus<S> {
    fn default() -> Self {
        Self { subscribers: Vec::new() }
    }
}

impl<S> NotificationBus<S>
where
    S: Copy + PartialEq,
{
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_subscribers(subscribers: impl IntoIterator<Item = S>) -> Self {
        let mut bus = Self::new();
        for subscriber in subscribers {
            bus.subscribe(subscriber);
        }
        bus
    }

    /// Returns false if already subscribed.
    pub fn subscribe(&mut self, subscriber: S) -> bool {
        if self.subscribers.contains(&subscriber) {
            return false;
        }
        self.subscribers.push(subscriber);
        true
    }

    pub fn unsubscribe(&mut self, subscriber: S) -> bool {
        match self.subscribers.iter().position(|s| *s == subscriber) {
            Some(index) => {
                self.subscribers.remove(index);
                true
            }
            None => false,
        }
    }

    pub fn subscribers(&self) -> &[S] {
        &self.subscribers
    }

    pub fn len(&self) -> usize {
        self.subscribers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.subscribers.is_empty()
    }

    /// Hands `event` to every subscriber in order. Returns how many were reached.
    pub fn publish<E, F>(&self, event: &E, mut deliver: F) -> usize
    where
        F: FnMut(S, &E),
    {
        for subscriber in &self.subscribers {
            deliver(*subscriber, event);
        }
        trace!(subscribers = self.subscribers.len(), "Published notification");
        self.subscribers.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn delivers_in_registration_order() {
        let bus = NotificationBus::with_subscribers([3u32, 1, 2]);
        let mut seen = Vec::new();
        let reached = bus.publish(&"nectar", |s, e| seen.push((s, *e)));
        assert_eq!(reached, 3);
        assert_eq!(seen, vec![(3, "nectar"), (1, "nectar"), (2, "nectar")]);
    }

    #[test]
    fn subscriptions_are_unique_and_removable() {
        let mut bus = NotificationBus::new();
        assert!(bus.subscribe(1u32));
        assert!(!bus.subscribe(1));
        assert!(bus.subscribe(2));
        assert!(bus.unsubscribe(1));
        assert!(!bus.unsubscribe(1));
        assert_eq!(bus.subscribers(), &[2]);
    }

    #[test]
    fn empty_bus_reaches_nobody() {
        let bus: NotificationBus<u32> = NotificationBus::new();
        assert_eq!(bus.publish(&(), |_, _| panic!("no subscribers")), 0);
        assert!(bus.is_empty());
    }
}
