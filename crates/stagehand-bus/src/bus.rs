//! The [`NotificationBus`] seam and the single-threaded [`LocalBus`].
//!
//! Delivery is synchronous: [`NotificationBus::publish`] returns after every
//! matching handler has run, in subscription order. Handlers may publish,
//! subscribe, or unsubscribe re-entrantly. A dispatch works on a snapshot of
//! the matching handlers taken when it starts, so subscriptions added during
//! a dispatch first see the next notification.

use std::cell::{Cell, RefCell};
use std::collections::VecDeque;
use std::fmt;
use std::rc::Rc;

use crate::notification::{Notification, SenderId, Topic};

// ---------------------------------------------------------------------------
// Handler / Subscription
// ---------------------------------------------------------------------------

/// A notification handler.
pub type Handler = Rc<dyn Fn(&Notification)>;

/// Identifies a registered subscription so it can be removed later.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SubscriptionId(pub u64);

/// A request to receive notifications on one topic.
pub struct Subscription {
    /// Topic to listen on.
    pub topic: Topic,
    /// When set, only notifications from this sender are delivered.
    pub sender: Option<SenderId>,
    /// Invoked once per delivered notification.
    pub handler: Handler,
}

impl Subscription {
    /// Listen to every notification on `topic`.
    pub fn new(topic: Topic, handler: impl Fn(&Notification) + 'static) -> Self {
        Self {
            topic,
            sender: None,
            handler: Rc::new(handler),
        }
    }

    /// Narrow the subscription to a single sender.
    pub fn from_sender(mut self, sender: SenderId) -> Self {
        self.sender = Some(sender);
        self
    }

    fn matches(&self, notification: &Notification) -> bool {
        self.topic == notification.topic
            && self.sender.map_or(true, |s| notification.sender == Some(s))
    }
}

impl fmt::Debug for Subscription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subscription")
            .field("topic", &self.topic)
            .field("sender", &self.sender)
            .finish_non_exhaustive()
    }
}

// ---------------------------------------------------------------------------
// NotificationBus
// ---------------------------------------------------------------------------

/// Publish/subscribe transport used by the state manager.
///
/// Implementations must deliver synchronously: when `publish` returns, every
/// handler subscribed at the time of the call has observed the notification.
pub trait NotificationBus {
    /// Deliver `notification` to every matching subscriber.
    fn publish(&self, notification: &Notification);

    /// Register a subscription and return its id.
    fn subscribe(&self, subscription: Subscription) -> SubscriptionId;

    /// Remove a subscription. Returns `false` if the id was not registered.
    fn unsubscribe(&self, id: SubscriptionId) -> bool;
}

// ---------------------------------------------------------------------------
// BusConfig
// ---------------------------------------------------------------------------

/// Configuration for [`LocalBus`].
#[derive(Debug, Clone, Default)]
pub struct BusConfig {
    /// Number of most recent notifications retained for inspection. `0`
    /// disables history.
    pub max_history: usize,
}

// ---------------------------------------------------------------------------
// LocalBus
// ---------------------------------------------------------------------------

/// Single-threaded in-process bus.
///
/// Not `Send`: share it behind an `Rc` within one thread.
pub struct LocalBus {
    config: BusConfig,
    next_id: Cell<u64>,
    subscriptions: RefCell<Vec<(SubscriptionId, Subscription)>>,
    history: RefCell<VecDeque<Notification>>,
}

impl LocalBus {
    /// Create a bus with no history retention.
    pub fn new() -> Self {
        Self::with_config(BusConfig::default())
    }

    /// Create a bus with the given configuration.
    pub fn with_config(config: BusConfig) -> Self {
        Self {
            config,
            next_id: Cell::new(1),
            subscriptions: RefCell::new(Vec::new()),
            history: RefCell::new(VecDeque::new()),
        }
    }

    /// Number of live subscriptions.
    pub fn subscription_count(&self) -> usize {
        self.subscriptions.borrow().len()
    }

    /// The retained notifications, oldest first.
    pub fn history(&self) -> Vec<Notification> {
        self.history.borrow().iter().cloned().collect()
    }

    /// Drop all retained notifications.
    pub fn clear_history(&self) {
        self.history.borrow_mut().clear();
    }

    fn record(&self, notification: &Notification) {
        if self.config.max_history == 0 {
            return;
        }
        let mut history = self.history.borrow_mut();
        if history.len() == self.config.max_history {
            history.pop_front();
        }
        history.push_back(notification.clone());
    }
}

impl Default for LocalBus {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for LocalBus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LocalBus")
            .field("config", &self.config)
            .field("subscriptions", &self.subscription_count())
            .finish_non_exhaustive()
    }
}

impl NotificationBus for LocalBus {
    fn publish(&self, notification: &Notification) {
        self.record(notification);

        // Snapshot so handlers can touch the subscription list.
        let handlers: Vec<Handler> = self
            .subscriptions
            .borrow()
            .iter()
            .filter(|(_, s)| s.matches(notification))
            .map(|(_, s)| s.handler.clone())
            .collect();

        tracing::trace!(
            topic = %notification.topic,
            sender = ?notification.sender,
            handlers = handlers.len(),
            "publish"
        );

        for handler in handlers {
            handler(notification);
        }
    }

    fn subscribe(&self, subscription: Subscription) -> SubscriptionId {
        let id = SubscriptionId(self.next_id.get());
        self.next_id.set(id.0 + 1);
        self.subscriptions.borrow_mut().push((id, subscription));
        id
    }

    fn unsubscribe(&self, id: SubscriptionId) -> bool {
        let mut subs = self.subscriptions.borrow_mut();
        let before = subs.len();
        subs.retain(|(sid, _)| *sid != id);
        subs.len() != before
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::notification::Payload;

    const PING: Topic = Topic::from_static("test.ping");
    const PONG: Topic = Topic::from_static("test.pong");

    fn recorder(bus: &LocalBus, sub: impl FnOnce(Handler) -> Subscription) -> Rc<RefCell<Vec<Notification>>> {
        let seen = Rc::new(RefCell::new(Vec::new()));
        let sink = seen.clone();
        bus.subscribe(sub(Rc::new(move |n: &Notification| sink.borrow_mut().push(n.clone()))));
        seen
    }

    fn on(topic: Topic) -> impl FnOnce(Handler) -> Subscription {
        move |handler| Subscription {
            topic,
            sender: None,
            handler,
        }
    }

    // -- topic routing ------------------------------------------------------

    #[test]
    fn publish_reaches_only_matching_topic() {
        let bus = LocalBus::new();
        let pings = recorder(&bus, on(PING));
        let pongs = recorder(&bus, on(PONG));

        bus.publish(&Notification::new(PING));

        assert_eq!(pings.borrow().len(), 1);
        assert!(pongs.borrow().is_empty());
    }

    #[test]
    fn sender_filter_drops_other_senders() {
        let bus = LocalBus::new();
        let seen = recorder(&bus, |h| on(PING)(h).from_sender(SenderId(1)));

        bus.publish(&Notification::new(PING).from_sender(SenderId(2)));
        bus.publish(&Notification::new(PING));
        bus.publish(&Notification::new(PING).from_sender(SenderId(1)));

        let seen = seen.borrow();
        assert_eq!(seen.len(), 1);
        assert_eq!(seen[0].sender, Some(SenderId(1)));
    }

    #[test]
    fn handlers_run_in_subscription_order() {
        let bus = LocalBus::new();
        let order = Rc::new(RefCell::new(Vec::new()));
        for i in 0..3 {
            let order = order.clone();
            bus.subscribe(Subscription::new(PING, move |_| order.borrow_mut().push(i)));
        }
        bus.publish(&Notification::new(PING));
        assert_eq!(*order.borrow(), vec![0, 1, 2]);
    }

    // -- subscription management ---------------------------------------------

    #[test]
    fn unsubscribe_stops_delivery() {
        let bus = LocalBus::new();
        let hits = Rc::new(Cell::new(0));
        let counter = hits.clone();
        let id = bus.subscribe(Subscription::new(PING, move |_| counter.set(counter.get() + 1)));

        bus.publish(&Notification::new(PING));
        assert!(bus.unsubscribe(id));
        assert!(!bus.unsubscribe(id));
        bus.publish(&Notification::new(PING));

        assert_eq!(hits.get(), 1);
        assert_eq!(bus.subscription_count(), 0);
    }

    #[test]
    fn subscribing_during_dispatch_takes_effect_next_publish() {
        let bus = Rc::new(LocalBus::new());
        let late_hits = Rc::new(Cell::new(0));

        let bus_in_handler = Rc::downgrade(&bus);
        let late = late_hits.clone();
        bus.subscribe(Subscription::new(PING, move |_| {
            if let Some(bus) = bus_in_handler.upgrade() {
                let late = late.clone();
                bus.subscribe(Subscription::new(PING, move |_| late.set(late.get() + 1)));
            }
        }));

        bus.publish(&Notification::new(PING));
        assert_eq!(late_hits.get(), 0);
        bus.publish(&Notification::new(PING));
        assert_eq!(late_hits.get(), 1);
    }

    #[test]
    fn publishing_from_a_handler_is_allowed() {
        let bus = Rc::new(LocalBus::new());
        let pongs = recorder(&bus, on(PONG));

        let weak = Rc::downgrade(&bus);
        bus.subscribe(Subscription::new(PING, move |_| {
            if let Some(bus) = weak.upgrade() {
                bus.publish(&Notification::new(PONG));
            }
        }));

        bus.publish(&Notification::new(PING));
        assert_eq!(pongs.borrow().len(), 1);
    }

    // -- history --------------------------------------------------------------

    #[test]
    fn history_disabled_by_default() {
        let bus = LocalBus::new();
        bus.publish(&Notification::new(PING));
        assert!(bus.history().is_empty());
    }

    #[test]
    fn history_is_bounded_and_keeps_newest() {
        let bus = LocalBus::with_config(BusConfig { max_history: 2 });
        for i in 0..5 {
            bus.publish(&Notification::new(PING).with_payload(Payload::new().with("i", i)));
        }
        let history = bus.history();
        assert_eq!(history.len(), 2);
        assert_eq!(history[0].payload.get("i"), Some(&serde_json::json!(3)));
        assert_eq!(history[1].payload.get("i"), Some(&serde_json::json!(4)));

        bus.clear_history();
        assert!(bus.history().is_empty());
    }
}
