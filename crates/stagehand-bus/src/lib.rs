//! Stagehand Bus -- in-process publish/subscribe for state lifecycle traffic.
//!
//! The bus carries tagged [`Notification`]s: a [`Topic`], an optional
//! [`SenderId`], and a loose key-value [`Payload`]. Subscribers register a
//! handler for one topic, optionally narrowed to a single sender.
//!
//! The [`NotificationBus`] trait is the seam the state manager depends on, so
//! a host application can route notifications into its own event system.
//! [`LocalBus`] is the single-threaded implementation shipped with the crate.
//!
//! # Quick Start
//!
//! ```
//! use std::cell::Cell;
//! use std::rc::Rc;
//! use stagehand_bus::prelude::*;
//!
//! const PING: Topic = Topic::from_static("demo.ping");
//!
//! let bus = LocalBus::new();
//! let hits = Rc::new(Cell::new(0));
//! let counter = hits.clone();
//! bus.subscribe(Subscription::new(PING, move |_n| counter.set(counter.get() + 1)));
//!
//! bus.publish(&Notification::new(PING));
//! assert_eq!(hits.get(), 1);
//! ```

#![deny(unsafe_code)]

pub mod bus;
pub mod notification;

// ---------------------------------------------------------------------------
// Prelude
// ---------------------------------------------------------------------------

/// Convenience re-exports for common usage.
pub mod prelude {
    pub use crate::bus::{BusConfig, Handler, LocalBus, NotificationBus, Subscription, SubscriptionId};
    pub use crate::notification::{Notification, Payload, SenderId, Topic};
}
