//! Notification envelope: topic, sender, and loose key-value payload.

use std::borrow::Cow;
use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Topic
// ---------------------------------------------------------------------------

/// Name of a notification stream, e.g. `"state.loading_started"`.
///
/// Topics compare by string value. Well-known topics are declared as
/// constants with [`Topic::from_static`].
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Topic(Cow<'static, str>);

impl Topic {
    /// Build a topic from a static string, usable in `const` items.
    pub const fn from_static(name: &'static str) -> Self {
        Topic(Cow::Borrowed(name))
    }

    /// Build a topic from a runtime string.
    pub fn new(name: impl Into<String>) -> Self {
        Topic(Cow::Owned(name.into()))
    }

    /// The topic name.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Topic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

// ---------------------------------------------------------------------------
// SenderId
// ---------------------------------------------------------------------------

/// Identity of the object a notification is sent from.
///
/// Subscribers may filter on it to receive only the notifications sent by
/// one particular object.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct SenderId(pub u64);

// ---------------------------------------------------------------------------
// Payload
// ---------------------------------------------------------------------------

/// Loose key-value payload carried by a [`Notification`].
///
/// Keys are kept sorted so that serialized payloads are stable.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Payload(BTreeMap<String, serde_json::Value>);

impl Payload {
    /// Create an empty payload.
    pub fn new() -> Self {
        Self(BTreeMap::new())
    }

    /// Builder-style insert.
    pub fn with(mut self, key: impl Into<String>, value: impl Into<serde_json::Value>) -> Self {
        self.insert(key, value);
        self
    }

    /// Insert or replace a value.
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<serde_json::Value>) {
        self.0.insert(key.into(), value.into());
    }

    /// Look up a value by key.
    pub fn get(&self, key: &str) -> Option<&serde_json::Value> {
        self.0.get(key)
    }

    /// Look up a string value by key. Returns `None` for missing keys and
    /// non-string values.
    pub fn get_str(&self, key: &str) -> Option<&str> {
        self.0.get(key).and_then(|v| v.as_str())
    }

    /// Number of entries.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Returns `true` if the payload carries no entries.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Iterate entries in key order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &serde_json::Value)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v))
    }
}

// ---------------------------------------------------------------------------
// Notification
// ---------------------------------------------------------------------------

/// A tagged notification. Delivery requires no response from subscribers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Notification {
    /// Stream this notification belongs to.
    pub topic: Topic,
    /// The object the notification is sent from, if any.
    pub sender: Option<SenderId>,
    /// Event data.
    pub payload: Payload,
}

impl Notification {
    /// A notification with no sender and an empty payload.
    pub fn new(topic: Topic) -> Self {
        Self {
            topic,
            sender: None,
            payload: Payload::new(),
        }
    }

    /// Attach a sender.
    pub fn from_sender(mut self, sender: SenderId) -> Self {
        self.sender = Some(sender);
        self
    }

    /// Replace the payload.
    pub fn with_payload(mut self, payload: Payload) -> Self {
        self.payload = payload;
        self
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
