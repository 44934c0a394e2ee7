//! Transition events broadcast by the manager.
//!
//! Two topics bracket the loading window:
//!
//! - [`LOADING_STARTED`] with payload keys `old` and `new`
//! - [`LOADING_ENDED`] with payload key `new`
//!
//! Each key holds a [`StateRef`] object (`{"id": .., "name": ..}`) or `null`
//! when no state is involved.

use serde::{Deserialize, Serialize};
use stagehand_bus::notification::{Notification, Payload, Topic};

use crate::state::StateRef;

/// Published by `set_state` once the target has been pre-started.
pub const LOADING_STARTED: Topic = Topic::from_static("state.loading_started");
/// Published by `post_loading_complete` once the target has started.
pub const LOADING_ENDED: Topic = Topic::from_static("state.loading_ended");

pub const OLD_KEY: &str = "old";
pub const NEW_KEY: &str = "new";

/// A transition event in typed form.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum TransitionEvent {
    /// The loading window opened.
    LoadingStarted {
        old: Option<StateRef>,
        new: Option<StateRef>,
    },
    /// The loading window closed and `new` is live.
    LoadingEnded { new: Option<StateRef> },
}

impl TransitionEvent {
    pub fn topic(&self) -> Topic {
        match self {
            TransitionEvent::LoadingStarted { .. } => LOADING_STARTED,
            TransitionEvent::LoadingEnded { .. } => LOADING_ENDED,
        }
    }

    /// The state the transition moves to.
    pub fn new_state(&self) -> Option<&StateRef> {
        match self {
            TransitionEvent::LoadingStarted { new, .. } | TransitionEvent::LoadingEnded { new } => {
                new.as_ref()
            }
        }
    }

    /// Encode as a bus notification.
    pub fn to_notification(&self) -> Notification {
        let payload = match self {
            TransitionEvent::LoadingStarted { old, new } => Payload::new()
                .with(OLD_KEY, state_ref_value(old))
                .with(NEW_KEY, state_ref_value(new)),
            TransitionEvent::LoadingEnded { new } => {
                Payload::new().with(NEW_KEY, state_ref_value(new))
            }
        };
        Notification::new(self.topic()).with_payload(payload)
    }

    /// Decode a bus notification. Returns `None` for other topics or for
    /// payloads that do not carry well-formed state references.
    pub fn from_notification(notification: &Notification) -> Option<Self> {
        let payload = &notification.payload;
        if notification.topic == LOADING_STARTED {
            Some(TransitionEvent::LoadingStarted {
                old: state_ref_from(payload, OLD_KEY)?,
                new: state_ref_from(payload, NEW_KEY)?,
            })
        } else if notification.topic == LOADING_ENDED {
            Some(TransitionEvent::LoadingEnded {
                new: state_ref_from(payload, NEW_KEY)?,
            })
        } else {
            None
        }
    }
}

fn state_ref_value(state: &Option<StateRef>) -> serde_json::Value {
    match state {
        Some(r) => serde_json::json!({ "id": r.id.0, "name": r.name }),
        None => serde_json::Value::Null,
    }
}

/// Outer `None`: malformed. Inner `None`: explicitly no state.
fn state_ref_from(payload: &Payload, key: &str) -> Option<Option<StateRef>> {
    match payload.get(key)? {
        serde_json::Value::Null => Some(None),
        value => serde_json::from_value(value.clone()).ok().map(Some),
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::StateId;

    fn menu() -> StateRef {
        StateRef {
            id: StateId(1),
            name: "menu".to_owned(),
        }
    }

    fn level() -> StateRef {
        StateRef {
            id: StateId(2),
            name: "level".to_owned(),
        }
    }

    #[test]
    fn loading_started_payload_shape() {
        let event = TransitionEvent::LoadingStarted {
            old: Some(menu()),
            new: Some(level()),
        };
        let n = event.to_notification();
        assert_eq!(n.topic, LOADING_STARTED);
        assert_eq!(n.sender, None);
        assert_eq!(n.payload.get(OLD_KEY).unwrap()["name"], "menu");
        assert_eq!(n.payload.get(NEW_KEY).unwrap()["id"], 2);
        assert_eq!(TransitionEvent::from_notification(&n), Some(event));
    }

    #[test]
    fn absent_states_encode_as_null() {
        let event = TransitionEvent::LoadingStarted {
            old: None,
            new: Some(level()),
        };
        let n = event.to_notification();
        assert_eq!(n.payload.get(OLD_KEY), Some(&serde_json::Value::Null));
        assert_eq!(TransitionEvent::from_notification(&n), Some(event));
    }

    #[test]
    fn loading_ended_only_carries_new() {
        let event = TransitionEvent::LoadingEnded { new: Some(level()) };
        let n = event.to_notification();
        assert_eq!(n.payload.len(), 1);
        assert_eq!(event.new_state(), Some(&level()));
        assert_eq!(TransitionEvent::from_notification(&n), Some(event));
    }

    #[test]
    fn malformed_payload_is_rejected() {
        let n = Notification::new(LOADING_ENDED)
            .with_payload(Payload::new().with(NEW_KEY, "not a state"));
        assert_eq!(TransitionEvent::from_notification(&n), None);

        let missing = Notification::new(LOADING_STARTED)
            .with_payload(Payload::new().with(NEW_KEY, serde_json::Value::Null));
        assert_eq!(TransitionEvent::from_notification(&missing), None);
    }

    #[test]
    fn tagged_json_form() {
        let event = TransitionEvent::LoadingEnded { new: None };
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["event"], "loading_ended");
        assert!(json["new"].is_null());
    }
}
