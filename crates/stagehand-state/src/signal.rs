//! Lifecycle signals delivered to individual states.
//!
//! Every hook invocation the manager performs is described by a
//! [`LifecycleSignal`]. The signal is dispatched to the matching [`State`]
//! method and, unless disabled in
//! [`StateManagerConfig`](crate::manager::StateManagerConfig), mirrored on the
//! bus as a notification sent from the target state. A subscriber narrowed to
//! one state's [`SenderId`] then sees exactly the hooks that state receives.

use stagehand_bus::notification::{Notification, Payload, SenderId, Topic};

use crate::manager::StateManager;
use crate::state::{State, StateId};

/// Topic for [`LifecycleSignal::PreStart`].
pub const PRE_START: Topic = Topic::from_static("state.pre_start");
/// Topic for [`LifecycleSignal::Start`].
pub const START: Topic = Topic::from_static("state.start");
/// Topic for [`LifecycleSignal::End`].
pub const END: Topic = Topic::from_static("state.end");
/// Topic for [`LifecycleSignal::PostEnd`].
pub const POST_END: Topic = Topic::from_static("state.post_end");
/// Topic for [`LifecycleSignal::LoadingProgress`]. Payload key: `message`.
pub const LOADING_PROGRESS: Topic = Topic::from_static("state.loading_progress");

/// Payload key carrying the progress text.
pub const MESSAGE_KEY: &str = "message";

/// One lifecycle hook invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LifecycleSignal {
    PreStart,
    Start,
    End,
    PostEnd,
    LoadingProgress { message: String },
}

impl LifecycleSignal {
    /// The bus topic this signal is published on.
    pub fn topic(&self) -> Topic {
        match self {
            LifecycleSignal::PreStart => PRE_START,
            LifecycleSignal::Start => START,
            LifecycleSignal::End => END,
            LifecycleSignal::PostEnd => POST_END,
            LifecycleSignal::LoadingProgress { .. } => LOADING_PROGRESS,
        }
    }

    /// Short name for logs.
    pub fn name(&self) -> &'static str {
        match self {
            LifecycleSignal::PreStart => "pre_start",
            LifecycleSignal::Start => "start",
            LifecycleSignal::End => "end",
            LifecycleSignal::PostEnd => "post_end",
            LifecycleSignal::LoadingProgress { .. } => "loading_progress",
        }
    }

    /// Notification sent from `target`.
    pub fn to_notification(&self, target: StateId) -> Notification {
        let notification = Notification::new(self.topic()).from_sender(target.into());
        match self {
            LifecycleSignal::LoadingProgress { message } => {
                notification.with_payload(Payload::new().with(MESSAGE_KEY, message.as_str()))
            }
            _ => notification,
        }
    }

    /// Decode a lifecycle notification. Returns the target and the signal, or
    /// `None` for other topics and for notifications without a sender.
    pub fn from_notification(notification: &Notification) -> Option<(StateId, Self)> {
        let SenderId(raw) = notification.sender?;
        let signal = match notification.topic.as_str() {
            t if t == PRE_START.as_str() => LifecycleSignal::PreStart,
            t if t == START.as_str() => LifecycleSignal::Start,
            t if t == END.as_str() => LifecycleSignal::End,
            t if t == POST_END.as_str() => LifecycleSignal::PostEnd,
            t if t == LOADING_PROGRESS.as_str() => LifecycleSignal::LoadingProgress {
                message: notification
                    .payload
                    .get_str(MESSAGE_KEY)
                    .unwrap_or_default()
                    .to_owned(),
            },
            _ => return None,
        };
        Some((StateId(raw), signal))
    }

    /// Invoke the matching hook on `state`.
    pub fn dispatch(&self, state: &mut dyn State, manager: &StateManager) {
        match self {
            LifecycleSignal::PreStart => state.on_pre_start(manager),
            LifecycleSignal::Start => state.on_start(manager),
            LifecycleSignal::End => state.on_end(manager),
            LifecycleSignal::PostEnd => state.on_post_end(manager),
            LifecycleSignal::LoadingProgress { message } => {
                state.on_loading_progress(manager, message)
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
