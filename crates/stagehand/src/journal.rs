//! Transition journal for recording every loading window on a bus.
//!
//! A [`TransitionJournal`] subscribes to [`LOADING_STARTED`] and
//! [`LOADING_ENDED`] and appends one [`JournalEntry`] per event, numbered in
//! arrival order. The record can be saved with [`to_json`](TransitionJournal::to_json)
//! and reloaded with [`from_json`](TransitionJournal::from_json) for
//! inspection or as a regression fixture.
//!
//! # Example
//!
//! ```
//! use std::rc::Rc;
//! use stagehand::journal::TransitionJournal;
//! use stagehand_bus::bus::LocalBus;
//! use stagehand_state::prelude::*;
//!
//! struct Level;
//! impl State for Level {}
//!
//! let bus = Rc::new(LocalBus::new());
//! let journal = TransitionJournal::attach(&*bus);
//! let manager = StateManager::new(bus);
//!
//! manager.set_state(Some(StateHandle::new("level", Level))).unwrap();
//! manager.post_loading_complete().unwrap();
//!
//! let saved = journal.to_json().unwrap();
//! let loaded = TransitionJournal::from_json(&saved).unwrap();
//! assert_eq!(loaded.entries(), journal.entries());
//! ```

use std::cell::RefCell;
use std::rc::Rc;

use serde::{Deserialize, Serialize};
use stagehand_bus::bus::{NotificationBus, Subscription, SubscriptionId};
use stagehand_state::events::{TransitionEvent, LOADING_ENDED, LOADING_STARTED};

use crate::JournalError;

// ---------------------------------------------------------------------------
// JournalEntry
// ---------------------------------------------------------------------------

/// One recorded transition event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JournalEntry {
    /// Position in arrival order, starting at 0.
    pub sequence: u64,
    pub event: TransitionEvent,
}

// ---------------------------------------------------------------------------
// TransitionJournal
// ---------------------------------------------------------------------------

/// Records transition events published on a bus.
///
/// The journal stays subscribed until [`detach`](Self::detach) is called.
/// Notifications on the transition topics that do not decode are logged and
/// skipped.
#[derive(Debug, Default)]
pub struct TransitionJournal {
    entries: Rc<RefCell<Vec<JournalEntry>>>,
    subscriptions: Vec<SubscriptionId>,
}

impl TransitionJournal {
    /// Create a journal that is not attached to any bus.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a journal recording from `bus`.
    pub fn attach<B: NotificationBus + ?Sized>(bus: &B) -> Self {
        let entries: Rc<RefCell<Vec<JournalEntry>>> = Rc::default();
        let subscriptions = [LOADING_STARTED, LOADING_ENDED]
            .into_iter()
            .map(|topic| {
                let sink = entries.clone();
                bus.subscribe(Subscription::new(topic, move |notification| {
                    let Some(event) = TransitionEvent::from_notification(notification) else {
                        tracing::warn!(
                            topic = %notification.topic,
                            "malformed transition event not journaled"
                        );
                        return;
                    };
                    let mut entries = sink.borrow_mut();
                    let sequence = u64::try_from(entries.len()).unwrap_or(u64::MAX);
                    entries.push(JournalEntry { sequence, event });
                }))
            })
            .collect();
        Self {
            entries,
            subscriptions,
        }
    }

    /// Stop recording. Entries recorded so far are kept.
    pub fn detach<B: NotificationBus + ?Sized>(&mut self, bus: &B) {
        for id in self.subscriptions.drain(..) {
            bus.unsubscribe(id);
        }
    }

    pub fn is_attached(&self) -> bool {
        !self.subscriptions.is_empty()
    }

    // -- queries ------------------------------------------------------------

    /// All entries in arrival order.
    pub fn entries(&self) -> Vec<JournalEntry> {
        self.entries.borrow().clone()
    }

    pub fn len(&self) -> usize {
        self.entries.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.borrow().is_empty()
    }

    pub fn last(&self) -> Option<JournalEntry> {
        self.entries.borrow().last().cloned()
    }

    /// Entries whose transition targets a state named `name`.
    pub fn transitions_to(&self, name: &str) -> Vec<JournalEntry> {
        self.entries
            .borrow()
            .iter()
            .filter(|entry| entry.event.new_state().is_some_and(|state| state.name == name))
            .cloned()
            .collect()
    }

    /// Number of loading windows that opened but have not closed.
    pub fn open_transitions(&self) -> usize {
        self.entries
            .borrow()
            .iter()
            .fold(0usize, |open, entry| match entry.event {
                TransitionEvent::LoadingStarted { .. } => open + 1,
                TransitionEvent::LoadingEnded { .. } => open.saturating_sub(1),
            })
    }

    /// Drop all recorded entries. Numbering restarts at 0.
    pub fn clear(&self) {
        self.entries.borrow_mut().clear();
    }

    // -- persistence --------------------------------------------------------

    /// Serialize the recorded entries to pretty-printed JSON.
    pub fn to_json(&self) -> Result<String, JournalError> {
        Ok(serde_json::to_string_pretty(&*self.entries.borrow())?)
    }

    /// Load a detached journal from JSON produced by [`to_json`](Self::to_json).
    pub fn from_json(json: &str) -> Result<Self, JournalError> {
        let entries: Vec<JournalEntry> = serde_json::from_str(json)?;
        Ok(Self {
            entries: Rc::new(RefCell::new(entries)),
            subscriptions: Vec::new(),
        })
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
