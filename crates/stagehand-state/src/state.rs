//! The lifecycle participant contract and the shared handle the manager holds.
//!
//! A [`State`] is one macro-level application mode (menu, gameplay, pause,
//! loading screen). It receives five hooks from the
//! [`StateManager`](crate::manager::StateManager), always synchronously and
//! never overlapping for the same state. Every hook defaults to doing nothing.
//!
//! States are owned by whatever constructs them. The manager only holds
//! [`StateHandle`]s, which are cheap shared references.

use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;
use std::sync::atomic::{AtomicU64, Ordering};

use serde::{Deserialize, Serialize};
use stagehand_bus::notification::SenderId;

use crate::manager::StateManager;
use crate::signal::LifecycleSignal;

// ---------------------------------------------------------------------------
// StateId
// ---------------------------------------------------------------------------

/// Process-unique identity of a state handle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct StateId(pub u64);

impl StateId {
    fn next() -> Self {
        static NEXT: AtomicU64 = AtomicU64::new(1);
        StateId(NEXT.fetch_add(1, Ordering::Relaxed))
    }
}

impl From<StateId> for SenderId {
    fn from(id: StateId) -> Self {
        SenderId(id.0)
    }
}

impl fmt::Display for StateId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

// ---------------------------------------------------------------------------
// State
// ---------------------------------------------------------------------------

/// Lifecycle hooks for a state.
///
/// The manager passes itself to every hook, so a state can report progress
/// ([`StateManager::post_loading_update`]) or finish a pending transition
/// ([`StateManager::post_loading_complete`]) without looking the manager up
/// from global context.
///
/// # Call order
///
/// For an outgoing state `O`, a loading screen `L` and a target `A`:
///
/// - `set_state(A)`: `L.pre_start`, `O.end`, `L.start`, `O.post_end`, `A.pre_start`
/// - `post_loading_complete()`: `L.end`, `A.start`, `L.post_end`
pub trait State {
    /// The state is about to become active. Runs while hidden behind the
    /// loading screen.
    fn on_pre_start(&mut self, _manager: &StateManager) {}

    /// The state is now live.
    fn on_start(&mut self, _manager: &StateManager) {}

    /// The state is being replaced.
    fn on_end(&mut self, _manager: &StateManager) {}

    /// Final cleanup, run after the loading screen is visible.
    fn on_post_end(&mut self, _manager: &StateManager) {}

    /// A progress report forwarded to the loading screen.
    fn on_loading_progress(&mut self, _manager: &StateManager, _message: &str) {}
}

// ---------------------------------------------------------------------------
// StateRef
// ---------------------------------------------------------------------------

/// Serializable reference to a state, as carried in event payloads.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct StateRef {
    pub id: StateId,
    pub name: String,
}

// ---------------------------------------------------------------------------
// StateHandle
// ---------------------------------------------------------------------------

/// Shared reference to a state.
///
/// Cloning a handle clones the reference, not the state. Two handles are
/// equal when they refer to the same state.
#[derive(Clone)]
pub struct StateHandle {
    id: StateId,
    name: Rc<str>,
    inner: Rc<RefCell<dyn State>>,
}

impl StateHandle {
    /// Wrap a state value in a new handle.
    pub fn new<S: State + 'static>(name: impl Into<String>, state: S) -> Self {
        Self::from_shared(name, Rc::new(RefCell::new(state)))
    }

    /// Wrap an already shared state. The caller keeps typed access through
    /// its own `Rc`.
    pub fn from_shared<S: State + 'static>(name: impl Into<String>, state: Rc<RefCell<S>>) -> Self {
        let name: String = name.into();
        Self {
            id: StateId::next(),
            name: Rc::from(name),
            inner: state,
        }
    }

    pub fn id(&self) -> StateId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Payload form of this handle.
    pub fn state_ref(&self) -> StateRef {
        StateRef {
            id: self.id,
            name: self.name.to_string(),
        }
    }

    /// Whether one of this state's hooks is running further up the stack.
    pub(crate) fn is_busy(&self) -> bool {
        self.inner.try_borrow_mut().is_err()
    }

    /// Run the hook for `signal`. Returns `false` without calling anything if
    /// one of this state's hooks is already running further up the stack.
    pub(crate) fn deliver(&self, signal: &LifecycleSignal, manager: &StateManager) -> bool {
        match self.inner.try_borrow_mut() {
            Ok(mut state) => {
                signal.dispatch(&mut *state, manager);
                true
            }
            Err(_) => false,
        }
    }
}

impl PartialEq for StateHandle {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for StateHandle {}

impl fmt::Debug for StateHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StateHandle")
            .field("id", &self.id)
            .field("name", &self.name)
            .finish()
    }
}

impl fmt::Display for StateHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.name, self.id)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
