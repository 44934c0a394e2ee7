//! Stagehand State -- lifecycle orchestration for coarse-grained application states.
//!
//! Applications move between a handful of macro-level modes: a main menu, a
//! level, a pause screen. This crate sequences those moves around an explicit
//! two-phase loading handshake:
//!
//! - [`StateManager::set_state`](manager::StateManager::set_state) announces
//!   the transition, shows the loading screen, tears down the outgoing state
//!   and pre-starts the target.
//! - [`StateManager::post_loading_complete`](manager::StateManager::post_loading_complete)
//!   commits it, starting the target and hiding the loading screen.
//!
//! Between the two calls the host is free to stream assets or do any other
//! slow work. The manager itself never blocks or spawns.
//!
//! # Modules
//!
//! - [`state`]: the [`State`](state::State) hook trait and [`StateHandle`](state::StateHandle).
//! - [`signal`]: [`LifecycleSignal`](signal::LifecycleSignal), one per hook call.
//! - [`events`]: [`TransitionEvent`](events::TransitionEvent) published on the bus.
//! - [`manager`]: the [`StateManager`](manager::StateManager) itself.

#![deny(unsafe_code)]

pub mod events;
pub mod manager;
pub mod signal;
pub mod state;

// ---------------------------------------------------------------------------
// Error types
// ---------------------------------------------------------------------------

/// Errors produced by state manager operations.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StateError {
    /// A transition-mutating call was made in the wrong phase: `set_state` or
    /// `set_loading_state` while loading, or `post_loading_complete` while
    /// idle. The call had no effect.
    #[error("illegal transition: {operation} is not allowed while {phase}")]
    IllegalTransition {
        operation: manager::Operation,
        phase: manager::TransitionPhase,
    },
}

// ---------------------------------------------------------------------------
// Prelude
// ---------------------------------------------------------------------------

/// Convenience re-exports for common usage.
pub mod prelude {
    pub use crate::events::{TransitionEvent, LOADING_ENDED, LOADING_STARTED};
    pub use crate::manager::{
        Operation, StateManager, StateManagerConfig, TransitionDiagnostics, TransitionPhase,
    };
    pub use crate::signal::LifecycleSignal;
    pub use crate::state::{State, StateHandle, StateId, StateRef};
    pub use crate::StateError;
}
