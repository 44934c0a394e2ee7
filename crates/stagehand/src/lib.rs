//! Stagehand -- state lifecycle management with loading screens.
//!
//! This crate ties the workspace together. It re-exports the bus
//! ([`stagehand_bus`]), the state manager ([`stagehand_state`]) and the
//! attribute editor model ([`stagehand_editor`]), and adds two helpers that
//! sit on top of the manager:
//!
//! - [`journal::TransitionJournal`] records every transition event seen on a
//!   bus and saves the record as JSON.
//! - [`loader::ScriptedLoader`] drives a pending transition to completion from
//!   a frame loop, posting progress messages on the way.
//!
//! # Quick Start
//!
//! ```
//! use std::rc::Rc;
//! use stagehand::prelude::*;
//!
//! struct Menu;
//! impl State for Menu {}
//!
//! struct Spinner;
//! impl State for Spinner {}
//!
//! let bus = Rc::new(LocalBus::new());
//! let journal = TransitionJournal::attach(&*bus);
//! let manager = StateManager::with_loading_state(bus, StateHandle::new("spinner", Spinner));
//!
//! let mut loader = ScriptedLoader::new(LoaderConfig {
//!     ticks_per_step: 1,
//!     steps: vec!["textures".into(), "sounds".into()],
//! });
//!
//! manager.set_state(Some(StateHandle::new("menu", Menu))).unwrap();
//! while loader.tick(&manager).unwrap() != LoaderStatus::Completed {}
//!
//! assert!(!manager.is_loading());
//! assert_eq!(journal.len(), 2);
//! ```

#![deny(unsafe_code)]

pub mod journal;
pub mod loader;

pub use stagehand_bus;
pub use stagehand_editor;
pub use stagehand_state;

// ---------------------------------------------------------------------------
// Error types
// ---------------------------------------------------------------------------

/// Errors produced when saving or loading a [`journal::TransitionJournal`].
#[derive(Debug, thiserror::Error)]
pub enum JournalError {
    #[error("journal serialization failed: {0}")]
    Serialization(#[from] serde_json::Error),
}

// ---------------------------------------------------------------------------
// Prelude
// ---------------------------------------------------------------------------

/// Convenience re-exports for common usage.
pub mod prelude {
    pub use stagehand_bus::prelude::*;
    pub use stagehand_editor::prelude::*;
    pub use stagehand_state::prelude::*;

    pub use crate::journal::{JournalEntry, TransitionJournal};
    pub use crate::loader::{LoaderConfig, LoaderStatus, ScriptedLoader};
    pub use crate::JournalError;
}
