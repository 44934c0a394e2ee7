//! Tick-driven loader that finishes pending transitions.
//!
//! The [`StateManager`] never decides on its own when loading is done.
//! [`ScriptedLoader`] plays that role for hosts that do not stream real
//! assets: called once per frame, it walks through a fixed list of progress
//! messages at a fixed pace and then completes the transition.
//!
//! # Example
//!
//! ```
//! use std::rc::Rc;
//! use stagehand::loader::{LoaderConfig, LoaderStatus, ScriptedLoader};
//! use stagehand_bus::bus::LocalBus;
//! use stagehand_state::prelude::*;
//!
//! struct Level;
//! impl State for Level {}
//!
//! let manager = StateManager::new(Rc::new(LocalBus::new()));
//! let mut loader = ScriptedLoader::new(LoaderConfig {
//!     ticks_per_step: 2,
//!     steps: vec!["geometry".into()],
//! });
//!
//! assert_eq!(loader.tick(&manager).unwrap(), LoaderStatus::Idle);
//!
//! manager.set_state(Some(StateHandle::new("level", Level))).unwrap();
//! assert_eq!(loader.tick(&manager).unwrap(), LoaderStatus::Waiting);
//! assert_eq!(loader.tick(&manager).unwrap(), LoaderStatus::Progress(0));
//! assert_eq!(loader.tick(&manager).unwrap(), LoaderStatus::Waiting);
//! assert_eq!(loader.tick(&manager).unwrap(), LoaderStatus::Completed);
//! assert!(!manager.is_loading());
//! ```

use serde::{Deserialize, Serialize};
use stagehand_state::manager::StateManager;
use stagehand_state::state::StateHandle;
use stagehand_state::StateError;

// ---------------------------------------------------------------------------
// LoaderConfig
// ---------------------------------------------------------------------------

/// Configuration for [`ScriptedLoader`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoaderConfig {
    /// Ticks between two consecutive steps. `0` is treated as `1`.
    pub ticks_per_step: u32,
    /// Progress messages, posted in order. The transition completes one step
    /// after the last message.
    pub steps: Vec<String>,
}

impl Default for LoaderConfig {
    fn default() -> Self {
        Self {
            ticks_per_step: 1,
            steps: Vec::new(),
        }
    }
}

// ---------------------------------------------------------------------------
// LoaderStatus
// ---------------------------------------------------------------------------

/// What a single [`ScriptedLoader::tick`] did.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LoaderStatus {
    /// No transition in flight.
    Idle,
    /// Loading, but no step boundary on this tick.
    Waiting,
    /// Posted the progress message at this index.
    Progress(usize),
    /// Called `post_loading_complete`.
    Completed,
}

// ---------------------------------------------------------------------------
// ScriptedLoader
// ---------------------------------------------------------------------------

/// Posts scripted progress to a loading manager and then completes it.
///
/// The loader notices when a new transition starts (by watching the
/// manager's started-transition counter) and restarts its script for it.
#[derive(Debug, Clone)]
pub struct ScriptedLoader {
    config: LoaderConfig,
    /// `transitions_started` of the transition being driven.
    transition: Option<u64>,
    ticks: u64,
    next_step: usize,
}

impl ScriptedLoader {
    pub fn new(config: LoaderConfig) -> Self {
        Self {
            config,
            transition: None,
            ticks: 0,
            next_step: 0,
        }
    }

    pub fn config(&self) -> &LoaderConfig {
        &self.config
    }

    /// Index of the next progress message to post.
    pub fn next_step(&self) -> usize {
        self.next_step
    }

    /// Advance by one tick.
    ///
    /// # Errors
    ///
    /// Propagates [`StateError`] from `post_loading_complete`. This only
    /// happens if a state hook already requested completion during the
    /// `set_state` that opened this loading window.
    pub fn tick(&mut self, manager: &StateManager) -> Result<LoaderStatus, StateError> {
        if !manager.is_loading() {
            self.reset(None);
            return Ok(LoaderStatus::Idle);
        }

        let started = manager.diagnostics().transitions_started;
        if self.transition != Some(started) {
            let target = manager.state();
            tracing::debug!(
                target_state = target.as_ref().map(StateHandle::name),
                steps = self.config.steps.len(),
                "scripted loading started"
            );
            self.reset(Some(started));
        }

        self.ticks += 1;
        if self.ticks % u64::from(self.config.ticks_per_step.max(1)) != 0 {
            return Ok(LoaderStatus::Waiting);
        }

        if let Some(message) = self.config.steps.get(self.next_step) {
            let step = self.next_step;
            self.next_step += 1;
            manager.post_loading_update(message);
            return Ok(LoaderStatus::Progress(step));
        }

        manager.post_loading_complete()?;
        tracing::debug!(ticks = self.ticks, "scripted loading completed");
        self.reset(None);
        Ok(LoaderStatus::Completed)
    }

    /// Tick until the transition completes or `max_ticks` is reached.
    ///
    /// Returns the number of ticks run, or `None` if loading did not finish.
    pub fn run_to_completion(&mut self, manager: &StateManager, max_ticks: u64) -> Result<Option<u64>, StateError> {
        for tick in 1..=max_ticks {
            match self.tick(manager)? {
                LoaderStatus::Completed => return Ok(Some(tick)),
                LoaderStatus::Idle => return Ok(None),
                LoaderStatus::Waiting | LoaderStatus::Progress(_) => {}
            }
        }
        Ok(None)
    }

    fn reset(&mut self, transition: Option<u64>) {
        self.transition = transition;
        self.ticks = 0;
        self.next_step = 0;
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
