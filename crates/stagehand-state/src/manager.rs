//! Two-phase state transition orchestration.
//!
//! The [`StateManager`] moves the application from one [`State`](crate::state::State)
//! to the next behind an optional loading screen. A transition is split in two
//! calls so that heavy work can happen in between:
//!
//! 1. [`set_state`](StateManager::set_state) tears down the outgoing state,
//!    shows the loading screen, pre-starts the target, and publishes
//!    [`LOADING_STARTED`](crate::events::LOADING_STARTED). The manager is now
//!    in [`TransitionPhase::Loading`].
//! 2. [`post_loading_complete`](StateManager::post_loading_complete) hides the
//!    loading screen, starts the target, and publishes
//!    [`LOADING_ENDED`](crate::events::LOADING_ENDED). The manager is back in
//!    [`TransitionPhase::Idle`].
//!
//! The manager performs no asynchronous work itself. Whoever drives loading
//! decides when to call `post_loading_complete`.
//!
//! # Example
//!
//! ```
//! use std::rc::Rc;
//! use stagehand_bus::bus::LocalBus;
//! use stagehand_state::prelude::*;
//!
//! struct Menu;
//! impl State for Menu {}
//!
//! let manager = StateManager::new(Rc::new(LocalBus::new()));
//! let menu = StateHandle::new("menu", Menu);
//!
//! manager.set_state(Some(menu.clone())).unwrap();
//! assert_eq!(manager.state(), Some(menu));
//! assert_eq!(manager.phase(), TransitionPhase::Loading);
//!
//! manager.post_loading_complete().unwrap();
//! assert_eq!(manager.phase(), TransitionPhase::Idle);
//! ```

use std::cell::{Cell, RefCell};
use std::fmt;
use std::rc::Rc;
use std::time::{Duration, Instant};

use serde::{Deserialize, Serialize};
use stagehand_bus::bus::NotificationBus;

use crate::events::TransitionEvent;
use crate::signal::LifecycleSignal;
use crate::state::StateHandle;
use crate::StateError;

// ---------------------------------------------------------------------------
// TransitionPhase / Operation
// ---------------------------------------------------------------------------

/// Whether a transition is in flight.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TransitionPhase {
    /// No transition pending.
    Idle,
    /// `set_state` accepted, `post_loading_complete` not yet called.
    Loading,
}

impl fmt::Display for TransitionPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TransitionPhase::Idle => f.write_str("idle"),
            TransitionPhase::Loading => f.write_str("loading"),
        }
    }
}

/// The phase-checked manager operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Operation {
    SetState,
    SetLoadingState,
    PostLoadingComplete,
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Operation::SetState => f.write_str("set_state"),
            Operation::SetLoadingState => f.write_str("set_loading_state"),
            Operation::PostLoadingComplete => f.write_str("post_loading_complete"),
        }
    }
}

// ---------------------------------------------------------------------------
// StateManagerConfig
// ---------------------------------------------------------------------------

/// Configuration for [`StateManager`].
#[derive(Debug, Clone)]
pub struct StateManagerConfig {
    /// Mirror every hook invocation on the bus as a lifecycle notification
    /// sent from the target state. Transition events are published
    /// regardless.
    pub publish_lifecycle_signals: bool,
}

impl Default for StateManagerConfig {
    fn default() -> Self {
        Self {
            publish_lifecycle_signals: true,
        }
    }
}

// ---------------------------------------------------------------------------
// TransitionDiagnostics
// ---------------------------------------------------------------------------

/// Running counters over the manager's lifetime.
#[derive(Debug, Clone, Default)]
pub struct TransitionDiagnostics {
    /// Accepted `set_state` calls.
    pub transitions_started: u64,
    /// Accepted `post_loading_complete` calls.
    pub transitions_completed: u64,
    /// Progress reports delivered to a loading state.
    pub progress_updates: u64,
    /// Calls rejected with [`StateError::IllegalTransition`].
    pub rejected_calls: u64,
    /// Wall-clock length of the most recent completed loading window.
    pub last_loading_time: Option<Duration>,
}

// ---------------------------------------------------------------------------
// StateManager
// ---------------------------------------------------------------------------

/// Sequences state lifecycles around a loading-screen handshake.
///
/// All operations take `&self` so that hooks, which receive the manager, can
/// call back into it. No internal borrow is held while a hook runs.
///
/// The manager is single-threaded (`!Send`). Callers serialize their own
/// calls.
pub struct StateManager {
    bus: Rc<dyn NotificationBus>,
    config: StateManagerConfig,
    current: RefCell<Option<StateHandle>>,
    loading_state: RefCell<Option<StateHandle>>,
    phase: Cell<TransitionPhase>,
    /// Set while `set_state` is still running hooks.
    announcing: Cell<bool>,
    /// A completion requested from a hook during `set_state`.
    completion_requested: Cell<bool>,
    /// Set while `post_loading_complete` is still running hooks.
    completing: Cell<bool>,
    /// A `set_state` target requested from a hook during completion.
    pending_target: RefCell<Option<Option<StateHandle>>>,
    loading_since: Cell<Option<Instant>>,
    diagnostics: RefCell<TransitionDiagnostics>,
}

impl StateManager {
    /// Create an idle manager with no current state and no loading screen.
    pub fn new(bus: Rc<dyn NotificationBus>) -> Self {
        Self::with_config(bus, StateManagerConfig::default())
    }

    /// Create an idle manager with the given configuration.
    pub fn with_config(bus: Rc<dyn NotificationBus>, config: StateManagerConfig) -> Self {
        Self {
            bus,
            config,
            current: RefCell::new(None),
            loading_state: RefCell::new(None),
            phase: Cell::new(TransitionPhase::Idle),
            announcing: Cell::new(false),
            completion_requested: Cell::new(false),
            completing: Cell::new(false),
            pending_target: RefCell::new(None),
            loading_since: Cell::new(None),
            diagnostics: RefCell::new(TransitionDiagnostics::default()),
        }
    }

    /// Create an idle manager with an initial loading screen.
    ///
    /// No hooks run and no transition starts.
    pub fn with_loading_state(bus: Rc<dyn NotificationBus>, loading_state: StateHandle) -> Self {
        let manager = Self::new(bus);
        *manager.loading_state.borrow_mut() = Some(loading_state);
        manager
    }

    // -- transitions --------------------------------------------------------

    /// Begin a transition to `target` (`None` for "no state").
    ///
    /// Runs, in order: loading `pre_start`, outgoing `end`, loading `start`,
    /// outgoing `post_end`, target `pre_start`. It then publishes
    /// `LoadingStarted { old, new }` and makes `target` current. The target's
    /// `on_start` does not run until [`post_loading_complete`](Self::post_loading_complete).
    ///
    /// If a hook calls `post_loading_complete` during this sequence, the
    /// completion runs right after `target` becomes current. If a hook calls
    /// `set_state` while [`post_loading_complete`](Self::post_loading_complete)
    /// is running, the new transition starts once `LoadingEnded` has been
    /// published.
    ///
    /// # Errors
    ///
    /// [`StateError::IllegalTransition`] if a transition is already in flight,
    /// or if another transition was already requested during the current
    /// completion. Nothing is changed in that case.
    pub fn set_state(&self, target: Option<StateHandle>) -> Result<(), StateError> {
        self.require_phase(Operation::SetState, TransitionPhase::Idle)?;

        if self.completing.get() {
            if self.pending_target.borrow().is_some() {
                return Err(self.reject(Operation::SetState));
            }
            tracing::debug!(
                to = target.as_ref().map(StateHandle::name),
                "state transition deferred until loading completion finishes"
            );
            *self.pending_target.borrow_mut() = Some(target);
            return Ok(());
        }

        self.begin_transition(target);
        Ok(())
    }

    fn begin_transition(&self, target: Option<StateHandle>) {
        self.phase.set(TransitionPhase::Loading);
        self.announcing.set(true);
        self.loading_since.set(Some(Instant::now()));
        self.diagnostics.borrow_mut().transitions_started += 1;

        let loading = self.loading_state();
        let outgoing = self.state();

        tracing::debug!(
            from = outgoing.as_ref().map(StateHandle::name),
            to = target.as_ref().map(StateHandle::name),
            loading_screen = loading.as_ref().map(StateHandle::name),
            "state transition started"
        );

        if let Some(loading) = &loading {
            self.deliver(loading, LifecycleSignal::PreStart);
        }
        if let Some(outgoing) = &outgoing {
            self.deliver(outgoing, LifecycleSignal::End);
        }
        if let Some(loading) = &loading {
            self.deliver(loading, LifecycleSignal::Start);
        }
        if let Some(outgoing) = &outgoing {
            self.deliver(outgoing, LifecycleSignal::PostEnd);
        }
        if let Some(target) = &target {
            self.deliver(target, LifecycleSignal::PreStart);
        }

        let event = TransitionEvent::LoadingStarted {
            old: outgoing.as_ref().map(StateHandle::state_ref),
            new: target.as_ref().map(StateHandle::state_ref),
        };
        self.bus.publish(&event.to_notification());

        *self.current.borrow_mut() = target;
        self.announcing.set(false);

        if self.completion_requested.replace(false) {
            self.complete_transition();
        }
    }

    /// Finish the pending transition.
    ///
    /// Runs, in order: loading `end`, current `start`, loading `post_end`, then
    /// publishes `LoadingEnded { new }`.
    ///
    /// # Errors
    ///
    /// [`StateError::IllegalTransition`] if no transition is in flight, or if
    /// completion was already requested during the current `set_state`.
    pub fn post_loading_complete(&self) -> Result<(), StateError> {
        self.require_phase(Operation::PostLoadingComplete, TransitionPhase::Loading)?;

        if self.announcing.get() {
            if self.completion_requested.replace(true) {
                return Err(self.reject(Operation::PostLoadingComplete));
            }
            tracing::debug!("loading completion deferred until set_state finishes");
            return Ok(());
        }

        self.complete_transition();
        Ok(())
    }

    fn complete_transition(&self) {
        self.phase.set(TransitionPhase::Idle);
        self.completing.set(true);

        let elapsed = self.loading_since.take().map(|since| since.elapsed());
        {
            let mut diagnostics = self.diagnostics.borrow_mut();
            diagnostics.transitions_completed += 1;
            diagnostics.last_loading_time = elapsed;
        }

        let loading = self.loading_state();
        let started = self.state();

        tracing::debug!(
            state = started.as_ref().map(StateHandle::name),
            elapsed = ?elapsed,
            "state transition completed"
        );

        if let Some(loading) = &loading {
            self.deliver(loading, LifecycleSignal::End);
        }
        if let Some(started) = &started {
            self.deliver(started, LifecycleSignal::Start);
        }
        if let Some(loading) = &loading {
            self.deliver(loading, LifecycleSignal::PostEnd);
        }

        let event = TransitionEvent::LoadingEnded {
            new: started.as_ref().map(StateHandle::state_ref),
        };
        self.bus.publish(&event.to_notification());
        self.completing.set(false);

        let pending = self.pending_target.borrow_mut().take();
        if let Some(target) = pending {
            self.begin_transition(target);
        }
    }

    /// Forward a progress report to the loading state, if any.
    ///
    /// Valid in either phase. Without a loading state this does nothing.
    pub fn post_loading_update(&self, message: &str) {
        let Some(loading) = self.loading_state() else {
            return;
        };
        tracing::trace!(loading_screen = loading.name(), progress = message, "loading progress");
        let delivered = self.deliver(
            &loading,
            LifecycleSignal::LoadingProgress {
                message: message.to_owned(),
            },
        );
        if delivered {
            self.diagnostics.borrow_mut().progress_updates += 1;
        }
    }

    // -- loading screen -----------------------------------------------------

    /// Replace the loading state.
    ///
    /// # Errors
    ///
    /// [`StateError::IllegalTransition`] while a transition is in flight.
    pub fn set_loading_state(&self, loading_state: Option<StateHandle>) -> Result<(), StateError> {
        self.require_phase(Operation::SetLoadingState, TransitionPhase::Idle)?;
        *self.loading_state.borrow_mut() = loading_state;
        Ok(())
    }

    /// The loading screen shown between `set_state` and completion.
    pub fn loading_state(&self) -> Option<StateHandle> {
        self.loading_state.borrow().clone()
    }

    // -- accessors ----------------------------------------------------------

    /// The current state.
    ///
    /// During the loading window this is already the transition target, even
    /// though its `on_start` has not run yet.
    pub fn state(&self) -> Option<StateHandle> {
        self.current.borrow().clone()
    }

    /// Whether a transition is in flight.
    pub fn phase(&self) -> TransitionPhase {
        self.phase.get()
    }

    /// Shorthand for `phase() == TransitionPhase::Loading`.
    pub fn is_loading(&self) -> bool {
        self.phase.get() == TransitionPhase::Loading
    }

    /// The bus this manager publishes on.
    pub fn bus(&self) -> &Rc<dyn NotificationBus> {
        &self.bus
    }

    /// The configuration this manager was created with.
    pub fn config(&self) -> &StateManagerConfig {
        &self.config
    }

    /// A snapshot of the running counters.
    pub fn diagnostics(&self) -> TransitionDiagnostics {
        self.diagnostics.borrow().clone()
    }

    // -- internals ----------------------------------------------------------

    fn require_phase(&self, operation: Operation, required: TransitionPhase) -> Result<(), StateError> {
        if self.phase.get() == required {
            Ok(())
        } else {
            Err(self.reject(operation))
        }
    }

    fn reject(&self, operation: Operation) -> StateError {
        let phase = self.phase.get();
        self.diagnostics.borrow_mut().rejected_calls += 1;
        tracing::warn!(%operation, %phase, "illegal state transition rejected");
        StateError::IllegalTransition { operation, phase }
    }

    /// Mirror `signal` on the bus and run the hook. Neither happens if the
    /// state is busy in a hook further up the stack.
    fn deliver(&self, state: &StateHandle, signal: LifecycleSignal) -> bool {
        if state.is_busy() {
            tracing::warn!(
                state = state.name(),
                signal = signal.name(),
                "skipped lifecycle hook: state is already running a hook"
            );
            return false;
        }
        if self.config.publish_lifecycle_signals {
            self.bus.publish(&signal.to_notification(state.id()));
        }
        let delivered = state.deliver(&signal, self);
        if !delivered {
            tracing::warn!(
                state = state.name(),
                signal = signal.name(),
                "skipped lifecycle hook: state was borrowed by a bus subscriber"
            );
        }
        delivered
    }
}

impl fmt::Debug for StateManager {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StateManager")
            .field("current", &self.current.borrow())
            .field("loading_state", &self.loading_state.borrow())
            .field("phase", &self.phase.get())
            .finish_non_exhaustive()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::State;
    use stagehand_bus::bus::LocalBus;

    type Log = Rc<RefCell<Vec<String>>>;

    /// Appends `"{name}.{hook}"` for every hook it receives.
    struct Probe {
        name: &'static str,
        log: Log,
    }

    impl Probe {
        fn handle(name: &'static str, log: &Log) -> StateHandle {
            StateHandle::new(name, Probe { name, log: log.clone() })
        }

        fn push(&self, hook: &str) {
            self.log.borrow_mut().push(format!("{}.{hook}", self.name));
        }
    }

    impl State for Probe {
        fn on_pre_start(&mut self, _m: &StateManager) {
            self.push("PreStart");
        }
        fn on_start(&mut self, _m: &StateManager) {
            self.push("Start");
        }
        fn on_end(&mut self, _m: &StateManager) {
            self.push("End");
        }
        fn on_post_end(&mut self, _m: &StateManager) {
            self.push("PostEnd");
        }
        fn on_loading_progress(&mut self, _m: &StateManager, message: &str) {
            self.push(&format!("Progress({message})"));
        }
    }

    fn manager() -> StateManager {
        StateManager::new(Rc::new(LocalBus::new()))
    }

    fn take(log: &Log) -> Vec<String> {
        std::mem::take(&mut *log.borrow_mut())
    }

    // -- 1. Construction -------------------------------------------------------

    #[test]
    fn new_manager_is_idle_and_empty() {
        let m = manager();
        assert_eq!(m.phase(), TransitionPhase::Idle);
        assert!(m.state().is_none());
        assert!(m.loading_state().is_none());
        assert!(m.config().publish_lifecycle_signals);
    }

    #[test]
    fn with_loading_state_does_not_start_a_transition() {
        let log = Log::default();
        let l = Probe::handle("L", &log);
        let m = StateManager::with_loading_state(Rc::new(LocalBus::new()), l.clone());
        assert_eq!(m.loading_state(), Some(l));
        assert_eq!(m.phase(), TransitionPhase::Idle);
        assert!(take(&log).is_empty());
    }

    // -- 2. Hook ordering ------------------------------------------------------

    #[test]
    fn full_cycle_hook_order() {
        let log = Log::default();
        let m = manager();
        let l = Probe::handle("L", &log);
        let o = Probe::handle("O", &log);
        let a = Probe::handle("A", &log);

        m.set_state(Some(o.clone())).unwrap();
        m.post_loading_complete().unwrap();
        m.set_loading_state(Some(l)).unwrap();
        take(&log);

        m.set_state(Some(a.clone())).unwrap();
        assert_eq!(take(&log), ["L.PreStart", "O.End", "L.Start", "O.PostEnd", "A.PreStart"]);
        assert_eq!(m.state(), Some(a.clone()));

        m.post_loading_complete().unwrap();
        assert_eq!(take(&log), ["L.End", "A.Start", "L.PostEnd"]);
        assert_eq!(m.state(), Some(a));
        assert_eq!(m.phase(), TransitionPhase::Idle);
    }

    #[test]
    fn transition_to_no_state() {
        let log = Log::default();
        let m = manager();
        let o = Probe::handle("O", &log);
        m.set_state(Some(o)).unwrap();
        m.post_loading_complete().unwrap();
        take(&log);

        m.set_state(None).unwrap();
        m.post_loading_complete().unwrap();
        assert_eq!(take(&log), ["O.End", "O.PostEnd"]);
        assert!(m.state().is_none());
    }

    // -- 3. Phase preconditions -------------------------------------------------

    #[test]
    fn complete_while_idle_is_rejected() {
        let m = manager();
        let err = m.post_loading_complete().unwrap_err();
        assert_eq!(
            err,
            StateError::IllegalTransition {
                operation: Operation::PostLoadingComplete,
                phase: TransitionPhase::Idle,
            }
        );
        assert_eq!(m.diagnostics().rejected_calls, 1);
    }

    #[test]
    fn set_state_while_loading_is_rejected_without_effect() {
        let log = Log::default();
        let m = manager();
        let a = Probe::handle("A", &log);
        let b = Probe::handle("B", &log);
        m.set_state(Some(a.clone())).unwrap();
        take(&log);

        let err = m.set_state(Some(b)).unwrap_err();
        assert!(matches!(
            err,
            StateError::IllegalTransition { operation: Operation::SetState, .. }
        ));
        assert_eq!(m.state(), Some(a));
        assert!(take(&log).is_empty());
    }

    #[test]
    fn set_loading_state_while_loading_is_rejected() {
        let log = Log::default();
        let m = manager();
        let l = Probe::handle("L", &log);
        m.set_state(None).unwrap();
        assert!(m.set_loading_state(Some(l)).is_err());
        assert!(m.loading_state().is_none());
    }

    // -- 4. Progress ------------------------------------------------------------

    #[test]
    fn progress_goes_to_loading_state_only() {
        let log = Log::default();
        let m = manager();
        let a = Probe::handle("A", &log);
        m.set_loading_state(Some(Probe::handle("L", &log))).unwrap();
        m.set_state(Some(a)).unwrap();
        take(&log);

        m.post_loading_update("50%");
        assert_eq!(take(&log), ["L.Progress(50%)"]);
        assert_eq!(m.diagnostics().progress_updates, 1);
    }

    #[test]
    fn progress_without_loading_state_is_a_noop() {
        let m = manager();
        m.post_loading_update("ignored");
        assert_eq!(m.diagnostics().progress_updates, 0);
    }

    // -- 5. Callbacks into the manager -------------------------------------------

    /// Finishes its own loading as soon as it is pre-started.
    struct NoAssets {
        log: Log,
    }

    impl State for NoAssets {
        fn on_pre_start(&mut self, m: &StateManager) {
            self.log.borrow_mut().push("I.PreStart".to_owned());
            m.post_loading_update("nothing to load");
            m.post_loading_complete().unwrap();
            // A second request in the same announce sequence is a duplicate.
            assert!(m.post_loading_complete().is_err());
        }
        fn on_start(&mut self, _m: &StateManager) {
            self.log.borrow_mut().push("I.Start".to_owned());
        }
    }

    #[test]
    fn completion_from_pre_start_is_deferred_until_target_is_current() {
        let log = Log::default();
        let m = manager();
        m.set_loading_state(Some(Probe::handle("L", &log))).unwrap();
        let i = StateHandle::new("instant", NoAssets { log: log.clone() });

        m.set_state(Some(i.clone())).unwrap();

        assert_eq!(
            take(&log),
            [
                "L.PreStart",
                "L.Start",
                "I.PreStart",
                "L.Progress(nothing to load)",
                "L.End",
                "I.Start",
                "L.PostEnd",
            ]
        );
        assert_eq!(m.phase(), TransitionPhase::Idle);
        assert_eq!(m.state(), Some(i));
        assert_eq!(m.diagnostics().transitions_completed, 1);
    }

    /// Tries to start another transition from inside its own hook.
    struct Greedy {
        result: Rc<RefCell<Option<Result<(), StateError>>>>,
    }

    impl State for Greedy {
        fn on_pre_start(&mut self, m: &StateManager) {
            *self.result.borrow_mut() = Some(m.set_state(None));
        }
    }

    #[test]
    fn nested_set_state_is_rejected() {
        let result = Rc::new(RefCell::new(None));
        let m = manager();
        let g = StateHandle::new("greedy", Greedy { result: result.clone() });

        m.set_state(Some(g.clone())).unwrap();

        assert!(matches!(
            *result.borrow(),
            Some(Err(StateError::IllegalTransition { phase: TransitionPhase::Loading, .. }))
        ));
        assert_eq!(m.state(), Some(g));
    }

    /// A loading screen that reports progress to itself.
    struct SelfReporting {
        progress: Rc<Cell<u32>>,
    }

    impl State for SelfReporting {
        fn on_start(&mut self, m: &StateManager) {
            m.post_loading_update("from inside a hook");
        }
        fn on_loading_progress(&mut self, _m: &StateManager, _message: &str) {
            self.progress.set(self.progress.get() + 1);
        }
    }

    #[test]
    fn reentrant_delivery_to_a_busy_state_is_skipped() {
        let progress = Rc::new(Cell::new(0));
        let m = manager();
        m.set_loading_state(Some(StateHandle::new(
            "loading",
            SelfReporting { progress: progress.clone() },
        )))
        .unwrap();

        m.set_state(None).unwrap();
        assert_eq!(progress.get(), 0);
        assert_eq!(m.diagnostics().progress_updates, 0);

        m.post_loading_update("from outside");
        assert_eq!(progress.get(), 1);
    }

    /// Starts the next transition from its own `on_start`.
    struct Chaining {
        log: Log,
        next: Option<StateHandle>,
        second_request: Rc<RefCell<Option<Result<(), StateError>>>>,
    }

    impl State for Chaining {
        fn on_pre_start(&mut self, _m: &StateManager) {
            self.log.borrow_mut().push("A.PreStart".to_owned());
        }
        fn on_start(&mut self, m: &StateManager) {
            self.log.borrow_mut().push("A.Start".to_owned());
            if let Some(next) = self.next.take() {
                m.set_state(Some(next)).unwrap();
                *self.second_request.borrow_mut() = Some(m.set_state(None));
            }
        }
        fn on_end(&mut self, _m: &StateManager) {
            self.log.borrow_mut().push("A.End".to_owned());
        }
        fn on_post_end(&mut self, _m: &StateManager) {
            self.log.borrow_mut().push("A.PostEnd".to_owned());
        }
    }

    #[test]
    fn set_state_from_on_start_runs_after_completion() {
        let log = Log::default();
        let second_request = Rc::new(RefCell::new(None));
        let m = manager();
        let b = Probe::handle("B", &log);
        let a = StateHandle::new(
            "A",
            Chaining {
                log: log.clone(),
                next: Some(b.clone()),
                second_request: second_request.clone(),
            },
        );
        m.set_loading_state(Some(Probe::handle("L", &log))).unwrap();
        m.set_state(Some(a)).unwrap();
        take(&log);

        m.post_loading_complete().unwrap();

        assert_eq!(
            take(&log),
            [
                "L.End",
                "A.Start",
                "L.PostEnd",
                "L.PreStart",
                "A.End",
                "L.Start",
                "A.PostEnd",
                "B.PreStart",
            ]
        );
        assert!(matches!(
            *second_request.borrow(),
            Some(Err(StateError::IllegalTransition { operation: Operation::SetState, .. }))
        ));
        assert_eq!(m.phase(), TransitionPhase::Loading);
        assert_eq!(m.state(), Some(b));

        m.post_loading_complete().unwrap();
        assert_eq!(take(&log), ["L.End", "B.Start", "L.PostEnd"]);
        let d = m.diagnostics();
        assert_eq!(d.transitions_started, 2);
        assert_eq!(d.transitions_completed, 2);
    }

    #[test]
    fn skipped_delivery_is_not_mirrored_on_the_bus() {
        use crate::signal::LOADING_PROGRESS;
        use stagehand_bus::bus::Subscription;

        let bus = Rc::new(LocalBus::new());
        let mirrored = Rc::new(Cell::new(0));
        let sink = mirrored.clone();
        bus.subscribe(Subscription::new(LOADING_PROGRESS, move |_| sink.set(sink.get() + 1)));

        let progress = Rc::new(Cell::new(0));
        let m = StateManager::new(bus);
        m.set_loading_state(Some(StateHandle::new(
            "loading",
            SelfReporting { progress: progress.clone() },
        )))
        .unwrap();

        m.set_state(None).unwrap();
        assert_eq!(mirrored.get(), 0);

        m.post_loading_update("from outside");
        assert_eq!(mirrored.get(), 1);
        assert_eq!(progress.get(), 1);
    }

    // -- 6. Diagnostics ---------------------------------------------------------

    #[test]
    fn diagnostics_count_transitions() {
        let m = manager();
        for _ in 0..3 {
            m.set_state(None).unwrap();
            m.post_loading_complete().unwrap();
        }
        let d = m.diagnostics();
        assert_eq!(d.transitions_started, 3);
        assert_eq!(d.transitions_completed, 3);
        assert_eq!(d.rejected_calls, 0);
        assert!(d.last_loading_time.is_some());
    }

    #[test]
    fn error_message_names_operation_and_phase() {
        let m = manager();
        let err = m.post_loading_complete().unwrap_err();
        assert_eq!(
            err.to_string(),
            "illegal transition: post_loading_complete is not allowed while idle"
        );
    }
}
