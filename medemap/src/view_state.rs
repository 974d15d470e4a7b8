//! Lifecycle of a mounted view: it derives only once both the data and its renderer are ready,
//! and late updates after the view is dropped are ignored.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};

use log::{debug, error};

use crate::views::{derive, ViewInputs, ViewKind, ViewOutput};

/// Tracks the two conditions a view waits for before deriving.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReadinessGate {
    data_ready: bool,
    renderer_ready: bool,
}

impl ReadinessGate {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn mark_data_ready(&mut self) {
        self.data_ready = true;
    }

    pub fn mark_renderer_ready(&mut self) {
        self.renderer_ready = true;
    }

    pub fn is_open(&self) -> bool {
        self.data_ready && self.renderer_ready
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
pub enum ViewState {
    #[default]
    Waiting,
    Ready(ViewOutput),
    Failed(String),
}

fn lock(state: &Mutex<ViewState>) -> MutexGuard<'_, ViewState> {
    state.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Compute the state a view should show for `inputs`.
pub fn compute(kind: ViewKind, gate: &ReadinessGate, inputs: &ViewInputs) -> ViewState {
    if !gate.is_open() {
        return ViewState::Waiting;
    }
    match derive(kind, inputs) {
        Ok(output) => ViewState::Ready(output),
        Err(err) => {
            error!("Failed to derive {kind} view: {err}");
            ViewState::Failed(err.to_string())
        }
    }
}

/// The state owned by one mounted view. Dropping the slot unmounts the view.
#[derive(Debug)]
pub struct ViewSlot {
    kind: ViewKind,
    state: Arc<Mutex<ViewState>>,
}

impl ViewSlot {
    pub fn mount(kind: ViewKind) -> Self {
        Self {
            kind,
            state: Arc::new(Mutex::new(ViewState::Waiting)),
        }
    }

    pub fn kind(&self) -> ViewKind {
        self.kind
    }

    pub fn state(&self) -> ViewState {
        lock(&self.state).clone()
    }

    /// Recompute the view in place.
    pub fn refresh(&self, gate: &ReadinessGate, inputs: &ViewInputs) {
        *lock(&self.state) = compute(self.kind, gate, inputs);
    }

    /// A handle for completions that may outlive the view.
    pub fn updater(&self) -> ViewUpdater {
        ViewUpdater {
            kind: self.kind,
            state: Arc::downgrade(&self.state),
        }
    }
}

/// Weak handle to a view's state. Once the view is dropped every update is a no-op.
#[derive(Debug, Clone)]
pub struct ViewUpdater {
    kind: ViewKind,
    state: Weak<Mutex<ViewState>>,
}

impl ViewUpdater {
    pub fn is_mounted(&self) -> bool {
        self.state.strong_count() > 0
    }

    /// Store `state` if the view is still mounted. Returns whether it was stored.
    pub fn set(&self, state: ViewState) -> bool {
        match self.state.upgrade() {
            Some(slot) => {
                *lock(&slot) = state;
                true
            }
            None => {
                debug!("Ignoring update for unmounted {} view", self.kind);
                false
            }
        }
    }

    /// Derive and store the view if it is still mounted.
    pub fn refresh(&self, gate: &ReadinessGate, inputs: &ViewInputs) -> bool {
        if !self.is_mounted() {
            debug!("Ignoring refresh for unmounted {} view", self.kind);
            return false;
        }
        self.set(compute(self.kind, gate, inputs))
    }
}
