//! Presentation state store.
//!
//! Holds the single most-recently-decoded frame. The pipeline is the only
//! writer; renderers take snapshots. Writes replace the whole value, so a
//! reader sees either the previous complete frame or the new complete frame,
//! never `occupied` from one and `grid` from another.

use std::sync::{Arc, Mutex, RwLock};

use crate::frame::SensorFrame;

/// The live presentation state: the latest frame plus a derived flag
/// distinguishing "no data yet" from a real (possibly empty-grid) reading.
#[derive(Debug, Clone, PartialEq)]
pub struct PresentationState {
    pub frame: SensorFrame,
    pub has_data: bool,
}

impl PresentationState {
    fn initial() -> Self {
        Self {
            frame: SensorFrame::empty(),
            has_data: false,
        }
    }
}

type ChangeCallback = Arc<dyn Fn(&PresentationState) + Send + Sync>;

/// Shared store with whole-value replacement and synchronous change
/// notification.
///
/// Every successful [`apply`](Self::apply) invokes each registered observer
/// exactly once with the state just committed. Identical consecutive frames
/// are not deduplicated: the producer's cadence drives the repaint cadence.
pub struct PresentationStore {
    state: RwLock<PresentationState>,
    observers: Mutex<Vec<ChangeCallback>>,
}

impl PresentationStore {
    pub fn new() -> Self {
        Self {
            state: RwLock::new(PresentationState::initial()),
            observers: Mutex::new(Vec::new()),
        }
    }

    /// Atomically replace the stored state with a new frame.
    ///
    /// Sole mutation entry point. Observers run synchronously after the
    /// write lock is released, in registration order, against a snapshot of
    /// the committed state.
    pub fn apply(&self, frame: SensorFrame) {
        let snapshot = {
            let mut state = self.state.write().unwrap();
            *state = PresentationState {
                frame,
                has_data: true,
            };
            state.clone()
        };
        let observers: Vec<ChangeCallback> = self.observers.lock().unwrap().clone();
        for observer in &observers {
            observer(&snapshot);
        }
    }

    /// Snapshot of the current state. Never blocks the writer for longer
    /// than the clone.
    pub fn current(&self) -> PresentationState {
        self.state.read().unwrap().clone()
    }

    /// Register a change observer, called synchronously after each apply.
    ///
    /// Observers are held for the lifetime of the store. The callback list
    /// is cloned out of its lock before invocation, so an observer may
    /// itself register further observers without deadlocking.
    pub fn on_change<F>(&self, callback: F)
    where
        F: Fn(&PresentationState) + Send + Sync + 'static,
    {
        self.observers.lock().unwrap().push(Arc::new(callback));
    }
}

impl Default for PresentationStore {
    fn default() -> Self {
        Self::new()
    }
}
