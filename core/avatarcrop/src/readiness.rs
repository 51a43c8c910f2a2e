//! Load state of the computer-vision runtime and its classifiers.
//!
//! Published on a `watch` channel: subscribers only ever see the most recent
//! state.

use tokio::sync::watch;
use tracing::info;

/// Classifier resource the detector depends on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Classifier {
    /// Frontal face cascade.
    FrontalFace,
    /// Eye cascade.
    Eye,
}

/// Snapshot of what has loaded so far.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Readiness {
    /// The vision runtime is initialised.
    pub runtime: bool,
    /// The frontal face classifier is loaded.
    pub face_classifier: bool,
    /// The eye classifier is loaded.
    pub eye_classifier: bool,
}

impl Readiness {
    /// Everything loaded; only then may detection run.
    pub fn is_ready(&self) -> bool {
        self.runtime && self.face_classifier && self.eye_classifier
    }
}

/// Publishes load progress.
#[derive(Debug)]
pub struct ReadinessTracker {
    tx: watch::Sender<Readiness>,
}

impl ReadinessTracker {
    /// Tracker with nothing loaded.
    pub fn new() -> Self {
        let (tx, _) = watch::channel(Readiness::default());
        Self { tx }
    }

    /// Tracker whose state is already fully loaded, for detectors that carry
    /// their models in-process.
    pub fn ready() -> Self {
        let tracker = Self::new();
        tracker.runtime_ready();
        tracker.classifier_loaded(Classifier::FrontalFace);
        tracker.classifier_loaded(Classifier::Eye);
        tracker
    }

    /// Mark the vision runtime as initialised.
    pub fn runtime_ready(&self) {
        self.tx.send_modify(|r| r.runtime = true);
    }

    /// Mark a classifier as loaded. Classifiers loaded before the runtime is
    /// ready are recorded but the state stays not-ready until it is.
    pub fn classifier_loaded(&self, classifier: Classifier) {
        self.tx.send_modify(|r| match classifier {
            Classifier::FrontalFace => r.face_classifier = true,
            Classifier::Eye => r.eye_classifier = true,
        });
        if self.tx.borrow().is_ready() {
            info!("face detector ready");
        }
    }

    /// Latest published state.
    pub fn current(&self) -> Readiness {
        *self.tx.borrow()
    }

    /// New read handle for analyzers and UI.
    pub fn subscribe(&self) -> ReadinessGate {
        ReadinessGate {
            rx: self.tx.subscribe(),
        }
    }
}

impl Default for ReadinessTracker {
    fn default() -> Self {
        Self::new()
    }
}

/// Read side of a [`ReadinessTracker`].
#[derive(Debug, Clone)]
pub struct ReadinessGate {
    rx: watch::Receiver<Readiness>,
}

impl ReadinessGate {
    /// Whether detection may run right now.
    pub fn is_ready(&self) -> bool {
        self.rx.borrow().is_ready()
    }

    /// Wait until detection may run. Returns `false` if the tracker was
    /// dropped before that happened.
    pub async fn wait_ready(&mut self) -> bool {
        loop {
            if self.rx.borrow_and_update().is_ready() {
                return true;
            }
            if self.rx.changed().await.is_err() {
                return false;
            }
        }
    }
}
