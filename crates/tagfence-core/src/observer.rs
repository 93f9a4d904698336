use crate::types::{Violation, Warning};
use parking_lot::Mutex;
use tracing::warn;

/// Structured event sink injected into the analysis pipeline.
///
/// The core performs no process control, signals, or forking; anything a
/// caller wants done with warnings or violations happens behind this seam.
pub trait AnalysisObserver: Send + Sync {
    fn on_warning(&self, warning: &Warning);

    fn on_violation(&self, _violation: &Violation) {}
}

/// Default observer: forwards warnings to the tracing subscriber.
#[derive(Debug, Default)]
pub struct TracingObserver;

impl AnalysisObserver for TracingObserver {
    fn on_warning(&self, warning: &Warning) {
        warn!("{}", warning);
    }
}

/// Collects every event it sees. Test support.
#[derive(Debug, Default)]
pub struct CollectingObserver {
    warnings: Mutex<Vec<Warning>>,
    violations: Mutex<Vec<Violation>>,
}

impl CollectingObserver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn warnings(&self) -> Vec<Warning> {
        self.warnings.lock().clone()
    }

    pub fn violations(&self) -> Vec<Violation> {
        self.violations.lock().clone()
    }
}

impl AnalysisObserver for CollectingObserver {
    fn on_warning(&self, warning: &Warning) {
        self.warnings.lock().push(warning.clone());
    }

    fn on_violation(&self, violation: &Violation) {
        self.violations.lock().push(violation.clone());
    }
}
