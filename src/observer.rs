use std::sync::Arc;

use tracing::{debug, warn};

use crate::prober::Attempt;
use crate::targets::HostTarget;

/// Receives per-attempt notifications while hosts are being probed.
///
/// `seq` is the 1-based attempt number within the host.
pub trait ProbeObserver: Send + Sync {
    fn attempt_finished(&self, _host: &HostTarget, _seq: u32, _attempt: &Attempt) {}

    fn attempt_failed(&self, host: &HostTarget, seq: u32, attempt: &Attempt, reason: &str);
}

/// Writes one log line per failed or errored attempt.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogObserver;

impl ProbeObserver for LogObserver {
    fn attempt_finished(&self, host: &HostTarget, seq: u32, attempt: &Attempt) {
        debug!(%host, seq, outcome = %attempt.outcome, elapsed_ms = ?attempt.elapsed_ms, "attempt finished");
    }

    fn attempt_failed(&self, host: &HostTarget, seq: u32, attempt: &Attempt, reason: &str) {
        warn!(%host, seq, outcome = %attempt.outcome, "{reason}");
    }
}

/// Forwards every notification to each inner observer.
#[derive(Default, Clone)]
pub struct Observers(Vec<Arc<dyn ProbeObserver>>);

impl Observers {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, observer: Arc<dyn ProbeObserver>) -> Self {
        self.0.push(observer);
        self
    }
}

impl ProbeObserver for Observers {
    fn attempt_finished(&self, host: &HostTarget, seq: u32, attempt: &Attempt) {
        for o in &self.0 {
            o.attempt_finished(host, seq, attempt);
        }
    }

    fn attempt_failed(&self, host: &HostTarget, seq: u32, attempt: &Attempt, reason: &str) {
        for o in &self.0 {
            o.attempt_failed(host, seq, attempt, reason);
        }
    }
}
