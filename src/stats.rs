use serde::Serialize;

use crate::prober::{Attempt, Outcome};
use crate::util::round2;

/// Aggregate over every attempt made against one host.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct HostStats {
    pub success: u32,
    pub failed: u32,
    pub errors: u32,
    /// Attempts whose status was neither 2xx nor 4xx/5xx.
    pub unclassified: u32,
    pub min_ms: Option<f64>,
    pub max_ms: Option<f64>,
    pub avg_ms: Option<f64>,
}

impl HostStats {
    pub fn total(&self) -> u32 {
        self.success + self.failed + self.errors + self.unclassified
    }
}

/// Fold a host's attempts into its stats.
///
/// Latency covers every timed attempt, whatever its outcome.
pub fn reduce(attempts: &[Attempt]) -> HostStats {
    let mut stats = HostStats::default();
    let mut sum = 0.0;
    let mut timed = 0u32;

    for attempt in attempts {
        match attempt.outcome {
            Outcome::Success => stats.success += 1,
            Outcome::Failed => stats.failed += 1,
            Outcome::Unclassified(_) => stats.unclassified += 1,
            _ => stats.errors += 1,
        }

        if let Some(ms) = attempt.elapsed_ms {
            stats.min_ms = Some(stats.min_ms.map_or(ms, |m| m.min(ms)));
            stats.max_ms = Some(stats.max_ms.map_or(ms, |m| m.max(ms)));
            sum += ms;
            timed += 1;
        }
    }

    if timed > 0 {
        stats.avg_ms = Some(round2(sum / f64::from(timed)));
    }
    stats
}
