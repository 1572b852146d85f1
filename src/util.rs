// Small numeric helpers shared by the prober and the stats reducer.

use std::time::Duration;

/// Round to two decimal places.
pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Elapsed time in milliseconds, rounded to two decimals.
pub fn duration_to_millis(elapsed: Duration) -> f64 {
    round2(elapsed.as_secs_f64() * 1000.0)
}
