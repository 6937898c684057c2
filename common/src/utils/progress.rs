use std::time::Duration;

/// Share of targets finished, `0.0` while nothing is known yet.
pub fn fraction_done(completed: usize, total: usize) -> f64 {
    if total == 0 {
        return 0.0;
    }
    completed as f64 / total as f64
}

/// Projects the time left from the average time per completed target.
///
/// Returns zero until at least one target has completed.
pub fn estimate_eta(elapsed: Duration, completed: usize, total: usize) -> Duration {
    if completed == 0 {
        return Duration::ZERO;
    }
    let remaining = total.saturating_sub(completed) as u32;
    let average = elapsed / completed as u32;
    average.saturating_mul(remaining)
}
