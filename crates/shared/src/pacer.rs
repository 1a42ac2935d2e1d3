use std::sync::Mutex;
use std::time::{Duration, Instant};

/// Default budget for external text-generation calls.
pub const DEFAULT_CALLS_PER_MINUTE: f64 = 11.0;

/// Paces external calls to a minimum inter-call interval.
///
/// Holds the timestamp of the most recent call behind a mutex; `wait` sleeps
/// out the remaining gap before letting the next call through, then stamps
/// the clock. One pacer lives for the whole process (inside the client), so
/// sequential requests share the same budget. It does NOT coordinate across
/// multiple worker processes; deployments running several workers need an
/// external shared pacing mechanism such as a token bucket in shared storage.
pub struct RatePacer {
    min_interval: Duration,
    last_call: Mutex<Option<Instant>>,
}

impl RatePacer {
    pub fn new(calls_per_minute: f64) -> Self {
        Self {
            min_interval: Duration::from_secs_f64(60.0 / calls_per_minute),
            last_call: Mutex::new(None),
        }
    }

    /// Block until at least `min_interval` has passed since the previous
    /// call, then record this one.
    pub async fn wait(&self) {
        let remaining = {
            let last = self
                .last_call
                .lock()
                .unwrap_or_else(|poisoned| poisoned.into_inner());
            last.map(|t| self.min_interval.saturating_sub(t.elapsed()))
                .unwrap_or(Duration::ZERO)
        };

        if !remaining.is_zero() {
            tokio::time::sleep(remaining).await;
        }

        *self
            .last_call
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner()) = Some(Instant::now());
    }
}
