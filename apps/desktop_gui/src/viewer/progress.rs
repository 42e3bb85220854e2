//! Synthetic progress for long-running backend requests.
//!
//! The backend exposes no progress endpoint, so while a request is in flight
//! the bar advances along a decaying ramp that never reaches the end. It is
//! purely UI feedback and says nothing about how far the backend actually got.

use std::time::{Duration, Instant};

/// The ramp saturates here until the real response arrives.
pub const PROGRESS_CAP: f32 = 90.0;

#[derive(Debug, Default)]
pub struct RequestProgress {
    started: Option<Instant>,
    display: f32,
}

impl RequestProgress {
    /// Starts tracking a request. Returns false if one is already in flight,
    /// in which case the caller must not dispatch another.
    pub fn begin(&mut self) -> bool {
        if self.started.is_some() {
            return false;
        }
        self.started = Some(Instant::now());
        self.display = 0.0;
        true
    }

    pub fn in_flight(&self) -> bool {
        self.started.is_some()
    }

    /// Advances the displayed value. Call once per UI frame while in flight.
    pub fn tick(&mut self) {
        if let Some(started) = self.started {
            self.display = synthetic_progress(started.elapsed());
        }
    }

    /// Snaps to 100 on success.
    pub fn finish(&mut self) {
        self.started = None;
        self.display = 100.0;
    }

    /// Resets on failure so a retry starts from zero.
    pub fn fail(&mut self) {
        self.started = None;
        self.display = 0.0;
    }

    pub fn fraction(&self) -> f32 {
        self.display / 100.0
    }
}

/// Decaying ramp: fast at first, capped below completion.
fn synthetic_progress(elapsed: Duration) -> f32 {
    let secs = elapsed.as_secs_f32();
    (100.0 * (1.0 - (-secs / 3.0).exp())).min(PROGRESS_CAP)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ramp_is_monotonic_and_capped() {
        let mut last = -1.0f32;
        for tenths in 0..600 {
            let value = synthetic_progress(Duration::from_millis(tenths * 100));
            assert!(value >= last);
            assert!(value <= PROGRESS_CAP);
            last = value;
        }
        assert_eq!(synthetic_progress(Duration::from_secs(120)), PROGRESS_CAP);
    }

    #[test]
    fn begin_rejects_a_second_request() {
        let mut progress = RequestProgress::default();
        assert!(progress.begin());
        assert!(!progress.begin());
        assert!(progress.in_flight());
    }

    #[test]
    fn finish_snaps_to_complete() {
        let mut progress = RequestProgress::default();
        progress.begin();
        progress.tick();
        progress.finish();
        assert!(!progress.in_flight());
        assert_eq!(progress.fraction(), 1.0);
    }

    #[test]
    fn fail_resets_for_retry() {
        let mut progress = RequestProgress::default();
        progress.begin();
        progress.tick();
        progress.fail();
        assert!(!progress.in_flight());
        assert_eq!(progress.fraction(), 0.0);
        assert!(progress.begin());
    }
}
