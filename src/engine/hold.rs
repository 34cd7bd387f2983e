use super::types::GestureState;

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct HoldRecord {
    pub state: GestureState,
    pub started_at_ms: u64,
    pub elapsed_ms: u64,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct HoldReport {
    pub state: GestureState,
    pub elapsed_ms: u64,
    pub progress: f64,
    pub crossed_threshold: bool,
}

impl HoldReport {
    const fn idle() -> Self {
        Self {
            state: GestureState::NoSignal,
            elapsed_ms: 0,
            progress: 0.0,
            crossed_threshold: false,
        }
    }
}

/// Measures how long the stable gesture has been held.
///
/// A `NoSignal` tick pauses the running episode; the episode resumes if the
/// same state comes back and restarts if a different one does.
#[derive(Clone, Copy, Debug)]
pub struct HoldTracker {
    target_ms: u64,
    record: Option<HoldRecord>,
    crossed: bool,
    paused_since_ms: Option<u64>,
    paused_ms: u64,
}

impl HoldTracker {
    pub const fn new(target_ms: u64) -> Self {
        Self {
            target_ms,
            record: None,
            crossed: false,
            paused_since_ms: None,
            paused_ms: 0,
        }
    }

    pub fn tick(&mut self, stable: GestureState, now_ms: u64) -> HoldReport {
        if !stable.has_signal() {
            if self.record.is_some() && self.paused_since_ms.is_none() {
                self.paused_since_ms = Some(now_ms);
            }
            return self.report(false);
        }

        let same_episode = self.record.is_some_and(|r| r.state == stable);
        if let Some(since) = self.paused_since_ms.take() {
            if same_episode {
                self.paused_ms = self.paused_ms.saturating_add(now_ms.saturating_sub(since));
            }
        }

        if !same_episode {
            self.record = Some(HoldRecord {
                state: stable,
                started_at_ms: now_ms,
                elapsed_ms: 0,
            });
            self.crossed = false;
            self.paused_ms = 0;
        }

        let mut crossed_now = false;
        if let Some(record) = self.record.as_mut() {
            record.elapsed_ms = now_ms
                .saturating_sub(record.started_at_ms)
                .saturating_sub(self.paused_ms);
            if !self.crossed && record.elapsed_ms >= self.target_ms {
                self.crossed = true;
                crossed_now = true;
            }
        }
        self.report(crossed_now)
    }

    fn report(&self, crossed_threshold: bool) -> HoldReport {
        let Some(record) = self.record else {
            return HoldReport::idle();
        };
        HoldReport {
            state: record.state,
            elapsed_ms: record.elapsed_ms,
            progress: self.progress_of(record.elapsed_ms),
            crossed_threshold,
        }
    }

    fn progress_of(&self, elapsed_ms: u64) -> f64 {
        if self.target_ms == 0 {
            return 1.0;
        }
        (elapsed_ms as f64 / self.target_ms as f64).min(1.0)
    }

    pub fn record(&self) -> Option<HoldRecord> {
        self.record
    }

    pub fn target_ms(&self) -> u64 {
        self.target_ms
    }

    pub fn is_paused(&self) -> bool {
        self.paused_since_ms.is_some()
    }

    pub fn reset(&mut self) {
        self.record = None;
        self.crossed = false;
        self.paused_since_ms = None;
        self.paused_ms = 0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use GestureState::{Closed, NoSignal, Open};

    #[test]
    fn crossing_fires_once_per_episode() {
        let mut hold = HoldTracker::new(1_000);
        let mut fired = 0;
        for t in (0..=3_000).step_by(50) {
            if hold.tick(Open, t).crossed_threshold {
                fired += 1;
                assert_eq!(t, 1_000);
            }
        }
        assert_eq!(fired, 1);

        let restart = hold.tick(Closed, 3_050);
        assert_eq!(restart.elapsed_ms, 0);
        assert_eq!(restart.progress, 0.0);
        assert!(hold.tick(Open, 3_100).elapsed_ms == 0);
        assert!(hold.tick(Open, 4_100).crossed_threshold);
    }

    #[test]
    fn progress_is_clamped() {
        let mut hold = HoldTracker::new(400);
        let _ = hold.tick(Open, 0);
        assert_eq!(hold.tick(Open, 100).progress, 0.25);
        assert_eq!(hold.tick(Open, 900).progress, 1.0);
    }

    #[test]
    fn dropout_pauses_instead_of_resetting() {
        let mut hold = HoldTracker::new(1_000);
        let _ = hold.tick(Open, 0);
        let _ = hold.tick(Open, 600);
        let paused = hold.tick(NoSignal, 700);
        assert_eq!(paused.state, Open);
        assert_eq!(paused.elapsed_ms, 600);
        assert!(hold.is_paused());

        let resumed = hold.tick(Open, 2_000);
        assert_eq!(resumed.elapsed_ms, 700);
        assert!(!resumed.crossed_threshold);
        assert!(hold.tick(Open, 2_300).crossed_threshold);
    }

    #[test]
    fn different_state_after_dropout_starts_fresh() {
        let mut hold = HoldTracker::new(1_000);
        let _ = hold.tick(Open, 0);
        let _ = hold.tick(Open, 900);
        let _ = hold.tick(NoSignal, 950);
        let report = hold.tick(Closed, 1_500);
        assert_eq!(report.state, Closed);
        assert_eq!(report.elapsed_ms, 0);
    }
}
