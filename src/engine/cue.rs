use crate::profile::{CueConfig, CueTarget};

use super::types::{CueKind, GestureState};

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct Cue {
    pub target: GestureState,
    pub kind: CueKind,
    pub issued_at_ms: u64,
    pub window_ms: u64,
    pub credited: bool,
}

impl Cue {
    pub fn is_open(&self, now_ms: u64) -> bool {
        now_ms.saturating_sub(self.issued_at_ms) < self.window_ms
    }

    pub fn matches(&self, stable: GestureState) -> bool {
        if !stable.has_signal() {
            return false;
        }
        match self.kind {
            CueKind::Go => stable == self.target,
            CueKind::Stop => stable != self.target,
        }
    }
}

/// Issues time-boxed cues and credits at most one matching response per cue.
#[derive(Clone, Debug, Default)]
pub struct CueScheduler {
    cycle: Vec<CueTarget>,
    interval_ms: u64,
    window_ms: u64,
    response_hold_ms: u64,
    cycle_index: usize,
    next_due_ms: Option<u64>,
    active: Option<Cue>,
    issued_count: u32,
}

impl CueScheduler {
    /// A scheduler that only issues cues through [`CueScheduler::issue`].
    pub fn manual(response_hold_ms: u64) -> Self {
        Self {
            response_hold_ms,
            ..Self::default()
        }
    }

    pub fn new(config: &CueConfig) -> Self {
        Self {
            cycle: config.sequence.clone(),
            interval_ms: config.interval_ms,
            window_ms: config.window_ms,
            response_hold_ms: config.response_hold_ms,
            ..Self::default()
        }
    }

    pub fn issue(
        &mut self,
        target: GestureState,
        kind: CueKind,
        window_ms: u64,
        now_ms: u64,
    ) -> Cue {
        let cue = Cue {
            target,
            kind,
            issued_at_ms: now_ms,
            window_ms,
            credited: false,
        };
        self.active = Some(cue);
        self.issued_count = self.issued_count.saturating_add(1);
        cue
    }

    /// Issues the next scheduled cue once its slot is due. Cadence is fixed
    /// and does not depend on whether the previous cue was answered.
    pub fn poll(&mut self, now_ms: u64) -> Option<Cue> {
        if self.cycle.is_empty() || self.interval_ms == 0 {
            return None;
        }
        let due = *self.next_due_ms.get_or_insert(now_ms);
        if now_ms < due {
            return None;
        }

        let mut next_due = due;
        while next_due <= now_ms {
            next_due = next_due.saturating_add(self.interval_ms);
        }
        self.next_due_ms = Some(next_due);

        let target = self.cycle[self.cycle_index % self.cycle.len()];
        self.cycle_index = (self.cycle_index + 1) % self.cycle.len();
        Some(self.issue(target.state, target.kind, self.window_ms, now_ms))
    }

    pub fn check(&mut self, stable: GestureState, now_ms: u64) -> bool {
        let Some(cue) = self.active.as_mut() else {
            return false;
        };
        if cue.credited || !cue.is_open(now_ms) || !cue.matches(stable) {
            return false;
        }
        cue.credited = true;
        true
    }

    /// Like [`CueScheduler::check`] but the response must also have been
    /// held for `response_hold_ms`.
    pub fn check_held(&mut self, stable: GestureState, held_ms: u64, now_ms: u64) -> bool {
        if held_ms < self.response_hold_ms {
            return false;
        }
        self.check(stable, now_ms)
    }

    pub fn active(&self) -> Option<&Cue> {
        self.active.as_ref()
    }

    /// True when the active cue closed without a credited response.
    pub fn missed(&self, now_ms: u64) -> bool {
        self.active
            .is_some_and(|cue| !cue.credited && !cue.is_open(now_ms))
    }

    pub fn issued_count(&self) -> u32 {
        self.issued_count
    }

    pub fn reset(&mut self) {
        self.cycle_index = 0;
        self.next_due_ms = None;
        self.active = None;
        self.issued_count = 0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use GestureState::{Protruding, Relaxed, RoundedO, RoundedU};

    #[test]
    fn stop_cue_credits_when_blowing_ends_inside_window() {
        let mut cues = CueScheduler::manual(0);
        let _ = cues.issue(Protruding, CueKind::Stop, 500, 0);
        assert!(!cues.check(Protruding, 100));
        assert!(!cues.check(Protruding, 300));
        assert!(cues.check(Relaxed, 400));
        assert!(!cues.check(Relaxed, 450));
    }

    #[test]
    fn stop_cue_fails_when_blowing_outlasts_window() {
        let mut cues = CueScheduler::manual(0);
        let _ = cues.issue(Protruding, CueKind::Stop, 500, 0);
        for t in (0..=600).step_by(50) {
            assert!(!cues.check(Protruding, t));
        }
        assert!(!cues.check(Relaxed, 600));
        assert!(cues.missed(600));
    }

    #[test]
    fn go_cue_requires_target_and_hold() {
        let mut cues = CueScheduler::manual(500);
        let _ = cues.issue(RoundedO, CueKind::Go, 2_000, 1_000);
        assert!(!cues.check_held(RoundedU, 900, 1_200));
        assert!(!cues.check_held(RoundedO, 400, 1_400));
        assert!(cues.check_held(RoundedO, 500, 1_500));
        assert!(!cues.check_held(RoundedO, 600, 1_600));
    }

    #[test]
    fn no_signal_never_satisfies_a_stop_cue() {
        let mut cues = CueScheduler::manual(0);
        let _ = cues.issue(Protruding, CueKind::Stop, 500, 0);
        assert!(!cues.check(GestureState::NoSignal, 100));
    }

    #[test]
    fn poll_keeps_fixed_cadence_and_cycles_targets() {
        let mut cues = CueScheduler::new(&CueConfig {
            interval_ms: 3_000,
            window_ms: 2_000,
            response_hold_ms: 0,
            sequence: vec![
                CueTarget {
                    state: RoundedO,
                    kind: CueKind::Go,
                },
                CueTarget {
                    state: RoundedU,
                    kind: CueKind::Go,
                },
            ],
            label: "vowel".into(),
        });
        let first = cues.poll(500).expect("first cue issues immediately");
        assert_eq!(first.target, RoundedO);
        assert_eq!(cues.poll(3_499), None);
        let second = cues.poll(3_500).expect("second cue");
        assert_eq!(second.target, RoundedU);
        assert_eq!(second.issued_at_ms, 3_500);
        let third = cues.poll(6_600).expect("third cue");
        assert_eq!(third.target, RoundedO);
        assert_eq!(cues.poll(9_400), None);
        assert_eq!(cues.issued_count(), 3);
    }
}
