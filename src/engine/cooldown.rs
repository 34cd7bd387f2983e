use super::types::CreditKind;

/// Minimum spacing between two credits of the same kind.
#[derive(Clone, Copy, Debug)]
pub struct CooldownGuard {
    cooldown_ms: u64,
    last_credited_at_ms: [Option<u64>; CreditKind::COUNT],
}

impl CooldownGuard {
    pub const fn new(cooldown_ms: u64) -> Self {
        Self {
            cooldown_ms,
            last_credited_at_ms: [None; CreditKind::COUNT],
        }
    }

    pub fn try_credit(&mut self, kind: CreditKind, now_ms: u64) -> bool {
        if self.in_cooldown(kind, now_ms) {
            return false;
        }
        self.last_credited_at_ms[kind.index()] = Some(now_ms);
        true
    }

    pub fn in_cooldown(&self, kind: CreditKind, now_ms: u64) -> bool {
        self.last_credited_at_ms[kind.index()]
            .is_some_and(|last| now_ms.saturating_sub(last) <= self.cooldown_ms)
    }

    pub fn last_credited_at_ms(&self, kind: CreditKind) -> Option<u64> {
        self.last_credited_at_ms[kind.index()]
    }

    pub fn reset(&mut self) {
        self.last_credited_at_ms = [None; CreditKind::COUNT];
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn spacing_must_exceed_cooldown() {
        let mut guard = CooldownGuard::new(1_000);
        assert!(guard.try_credit(CreditKind::Hold, 5_000));
        assert!(!guard.try_credit(CreditKind::Hold, 5_000));
        assert!(!guard.try_credit(CreditKind::Hold, 6_000));
        assert!(guard.try_credit(CreditKind::Hold, 6_001));
    }

    #[test]
    fn kinds_cool_down_independently() {
        let mut guard = CooldownGuard::new(500);
        assert!(guard.try_credit(CreditKind::Touch, 100));
        assert!(guard.try_credit(CreditKind::Sweep, 120));
        assert!(!guard.try_credit(CreditKind::Touch, 300));
        assert_eq!(guard.last_credited_at_ms(CreditKind::Touch), Some(100));
    }

    #[test]
    fn high_frequency_calls_never_break_spacing() {
        let mut guard = CooldownGuard::new(700);
        let mut last: Option<u64> = None;
        for now in (0..20_000).step_by(7) {
            if guard.try_credit(CreditKind::Cue, now) {
                if let Some(prev) = last {
                    assert!(now - prev > 700);
                }
                last = Some(now);
            }
        }
    }
}
