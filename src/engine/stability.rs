/// Confirms a classified value only after it has been observed continuously
/// for `window_ms`. Confirmations are reported once; repeats return `None`.
#[derive(Clone, Copy, Debug)]
pub struct StabilityGate<T> {
    window_ms: u64,
    candidate: Option<T>,
    since_ms: u64,
    confirmed: Option<T>,
}

impl<T: Copy + PartialEq> StabilityGate<T> {
    pub const fn new(window_ms: u64) -> Self {
        Self {
            window_ms,
            candidate: None,
            since_ms: 0,
            confirmed: None,
        }
    }

    pub fn observe(&mut self, candidate: T, now_ms: u64) -> Option<T> {
        if self.candidate != Some(candidate) {
            self.candidate = Some(candidate);
            self.since_ms = now_ms;
            return None;
        }

        if self.confirmed == Some(candidate) {
            return None;
        }

        if now_ms.saturating_sub(self.since_ms) < self.window_ms {
            return None;
        }

        self.confirmed = Some(candidate);
        Some(candidate)
    }

    pub fn confirmed(&self) -> Option<T> {
        self.confirmed
    }

    /// The candidate still dwelling, if it differs from the confirmed value.
    pub fn pending(&self) -> Option<T> {
        self.candidate.filter(|c| self.confirmed != Some(*c))
    }

    pub fn dwell_ms(&self, now_ms: u64) -> u64 {
        if self.candidate.is_none() {
            return 0;
        }
        now_ms.saturating_sub(self.since_ms)
    }

    pub fn window_ms(&self) -> u64 {
        self.window_ms
    }

    pub fn reset(&mut self) {
        self.candidate = None;
        self.since_ms = 0;
        self.confirmed = None;
    }
}
