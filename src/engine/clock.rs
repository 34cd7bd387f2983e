/// Wall time minus every span spent without a usable signal.
///
/// Dwell, hold, cooldown, deadline and cue timers all read this clock so a
/// tracking dropout pauses them instead of erasing or inflating progress.
#[derive(Clone, Copy, Debug, Default)]
pub struct SignalClock {
    paused_total_ms: u64,
    paused_since_ms: Option<u64>,
}

impl SignalClock {
    pub const fn new() -> Self {
        Self {
            paused_total_ms: 0,
            paused_since_ms: None,
        }
    }

    /// Returns true when this call started the pause.
    pub fn pause(&mut self, now_ms: u64) -> bool {
        if self.paused_since_ms.is_some() {
            return false;
        }
        self.paused_since_ms = Some(now_ms);
        true
    }

    /// Returns true when this call ended a pause.
    pub fn resume(&mut self, now_ms: u64) -> bool {
        let Some(since) = self.paused_since_ms.take() else {
            return false;
        };
        self.paused_total_ms = self
            .paused_total_ms
            .saturating_add(now_ms.saturating_sub(since));
        true
    }

    pub fn is_paused(&self) -> bool {
        self.paused_since_ms.is_some()
    }

    pub fn paused_total_ms(&self) -> u64 {
        self.paused_total_ms
    }

    pub fn signal_ms(&self, now_ms: u64) -> u64 {
        self.paused_since_ms
            .unwrap_or(now_ms)
            .saturating_sub(self.paused_total_ms)
    }
}
