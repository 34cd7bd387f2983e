use super::types::{GestureState, Phase, RejectReason};

/// Snapshot of the last processed tick, for replay tooling and diagnostics.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct RoundTrace {
    pub now_ms: u64,
    pub signal_ms: u64,
    pub phase: Phase,
    pub candidate: GestureState,
    pub stable: Option<GestureState>,
    pub hold_elapsed_ms: u64,
    pub hold_progress: f64,
    pub cursor: usize,
    pub credited_count: u32,
    pub reject_reason: RejectReason,
}
