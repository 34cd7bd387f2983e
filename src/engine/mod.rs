pub mod classifier;
pub mod clock;
pub mod cooldown;
pub mod cue;
pub mod hold;
pub mod round;
pub mod sequence;
pub mod smoother;
pub mod stability;
pub mod trace;
pub mod types;

pub use round::{ResultSink, RoundController, RoundResult, RoundState, TickOutput};
pub use trace::RoundTrace;
pub use types::{
    ChoiceOutcome, CreditKind, CueKind, EngineEvent, EventBuffer, GestureState, Phase, RawSample,
    RejectReason, StepResult, TonguePosition,
};
