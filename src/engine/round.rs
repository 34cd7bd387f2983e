use std::sync::mpsc::Sender;

use statig::blocking::IntoStateMachineExt as _;

use self::machine::{DispatchContext, RoundEvent, RoundHsm};
use super::{
    trace::RoundTrace,
    types::{ChoiceOutcome, EventBuffer, GestureState, Phase, RawSample},
};
use crate::{
    error::ProfileError,
    profile::{validate_profile, GameProfile},
};

mod machine;
pub mod scoring;

/// Final tally of a completed round.
#[derive(Clone, Debug, PartialEq)]
pub struct RoundResult {
    pub game_type: String,
    pub correct_count: i32,
    pub total_possible: i32,
    pub accuracy_pct: f64,
    pub xp_awarded: i32,
    pub skill_tags: Vec<String>,
    pub stars: u8,
}

/// Receives each round's result exactly once, when the round completes.
pub trait ResultSink {
    fn submit(&mut self, result: &RoundResult);
}

impl ResultSink for Vec<RoundResult> {
    fn submit(&mut self, result: &RoundResult) {
        self.push(result.clone());
    }
}

impl ResultSink for Sender<RoundResult> {
    fn submit(&mut self, result: &RoundResult) {
        if self.send(result.clone()).is_err() {
            log::warn!("result receiver dropped; {} result lost", result.game_type);
        }
    }
}

#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct RoundState {
    pub phase: Phase,
    pub started_at_ms: Option<u64>,
    pub elapsed_ms: u64,
    pub credited_count: u32,
    pub aborted: bool,
}

#[derive(Clone, Debug, Default)]
pub struct TickOutput {
    pub events: EventBuffer,
    pub trace: RoundTrace,
    pub result: Option<RoundResult>,
}

/// Drives one game round from calibration to result.
pub struct RoundController {
    profile: GameProfile,
    machine: statig::blocking::StateMachine<RoundHsm>,
    sink: Option<Box<dyn ResultSink>>,
}

impl RoundController {
    pub fn new(profile: GameProfile) -> Result<Self, ProfileError> {
        validate_profile(&profile)?;
        Ok(Self {
            machine: RoundHsm::new(profile.clone()).state_machine(),
            profile,
            sink: None,
        })
    }

    pub fn with_sink(mut self, sink: impl ResultSink + 'static) -> Self {
        self.sink = Some(Box::new(sink));
        self
    }

    pub fn tick(&mut self, sample: RawSample) -> TickOutput {
        let mut context = DispatchContext::default();
        self.machine
            .handle_with_context(&RoundEvent::Tick(sample), &mut context);
        self.finish(context)
    }

    /// Fills the open slot of a choice-mode pattern.
    pub fn set_choice(&mut self, state: GestureState) -> ChoiceOutcome {
        let mut context = DispatchContext::default();
        self.machine
            .handle_with_context(&RoundEvent::Choice(state), &mut context);
        context.choice.unwrap_or(ChoiceOutcome::NotAwaiting)
    }

    /// Ends the round without a result and drops all in-flight state.
    pub fn abort(&mut self, now_ms: u64) -> TickOutput {
        let mut context = DispatchContext::default();
        self.machine
            .handle_with_context(&RoundEvent::Abort { now_ms }, &mut context);
        self.finish(context)
    }

    /// Starts a fresh round with the same profile, back in calibration.
    pub fn next_round(&mut self) {
        self.machine = RoundHsm::new(self.profile.clone()).state_machine();
    }

    pub fn phase(&self) -> Phase {
        self.machine.inner().round().phase
    }

    pub fn round_state(&self) -> RoundState {
        self.machine.inner().round()
    }

    pub fn stable_state(&self) -> Option<GestureState> {
        self.machine.inner().stable_state()
    }

    pub fn pattern_cursor(&self) -> usize {
        self.machine
            .inner()
            .matcher()
            .map_or(0, |matcher| matcher.cursor())
    }

    pub fn awaiting_choice(&self) -> bool {
        self.machine
            .inner()
            .matcher()
            .is_some_and(|matcher| matcher.awaiting_choice())
    }

    pub fn cues_issued(&self) -> u32 {
        self.machine
            .inner()
            .cues()
            .map_or(0, |cues| cues.issued_count())
    }

    pub fn profile(&self) -> &GameProfile {
        &self.profile
    }

    pub fn trace(&self) -> RoundTrace {
        self.machine.inner().last_trace()
    }

    fn finish(&mut self, context: DispatchContext) -> TickOutput {
        if let (Some(result), Some(sink)) = (context.result.as_ref(), self.sink.as_mut()) {
            sink.submit(result);
        }
        TickOutput {
            events: context.events,
            trace: self.machine.inner().last_trace(),
            result: context.result,
        }
    }
}
