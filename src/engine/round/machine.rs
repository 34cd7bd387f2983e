use statig::prelude::*;

use super::{scoring, RoundResult, RoundState};
use crate::engine::{
    classifier::{GestureClassifier, SweepTracker, TouchDetector},
    clock::SignalClock,
    cooldown::CooldownGuard,
    cue::CueScheduler,
    hold::{HoldReport, HoldTracker},
    sequence::SequenceMatcher,
    smoother::ChannelSmoother,
    stability::StabilityGate,
    trace::RoundTrace,
    types::{
        ChoiceOutcome, CreditKind, EngineEvent, EventBuffer, GestureState, Phase, RawSample,
        RejectReason, SmoothedSample, StepResult,
    },
};
use crate::profile::{ClassifierConfig, GameProfile};

#[derive(Clone, Copy, Debug)]
pub(super) enum RoundEvent {
    Tick(RawSample),
    Choice(GestureState),
    Abort { now_ms: u64 },
}

#[derive(Default)]
pub(super) struct DispatchContext {
    pub(super) events: EventBuffer,
    pub(super) result: Option<RoundResult>,
    pub(super) choice: Option<ChoiceOutcome>,
}

pub(super) struct RoundHsm {
    profile: GameProfile,
    smoother: ChannelSmoother,
    classifier: GestureClassifier,
    gate: StabilityGate<GestureState>,
    hold: HoldTracker,
    cooldown: CooldownGuard,
    touch: Option<TouchDetector>,
    sweep: Option<SweepTracker>,
    matcher: Option<SequenceMatcher>,
    cues: Option<CueScheduler>,
    clock: SignalClock,
    round: RoundState,
    face_since_ms: Option<u64>,
    prompt_shown: bool,
    countdown_remaining: u8,
    countdown_next_ms: u64,
    last_progress: f64,
    last_trace: RoundTrace,
}

impl RoundHsm {
    pub(super) fn new(profile: GameProfile) -> Self {
        let touch = match (&profile.touch, profile.classifier) {
            (Some(_), ClassifierConfig::Elevation { touch_threshold }) => {
                Some(TouchDetector::new(touch_threshold))
            }
            _ => None,
        };
        let sweep = match (&profile.sweep, profile.classifier) {
            (
                Some(_),
                ClassifierConfig::Lateral {
                    left_threshold,
                    right_threshold,
                },
            ) => Some(SweepTracker::new(left_threshold, right_threshold)),
            _ => None,
        };

        Self {
            smoother: ChannelSmoother::new(profile.smoothing_alpha),
            classifier: GestureClassifier::new(profile.classifier),
            gate: StabilityGate::new(profile.stability_window_ms),
            hold: HoldTracker::new(profile.hold_target_ms()),
            cooldown: CooldownGuard::new(profile.cooldown_ms),
            touch,
            sweep,
            matcher: profile.pattern.as_ref().map(SequenceMatcher::new),
            cues: profile.cues.as_ref().map(CueScheduler::new),
            clock: SignalClock::new(),
            round: RoundState::default(),
            face_since_ms: None,
            prompt_shown: false,
            countdown_remaining: 0,
            countdown_next_ms: 0,
            last_progress: 0.0,
            last_trace: RoundTrace::default(),
            profile,
        }
    }

    pub(super) fn round(&self) -> RoundState {
        self.round
    }

    pub(super) fn last_trace(&self) -> RoundTrace {
        self.last_trace
    }

    pub(super) fn stable_state(&self) -> Option<GestureState> {
        self.gate.confirmed()
    }

    pub(super) fn matcher(&self) -> Option<&SequenceMatcher> {
        self.matcher.as_ref()
    }

    pub(super) fn cues(&self) -> Option<&CueScheduler> {
        self.cues.as_ref()
    }

    fn enter_phase(&mut self, context: &mut DispatchContext, phase: Phase) {
        self.round.phase = phase;
        self.last_trace.phase = phase;
        context.events.push(EngineEvent::RoundPhaseChanged(phase));
        log::info!("{}: phase {}", self.profile.game_type, phase.as_str());
    }

    fn idle_trace(&mut self, now_ms: u64) {
        self.last_trace = RoundTrace {
            now_ms,
            phase: self.round.phase,
            credited_count: self.round.credited_count,
            ..RoundTrace::default()
        };
    }

    fn begin_countdown(&mut self, context: &mut DispatchContext, now_ms: u64) -> Outcome<State> {
        if self.profile.countdown_ticks == 0 {
            return self.begin_active(context, now_ms);
        }
        self.enter_phase(context, Phase::Countdown);
        self.countdown_remaining = self.profile.countdown_ticks;
        self.countdown_next_ms = now_ms.saturating_add(self.profile.countdown_step_ms);
        context.events.push(EngineEvent::CountdownTick {
            remaining: self.countdown_remaining,
        });
        Transition(State::countdown())
    }

    fn begin_active(&mut self, context: &mut DispatchContext, now_ms: u64) -> Outcome<State> {
        self.round.started_at_ms = Some(now_ms);
        self.round.elapsed_ms = 0;
        self.clock = SignalClock::new();
        self.enter_phase(context, Phase::Active);
        Transition(State::active())
    }

    fn clear_in_flight(&mut self) {
        self.smoother.reset();
        self.gate.reset();
        self.hold.reset();
        self.cooldown.reset();
        if let Some(sweep) = self.sweep.as_mut() {
            sweep.reset();
        }
        if let Some(matcher) = self.matcher.as_mut() {
            matcher.reset();
        }
        if let Some(cues) = self.cues.as_mut() {
            cues.reset();
        }
        self.clock = SignalClock::new();
        self.face_since_ms = None;
        self.last_progress = 0.0;
    }

    fn finish(&mut self, context: &mut DispatchContext, now_ms: u64) {
        let cues_issued = self.cues.as_ref().map_or(0, CueScheduler::issued_count);
        let result = scoring::build_result(&self.profile, self.round.credited_count, cues_issued);
        self.round.elapsed_ms = self
            .round
            .started_at_ms
            .map_or(0, |started| now_ms.saturating_sub(started));
        self.clear_in_flight();
        self.enter_phase(context, Phase::Complete);
        log::info!(
            "{}: {} of {} correct, {} stars, {} xp",
            result.game_type,
            result.correct_count,
            result.total_possible,
            result.stars,
            result.xp_awarded
        );
        context.result = Some(result);
    }

    fn abort(&mut self, context: &mut DispatchContext, now_ms: u64) {
        self.clear_in_flight();
        self.round.aborted = true;
        self.enter_phase(context, Phase::Complete);
        self.idle_trace(now_ms);
        log::warn!("{}: round aborted", self.profile.game_type);
    }

    fn credit(&mut self, context: &mut DispatchContext, kind: CreditKind, signal_ms: u64) -> bool {
        if !self.cooldown.try_credit(kind, signal_ms) {
            log::debug!("{} suppressed by cooldown", self.profile.label(kind));
            return false;
        }
        self.round.credited_count = self.round.credited_count.saturating_add(1);
        context.events.push(EngineEvent::EventCredited {
            kind,
            count: self.round.credited_count,
        });
        log::debug!(
            "{} credited ({})",
            self.profile.label(kind),
            self.round.credited_count
        );
        true
    }

    fn emit_hold_progress(
        &mut self,
        context: &mut DispatchContext,
        stable: GestureState,
        hold: &HoldReport,
    ) {
        let Some(target) = self.profile.hold.as_ref().map(|h| h.state) else {
            return;
        };
        let progress = if stable == target { hold.progress } else { 0.0 };
        if progress != self.last_progress {
            self.last_progress = progress;
            context.events.push(EngineEvent::HoldProgress {
                state: target,
                progress,
            });
        }
    }

    fn update_active_trace(
        &mut self,
        now_ms: u64,
        signal_ms: u64,
        candidate: GestureState,
        hold: &HoldReport,
        reject_reason: RejectReason,
    ) {
        self.last_trace = RoundTrace {
            now_ms,
            signal_ms,
            phase: self.round.phase,
            candidate,
            stable: self.gate.confirmed(),
            hold_elapsed_ms: hold.elapsed_ms,
            hold_progress: hold.progress,
            cursor: self.matcher.as_ref().map_or(0, SequenceMatcher::cursor),
            credited_count: self.round.credited_count,
            reject_reason,
        };
    }

    /// Runs one Active tick; true once the round has completed.
    fn process_active(&mut self, context: &mut DispatchContext, sample: &RawSample) -> bool {
        let now_ms = sample.now_ms;
        let started = *self.round.started_at_ms.get_or_insert(now_ms);
        self.round.elapsed_ms = now_ms.saturating_sub(started);
        if self.round.elapsed_ms >= self.profile.round_duration_ms {
            self.finish(context, now_ms);
            return true;
        }

        let smoothed = self.smoother.update(sample);
        let candidate = self.classifier.classify(&smoothed);

        if !candidate.has_signal() {
            if self.clock.pause(now_ms) {
                context.events.push(EngineEvent::SignalLost);
                log::debug!("signal lost at {now_ms} ms");
            }
            let signal_ms = self.clock.signal_ms(now_ms);
            let hold = self.hold.tick(GestureState::NoSignal, signal_ms);
            self.update_active_trace(now_ms, signal_ms, candidate, &hold, RejectReason::NoSignal);
            return false;
        }
        if self.clock.resume(now_ms) {
            context.events.push(EngineEvent::SignalRestored);
            log::debug!(
                "signal restored at {now_ms} ms ({} ms paused)",
                self.clock.paused_total_ms()
            );
        }
        let signal_ms = self.clock.signal_ms(now_ms);
        let mut reject = RejectReason::None;

        if let Some(state) = self.gate.observe(candidate, signal_ms) {
            context.events.push(EngineEvent::StableStateChanged(state));
            log::debug!("stable state {}", state.as_str());
        }
        let stable = self.gate.confirmed().unwrap_or(GestureState::NoSignal);
        if self.gate.pending().is_some() {
            reject = RejectReason::Unstable;
        }

        let hold = self.hold.tick(stable, signal_ms);
        self.emit_hold_progress(context, stable, &hold);
        let hold_target = self.profile.hold.as_ref().map(|h| h.state);
        if hold.crossed_threshold
            && hold_target == Some(stable)
            && !self.credit(context, CreditKind::Hold, signal_ms)
        {
            reject = RejectReason::CooldownActive;
        }

        self.detect_contacts(context, &smoothed, signal_ms, &mut reject);
        self.advance_pattern(context, stable, &hold, signal_ms, &mut reject);
        self.run_cues(context, stable, &hold, signal_ms, &mut reject);

        self.update_active_trace(now_ms, signal_ms, candidate, &hold, reject);

        let rules = &self.profile.scoring;
        let target_reached = rules.end_on_target
            && rules
                .target_count
                .is_some_and(|target| self.round.credited_count >= target);
        if target_reached {
            self.finish(context, now_ms);
            return true;
        }
        false
    }

    fn detect_contacts(
        &mut self,
        context: &mut DispatchContext,
        smoothed: &SmoothedSample,
        signal_ms: u64,
        reject: &mut RejectReason,
    ) {
        let touched = self.touch.is_some_and(|touch| touch.check(smoothed));
        if touched && !self.credit(context, CreditKind::Touch, signal_ms) {
            *reject = RejectReason::CooldownActive;
        }

        let swept = self
            .sweep
            .as_mut()
            .is_some_and(|sweep| sweep.check(smoothed));
        if swept && !self.credit(context, CreditKind::Sweep, signal_ms) {
            *reject = RejectReason::CooldownActive;
        }
    }

    fn advance_pattern(
        &mut self,
        context: &mut DispatchContext,
        stable: GestureState,
        hold: &HoldReport,
        signal_ms: u64,
        reject: &mut RejectReason,
    ) {
        let Some(matcher) = self.matcher.as_mut() else {
            return;
        };
        match matcher.advance(stable, hold.elapsed_ms, signal_ms) {
            StepResult::Waiting => {}
            StepResult::Advanced => {
                let cursor = matcher.cursor();
                context
                    .events
                    .push(EngineEvent::PatternAdvanced { cursor });
                log::debug!("pattern step {cursor}");
            }
            StepResult::PatternComplete => {
                context.events.push(EngineEvent::PatternComplete);
                if !self.credit(context, CreditKind::Pattern, signal_ms) {
                    *reject = RejectReason::CooldownActive;
                }
            }
            StepResult::Reset => {
                *reject = matcher.last_reset().unwrap_or(RejectReason::StepMismatch);
                context.events.push(EngineEvent::PatternReset);
                log::debug!("pattern reset ({:?})", reject);
            }
        }
    }

    fn run_cues(
        &mut self,
        context: &mut DispatchContext,
        stable: GestureState,
        hold: &HoldReport,
        signal_ms: u64,
        reject: &mut RejectReason,
    ) {
        let Some(cues) = self.cues.as_mut() else {
            return;
        };
        if let Some(cue) = cues.poll(signal_ms) {
            context.events.push(EngineEvent::CueIssued {
                target: cue.target,
                kind: cue.kind,
                window_ms: cue.window_ms,
            });
            log::debug!("cue {:?} {}", cue.kind, cue.target.as_str());
        }

        let held_ms = if hold.state == stable { hold.elapsed_ms } else { 0 };
        let answered = cues.check_held(stable, held_ms, signal_ms);
        if !answered && *reject == RejectReason::None {
            if cues.missed(signal_ms) {
                *reject = RejectReason::CueExpired;
            } else if cues
                .active()
                .is_some_and(|cue| !cue.credited && cue.is_open(signal_ms) && !cue.matches(stable))
            {
                *reject = RejectReason::CueMismatch;
            }
        }
        if answered && !self.credit(context, CreditKind::Cue, signal_ms) {
            *reject = RejectReason::CooldownActive;
        }
    }
}

#[state_machine(initial = "State::calibration()")]
impl RoundHsm {
    #[superstate]
    fn live(&mut self, context: &mut DispatchContext, event: &RoundEvent) -> Outcome<State> {
        match event {
            RoundEvent::Abort { now_ms } => {
                self.abort(context, *now_ms);
                Transition(State::complete())
            }
            RoundEvent::Choice(_) => {
                context.choice = Some(ChoiceOutcome::NotAwaiting);
                Handled
            }
            RoundEvent::Tick(_) => Handled,
        }
    }

    #[state(superstate = "live")]
    fn calibration(&mut self, context: &mut DispatchContext, event: &RoundEvent) -> Outcome<State> {
        match event {
            RoundEvent::Tick(sample) => {
                self.idle_trace(sample.now_ms);
                if !sample.detecting {
                    self.face_since_ms = None;
                    if !self.prompt_shown {
                        self.prompt_shown = true;
                        context.events.push(EngineEvent::CalibrationPrompt);
                    }
                    return Handled;
                }
                self.prompt_shown = false;
                let since = *self.face_since_ms.get_or_insert(sample.now_ms);
                if sample.now_ms.saturating_sub(since) < self.profile.calibration_dwell_ms {
                    return Handled;
                }
                self.begin_countdown(context, sample.now_ms)
            }
            _ => Super,
        }
    }

    #[state(superstate = "live")]
    fn countdown(&mut self, context: &mut DispatchContext, event: &RoundEvent) -> Outcome<State> {
        match event {
            RoundEvent::Tick(sample) => {
                let now_ms = sample.now_ms;
                self.idle_trace(now_ms);
                while self.countdown_remaining > 0 && now_ms >= self.countdown_next_ms {
                    self.countdown_remaining -= 1;
                    self.countdown_next_ms = self
                        .countdown_next_ms
                        .saturating_add(self.profile.countdown_step_ms);
                    if self.countdown_remaining > 0 {
                        context.events.push(EngineEvent::CountdownTick {
                            remaining: self.countdown_remaining,
                        });
                    }
                }
                if self.countdown_remaining == 0 {
                    return self.begin_active(context, now_ms);
                }
                Handled
            }
            _ => Super,
        }
    }

    #[state(superstate = "live")]
    fn active(&mut self, context: &mut DispatchContext, event: &RoundEvent) -> Outcome<State> {
        match event {
            RoundEvent::Tick(sample) => {
                if self.process_active(context, sample) {
                    return Transition(State::complete());
                }
                Handled
            }
            RoundEvent::Choice(state) => {
                let outcome = self
                    .matcher
                    .as_mut()
                    .map_or(ChoiceOutcome::NotAwaiting, |m| m.set_choice(*state));
                if outcome == ChoiceOutcome::Rejected {
                    log::warn!("choice {} rejected", state.as_str());
                }
                context.choice = Some(outcome);
                Handled
            }
            RoundEvent::Abort { .. } => Super,
        }
    }

    #[state]
    fn complete(&mut self, context: &mut DispatchContext, event: &RoundEvent) -> Outcome<State> {
        if let RoundEvent::Choice(_) = event {
            context.choice = Some(ChoiceOutcome::NotAwaiting);
        }
        Handled
    }
}
