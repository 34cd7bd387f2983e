use crate::profile::{MatchMode, PatternConfig, PatternTemplate};

use super::types::{ChoiceOutcome, GestureState, RejectReason, StepResult};

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct PatternStep {
    pub expected: GestureState,
    pub target_duration_ms: Option<u64>,
    pub tolerance_ms: Option<u64>,
}

impl PatternStep {
    pub const fn hold(expected: GestureState) -> Self {
        Self {
            expected,
            target_duration_ms: None,
            tolerance_ms: None,
        }
    }

    pub const fn timed(expected: GestureState, target_ms: u64, tolerance_ms: u64) -> Self {
        Self {
            expected,
            target_duration_ms: Some(target_ms),
            tolerance_ms: Some(tolerance_ms),
        }
    }

    /// Inclusive `[target - tol, target + tol]`, if the step is timed.
    pub fn window(&self) -> Option<(u64, u64)> {
        self.target_duration_ms.map(|target| {
            let tolerance = self.tolerance_ms.unwrap_or(0);
            (
                target.saturating_sub(tolerance),
                target.saturating_add(tolerance),
            )
        })
    }

    pub fn accepts(&self, held_ms: u64) -> bool {
        self.window()
            .map_or(true, |(low, high)| (low..=high).contains(&held_ms))
    }

    fn overrun(&self, held_ms: u64) -> bool {
        self.window().is_some_and(|(_, high)| held_ms > high)
    }
}

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Pattern {
    steps: Vec<PatternStep>,
    cursor: usize,
}

impl Pattern {
    pub fn new(steps: Vec<PatternStep>) -> Self {
        Self { steps, cursor: 0 }
    }

    /// Builds a concrete pattern; the missing slot, if any, takes `choice`.
    pub fn from_template(template: &PatternTemplate, choice: Option<GestureState>) -> Option<Self> {
        let steps = template
            .steps
            .iter()
            .map(|step| {
                Some(PatternStep {
                    expected: step.expected.or(choice)?,
                    target_duration_ms: step.target_duration_ms,
                    tolerance_ms: step.tolerance_ms,
                })
            })
            .collect::<Option<Vec<_>>>()?;
        if steps.is_empty() {
            return None;
        }
        Some(Self::new(steps))
    }

    pub fn steps(&self) -> &[PatternStep] {
        &self.steps
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    pub fn current(&self) -> Option<&PatternStep> {
        self.steps.get(self.cursor)
    }

    pub fn is_last_step(&self) -> bool {
        self.cursor + 1 == self.steps.len()
    }

    pub fn contains(&self, state: GestureState) -> bool {
        self.steps.iter().any(|step| step.expected == state)
    }
}

#[derive(Clone, Copy, Debug)]
struct Observation {
    state: GestureState,
    elapsed_ms: u64,
    at_ms: u64,
}

/// Walks a step cursor through ordered gesture patterns.
///
/// Timing mode judges each step when the child releases it; choice mode
/// waits for `set_choice` and then accepts each step after `step_hold_ms`.
/// A hold episode can satisfy at most one step.
#[derive(Clone, Debug)]
pub struct SequenceMatcher {
    mode: MatchMode,
    templates: Vec<PatternTemplate>,
    template_index: usize,
    step_hold_ms: u64,
    step_timeout_ms: Option<u64>,
    pattern: Option<Pattern>,
    observed: Option<Observation>,
    episode_used: bool,
    last_accepted: Option<GestureState>,
    step_started_ms: Option<u64>,
    last_reset: Option<RejectReason>,
}

impl SequenceMatcher {
    pub fn new(config: &PatternConfig) -> Self {
        let mut matcher = Self {
            mode: config.mode,
            templates: config.templates.clone(),
            template_index: 0,
            step_hold_ms: config.step_hold_ms,
            step_timeout_ms: config.step_timeout_ms,
            pattern: None,
            observed: None,
            episode_used: false,
            last_accepted: None,
            step_started_ms: None,
            last_reset: None,
        };
        matcher.pattern = matcher.fresh_pattern();
        matcher
    }

    pub fn mode(&self) -> MatchMode {
        self.mode
    }

    pub fn template(&self) -> Option<&PatternTemplate> {
        self.templates.get(self.template_index)
    }

    pub fn pattern(&self) -> Option<&Pattern> {
        self.pattern.as_ref()
    }

    pub fn cursor(&self) -> usize {
        self.pattern.as_ref().map_or(0, Pattern::cursor)
    }

    pub fn awaiting_choice(&self) -> bool {
        self.mode == MatchMode::Choice && self.pattern.is_none()
    }

    pub fn last_reset(&self) -> Option<RejectReason> {
        self.last_reset
    }

    pub fn set_choice(&mut self, state: GestureState) -> ChoiceOutcome {
        if !self.awaiting_choice() {
            return ChoiceOutcome::NotAwaiting;
        }
        let Some(template) = self.template() else {
            return ChoiceOutcome::NotAwaiting;
        };

        let offered = template.options.is_empty() || template.options.contains(&state);
        let correct = template.answer.map_or(true, |answer| answer == state);
        if !offered || !correct {
            log::debug!("choice {} rejected", state.as_str());
            return ChoiceOutcome::Rejected;
        }

        let Some(pattern) = Pattern::from_template(template, Some(state)) else {
            return ChoiceOutcome::Rejected;
        };
        self.pattern = Some(pattern);
        // Performing starts from a fresh gesture, not the one held while choosing.
        self.episode_used = true;
        self.last_accepted = None;
        self.step_started_ms = None;
        ChoiceOutcome::Accepted
    }

    pub fn advance(&mut self, stable: GestureState, hold_elapsed_ms: u64, now_ms: u64) -> StepResult {
        if !stable.has_signal() {
            return StepResult::Waiting;
        }

        let previous = self.observed;
        let changed = previous.map_or(true, |o| o.state != stable);
        let released_used = self.episode_used;
        if changed {
            self.episode_used = false;
        }
        self.observed = Some(Observation {
            state: stable,
            elapsed_ms: hold_elapsed_ms,
            at_ms: now_ms,
        });

        if self.pattern.is_none() {
            return StepResult::Waiting;
        }

        let started = *self.step_started_ms.get_or_insert(now_ms);
        let deadline_active = match self.mode {
            MatchMode::Timing => self.cursor() > 0,
            MatchMode::Choice => true,
        };
        let timed_out = self
            .step_timeout_ms
            .is_some_and(|timeout| now_ms.saturating_sub(started) >= timeout);
        if deadline_active && timed_out {
            log::debug!("pattern step {} timed out", self.cursor());
            self.last_reset = Some(RejectReason::StepTimeout);
            self.next_cycle();
            return StepResult::Reset;
        }

        match self.mode {
            MatchMode::Timing => {
                let released = previous.filter(|_| changed);
                self.advance_timed(released, released_used, stable, hold_elapsed_ms, now_ms)
            }
            MatchMode::Choice => self.advance_chosen(changed, stable, hold_elapsed_ms, now_ms),
        }
    }

    fn advance_timed(
        &mut self,
        released: Option<Observation>,
        released_used: bool,
        stable: GestureState,
        hold_elapsed_ms: u64,
        now_ms: u64,
    ) -> StepResult {
        let Some(step) = self.current_step() else {
            return StepResult::Waiting;
        };

        if let Some(released) = released {
            let mut result = StepResult::Waiting;
            if !released_used && released.state == step.expected {
                let held_ms = released
                    .elapsed_ms
                    .saturating_add(now_ms.saturating_sub(released.at_ms));
                result = if step.accepts(held_ms) {
                    self.step_forward(now_ms)
                } else {
                    self.reset_cursor(now_ms)
                };
            }

            let mismatched = self.cursor() > 0
                && self
                    .current_step()
                    .is_some_and(|next| next.expected != stable);
            if mismatched {
                result = self.reset_cursor(now_ms);
            }
            return result;
        }

        if self.episode_used || stable != step.expected {
            return StepResult::Waiting;
        }
        if step.overrun(hold_elapsed_ms) {
            self.episode_used = true;
            return self.reset_cursor(now_ms);
        }
        let last_reached = self.pattern.as_ref().is_some_and(Pattern::is_last_step)
            && step
                .target_duration_ms
                .is_some_and(|target| hold_elapsed_ms >= target);
        if last_reached {
            self.episode_used = true;
            return self.step_forward(now_ms);
        }
        StepResult::Waiting
    }

    fn advance_chosen(
        &mut self,
        changed: bool,
        stable: GestureState,
        hold_elapsed_ms: u64,
        now_ms: u64,
    ) -> StepResult {
        let Some(step) = self.current_step() else {
            return StepResult::Waiting;
        };

        if stable == step.expected {
            if self.episode_used || hold_elapsed_ms < self.step_hold_ms {
                return StepResult::Waiting;
            }
            self.episode_used = true;
            self.last_accepted = Some(stable);
            return self.step_forward(now_ms);
        }

        let disallowed = changed
            && self.cursor() > 0
            && self.last_accepted != Some(stable)
            && self.pattern.as_ref().is_some_and(|p| p.contains(stable));
        if disallowed {
            return self.reset_cursor(now_ms);
        }
        StepResult::Waiting
    }

    fn current_step(&self) -> Option<PatternStep> {
        self.pattern.as_ref().and_then(Pattern::current).copied()
    }

    fn step_forward(&mut self, now_ms: u64) -> StepResult {
        let Some(pattern) = self.pattern.as_mut() else {
            return StepResult::Waiting;
        };
        pattern.cursor += 1;
        self.step_started_ms = Some(now_ms);
        if pattern.cursor < pattern.steps.len() {
            log::debug!("pattern advanced to step {}", pattern.cursor);
            return StepResult::Advanced;
        }
        self.next_cycle();
        StepResult::PatternComplete
    }

    fn reset_cursor(&mut self, now_ms: u64) -> StepResult {
        if let Some(pattern) = self.pattern.as_mut() {
            pattern.cursor = 0;
        }
        self.last_accepted = None;
        self.step_started_ms = Some(now_ms);
        self.last_reset = Some(RejectReason::StepMismatch);
        StepResult::Reset
    }

    fn next_cycle(&mut self) {
        if !self.templates.is_empty() {
            self.template_index = (self.template_index + 1) % self.templates.len();
        }
        self.pattern = self.fresh_pattern();
        self.last_accepted = None;
        self.step_started_ms = None;
    }

    fn fresh_pattern(&self) -> Option<Pattern> {
        match self.mode {
            MatchMode::Timing => self
                .template()
                .and_then(|template| Pattern::from_template(template, None)),
            MatchMode::Choice => None,
        }
    }

    pub fn reset(&mut self) {
        self.template_index = 0;
        self.pattern = self.fresh_pattern();
        self.observed = None;
        self.episode_used = false;
        self.last_accepted = None;
        self.step_started_ms = None;
        self.last_reset = None;
    }
}

#[cfg(test)]
mod tests;
