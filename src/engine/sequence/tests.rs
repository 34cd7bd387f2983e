use super::*;
use crate::profile::StepTemplate;
use GestureState::{Center, Closed, Left, Neither, Open, Right, RoundedO, RoundedU};

fn timed(expected: GestureState, target_ms: u64, tolerance_ms: u64) -> StepTemplate {
    StepTemplate {
        expected: Some(expected),
        target_duration_ms: Some(target_ms),
        tolerance_ms: Some(tolerance_ms),
    }
}

fn held(expected: GestureState) -> StepTemplate {
    StepTemplate {
        expected: Some(expected),
        ..StepTemplate::default()
    }
}

fn robot_matcher() -> SequenceMatcher {
    SequenceMatcher::new(&PatternConfig {
        mode: MatchMode::Timing,
        templates: vec![PatternTemplate {
            steps: vec![
                timed(Open, 1_000, 300),
                timed(Closed, 1_000, 300),
                timed(Open, 2_000, 300),
            ],
            options: vec![],
            answer: None,
        }],
        step_hold_ms: 500,
        step_timeout_ms: None,
        label: "beep".into(),
    })
}

fn choice_matcher(
    steps: Vec<StepTemplate>,
    options: Vec<GestureState>,
    answer: Option<GestureState>,
    step_timeout_ms: Option<u64>,
) -> SequenceMatcher {
    SequenceMatcher::new(&PatternConfig {
        mode: MatchMode::Choice,
        templates: vec![PatternTemplate {
            steps,
            options,
            answer,
        }],
        step_hold_ms: 500,
        step_timeout_ms,
        label: "build".into(),
    })
}

#[test]
fn overlong_second_step_resets_to_start() {
    let mut matcher = robot_matcher();
    assert_eq!(matcher.advance(Open, 0, 0), StepResult::Waiting);
    assert_eq!(matcher.advance(Open, 950, 950), StepResult::Waiting);
    assert_eq!(matcher.advance(Closed, 0, 950), StepResult::Advanced);
    assert_eq!(matcher.cursor(), 1);

    assert_eq!(matcher.advance(Closed, 1_300, 2_250), StepResult::Waiting);
    assert_eq!(matcher.advance(Closed, 1_600, 2_550), StepResult::Reset);
    assert_eq!(matcher.cursor(), 0);
    assert_eq!(matcher.last_reset(), Some(RejectReason::StepMismatch));

    // Releasing the spoiled hold does not count again.
    assert_eq!(matcher.advance(Open, 0, 2_600), StepResult::Waiting);
    assert_eq!(matcher.cursor(), 0);
}

#[test]
fn released_hold_outside_window_resets() {
    let mut matcher = robot_matcher();
    let _ = matcher.advance(Open, 0, 0);
    let _ = matcher.advance(Open, 600, 600);
    assert_eq!(matcher.advance(Closed, 0, 600), StepResult::Reset);
    assert_eq!(matcher.cursor(), 0);
}

#[test]
fn full_timing_pattern_completes_on_final_target() {
    let mut matcher = robot_matcher();
    let _ = matcher.advance(Open, 0, 0);
    let _ = matcher.advance(Open, 1_000, 1_000);
    assert_eq!(matcher.advance(Closed, 0, 1_000), StepResult::Advanced);
    let _ = matcher.advance(Closed, 1_100, 2_100);
    assert_eq!(matcher.advance(Open, 0, 2_100), StepResult::Advanced);
    assert_eq!(matcher.cursor(), 2);
    assert_eq!(matcher.advance(Open, 1_999, 4_099), StepResult::Waiting);
    assert_eq!(matcher.advance(Open, 2_000, 4_100), StepResult::PatternComplete);
    assert_eq!(matcher.cursor(), 0);

    // Same episode cannot start the next pattern.
    assert_eq!(matcher.advance(Open, 2_500, 4_600), StepResult::Waiting);
    assert_eq!(matcher.advance(Closed, 0, 4_600), StepResult::Waiting);
    assert_eq!(matcher.cursor(), 0);
}

#[test]
fn repeated_identical_input_is_idempotent() {
    let mut matcher = robot_matcher();
    let _ = matcher.advance(Open, 0, 0);
    let _ = matcher.advance(Open, 1_000, 1_000);
    assert_eq!(matcher.advance(Closed, 0, 1_000), StepResult::Advanced);
    assert_eq!(matcher.advance(Closed, 0, 1_000), StepResult::Waiting);
    assert_eq!(matcher.cursor(), 1);
}

#[test]
fn no_signal_leaves_cursor_alone() {
    let mut matcher = robot_matcher();
    let _ = matcher.advance(Open, 0, 0);
    let _ = matcher.advance(Open, 1_000, 1_000);
    let _ = matcher.advance(Closed, 0, 1_000);
    assert_eq!(
        matcher.advance(GestureState::NoSignal, 0, 1_200),
        StepResult::Waiting
    );
    assert_eq!(matcher.cursor(), 1);
}

#[test]
fn choice_must_match_answer() {
    let mut matcher = choice_matcher(
        vec![held(RoundedO), StepTemplate::default(), held(RoundedU)],
        vec![RoundedO, RoundedU],
        Some(RoundedU),
        None,
    );
    assert!(matcher.awaiting_choice());
    assert_eq!(matcher.advance(RoundedO, 900, 900), StepResult::Waiting);
    assert_eq!(matcher.set_choice(RoundedO), ChoiceOutcome::Rejected);
    assert_eq!(matcher.set_choice(RoundedU), ChoiceOutcome::Accepted);
    assert_eq!(matcher.set_choice(RoundedU), ChoiceOutcome::NotAwaiting);
    assert_eq!(
        matcher.pattern().map(|p| p.steps().len()),
        Some(3),
    );
}

#[test]
fn chosen_sequence_is_performed_with_fresh_holds() {
    let mut matcher = choice_matcher(
        vec![held(RoundedO), StepTemplate::default(), held(RoundedU)],
        vec![RoundedO, RoundedU],
        None,
        None,
    );
    let _ = matcher.advance(RoundedO, 0, 0);
    assert_eq!(matcher.set_choice(RoundedU), ChoiceOutcome::Accepted);

    // The shape held while choosing does not count.
    assert_eq!(matcher.advance(RoundedO, 800, 800), StepResult::Waiting);
    let _ = matcher.advance(Neither, 0, 900);
    let _ = matcher.advance(RoundedO, 0, 1_300);
    assert_eq!(matcher.advance(RoundedO, 499, 1_799), StepResult::Waiting);
    assert_eq!(matcher.advance(RoundedO, 500, 1_800), StepResult::Advanced);

    let _ = matcher.advance(RoundedU, 0, 2_200);
    assert_eq!(matcher.advance(RoundedU, 500, 2_700), StepResult::Advanced);
    assert_eq!(matcher.cursor(), 2);

    // Same shape twice in a row needs a new episode.
    assert_eq!(matcher.advance(RoundedU, 1_200, 3_400), StepResult::Waiting);
    assert_eq!(matcher.advance(Neither, 0, 3_500), StepResult::Waiting);
    let _ = matcher.advance(RoundedU, 0, 3_900);
    assert_eq!(matcher.advance(RoundedU, 500, 4_400), StepResult::PatternComplete);
    assert!(matcher.awaiting_choice());
}

#[test]
fn wrong_pattern_gesture_resets_choice_cursor() {
    let mut matcher = choice_matcher(
        vec![held(Left), held(Right), StepTemplate::default()],
        vec![Left, Center, Right],
        Some(Center),
        None,
    );
    let _ = matcher.advance(Center, 0, 0);
    assert_eq!(matcher.set_choice(Center), ChoiceOutcome::Accepted);
    let _ = matcher.advance(Left, 0, 400);
    assert_eq!(matcher.advance(Left, 500, 900), StepResult::Advanced);
    assert_eq!(matcher.advance(Center, 0, 1_300), StepResult::Reset);
    assert_eq!(matcher.cursor(), 0);
    assert!(!matcher.awaiting_choice());
}

#[test]
fn step_deadline_starts_a_new_choice_cycle() {
    let mut matcher = choice_matcher(
        vec![held(RoundedO), StepTemplate::default()],
        vec![RoundedO, RoundedU],
        None,
        Some(3_000),
    );
    assert_eq!(matcher.set_choice(RoundedU), ChoiceOutcome::Accepted);
    assert_eq!(matcher.advance(Neither, 0, 1_000), StepResult::Waiting);
    assert_eq!(matcher.advance(Neither, 2_999, 3_999), StepResult::Waiting);
    assert_eq!(matcher.advance(Neither, 3_000, 4_000), StepResult::Reset);
    assert_eq!(matcher.last_reset(), Some(RejectReason::StepTimeout));
    assert!(matcher.awaiting_choice());
}
