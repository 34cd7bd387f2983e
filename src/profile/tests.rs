use super::*;
use crate::{engine::types::GestureState, error::ProfileError};

const MINIMAL: &str = r#"
[[profile]]
game_type = "feed"
classifier = { kind = "open_closed" }
hold = { state = "open", target_ms = 300 }
scoring = { star_breakpoints = [1, 3, 5] }
"#;

fn minimal_profile() -> GameProfile {
    ProfileCatalog::from_toml_str(MINIMAL)
        .expect("minimal catalogue should load")
        .require("feed")
        .expect("feed profile")
        .clone()
}

fn validation_message(profile: &GameProfile) -> String {
    match validate_profile(profile) {
        Err(ProfileError::Validation(msg)) => msg,
        other => panic!("expected validation error, got {other:?}"),
    }
}

#[test]
fn serde_defaults_fill_common_tuning() {
    let profile = minimal_profile();
    assert_eq!(profile.smoothing_alpha, 0.25);
    assert_eq!(profile.stability_window_ms, 300);
    assert_eq!(profile.cooldown_ms, 1_000);
    assert_eq!(profile.round_duration_ms, 20_000);
    assert_eq!(profile.countdown_ticks, 3);
    assert_eq!(profile.scoring.xp_per_star, 10);
    assert_eq!(profile.label(crate::engine::types::CreditKind::Hold), "hold");
}

#[test]
fn builtin_catalogue_loads_and_validates() {
    let catalog = builtin_catalog().expect("builtin catalogue must validate");
    for game in [
        "mouth-open-close",
        "balloon-pump",
        "lip-seal",
        "vowel-shapes",
        "tongue-touch",
        "tongue-sweep",
        "robot-sequence",
        "pattern-match",
        "stop-go-breathing",
    ] {
        assert!(catalog.get(game).is_some(), "missing builtin profile `{game}`");
    }
    assert_eq!(catalog.len(), 9);
}

#[test]
fn unknown_game_is_reported_by_name() {
    let catalog = builtin_catalog().expect("builtin catalogue");
    match catalog.require("kazoo") {
        Err(ProfileError::UnknownGame(name)) => assert_eq!(name, "kazoo"),
        other => panic!("expected unknown game, got {other:?}"),
    }
}

#[test]
fn duplicate_game_types_are_rejected() {
    let text = format!("{MINIMAL}\n{MINIMAL}");
    match ProfileCatalog::from_toml_str(&text) {
        Err(ProfileError::DuplicateGame(name)) => assert_eq!(name, "feed"),
        other => panic!("expected duplicate game, got {other:?}"),
    }
}

#[test]
fn unknown_fields_are_parse_errors() {
    let text = MINIMAL.replace("target_ms = 300", "target_ms = 300, wobble = 1");
    assert!(matches!(
        ProfileCatalog::from_toml_str(&text),
        Err(ProfileError::Parse(_))
    ));
}

#[test]
fn smoothing_alpha_must_be_in_unit_interval() {
    let mut profile = minimal_profile();
    profile.smoothing_alpha = 0.0;
    assert!(validation_message(&profile).contains("smoothing_alpha must be within (0, 1]"));
    profile.smoothing_alpha = 1.0;
    assert!(validate_profile(&profile).is_ok());
}

#[test]
fn roundness_thresholds_must_be_monotonic() {
    let mut profile = minimal_profile();
    profile.hold = Some(HoldConfig {
        state: GestureState::RoundedO,
        target_ms: 500,
        label: "o".into(),
    });
    profile.classifier = ClassifierConfig::Roundness {
        open_threshold: 0.03,
        o_threshold: 0.6,
        u_threshold: 0.6,
    };
    assert!(validation_message(&profile)
        .contains("classifier.u_threshold must be < classifier.o_threshold"));
}

#[test]
fn hold_state_outside_vocabulary_is_rejected() {
    let mut profile = minimal_profile();
    profile.hold = Some(HoldConfig {
        state: GestureState::Sealed,
        target_ms: 500,
        label: "seal".into(),
    });
    assert!(validation_message(&profile)
        .contains("hold.state `sealed` is not produced by the open_closed classifier"));
}

#[test]
fn zero_length_pattern_is_rejected() {
    let mut profile = minimal_profile();
    profile.pattern = Some(PatternConfig {
        mode: MatchMode::Timing,
        templates: vec![PatternTemplate {
            steps: Vec::new(),
            options: Vec::new(),
            answer: None,
        }],
        step_hold_ms: 500,
        step_timeout_ms: None,
        label: "robot".into(),
    });
    assert!(validation_message(&profile).contains("pattern.templates[0].steps must not be empty"));
}

#[test]
fn timing_steps_need_tolerance_below_target() {
    let mut profile = minimal_profile();
    profile.pattern = Some(PatternConfig {
        mode: MatchMode::Timing,
        templates: vec![PatternTemplate {
            steps: vec![StepTemplate {
                expected: Some(GestureState::Open),
                target_duration_ms: Some(1_000),
                tolerance_ms: Some(1_000),
            }],
            options: Vec::new(),
            answer: None,
        }],
        step_hold_ms: 500,
        step_timeout_ms: None,
        label: "robot".into(),
    });
    assert!(validation_message(&profile)
        .contains("pattern.templates[0].steps[0].tolerance_ms must be < target_duration_ms"));
}

#[test]
fn choice_templates_need_exactly_one_slot() {
    let mut profile = minimal_profile();
    profile.pattern = Some(PatternConfig {
        mode: MatchMode::Choice,
        templates: vec![PatternTemplate {
            steps: vec![StepTemplate::default(), StepTemplate::default()],
            options: vec![GestureState::Open],
            answer: None,
        }],
        step_hold_ms: 500,
        step_timeout_ms: None,
        label: "pick".into(),
    });
    assert!(validation_message(&profile)
        .contains("must have exactly one step without `expected` in choice mode"));
}

#[test]
fn touch_requires_elevation_classifier() {
    let mut profile = minimal_profile();
    profile.touch = Some(TouchConfig {
        label: "pop".into(),
    });
    assert!(validation_message(&profile).contains("touch requires the elevation classifier"));
}

#[test]
fn star_breakpoints_must_ascend() {
    let mut profile = minimal_profile();
    profile.scoring.star_breakpoints = [1, 3, 3];
    assert!(validation_message(&profile).contains("scoring.star_breakpoints"));
}

#[test]
fn profile_without_mechanic_is_rejected() {
    let mut profile = minimal_profile();
    profile.hold = None;
    assert!(validation_message(&profile).contains("at least one of hold"));
}

#[test]
fn stars_count_reached_breakpoints() {
    let scoring = minimal_profile().scoring;
    assert_eq!(scoring.stars_for(0), 0);
    assert_eq!(scoring.stars_for(1), 1);
    assert_eq!(scoring.stars_for(4), 2);
    assert_eq!(scoring.stars_for(9), 3);
}

#[test]
fn catalogue_loads_from_disk() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("profiles.toml");
    std::fs::write(&path, MINIMAL).expect("write fixture");

    let catalog = ProfileCatalog::from_path(&path).expect("catalogue from disk");
    assert_eq!(catalog.game_types().collect::<Vec<_>>(), vec!["feed"]);

    let missing = dir.path().join("absent.toml");
    match ProfileCatalog::from_path(&missing) {
        Err(ProfileError::Io { path, .. }) => assert_eq!(path, missing),
        other => panic!("expected io error, got {other:?}"),
    }
}
