use super::config::{ClassifierConfig, GameProfile, MatchMode, PatternConfig};
use crate::{
    engine::types::GestureState,
    error::{ProfileError, Result},
};

fn invalid(message: impl Into<String>) -> ProfileError {
    ProfileError::Validation(message.into())
}

fn check_unit(field: &str, value: f64) -> Result<()> {
    if !(0.0..=1.0).contains(&value) {
        return Err(invalid(format!("{field} must be within [0, 1], got {value}")));
    }
    Ok(())
}

fn check_state(field: &str, classifier: &ClassifierConfig, state: GestureState) -> Result<()> {
    if !classifier.produces(state) {
        return Err(invalid(format!(
            "{field} `{}` is not produced by the {} classifier",
            state.as_str(),
            classifier.name()
        )));
    }
    Ok(())
}

/// Semantic checks the TOML schema cannot express. A profile that passes
/// is safe to hand to a round controller.
pub fn validate_profile(profile: &GameProfile) -> Result<()> {
    if profile.game_type.trim().is_empty() {
        return Err(invalid("game_type must not be empty"));
    }
    let game = profile.game_type.as_str();

    if !(profile.smoothing_alpha > 0.0 && profile.smoothing_alpha <= 1.0) {
        return Err(invalid(format!(
            "{game}: smoothing_alpha must be within (0, 1], got {}",
            profile.smoothing_alpha
        )));
    }
    for (field, value) in [
        ("stability_window_ms", profile.stability_window_ms),
        ("cooldown_ms", profile.cooldown_ms),
        ("round_duration_ms", profile.round_duration_ms),
        ("calibration_dwell_ms", profile.calibration_dwell_ms),
    ] {
        if value == 0 {
            return Err(invalid(format!("{game}: {field} must be > 0")));
        }
    }
    if profile.countdown_ticks > 0 && profile.countdown_step_ms == 0 {
        return Err(invalid(format!(
            "{game}: countdown_step_ms must be > 0 when countdown_ticks is set"
        )));
    }

    validate_classifier(game, &profile.classifier)?;
    validate_mechanics(game, profile)?;
    validate_scoring(game, profile)
}

fn validate_classifier(game: &str, classifier: &ClassifierConfig) -> Result<()> {
    match *classifier {
        ClassifierConfig::OpenClosed { open_threshold } => {
            check_unit(&format!("{game}: classifier.open_threshold"), open_threshold)
        }
        ClassifierConfig::Roundness {
            open_threshold,
            o_threshold,
            u_threshold,
        } => {
            check_unit(&format!("{game}: classifier.open_threshold"), open_threshold)?;
            check_unit(&format!("{game}: classifier.o_threshold"), o_threshold)?;
            check_unit(&format!("{game}: classifier.u_threshold"), u_threshold)?;
            if u_threshold >= o_threshold {
                return Err(invalid(format!(
                    "{game}: classifier.u_threshold must be < classifier.o_threshold"
                )));
            }
            Ok(())
        }
        ClassifierConfig::Protrusion {
            protrusion_threshold,
            close_threshold,
        } => {
            check_unit(
                &format!("{game}: classifier.protrusion_threshold"),
                protrusion_threshold,
            )?;
            if let Some(close) = close_threshold {
                check_unit(&format!("{game}: classifier.close_threshold"), close)?;
            }
            Ok(())
        }
        ClassifierConfig::Elevation { touch_threshold } => {
            check_unit(&format!("{game}: classifier.touch_threshold"), touch_threshold)
        }
        ClassifierConfig::Lateral {
            left_threshold,
            right_threshold,
        } => {
            check_unit(&format!("{game}: classifier.left_threshold"), left_threshold)?;
            check_unit(&format!("{game}: classifier.right_threshold"), right_threshold)?;
            if left_threshold >= right_threshold {
                return Err(invalid(format!(
                    "{game}: classifier.left_threshold must be < classifier.right_threshold"
                )));
            }
            Ok(())
        }
    }
}

fn validate_mechanics(game: &str, profile: &GameProfile) -> Result<()> {
    let classifier = &profile.classifier;
    let has_mechanic = profile.hold.is_some()
        || profile.touch.is_some()
        || profile.sweep.is_some()
        || profile.pattern.is_some()
        || profile.cues.is_some();
    if !has_mechanic {
        return Err(invalid(format!(
            "{game}: at least one of hold, touch, sweep, pattern or cues must be configured"
        )));
    }

    if let Some(hold) = &profile.hold {
        check_state(&format!("{game}: hold.state"), classifier, hold.state)?;
        if hold.target_ms == 0 {
            return Err(invalid(format!("{game}: hold.target_ms must be > 0")));
        }
    }
    if profile.touch.is_some() && !matches!(classifier, ClassifierConfig::Elevation { .. }) {
        return Err(invalid(format!(
            "{game}: touch requires the elevation classifier, found {}",
            classifier.name()
        )));
    }
    if profile.sweep.is_some() && !matches!(classifier, ClassifierConfig::Lateral { .. }) {
        return Err(invalid(format!(
            "{game}: sweep requires the lateral classifier, found {}",
            classifier.name()
        )));
    }
    if let Some(pattern) = &profile.pattern {
        validate_pattern(game, classifier, pattern)?;
    }
    if let Some(cues) = &profile.cues {
        if cues.sequence.is_empty() {
            return Err(invalid(format!("{game}: cues.sequence must not be empty")));
        }
        if cues.interval_ms == 0 || cues.window_ms == 0 {
            return Err(invalid(format!(
                "{game}: cues.interval_ms and cues.window_ms must be > 0"
            )));
        }
        if cues.window_ms > cues.interval_ms {
            return Err(invalid(format!(
                "{game}: cues.window_ms must be <= cues.interval_ms"
            )));
        }
        for (index, target) in cues.sequence.iter().enumerate() {
            check_state(
                &format!("{game}: cues.sequence[{index}].state"),
                classifier,
                target.state,
            )?;
        }
    }
    Ok(())
}

fn validate_pattern(
    game: &str,
    classifier: &ClassifierConfig,
    pattern: &PatternConfig,
) -> Result<()> {
    if pattern.templates.is_empty() {
        return Err(invalid(format!("{game}: pattern.templates must not be empty")));
    }
    if pattern.step_hold_ms == 0 {
        return Err(invalid(format!("{game}: pattern.step_hold_ms must be > 0")));
    }
    if pattern.step_timeout_ms == Some(0) {
        return Err(invalid(format!("{game}: pattern.step_timeout_ms must be > 0")));
    }

    for (t, template) in pattern.templates.iter().enumerate() {
        let prefix = format!("{game}: pattern.templates[{t}]");
        if template.steps.is_empty() {
            return Err(invalid(format!("{prefix}.steps must not be empty")));
        }

        for (s, step) in template.steps.iter().enumerate() {
            if let Some(expected) = step.expected {
                check_state(&format!("{prefix}.steps[{s}].expected"), classifier, expected)?;
            }
            if pattern.mode == MatchMode::Timing {
                let Some(target) = step.target_duration_ms.filter(|t| *t > 0) else {
                    return Err(invalid(format!(
                        "{prefix}.steps[{s}].target_duration_ms must be > 0 in timing mode"
                    )));
                };
                if step.tolerance_ms.is_some_and(|tolerance| tolerance >= target) {
                    return Err(invalid(format!(
                        "{prefix}.steps[{s}].tolerance_ms must be < target_duration_ms"
                    )));
                }
            }
        }

        match pattern.mode {
            MatchMode::Timing => {
                if template.missing_slots() != 0 {
                    return Err(invalid(format!(
                        "{prefix}: every step needs `expected` in timing mode"
                    )));
                }
            }
            MatchMode::Choice => {
                if template.missing_slots() != 1 {
                    return Err(invalid(format!(
                        "{prefix} must have exactly one step without `expected` in choice mode"
                    )));
                }
                if template.options.is_empty() {
                    return Err(invalid(format!("{prefix}.options must not be empty")));
                }
                for (o, option) in template.options.iter().enumerate() {
                    check_state(&format!("{prefix}.options[{o}]"), classifier, *option)?;
                }
                if let Some(answer) = template.answer {
                    if !template.options.contains(&answer) {
                        return Err(invalid(format!(
                            "{prefix}.answer `{}` must be one of the options",
                            answer.as_str()
                        )));
                    }
                }
            }
        }
    }
    Ok(())
}

fn validate_scoring(game: &str, profile: &GameProfile) -> Result<()> {
    let scoring = &profile.scoring;
    let [first, second, third] = scoring.star_breakpoints;
    if first == 0 || !(first < second && second < third) {
        return Err(invalid(format!(
            "{game}: scoring.star_breakpoints must be strictly ascending and start at >= 1"
        )));
    }
    if scoring.target_count == Some(0) {
        return Err(invalid(format!("{game}: scoring.target_count must be > 0")));
    }
    if scoring.end_on_target && scoring.target_count.is_none() {
        return Err(invalid(format!(
            "{game}: scoring.end_on_target requires scoring.target_count"
        )));
    }
    if scoring.total_possible == Some(0) {
        return Err(invalid(format!("{game}: scoring.total_possible must be > 0")));
    }
    Ok(())
}
