use super::RoundResult;
use crate::profile::GameProfile;

/// Denominator for accuracy: an explicit profile value, else the cues that
/// were actually issued, else the target count, else the top star breakpoint.
pub fn total_possible(profile: &GameProfile, cues_issued: u32) -> u32 {
    if let Some(total) = profile.scoring.total_possible {
        return total;
    }
    if profile.cues.is_some() {
        return cues_issued;
    }
    profile
        .scoring
        .target_count
        .unwrap_or(profile.scoring.star_breakpoints[2])
}

pub fn accuracy_pct(correct: u32, total: u32) -> f64 {
    if total == 0 {
        return 0.0;
    }
    (f64::from(correct) / f64::from(total) * 100.0).min(100.0)
}

pub fn build_result(profile: &GameProfile, correct: u32, cues_issued: u32) -> RoundResult {
    let total = total_possible(profile, cues_issued);
    let stars = profile.scoring.stars_for(correct);
    let xp = u32::from(stars).saturating_mul(profile.scoring.xp_per_star);
    RoundResult {
        game_type: profile.game_type.clone(),
        correct_count: clamp_i32(correct),
        total_possible: clamp_i32(total),
        accuracy_pct: accuracy_pct(correct, total),
        xp_awarded: clamp_i32(xp),
        skill_tags: profile.skill_tags.clone(),
        stars,
    }
}

fn clamp_i32(value: u32) -> i32 {
    i32::try_from(value).unwrap_or(i32::MAX)
}
