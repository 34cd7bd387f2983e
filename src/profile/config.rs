use serde::Deserialize;

use crate::engine::types::{Channel, CreditKind, CueKind, GestureState};

const OPEN_CLOSED_VOCABULARY: &[GestureState] = &[GestureState::Open, GestureState::Closed];
const ROUNDNESS_VOCABULARY: &[GestureState] = &[
    GestureState::RoundedO,
    GestureState::RoundedU,
    GestureState::Neither,
];
const PROTRUSION_VOCABULARY: &[GestureState] = &[GestureState::Protruding, GestureState::Relaxed];
const SEAL_VOCABULARY: &[GestureState] = &[GestureState::Sealed, GestureState::Unsealed];
const ELEVATION_VOCABULARY: &[GestureState] = &[GestureState::Elevated, GestureState::Grounded];
const LATERAL_VOCABULARY: &[GestureState] = &[
    GestureState::Left,
    GestureState::Center,
    GestureState::Right,
];

/// One game's tuning: thresholds, timing and which scoring mechanics run.
#[derive(Clone, Debug, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct GameProfile {
    pub game_type: String,
    #[serde(default)]
    pub skill_tags: Vec<String>,
    #[serde(default = "default_smoothing_alpha")]
    pub smoothing_alpha: f64,
    #[serde(default = "default_stability_window_ms")]
    pub stability_window_ms: u64,
    #[serde(default = "default_cooldown_ms")]
    pub cooldown_ms: u64,
    #[serde(default = "default_round_duration_ms")]
    pub round_duration_ms: u64,
    #[serde(default = "default_calibration_dwell_ms")]
    pub calibration_dwell_ms: u64,
    #[serde(default = "default_countdown_ticks")]
    pub countdown_ticks: u8,
    #[serde(default = "default_countdown_step_ms")]
    pub countdown_step_ms: u64,
    pub classifier: ClassifierConfig,
    pub hold: Option<HoldConfig>,
    pub touch: Option<TouchConfig>,
    pub sweep: Option<SweepConfig>,
    pub pattern: Option<PatternConfig>,
    pub cues: Option<CueConfig>,
    pub scoring: ScoringConfig,
}

impl GameProfile {
    /// Display name the UI uses for a credited event ("pump", "feed", ...).
    pub fn label(&self, kind: CreditKind) -> &str {
        let label = match kind {
            CreditKind::Hold => self.hold.as_ref().map(|c| c.label.as_str()),
            CreditKind::Touch => self.touch.as_ref().map(|c| c.label.as_str()),
            CreditKind::Sweep => self.sweep.as_ref().map(|c| c.label.as_str()),
            CreditKind::Pattern => self.pattern.as_ref().map(|c| c.label.as_str()),
            CreditKind::Cue => self.cues.as_ref().map(|c| c.label.as_str()),
        };
        label.unwrap_or(kind.as_str())
    }

    /// Hold target used by the tracker when no explicit hold mechanic is set.
    pub fn hold_target_ms(&self) -> u64 {
        if let Some(hold) = &self.hold {
            return hold.target_ms;
        }
        if let Some(cues) = self.cues.as_ref().filter(|c| c.response_hold_ms > 0) {
            return cues.response_hold_ms;
        }
        self.pattern
            .as_ref()
            .map_or(default_step_hold_ms(), |p| p.step_hold_ms)
    }
}

#[derive(Clone, Copy, Debug, Deserialize, PartialEq)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ClassifierConfig {
    OpenClosed {
        #[serde(default = "default_open_threshold")]
        open_threshold: f64,
    },
    Roundness {
        #[serde(default = "default_open_threshold")]
        open_threshold: f64,
        #[serde(default = "default_o_threshold")]
        o_threshold: f64,
        #[serde(default = "default_u_threshold")]
        u_threshold: f64,
    },
    Protrusion {
        #[serde(default = "default_protrusion_threshold")]
        protrusion_threshold: f64,
        #[serde(default)]
        close_threshold: Option<f64>,
    },
    Elevation {
        #[serde(default = "default_touch_threshold")]
        touch_threshold: f64,
    },
    Lateral {
        #[serde(default = "default_left_threshold")]
        left_threshold: f64,
        #[serde(default = "default_right_threshold")]
        right_threshold: f64,
    },
}

impl ClassifierConfig {
    pub const fn name(&self) -> &'static str {
        match self {
            ClassifierConfig::OpenClosed { .. } => "open_closed",
            ClassifierConfig::Roundness { .. } => "roundness",
            ClassifierConfig::Protrusion { .. } => "protrusion",
            ClassifierConfig::Elevation { .. } => "elevation",
            ClassifierConfig::Lateral { .. } => "lateral",
        }
    }

    /// The channel whose absence turns the classification into `NoSignal`.
    pub const fn channel(&self) -> Channel {
        match self {
            ClassifierConfig::OpenClosed { .. } => Channel::OpenRatio,
            ClassifierConfig::Roundness { .. } => Channel::Roundness,
            ClassifierConfig::Protrusion { .. } => Channel::Protrusion,
            ClassifierConfig::Elevation { .. } => Channel::Elevation,
            ClassifierConfig::Lateral { .. } => Channel::HorizontalPosition,
        }
    }

    pub const fn vocabulary(&self) -> &'static [GestureState] {
        match self {
            ClassifierConfig::OpenClosed { .. } => OPEN_CLOSED_VOCABULARY,
            ClassifierConfig::Roundness { .. } => ROUNDNESS_VOCABULARY,
            ClassifierConfig::Protrusion {
                close_threshold: None,
                ..
            } => PROTRUSION_VOCABULARY,
            ClassifierConfig::Protrusion { .. } => SEAL_VOCABULARY,
            ClassifierConfig::Elevation { .. } => ELEVATION_VOCABULARY,
            ClassifierConfig::Lateral { .. } => LATERAL_VOCABULARY,
        }
    }

    pub fn produces(&self, state: GestureState) -> bool {
        self.vocabulary().contains(&state)
    }
}

#[derive(Clone, Debug, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct HoldConfig {
    pub state: GestureState,
    pub target_ms: u64,
    #[serde(default = "default_hold_label")]
    pub label: String,
}

#[derive(Clone, Debug, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct TouchConfig {
    #[serde(default = "default_touch_label")]
    pub label: String,
}

#[derive(Clone, Debug, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct SweepConfig {
    #[serde(default = "default_sweep_label")]
    pub label: String,
}

#[derive(Clone, Copy, Debug, Eq, PartialEq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchMode {
    /// Each step has a target duration and tolerance.
    Timing,
    /// The child picks the missing step, then performs the sequence.
    Choice,
}

#[derive(Clone, Debug, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct PatternConfig {
    pub mode: MatchMode,
    pub templates: Vec<PatternTemplate>,
    #[serde(default = "default_step_hold_ms")]
    pub step_hold_ms: u64,
    #[serde(default)]
    pub step_timeout_ms: Option<u64>,
    #[serde(default = "default_pattern_label")]
    pub label: String,
}

#[derive(Clone, Debug, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct PatternTemplate {
    pub steps: Vec<StepTemplate>,
    #[serde(default)]
    pub options: Vec<GestureState>,
    #[serde(default)]
    pub answer: Option<GestureState>,
}

impl PatternTemplate {
    pub fn missing_slots(&self) -> usize {
        self.steps.iter().filter(|s| s.expected.is_none()).count()
    }
}

/// A template step; a step without `expected` is the slot the child fills.
#[derive(Clone, Copy, Debug, Default, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct StepTemplate {
    #[serde(default)]
    pub expected: Option<GestureState>,
    #[serde(default)]
    pub target_duration_ms: Option<u64>,
    #[serde(default)]
    pub tolerance_ms: Option<u64>,
}

#[derive(Clone, Debug, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct CueConfig {
    #[serde(default = "default_cue_interval_ms")]
    pub interval_ms: u64,
    pub window_ms: u64,
    #[serde(default)]
    pub response_hold_ms: u64,
    pub sequence: Vec<CueTarget>,
    #[serde(default = "default_cue_label")]
    pub label: String,
}

#[derive(Clone, Copy, Debug, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct CueTarget {
    pub state: GestureState,
    pub kind: CueKind,
}

#[derive(Clone, Copy, Debug, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct ScoringConfig {
    pub star_breakpoints: [u32; 3],
    #[serde(default = "default_xp_per_star")]
    pub xp_per_star: u32,
    #[serde(default)]
    pub target_count: Option<u32>,
    #[serde(default)]
    pub end_on_target: bool,
    #[serde(default)]
    pub total_possible: Option<u32>,
}

impl ScoringConfig {
    pub fn stars_for(&self, correct: u32) -> u8 {
        self.star_breakpoints
            .iter()
            .filter(|breakpoint| correct >= **breakpoint)
            .count() as u8
    }
}

fn default_smoothing_alpha() -> f64 {
    0.25
}

fn default_stability_window_ms() -> u64 {
    300
}

fn default_cooldown_ms() -> u64 {
    1_000
}

fn default_round_duration_ms() -> u64 {
    20_000
}

fn default_calibration_dwell_ms() -> u64 {
    1_000
}

fn default_countdown_ticks() -> u8 {
    3
}

fn default_countdown_step_ms() -> u64 {
    1_000
}

fn default_open_threshold() -> f64 {
    0.03
}

fn default_o_threshold() -> f64 {
    0.7
}

fn default_u_threshold() -> f64 {
    0.6
}

fn default_protrusion_threshold() -> f64 {
    0.45
}

fn default_touch_threshold() -> f64 {
    0.72
}

fn default_left_threshold() -> f64 {
    0.3
}

fn default_right_threshold() -> f64 {
    0.7
}

fn default_step_hold_ms() -> u64 {
    500
}

fn default_cue_interval_ms() -> u64 {
    3_000
}

fn default_xp_per_star() -> u32 {
    10
}

fn default_hold_label() -> String {
    "hold".into()
}

fn default_touch_label() -> String {
    "touch".into()
}

fn default_sweep_label() -> String {
    "sweep".into()
}

fn default_pattern_label() -> String {
    "pattern".into()
}

fn default_cue_label() -> String {
    "cue".into()
}
