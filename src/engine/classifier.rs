use crate::profile::ClassifierConfig;

use super::types::{Channel, GestureState, SmoothedSample};

/// Maps smoothed channel values onto the profile's gesture vocabulary.
#[derive(Clone, Copy, Debug)]
pub struct GestureClassifier {
    config: ClassifierConfig,
}

impl GestureClassifier {
    pub const fn new(config: ClassifierConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &ClassifierConfig {
        &self.config
    }

    pub fn vocabulary(&self) -> &'static [GestureState] {
        self.config.vocabulary()
    }

    pub fn classify(&self, sample: &SmoothedSample) -> GestureState {
        if !sample.detecting {
            return GestureState::NoSignal;
        }
        let Some(value) = sample.get(self.config.channel()) else {
            return GestureState::NoSignal;
        };

        match self.config {
            ClassifierConfig::OpenClosed { open_threshold } => {
                if value > open_threshold {
                    GestureState::Open
                } else {
                    GestureState::Closed
                }
            }
            ClassifierConfig::Roundness {
                open_threshold,
                o_threshold,
                u_threshold,
            } => classify_roundness(
                value,
                sample.get(Channel::OpenRatio),
                open_threshold,
                o_threshold,
                u_threshold,
            ),
            ClassifierConfig::Protrusion {
                protrusion_threshold,
                close_threshold: None,
            } => {
                if value >= protrusion_threshold {
                    GestureState::Protruding
                } else {
                    GestureState::Relaxed
                }
            }
            ClassifierConfig::Protrusion {
                protrusion_threshold,
                close_threshold: Some(close_threshold),
            } => {
                let closed = sample
                    .get(Channel::OpenRatio)
                    .is_some_and(|open| open < close_threshold);
                if value >= protrusion_threshold && closed {
                    GestureState::Sealed
                } else {
                    GestureState::Unsealed
                }
            }
            ClassifierConfig::Elevation { touch_threshold } => {
                if value >= touch_threshold {
                    GestureState::Elevated
                } else {
                    GestureState::Grounded
                }
            }
            ClassifierConfig::Lateral {
                left_threshold,
                right_threshold,
            } => {
                if value < left_threshold {
                    GestureState::Left
                } else if value > right_threshold {
                    GestureState::Right
                } else {
                    GestureState::Center
                }
            }
        }
    }
}

// A rounded but closed mouth is not a valid vowel shape.
fn classify_roundness(
    roundness: f64,
    open_ratio: Option<f64>,
    open_threshold: f64,
    o_threshold: f64,
    u_threshold: f64,
) -> GestureState {
    let open = open_ratio.is_some_and(|ratio| ratio > open_threshold);
    if !open {
        return GestureState::Neither;
    }
    if roundness >= o_threshold {
        GestureState::RoundedO
    } else if roundness >= u_threshold {
        GestureState::RoundedU
    } else {
        GestureState::Neither
    }
}

/// Level-triggered tongue touch on the smoothed elevation channel. Bypasses
/// the stability gate; only the cooldown spaces repeated touches.
#[derive(Clone, Copy, Debug)]
pub struct TouchDetector {
    threshold: f64,
}

impl TouchDetector {
    pub const fn new(threshold: f64) -> Self {
        Self { threshold }
    }

    pub fn check(&self, sample: &SmoothedSample) -> bool {
        sample.detecting
            && sample
                .get(Channel::Elevation)
                .is_some_and(|elevation| elevation >= self.threshold)
    }
}

#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub enum SweepCursor {
    #[default]
    Idle,
    Left,
    Right,
}

/// Registers one sweep per crossing below the left threshold followed later
/// by a crossing above the right threshold.
#[derive(Clone, Copy, Debug)]
pub struct SweepTracker {
    left_threshold: f64,
    right_threshold: f64,
    cursor: SweepCursor,
}

impl SweepTracker {
    pub const fn new(left_threshold: f64, right_threshold: f64) -> Self {
        Self {
            left_threshold,
            right_threshold,
            cursor: SweepCursor::Idle,
        }
    }

    pub fn observe(&mut self, x: f64) -> bool {
        if x < self.left_threshold {
            self.cursor = SweepCursor::Left;
            return false;
        }
        if x > self.right_threshold && self.cursor == SweepCursor::Left {
            self.cursor = SweepCursor::Right;
            return true;
        }
        false
    }

    pub fn check(&mut self, sample: &SmoothedSample) -> bool {
        if !sample.detecting {
            return false;
        }
        sample
            .get(Channel::HorizontalPosition)
            .is_some_and(|x| self.observe(x))
    }

    pub fn cursor(&self) -> SweepCursor {
        self.cursor
    }

    pub fn reset(&mut self) {
        self.cursor = SweepCursor::Idle;
    }
}
