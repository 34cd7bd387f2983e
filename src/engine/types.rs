use heapless::Vec as BoundedVec;
use serde::Deserialize;

#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct TonguePosition {
    pub x: f64,
    pub y: f64,
}

/// One tracker reading. Optional fields are channels the tracker may not
/// report for every face or every game.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct RawSample {
    pub now_ms: u64,
    pub detecting: bool,
    pub open_ratio: f64,
    pub is_open: bool,
    pub protrusion: Option<f64>,
    pub roundness: Option<f64>,
    pub tongue_elevation: Option<f64>,
    pub tongue_position: Option<TonguePosition>,
    pub tongue_visible: Option<bool>,
}

impl RawSample {
    pub fn channel(&self, channel: Channel) -> Option<f64> {
        let tongue_hidden = matches!(self.tongue_visible, Some(false));
        let value = match channel {
            Channel::OpenRatio => Some(self.open_ratio),
            Channel::Protrusion => self.protrusion,
            Channel::Roundness => self.roundness,
            Channel::Elevation if tongue_hidden => None,
            Channel::Elevation => self.tongue_elevation,
            Channel::HorizontalPosition if tongue_hidden => None,
            Channel::HorizontalPosition => self.tongue_position.map(|p| p.x),
        };
        value.filter(|v| v.is_finite())
    }
}

/// Lip roundness as mouth height over width; width is floored at one pixel.
pub fn roundness_from_mouth(height: f64, width: f64) -> f64 {
    height / width.max(1.0)
}

#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash)]
#[repr(u8)]
pub enum Channel {
    OpenRatio = 0,
    Protrusion = 1,
    Roundness = 2,
    Elevation = 3,
    HorizontalPosition = 4,
}

impl Channel {
    pub const COUNT: usize = 5;
    pub const ALL: [Channel; Self::COUNT] = [
        Channel::OpenRatio,
        Channel::Protrusion,
        Channel::Roundness,
        Channel::Elevation,
        Channel::HorizontalPosition,
    ];

    pub const fn index(self) -> usize {
        self as usize
    }

    pub const fn as_str(self) -> &'static str {
        match self {
            Channel::OpenRatio => "open_ratio",
            Channel::Protrusion => "protrusion",
            Channel::Roundness => "roundness",
            Channel::Elevation => "elevation",
            Channel::HorizontalPosition => "horizontal_position",
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct SmoothedSample {
    pub detecting: bool,
    values: [Option<f64>; Channel::COUNT],
}

impl SmoothedSample {
    pub const fn stale() -> Self {
        Self {
            detecting: false,
            values: [None; Channel::COUNT],
        }
    }

    pub const fn detecting() -> Self {
        Self {
            detecting: true,
            values: [None; Channel::COUNT],
        }
    }

    pub fn get(&self, channel: Channel) -> Option<f64> {
        self.values[channel.index()]
    }

    pub fn set(&mut self, channel: Channel, value: Option<f64>) {
        self.values[channel.index()] = value;
    }

    pub fn with(mut self, channel: Channel, value: f64) -> Self {
        self.set(channel, Some(value));
        self
    }
}

#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, Hash, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GestureState {
    #[default]
    NoSignal,
    Open,
    Closed,
    RoundedO,
    RoundedU,
    Neither,
    Protruding,
    Relaxed,
    Sealed,
    Unsealed,
    Elevated,
    Grounded,
    Left,
    Center,
    Right,
}

impl GestureState {
    pub const fn as_str(self) -> &'static str {
        match self {
            GestureState::NoSignal => "no_signal",
            GestureState::Open => "open",
            GestureState::Closed => "closed",
            GestureState::RoundedO => "rounded_o",
            GestureState::RoundedU => "rounded_u",
            GestureState::Neither => "neither",
            GestureState::Protruding => "protruding",
            GestureState::Relaxed => "relaxed",
            GestureState::Sealed => "sealed",
            GestureState::Unsealed => "unsealed",
            GestureState::Elevated => "elevated",
            GestureState::Grounded => "grounded",
            GestureState::Left => "left",
            GestureState::Center => "center",
            GestureState::Right => "right",
        }
    }

    pub fn parse(text: &str) -> Option<Self> {
        const ALL: [GestureState; 15] = [
            GestureState::NoSignal,
            GestureState::Open,
            GestureState::Closed,
            GestureState::RoundedO,
            GestureState::RoundedU,
            GestureState::Neither,
            GestureState::Protruding,
            GestureState::Relaxed,
            GestureState::Sealed,
            GestureState::Unsealed,
            GestureState::Elevated,
            GestureState::Grounded,
            GestureState::Left,
            GestureState::Center,
            GestureState::Right,
        ];
        ALL.into_iter().find(|state| state.as_str() == text)
    }

    pub const fn has_signal(self) -> bool {
        !matches!(self, GestureState::NoSignal)
    }
}

#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash)]
#[repr(u8)]
pub enum CreditKind {
    Hold = 0,
    Touch = 1,
    Sweep = 2,
    Pattern = 3,
    Cue = 4,
}

impl CreditKind {
    pub const COUNT: usize = 5;

    pub const fn index(self) -> usize {
        self as usize
    }

    pub const fn as_str(self) -> &'static str {
        match self {
            CreditKind::Hold => "hold",
            CreditKind::Touch => "touch",
            CreditKind::Sweep => "sweep",
            CreditKind::Pattern => "pattern",
            CreditKind::Cue => "cue",
        }
    }
}

#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CueKind {
    /// Credited when the target state shows up inside the window.
    Go,
    /// Credited when the target state is absent inside the window.
    Stop,
}

#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub enum Phase {
    #[default]
    Calibration,
    Countdown,
    Active,
    Complete,
}

impl Phase {
    pub const fn as_str(self) -> &'static str {
        match self {
            Phase::Calibration => "calibration",
            Phase::Countdown => "countdown",
            Phase::Active => "active",
            Phase::Complete => "complete",
        }
    }
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum StepResult {
    Waiting,
    Advanced,
    PatternComplete,
    Reset,
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ChoiceOutcome {
    Accepted,
    Rejected,
    NotAwaiting,
}

#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
#[repr(u8)]
pub enum RejectReason {
    #[default]
    None = 0,
    NoSignal = 1,
    Unstable = 2,
    CooldownActive = 3,
    StepMismatch = 4,
    StepTimeout = 5,
    CueExpired = 6,
    CueMismatch = 7,
}

impl RejectReason {
    pub const fn as_u8(self) -> u8 {
        self as u8
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum EngineEvent {
    RoundPhaseChanged(Phase),
    CalibrationPrompt,
    CountdownTick { remaining: u8 },
    SignalLost,
    SignalRestored,
    StableStateChanged(GestureState),
    HoldProgress { state: GestureState, progress: f64 },
    EventCredited { kind: CreditKind, count: u32 },
    PatternAdvanced { cursor: usize },
    PatternComplete,
    PatternReset,
    CueIssued {
        target: GestureState,
        kind: CueKind,
        window_ms: u64,
    },
}

const EVENT_BUFFER_CAPACITY: usize = 16;

#[derive(Clone, Debug, Default, PartialEq)]
pub struct EventBuffer {
    events: BoundedVec<EngineEvent, EVENT_BUFFER_CAPACITY>,
}

impl EventBuffer {
    pub const MAX: usize = EVENT_BUFFER_CAPACITY;

    pub const fn new() -> Self {
        Self {
            events: BoundedVec::new(),
        }
    }

    pub fn push(&mut self, event: EngineEvent) {
        if self.events.push(event).is_err() {
            log::warn!("event buffer full; dropped {:?}", event);
        }
    }

    pub fn clear(&mut self) {
        self.events.clear();
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &EngineEvent> {
        self.events.iter()
    }

    pub fn contains(&self, event: &EngineEvent) -> bool {
        self.events.iter().any(|e| e == event)
    }

    pub fn credited(&self, kind: CreditKind) -> usize {
        self.iter()
            .filter(|e| matches!(e, EngineEvent::EventCredited { kind: k, .. } if *k == kind))
            .count()
    }
}
