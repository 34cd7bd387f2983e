//! Tick-driven gesture recognition for oral-motor therapy games.
//!
//! A face tracker produces one [`RawSample`] per frame. A
//! [`RoundController`] built from a [`GameProfile`] turns those samples into
//! stable gestures, credited events and, at the end of the round, a
//! [`RoundResult`].

pub mod engine;
pub mod error;
pub mod profile;

pub use engine::{
    ChoiceOutcome, CreditKind, EngineEvent, GestureState, Phase, RawSample, ResultSink,
    RoundController, RoundResult, RoundTrace, TickOutput,
};
pub use error::ProfileError;
pub use profile::{builtin_catalog, validate_profile, GameProfile, ProfileCatalog};
