//! Game profiles: per-game tuning loaded from TOML and checked before a
//! round may start.

mod catalog;
mod config;
mod validate;

pub use catalog::{builtin_catalog, ProfileCatalog};
pub use config::{
    ClassifierConfig, CueConfig, CueTarget, GameProfile, HoldConfig, MatchMode, PatternConfig,
    PatternTemplate, ScoringConfig, StepTemplate, SweepConfig, TouchConfig,
};
pub use validate::validate_profile;

#[cfg(test)]
mod tests;
