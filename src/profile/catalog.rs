use std::{fs, path::Path};

use serde::Deserialize;

use super::{config::GameProfile, validate::validate_profile};
use crate::error::{ProfileError, Result};

const BUILTIN_PROFILES: &str = include_str!("../../config/profiles.toml");

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct CatalogFile {
    #[serde(rename = "profile", default)]
    profiles: Vec<GameProfile>,
}

/// Validated set of game profiles keyed by `game_type`.
#[derive(Clone, Debug, Default)]
pub struct ProfileCatalog {
    profiles: Vec<GameProfile>,
}

impl ProfileCatalog {
    pub fn from_profiles(profiles: Vec<GameProfile>) -> Result<Self> {
        for (index, profile) in profiles.iter().enumerate() {
            validate_profile(profile)?;
            if profiles[..index]
                .iter()
                .any(|earlier| earlier.game_type == profile.game_type)
            {
                return Err(ProfileError::DuplicateGame(profile.game_type.clone()));
            }
        }
        Ok(Self { profiles })
    }

    pub fn from_toml_str(text: &str) -> Result<Self> {
        let file: CatalogFile =
            toml::from_str(text).map_err(|err| ProfileError::Parse(err.to_string()))?;
        Self::from_profiles(file.profiles)
    }

    pub fn from_path(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path).map_err(|source| ProfileError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let catalog = Self::from_toml_str(&text)?;
        log::info!(
            "loaded {} profiles from {}",
            catalog.len(),
            path.display()
        );
        Ok(catalog)
    }

    pub fn get(&self, game_type: &str) -> Option<&GameProfile> {
        self.profiles.iter().find(|p| p.game_type == game_type)
    }

    pub fn require(&self, game_type: &str) -> Result<&GameProfile> {
        self.get(game_type)
            .ok_or_else(|| ProfileError::UnknownGame(game_type.to_owned()))
    }

    pub fn iter(&self) -> impl Iterator<Item = &GameProfile> {
        self.profiles.iter()
    }

    pub fn game_types(&self) -> impl Iterator<Item = &str> {
        self.profiles.iter().map(|p| p.game_type.as_str())
    }

    pub fn len(&self) -> usize {
        self.profiles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.profiles.is_empty()
    }
}

/// The catalogue shipped in `config/profiles.toml`.
pub fn builtin_catalog() -> Result<ProfileCatalog> {
    ProfileCatalog::from_toml_str(BUILTIN_PROFILES)
}
