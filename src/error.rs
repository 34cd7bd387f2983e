use std::{io, path::PathBuf};

use thiserror::Error;

#[derive(Error, Debug)]
pub enum ProfileError {
    #[error("profile parse error: {0}")]
    Parse(String),

    #[error("failed to read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("invalid profile: {0}")]
    Validation(String),

    #[error("unknown game type `{0}`")]
    UnknownGame(String),

    #[error("game type `{0}` declared more than once")]
    DuplicateGame(String),
}

pub type Result<T> = std::result::Result<T, ProfileError>;
