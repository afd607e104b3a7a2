use std::path::PathBuf;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, CoreError>;

#[derive(Debug, Error)]
pub enum CoreError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid structure pattern: {0}")]
    Pattern(#[from] glob::PatternError),

    #[error("{path}:{line}: {message}")]
    Poscar {
        path: PathBuf,
        line: usize,
        message: String,
    },

    #[error("invalid configuration: {0}")]
    Config(String),

    #[error("failed to parse configuration {path}: {source}")]
    ConfigParse {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },

    #[error("graph construction failed: {0}")]
    Graph(String),

    #[error("species {species} is not listed in the heterogeneous species order {known:?}")]
    UnknownSpecies { species: String, known: Vec<String> },

    #[error("candle error: {0}")]
    Candle(#[from] candle_core::Error),
}

impl CoreError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}
