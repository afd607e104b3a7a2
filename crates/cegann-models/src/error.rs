use crate::ModelKind;
use std::path::PathBuf;
use thiserror::Error;

fn preview(names: &[String]) -> String {
    const SHOWN: usize = 5;
    let mut out = names
        .iter()
        .take(SHOWN)
        .map(String::as_str)
        .collect::<Vec<_>>()
        .join(", ");
    if names.len() > SHOWN {
        out.push_str(&format!(", ... ({} more)", names.len() - SHOWN));
    }
    out
}

#[derive(Debug, Error)]
pub enum ModelError {
    #[error("unknown model `{0}`, expected one of GANN, GIN, SAGE, RGCN")]
    UnknownArchitecture(String),

    #[error("failed to read checkpoint {path}: {source}")]
    CheckpointRead {
        path: PathBuf,
        #[source]
        source: candle_core::Error,
    },

    #[error(
        "checkpoint {path} does not match the {model} architecture: {} missing [{}], {} unexpected [{}]",
        .missing.len(),
        preview(.missing),
        .unexpected.len(),
        preview(.unexpected)
    )]
    CheckpointMismatch {
        path: PathBuf,
        model: ModelKind,
        missing: Vec<String>,
        unexpected: Vec<String>,
    },

    #[error("failed to load {model} weights from {path}: {source}")]
    CheckpointLoad {
        path: PathBuf,
        model: ModelKind,
        #[source]
        source: candle_core::Error,
    },

    #[error("candle error: {0}")]
    Candle(#[from] candle_core::Error),
}
