use thiserror::Error;

/// All errors produced by earshot-core.
#[derive(Debug, Error)]
pub enum EarshotError {
    #[error("invalid engine config: {0}")]
    InvalidConfig(String),

    #[error("resample error: {0}")]
    Resample(String),

    #[error("scorer error: {0}")]
    Score(String),

    #[error("frame source error: {0}")]
    Source(String),

    #[error("engine is already running")]
    AlreadyRunning,

    #[error("engine is not running")]
    NotRunning,

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

pub type Result<T> = std::result::Result<T, EarshotError>;
