//! Error type shared by every operation in the crate

use thiserror::Error;

/// Failure raised while evaluating or sampling a system.
#[derive(Debug, Error)]
pub enum SystemError {
    #[error("{context} shape mismatch: expected length {expected}, got {got}")]
    ShapeMismatch {
        context: &'static str,
        expected: usize,
        got: usize,
    },
    #[error("cannot reshape {got} sampled values into {rows}x{cols}")]
    Reshape { rows: usize, cols: usize, got: usize },
    #[error("map evaluation failed: {0}")]
    Map(String),
    #[error("sampling failed: {0}")]
    Sampling(String),
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
    #[error("toml error: {0}")]
    Toml(#[from] toml::de::Error),
}

pub type Result<T> = std::result::Result<T, SystemError>;
