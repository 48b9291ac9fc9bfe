//! Error type shared by every fallible operation in the crate.

use thiserror::Error;

/// Result alias using [`QsysError`].
pub type QsysResult<T> = Result<T, QsysError>;

#[derive(Debug, Error)]
pub enum QsysError {
    /// A term refers to a level outside `0..dim`.
    #[error("{kind} refers to level {level}, but the system has only {dim} levels")]
    LevelOutOfRange { kind: &'static str, level: usize, dim: usize },

    /// Decay rates must be finite and non-negative.
    #[error("invalid decay rate {0}: must be finite and non-negative")]
    InvalidRate(f64),

    /// A coupling strength or level energy is NaN or infinite.
    #[error("{kind} has non-finite parameter {value}")]
    NonFiniteParameter { kind: &'static str, value: String },

    /// A buffer or matrix does not have the size implied by the dimension.
    #[error("dimension mismatch: expected {expected} elements, got {got}")]
    DimensionMismatch { expected: usize, got: usize },

    /// A state description cannot be turned into a density matrix.
    #[error("invalid state: {0}")]
    InvalidState(String),

    /// An N×N matrix for this N cannot be addressed in memory.
    #[error("system dimension {0} is too large")]
    DimensionTooLarge(usize),

    #[error("system dimension must be at least 1")]
    ZeroDimension,

    /// The integration step must be finite and strictly positive.
    #[error("invalid step size {0}: must be finite and positive")]
    InvalidStepSize(f64),

    /// An integration target time is NaN or infinite.
    #[error("invalid target time {0}: must be finite")]
    InvalidTime(f64),

    /// A step produced NaN or infinite entries in the density matrix.
    #[error("numerical instability: non-finite density matrix after step from t = {time}")]
    NumericalInstability { time: f64 },

    #[error("config error: {0}")]
    Config(String),
}

impl From<toml::de::Error> for QsysError {
    fn from(err: toml::de::Error) -> Self { Self::Config(err.to_string()) }
}
