//! Crate-wide error type.

use thiserror::Error as ThisError;

/// Errors raised while loading a problem, configuring the engine, or
/// misusing a [`Tour`](crate::tour::Tour).
///
/// Running out of time is not an error: the engine reports it through
/// [`StopReason::DeadlineExceeded`](crate::anneal::StopReason::DeadlineExceeded).
#[derive(Debug, ThisError)]
pub enum Error {
    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// Malformed or inconsistent problem text.
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// Bad configuration value or operation argument.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// A tour position outside `[0, len)`.
    #[error("index {index} out of range for tour of {len} vertices")]
    IndexOutOfRange { index: usize, len: usize },
}

pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    pub fn invalid_input(message: impl Into<String>) -> Self {
        Self::InvalidInput(message.into())
    }

    pub fn invalid_argument(message: impl Into<String>) -> Self {
        Self::InvalidArgument(message.into())
    }
}
