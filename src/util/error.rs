use std::path::PathBuf;

use crate::request::Direction;

/// Errors raised by the elevator bank. All of them are local to the call that
/// caused them; nothing is retried internally.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum Error {
    /// A construction parameter is out of its valid range.
    #[error("{name} = {value} is out of range: {reason}")]
    OutOfRange {
        name: &'static str,
        value: String,
        reason: &'static str,
    },

    /// The operation is not allowed in the current state.
    #[error("invalid operation: {0}")]
    InvalidOperation(String),

    #[error("floor {floor} is not a valid floor (1..={floor_count})")]
    FloorOutOfRange { floor: u8, floor_count: u8 },

    #[error("{0:?} is not a valid direction, expected Up or Down")]
    InvalidDirection(Direction),

    /// The actor behind a handle has shut down.
    #[error("{0} is no longer running")]
    Disconnected(String),

    #[error("config error in {path}: {detail}")]
    Config { path: PathBuf, detail: String },
}

pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    pub(crate) fn out_of_range<V: std::fmt::Display>(
        name: &'static str,
        value: V,
        reason: &'static str,
    ) -> Error {
        Error::OutOfRange {
            name,
            value: value.to_string(),
            reason,
        }
    }

    pub(crate) fn invalid_operation<S: Into<String>>(what: S) -> Error {
        Error::InvalidOperation(what.into())
    }
}
