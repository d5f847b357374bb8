use std::fmt::{Display, Formatter};
use std::sync::PoisonError;

use config::ConfigError;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Clone, PartialEq)]
pub enum Error {
    /// The store could not be opened: bad path, permission denied,
    /// lock held by another handle, or an unreadable database file.
    Open(String),
    /// A read transaction failed.
    Read(String),
    /// A write transaction or its commit failed, the mutation was not applied.
    Write(String),
    /// Resources could not be fully released. The handle is terminated anyway.
    Close(String),
    /// The handle was already closed.
    Closed,
    Config(String),
    Internal(String),
}

impl Display for Error {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Error::Open(s) => write!(f, "open storage: {}", s),
            Error::Read(s) => write!(f, "read: {}", s),
            Error::Write(s) => write!(f, "write: {}", s),
            Error::Close(s) => write!(f, "close storage: {}", s),
            Error::Closed => write!(f, "storage is closed"),
            Error::Config(s) | Error::Internal(s) => {
                write!(f, "{}", s)
            }
        }
    }
}

impl std::error::Error for Error {}

impl From<ConfigError> for Error {
    fn from(err: ConfigError) -> Self {
        Error::Config(err.to_string())
    }
}

impl<T> From<PoisonError<T>> for Error {
    fn from(err: PoisonError<T>) -> Self {
        Error::Internal(err.to_string())
    }
}
