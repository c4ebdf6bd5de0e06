use core::fmt;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Error {
    /// Toggle requested on a device without a boolean value
    NotToggleable(u8),
    SerializationError,
    StorageError,
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::NotToggleable(offset) => write!(f, "Device {} cannot be toggled", offset),
            Error::SerializationError => write!(f, "Serialization error"),
            Error::StorageError => write!(f, "Storage error"),
        }
    }
}

impl From<postcard::Error> for Error {
    fn from(_: postcard::Error) -> Self {
        Error::SerializationError
    }
}

pub type Result<T> = core::result::Result<T, Error>;
