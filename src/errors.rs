//!
//! Common Errors.
//!
use std::fmt;

pub type Result<T> = std::result::Result<T, StoreError>;

#[derive(Debug)]
pub enum StoreError {
    /// Missing or malformed configuration. Carries the offending key or URL.
    ConfigError(String),
    UrlParseError(String),
    IoError(std::io::Error),
    SqliteError(String),
    R2D2Error(String),
    UnsupportedOperation(String),
    DataError(String),
}

impl fmt::Display for StoreError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match *self {
            StoreError::ConfigError(ref err) => write!(f, "Configuration Error: {}", err),
            StoreError::UrlParseError(ref err) => write!(f, "Url Parse Error: {}", err),
            StoreError::IoError(ref err) => write!(f, "IO Error: {}", err),
            StoreError::SqliteError(ref err) => write!(f, "Sqlite Error: {}", err),
            StoreError::R2D2Error(ref err) => write!(f, "Pool Error: {}", err),
            StoreError::UnsupportedOperation(ref err) => write!(f, "Unsupported Operation: {}", err),
            StoreError::DataError(ref err) => write!(f, "Data Error: {}", err),
        }
    }
}

impl std::error::Error for StoreError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match *self {
            StoreError::IoError(ref err) => Some(err),
            _ => None,
        }
    }
}

impl From<rusqlite::Error> for StoreError {
    fn from(err: rusqlite::Error) -> Self {
        StoreError::SqliteError(err.to_string())
    }
}

impl From<r2d2::Error> for StoreError {
    fn from(err: r2d2::Error) -> Self {
        StoreError::R2D2Error(err.to_string())
    }
}

impl From<std::io::Error> for StoreError {
    fn from(err: std::io::Error) -> Self {
        StoreError::IoError(err)
    }
}
