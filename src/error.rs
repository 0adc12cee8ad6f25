//! Error type shared by the stores, the controller and the front ends

use std::io;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    /// A referenced item or log id does not exist
    #[error("Not found: {0}")]
    NotFound(String),

    /// User input failed validation (missing title, out-of-range field, ...)
    #[error("{0}")]
    Validation(String),

    /// A store operation the backend does not provide
    #[error("Method {0}() must be implemented")]
    NotImplemented(&'static str),

    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Query error: {0}")]
    Query(#[from] diesel::result::Error),

    #[error("Connection error: {0}")]
    Connection(String),

    #[error("Invalid timestamp: {0}")]
    Timestamp(String),
}

impl Error {
    pub fn not_found(what: &str, id: &str) -> Self {
        Error::NotFound(format!("{} {}", what, id))
    }

    /// Errors the user can fix by changing their input
    pub fn is_user_error(&self) -> bool {
        matches!(self, Error::NotFound(_) | Error::Validation(_))
    }
}

impl From<diesel::r2d2::Error> for Error {
    fn from(e: diesel::r2d2::Error) -> Self {
        Error::Connection(e.to_string())
    }
}

pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_not_implemented_message() {
        let err = Error::NotImplemented("list_items");
        assert_eq!(err.to_string(), "Method list_items() must be implemented");
        assert!(!err.is_user_error());
    }

    #[test]
    fn test_not_found_is_user_error() {
        let err = Error::not_found("item", "abc");
        assert_eq!(err.to_string(), "Not found: item abc");
        assert!(err.is_user_error());
    }
}
