//! Error types for MBP-10 reconstruction.
//!
//! Clean error handling using `thiserror` for ergonomic error definitions.
//!
//! Most data problems (unknown order ids, malformed lines) are *soft*: the
//! reconstructor turns them into no-ops and keeps going. The variants here
//! exist so that lower layers can report what happened and let the caller
//! decide. Only I/O failures are fatal to a replay.

use thiserror::Error;

/// Result type alias for reconstruction operations.
pub type Result<T> = std::result::Result<T, Mbp10Error>;

/// Main error type for reconstruction operations.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Mbp10Error {
    /// An Add referenced an order id that is already resting in the book
    #[error("Duplicate order ID: {0}")]
    DuplicateOrder(u64),

    /// Input line could not be turned into a record
    #[error("Malformed record at line {line}: {reason}")]
    MalformedRecord { line: u64, reason: String },

    /// Price field is not a decimal number
    #[error("Invalid price: {0:?}")]
    InvalidPrice(String),

    /// Size field is not an unsigned integer
    #[error("Invalid size: {0:?}")]
    InvalidSize(String),

    /// Order id field is not an unsigned integer
    #[error("Invalid order ID: {0:?}")]
    InvalidOrderId(String),

    /// Registry and level maps disagree
    #[error("Book inconsistency: {0}")]
    InconsistentState(String),

    /// I/O failure while reading input or writing output
    #[error("IO error: {0}")]
    Io(String),

    /// Generic error with context
    #[error("Error: {0}")]
    Generic(String),
}

impl Mbp10Error {
    /// Create a generic error from any string-like type.
    pub fn generic(msg: impl Into<String>) -> Self {
        Mbp10Error::Generic(msg.into())
    }

    /// Wrap a field-level parse error with the line it came from.
    pub fn malformed(line: u64, reason: impl ToString) -> Self {
        Mbp10Error::MalformedRecord {
            line,
            reason: reason.to_string(),
        }
    }
}

impl From<std::io::Error> for Mbp10Error {
    fn from(err: std::io::Error) -> Self {
        Mbp10Error::Io(err.to_string())
    }
}

impl From<String> for Mbp10Error {
    fn from(err: String) -> Self {
        Mbp10Error::Generic(err)
    }
}

impl From<&str> for Mbp10Error {
    fn from(err: &str) -> Self {
        Mbp10Error::Generic(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = Mbp10Error::DuplicateOrder(12345);
        assert_eq!(err.to_string(), "Duplicate order ID: 12345");

        let err = Mbp10Error::malformed(7, Mbp10Error::InvalidSize("abc".into()));
        assert_eq!(
            err.to_string(),
            "Malformed record at line 7: Invalid size: \"abc\""
        );
    }

    #[test]
    fn test_io_conversion() {
        let io = std::io::Error::new(std::io::ErrorKind::NotFound, "missing.csv");
        let err: Mbp10Error = io.into();
        assert!(matches!(err, Mbp10Error::Io(_)));
    }
}
