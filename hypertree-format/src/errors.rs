use hypertree::errors::{ErrorKind, HyperTreeError};
use std::io;
use thiserror::Error;

/// Errors raised while reading or writing hypertree grid files.
#[derive(Error, Debug)]
pub enum FormatError {
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Missing element {0}")]
    MissingElement(String),

    #[error("Missing array {0}")]
    MissingArray(String),

    #[error("Element {element} has no attribute {attribute}")]
    MissingAttribute { element: String, attribute: String },

    #[error("Attribute {attribute} has invalid value '{value}'")]
    InvalidAttribute { attribute: String, value: String },

    #[error("Array {name} has {actual} entries, expected {expected}")]
    SizeMismatch {
        name: String,
        expected: usize,
        actual: usize,
    },

    #[error("Unsupported format version {0}")]
    UnsupportedVersion(String),

    #[error("Corrupt file: {0}")]
    CorruptFile(String),

    #[error("Too late: {0}")]
    TooLate(String),

    #[error("Grid error: {0}")]
    Grid(#[from] HyperTreeError),
}

impl From<FormatError> for HyperTreeError {
    fn from(err: FormatError) -> Self {
        match err {
            FormatError::Io(io_err) => HyperTreeError::new(
                &format!("Format I/O error: {}", io_err),
                ErrorKind::IOError,
            ),
            FormatError::Serialization(msg) => HyperTreeError::new(&msg, ErrorKind::EncodingError),
            FormatError::TooLate(msg) => HyperTreeError::new(&msg, ErrorKind::InvalidOperation),
            FormatError::UnsupportedVersion(version) => HyperTreeError::new(
                &format!("Unsupported format version {}", version),
                ErrorKind::Extension("format".to_string()),
            ),
            FormatError::Grid(grid_err) => grid_err,
            other => HyperTreeError::new(&other.to_string(), ErrorKind::ValidationError),
        }
    }
}

impl From<bincode::error::EncodeError> for FormatError {
    fn from(err: bincode::error::EncodeError) -> Self {
        FormatError::Serialization(err.to_string())
    }
}

impl From<bincode::error::DecodeError> for FormatError {
    fn from(err: bincode::error::DecodeError) -> Self {
        FormatError::Serialization(err.to_string())
    }
}

impl From<serde_json::Error> for FormatError {
    fn from(err: serde_json::Error) -> Self {
        FormatError::Serialization(err.to_string())
    }
}

/// Result type for format operations
pub type FormatResult<T> = Result<T, FormatError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_io_error_round_trip() {
        let err: FormatError = io::Error::other("disk gone").into();
        let core: HyperTreeError = err.into();
        assert_eq!(core.kind(), &ErrorKind::IOError);
        assert!(core.message().contains("disk gone"));
    }

    #[test]
    fn test_grid_error_is_preserved() {
        let original = HyperTreeError::new("bad descriptor", ErrorKind::CorruptDescriptor);
        let err: FormatError = original.into();
        assert!(matches!(err, FormatError::Grid(_)));
        let core: HyperTreeError = err.into();
        assert_eq!(core.kind(), &ErrorKind::CorruptDescriptor);
    }

    #[test]
    fn test_too_late_maps_to_invalid_operation() {
        let core: HyperTreeError = FormatError::TooLate("selection".into()).into();
        assert_eq!(core.kind(), &ErrorKind::InvalidOperation);
    }

    #[test]
    fn test_size_mismatch_message() {
        let err = FormatError::SizeMismatch {
            name: "Mask".into(),
            expected: 5,
            actual: 3,
        };
        assert_eq!(err.to_string(), "Array Mask has 3 entries, expected 5");
    }
}
