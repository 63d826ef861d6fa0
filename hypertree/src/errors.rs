use backtrace::Backtrace;
use std::error::Error;
use std::fmt::{Debug, Display, Formatter};
use std::result::Result;

/// Error kinds for hypertree operations
///
/// Each kind names one category of failure so callers can match on it
/// instead of parsing messages.
///
/// # Examples
///
/// ```rust
/// use hypertree::errors::{ErrorKind, HyperTreeError, HyperTreeResult};
///
/// fn example() -> HyperTreeResult<()> {
///     Err(HyperTreeError::new("Tree not found", ErrorKind::NotFound))
/// }
/// assert!(example().is_err());
/// ```
#[derive(Debug, PartialEq, Eq, Clone)]
pub enum ErrorKind {
    /// The operation is not valid in the current state (e.g. reshaping a populated grid)
    InvalidOperation,
    /// An argument is outside of its accepted domain
    InvalidArgument,
    /// An index does not address an existing root, vertex or tuple
    IndexOutOfBounds,
    /// A breadth-first descriptor is inconsistent with its level counts
    CorruptDescriptor,
    /// Generic validation error (coordinate arrays, array sizes, ...)
    ValidationError,
    /// The requested tree or array does not exist
    NotFound,
    /// Error encoding or decoding data
    EncodingError,
    /// Generic IO error
    IOError,
    /// Error raised by an extension crate (e.g. "format")
    Extension(String),
    /// Internal error (usually indicates a bug)
    InternalError,
}

impl Display for ErrorKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            ErrorKind::InvalidOperation => write!(f, "Invalid operation"),
            ErrorKind::InvalidArgument => write!(f, "Invalid argument"),
            ErrorKind::IndexOutOfBounds => write!(f, "Index out of bounds"),
            ErrorKind::CorruptDescriptor => write!(f, "Corrupt descriptor"),
            ErrorKind::ValidationError => write!(f, "Validation error"),
            ErrorKind::NotFound => write!(f, "Not found"),
            ErrorKind::EncodingError => write!(f, "Encoding error"),
            ErrorKind::IOError => write!(f, "IO error"),
            ErrorKind::Extension(name) => write!(f, "{} error", name),
            ErrorKind::InternalError => write!(f, "Internal error"),
        }
    }
}

/// Custom hypertree error type.
///
/// `HyperTreeError` carries a message, an [`ErrorKind`], an optional cause and
/// the backtrace captured where the error was raised.
///
/// # Examples
///
/// ```rust
/// use hypertree::errors::{ErrorKind, HyperTreeError};
///
/// let cause = HyperTreeError::new("bit count mismatch", ErrorKind::CorruptDescriptor);
/// let err = HyperTreeError::new_with_cause("Tree 4 unreadable", ErrorKind::ValidationError, cause);
/// assert!(err.cause().is_some());
/// ```
#[derive(Clone)]
pub struct HyperTreeError {
    message: String,
    error_kind: ErrorKind,
    cause: Option<Box<HyperTreeError>>,
    backtrace: Backtrace,
}

impl HyperTreeError {
    /// Creates a new `HyperTreeError` with the specified message and error kind.
    pub fn new(message: &str, error_kind: ErrorKind) -> Self {
        HyperTreeError {
            message: message.to_string(),
            error_kind,
            cause: None,
            backtrace: Backtrace::new_unresolved(),
        }
    }

    /// Creates a new `HyperTreeError` chained to the error that caused it.
    pub fn new_with_cause(message: &str, error_kind: ErrorKind, cause: HyperTreeError) -> Self {
        HyperTreeError {
            message: message.to_string(),
            error_kind,
            cause: Some(Box::new(cause)),
            backtrace: Backtrace::new_unresolved(),
        }
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn kind(&self) -> &ErrorKind {
        &self.error_kind
    }

    pub fn cause(&self) -> Option<&HyperTreeError> {
        self.cause.as_deref()
    }
}

impl Display for HyperTreeError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl Debug for HyperTreeError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match &self.cause {
            Some(cause) => write!(f, "{} ({})\nCaused by: {:?}", self.message, self.error_kind, cause),
            None => {
                let mut backtrace = self.backtrace.clone();
                backtrace.resolve();
                write!(f, "{} ({})\n{:?}", self.message, self.error_kind, backtrace)
            }
        }
    }
}

impl Error for HyperTreeError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match &self.cause {
            Some(cause) => Some(cause.as_ref()),
            None => None,
        }
    }
}

/// A result type alias for hypertree operations.
pub type HyperTreeResult<T> = Result<T, HyperTreeError>;

impl From<std::io::Error> for HyperTreeError {
    fn from(err: std::io::Error) -> Self {
        HyperTreeError::new(&format!("IO error: {}", err), ErrorKind::IOError)
    }
}

impl From<String> for HyperTreeError {
    fn from(msg: String) -> Self {
        HyperTreeError::new(&msg, ErrorKind::InternalError)
    }
}

impl From<&str> for HyperTreeError {
    fn from(msg: &str) -> Self {
        HyperTreeError::new(msg, ErrorKind::InternalError)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_new_creates_error() {
        let error = HyperTreeError::new("An error occurred", ErrorKind::CorruptDescriptor);
        assert_eq!(error.message(), "An error occurred");
        assert_eq!(error.kind(), &ErrorKind::CorruptDescriptor);
        assert!(error.cause().is_none());
        assert!(error.source().is_none());
    }

    #[test]
    fn error_with_cause_chains_source() {
        let cause = HyperTreeError::new("root cause", ErrorKind::IOError);
        let error = HyperTreeError::new_with_cause("outer", ErrorKind::ValidationError, cause);
        assert_eq!(error.cause().map(|c| c.message()), Some("root cause"));
        assert!(error.source().is_some());
        assert!(format!("{:?}", error).contains("Caused by: root cause"));
    }

    #[test]
    fn error_display_is_message() {
        let error = HyperTreeError::new("Tree 3 not found", ErrorKind::NotFound);
        assert_eq!(format!("{}", error), "Tree 3 not found");
    }

    #[test]
    fn io_error_converts_to_io_kind() {
        let io = std::io::Error::other("disk gone");
        let error: HyperTreeError = io.into();
        assert_eq!(error.kind(), &ErrorKind::IOError);
        assert!(error.message().contains("disk gone"));
    }

    #[test]
    fn str_converts_to_internal_error() {
        let error: HyperTreeError = "boom".into();
        assert_eq!(error.kind(), &ErrorKind::InternalError);
        let error: HyperTreeError = String::from("boom").into();
        assert_eq!(error.kind(), &ErrorKind::InternalError);
    }

    #[test]
    fn extension_kind_displays_name() {
        assert_eq!(ErrorKind::Extension("format".into()).to_string(), "format error");
    }
}
