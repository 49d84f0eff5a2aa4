// We want a few things here:
// 1. A way to create a new error with a backtrace
// 2. A way to centralize setting a breakpoint to trap any error in the system fairly soon
//    after it's created (or at least when it's propagated from a library we use back to us)
// 3. Same but for logging / emitting error messages into the tracing/logging system
// 4. A coarse kind, so callers can tell a missing key from a corrupt cache without
//    string-matching messages

use std::any::Any;
use std::borrow::Cow;
use std::fmt;
use backtrace_error::DynBacktraceError;
use tracing::error;

#[cfg(test)]
use test_log::test;

#[derive(Clone, Copy, PartialEq, Eq, Debug, Hash, PartialOrd, Ord)]
pub enum ErrorKind {
    /// Records of unequal length where a padded file was expected.
    NotPadded,
    /// A skip-count that is negative or larger than the record count.
    Offset,
    /// A requested column is absent from a header.
    ColumnNotFound,
    /// A position outside the addressable records.
    IndexOutOfRange,
    /// An exact-key lookup missed.
    NotFound,
    /// Text that does not decode as its declared column type, or a malformed header.
    Parse,
    /// A build directory was already claimed by another build.
    AlreadyExists,
    /// The caller broke an argument contract.
    Contract,
    /// A claimed pyramid directory whose build never finished.
    Incomplete,
    /// The other side of a worker channel has gone away.
    Disconnected,
    Io,
    Other,
}

impl ErrorKind {
    // A missing file is `Io`, not `NotFound`: that kind means a key lookup missed.
    fn of_foreign<E: std::error::Error + 'static>(err: &E) -> Self {
        let any: &dyn Any = err;
        match any.downcast_ref::<std::io::Error>() {
            Some(io) if io.kind() == std::io::ErrorKind::AlreadyExists => ErrorKind::AlreadyExists,
            Some(_) => ErrorKind::Io,
            None => ErrorKind::Other,
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ErrorKind::NotPadded => "not padded",
            ErrorKind::Offset => "bad offset",
            ErrorKind::ColumnNotFound => "column not found",
            ErrorKind::IndexOutOfRange => "index out of range",
            ErrorKind::NotFound => "not found",
            ErrorKind::Parse => "parse error",
            ErrorKind::AlreadyExists => "already exists",
            ErrorKind::Contract => "contract violation",
            ErrorKind::Incomplete => "incomplete",
            ErrorKind::Disconnected => "disconnected",
            ErrorKind::Io => "i/o error",
            ErrorKind::Other => "error",
        };
        f.write_str(name)
    }
}

#[derive(Debug)]
pub struct Error {
    kind: ErrorKind,
    message: String,
    inner: DynBacktraceError,
}
pub type Result<T> = std::result::Result<T, Error>;

struct SimpleErr(Cow<'static, str>);
impl std::fmt::Debug for SimpleErr {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}
impl std::fmt::Display for SimpleErr {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}
impl std::error::Error for SimpleErr {
    fn description(&self) -> &str {
        &self.0
    }
}

impl<E: std::error::Error + Send + Sync + 'static> From<E> for Error {
    fn from(err: E) -> Error {
        let kind = ErrorKind::of_foreign(&err);
        Error::new(kind, err)
    }
}

impl Error {
    pub fn new<E: std::error::Error + Send + Sync + 'static>(kind: ErrorKind, err: E) -> Error {
        error!(target: "strata", "{}: {:?}", kind, err);
        let message = err.to_string();
        let inner = DynBacktraceError::from(err);
        Error {
            kind,
            message,
            inner,
        }
    }

    pub fn kind(&self) -> ErrorKind {
        self.kind
    }

    pub fn is(&self, kind: ErrorKind) -> bool {
        self.kind == kind
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.kind, self.message)
    }
}

pub fn err(kind: ErrorKind, msg: impl Into<Cow<'static, str>>) -> Error {
    let err = SimpleErr(msg.into());
    Error::new(kind, err)
}

#[test]
fn test_error() {
    let e = err(ErrorKind::NotFound, "test error");
    assert!(e.is(ErrorKind::NotFound));
    assert_eq!(e.message(), "test error");
    assert_eq!(e.to_string(), "not found: test error");
}

#[test]
fn test_io_error_kinds() {
    let exists = std::io::Error::new(std::io::ErrorKind::AlreadyExists, "taken");
    assert_eq!(Error::from(exists).kind(), ErrorKind::AlreadyExists);
    let missing = std::io::Error::new(std::io::ErrorKind::NotFound, "gone");
    assert_eq!(Error::from(missing).kind(), ErrorKind::Io);
    let bad_int = "x1".parse::<i64>().unwrap_err();
    assert_eq!(Error::from(bad_int).kind(), ErrorKind::Other);
}
