use std::error::Error as StdError;
use std::fmt::{self, Display};

/// The kind of repair failure.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// The input was empty or only whitespace.
    Empty,
    /// The input decoded, but to something other than an object.
    NotAnObject,
    /// No rung of the ladder could decode the input.
    Malformed,
}

impl Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ErrorKind::Empty => write!(f, "empty payload"),
            ErrorKind::NotAnObject => write!(f, "payload is not an object"),
            ErrorKind::Malformed => write!(f, "malformed payload"),
        }
    }
}

/// Describes why a payload could not be repaired into an object.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Error {
    kind: ErrorKind,
    reason: Option<String>,
}

impl Error {
    #[inline]
    pub(crate) fn empty() -> Self {
        Self {
            kind: ErrorKind::Empty,
            reason: None,
        }
    }

    #[inline]
    pub(crate) fn not_an_object(found: &'static str) -> Self {
        Self {
            kind: ErrorKind::NotAnObject,
            reason: Some(format!("expected an object, found {found}")),
        }
    }

    #[inline]
    pub(crate) fn malformed<S: Into<String>>(reason: S) -> Self {
        Self {
            kind: ErrorKind::Malformed,
            reason: Some(reason.into()),
        }
    }

    /// Returns the kind of this error.
    #[inline]
    pub fn kind(&self) -> ErrorKind {
        self.kind
    }
}

impl Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.reason {
            Some(reason) => write!(f, "{}: {reason}", self.kind),
            None => write!(f, "{}", self.kind),
        }
    }
}

impl StdError for Error {}
