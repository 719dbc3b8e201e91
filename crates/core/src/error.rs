use std::error::Error as StdError;
use std::fmt::{self, Display};
use std::io;

use toolwright_model::ModelProviderError;

/// The kind of error that aborted a run.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// The backend request failed.
    Model,
    /// A local file could not be read or written.
    Io,
}

impl Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ErrorKind::Model => write!(f, "model error"),
            ErrorKind::Io => write!(f, "I/O error"),
        }
    }
}

/// An error that aborted a run.
///
/// Tool failures never surface here, they are fed back to the model as
/// observations instead.
#[derive(Debug)]
pub struct Error {
    repr: Repr,
}

#[derive(Debug)]
enum Repr {
    Model(Box<dyn ModelProviderError>),
    Io(io::Error),
}

impl Error {
    pub(crate) fn model(err: Box<dyn ModelProviderError>) -> Self {
        Self {
            repr: Repr::Model(err),
        }
    }

    /// Returns the kind of this error.
    #[inline]
    pub fn kind(&self) -> ErrorKind {
        match self.repr {
            Repr::Model(_) => ErrorKind::Model,
            Repr::Io(_) => ErrorKind::Io,
        }
    }

    /// Returns the provider error kind, if the backend request failed.
    #[inline]
    pub fn model_error_kind(&self) -> Option<toolwright_model::ErrorKind> {
        match &self.repr {
            Repr::Model(err) => Some(err.kind()),
            Repr::Io(_) => None,
        }
    }
}

impl Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.repr {
            Repr::Model(err) => {
                write!(f, "{} ({}): {err}", self.kind(), err.kind())
            }
            Repr::Io(err) => write!(f, "{}: {err}", self.kind()),
        }
    }
}

impl StdError for Error {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        match &self.repr {
            Repr::Model(err) => Some(err.as_ref()),
            Repr::Io(err) => Some(err),
        }
    }
}

impl From<io::Error> for Error {
    fn from(err: io::Error) -> Self {
        Self { repr: Repr::Io(err) }
    }
}
