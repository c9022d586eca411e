use std::fmt::{self, Display};

/// The kind of error that occurred.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// The service answered with a non-success status.
    Remote,
    /// The request could not be delivered, or the response could not be
    /// read.
    Transport,
    /// The service answered successfully, but the payload is not what
    /// was expected.
    InvalidResponse,
    /// Any other errors.
    Other,
}

impl Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ErrorKind::Remote => write!(f, "Remote error"),
            ErrorKind::Transport => write!(f, "Transport error"),
            ErrorKind::InvalidResponse => write!(f, "Invalid response"),
            ErrorKind::Other => write!(f, "Other error"),
        }
    }
}
