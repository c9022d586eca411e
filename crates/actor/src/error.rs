use std::error::Error;
use std::fmt;

/// A type of error which can be returned whenever messages are sent to
/// an actor that is no longer running, or when the actor stopped before
/// it could reply to a request.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct ActorDeadError;

impl fmt::Display for ActorDeadError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        "the actor is no longer running".fmt(f)
    }
}

impl Error for ActorDeadError {}
