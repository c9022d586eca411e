use std::error::Error;

use crate::error::ErrorKind;
use crate::request::{AnswerRequest, SuggestionsRequest};
use crate::response::{Answer, Suggestions};

/// The error type for a question-answering service.
pub trait ServiceError: Error + Send + Sync + 'static {
    /// Returns the kind of this error.
    fn kind(&self) -> ErrorKind;
}

/// A remote service that answers questions about page content.
///
/// Once the service is created, it should behave like a stateless object.
/// Every call is a single attempt: implementations must not retry, and
/// the returned futures must be independent of `self`.
pub trait QaService: Send + Sync {
    /// The error type that may be returned by the service.
    type Error: ServiceError;

    /// Asks a question about the given context.
    fn get_answer(
        &self,
        req: &AnswerRequest,
    ) -> impl Future<Output = Result<Answer, Self::Error>> + Send + 'static;

    /// Fetches suggested questions for the given context.
    fn get_suggested_questions(
        &self,
        req: &SuggestionsRequest,
    ) -> impl Future<Output = Result<Suggestions, Self::Error>> + Send + 'static;
}
