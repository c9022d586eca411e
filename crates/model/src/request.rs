/// Asks the service to answer a question about some page context.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct AnswerRequest {
    /// The page content, or the page identity when no content is
    /// available.
    pub context: String,
    /// The question, exactly as the user typed it.
    pub question: String,
}

/// Asks the service for questions worth asking about some page context.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct SuggestionsRequest {
    /// The page content, or the page identity when no content is
    /// available.
    pub context: String,
}
