/// An answer from the service.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Answer {
    /// The answer text.
    pub answer: String,
    /// Whether the question could be answered from the given context.
    ///
    /// When this is `false`, the content of `answer` must not be shown
    /// to the user.
    pub in_scope: bool,
}

/// Candidate questions for a page, in the order the service ranked them.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash)]
pub struct Suggestions {
    /// The suggested questions. May be empty.
    pub suggestions: Vec<String>,
}
