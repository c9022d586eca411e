use serde::{Deserialize, Serialize};

/// How the fake service responds to the next question.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "type", content = "data")]
pub enum PresetAnswer {
    /// A successful answer.
    #[serde(rename = "answer")]
    Answer {
        /// The answer text.
        answer: String,
        /// Whether the question is answerable from the context.
        in_scope: bool,
    },
    /// A non-success response.
    #[serde(rename = "failure")]
    Failure {
        /// The HTTP status the service would have returned.
        status: u16,
        /// The raw response body.
        body: String,
    },
}

impl PresetAnswer {
    /// Creates a successful answer.
    #[inline]
    pub fn answer<S: Into<String>>(answer: S, in_scope: bool) -> Self {
        Self::Answer {
            answer: answer.into(),
            in_scope,
        }
    }

    /// Creates a failed response.
    #[inline]
    pub fn failure<S: Into<String>>(status: u16, body: S) -> Self {
        Self::Failure {
            status,
            body: body.into(),
        }
    }
}

/// How the fake service responds to the next suggestions request.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "type", content = "data")]
pub enum PresetSuggestions {
    /// A successful list of questions.
    #[serde(rename = "suggestions")]
    Suggestions(Vec<String>),
    /// A non-success response.
    #[serde(rename = "failure")]
    Failure {
        /// The HTTP status the service would have returned.
        status: u16,
        /// The raw response body.
        body: String,
    },
}

impl PresetSuggestions {
    /// Creates a successful list of questions.
    #[inline]
    pub fn with_questions<I, S>(questions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::Suggestions(questions.into_iter().map(Into::into).collect())
    }

    /// Creates a failed response.
    #[inline]
    pub fn failure<S: Into<String>>(status: u16, body: S) -> Self {
        Self::Failure {
            status,
            body: body.into(),
        }
    }
}
