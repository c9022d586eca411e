//! A local fake question-answering service for testing purpose.

mod page;
mod preset;

use std::collections::VecDeque;
use std::error::Error as StdError;
use std::fmt::{self, Display, Formatter};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use page_chat_model::{
    Answer, AnswerRequest, ErrorKind, QaService, ServiceError, Suggestions,
    SuggestionsRequest,
};
use tokio::sync::Semaphore;
use tokio::time::sleep;

pub use page::StubPage;
pub use preset::*;

#[derive(Debug)]
pub struct Error {
    message: String,
    kind: ErrorKind,
    status: Option<u16>,
}

impl Error {
    fn remote(status: u16, body: String) -> Self {
        Self {
            message: body,
            kind: ErrorKind::Remote,
            status: Some(status),
        }
    }

    fn exhausted(what: &str) -> Self {
        Self {
            message: format!("no preset {what} left"),
            kind: ErrorKind::Remote,
            status: Some(500),
        }
    }

    /// Returns the error message.
    #[inline]
    pub fn message(&self) -> &str {
        &self.message
    }

    /// Returns the simulated HTTP status, if any.
    #[inline]
    pub fn status(&self) -> Option<u16> {
        self.status
    }
}

impl Display for Error {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl StdError for Error {}

impl ServiceError for Error {
    #[inline]
    fn kind(&self) -> ErrorKind {
        self.kind
    }
}

#[derive(Default)]
struct Script {
    answers: VecDeque<PresetAnswer>,
    suggestions: VecDeque<PresetSuggestions>,
    answer_requests: Vec<AnswerRequest>,
    suggestions_requests: Vec<SuggestionsRequest>,
}

/// Releases answers held back by [`TestQaService::hold_answers`].
#[derive(Clone, Debug)]
pub struct AnswerGate {
    semaphore: Arc<Semaphore>,
}

impl AnswerGate {
    /// Lets one held answer through.
    #[inline]
    pub fn release(&self) {
        self.semaphore.add_permits(1);
    }
}

/// A local fake question-answering service for testing purpose.
///
/// Before sending requests, script how the service should respond. Each
/// question consumes the next [`PresetAnswer`] and each suggestions
/// request consumes the next [`PresetSuggestions`]; once a script runs
/// out, requests fail with a remote error. Every request is recorded, so
/// tests can check what was sent.
///
/// Clones share the same script and records.
#[derive(Clone, Default)]
pub struct TestQaService {
    script: Arc<Mutex<Script>>,
    delay: Option<Duration>,
    gate: Option<AnswerGate>,
}

impl TestQaService {
    /// Appends a response for a future question.
    pub fn push_answer(&self, preset: PresetAnswer) {
        self.with_script(|script| script.answers.push_back(preset));
    }

    /// Appends a response for a future suggestions request.
    pub fn push_suggestions(&self, preset: PresetSuggestions) {
        self.with_script(|script| script.suggestions.push_back(preset));
    }

    /// Delays every response by `duration`.
    #[inline]
    pub fn set_delay(&mut self, duration: Duration) {
        self.delay = Some(duration);
    }

    /// Holds every answer until it is released through the returned gate.
    ///
    /// Suggestions are not affected.
    pub fn hold_answers(&mut self) -> AnswerGate {
        let gate = AnswerGate {
            semaphore: Arc::new(Semaphore::new(0)),
        };
        self.gate = Some(gate.clone());
        gate
    }

    /// Returns every question received so far.
    pub fn answer_requests(&self) -> Vec<AnswerRequest> {
        self.with_script(|script| script.answer_requests.clone())
    }

    /// Returns every suggestions request received so far.
    pub fn suggestions_requests(&self) -> Vec<SuggestionsRequest> {
        self.with_script(|script| script.suggestions_requests.clone())
    }

    fn with_script<R>(&self, f: impl FnOnce(&mut Script) -> R) -> R {
        let mut script =
            self.script.lock().unwrap_or_else(PoisonError::into_inner);
        f(&mut script)
    }
}

impl QaService for TestQaService {
    type Error = crate::Error;

    fn get_answer(
        &self,
        req: &AnswerRequest,
    ) -> impl Future<Output = Result<Answer, Self::Error>> + Send + 'static {
        let preset = self.with_script(|script| {
            script.answer_requests.push(req.clone());
            script.answers.pop_front()
        });
        let delay = self.delay;
        let gate = self.gate.clone();
        async move {
            if let Some(delay) = delay {
                sleep(delay).await;
            }
            if let Some(gate) = gate {
                match gate.semaphore.acquire().await {
                    Ok(permit) => permit.forget(),
                    Err(_) => unreachable!("the gate is never closed"),
                }
            }
            match preset {
                Some(PresetAnswer::Answer { answer, in_scope }) => {
                    Ok(Answer { answer, in_scope })
                }
                Some(PresetAnswer::Failure { status, body }) => {
                    Err(Error::remote(status, body))
                }
                None => Err(Error::exhausted("answer")),
            }
        }
    }

    fn get_suggested_questions(
        &self,
        req: &SuggestionsRequest,
    ) -> impl Future<Output = Result<Suggestions, Self::Error>> + Send + 'static
    {
        let preset = self.with_script(|script| {
            script.suggestions_requests.push(req.clone());
            script.suggestions.pop_front()
        });
        let delay = self.delay;
        async move {
            if let Some(delay) = delay {
                sleep(delay).await;
            }
            match preset {
                Some(PresetSuggestions::Suggestions(suggestions)) => {
                    Ok(Suggestions { suggestions })
                }
                Some(PresetSuggestions::Failure { status, body }) => {
                    Err(Error::remote(status, body))
                }
                None => Err(Error::exhausted("suggestions")),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use page_chat_model::PageContentProvider;
    use tokio::time::timeout;

    use super::*;

    #[tokio::test]
    async fn test_scripted_answers() {
        let service = TestQaService::default();
        service.push_answer(PresetAnswer::answer("It's a blog post.", true));
        service.push_answer(PresetAnswer::failure(503, "busy"));

        let req = AnswerRequest {
            context: "https://a.test".to_owned(),
            question: "What is this page about?".to_owned(),
        };
        let answer = service.get_answer(&req).await.unwrap();
        assert_eq!(answer.answer, "It's a blog post.");
        assert!(answer.in_scope);

        let err = service.get_answer(&req).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Remote);
        assert_eq!(err.status(), Some(503));
        assert_eq!(err.message(), "busy");

        // The script has run out.
        assert!(service.get_answer(&req).await.is_err());
        assert_eq!(service.answer_requests().len(), 3);
    }

    #[tokio::test]
    async fn test_scripted_suggestions() {
        let service = TestQaService::default();
        service.push_suggestions(PresetSuggestions::with_questions([
            "What is this page about?",
            "Who wrote it?",
        ]));
        let suggestions = service
            .get_suggested_questions(&SuggestionsRequest {
                context: "Owls".to_owned(),
            })
            .await
            .unwrap();
        assert_eq!(suggestions.suggestions.len(), 2);
        assert_eq!(service.suggestions_requests()[0].context, "Owls");
    }

    #[tokio::test]
    async fn test_held_answers() {
        let mut service = TestQaService::default();
        let gate = service.hold_answers();
        service.push_answer(PresetAnswer::answer("Later", true));

        let fut = service.get_answer(&AnswerRequest {
            context: String::new(),
            question: "Now?".to_owned(),
        });
        let mut fut = Box::pin(fut);
        assert!(
            timeout(Duration::from_millis(20), &mut fut).await.is_err(),
            "answer should be held"
        );
        gate.release();
        assert_eq!(fut.await.unwrap().answer, "Later");
    }

    #[tokio::test]
    async fn test_stub_page() {
        let content = StubPage::with_content("Hello")
            .fetch_content("https://a.test")
            .await
            .unwrap();
        assert_eq!(content, "Hello");
        assert!(
            StubPage::unreachable()
                .fetch_content("https://a.test")
                .await
                .is_err()
        );
    }
}
