use std::pin::Pin;
use std::sync::Arc;

use page_chat_model::{
    Answer, AnswerRequest, QaService, ServiceError, Suggestions,
    SuggestionsRequest,
};
use tracing::Instrument;

pub(crate) type AnswerResult = Result<Answer, Box<dyn ServiceError>>;
pub(crate) type SuggestionsResult = Result<Suggestions, Box<dyn ServiceError>>;
type BoxedFuture<T> = Pin<Box<dyn Future<Output = T> + Send>>;
type AnswerFn =
    Arc<dyn Fn(AnswerRequest) -> BoxedFuture<AnswerResult> + Send + Sync>;
type SuggestionsFn = Arc<
    dyn Fn(SuggestionsRequest) -> BoxedFuture<SuggestionsResult> + Send + Sync,
>;

/// A wrapper around a question-answering service that provides a
/// type-erased interface for the other modules.
#[derive(Clone)]
pub struct ServiceClient {
    answer_fn: AnswerFn,
    suggestions_fn: SuggestionsFn,
}

impl ServiceClient {
    pub fn new<Q: QaService + 'static>(service: Q) -> Self {
        // We have to erase the type `Q`, since `ServiceClient` doesn't have
        // a generic parameter and we don't want it either.
        let service = Arc::new(service);

        let answer_fn: AnswerFn = {
            let service = Arc::clone(&service);
            Arc::new(move |req: AnswerRequest| -> BoxedFuture<AnswerResult> {
                let fut = service.get_answer(&req);
                Box::pin(
                    async move {
                        trace!("asking: {:?}", req.question);
                        let answer = fut.await.map_err(|err| {
                            error!("got an error: {err:?}");
                            Box::new(err) as Box<dyn ServiceError>
                        })?;
                        trace!("got an answer, in scope: {}", answer.in_scope);
                        Ok(answer)
                    }
                    .instrument(trace_span!("get answer")),
                )
            })
        };

        let suggestions_fn: SuggestionsFn = Arc::new(
            move |req: SuggestionsRequest| -> BoxedFuture<SuggestionsResult> {
                let fut = service.get_suggested_questions(&req);
                Box::pin(
                    async move {
                        let suggestions = fut.await.map_err(|err| {
                            error!("got an error: {err:?}");
                            Box::new(err) as Box<dyn ServiceError>
                        })?;
                        trace!(
                            "got {} suggestions",
                            suggestions.suggestions.len()
                        );
                        Ok(suggestions)
                    }
                    .instrument(trace_span!("get suggestions")),
                )
            },
        );

        Self {
            answer_fn,
            suggestions_fn,
        }
    }

    /// Asks a question. A single attempt, never retried.
    #[inline]
    pub async fn get_answer(&self, req: AnswerRequest) -> AnswerResult {
        (self.answer_fn)(req).await
    }

    /// Fetches suggested questions. A single attempt, never retried.
    #[inline]
    pub async fn get_suggested_questions(
        &self,
        req: SuggestionsRequest,
    ) -> SuggestionsResult {
        (self.suggestions_fn)(req).await
    }
}

#[cfg(test)]
mod tests {
    use page_chat_model::ErrorKind;
    use page_chat_test_service::{PresetAnswer, TestQaService};

    use super::*;

    #[tokio::test]
    async fn test_get_answer() {
        let service = TestQaService::default();
        service.push_answer(PresetAnswer::answer("It's a blog post.", true));
        let client = ServiceClient::new(service.clone());

        let answer = client
            .get_answer(AnswerRequest {
                context: "https://a.test".to_owned(),
                question: "What is this page about?".to_owned(),
            })
            .await
            .unwrap();
        assert_eq!(answer.answer, "It's a blog post.");
        assert_eq!(service.answer_requests().len(), 1);
    }

    #[tokio::test]
    async fn test_error_handling() {
        let service = TestQaService::default();
        let client = ServiceClient::new(service);
        // Nothing is scripted, so the fake service fails.
        let err = client
            .get_suggested_questions(SuggestionsRequest {
                context: "https://a.test".to_owned(),
            })
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Remote);
    }
}
