use page_chat_actor::{Actor, Message, Request};
use page_chat_model::{
    AnswerRequest, Message as ChatMessage, SuggestionsRequest, Transcript,
};

use super::{
    ContextSource, ControllerEvent, ControllerState, GREETING,
    OUT_OF_SCOPE_MESSAGE, RejectReason, Snapshot, SubmitOutcome,
};
use crate::notice::{self, NoticeLevel};
use crate::page::FetchError;
use crate::service_client::{AnswerResult, SuggestionsResult};

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Phase {
    #[default]
    Inactive,
    Activating,
    Ready,
}

fn seed_transcript() -> Transcript {
    Transcript::from(vec![ChatMessage::assistant(GREETING)])
}

impl ControllerState {
    fn activate(&mut self, identity: String, handle: &Actor<Self>) {
        let identity = identity.trim();
        if identity.is_empty() {
            self.notify(NoticeLevel::Error, notice::ENTER_URL);
            return;
        }

        self.activation += 1;
        let activation = self.activation;
        debug!("activating {identity} (#{activation})");

        self.phase = Phase::Activating;
        self.identity = Some(identity.to_owned());
        self.context.clear();
        self.transcript = Transcript::new();
        if !self.suggestions.is_empty() {
            self.suggestions.clear();
            self.emit(ControllerEvent::SuggestionsChanged(vec![]));
        }

        let page_source = match self.context_source {
            ContextSource::PreferContent => self.page_source.clone(),
            ContextSource::IdentityOnly => None,
        };
        let Some(page_source) = page_source else {
            self.finish_activation(None, handle);
            return;
        };

        let identity = identity.to_owned();
        let handle_clone = handle.clone();
        self.spawn_task(
            |_| async move {
                let result = page_source.fetch_content(&identity).await;
                handle_clone
                    .send(ContentResolvedMessage { activation, result })
                    .ok();
            },
            handle,
        );
    }

    /// Adopts the page context and the saved transcript, then asks for
    /// suggestions. The content, if any, has been read already.
    fn finish_activation(
        &mut self,
        content: Option<String>,
        handle: &Actor<Self>,
    ) {
        let Some(identity) = self.identity.clone() else {
            return;
        };

        self.context = match content {
            Some(content) if !content.trim().is_empty() => content,
            _ => identity.clone(),
        };
        let history = self.store.load(&identity);
        self.transcript = if history.is_empty() {
            seed_transcript()
        } else {
            history
        };
        self.phase = Phase::Ready;
        trace!(
            "{identity} is ready with {} messages",
            self.transcript.len()
        );
        self.emit(ControllerEvent::Activated {
            identity: identity.clone(),
        });
        self.emit(ControllerEvent::TranscriptChanged(self.transcript.clone()));

        let req = SuggestionsRequest {
            context: self.context.clone(),
        };
        let service = self.service.clone();
        let activation = self.activation;
        let handle_clone = handle.clone();
        self.spawn_task(
            |_| async move {
                let result = service.get_suggested_questions(req).await;
                handle_clone
                    .send(SuggestionsFetchedMessage { activation, result })
                    .ok();
            },
            handle,
        );
    }

    fn submit(&mut self, input: String, handle: &Actor<Self>) -> SubmitOutcome {
        if input.trim().is_empty() {
            return SubmitOutcome::Rejected(RejectReason::Empty);
        }
        if self.in_flight {
            return SubmitOutcome::Rejected(RejectReason::InFlight);
        }
        if self.phase != Phase::Ready {
            return SubmitOutcome::Rejected(RejectReason::NotReady);
        }
        let Some(identity) = self.identity.clone() else {
            return SubmitOutcome::Rejected(RejectReason::NotReady);
        };

        // The question is saved before it is sent, so it survives a
        // failed request.
        self.transcript.push(ChatMessage::user(input.clone()));
        self.persist(&identity);
        self.emit(ControllerEvent::TranscriptChanged(self.transcript.clone()));

        self.in_flight = true;
        let req = AnswerRequest {
            context: self.context.clone(),
            question: input,
        };
        let service = self.service.clone();
        let handle_clone = handle.clone();
        self.spawn_task(
            |_| async move {
                let result = service.get_answer(req).await;
                handle_clone
                    .send(AnswerFinishedMessage { identity, result })
                    .ok();
            },
            handle,
        );
        SubmitOutcome::Accepted
    }

    /// Adds an answer to the transcript of `identity`, which is the current
    /// page. While the page is re-activating, the answer goes to the store
    /// so the transcript loaded next includes it.
    fn append_answer(&mut self, identity: &str, content: String) {
        if self.phase != Phase::Ready {
            let mut history = self.store.load(identity);
            if history.is_empty() {
                history = seed_transcript();
            }
            history.push(ChatMessage::assistant(content));
            if let Err(err) = self.store.save(identity, &history) {
                warn!("failed to save history of {identity}: {err}");
                self.notify(NoticeLevel::Warning, notice::SAVE_FAILED);
            }
            return;
        }
        self.transcript.push(ChatMessage::assistant(content));
        self.persist(identity);
        self.emit(ControllerEvent::TranscriptChanged(self.transcript.clone()));
    }

    fn clear_history(&mut self) {
        let Some(identity) = self.identity.clone() else {
            return;
        };
        if let Err(err) = self.store.clear(&identity) {
            warn!("failed to clear history of {identity}: {err}");
            self.notify(NoticeLevel::Error, notice::CLEAR_FAILED);
        }
        // While activating, the cleared store yields the greeting anyway.
        if self.phase == Phase::Ready {
            self.transcript = seed_transcript();
            self.emit(ControllerEvent::TranscriptChanged(
                self.transcript.clone(),
            ));
        }
    }

    fn snapshot(&self) -> Snapshot {
        Snapshot {
            identity: self.identity.clone(),
            ready: self.phase == Phase::Ready,
            in_flight: self.in_flight,
            transcript: self.transcript.clone(),
            suggestions: self.suggestions.clone(),
            notices: self.notices.items().to_vec(),
        }
    }

    fn persist(&mut self, identity: &str) {
        let result = self.store.save(identity, &self.transcript);
        if let Err(err) = result {
            warn!("failed to save history of {identity}: {err}");
            self.notify(NoticeLevel::Warning, notice::SAVE_FAILED);
        }
    }

    fn notify(&mut self, level: NoticeLevel, description: &str) {
        let notice = self.notices.push(level, description);
        self.emit(ControllerEvent::Notice(notice));
    }

    fn emit(&self, event: ControllerEvent) {
        if let Some(on_event) = &self.on_event {
            on_event(event);
        }
    }

    #[inline]
    fn is_stale(&self, activation: u64) -> bool {
        if activation != self.activation {
            debug!(
                "discarding a result of activation #{activation}, \
                 current is #{}",
                self.activation
            );
            return true;
        }
        false
    }

    fn spawn_task<F, Fut>(&mut self, f: F, handle: &Actor<Self>)
    where
        F: FnOnce(u64) -> Fut,
        Fut: Future<Output = ()> + Send + 'static,
    {
        let task_id = self.next_task_id;
        self.next_task_id += 1;

        let handle = handle.clone();
        let fut = f(task_id);
        let task = tokio::spawn(async move {
            fut.await;
            handle.send(TaskEndedMessage(task_id)).ok();
        });
        self.running_tasks.insert(task_id, task);
    }
}

#[derive(Debug)]
pub struct Activate(pub String);

impl Message<ControllerState> for Activate {
    #[inline]
    fn handle(
        self,
        state: &mut ControllerState,
        handle: &Actor<ControllerState>,
    ) {
        state.activate(self.0, handle);
    }
}

#[derive(Debug)]
struct ContentResolvedMessage {
    activation: u64,
    result: Result<String, FetchError>,
}

impl Message<ControllerState> for ContentResolvedMessage {
    fn handle(
        self,
        state: &mut ControllerState,
        handle: &Actor<ControllerState>,
    ) {
        if state.is_stale(self.activation) {
            return;
        }
        let content = match self.result {
            Ok(content) => Some(content),
            Err(_) => {
                // Keep going with the identity as context.
                state
                    .notify(NoticeLevel::Warning, notice::PAGE_CONTENT_FAILED);
                None
            }
        };
        state.finish_activation(content, handle);
    }
}

#[derive(Debug)]
struct SuggestionsFetchedMessage {
    activation: u64,
    result: SuggestionsResult,
}

impl Message<ControllerState> for SuggestionsFetchedMessage {
    fn handle(
        self,
        state: &mut ControllerState,
        _handle: &Actor<ControllerState>,
    ) {
        if state.is_stale(self.activation) {
            return;
        }
        match self.result {
            Ok(suggestions) => {
                state.suggestions = suggestions.suggestions;
                state.emit(ControllerEvent::SuggestionsChanged(
                    state.suggestions.clone(),
                ));
            }
            Err(_) => {
                state
                    .notify(NoticeLevel::Warning, notice::SUGGESTIONS_FAILED);
            }
        }
    }
}

#[derive(Debug)]
pub struct Submit(pub String);

impl Request<ControllerState> for Submit {
    type Reply = SubmitOutcome;

    #[inline]
    fn handle(
        self,
        state: &mut ControllerState,
        handle: &Actor<ControllerState>,
    ) -> SubmitOutcome {
        state.submit(self.0, handle)
    }
}

#[derive(Debug)]
struct AnswerFinishedMessage {
    identity: String,
    result: AnswerResult,
}

impl Message<ControllerState> for AnswerFinishedMessage {
    fn handle(
        self,
        state: &mut ControllerState,
        _handle: &Actor<ControllerState>,
    ) {
        state.in_flight = false;

        if state.identity.as_deref() != Some(self.identity.as_str()) {
            debug!("discarding the answer for {}", self.identity);
        } else {
            match self.result {
                Ok(answer) => {
                    let content = if answer.in_scope {
                        answer.answer
                    } else {
                        OUT_OF_SCOPE_MESSAGE.to_owned()
                    };
                    state.append_answer(&self.identity, content);
                }
                Err(_) => {
                    state.notify(NoticeLevel::Error, notice::SEND_FAILED);
                }
            }
        }
        state.emit(ControllerEvent::Idle);
    }
}

#[derive(Debug)]
pub struct ClearHistory;

impl Message<ControllerState> for ClearHistory {
    #[inline]
    fn handle(
        self,
        state: &mut ControllerState,
        _handle: &Actor<ControllerState>,
    ) {
        state.clear_history();
    }
}

#[derive(Debug)]
pub struct DismissNotice(pub u64);

impl Request<ControllerState> for DismissNotice {
    type Reply = bool;

    #[inline]
    fn handle(
        self,
        state: &mut ControllerState,
        _handle: &Actor<ControllerState>,
    ) -> bool {
        state.notices.dismiss(self.0)
    }
}

#[derive(Debug)]
pub struct GetSnapshot;

impl Request<ControllerState> for GetSnapshot {
    type Reply = Snapshot;

    #[inline]
    fn handle(
        self,
        state: &mut ControllerState,
        _handle: &Actor<ControllerState>,
    ) -> Snapshot {
        state.snapshot()
    }
}

#[derive(Debug)]
pub struct Shutdown;

impl Message<ControllerState> for Shutdown {
    fn handle(
        self,
        state: &mut ControllerState,
        handle: &Actor<ControllerState>,
    ) {
        for (_, task) in state.running_tasks.drain() {
            task.abort();
        }
        debug!("shutting down");
        handle.try_kill();
    }
}

#[derive(Debug)]
struct TaskEndedMessage(u64);

impl Message<ControllerState> for TaskEndedMessage {
    #[inline]
    fn handle(
        self,
        state: &mut ControllerState,
        _handle: &Actor<ControllerState>,
    ) {
        if state.running_tasks.remove(&self.0).is_none() {
            warn!("task {} ended but was not tracked", self.0);
        }
    }
}
