mod builder;
mod state;

use std::collections::HashMap;

use page_chat_actor::{ActorDeadError, define_actor};
use page_chat_model::Transcript;
use tokio::task::JoinHandle;

use crate::notice::{Notice, Notices};
use crate::page::PageSource;
use crate::service_client::ServiceClient;
use crate::store::HistoryStore;
pub use builder::ControllerBuilder;
use state::{
    Activate, ClearHistory, DismissNotice, GetSnapshot, Phase, Shutdown, Submit,
};

/// The assistant message that opens every new conversation.
pub const GREETING: &str =
    "I've loaded the webpage. What would you like to know about it?";

/// Shown instead of the answer when a question can't be answered from the
/// page.
pub const OUT_OF_SCOPE_MESSAGE: &str =
    "Sorry, that question is outside the scope of this page.";

/// Which value is sent to the service as the context of a page.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum ContextSource {
    /// Use the extracted page content, or the page identity if no content
    /// could be read.
    #[default]
    PreferContent,
    /// Always use the page identity and never read the page.
    IdentityOnly,
}

/// Why a submission was ignored.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum RejectReason {
    /// The input is empty or only whitespace.
    Empty,
    /// Another question is still waiting for its answer.
    InFlight,
    /// No page has finished activating yet.
    NotReady,
}

/// The result of [`Controller::submit`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum SubmitOutcome {
    /// The question was added to the transcript and sent.
    Accepted,
    /// Nothing happened.
    Rejected(RejectReason),
}

/// A change the presentation layer may want to render.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ControllerEvent {
    /// A page finished activating and its transcript is ready.
    Activated {
        /// The identity of the page.
        identity: String,
    },
    /// The transcript was replaced or appended to.
    TranscriptChanged(Transcript),
    /// The suggested questions were replaced.
    SuggestionsChanged(Vec<String>),
    /// A new notice was raised.
    Notice(Notice),
    /// An answer request has settled, whatever its outcome.
    Idle,
}

/// A point-in-time copy of the controller state.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Snapshot {
    /// The identity of the current page, if any page was activated.
    pub identity: Option<String>,
    /// Whether the current page finished activating.
    pub ready: bool,
    /// Whether a question is waiting for its answer.
    pub in_flight: bool,
    /// The transcript of the current page.
    pub transcript: Transcript,
    /// The suggested questions for the current page.
    pub suggestions: Vec<String>,
    /// Notices that have not been dismissed yet.
    pub notices: Vec<Notice>,
}

type EventCallback = Box<dyn Fn(ControllerEvent) + Send + Sync>;

define_actor! {
    /// Drives a chat about one page at a time.
    ///
    /// Activating a page loads its saved transcript and suggested
    /// questions; submitting a question appends it to the transcript and
    /// asks the service. Every change is saved to the history store right
    /// away.
    ///
    /// Messages are handled one at a time in the order they were sent.
    /// Network and page work run in background tasks which report back
    /// with messages, so the controller keeps responding while they are
    /// pending. Page content and suggestions from an earlier activation
    /// are dropped. An answer is dropped only if a different page is active
    /// when it arrives; re-opening the same page keeps it.
    #[wrapper_type(Controller)]
    pub struct ControllerState {
        service: ServiceClient,
        page_source: Option<PageSource>,
        store: Box<dyn HistoryStore>,
        context_source: ContextSource,

        phase: Phase,
        activation: u64,
        identity: Option<String>,
        context: String,
        transcript: Transcript,
        suggestions: Vec<String>,
        in_flight: bool,
        notices: Notices,

        running_tasks: HashMap<u64, JoinHandle<()>>,
        next_task_id: u64,

        on_event: Option<EventCallback>,
    }
}

impl Controller {
    /// Starts a conversation about the page identified by `identity`,
    /// replacing the current one.
    pub fn activate<S: Into<String>>(
        &self,
        identity: S,
    ) -> Result<(), ActorDeadError> {
        self.handle().send(Activate(identity.into()))
    }

    /// Submits a question about the current page.
    ///
    /// Returns once the question has been accepted or rejected; the answer
    /// arrives later as a [`ControllerEvent::TranscriptChanged`] event.
    pub async fn submit<S: Into<String>>(
        &self,
        input: S,
    ) -> Result<SubmitOutcome, ActorDeadError> {
        self.handle().call(Submit(input.into())).await
    }

    /// Removes the saved transcript of the current page and starts over
    /// with the greeting.
    pub fn clear_history(&self) -> Result<(), ActorDeadError> {
        self.handle().send(ClearHistory)
    }

    /// Dismisses a notice. Returns `false` if there was no such notice.
    pub async fn dismiss_notice(
        &self,
        id: u64,
    ) -> Result<bool, ActorDeadError> {
        self.handle().call(DismissNotice(id)).await
    }

    /// Returns a copy of the current state.
    pub async fn snapshot(&self) -> Result<Snapshot, ActorDeadError> {
        self.handle().call(GetSnapshot).await
    }

    /// Stops the controller and aborts its background tasks.
    ///
    /// Messages sent before this call are still handled. Once stopped,
    /// every other method fails with [`ActorDeadError`].
    pub fn shutdown(&self) {
        if self.handle().send(Shutdown).is_err() {
            trace!("controller is stopped already");
        }
    }
}

impl Controller {
    fn spawn_from_builder(builder: ControllerBuilder) -> Self {
        let ControllerBuilder {
            service,
            page_source,
            store,
            context_source,
            on_event,
        } = builder;

        let state = ControllerState {
            service,
            page_source,
            store,
            context_source,
            phase: Default::default(),
            activation: 0,
            identity: None,
            context: String::new(),
            transcript: Default::default(),
            suggestions: Default::default(),
            in_flight: false,
            notices: Default::default(),
            running_tasks: Default::default(),
            next_task_id: 1,
            on_event,
        };
        Self::spawn(state, Some("controller"))
    }
}
