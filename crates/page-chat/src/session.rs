use std::path::PathBuf;

use page_chat_core::page::{self, PageListener};
use page_chat_core::store::{self, FileStorage, KvHistoryStore};
use page_chat_core::{
    ActorDeadError, ContextSource, Controller, ControllerBuilder,
    ControllerEvent, Snapshot, SubmitOutcome,
};
use page_chat_http_service::{HttpService, HttpServiceConfigBuilder};
use tokio::task::JoinHandle;

use crate::extract::HtmlPageReader;

/// How many page requests may wait for the reader.
const PAGE_CHANNEL_BUFFER: usize = 8;

/// A session builder.
///
/// See [`Session`].
pub struct SessionBuilder {
    service_config: HttpServiceConfigBuilder,
    history_file: Option<PathBuf>,
    context_source: ContextSource,
    read_pages: bool,
    on_event: Option<Box<dyn Fn(ControllerEvent) + Send + Sync>>,
}

impl Default for SessionBuilder {
    fn default() -> Self {
        Self {
            service_config: HttpServiceConfigBuilder::new(),
            history_file: None,
            context_source: ContextSource::default(),
            read_pages: true,
            on_event: None,
        }
    }
}

impl SessionBuilder {
    /// Creates a session builder with default settings.
    #[inline]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the base URL of the question-answering service.
    #[inline]
    pub fn with_base_url<S: Into<String>>(mut self, base_url: S) -> Self {
        self.service_config = self.service_config.with_base_url(base_url);
        self
    }

    /// Saves chat history to `path`. Without it, history is kept in memory
    /// only.
    #[inline]
    pub fn with_history_file<P: Into<PathBuf>>(mut self, path: P) -> Self {
        self.history_file = Some(path.into());
        self
    }

    /// Sets which value is sent to the service as context.
    #[inline]
    pub fn with_context_source(
        mut self,
        context_source: ContextSource,
    ) -> Self {
        self.context_source = context_source;
        self
    }

    /// Never downloads pages; the page URL is the only context.
    #[inline]
    pub fn without_page_reader(mut self) -> Self {
        self.read_pages = false;
        self
    }

    /// Attaches a callback to be invoked on every [`ControllerEvent`].
    #[inline]
    pub fn on_event(
        mut self,
        on_event: impl Fn(ControllerEvent) + Send + Sync + 'static,
    ) -> Self {
        self.on_event = Some(Box::new(on_event));
        self
    }

    /// Builds a new session.
    ///
    /// Fails if the history file exists but can't be read. Must be called
    /// within a tokio runtime.
    pub fn build(self) -> Result<Session, store::Error> {
        let service = HttpService::new(self.service_config.build());
        let mut builder = ControllerBuilder::with_service(service)
            .with_context_source(self.context_source);

        if let Some(path) = self.history_file {
            let storage = FileStorage::open(path)?;
            debug!("history is saved to {}", storage.path().display());
            builder = builder.with_history_store(KvHistoryStore::new(storage));
        }

        let mut reader_task = None;
        if self.read_pages {
            let (page_channel, listener) = page::channel(PAGE_CHANNEL_BUFFER);
            reader_task = Some(spawn_page_reader(listener));
            builder = builder.with_page_provider(page_channel);
        }

        if let Some(on_event) = self.on_event {
            builder = builder.on_event(on_event);
        }

        Ok(Session {
            controller: builder.build(),
            reader_task,
        })
    }
}

fn spawn_page_reader(listener: PageListener) -> JoinHandle<()> {
    tokio::spawn(listener.serve(HtmlPageReader::new()))
}

/// A chat session about one page at a time.
///
/// The session is basically a wrapper around [`Controller`], together with
/// the task that reads pages for it. Dropping the session stops both.
pub struct Session {
    controller: Controller,
    reader_task: Option<JoinHandle<()>>,
}

impl Session {
    /// Opens the page at `url`, replacing the current one.
    #[inline]
    pub fn open(&self, url: &str) -> Result<(), ActorDeadError> {
        self.controller.activate(url)
    }

    /// Asks a question about the current page.
    #[inline]
    pub async fn ask(
        &self,
        question: &str,
    ) -> Result<SubmitOutcome, ActorDeadError> {
        self.controller.submit(question).await
    }

    /// Clears the history of the current page.
    #[inline]
    pub fn clear_history(&self) -> Result<(), ActorDeadError> {
        self.controller.clear_history()
    }

    /// Dismisses every notice, returning how many were dismissed.
    pub async fn dismiss_notices(&self) -> Result<usize, ActorDeadError> {
        let notices = self.controller.snapshot().await?.notices;
        let mut dismissed = 0;
        for notice in notices {
            if self.controller.dismiss_notice(notice.id()).await? {
                dismissed += 1;
            }
        }
        Ok(dismissed)
    }

    /// Returns a copy of the current state.
    #[inline]
    pub async fn snapshot(&self) -> Result<Snapshot, ActorDeadError> {
        self.controller.snapshot().await
    }

    /// Returns the underlying controller.
    #[inline]
    pub fn controller(&self) -> &Controller {
        &self.controller
    }
}

impl Drop for Session {
    fn drop(&mut self) {
        self.controller.shutdown();
        if let Some(task) = self.reader_task.take() {
            task.abort();
        }
    }
}
