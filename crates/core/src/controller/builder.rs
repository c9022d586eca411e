use page_chat_model::{PageContentProvider, QaService};

use super::{ContextSource, Controller, ControllerEvent, EventCallback};
use crate::page::PageSource;
use crate::service_client::ServiceClient;
use crate::store::{HistoryStore, KvHistoryStore};

/// [`Controller`] builder.
pub struct ControllerBuilder {
    pub(crate) service: ServiceClient,
    pub(crate) page_source: Option<PageSource>,
    pub(crate) store: Box<dyn HistoryStore>,
    pub(crate) context_source: ContextSource,
    pub(crate) on_event: Option<EventCallback>,
}

impl ControllerBuilder {
    /// Creates a new builder with the specified question-answering service.
    ///
    /// Until another store is set, transcripts are kept in memory only.
    #[inline]
    pub fn with_service<Q: QaService + 'static>(service: Q) -> Self {
        Self {
            service: ServiceClient::new(service),
            page_source: None,
            store: Box::new(KvHistoryStore::in_memory()),
            context_source: Default::default(),
            on_event: None,
        }
    }

    /// Sets where transcripts are saved.
    #[inline]
    pub fn with_history_store<H: HistoryStore>(mut self, store: H) -> Self {
        self.store = Box::new(store);
        self
    }

    /// Sets how page content is read.
    ///
    /// Without a provider, the page identity is always used as context.
    #[inline]
    pub fn with_page_provider<P: PageContentProvider + 'static>(
        mut self,
        provider: P,
    ) -> Self {
        self.page_source = Some(PageSource::new(provider));
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

    /// Attaches a callback to be invoked on every [`ControllerEvent`].
    ///
    /// The callback runs on the controller task, so it should return
    /// quickly.
    #[inline]
    pub fn on_event(
        mut self,
        on_event: impl Fn(ControllerEvent) + Send + Sync + 'static,
    ) -> Self {
        self.on_event = Some(Box::new(on_event));
        self
    }

    /// Builds the controller.
    ///
    /// Must be called within a tokio runtime.
    #[inline]
    pub fn build(self) -> Controller {
        Controller::spawn_from_builder(self)
    }
}
