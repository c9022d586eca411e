//! Reading page content.
//!
//! The controller reads pages through a [`PageContentProvider`]. Hosts
//! where the page lives in another context (a script injected into a
//! browser tab, a separate task) reach it with the request/response
//! [`channel`] defined here: the requesting side is itself a
//! `PageContentProvider`, and the page side serves requests with any other
//! provider that can actually read the page.

mod channel;

use std::error::Error;
use std::pin::Pin;
use std::sync::Arc;

use page_chat_model::PageContentProvider;
use tracing::Instrument;

pub use channel::{
    ChannelError, PageChannel, PageListener, PendingRequest, channel,
};

pub(crate) type FetchError = Box<dyn Error + Send + Sync>;
type BoxedFetchFuture =
    Pin<Box<dyn Future<Output = Result<String, FetchError>> + Send>>;
type FetchFn = Arc<dyn Fn(&str) -> BoxedFetchFuture + Send + Sync>;

/// A type-erased [`PageContentProvider`].
#[derive(Clone)]
pub(crate) struct PageSource {
    fetch_fn: FetchFn,
}

impl PageSource {
    pub fn new<P: PageContentProvider + 'static>(provider: P) -> Self {
        let fetch_fn: FetchFn =
            Arc::new(move |identity: &str| -> BoxedFetchFuture {
                let fut = provider.fetch_content(identity);
                let span = trace_span!("fetch page", identity = identity);
                Box::pin(
                    async move {
                        let content = fut.await.map_err(|err| {
                            warn!("failed to fetch page content: {err}");
                            Box::new(err) as FetchError
                        })?;
                        trace!("got {} bytes of content", content.len());
                        Ok(content)
                    }
                    .instrument(span),
                )
            });
        Self { fetch_fn }
    }

    #[inline]
    pub async fn fetch_content(
        &self,
        identity: &str,
    ) -> Result<String, FetchError> {
        (self.fetch_fn)(identity).await
    }
}
