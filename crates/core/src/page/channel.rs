use std::error::Error;
use std::fmt;

use page_chat_model::{PageContentProvider, PageRequest, PageResponse};
use tokio::sync::{mpsc, oneshot};

/// Errors when talking to a page over the content channel.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ChannelError {
    /// Nobody is listening on the page side.
    NoListener,
    /// The listener went away without answering the request.
    NoResponse,
}

impl fmt::Display for ChannelError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ChannelError::NoListener => {
                "no listener is attached to the page".fmt(f)
            }
            ChannelError::NoResponse => "the page did not respond".fmt(f),
        }
    }
}

impl Error for ChannelError {}

#[derive(Debug)]
struct Envelope {
    target: String,
    request: PageRequest,
    reply_tx: oneshot::Sender<PageResponse>,
}

/// Creates a content channel.
///
/// `buffer` bounds how many requests may wait for the listener before
/// senders are suspended.
pub fn channel(buffer: usize) -> (PageChannel, PageListener) {
    let (tx, rx) = mpsc::channel(buffer.max(1));
    (PageChannel { tx }, PageListener { rx })
}

/// The requesting side of a content channel.
#[derive(Clone, Debug)]
pub struct PageChannel {
    tx: mpsc::Sender<Envelope>,
}

impl PageChannel {
    /// Sends `request` to the page `target` and waits for the answer.
    pub async fn request(
        &self,
        target: &str,
        request: PageRequest,
    ) -> Result<PageResponse, ChannelError> {
        send_request(self.tx.clone(), target.to_owned(), request).await
    }
}

async fn send_request(
    tx: mpsc::Sender<Envelope>,
    target: String,
    request: PageRequest,
) -> Result<PageResponse, ChannelError> {
    let (reply_tx, reply_rx) = oneshot::channel();
    trace!("sending {request:?} to {target}");
    tx.send(Envelope {
        target,
        request,
        reply_tx,
    })
    .await
    .map_err(|_| ChannelError::NoListener)?;
    reply_rx.await.map_err(|_| ChannelError::NoResponse)
}

impl PageContentProvider for PageChannel {
    type Error = ChannelError;

    fn fetch_content(
        &self,
        identity: &str,
    ) -> impl Future<Output = Result<String, Self::Error>> + Send + 'static {
        let fut = send_request(
            self.tx.clone(),
            identity.to_owned(),
            PageRequest::GetPageContent,
        );
        async move { fut.await.map(|resp| resp.content) }
    }
}

/// The page side of a content channel.
#[derive(Debug)]
pub struct PageListener {
    rx: mpsc::Receiver<Envelope>,
}

impl PageListener {
    /// Waits for the next request.
    ///
    /// Returns `None` once every [`PageChannel`] has been dropped.
    pub async fn recv(&mut self) -> Option<PendingRequest> {
        let envelope = self.rx.recv().await?;
        Some(PendingRequest { envelope })
    }

    /// Answers every incoming request by reading the page with `reader`,
    /// until the requesting side goes away.
    ///
    /// Failed reads are answered with empty content.
    pub async fn serve<P: PageContentProvider>(mut self, reader: P) {
        while let Some(pending) = self.recv().await {
            let content = match pending.request() {
                PageRequest::GetPageContent => {
                    match reader.fetch_content(pending.target()).await {
                        Ok(content) => content,
                        Err(err) => {
                            warn!(
                                "failed to read {}: {err}",
                                pending.target()
                            );
                            String::new()
                        }
                    }
                }
            };
            pending.respond(PageResponse { content });
        }
        debug!("page listener stopped");
    }
}

/// A request received by a [`PageListener`].
///
/// Answering consumes the request, so it can be answered at most once.
/// Dropping it unanswered makes the sender fail with
/// [`ChannelError::NoResponse`].
#[derive(Debug)]
pub struct PendingRequest {
    envelope: Envelope,
}

impl PendingRequest {
    /// Returns the page this request is addressed to.
    #[inline]
    pub fn target(&self) -> &str {
        &self.envelope.target
    }

    /// Returns the request.
    #[inline]
    pub fn request(&self) -> PageRequest {
        self.envelope.request
    }

    /// Sends the answer back to the requester.
    pub fn respond(self, response: PageResponse) {
        if self.envelope.reply_tx.send(response).is_err() {
            debug!("requester went away before the answer");
        }
    }
}
