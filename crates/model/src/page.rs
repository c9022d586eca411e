use std::error::Error;

use serde::{Deserialize, Serialize};

/// A type that can read the visible text of a page.
///
/// Hosts differ a lot in how pages are reached (a message channel to a
/// script living in the page, a plain HTTP fetch, a stub in tests), so the
/// controller only sees this single operation.
pub trait PageContentProvider: Send + Sync {
    /// The error type that may be returned by the provider.
    type Error: Error + Send + Sync + 'static;

    /// Reads the textual content of the page identified by `identity`.
    ///
    /// A failure means "no content available", callers are expected to
    /// degrade rather than abort.
    fn fetch_content(
        &self,
        identity: &str,
    ) -> impl Future<Output = Result<String, Self::Error>> + Send + 'static;
}

/// A request sent to a page over the content channel.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum PageRequest {
    /// Asks for the rendered text of the page.
    #[serde(rename = "GET_PAGE_CONTENT")]
    GetPageContent,
}

/// The answer to a [`PageRequest::GetPageContent`] request.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PageResponse {
    /// The rendered text of the page, empty if nothing could be read.
    pub content: String,
}
