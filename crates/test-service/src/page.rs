use std::future::ready;

use page_chat_model::{ErrorKind, PageContentProvider};

use crate::Error;

/// A page provider that returns fixed content for every page, or fails
/// for every page.
#[derive(Clone, Debug)]
pub struct StubPage {
    content: Option<String>,
}

impl StubPage {
    /// Every page reads as `content`.
    #[inline]
    pub fn with_content<S: Into<String>>(content: S) -> Self {
        Self {
            content: Some(content.into()),
        }
    }

    /// Every read fails, as if no page could be reached.
    #[inline]
    pub fn unreachable() -> Self {
        Self { content: None }
    }
}

impl PageContentProvider for StubPage {
    type Error = Error;

    fn fetch_content(
        &self,
        _identity: &str,
    ) -> impl Future<Output = Result<String, Self::Error>> + Send + 'static {
        let result = self.content.clone().ok_or_else(|| Error {
            message: "page is unreachable".to_owned(),
            kind: ErrorKind::Other,
            status: None,
        });
        ready(result)
    }
}
