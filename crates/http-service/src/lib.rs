//! A question-answering service reached over HTTP.
//!
//! The backend exposes two JSON endpoints, `POST /chat` and
//! `POST /suggested-questions`. Every call is a single attempt, without
//! retries or timeouts.

#[macro_use]
extern crate tracing;

mod config;
mod proto;

use std::error::Error as StdError;
use std::fmt::{self, Display};
use std::sync::Arc;

use mime::Mime;
use page_chat_model::{
    Answer, AnswerRequest, ErrorKind, QaService, ServiceError, Suggestions,
    SuggestionsRequest,
};
use reqwest::{Client, header};
use serde::Serialize;
use serde::de::DeserializeOwned;

pub use config::{DEFAULT_BASE_URL, HttpServiceConfig, HttpServiceConfigBuilder};
use proto::{ChatResponse, SuggestedQuestionsResponse};

/// Error type for [`HttpService`].
#[derive(Debug)]
pub struct Error {
    message: String,
    kind: ErrorKind,
    status: Option<u16>,
}

impl Error {
    fn new(message: impl Into<String>, kind: ErrorKind) -> Self {
        Self {
            message: message.into(),
            kind,
            status: None,
        }
    }

    fn remote(status: u16, body: String) -> Self {
        Self {
            message: body,
            kind: ErrorKind::Remote,
            status: Some(status),
        }
    }

    /// Returns the error message.
    ///
    /// For [`ErrorKind::Remote`] errors, this is the raw response body.
    #[inline]
    pub fn message(&self) -> &str {
        &self.message
    }

    /// Returns the HTTP status code, if the server responded at all.
    #[inline]
    pub fn status(&self) -> Option<u16> {
        self.status
    }
}

impl Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
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

/// Question-answering service backed by the HTTP API.
#[derive(Clone, Debug)]
pub struct HttpService {
    client: Client,
    config: Arc<HttpServiceConfig>,
}

impl HttpService {
    /// Creates a new `HttpService` with the given configuration.
    #[inline]
    pub fn new(config: HttpServiceConfig) -> Self {
        Self::with_client(Client::new(), config)
    }

    /// Creates a new `HttpService` that shares an existing client.
    #[inline]
    pub fn with_client(client: Client, config: HttpServiceConfig) -> Self {
        Self {
            client,
            config: Arc::new(config),
        }
    }

    /// Returns the configuration of this service.
    #[inline]
    pub fn config(&self) -> &HttpServiceConfig {
        &self.config
    }

    fn post_json<B, T>(
        &self,
        path: &'static str,
        body: &B,
    ) -> impl Future<Output = Result<T, Error>> + Send + 'static + use<B, T>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let resp_fut = self
            .client
            .post(self.config.endpoint(path))
            .header(header::ACCEPT, "application/json")
            .json(body)
            .send();

        async move {
            let resp = resp_fut.await.map_err(|err| {
                error!("failed to send request to {path}: {err}");
                Error::new(format!("{err}"), ErrorKind::Transport)
            })?;

            let status = resp.status();
            if !status.is_success() {
                let body = resp.text().await.map_err(|err| {
                    Error::new(format!("{err}"), ErrorKind::Transport)
                })?;
                error!("{path} responded with {status}: {body}");
                return Err(Error::remote(status.as_u16(), body));
            }

            let content_type = resp
                .headers()
                .get(header::CONTENT_TYPE)
                .and_then(|v| v.to_str().ok())
                .map(ToOwned::to_owned);
            if let Some(content_type) = content_type {
                if !is_json_content_type(&content_type) {
                    return Err(Error::new(
                        format!("Unexpected content type: {content_type}"),
                        ErrorKind::InvalidResponse,
                    ));
                }
            }

            // Here we got a successful response.
            let bytes = resp.bytes().await.map_err(|err| {
                Error::new(format!("{err}"), ErrorKind::Transport)
            })?;
            trace!("{path} responded with {} bytes", bytes.len());
            serde_json::from_slice(&bytes).map_err(|err| {
                Error::new(format!("{err}"), ErrorKind::InvalidResponse)
            })
        }
    }
}

impl QaService for HttpService {
    type Error = Error;

    fn get_answer(
        &self,
        req: &AnswerRequest,
    ) -> impl Future<Output = Result<Answer, Self::Error>> + Send + 'static {
        let resp_fut = self.post_json::<_, ChatResponse>(
            "/chat",
            &proto::create_chat_request(req),
        );
        async move { resp_fut.await.map(Answer::from) }
    }

    fn get_suggested_questions(
        &self,
        req: &SuggestionsRequest,
    ) -> impl Future<Output = Result<Suggestions, Self::Error>> + Send + 'static
    {
        let resp_fut = self.post_json::<_, SuggestedQuestionsResponse>(
            "/suggested-questions",
            &proto::create_suggestions_request(req),
        );
        async move { resp_fut.await.map(Suggestions::from) }
    }
}

fn is_json_content_type(value: &str) -> bool {
    value
        .parse::<Mime>()
        .map(|m| {
            m.subtype() == mime::JSON || m.suffix() == Some(mime::JSON)
        })
        .unwrap_or(false)
}
