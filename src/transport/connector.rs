//! Request-object construction and completion plumbing.
//!
//! A [`HttpConnector`] plays the role of one entry in the transport's ordered
//! constructor list: `open` either builds a [`RequestHandle`] or reports that
//! this connector cannot run in the current environment, in which case the
//! transport moves on to the next one. The handle delivers its outcome
//! through a single-use [`Completion`], decoupling request construction from
//! response delivery.

use thiserror::Error;
use tokio::sync::oneshot;

/// HTTP method. The account API only ever needs these two.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Method {
    Get,
    Post,
}

/// One request as the transport hands it to a connector.
///
/// `with_credentials` is always set by this crate: session continuity
/// depends on the browser-managed cookie riding along on every call.
#[derive(Clone, Debug)]
pub struct HttpRequest {
    pub method: Method,
    pub url: String,
    pub body: Option<String>,
    pub content_type: Option<&'static str>,
    pub with_credentials: bool,
}

/// Raw transport outcome before normalization. Status `0` means the request
/// never produced an HTTP response (network-level failure).
#[derive(Debug)]
pub struct RawResponse {
    pub status: u16,
    pub body: String,
}

/// Single-use completion handle for one in-flight request.
///
/// Consuming `complete` guarantees at most one resolution per request; a
/// `Completion` dropped without completing surfaces to the caller as
/// [`crate::transport::TransportError::Abandoned`].
pub struct Completion {
    tx: oneshot::Sender<RawResponse>,
}

impl Completion {
    pub(crate) fn new() -> (Self, oneshot::Receiver<RawResponse>) {
        let (tx, rx) = oneshot::channel();
        (Self { tx }, rx)
    }

    /// Deliver the outcome. The send can only fail if the originating call
    /// was dropped, in which case nobody is waiting anyway.
    pub fn complete(self, status: u16, body: impl Into<String>) {
        let _ = self.tx.send(RawResponse {
            status,
            body: body.into(),
        });
    }
}

/// Why a connector could not construct a request handle.
#[derive(Debug, Error)]
pub enum ConnectorError {
    #[error("connector unavailable: {0}")]
    Unavailable(&'static str),
}

/// One environment-specific way of issuing HTTP requests.
pub trait HttpConnector {
    /// Construct a fresh request handle, or fail if this connector cannot
    /// operate here. Failure is not an error for the transport as a whole;
    /// it just tries the next connector in its list.
    fn open(&self) -> Result<Box<dyn RequestHandle>, ConnectorError>;
}

/// A constructed, single-request handle.
pub trait RequestHandle {
    /// Issue `request` and deliver the outcome through `done`. Must not
    /// block the caller; completion happens from whatever context the
    /// underlying transport calls back on.
    fn send(self: Box<Self>, request: HttpRequest, done: Completion);
}

/// Cookie-jar credentialed connector backed by reqwest.
#[cfg(feature = "http")]
pub struct ReqwestConnector {
    client: reqwest::Client,
}

#[cfg(feature = "http")]
impl ReqwestConnector {
    /// Build the connector. The cookie store is what carries the session:
    /// the server's session cookie is captured on login and replayed on
    /// every subsequent request.
    pub fn new() -> Result<Self, ConnectorError> {
        let client = reqwest::Client::builder()
            .cookie_store(true)
            .build()
            .map_err(|_| ConnectorError::Unavailable("reqwest client construction failed"))?;
        Ok(Self { client })
    }
}

#[cfg(feature = "http")]
impl HttpConnector for ReqwestConnector {
    fn open(&self) -> Result<Box<dyn RequestHandle>, ConnectorError> {
        Ok(Box::new(ReqwestRequest {
            client: self.client.clone(),
        }))
    }
}

#[cfg(feature = "http")]
struct ReqwestRequest {
    client: reqwest::Client,
}

#[cfg(feature = "http")]
impl RequestHandle for ReqwestRequest {
    fn send(self: Box<Self>, request: HttpRequest, done: Completion) {
        let client = self.client;
        tokio::spawn(async move {
            let mut builder = match request.method {
                Method::Get => client.get(&request.url),
                Method::Post => client.post(&request.url),
            };
            if let Some(content_type) = request.content_type {
                builder = builder.header("Content-Type", content_type);
            }
            if let Some(body) = request.body {
                builder = builder.body(body);
            }
            match builder.send().await {
                Ok(response) => {
                    let status = response.status().as_u16();
                    let body = response.text().await.unwrap_or_default();
                    done.complete(status, body);
                }
                Err(err) => {
                    tracing::warn!(url = %request.url, error = %err, "network-level request failure");
                    // No HTTP response at all; normalize as status 0 so the
                    // caller sees it on the ordinary non-success path.
                    done.complete(0, "");
                }
            }
        });
    }
}
