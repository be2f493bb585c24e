//! Credentialed JSON transport with uniform response normalization.
//!
//! Every call, whatever the underlying connector, settles into the same
//! shape: a success resolves to an [`Envelope`] whose `data` is the parsed
//! JSON body, and any non-success status rejects with
//! [`TransportError::Status`] carrying the same envelope, so callers branch
//! on `status` and `data.error` instead of connector-specific failures.
//!
//! There is no timeout, retry, or cancellation here. A request whose
//! connector never completes it leaves the call pending; resilience policy
//! belongs to the caller.

pub mod connector;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

pub use connector::{
    Completion, ConnectorError, HttpConnector, HttpRequest, Method, RawResponse, RequestHandle,
};
#[cfg(feature = "http")]
pub use connector::ReqwestConnector;

/// The uniform `{status, data}` wrapper every transport outcome settles into.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Envelope {
    pub status: u16,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
}

impl Envelope {
    /// Success means HTTP 200 or 304; everything else is a failure.
    pub fn is_success(&self) -> bool {
        matches!(self.status, 200 | 304)
    }

    /// The machine-usable failure category the API puts in `data.error`
    /// (e.g. `"user already exists"`, `"no session found"`).
    pub fn error_code(&self) -> Option<&str> {
        self.data.as_ref()?.get("error")?.as_str()
    }
}

/// Transport failure taxonomy.
#[derive(Debug, Error)]
pub enum TransportError {
    /// No connector in the chain could construct a request handle; nothing
    /// was sent.
    #[error("no usable request connector in this environment")]
    NoConnector,

    /// The request completed with a non-success status. Carries the full
    /// envelope so callers can branch on `status` and `data.error`.
    #[error("request failed with status {}", .0.status)]
    Status(Envelope),

    /// JSON serialization of a request body, or parsing of a successful
    /// response body, failed.
    #[error("JSON serialization or parsing failed: {0}")]
    Json(#[from] serde_json::Error),

    /// The connector dropped its completion handle without delivering an
    /// outcome.
    #[error("request abandoned before completion")]
    Abandoned,

    /// A successful response was missing a field the operation requires.
    #[error("malformed response payload: {0}")]
    Malformed(String),

    /// An endpoint URL could not be built from the configured base.
    #[error("invalid endpoint URL: {0}")]
    Url(#[from] url::ParseError),
}

impl TransportError {
    /// The response envelope, when this error carries one.
    pub fn envelope(&self) -> Option<&Envelope> {
        match self {
            Self::Status(envelope) => Some(envelope),
            _ => None,
        }
    }

    /// Shorthand for the HTTP status of a [`TransportError::Status`].
    pub fn status(&self) -> Option<u16> {
        self.envelope().map(|e| e.status)
    }
}

/// The request pipeline: an ordered connector chain plus normalization.
pub struct Transport {
    connectors: Vec<Box<dyn HttpConnector>>,
}

impl Transport {
    /// Build a transport over an ordered connector chain. Per request, the
    /// first connector whose `open` succeeds is used; order matters.
    pub fn new(connectors: Vec<Box<dyn HttpConnector>>) -> Self {
        Self { connectors }
    }

    /// The default chain: the reqwest-backed connector alone. If it cannot
    /// be constructed every call fails with [`TransportError::NoConnector`].
    #[cfg(feature = "http")]
    pub fn with_default_connectors() -> Self {
        let mut connectors: Vec<Box<dyn HttpConnector>> = Vec::new();
        if let Ok(connector) = ReqwestConnector::new() {
            connectors.push(Box::new(connector));
        }
        Self::new(connectors)
    }

    /// Credentialed GET.
    pub async fn get(&self, url: &str) -> Result<Envelope, TransportError> {
        self.dispatch(HttpRequest {
            method: Method::Get,
            url: url.to_string(),
            body: None,
            content_type: None,
            with_credentials: true,
        })
        .await
    }

    /// Credentialed GET with a transform applied to the success envelope.
    /// The transform never sees error envelopes; its own error rejects the
    /// call.
    pub async fn get_with<T>(
        &self,
        url: &str,
        transform: impl FnOnce(Envelope) -> Result<T, TransportError>,
    ) -> Result<T, TransportError> {
        transform(self.get(url).await?)
    }

    /// Credentialed POST of `data` serialized as JSON.
    pub async fn post(&self, url: &str, data: &Value) -> Result<Envelope, TransportError> {
        self.dispatch(HttpRequest {
            method: Method::Post,
            url: url.to_string(),
            body: Some(serde_json::to_string(data)?),
            content_type: Some("application/json"),
            with_credentials: true,
        })
        .await
    }

    /// Credentialed POST with a transform applied to the success envelope.
    pub async fn post_with<T>(
        &self,
        url: &str,
        data: &Value,
        transform: impl FnOnce(Envelope) -> Result<T, TransportError>,
    ) -> Result<T, TransportError> {
        transform(self.post(url, data).await?)
    }

    async fn dispatch(&self, request: HttpRequest) -> Result<Envelope, TransportError> {
        let handle = self.construct()?;
        let (done, completed) = Completion::new();
        tracing::debug!(method = ?request.method, url = %request.url, "dispatching request");
        handle.send(request, done);
        let raw = completed.await.map_err(|_| TransportError::Abandoned)?;
        normalize(raw)
    }

    fn construct(&self) -> Result<Box<dyn RequestHandle>, TransportError> {
        for connector in &self.connectors {
            match connector.open() {
                Ok(handle) => return Ok(handle),
                Err(err) => tracing::debug!(error = %err, "connector unavailable, trying next"),
            }
        }
        Err(TransportError::NoConnector)
    }
}

/// Build the envelope and split success from failure.
///
/// On the success path a non-empty body that is not valid JSON is an error;
/// on the failure path the body parse is best-effort, since the status
/// rejection is the signal that matters.
fn normalize(raw: RawResponse) -> Result<Envelope, TransportError> {
    let success = matches!(raw.status, 200 | 304);
    let body = raw.body.trim();
    let data = if body.is_empty() {
        None
    } else if success {
        Some(serde_json::from_str(body)?)
    } else {
        serde_json::from_str(body).ok()
    };

    let envelope = Envelope {
        status: raw.status,
        data,
    };
    if success {
        Ok(envelope)
    } else {
        Err(TransportError::Status(envelope))
    }
}
