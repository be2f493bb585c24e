//! Account lifecycle operations over the transport.
//!
//! Every method is a thin call into [`Transport`] plus, for the three
//! lifecycle operations, an event emission on the facade-owned bus. The
//! account client is a publisher only; it never registers listeners of its
//! own. No session token is ever held here: login state lives entirely in
//! the browser-managed cookie the transport sends with every request.

use std::rc::Rc;

use serde::Deserialize;
use serde_json::{json, Map, Value};

use crate::bus::EventBus;
use crate::config::{routes, ClientConfig};
use crate::transport::{Envelope, Transport, TransportError};

/// Event names emitted on the facade bus after successful lifecycle calls.
pub mod events {
    pub const SIGNUP: &str = "signup";
    pub const LOGIN: &str = "login";
    pub const LOGOUT: &str = "logout";
}

/// Identity fields of the logged-in account.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
pub struct AccountInfo {
    pub id: String,
    pub email: String,
    #[serde(default)]
    pub subscriptions: Vec<String>,
}

/// Typed convenience methods over the transport for the account API.
#[derive(Clone)]
pub struct AccountClient {
    transport: Rc<Transport>,
    bus: Rc<EventBus>,
    config: ClientConfig,
}

impl AccountClient {
    pub(crate) fn new(transport: Rc<Transport>, bus: Rc<EventBus>, config: ClientConfig) -> Self {
        Self {
            transport,
            bus,
            config,
        }
    }

    /// Create an account. Resolves with the new account id and emits
    /// `signup`. A duplicate email rejects with a 409 envelope carrying
    /// `data.error`.
    pub async fn signup(&self, email: &str, password: &str) -> Result<String, TransportError> {
        let url = self.endpoint(&routes().account.signup)?;
        let envelope = self
            .transport
            .post(url.as_str(), &json!({ "email": email, "password": password }))
            .await?;
        let id = envelope
            .data
            .as_ref()
            .and_then(|data| data.get("id"))
            .and_then(Value::as_str)
            .map(str::to_string)
            .ok_or_else(|| {
                TransportError::Malformed("signup response missing account id".to_string())
            })?;
        self.publish(events::SIGNUP, &envelope);
        Ok(id)
    }

    /// Authenticate. Emits `login` on success only; a failed attempt emits
    /// nothing.
    pub async fn login(&self, email: &str, password: &str) -> Result<Envelope, TransportError> {
        let url = self.endpoint(&routes().account.login)?;
        let envelope = self
            .transport
            .post(url.as_str(), &json!({ "email": email, "password": password }))
            .await?;
        self.publish(events::LOGIN, &envelope);
        Ok(envelope)
    }

    /// Terminate the session. Emits `logout` on success.
    pub async fn logout(&self) -> Result<Envelope, TransportError> {
        let url = self.endpoint(&routes().account.logout)?;
        let envelope = self.transport.post(url.as_str(), &json!({})).await?;
        self.publish(events::LOGOUT, &envelope);
        Ok(envelope)
    }

    /// Merge one key/value pair into the account's stored data.
    pub async fn set(&self, key: &str, value: Value) -> Result<Envelope, TransportError> {
        let url = self.endpoint(&routes().account.data)?;
        self.transport
            .post(url.as_str(), &json!({ "key": key, "value": value }))
            .await
    }

    /// The stored value for `key`, or `None` when the key is absent.
    pub async fn get(&self, key: &str) -> Result<Option<Value>, TransportError> {
        let all = self.get_all().await?;
        Ok(all.get(key).cloned())
    }

    /// The full key/value map stored for the account.
    pub async fn get_all(&self) -> Result<Map<String, Value>, TransportError> {
        let url = self.endpoint(&routes().account.data)?;
        self.transport
            .get_with(url.as_str(), |envelope| {
                let map = envelope
                    .data
                    .as_ref()
                    .and_then(|profile| profile.get("data"))
                    .and_then(Value::as_object)
                    .cloned()
                    .unwrap_or_default();
                Ok(map)
            })
            .await
    }

    /// Whether a session cookie currently authenticates us.
    ///
    /// This is defined as "no session", not "request failed": any rejection
    /// of the underlying call resolves to `false`. This method never errors.
    pub async fn is_logged_in(&self) -> bool {
        self.profile().await.is_ok()
    }

    /// Identity of the logged-in account. `subscriptions` defaults to empty
    /// when the API omits it.
    pub async fn get_info(&self) -> Result<AccountInfo, TransportError> {
        let envelope = self.profile().await?;
        let data = envelope.data.ok_or_else(|| {
            TransportError::Malformed("profile response missing body".to_string())
        })?;
        Ok(serde_json::from_value(data)?)
    }

    /// Change the account email. Requires the current password.
    pub async fn change_email(
        &self,
        email: &str,
        password: &str,
    ) -> Result<Envelope, TransportError> {
        let url = self.endpoint(&routes().account.email)?;
        self.transport
            .post(url.as_str(), &json!({ "email": email, "password": password }))
            .await
    }

    /// Change the account password.
    pub async fn change_password(
        &self,
        old_password: &str,
        new_password: &str,
    ) -> Result<Envelope, TransportError> {
        let url = self.endpoint(&routes().account.password)?;
        self.transport
            .post(
                url.as_str(),
                &json!({ "old_password": old_password, "new_password": new_password }),
            )
            .await
    }

    async fn profile(&self) -> Result<Envelope, TransportError> {
        let url = self.endpoint(&routes().account.data)?;
        self.transport.get(url.as_str()).await
    }

    fn endpoint(&self, path: &str) -> Result<url::Url, TransportError> {
        Ok(self.config.api_endpoint(path)?)
    }

    fn publish(&self, event: &str, envelope: &Envelope) {
        let payload = envelope.data.clone().unwrap_or(Value::Null);
        self.bus.emit(event, &[payload]);
    }
}
