//! Top-level facade.
//!
//! One [`Client`] owns one event bus, one account client, and one widget
//! registry; independent clients share nothing. The client is also the only
//! code path that receives cross-window messages: the embedder wires its
//! single message listener to [`Client::handle_message`], which centralizes
//! source and origin validation and routes by widget id.

use std::rc::Rc;

use serde_json::Value;

use crate::account::AccountClient;
use crate::bus::{Callback, Context, EventBus};
use crate::config::ClientConfig;
use crate::transport::Transport;
use crate::widget::dom::DomHost;
use crate::widget::{Widget, WidgetError, WidgetManager, WidgetTarget};

/// The embeddable client: account API, event dispatch, widget embedding.
///
/// Cheap to clone; clones share the same bus, session, and widget registry.
#[derive(Clone)]
pub struct Client {
    bus: Rc<EventBus>,
    account: AccountClient,
    widgets: WidgetManager,
}

impl Client {
    /// Build a client over the default connector chain.
    #[cfg(feature = "http")]
    pub fn new(config: ClientConfig, dom: Rc<dyn DomHost>) -> Self {
        Self::with_transport(config, dom, Transport::with_default_connectors())
    }

    /// Build a client over an explicit transport. This is the entry point
    /// for tests and for environments with their own connector.
    pub fn with_transport(config: ClientConfig, dom: Rc<dyn DomHost>, transport: Transport) -> Self {
        let bus = Rc::new(EventBus::new());
        let transport = Rc::new(transport);
        let account = AccountClient::new(transport, bus.clone(), config.clone());
        let widgets = WidgetManager::new(config, dom);
        Self {
            bus,
            account,
            widgets,
        }
    }

    /// Register a listener on the client bus.
    pub fn on(&self, event: &str, callback: Callback) {
        self.bus.on(event, callback);
    }

    /// Register a listener with an explicit context and/or order.
    pub fn on_with(
        &self,
        event: &str,
        callback: Callback,
        context: Option<Context>,
        order: Option<i32>,
    ) {
        self.bus.on_with(event, callback, context, order);
    }

    /// Remove matching listeners from the client bus.
    pub fn off(&self, event: &str, callback: &Callback, context: Option<&Context>) {
        self.bus.off(event, callback, context);
    }

    /// Emit an event on the client bus.
    pub fn emit(&self, event: &str, args: &[Value]) {
        self.bus.emit(event, args);
    }

    /// Whether any listener is registered for `event`.
    pub fn has_listeners(&self, event: &str) -> bool {
        self.bus.has_listeners(event)
    }

    /// The account API surface.
    pub fn account(&self) -> &AccountClient {
        &self.account
    }

    /// The widget registry.
    pub fn widgets(&self) -> &WidgetManager {
        &self.widgets
    }

    /// Create an embedded widget. Resolves once the widget content reports
    /// loaded; see [`WidgetManager::create`].
    pub async fn create_widget(
        &self,
        name: &str,
        target: impl Into<WidgetTarget>,
        config: Option<Value>,
        css: Option<&str>,
    ) -> Result<Widget, WidgetError> {
        self.widgets.create(name, target.into(), config, css).await
    }

    /// The single inbound cross-window message entry point.
    ///
    /// The embedder calls this with every message its window receives,
    /// along with the sender origin. Messages that are not widget-originated,
    /// reference an unknown or destroyed id, or arrive from an origin other
    /// than that widget's embed origin are dropped without error.
    pub fn handle_message(&self, raw: &Value, origin: &str) {
        self.widgets.dispatch(raw, origin);
    }
}
