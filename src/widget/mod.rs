//! Widget factory, registry, and per-instance handles.
//!
//! The manager owns the only id-keyed registry; widget instances never
//! listen for inbound messages themselves. All widget-originated traffic
//! funnels through [`WidgetManager::dispatch`] (reached via
//! [`crate::Client::handle_message`]), which validates the source tag and
//! the sender origin before routing by id.

pub mod dom;
pub mod message;

use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::rc::{Rc, Weak};

use serde_json::Value;
use thiserror::Error;
use tokio::sync::oneshot;
use url::Url;

use crate::config::{routes, ClientConfig};
use dom::{ContainerNode, DomHost, EmbedStyle, EmbeddedFrame};
use message::WidgetEvent;

/// Widget lifecycle failures.
#[derive(Debug, Error)]
pub enum WidgetError {
    /// The target selector matched nothing. Raised before any frame is
    /// created.
    #[error("no element matches selector {0:?}")]
    TargetNotFound(String),

    /// The embed URL could not be built from the configured widget base.
    #[error("invalid embed URL: {0}")]
    EmbedUrl(#[from] url::ParseError),

    /// The widget was destroyed while its creation was still waiting for
    /// the load signal.
    #[error("widget {0} destroyed before it finished loading")]
    DestroyedBeforeLoad(String),
}

/// Where to attach a new widget.
pub enum WidgetTarget {
    /// Resolve via [`DomHost::resolve`] at creation time.
    Selector(String),
    /// Attach under an already-resolved node.
    Node(Rc<dyn ContainerNode>),
}

impl From<&str> for WidgetTarget {
    fn from(selector: &str) -> Self {
        Self::Selector(selector.to_string())
    }
}

struct WidgetInner {
    id: String,
    name: String,
    /// scheme+host+port of the embed URL; every outbound message is scoped
    /// to exactly this origin.
    origin: String,
    parent: Rc<dyn ContainerNode>,
    frame: Rc<dyn EmbeddedFrame>,
    destroyed: Cell<bool>,
    registry: Weak<RefCell<Registry>>,
}

/// Handle to one embedded widget. Cheap to clone; all clones refer to the
/// same instance.
#[derive(Clone)]
pub struct Widget {
    inner: Rc<WidgetInner>,
}

impl std::fmt::Debug for Widget {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Widget")
            .field("id", &self.inner.id)
            .field("name", &self.inner.name)
            .field("origin", &self.inner.origin)
            .field("destroyed", &self.inner.destroyed.get())
            .finish()
    }
}

impl Widget {
    pub fn id(&self) -> &str {
        &self.inner.id
    }

    pub fn name(&self) -> &str {
        &self.inner.name
    }

    /// The embed origin every message to this widget is scoped to.
    pub fn origin(&self) -> &str {
        &self.inner.origin
    }

    /// Push a configuration delta into the embedded context.
    pub fn set_config(&self, delta: &Value) {
        self.send(message::ACTION_SET_CONFIG, delta.clone());
    }

    /// Push a stylesheet into the embedded context.
    pub fn set_css(&self, css: &str) {
        self.send(message::ACTION_SET_CSS, Value::String(css.to_string()));
    }

    /// Resize the embedding container. The width is floored at the parent
    /// container's current width. No-op after destroy.
    pub fn set_size(&self, width: u32, height: u32) {
        if self.inner.destroyed.get() {
            return;
        }
        let width = width.max(self.inner.parent.width());
        tracing::debug!(id = %self.inner.id, width, height, "resizing widget");
        self.inner.frame.set_size(width, height);
    }

    /// Detach the embedding container and remove this instance from its
    /// manager's registry. Messages referencing this id are dropped from
    /// now on. Idempotent.
    pub fn destroy(&self) {
        if self.inner.destroyed.replace(true) {
            return;
        }
        tracing::debug!(id = %self.inner.id, "destroying widget");
        self.inner.frame.detach();
        if let Some(registry) = self.inner.registry.upgrade() {
            registry.borrow_mut().entries.remove(&self.inner.id);
        }
    }

    fn send(&self, action: &str, data: Value) {
        if self.inner.destroyed.get() {
            return;
        }
        let msg = message::parent_message(action, data);
        self.inner.frame.post_message(&msg, &self.inner.origin);
    }
}

struct Entry {
    widget: Widget,
    /// Present until the widget reports `loaded`; completing it resumes the
    /// pending `create` call.
    load_tx: Option<oneshot::Sender<()>>,
}

struct Registry {
    entries: HashMap<String, Entry>,
    next_id: u64,
}

/// Factory and id-keyed registry for embedded widgets.
#[derive(Clone)]
pub struct WidgetManager {
    config: ClientConfig,
    dom: Rc<dyn DomHost>,
    registry: Rc<RefCell<Registry>>,
}

impl WidgetManager {
    pub(crate) fn new(config: ClientConfig, dom: Rc<dyn DomHost>) -> Self {
        Self {
            config,
            dom,
            registry: Rc::new(RefCell::new(Registry {
                entries: HashMap::new(),
                next_id: 1,
            })),
        }
    }

    /// Create a widget named `name` under `target`.
    ///
    /// The instance is registered before its content loads, so inbound
    /// messages referencing it during load are not lost. The returned
    /// future settles only once the widget reports `loaded`; `config` and
    /// `css`, when supplied, are pushed right before it resolves. There is
    /// no load timeout.
    pub async fn create(
        &self,
        name: &str,
        target: WidgetTarget,
        config: Option<Value>,
        css: Option<&str>,
    ) -> Result<Widget, WidgetError> {
        let parent = match target {
            WidgetTarget::Node(node) => node,
            WidgetTarget::Selector(selector) => self
                .dom
                .resolve(&selector)
                .ok_or(WidgetError::TargetNotFound(selector))?,
        };

        let id = {
            let mut registry = self.registry.borrow_mut();
            let n = registry.next_id;
            registry.next_id += 1;
            format!("wid_{n}")
        };

        let url = self.embed_url(&id, name)?;
        let origin = url.origin().ascii_serialization();
        let frame = self
            .dom
            .create_frame(&parent, url.as_str(), &EmbedStyle::default());

        let widget = Widget {
            inner: Rc::new(WidgetInner {
                id: id.clone(),
                name: name.to_string(),
                origin,
                parent,
                frame,
                destroyed: Cell::new(false),
                registry: Rc::downgrade(&self.registry),
            }),
        };

        let (load_tx, load_rx) = oneshot::channel();
        self.registry.borrow_mut().entries.insert(
            id.clone(),
            Entry {
                widget: widget.clone(),
                load_tx: Some(load_tx),
            },
        );

        tracing::debug!(id = %id, name, "widget registered, waiting for load");
        load_rx
            .await
            .map_err(|_| WidgetError::DestroyedBeforeLoad(id))?;

        if let Some(delta) = config {
            widget.set_config(&delta);
        }
        if let Some(css) = css {
            widget.set_css(css);
        }
        Ok(widget)
    }

    /// Look up a live widget by id.
    pub fn get(&self, id: &str) -> Option<Widget> {
        self.registry
            .borrow()
            .entries
            .get(id)
            .map(|entry| entry.widget.clone())
    }

    /// Route one inbound cross-window message.
    ///
    /// Anything without the widget source tag is ignored without error.
    /// Recognized events are dropped unless `origin` equals the embed
    /// origin recorded for that widget at creation time, and unless the id
    /// is still registered.
    pub(crate) fn dispatch(&self, raw: &Value, origin: &str) {
        let Some(event) = WidgetEvent::parse(raw) else {
            tracing::debug!("ignoring message without a recognized widget event");
            return;
        };

        let widget = {
            let registry = self.registry.borrow();
            registry.entries.get(event.id()).map(|e| e.widget.clone())
        };
        let Some(widget) = widget else {
            tracing::debug!(id = event.id(), "dropping message for unknown widget id");
            return;
        };
        if widget.origin() != origin {
            tracing::warn!(
                id = event.id(),
                expected = widget.origin(),
                got = origin,
                "dropping widget message from unexpected origin"
            );
            return;
        }

        match event {
            WidgetEvent::Loaded { id } => {
                let load_tx = {
                    let mut registry = self.registry.borrow_mut();
                    registry
                        .entries
                        .get_mut(&id)
                        .and_then(|entry| entry.load_tx.take())
                };
                if let Some(tx) = load_tx {
                    let _ = tx.send(());
                }
            }
            WidgetEvent::Resize { width, height, .. } => {
                widget.set_size(width, height);
            }
        }
    }

    fn embed_url(&self, id: &str, name: &str) -> Result<Url, url::ParseError> {
        let mut url = self.config.widget_base.join(&routes().widget.embed)?;
        url.query_pairs_mut()
            .append_pair("wid", id)
            // Widgets created through the manager are always embedded, never
            // standalone-displayed.
            .append_pair("standalone", "false")
            .append_pair("name", name)
            .append_pair("key", &self.config.app_key);
        Ok(url)
    }
}
