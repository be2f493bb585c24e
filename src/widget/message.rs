//! Cross-window message envelopes.
//!
//! Both directions use the same plain-object shape on the wire:
//!
//! ```text
//! { "source": "parent" | "widget", "action": <string>, "data": <payload> }
//! ```
//!
//! The `source` discriminator is what lets the single inbound receiver
//! ignore unrelated window traffic without error.

use serde::Deserialize;
use serde_json::{json, Value};

/// `source` tag on parent-originated messages.
pub const SOURCE_PARENT: &str = "parent";
/// `source` tag on widget-originated messages.
pub const SOURCE_WIDGET: &str = "widget";

/// Parent → widget: push a configuration delta.
pub const ACTION_SET_CONFIG: &str = "set-config";
/// Parent → widget: push a stylesheet.
pub const ACTION_SET_CSS: &str = "set-css";

/// Widget → parent: the embedded content finished loading.
pub const ACTION_LOADED: &str = "loaded";
/// Widget → parent: request a container resize.
pub const ACTION_RESIZE: &str = "resize";

/// Build one parent-originated wire message.
pub fn parent_message(action: &str, data: Value) -> Value {
    json!({
        "source": SOURCE_PARENT,
        "action": action,
        "data": data,
    })
}

#[derive(Deserialize)]
struct InboundEnvelope {
    source: String,
    action: String,
    #[serde(default)]
    data: Value,
}

#[derive(Deserialize)]
struct LoadedPayload {
    id: String,
}

#[derive(Deserialize)]
struct ResizePayload {
    id: String,
    width: u32,
    height: u32,
}

/// A recognized widget-originated event.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum WidgetEvent {
    Loaded { id: String },
    Resize { id: String, width: u32, height: u32 },
}

impl WidgetEvent {
    /// Parse a raw cross-window message. Returns `None` for anything that
    /// is not a well-formed, widget-originated event; such messages are
    /// dropped without error by the receiver.
    pub fn parse(raw: &Value) -> Option<Self> {
        let envelope: InboundEnvelope = serde_json::from_value(raw.clone()).ok()?;
        if envelope.source != SOURCE_WIDGET {
            return None;
        }
        match envelope.action.as_str() {
            ACTION_LOADED => {
                let payload: LoadedPayload = serde_json::from_value(envelope.data).ok()?;
                Some(Self::Loaded { id: payload.id })
            }
            ACTION_RESIZE => {
                let payload: ResizePayload = serde_json::from_value(envelope.data).ok()?;
                Some(Self::Resize {
                    id: payload.id,
                    width: payload.width,
                    height: payload.height,
                })
            }
            _ => None,
        }
    }

    /// The widget id the event refers to.
    pub fn id(&self) -> &str {
        match self {
            Self::Loaded { id } | Self::Resize { id, .. } => id,
        }
    }
}
