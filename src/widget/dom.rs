//! DOM capability traits.
//!
//! The crate never touches a real document. The embedder supplies a
//! [`DomHost`] for whatever environment it runs in (a browser binding, a
//! test double, a headless shell) and the widget layer drives it through
//! these traits only.

use std::rc::Rc;

use serde_json::Value;

/// Visual contract for the embedding container: borderless, transparent,
/// block-level, and hidden until the widget decides otherwise.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct EmbedStyle {
    pub border: bool,
    pub transparent: bool,
    pub block: bool,
    pub visible: bool,
}

impl Default for EmbedStyle {
    fn default() -> Self {
        Self {
            border: false,
            transparent: true,
            block: true,
            visible: false,
        }
    }
}

/// A node widgets can be attached under.
pub trait ContainerNode {
    /// Current layout width. Used to floor widget widths so an embedded
    /// frame never renders narrower than its container.
    fn width(&self) -> u32;
}

/// One embedded frame plus its container element.
pub trait EmbeddedFrame {
    /// Deliver a structured message into the embedded context. The host
    /// must only deliver when the frame's current origin equals
    /// `target_origin`; a wildcard is never passed in.
    fn post_message(&self, message: &Value, target_origin: &str);

    /// Resize the embedding container.
    fn set_size(&self, width: u32, height: u32);

    /// Remove the container from the document.
    fn detach(&self);
}

/// The document-level capability the widget manager needs.
pub trait DomHost {
    /// Resolve a selector to a container node; `None` when nothing matches.
    fn resolve(&self, selector: &str) -> Option<Rc<dyn ContainerNode>>;

    /// Create an embedded frame loading `url`, styled per `style`, attached
    /// under `parent`.
    fn create_frame(
        &self,
        parent: &Rc<dyn ContainerNode>,
        url: &str,
        style: &EmbedStyle,
    ) -> Rc<dyn EmbeddedFrame>;
}
