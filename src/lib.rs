//! # embed_client
//!
//! A browser-embeddable client library in three pieces:
//!
//! - An **event bus**: ordered, removable listeners with early termination
//! - An **account client**: credentialed JSON calls to an account API,
//!   normalized into a uniform `{status, data}` envelope
//! - A **widget layer**: sandboxed iframe-style widgets driven over a
//!   structured cross-window messaging protocol
//!
//! The crate is transport- and DOM-agnostic: HTTP goes through a pluggable
//! connector chain (a reqwest-backed connector ships behind the default
//! `http` feature) and the document is reached only through the capability
//! traits in [`widget::dom`]. That keeps the whole library runnable, and
//! testable, without a browser.
//!
//! ---
//!
//! ## The envelope
//!
//! Every HTTP outcome, success or failure, settles into the same shape:
//!
//! ```text
//! { status: <u16>, data: <parsed JSON body, when present> }
//! ```
//!
//! HTTP 200 and 304 resolve; every other status rejects with
//! [`TransportError::Status`] carrying the same envelope, so callers branch
//! on `status` and the machine-usable category in `data.error`
//! (`"user already exists"`, `"no session found"`, ...). Observed codes:
//! 409 = duplicate account, 404 = no such session/account, 200 = success.
//!
//! ### Most important gotchas (read this first)
//!
//! - **Sessions are cookies, not tokens.** Every request is credentialed;
//!   the client never holds login state. [`account::AccountClient::is_logged_in`]
//!   is operational (it asks the API) and is the one call that never
//!   errors (any rejection resolves to `false`).
//! - **Nothing here times out.** No retry, no backoff, no cancellation. A
//!   connector that never completes leaves the call pending; resilience
//!   policy belongs to you.
//! - **Order your own calls.** Two account calls issued back-to-back are
//!   not ordered relative to each other. If you need login-before-get,
//!   await the first call before issuing the second.
//!
//! ---
//!
//! ## Quick start
//!
//! The embedder supplies the DOM capability; everything else is wired by
//! [`Client`]:
//!
//! ```no_run
//! use std::rc::Rc;
//!
//! use embed_client::widget::dom::{ContainerNode, DomHost, EmbedStyle, EmbeddedFrame};
//! use embed_client::{Client, ClientConfig};
//! use serde_json::{json, Value};
//! use url::Url;
//!
//! struct Node;
//! impl ContainerNode for Node {
//!     fn width(&self) -> u32 {
//!         640
//!     }
//! }
//!
//! struct Frame;
//! impl EmbeddedFrame for Frame {
//!     fn post_message(&self, _message: &Value, _target_origin: &str) {}
//!     fn set_size(&self, _width: u32, _height: u32) {}
//!     fn detach(&self) {}
//! }
//!
//! struct Document;
//! impl DomHost for Document {
//!     fn resolve(&self, _selector: &str) -> Option<Rc<dyn ContainerNode>> {
//!         Some(Rc::new(Node))
//!     }
//!     fn create_frame(
//!         &self,
//!         _parent: &Rc<dyn ContainerNode>,
//!         _url: &str,
//!         _style: &EmbedStyle,
//!     ) -> Rc<dyn EmbeddedFrame> {
//!         Rc::new(Frame)
//!     }
//! }
//!
//! #[tokio::main(flavor = "current_thread")]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = ClientConfig::new(
//!         "pk_live_example",
//!         Url::parse("https://api.example.com/v1")?,
//!         Url::parse("https://widgets.example.com")?,
//!     );
//!     let client = Client::new(config, Rc::new(Document));
//!
//!     client.account().signup("user@example.com", "hunter2").await?;
//!     client.account().set("theme", json!("dark")).await?;
//!     let info = client.account().get_info().await?;
//!     eprintln!("signed up as {}", info.email);
//!     Ok(())
//! }
//! ```
//!
//! ### Reacting to lifecycle events
//!
//! `signup`, `login`, and `logout` fire on the client bus, and only on
//! success. Listeners run synchronously, in ascending order, and may halt an
//! emission by returning `ControlFlow::Break(())`:
//!
//! ```
//! use std::ops::ControlFlow;
//! use std::rc::Rc;
//!
//! use embed_client::account::events;
//! use embed_client::bus::{Callback, EventBus};
//!
//! let bus = EventBus::new();
//! let greet: Callback = Rc::new(|_args| {
//!     eprintln!("welcome back");
//!     ControlFlow::Continue(())
//! });
//! bus.on(events::LOGIN, greet.clone());
//! assert!(bus.has_listeners(events::LOGIN));
//! bus.off(events::LOGIN, &greet, None);
//! ```
//!
//! ---
//!
//! ## The widget protocol
//!
//! Widgets run in a separate, memory-isolated context; the only channel is
//! structured messages:
//!
//! ```text
//! { "source": "parent" | "widget", "action": <string>, "data": <payload> }
//! ```
//!
//! Parent → widget sends (`set-config`, `set-css`) are scoped to the exact
//! origin parsed from the embed URL at creation time, never a wildcard, so
//! a navigated frame cannot receive your configuration.
//!
//! Widget → parent traffic (`loaded`, `resize`) funnels through the single
//! entry point [`Client::handle_message`]. The embedder wires its one
//! message listener to it; individual widgets never listen. The handler
//! ignores anything without the widget source tag, drops ids that were
//! destroyed, and rejects messages whose sender origin does not match the
//! widget's embed origin.
//!
//! `create_widget` registers the instance *before* its content loads (so
//! early messages are not lost) and resolves only once the widget reports
//! `loaded`. There is no load timeout.
//!
//! ---
//!
//! ## Crate layout
//!
//! - [`bus`]: ordered listener registry.
//! - [`transport`]: connector chain, completion handle, normalization.
//! - [`account`]: account lifecycle calls + event names.
//! - [`widget`]: manager, instances, DOM capability traits, wire messages.
//! - [`client`]: the facade owning all of the above.
//! - [`config`]: per-client configuration; API routes live in an embedded
//!   `endpoints.toml`.

pub mod account;
pub mod bus;
pub mod client;
pub mod config;
pub mod transport;
pub mod widget;

// -------- Facade re-exports --------

#[doc(inline)]
pub use client::Client;
#[doc(inline)]
pub use config::ClientConfig;

// -------- Common types --------

#[doc(inline)]
pub use account::{AccountClient, AccountInfo};
#[doc(inline)]
pub use bus::{Callback, Context, EventBus};
#[doc(inline)]
pub use transport::{Envelope, Transport, TransportError};
#[doc(inline)]
pub use widget::{Widget, WidgetError, WidgetManager, WidgetTarget};
