#![allow(dead_code)]

use std::cell::{Cell, RefCell};
use std::collections::{HashMap, VecDeque};
use std::rc::Rc;

use serde_json::{json, Map, Value};
use url::Url;

use embed_client::transport::{
    Completion, ConnectorError, HttpConnector, HttpRequest, Method, RequestHandle, Transport,
};
use embed_client::widget::dom::{ContainerNode, DomHost, EmbedStyle, EmbeddedFrame};
use embed_client::{Client, ClientConfig};

pub const API_BASE: &str = "https://api.test/v1";
pub const WIDGET_BASE: &str = "https://widgets.test";
/// The origin every widget embed URL parses to under [`WIDGET_BASE`].
pub const WIDGET_ORIGIN: &str = "https://widgets.test";
pub const APP_KEY: &str = "pk_test_key";

pub fn test_config() -> ClientConfig {
    ClientConfig::new(
        APP_KEY,
        Url::parse(API_BASE).expect("api base"),
        Url::parse(WIDGET_BASE).expect("widget base"),
    )
}

// ---------------------------------------------------------------------------
// Scripted connector: canned replies in order, plus a request log.
// ---------------------------------------------------------------------------

#[derive(Clone, Default)]
pub struct ScriptedConnector {
    replies: Rc<RefCell<VecDeque<(u16, String)>>>,
    log: Rc<RefCell<Vec<HttpRequest>>>,
}

impl ScriptedConnector {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push_reply(&self, status: u16, body: impl Into<String>) {
        self.replies.borrow_mut().push_back((status, body.into()));
    }

    pub fn requests(&self) -> Vec<HttpRequest> {
        self.log.borrow().clone()
    }
}

impl HttpConnector for ScriptedConnector {
    fn open(&self) -> Result<Box<dyn RequestHandle>, ConnectorError> {
        Ok(Box::new(ScriptedRequest {
            replies: self.replies.clone(),
            log: self.log.clone(),
        }))
    }
}

struct ScriptedRequest {
    replies: Rc<RefCell<VecDeque<(u16, String)>>>,
    log: Rc<RefCell<Vec<HttpRequest>>>,
}

impl RequestHandle for ScriptedRequest {
    fn send(self: Box<Self>, request: HttpRequest, done: Completion) {
        self.log.borrow_mut().push(request);
        let (status, body) = self
            .replies
            .borrow_mut()
            .pop_front()
            .expect("scripted connector ran out of replies");
        done.complete(status, body);
    }
}

/// A connector that can never construct a request handle.
pub struct UnavailableConnector;

impl HttpConnector for UnavailableConnector {
    fn open(&self) -> Result<Box<dyn RequestHandle>, ConnectorError> {
        Err(ConnectorError::Unavailable("not supported here"))
    }
}

/// A connector whose requests are accepted and then dropped on the floor.
pub struct AbandoningConnector;

impl HttpConnector for AbandoningConnector {
    fn open(&self) -> Result<Box<dyn RequestHandle>, ConnectorError> {
        Ok(Box::new(AbandoningRequest))
    }
}

struct AbandoningRequest;

impl RequestHandle for AbandoningRequest {
    fn send(self: Box<Self>, _request: HttpRequest, done: Completion) {
        drop(done);
    }
}

// ---------------------------------------------------------------------------
// Fake account API: in-memory users, key/value data, and a session slot that
// stands in for the browser cookie jar.
// ---------------------------------------------------------------------------

struct FakeUser {
    id: String,
    email: String,
    password: String,
    data: Map<String, Value>,
    subscriptions: Vec<String>,
}

#[derive(Default)]
struct FakeApiState {
    users: Vec<FakeUser>,
    /// Email of the logged-in user. Plays the role of the session cookie:
    /// set on login, cleared on logout, consulted by every data route.
    session: Option<String>,
    next_id: u64,
}

#[derive(Clone, Default)]
pub struct FakeApi {
    state: Rc<RefCell<FakeApiState>>,
}

impl FakeApi {
    pub fn new() -> Self {
        Self::default()
    }

    /// Mark `email` as subscribed to `plan` (server-side fixture tweak).
    pub fn add_subscription(&self, email: &str, plan: &str) {
        let mut state = self.state.borrow_mut();
        if let Some(user) = state.users.iter_mut().find(|u| u.email == email) {
            user.subscriptions.push(plan.to_string());
        }
    }

    pub fn connector(&self) -> FakeApiConnector {
        FakeApiConnector {
            state: self.state.clone(),
        }
    }
}

#[derive(Clone)]
pub struct FakeApiConnector {
    state: Rc<RefCell<FakeApiState>>,
}

impl HttpConnector for FakeApiConnector {
    fn open(&self) -> Result<Box<dyn RequestHandle>, ConnectorError> {
        Ok(Box::new(FakeApiRequest {
            state: self.state.clone(),
        }))
    }
}

struct FakeApiRequest {
    state: Rc<RefCell<FakeApiState>>,
}

impl RequestHandle for FakeApiRequest {
    fn send(self: Box<Self>, request: HttpRequest, done: Completion) {
        assert!(
            request.with_credentials,
            "every account request must be credentialed"
        );
        let path = request
            .url
            .split('?')
            .next()
            .and_then(|base| base.strip_prefix(API_BASE))
            .map(|p| p.trim_start_matches('/').to_string())
            .unwrap_or_default();
        let body: Value = request
            .body
            .as_deref()
            .map(|raw| serde_json::from_str(raw).expect("request body is JSON"))
            .unwrap_or(Value::Null);

        let (status, reply) = route(&mut self.state.borrow_mut(), request.method, &path, &body);
        done.complete(status, reply.to_string());
    }
}

fn field<'a>(body: &'a Value, name: &str) -> &'a str {
    body.get(name).and_then(Value::as_str).unwrap_or_default()
}

fn route(state: &mut FakeApiState, method: Method, path: &str, body: &Value) -> (u16, Value) {
    match (method, path) {
        (Method::Post, "user/signup") => {
            let email = field(body, "email");
            if state.users.iter().any(|u| u.email == email) {
                return (409, json!({ "error": "user already exists" }));
            }
            state.next_id += 1;
            let id = format!("acc_{}", state.next_id);
            state.users.push(FakeUser {
                id: id.clone(),
                email: email.to_string(),
                password: field(body, "password").to_string(),
                data: Map::new(),
                subscriptions: Vec::new(),
            });
            (200, json!({ "id": id }))
        }
        (Method::Post, "user/login") => {
            let email = field(body, "email");
            let Some(user) = state.users.iter().find(|u| u.email == email) else {
                return (404, json!({ "error": "not found" }));
            };
            if user.password != field(body, "password") {
                return (401, json!({ "error": "invalid credentials" }));
            }
            let reply = json!({ "id": user.id, "email": user.email });
            state.session = Some(email.to_string());
            (200, reply)
        }
        (Method::Post, "user/logout") => {
            if state.session.take().is_none() {
                return (404, json!({ "error": "no session found" }));
            }
            (200, json!({}))
        }
        (Method::Get, "user/data") => {
            let Some(user) = current_user(state) else {
                return (404, json!({ "error": "no session found" }));
            };
            (
                200,
                json!({
                    "id": user.id,
                    "email": user.email,
                    "subscriptions": user.subscriptions,
                    "data": user.data,
                }),
            )
        }
        (Method::Post, "user/data") => {
            let key = field(body, "key").to_string();
            let value = body.get("value").cloned().unwrap_or(Value::Null);
            let Some(user) = current_user_mut(state) else {
                return (404, json!({ "error": "no session found" }));
            };
            user.data.insert(key, value);
            (200, json!({}))
        }
        (Method::Post, "user/email") => {
            let new_email = field(body, "email").to_string();
            let password = field(body, "password").to_string();
            let Some(user) = current_user_mut(state) else {
                return (404, json!({ "error": "no session found" }));
            };
            if user.password != password {
                return (401, json!({ "error": "invalid credentials" }));
            }
            user.email = new_email.clone();
            state.session = Some(new_email);
            (200, json!({}))
        }
        (Method::Post, "user/password") => {
            let old = field(body, "old_password").to_string();
            let new = field(body, "new_password").to_string();
            let Some(user) = current_user_mut(state) else {
                return (404, json!({ "error": "no session found" }));
            };
            if user.password != old {
                return (401, json!({ "error": "invalid credentials" }));
            }
            user.password = new;
            (200, json!({}))
        }
        _ => (404, json!({ "error": "not found" })),
    }
}

fn current_user(state: &FakeApiState) -> Option<&FakeUser> {
    let email = state.session.as_deref()?;
    state.users.iter().find(|u| u.email == email)
}

fn current_user_mut(state: &mut FakeApiState) -> Option<&mut FakeUser> {
    let email = state.session.clone()?;
    state.users.iter_mut().find(|u| u.email == email)
}

// ---------------------------------------------------------------------------
// Recording DOM host.
// ---------------------------------------------------------------------------

pub struct MockNode {
    pub width: Cell<u32>,
}

impl ContainerNode for MockNode {
    fn width(&self) -> u32 {
        self.width.get()
    }
}

pub struct MockFrame {
    pub url: String,
    pub style: EmbedStyle,
    /// (message, target origin) pairs in post order.
    pub posted: RefCell<Vec<(Value, String)>>,
    pub size: Cell<Option<(u32, u32)>>,
    pub detached: Cell<bool>,
}

impl EmbeddedFrame for MockFrame {
    fn post_message(&self, message: &Value, target_origin: &str) {
        self.posted
            .borrow_mut()
            .push((message.clone(), target_origin.to_string()));
    }

    fn set_size(&self, width: u32, height: u32) {
        self.size.set(Some((width, height)));
    }

    fn detach(&self) {
        self.detached.set(true);
    }
}

#[derive(Default)]
pub struct MockDom {
    nodes: RefCell<HashMap<String, Rc<MockNode>>>,
    pub frames: RefCell<Vec<Rc<MockFrame>>>,
}

impl MockDom {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_node(&self, selector: &str, width: u32) -> Rc<MockNode> {
        let node = Rc::new(MockNode {
            width: Cell::new(width),
        });
        self.nodes
            .borrow_mut()
            .insert(selector.to_string(), node.clone());
        node
    }

    pub fn frame(&self, index: usize) -> Rc<MockFrame> {
        self.frames.borrow()[index].clone()
    }
}

impl DomHost for MockDom {
    fn resolve(&self, selector: &str) -> Option<Rc<dyn ContainerNode>> {
        self.nodes
            .borrow()
            .get(selector)
            .map(|node| node.clone() as Rc<dyn ContainerNode>)
    }

    fn create_frame(
        &self,
        _parent: &Rc<dyn ContainerNode>,
        url: &str,
        style: &EmbedStyle,
    ) -> Rc<dyn EmbeddedFrame> {
        let frame = Rc::new(MockFrame {
            url: url.to_string(),
            style: *style,
            posted: RefCell::new(Vec::new()),
            size: Cell::new(None),
            detached: Cell::new(false),
        });
        self.frames.borrow_mut().push(frame.clone());
        frame
    }
}

// ---------------------------------------------------------------------------
// Client wiring helpers.
// ---------------------------------------------------------------------------

/// Client over the fake API and a recording DOM, plus handles to both.
pub fn test_client() -> (Client, FakeApi, Rc<MockDom>) {
    let api = FakeApi::new();
    let dom = Rc::new(MockDom::new());
    let transport = Transport::new(vec![Box::new(api.connector())]);
    let client = Client::with_transport(test_config(), dom.clone(), transport);
    (client, api, dom)
}

/// A widget-originated wire message.
pub fn widget_message(action: &str, data: Value) -> Value {
    json!({ "source": "widget", "action": action, "data": data })
}
