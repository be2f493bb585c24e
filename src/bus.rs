//! In-process publish/subscribe with ordered, removable listeners.
//!
//! The bus is fully synchronous: `emit` invokes every listener for the event
//! name, in order, before it returns. Listeners run on the caller's stack and
//! a listener panic propagates to the emitter untouched.
//!
//! Listener identity is pointer identity. Keep a clone of the [`Callback`]
//! you registered if you intend to remove it later:
//!
//! ```
//! use std::ops::ControlFlow;
//! use std::rc::Rc;
//! use embed_client::bus::{Callback, EventBus};
//! use serde_json::json;
//!
//! let bus = EventBus::new();
//! let cb: Callback = Rc::new(|args| {
//!     assert_eq!(args[0], json!("hi"));
//!     ControlFlow::Continue(())
//! });
//! bus.on("greet", cb.clone());
//! bus.emit("greet", &[json!("hi")]);
//! bus.off("greet", &cb, None);
//! assert!(!bus.has_listeners("greet"));
//! ```

use std::any::Any;
use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::ops::ControlFlow;
use std::rc::Rc;

use serde_json::Value;

/// A listener. Returning `ControlFlow::Break(())` halts dispatch of the
/// current emission; `Continue(())` lets it proceed.
pub type Callback = Rc<dyn Fn(&[Value]) -> ControlFlow<()>>;

/// Opaque registration context. Listeners registered with a context are only
/// removed when `off` is called with the same context (pointer identity).
pub type Context = Rc<dyn Any>;

struct Listener {
    callback: Callback,
    context: Option<Context>,
    order: Option<i32>,
    /// Registration sequence number; unique per bus, used both as the sort
    /// tie-break and as the identity token during dispatch.
    seq: u64,
}

impl Listener {
    /// Sort key: explicit orders ascending, unordered listeners after every
    /// ordered one, registration order breaking ties.
    fn rank(&self) -> (bool, i32, u64) {
        (self.order.is_none(), self.order.unwrap_or(0), self.seq)
    }
}

fn same_ptr<T: ?Sized>(a: &Rc<T>, b: &Rc<T>) -> bool {
    Rc::as_ptr(a) as *const () == Rc::as_ptr(b) as *const ()
}

fn same_context(a: Option<&Context>, b: Option<&Context>) -> bool {
    match (a, b) {
        (None, None) => true,
        (Some(a), Some(b)) => same_ptr(a, b),
        _ => false,
    }
}

/// Ordered listener registry keyed by event name.
///
/// Every [`crate::Client`] owns its own bus; there is no process-wide
/// registry. Duplicate registrations are allowed and each must be removed by
/// its own `off` call.
#[derive(Default)]
pub struct EventBus {
    buckets: RefCell<HashMap<String, Vec<Listener>>>,
    next_seq: Cell<u64>,
}

impl EventBus {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `callback` for `event` with no context and no explicit order.
    pub fn on(&self, event: &str, callback: Callback) {
        self.on_with(event, callback, None, None);
    }

    /// Register `callback` for `event`.
    ///
    /// Listeners fire in ascending `order`; listeners without an order fire
    /// after every ordered listener. Equal orders fire in registration order.
    pub fn on_with(
        &self,
        event: &str,
        callback: Callback,
        context: Option<Context>,
        order: Option<i32>,
    ) {
        let seq = self.next_seq.get();
        self.next_seq.set(seq + 1);

        let mut buckets = self.buckets.borrow_mut();
        let bucket = buckets.entry(event.to_string()).or_default();
        bucket.push(Listener {
            callback,
            context,
            order,
            seq,
        });
        bucket.sort_by_key(Listener::rank);
    }

    /// Remove every registration of `callback` for `event` whose context
    /// matches `context` (pointer identity on both). A callback registered
    /// twice needs two `off` calls. The event's bucket is dropped once empty.
    pub fn off(&self, event: &str, callback: &Callback, context: Option<&Context>) {
        let mut buckets = self.buckets.borrow_mut();
        let Some(bucket) = buckets.get_mut(event) else {
            return;
        };
        for i in (0..bucket.len()).rev() {
            if same_ptr(&bucket[i].callback, callback)
                && same_context(bucket[i].context.as_ref(), context)
            {
                bucket.remove(i);
            }
        }
        if bucket.is_empty() {
            buckets.remove(event);
        }
    }

    /// Invoke every listener for `event` in sorted order, passing `args`.
    ///
    /// A listener returning `ControlFlow::Break(())` stops this emission;
    /// listeners for other events and later emissions are unaffected.
    ///
    /// The live bucket is re-read on every step, so a listener may call
    /// `on`/`off` on this bus mid-emission: the cursor only advances when the
    /// slot it just invoked is still physically present at that index, which
    /// keeps unrelated listeners from being skipped or invoked twice when a
    /// listener removes itself.
    pub fn emit(&self, event: &str, args: &[Value]) {
        tracing::debug!(event, listeners = self.count(event), "emit");
        let mut index = 0;
        loop {
            // Clone the slot out so no borrow is held while the listener
            // runs; listeners are allowed to re-enter the bus.
            let slot = {
                let buckets = self.buckets.borrow();
                buckets
                    .get(event)
                    .and_then(|bucket| bucket.get(index))
                    .map(|l| (l.callback.clone(), l.seq))
            };
            let Some((callback, seq)) = slot else {
                break;
            };

            let outcome = callback(args);

            let still_there = {
                let buckets = self.buckets.borrow();
                buckets
                    .get(event)
                    .and_then(|bucket| bucket.get(index))
                    .is_some_and(|l| l.seq == seq)
            };
            if still_there {
                index += 1;
            }
            if outcome == ControlFlow::Break(()) {
                tracing::debug!(event, index, "emission halted by listener");
                break;
            }
        }
    }

    /// Whether at least one listener is registered for `event`.
    pub fn has_listeners(&self, event: &str) -> bool {
        self.buckets.borrow().contains_key(event)
    }

    fn count(&self, event: &str) -> usize {
        self.buckets.borrow().get(event).map_or(0, Vec::len)
    }
}
