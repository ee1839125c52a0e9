//=========================================================================
// Event Bus
//=========================================================================
//
// Process-wide publish/subscribe channel for lateral communication
// between scenes and subsystems.
//
// Architecture:
//   Publishers → emit(name, payload) → HashMap<String, Vec<HandlerEntry>>
//                                            ↓
//   Handlers invoked synchronously, in registration order
//
// Handlers are plain closures; whatever context they need is captured at
// registration time. A panicking handler is isolated and logged so the
// remaining handlers for that emission still run.
//
//=========================================================================

//=== External Dependencies ===============================================

use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::rc::Rc;

use log::{debug, error};
use serde_json::Value;

//=== Public API ==========================================================

/// Token returned by [`EventBus::on`], used to remove that one handler.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

type Handler = Rc<dyn Fn(&Value)>;

#[derive(Clone)]
struct HandlerEntry {
    id: SubscriptionId,
    handler: Handler,
}

//=========================================================================

/// String-named synchronous pub/sub channel.
///
/// Handlers for a name run in registration order every time that name is
/// emitted. Emitting a name nobody subscribed to is a no-op, never an
/// error.
pub struct EventBus {
    channels: RefCell<HashMap<String, Vec<HandlerEntry>>>,
    next_id: Cell<u64>,
    debug: Cell<bool>,
}

impl EventBus {
    /// Creates a new bus with no subscriptions.
    pub fn new() -> Self {
        Self {
            channels: RefCell::new(HashMap::new()),
            next_id: Cell::new(0),
            debug: Cell::new(false),
        }
    }

    /// Enables or disables debug tracing of emissions and subscriptions.
    ///
    /// Tracing goes through `log::debug!` and never changes handler
    /// invocation order or return values.
    pub fn set_debug(&self, enabled: bool) {
        self.debug.set(enabled);
    }

    //--- Subscription -----------------------------------------------------

    /// Registers a handler for `event`, returning a token for removal.
    pub fn on<F>(&self, event: &str, handler: F) -> SubscriptionId
    where
        F: Fn(&Value) + 'static,
    {
        if self.debug.get() {
            debug!("EventBus: subscribe '{}'", event);
        }

        let id = SubscriptionId(self.next_id.get());
        self.next_id.set(id.0 + 1);

        self.channels
            .borrow_mut()
            .entry(event.to_string())
            .or_default()
            .push(HandlerEntry {
                id,
                handler: Rc::new(handler),
            });
        id
    }

    /// Removes one handler from `event`. Returns whether it was found.
    pub fn off(&self, event: &str, id: SubscriptionId) -> bool {
        let mut channels = self.channels.borrow_mut();
        let Some(entries) = channels.get_mut(event) else {
            return false;
        };

        let before = entries.len();
        entries.retain(|entry| entry.id != id);
        let removed = entries.len() < before;

        if entries.is_empty() {
            channels.remove(event);
        }
        removed
    }

    /// Removes every handler for one event without touching other events.
    pub fn remove_listeners(&self, event: &str) {
        self.channels.borrow_mut().remove(event);
    }

    /// Removes every handler for every event.
    pub fn clear_all(&self) {
        self.channels.borrow_mut().clear();
    }

    //--- Emission ---------------------------------------------------------

    /// Synchronously invokes all handlers registered for `event`, in
    /// registration order. Returns whether any handler existed.
    ///
    /// Handlers registered or removed during the emission take effect on
    /// the next emission; the current one runs over the handler list as it
    /// was when `emit` was entered.
    pub fn emit(&self, event: &str, payload: &Value) -> bool {
        if self.debug.get() {
            debug!("EventBus: emit '{}' payload={}", event, payload);
        }

        // Clone the entries out so handlers can re-enter the bus.
        let entries: Vec<HandlerEntry> = match self.channels.borrow().get(event) {
            Some(entries) => entries.clone(),
            None => return false,
        };

        for entry in &entries {
            let handler = Rc::clone(&entry.handler);
            if catch_unwind(AssertUnwindSafe(|| handler(payload))).is_err() {
                error!(
                    "EventBus: handler for '{}' panicked; remaining handlers still run",
                    event
                );
            }
        }
        true
    }

    //--- Query API --------------------------------------------------------

    /// Returns the number of handlers currently registered for `event`.
    pub fn listener_count(&self, event: &str) -> usize {
        self.channels
            .borrow()
            .get(event)
            .map(|entries| entries.len())
            .unwrap_or(0)
    }

    /// Returns true if any handler is registered for `event`.
    pub fn has_listeners(&self, event: &str) -> bool {
        self.listener_count(event) > 0
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}

//=========================================================================
// Tests
//=========================================================================
