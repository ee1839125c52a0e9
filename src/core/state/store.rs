//=========================================================================
// State Store
//=========================================================================
//
// Single owner of the application state tree.
//
// Architecture:
//   dispatch(action)
//        ↓ contract check (non-empty kind)
//        ↓ middleware chain (registration order)
//        ↓ reducer: (previous, action) → next
//        ↓ identity check (Rc::ptr_eq), unchanged results stop here
//        ↓ commit + history record
//        ↓ listener notification (registration order)
//
// The store is single-threaded: interior mutability is RefCell, shared
// handles are Rc. No borrow is held across middleware, reducer, or
// listener invocations, so handlers may re-enter the store synchronously
// (dispatch from a listener, subscribe from a middleware) without
// corrupting the listener list or the history.
//
//=========================================================================

//=== External Dependencies ===============================================

use std::cell::{Cell, RefCell};
use std::fmt;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::rc::Rc;

use log::error;

//=== Internal Dependencies ===============================================

use super::action::Action;
use super::history::History;
use super::reducer;
use super::state::AppState;

//=== StoreError ==========================================================

/// Failures surfaced by [`StateStore`] operations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    /// Dispatch contract violation: the action kind was empty.
    InvalidAction,

    /// State snapshot (de)serialization failed.
    Snapshot(String),
}

impl fmt::Display for StoreError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidAction => write!(f, "Action kind must be a non-empty string"),
            Self::Snapshot(cause) => write!(f, "State snapshot failed: {}", cause),
        }
    }
}

impl std::error::Error for StoreError {}

//=== Middleware ==========================================================

/// A composable stage wrapped around the dispatch pipeline.
///
/// Stages run in registration order: the first `use_middleware` call
/// installs the stage that observes every action first. A stage forwards
/// the action by calling `next` (possibly with a transformed action) or
/// swallows it by not calling `next` at all.
pub trait Middleware {
    fn apply(&self, store: &StateStore, action: Action, next: &mut dyn FnMut(Action));
}

/// Adapter turning a plain closure into a [`Middleware`] stage.
pub struct MiddlewareFn<F>(pub F);

impl<F> Middleware for MiddlewareFn<F>
where
    F: Fn(&StateStore, Action, &mut dyn FnMut(Action)),
{
    fn apply(&self, store: &StateStore, action: Action, next: &mut dyn FnMut(Action)) {
        (self.0)(store, action, next)
    }
}

//=== Listeners ===========================================================

/// Token returned by [`StateStore::subscribe`], used to remove that one
/// listener.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(u64);

type Listener = Rc<dyn Fn(&Rc<AppState>)>;

#[derive(Clone)]
struct ListenerEntry {
    id: ListenerId,
    listener: Listener,
}

//=== StateStore ==========================================================

/// Reducer-driven state container with middleware, subscriptions, and
/// bounded undo/redo history.
pub struct StateStore {
    state: RefCell<Rc<AppState>>,
    reducer: Rc<dyn Fn(&Rc<AppState>, &Action) -> Rc<AppState>>,
    middlewares: RefCell<Vec<Rc<dyn Middleware>>>,
    listeners: RefCell<Vec<ListenerEntry>>,
    history: RefCell<History>,
    next_listener_id: Cell<u64>,
}

impl StateStore {
    //--- Construction -----------------------------------------------------

    /// Creates a store over the default state tree and built-in reducer.
    pub fn new() -> Self {
        Self::with_state(AppState::default())
    }

    /// Creates a store seeded with `initial`, using the built-in reducer.
    pub fn with_state(initial: AppState) -> Self {
        Self::with_reducer(initial, reducer::reduce)
    }

    /// Creates a store with a custom transition function. The built-in
    /// reducer covers the application tree; custom reducers exist for
    /// harnesses exercising store mechanics in isolation.
    pub fn with_reducer<R>(initial: AppState, reduce: R) -> Self
    where
        R: Fn(&Rc<AppState>, &Action) -> Rc<AppState> + 'static,
    {
        let history = History::new(&initial).unwrap_or_else(|e| {
            error!("StateStore: failed to seed history: {}", e);
            History::unseeded()
        });

        Self {
            state: RefCell::new(Rc::new(initial)),
            reducer: Rc::new(reduce),
            middlewares: RefCell::new(Vec::new()),
            listeners: RefCell::new(Vec::new()),
            history: RefCell::new(history),
            next_listener_id: Cell::new(0),
        }
    }

    //--- State Access -----------------------------------------------------

    /// Returns the current state. Read-only by convention: the tree is
    /// only ever replaced wholesale through `dispatch`.
    pub fn state(&self) -> Rc<AppState> {
        self.state.borrow().clone()
    }

    //--- Dispatch ---------------------------------------------------------

    /// Runs `action` through the middleware chain into the reducer.
    ///
    /// Returns `Ok(true)` when the reducer produced a new state (listeners
    /// were notified and a history entry recorded), `Ok(false)` when the
    /// state was left untouched, and `Err` for the contract violation of
    /// an empty action kind, which never reaches any middleware.
    pub fn dispatch(&self, action: Action) -> Result<bool, StoreError> {
        if !action.is_valid() {
            return Err(StoreError::InvalidAction);
        }

        let changed = Cell::new(false);
        self.run_stage(0, action, &changed);
        Ok(changed.get())
    }

    fn run_stage(&self, index: usize, action: Action, changed: &Cell<bool>) {
        let stage = self.middlewares.borrow().get(index).cloned();

        match stage {
            Some(middleware) => {
                middleware.apply(self, action, &mut |next_action| {
                    self.run_stage(index + 1, next_action, changed);
                });
            }
            None => {
                if self.apply_to_state(&action) {
                    changed.set(true);
                }
            }
        }
    }

    fn apply_to_state(&self, action: &Action) -> bool {
        let previous = self.state.borrow().clone();
        let next = (self.reducer)(&previous, action);

        if Rc::ptr_eq(&previous, &next) {
            return false;
        }

        *self.state.borrow_mut() = Rc::clone(&next);
        if let Err(e) = self.history.borrow_mut().record(&action.kind, &next) {
            error!("StateStore: failed to record history entry: {}", e);
        }
        self.notify(&next);
        true
    }

    //--- Middleware -------------------------------------------------------

    /// Appends one more stage to the dispatch pipeline.
    pub fn use_middleware<M: Middleware + 'static>(&self, middleware: M) {
        self.middlewares.borrow_mut().push(Rc::new(middleware));
    }

    //--- Subscriptions ----------------------------------------------------

    /// Registers a listener invoked with the new state after every commit.
    pub fn subscribe<F>(&self, listener: F) -> ListenerId
    where
        F: Fn(&Rc<AppState>) + 'static,
    {
        let id = ListenerId(self.next_listener_id.get());
        self.next_listener_id.set(id.0 + 1);

        self.listeners.borrow_mut().push(ListenerEntry {
            id,
            listener: Rc::new(listener),
        });
        id
    }

    /// Removes exactly the listener behind `id`. Returns whether it was
    /// still registered.
    pub fn unsubscribe(&self, id: ListenerId) -> bool {
        let mut listeners = self.listeners.borrow_mut();
        let before = listeners.len();
        listeners.retain(|entry| entry.id != id);
        listeners.len() < before
    }

    fn notify(&self, state: &Rc<AppState>) {
        // Clone the entries out so listeners can re-enter the store.
        let entries: Vec<ListenerEntry> = self.listeners.borrow().clone();

        for entry in &entries {
            let listener = Rc::clone(&entry.listener);
            if catch_unwind(AssertUnwindSafe(|| listener(state))).is_err() {
                error!("StateStore: listener panicked; remaining listeners still run");
            }
        }
    }

    //--- History ----------------------------------------------------------

    /// Steps back one history entry. Returns whether movement occurred.
    pub fn undo(&self) -> bool {
        let restored = self.history.borrow_mut().undo();
        match restored {
            Some(state) => {
                let state = Rc::new(state);
                *self.state.borrow_mut() = Rc::clone(&state);
                self.notify(&state);
                true
            }
            None => false,
        }
    }

    /// Steps forward one history entry. Returns whether movement occurred.
    pub fn redo(&self) -> bool {
        let restored = self.history.borrow_mut().redo();
        match restored {
            Some(state) => {
                let state = Rc::new(state);
                *self.state.borrow_mut() = Rc::clone(&state);
                self.notify(&state);
                true
            }
            None => false,
        }
    }

    pub fn can_undo(&self) -> bool {
        self.history.borrow().can_undo()
    }

    pub fn can_redo(&self) -> bool {
        self.history.borrow().can_redo()
    }

    pub fn history_len(&self) -> usize {
        self.history.borrow().len()
    }

    //--- Reset ------------------------------------------------------------

    /// Replaces the state wholesale, clears all history, and notifies
    /// every subscriber.
    pub fn reset(&self, new_state: AppState) {
        let state = Rc::new(new_state);
        *self.state.borrow_mut() = Rc::clone(&state);

        if let Err(e) = self.history.borrow_mut().reset(&state) {
            error!("StateStore: failed to reseed history on reset: {}", e);
        }
        self.notify(&state);
    }
}

impl Default for StateStore {
    fn default() -> Self {
        Self::new()
    }
}

//=========================================================================
// Tests
//=========================================================================
