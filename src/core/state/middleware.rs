//=========================================================================
// Built-in Middleware
//=========================================================================
//
// The three optional dispatch stages: logging, persistence, analytics.
// All three are pass-through stages; none alters the action or the
// reducer's result.
//
// Order matters and is chosen by the composition root. A typical wiring
// registers the logger first so it observes every action, then
// persistence, then analytics.
//
//=========================================================================

//=== External Dependencies ===============================================

use std::rc::Rc;

use log::{debug, warn};
use serde_json::Value;

//=== Internal Dependencies ===============================================

use crate::core::state::action::{kinds, Action};
use crate::core::state::state::{AppState, Preferences, Progress};
use crate::core::state::store::{Middleware, StateStore};
use crate::core::storage::{KeyValueStore, StorageError};

//=== Logger ==============================================================

/// Logs every action with the state before and after it was applied.
pub struct LoggerMiddleware;

impl Middleware for LoggerMiddleware {
    fn apply(&self, store: &StateStore, action: Action, next: &mut dyn FnMut(Action)) {
        let kind = action.kind.clone();
        let before = store.state();
        debug!("dispatch '{}' payload={:?}", kind, action.payload);

        next(action);

        let after = store.state();
        if Rc::ptr_eq(&before, &after) {
            debug!("'{}' left state unchanged", kind);
        } else {
            debug!("'{}' before={:?} after={:?}", kind, before, after);
        }
    }
}

//=== Persistence ==========================================================

/// Storage keys for the persisted slices of user state.
pub const PREFERENCES_KEY: &str = "kalike.preferences";
pub const PROGRESS_KEY: &str = "kalike.progress";

/// After every state-changing action, writes `user.preferences` and
/// `user.progress` to durable storage. Quota and backend errors are
/// logged and swallowed; persistence is best-effort by contract.
pub struct PersistenceMiddleware {
    storage: Rc<dyn KeyValueStore>,
}

impl PersistenceMiddleware {
    pub fn new(storage: Rc<dyn KeyValueStore>) -> Self {
        Self { storage }
    }

    fn persist(&self, state: &AppState) {
        self.write_slice(PREFERENCES_KEY, &state.user.preferences);
        self.write_slice(PROGRESS_KEY, &state.user.progress);
    }

    fn write_slice<T: serde::Serialize>(&self, key: &str, slice: &T) {
        let serialized = match serde_json::to_string(slice) {
            Ok(s) => s,
            Err(e) => {
                warn!("Persistence: failed to serialize '{}': {}", key, e);
                return;
            }
        };

        match self.storage.set(key, &serialized) {
            Ok(()) => {}
            Err(StorageError::QuotaExceeded { key }) => {
                warn!("Persistence: quota exceeded writing '{}'; skipping", key);
            }
            Err(e) => {
                warn!("Persistence: write failed: {}", e);
            }
        }
    }
}

impl Middleware for PersistenceMiddleware {
    fn apply(&self, store: &StateStore, action: Action, next: &mut dyn FnMut(Action)) {
        let before = store.state();
        next(action);

        let after = store.state();
        if !Rc::ptr_eq(&before, &after) {
            self.persist(&after);
        }
    }
}

/// Reads a persisted preferences slice back, if one exists and parses.
/// Absent or corrupt data is expected absence, not an error.
pub fn load_preferences(storage: &dyn KeyValueStore) -> Option<Preferences> {
    load_slice(storage, PREFERENCES_KEY)
}

/// Reads a persisted progress slice back. Same absence semantics as
/// [`load_preferences`].
pub fn load_progress(storage: &dyn KeyValueStore) -> Option<Progress> {
    load_slice(storage, PROGRESS_KEY)
}

/// Builds a starting state tree with whatever the storage still holds
/// from a previous session merged over the defaults.
pub fn hydrated_state(storage: &dyn KeyValueStore) -> AppState {
    let mut state = AppState::default();
    if let Some(preferences) = load_preferences(storage) {
        state.user.preferences = preferences;
    }
    if let Some(progress) = load_progress(storage) {
        state.user.progress = progress;
    }
    state
}

fn load_slice<T: serde::de::DeserializeOwned>(
    storage: &dyn KeyValueStore,
    key: &str,
) -> Option<T> {
    let raw = storage.get(key)?;
    match serde_json::from_str(&raw) {
        Ok(slice) => Some(slice),
        Err(e) => {
            warn!("Persistence: discarding corrupt save data under '{}': {}", key, e);
            None
        }
    }
}

//=== Analytics ===========================================================

/// External analytics collaborator. Implementations must not block.
pub trait AnalyticsSink {
    fn track(&self, kind: &str, payload: Option<&Value>);
}

/// Action kinds forwarded to analytics. Everything else stays local.
const TRACKED_KINDS: [&str; 4] = [
    kinds::GAME_START,
    kinds::GAME_END,
    kinds::CHANGE_SCENE,
    kinds::UPDATE_PROGRESS,
];

/// Forwards an allow-list of action kinds to an [`AnalyticsSink`] after
/// the dispatch has proceeded.
pub struct AnalyticsMiddleware {
    sink: Rc<dyn AnalyticsSink>,
}

impl AnalyticsMiddleware {
    pub fn new(sink: Rc<dyn AnalyticsSink>) -> Self {
        Self { sink }
    }
}

impl Middleware for AnalyticsMiddleware {
    fn apply(&self, _store: &StateStore, action: Action, next: &mut dyn FnMut(Action)) {
        let kind = action.kind.clone();
        let payload = action.payload.clone();

        next(action);

        if TRACKED_KINDS.contains(&kind.as_str()) {
            self.sink.track(&kind, payload.as_ref());
        }
    }
}

//=========================================================================
// Tests
//=========================================================================
