//=========================================================================
// State System
//=========================================================================
//
// Centralized application state.
//
// Architecture:
//   StateStore
//     ├─ state: Rc<AppState>            (replaced wholesale on change)
//     ├─ middlewares: Vec<Rc<dyn Middleware>>
//     ├─ listeners: Vec<ListenerEntry>
//     └─ history: History               (bounded undo/redo snapshots)
//
// Flow:
//   dispatch(action) → middleware chain → reduce() → commit → notify
//
//=========================================================================

//=== Module Declarations =================================================

pub mod action;
pub mod history;
pub mod middleware;
pub mod reducer;
mod state;
mod store;

//=== Public API ==========================================================

pub use action::{kinds, Action};
pub use history::{History, HistoryEntry, Snapshot, HISTORY_CAPACITY};
pub use middleware::{
    hydrated_state, load_preferences, load_progress, AnalyticsMiddleware, AnalyticsSink,
    LoggerMiddleware, PersistenceMiddleware, PREFERENCES_KEY, PROGRESS_KEY,
};
pub use reducer::reduce;
pub use state::{
    AppSection, AppState, GameSection, ModalState, NotificationState, Preferences, Profile,
    Progress, Severity, UiSection, UserSection, Viewport,
};
pub use store::{ListenerId, Middleware, MiddlewareFn, StateStore, StoreError};
