//=========================================================================
// Lazy Loader
//=========================================================================
//
// Keyed on-demand loader, polymorphic over the loadable unit.
//
// Architecture:
//   load(key) → entries: HashMap<String, LoadState>
//                  ├─ Loaded(resource)     → resolved future, memoized
//                  ├─ Loading { load, .. } → the same in-flight future
//                  └─ (absent)             → start one load, record it
//
// At most one load is ever in flight per key: concurrent callers attach
// to one Shared future. Completion moves the key to Loaded; failure
// clears the entry, so a key is never left stuck in the loading state
// and a retry starts clean.
//
// There is no cancellation primitive. A started load runs to completion
// or failure; unload only acts on completed loads.
//
//=========================================================================

//=== External Dependencies ===============================================

use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::fmt;
use std::future::Future;
use std::rc::Rc;

use futures::future::{self, try_join_all, FutureExt, LocalBoxFuture, Shared};
use log::{debug, warn};

//=== LoadError ===========================================================

/// Failure of one load operation, identifying the key and the underlying
/// cause. Clone because every caller attached to the shared in-flight
/// future receives the same error.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadError {
    pub key: String,
    pub cause: String,
}

impl LoadError {
    pub fn new(key: impl Into<String>, cause: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            cause: cause.into(),
        }
    }
}

impl fmt::Display for LoadError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Failed to load '{}': {}", self.key, self.cause)
    }
}

impl std::error::Error for LoadError {}

//=== Progress ============================================================

/// Shared fractional progress of one in-flight load, reported by the
/// source as the engine's loader emits progress signals.
#[derive(Clone)]
pub struct ProgressHandle(Rc<Cell<f32>>);

impl ProgressHandle {
    pub fn new() -> Self {
        Self(Rc::new(Cell::new(0.0)))
    }

    /// Records the current fraction, clamped to `0.0..=1.0`.
    pub fn report(&self, fraction: f32) {
        self.0.set(fraction.clamp(0.0, 1.0));
    }

    pub fn fraction(&self) -> f32 {
        self.0.get()
    }
}

impl Default for ProgressHandle {
    fn default() -> Self {
        Self::new()
    }
}

//=== ResourceSource ======================================================

/// Supplier of the actual load operation behind a [`LazyLoader`].
///
/// The loader owns all bookkeeping; the source only knows how to fetch
/// one key and (optionally) how to free a fetched resource again.
pub trait ResourceSource {
    /// The loadable unit. `Clone` is expected to be cheap (`Rc` handles).
    type Resource: Clone + 'static;

    fn fetch(
        &self,
        key: &str,
        progress: ProgressHandle,
    ) -> LocalBoxFuture<'static, Result<Self::Resource, LoadError>>;

    /// Frees a fetched resource. Returns whether a removal path existed
    /// for this resource type; the default has none.
    fn release(&self, _key: &str, _resource: &Self::Resource) -> bool {
        false
    }
}

//=== LoadFuture ==========================================================

/// Future handed out by [`LazyLoader::load`]. Cloneable so any number of
/// callers can await the same underlying operation.
pub type LoadFuture<R> = Shared<LocalBoxFuture<'static, Result<R, LoadError>>>;

enum LoadState<R> {
    Loading {
        load: LoadFuture<R>,
        progress: ProgressHandle,
    },
    Loaded(R),
}

//=== LazyLoader ==========================================================

/// Keyed loader with memoization and in-flight de-duplication.
pub struct LazyLoader<S: ResourceSource> {
    source: S,
    entries: Rc<RefCell<HashMap<String, LoadState<S::Resource>>>>,
}

impl<S: ResourceSource> LazyLoader<S> {
    pub fn new(source: S) -> Self {
        Self {
            source,
            entries: Rc::new(RefCell::new(HashMap::new())),
        }
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    //--- Queries ----------------------------------------------------------

    pub fn is_loaded(&self, key: &str) -> bool {
        matches!(self.entries.borrow().get(key), Some(LoadState::Loaded(_)))
    }

    pub fn is_loading(&self, key: &str) -> bool {
        matches!(self.entries.borrow().get(key), Some(LoadState::Loading { .. }))
    }

    /// Reports 1.0 for loaded keys, the source-reported fraction for
    /// in-flight keys, and 0.0 otherwise.
    pub fn progress(&self, key: &str) -> f32 {
        match self.entries.borrow().get(key) {
            Some(LoadState::Loaded(_)) => 1.0,
            Some(LoadState::Loading { progress, .. }) => progress.fraction(),
            None => 0.0,
        }
    }

    //--- Loading ----------------------------------------------------------

    /// Returns the completed result for loaded keys, the existing
    /// in-flight future for loading keys, and otherwise starts one load.
    pub fn load(&self, key: &str) -> LoadFuture<S::Resource> {
        {
            let entries = self.entries.borrow();
            match entries.get(key) {
                Some(LoadState::Loaded(resource)) => {
                    let resource = resource.clone();
                    return future::ready(Ok(resource)).boxed_local().shared();
                }
                Some(LoadState::Loading { load, .. }) => return load.clone(),
                None => {}
            }
        }

        debug!("Loader: starting load for '{}'", key);
        let progress = ProgressHandle::new();
        let inner = self.source.fetch(key, progress.clone());

        let entries = Rc::clone(&self.entries);
        let owned_key = key.to_string();
        let load: LoadFuture<S::Resource> = async move {
            let result = inner.await;
            match &result {
                Ok(resource) => {
                    entries
                        .borrow_mut()
                        .insert(owned_key.clone(), LoadState::Loaded(resource.clone()));
                    debug!("Loader: '{}' loaded", owned_key);
                }
                Err(e) => {
                    entries.borrow_mut().remove(&owned_key);
                    warn!("Loader: {}", e);
                }
            }
            result
        }
        .boxed_local()
        .shared();

        self.entries.borrow_mut().insert(
            key.to_string(),
            LoadState::Loading {
                load: load.clone(),
                progress,
            },
        );
        load
    }

    /// Concurrent fan-out over [`load`](Self::load): resolves once every
    /// key has loaded, or fails with the first load error.
    pub fn load_multiple(
        &self,
        keys: &[&str],
    ) -> impl Future<Output = Result<Vec<S::Resource>, LoadError>> {
        let loads: Vec<_> = keys.iter().map(|key| self.load(key)).collect();
        try_join_all(loads)
    }

    //--- Unloading --------------------------------------------------------

    /// Frees the cached resource for `key` and returns the key to the
    /// unloaded state. Unloading a key that never loaded is a no-op; an
    /// in-flight key is left alone (loads are not cancellable).
    pub fn unload(&self, key: &str) -> bool {
        let removed = {
            let mut entries = self.entries.borrow_mut();
            match entries.get(key) {
                Some(LoadState::Loaded(_)) => entries.remove(key),
                Some(LoadState::Loading { .. }) => {
                    warn!("Loader: '{}' is still loading; unload ignored", key);
                    None
                }
                None => {
                    debug!("Loader: '{}' is not loaded; nothing to unload", key);
                    None
                }
            }
        };

        match removed {
            Some(LoadState::Loaded(resource)) => {
                if self.source.release(key, &resource) {
                    debug!("Loader: released resource for '{}'", key);
                }
                true
            }
            _ => false,
        }
    }
}

//=========================================================================
// Tests
//=========================================================================
