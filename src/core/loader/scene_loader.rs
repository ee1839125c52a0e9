//=========================================================================
// Scene Loader
//=========================================================================
//
// On-demand loader for UI scene modules.
//
// Scene code is split per scene and loaded through a catalog of factory
// functions, the dynamic-import analog. The loader is the same machinery
// as the asset side: memoized results, one in-flight load per key.
//
//=========================================================================

//=== External Dependencies ===============================================

use std::collections::HashMap;
use std::future::Future;
use std::rc::Rc;

use futures::future::{self, try_join_all, FutureExt, LocalBoxFuture};
use log::warn;

//=== Internal Dependencies ===============================================

use super::lazy_loader::{LazyLoader, LoadError, LoadFuture, ProgressHandle, ResourceSource};

//=== Scene Catalog =======================================================

/// Factory producing one loadable scene module.
pub type SceneFactory<M> = Rc<dyn Fn(ProgressHandle) -> LocalBoxFuture<'static, Result<M, LoadError>>>;

/// Static mapping from scene key to its module factory.
pub struct SceneCatalog<M> {
    factories: HashMap<String, SceneFactory<M>>,
}

impl<M> SceneCatalog<M> {
    pub fn new() -> Self {
        Self {
            factories: HashMap::new(),
        }
    }

    /// Registers the factory for one scene key.
    pub fn register<F>(&mut self, key: impl Into<String>, factory: F)
    where
        F: Fn(ProgressHandle) -> LocalBoxFuture<'static, Result<M, LoadError>> + 'static,
    {
        let key = key.into();
        if self
            .factories
            .insert(key.clone(), Rc::new(factory))
            .is_some()
        {
            warn!("SceneCatalog: '{}' was already registered and has been replaced", key);
        }
    }

    pub fn contains(&self, key: &str) -> bool {
        self.factories.contains_key(key)
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.factories.keys().map(|key| key.as_str())
    }

    fn factory(&self, key: &str) -> Option<SceneFactory<M>> {
        self.factories.get(key).cloned()
    }
}

impl<M> Default for SceneCatalog<M> {
    fn default() -> Self {
        Self::new()
    }
}

//=== Catalog Adapter =====================================================

struct CatalogSource<M: Clone + 'static> {
    catalog: Rc<SceneCatalog<M>>,
}

impl<M: Clone + 'static> ResourceSource for CatalogSource<M> {
    type Resource = M;

    fn fetch(
        &self,
        key: &str,
        progress: ProgressHandle,
    ) -> LocalBoxFuture<'static, Result<M, LoadError>> {
        match self.catalog.factory(key) {
            Some(factory) => factory(progress),
            None => future::ready(Err(LoadError::new(key, "scene missing from catalog")))
                .boxed_local(),
        }
    }
}

//=== SceneLoader =========================================================

/// Scene-key-keyed module loader over a [`SceneCatalog`].
///
/// A key the catalog does not know is expected absence: `load` warns and
/// returns `None`.
pub struct SceneLoader<M: Clone + 'static> {
    catalog: Rc<SceneCatalog<M>>,
    loader: LazyLoader<CatalogSource<M>>,
}

impl<M: Clone + 'static> SceneLoader<M> {
    pub fn new(catalog: SceneCatalog<M>) -> Self {
        let catalog = Rc::new(catalog);
        Self {
            catalog: Rc::clone(&catalog),
            loader: LazyLoader::new(CatalogSource { catalog }),
        }
    }

    pub fn catalog(&self) -> &SceneCatalog<M> {
        &self.catalog
    }

    pub fn is_loaded(&self, key: &str) -> bool {
        self.loader.is_loaded(key)
    }

    /// See [`LazyLoader::progress`].
    pub fn progress(&self, key: &str) -> f32 {
        self.loader.progress(key)
    }

    /// Starts (or joins) the load of one scene module. Returns `None`
    /// when the key is not in the catalog.
    pub fn load(&self, key: &str) -> Option<LoadFuture<M>> {
        if !self.catalog.contains(key) {
            warn!("SceneLoader: scene '{}' is not in the catalog", key);
            return None;
        }
        Some(self.loader.load(key))
    }

    /// Concurrent fan-out over [`load`](Self::load); unknown keys are
    /// warned about and skipped.
    pub fn load_multiple(&self, keys: &[&str]) -> impl Future<Output = Result<Vec<M>, LoadError>> {
        let loads: Vec<_> = keys.iter().filter_map(|key| self.load(key)).collect();
        try_join_all(loads)
    }

    /// Drops the cached module for `key`. A module holds no engine-side
    /// resources of its own, so this is purely a cache eviction.
    pub fn unload(&self, key: &str) -> bool {
        self.loader.unload(key)
    }
}

//=========================================================================
// Tests
//=========================================================================
