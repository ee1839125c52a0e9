//=========================================================================
// Lazy Asset Loader
//=========================================================================
//
// On-demand loader for manifest categories of content assets.
//
// The engine's content loader does the actual fetching/decoding; this
// component adds the manifest lookup, memoization, and in-flight
// de-duplication on top of the generic LazyLoader.
//
//=========================================================================

//=== External Dependencies ===============================================

use std::future::Future;
use std::rc::Rc;

use futures::future::{self, try_join_all, FutureExt, LocalBoxFuture};
use log::warn;

//=== Internal Dependencies ===============================================

use super::lazy_loader::{LazyLoader, LoadError, LoadFuture, ProgressHandle, ResourceSource};
use super::manifest::{AssetDescriptor, AssetManifest};

//=== AssetSource =========================================================

/// Bridge to the engine's per-category content loader.
///
/// `fetch_category` receives the category's ordered descriptors and a
/// progress handle to drive with the engine's progress signals.
pub trait AssetSource {
    /// The loaded form of one whole category. `Clone` is expected to be
    /// cheap (`Rc` handle).
    type Bundle: Clone + 'static;

    fn fetch_category(
        &self,
        category: &str,
        assets: &[AssetDescriptor],
        progress: ProgressHandle,
    ) -> LocalBoxFuture<'static, Result<Self::Bundle, LoadError>>;

    /// Frees a loaded bundle. Returns whether a removal path existed.
    fn release_category(&self, _category: &str, _bundle: &Self::Bundle) -> bool {
        false
    }
}

//=== Manifest Adapter ====================================================

/// Adapts an [`AssetSource`] plus manifest into a [`ResourceSource`]
/// keyed by category name.
struct CategorySource<S: AssetSource> {
    manifest: Rc<AssetManifest>,
    source: S,
}

impl<S: AssetSource> ResourceSource for CategorySource<S> {
    type Resource = S::Bundle;

    fn fetch(
        &self,
        key: &str,
        progress: ProgressHandle,
    ) -> LocalBoxFuture<'static, Result<Self::Resource, LoadError>> {
        match self.manifest.category(key) {
            Some(assets) => self.source.fetch_category(key, assets, progress),
            None => {
                future::ready(Err(LoadError::new(key, "category missing from manifest")))
                    .boxed_local()
            }
        }
    }

    fn release(&self, key: &str, resource: &Self::Resource) -> bool {
        self.source.release_category(key, resource)
    }
}

//=== LazyAssetLoader =====================================================

/// Category-keyed content loader over a static [`AssetManifest`].
///
/// A category that is not in the manifest is expected absence: `load`
/// warns and returns `None` rather than failing.
pub struct LazyAssetLoader<S: AssetSource> {
    manifest: Rc<AssetManifest>,
    loader: LazyLoader<CategorySource<S>>,
}

impl<S: AssetSource> LazyAssetLoader<S> {
    pub fn new(manifest: AssetManifest, source: S) -> Self {
        let manifest = Rc::new(manifest);
        Self {
            manifest: Rc::clone(&manifest),
            loader: LazyLoader::new(CategorySource { manifest, source }),
        }
    }

    pub fn manifest(&self) -> &AssetManifest {
        &self.manifest
    }

    pub fn is_loaded(&self, category: &str) -> bool {
        self.loader.is_loaded(category)
    }

    /// See [`LazyLoader::progress`].
    pub fn progress(&self, category: &str) -> f32 {
        self.loader.progress(category)
    }

    /// Starts (or joins) the load of one manifest category. Returns
    /// `None` when the category is not in the manifest.
    pub fn load(&self, category: &str) -> Option<LoadFuture<S::Bundle>> {
        if !self.manifest.contains(category) {
            warn!("AssetLoader: category '{}' is not in the manifest", category);
            return None;
        }
        Some(self.loader.load(category))
    }

    /// Concurrent fan-out over [`load`](Self::load). Categories missing
    /// from the manifest are warned about and skipped; a failing load
    /// fails the whole preload.
    pub fn preload(
        &self,
        categories: &[&str],
    ) -> impl Future<Output = Result<Vec<S::Bundle>, LoadError>> {
        let loads: Vec<_> = categories
            .iter()
            .filter_map(|category| self.load(category))
            .collect();
        try_join_all(loads)
    }

    /// See [`LazyLoader::unload`].
    pub fn unload(&self, category: &str) -> bool {
        self.loader.unload(category)
    }
}

//=========================================================================
// Tests
//=========================================================================
