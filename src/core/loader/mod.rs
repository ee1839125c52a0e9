//=========================================================================
// Loader System
//=========================================================================
//
// On-demand loading for content assets and scene modules.
//
// Architecture:
//   LazyLoader<S: ResourceSource>     generic keyed loader
//     ├─ LazyAssetLoader              keys = manifest categories
//     └─ SceneLoader                  keys = scene catalog entries
//
// Flow:
//   load(key) → unloaded | loading (join) | loaded (memoized)
//
//=========================================================================

//=== Module Declarations =================================================

mod asset_loader;
mod lazy_loader;
mod manifest;
mod scene_loader;

//=== Public API ==========================================================

pub use asset_loader::{AssetSource, LazyAssetLoader};
pub use lazy_loader::{LazyLoader, LoadError, LoadFuture, ProgressHandle, ResourceSource};
pub use manifest::{AssetDescriptor, AssetManifest, AssetType, FrameConfig};
pub use scene_loader::{SceneCatalog, SceneFactory, SceneLoader};
