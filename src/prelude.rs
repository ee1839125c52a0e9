//=========================================================================
// Prelude
//=========================================================================
//
// Convenience module that re-exports commonly used types and traits.
//
// Usage:
//   use kalike_runtime::prelude::*;
//
//=========================================================================

//=== Public API ==========================================================

// Runtime facade
pub use crate::runtime::{events, Runtime, RuntimeBuilder, RuntimeConfig, RuntimeError};

// State system
pub use crate::core::state::{kinds, Action, AppState, StateStore, StoreError};

// Service system
pub use crate::core::services::{Service, ServiceError, ServiceRegistry};

// Event bus
pub use crate::core::event_bus::{EventBus, SubscriptionId};

// Loaders
pub use crate::core::loader::{
    AssetManifest, AssetSource, LazyAssetLoader, LoadError, SceneCatalog, SceneLoader,
};

// Engine bridge
pub use crate::core::engine_bridge::{EngineError, EngineEvent, EngineHandle};

// Storage
pub use crate::core::storage::{KeyValueStore, MemoryStore, StorageError};
